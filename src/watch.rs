//! Rebuild on change.
//!
//! File system events are funnelled into a [`RebuildQueue`], a pending flag
//! with room for exactly one rebuild. A single worker drains it, so:
//!
//! - a rebuild never starts while another is running;
//! - any number of events during a build collapse into one follow-up build;
//! - a burst of events (an editor writing a file in several steps) is
//!   absorbed by a settle window before the build starts.
//!
//! ```text
//! events:   x x x      x   x x            x
//! builds:   ····[=====]····[=====]········[=====]
//!               settle     one follow-up
//! ```
//!
//! Events below the output directory are ignored; otherwise every build would
//! trigger the next one. Each rebuild reads `config.toml` again.

use crate::build::{BuildConfig, BuildError, BuildReport, Overrides, TemplateSource, build};
use crate::config::{self, ConfigError};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Why a rebuild produced no site.
#[derive(Error, Debug)]
pub enum RebuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(Debug, Default)]
struct QueueState {
    pending: bool,
    closed: bool,
}

/// A depth-one rebuild queue.
///
/// [`request`](Self::request) is cheap and may be called from any thread;
/// [`next`](Self::next) is called by the one thread that runs builds.
#[derive(Debug, Default)]
pub struct RebuildQueue {
    state: Mutex<QueueState>,
    signal: Condvar,
}

impl RebuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a rebuild. Requests made while one is already pending are
    /// merged into it.
    pub fn request(&self) {
        let mut state = self.lock();
        state.pending = true;
        self.signal.notify_all();
    }

    /// Stop the queue; [`next`](Self::next) returns `false` from now on.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.signal.notify_all();
    }

    /// Whether a rebuild is waiting to be picked up.
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Block until a rebuild is requested, then wait until no new request
    /// has arrived for `settle`. Returns `false` once the queue is closed.
    pub fn next(&self, settle: Duration) -> bool {
        let mut state = self.lock();
        while !state.pending && !state.closed {
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return false;
        }
        state.pending = false;

        loop {
            let (guard, timeout) = self
                .signal
                .wait_timeout(state, settle)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
            if state.closed {
                return false;
            }
            if state.pending {
                state.pending = false;
            } else if timeout.timed_out() {
                return true;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run `rebuild` once per rebuild taken from `queue` until it is closed.
/// Builds run one at a time on the calling thread.
pub fn run_rebuilds(queue: &RebuildQueue, settle: Duration, mut rebuild: impl FnMut()) {
    while queue.next(settle) {
        rebuild();
    }
}

/// Reload `config.toml` from the content root, then build the site.
///
/// An invalid config fails before the output directory is touched, so the
/// previous build stays in place.
pub fn rebuild_site(
    content_root: &Path,
    output_root: &Path,
    overrides: &Overrides,
) -> Result<BuildReport, RebuildError> {
    let site = config::load_config(content_root)?;
    let config = BuildConfig::resolve(content_root, output_root, &site, overrides);
    Ok(build(&config)?)
}

/// Decides which changed paths trigger a rebuild.
///
/// Every root is kept in absolute and canonical form, and event paths are
/// made absolute before comparing, so `./docs/a.md` and `/home/u/docs/a.md`
/// are treated alike.
#[derive(Debug, Clone)]
struct ChangeFilter {
    content: Vec<PathBuf>,
    output: Vec<PathBuf>,
    template: Vec<PathBuf>,
}

impl ChangeFilter {
    fn new(config: &BuildConfig) -> Self {
        let template = match &config.template {
            TemplateSource::File(path) => spellings(path),
            TemplateSource::Builtin => Vec::new(),
        };
        Self {
            content: spellings(&config.content_root),
            output: spellings(&config.output_root),
            template,
        }
    }

    fn is_relevant(&self, path: &Path) -> bool {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        if self.output.iter().any(|out| path.starts_with(out)) {
            return false;
        }
        self.content.iter().any(|root| path.starts_with(root))
            || self.template.iter().any(|t| &path == t)
    }

    /// Directory to watch for template changes: the template's parent, unless
    /// the content root watch already covers it. Watching the directory
    /// instead of the file survives editors that save by renaming a new file
    /// over the old one.
    fn template_dir(&self) -> Option<PathBuf> {
        let template = self.template.first()?;
        if self.content.iter().any(|root| template.starts_with(root)) {
            return None;
        }
        template.parent().map(Path::to_path_buf)
    }
}

/// Absolute and (when the path exists) canonical forms of `path`.
fn spellings(path: &Path) -> Vec<PathBuf> {
    let mut forms = Vec::new();
    if let Ok(absolute) = std::path::absolute(path) {
        forms.push(absolute);
    }
    if let Ok(canonical) = path.canonicalize()
        && !forms.contains(&canonical)
    {
        forms.push(canonical);
    }
    if forms.is_empty() {
        forms.push(path.to_path_buf());
    }
    forms
}

/// Watch the content root (and the template, if it lives elsewhere) and
/// rebuild the site after each change.
///
/// Every rebuild reloads `config.toml`, so title and template changes apply
/// without a restart; `overrides` still win over the file. Paths watched are
/// fixed by `initial`: a template moved outside the content root by a config
/// edit is not watched until the next start.
///
/// Rebuild results, failures included, are passed to `on_build`. This
/// function only returns on a setup error; once watching it blocks until the
/// process is stopped.
pub fn watch(
    initial: &BuildConfig,
    overrides: &Overrides,
    settle: Duration,
    mut on_build: impl FnMut(Result<BuildReport, RebuildError>),
) -> Result<(), WatchError> {
    let queue = Arc::new(RebuildQueue::new());
    let filter = ChangeFilter::new(initial);
    let template_dir = filter.template_dir();

    let handler_queue = Arc::clone(&queue);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "watch error");
                return;
            }
        };
        if !matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
        ) {
            return;
        }
        if event.paths.iter().any(|p| filter.is_relevant(p)) {
            tracing::debug!(paths = ?event.paths, "change detected");
            handler_queue.request();
        }
    })?;

    watcher.watch(&initial.content_root, RecursiveMode::Recursive)?;
    if let Some(dir) = &template_dir {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    tracing::info!(root = %initial.content_root.display(), "watching for changes");

    run_rebuilds(&queue, settle, || {
        on_build(rebuild_site(
            &initial.content_root,
            &initial.output_root,
            overrides,
        ))
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use tempfile::TempDir;

    const SETTLE: Duration = Duration::from_millis(20);

    #[test]
    fn burst_collapses_into_one_rebuild() {
        let queue = RebuildQueue::new();
        for _ in 0..100 {
            queue.request();
        }
        assert!(queue.next(SETTLE));
        assert!(!queue.is_pending());
    }

    #[test]
    fn requests_during_settle_are_absorbed() {
        let queue = Arc::new(RebuildQueue::new());
        queue.request();

        let sender = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            for _ in 0..5 {
                thread::sleep(Duration::from_millis(5));
                sender.request();
            }
        });

        assert!(queue.next(Duration::from_millis(50)));
        handle.join().unwrap();
        assert!(!queue.is_pending());
    }

    #[test]
    fn requests_during_build_cause_exactly_one_more() {
        let queue = Arc::new(RebuildQueue::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let worker_queue = Arc::clone(&queue);
        let worker_builds = Arc::clone(&builds);
        let worker = thread::spawn(move || {
            run_rebuilds(&worker_queue, SETTLE, || {
                let n = worker_builds.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    // Changes arriving while the first build runs
                    for _ in 0..10 {
                        worker_queue.request();
                    }
                    thread::sleep(Duration::from_millis(30));
                }
            });
        });

        queue.request();
        thread::sleep(Duration::from_millis(300));
        queue.close();
        worker.join().unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn builds_never_overlap() {
        let queue = Arc::new(RebuildQueue::new());
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));

        let worker_queue = Arc::clone(&queue);
        let (r, m) = (Arc::clone(&running), Arc::clone(&max_running));
        let worker = thread::spawn(move || {
            run_rebuilds(&worker_queue, Duration::from_millis(1), || {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                r.fetch_sub(1, Ordering::SeqCst);
            });
        });

        let senders: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..50 {
                        q.request();
                        thread::sleep(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for s in senders {
            s.join().unwrap();
        }
        queue.close();
        worker.join().unwrap();

        assert_eq!(max_running.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_queue_stops_waiting() {
        let queue = Arc::new(RebuildQueue::new());
        let closer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            closer.close();
        });
        assert!(!queue.next(SETTLE));
        handle.join().unwrap();
    }

    fn config_in(root: &Path, template: TemplateSource) -> BuildConfig {
        BuildConfig {
            template,
            content_root: root.join("docs"),
            output_root: root.join("docs/build"),
            project_title: "docs".to_string(),
        }
    }

    #[test]
    fn output_changes_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("docs/guide.md", "# Guide")]);
        let filter = ChangeFilter::new(&config_in(tmp.path(), TemplateSource::Builtin));

        let docs = tmp.path().join("docs");
        assert!(filter.is_relevant(&docs.join("guide.md")));
        assert!(filter.is_relevant(&docs.join("build-notes.md")));
        assert!(!filter.is_relevant(&docs.join("build/guide/index.html")));
        assert!(!filter.is_relevant(&tmp.path().join("elsewhere.md")));
    }

    #[test]
    fn template_outside_content_is_watched_by_directory() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[("docs/index.md", "# Home"), ("theme/page.html", "{{.Body}}")],
        );
        let template = tmp.path().join("theme/page.html");
        let filter = ChangeFilter::new(&config_in(
            tmp.path(),
            TemplateSource::File(template.clone()),
        ));

        let dir = filter.template_dir().unwrap();
        assert!(template.canonicalize().unwrap().starts_with(dir.canonicalize().unwrap()));
        // A save that renames a temp file over the template
        assert!(filter.is_relevant(&template));
        assert!(!filter.is_relevant(&tmp.path().join("theme/.page.html.swp")));
    }

    #[test]
    fn template_inside_content_needs_no_extra_watch() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("docs/page.html", "{{.Body}}")]);
        let filter = ChangeFilter::new(&config_in(
            tmp.path(),
            TemplateSource::File(tmp.path().join("docs/page.html")),
        ));

        assert_eq!(filter.template_dir(), None);
        assert!(filter.is_relevant(&tmp.path().join("docs/page.html")));
    }

    #[test]
    fn rebuild_picks_up_config_changes() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        let out = tmp.path().join("out");
        write_files(
            &docs,
            &[("index.md", "# Welcome"), ("config.toml", "title = \"First\"")],
        );

        rebuild_site(&docs, &out, &Overrides::default()).unwrap();
        assert!(read_output(&out, "index.html").contains("<title>Home | First</title>"));

        write_files(&docs, &[("config.toml", "title = \"Second\"")]);
        rebuild_site(&docs, &out, &Overrides::default()).unwrap();
        assert!(read_output(&out, "index.html").contains("<title>Home | Second</title>"));
    }

    #[test]
    fn rebuild_switches_to_new_template() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        let out = tmp.path().join("out");
        write_files(
            &docs,
            &[("index.md", "# Welcome"), ("plain.html", "plain {{.Title}}")],
        );

        rebuild_site(&docs, &out, &Overrides::default()).unwrap();
        assert!(read_output(&out, "index.html").starts_with("<!DOCTYPE html>"));

        write_files(&docs, &[("config.toml", "template = \"plain.html\"")]);
        rebuild_site(&docs, &out, &Overrides::default()).unwrap();
        assert_eq!(read_output(&out, "index.html"), "plain Home");
    }

    #[test]
    fn overrides_win_over_reloaded_config() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        let out = tmp.path().join("out");
        write_files(
            &docs,
            &[("index.md", "# Welcome"), ("config.toml", "title = \"File\"")],
        );
        let overrides = Overrides {
            title: Some("Flag".to_string()),
            template: None,
        };

        rebuild_site(&docs, &out, &overrides).unwrap();
        assert!(read_output(&out, "index.html").contains("<title>Home | Flag</title>"));
    }

    #[test]
    fn invalid_config_skips_rebuild_and_keeps_output() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        let out = tmp.path().join("out");
        write_files(&docs, &[("index.md", "# Welcome")]);
        rebuild_site(&docs, &out, &Overrides::default()).unwrap();

        write_files(&docs, &[("config.toml", "titel = \"typo\"")]);
        let result = rebuild_site(&docs, &out, &Overrides::default());
        assert!(matches!(result, Err(RebuildError::Config(_))));
        assert!(out.join("index.html").is_file());
    }
}
