//! Site build orchestration.
//!
//! A build recomputes the whole site from disk:
//!
//! ```text
//! 1. Clean     output/                 removed entirely
//! 2. Scan      content/  →  paths      (scan order)
//! 3. Parse     paths     →  pages      parallel, one task per file
//! 4. Navigate  pages     →  nav links
//! 5. Template  loaded once, shared read-only
//! 6. Render    pages     →  output/    parallel, one task per page
//! ```
//!
//! ## Parallelism
//!
//! Both fan-out phases run on the rayon pool and neither starts before the
//! previous phase is complete. Parse results come back through an indexed
//! `collect`, which writes each result into the slot of its scan position,
//! so the page list is always in scan order regardless of which file
//! finished first. Render tasks write to disjoint directories and need no
//! coordination.
//!
//! ## Output Layout
//!
//! ```text
//! build/
//! ├── index.html            # index.md (link /)
//! ├── install/
//! │   └── index.html        # install.md (link /install)
//! └── cli/
//!     └── index.html        # reference/cli.md (link /cli)
//! ```
//!
//! Two files with the same base name map to the same directory; the last
//! one written wins.
//!
//! Base names `.` and `..` would map outside the output root. A build that
//! contains one fails before any page is written.
//!
//! ## Failure
//!
//! The first failing step aborts the build. Output written before the failure
//! is left in place and should be treated as invalid.

use crate::config::SiteConfig;
use crate::markdown::{CommonMark, MarkdownConverter};
use crate::navigation::build_navigation;
use crate::page::{PageError, parse_page};
use crate::scan::{ScanError, scan};
use crate::template::{PageTemplate, TemplateError};
use crate::types::{NavLink, Page};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Cannot clean output directory {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("{} maps to link {link}, which points outside the output directory", page.display())]
    UnsafeLink { link: String, page: PathBuf },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the page template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The template compiled into the binary.
    Builtin,
    /// A template file on disk.
    File(PathBuf),
}

impl TemplateSource {
    fn load(&self) -> Result<PageTemplate, TemplateError> {
        match self {
            TemplateSource::Builtin => PageTemplate::builtin(),
            TemplateSource::File(path) => PageTemplate::load(path),
        }
    }
}

/// Everything one build needs. Fixed for the duration of the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub template: TemplateSource,
    pub content_root: PathBuf,
    pub output_root: PathBuf,
    pub project_title: String,
}

/// Command-line values that take precedence over `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub title: Option<String>,
    pub template: Option<PathBuf>,
}

impl BuildConfig {
    /// Combine overrides with the site config. Overrides win; the template
    /// falls back to the built-in one when neither names a file.
    pub fn resolve(
        content_root: &Path,
        output_root: &Path,
        site: &SiteConfig,
        overrides: &Overrides,
    ) -> Self {
        let template = overrides
            .template
            .clone()
            .or_else(|| site.template_path(content_root))
            .map(TemplateSource::File)
            .unwrap_or(TemplateSource::Builtin);

        Self {
            template,
            content_root: content_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            project_title: overrides
                .title
                .clone()
                .unwrap_or_else(|| site.title.clone()),
        }
    }
}

/// A page as written by a build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPage {
    pub title: String,
    pub link: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Pages in scan order.
    pub pages: Vec<BuiltPage>,
    pub navigation: Vec<NavLink>,
    pub elapsed: Duration,
}

/// Build the site with the default markdown converter.
pub fn build(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    build_with_converter(&CommonMark, config)
}

/// Build the site with a specific markdown converter.
pub fn build_with_converter(
    converter: &impl MarkdownConverter,
    config: &BuildConfig,
) -> Result<BuildReport, BuildError> {
    let start = Instant::now();

    clean_output(&config.output_root)?;

    let paths = scan(&config.content_root)?;
    tracing::info!(count = paths.len(), "parsing pages");
    let pages = parse_pages(&paths, converter)?;
    check_links(&pages)?;

    let navigation = build_navigation(&pages);
    let template = config.template.load()?;

    tracing::info!(count = pages.len(), "rendering pages");
    let pages = pages
        .par_iter()
        .map(|page| {
            write_page(
                page,
                &navigation,
                &template,
                &config.project_title,
                &config.output_root,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let elapsed = start.elapsed();
    tracing::info!(
        pages = pages.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "build complete"
    );

    Ok(BuildReport {
        pages,
        navigation,
        elapsed,
    })
}

/// Pages and navigation of a site, parsed but not written.
#[derive(Debug, Clone, Serialize)]
pub struct SiteCheck {
    pub pages: Vec<Page>,
    pub navigation: Vec<NavLink>,
}

/// Run every build step except cleaning and writing: scan, parse, navigate
/// and load the template. Fails exactly where a build would.
pub fn check(config: &BuildConfig) -> Result<SiteCheck, BuildError> {
    check_with_converter(&CommonMark, config)
}

/// [`check`] with a specific markdown converter.
pub fn check_with_converter(
    converter: &impl MarkdownConverter,
    config: &BuildConfig,
) -> Result<SiteCheck, BuildError> {
    let paths = scan(&config.content_root)?;
    let pages = parse_pages(&paths, converter)?;
    check_links(&pages)?;
    let navigation = build_navigation(&pages);
    config.template.load()?;
    Ok(SiteCheck { pages, navigation })
}

/// Parse every path concurrently. The result is in the order of `paths`.
pub fn parse_pages(
    paths: &[PathBuf],
    converter: &impl MarkdownConverter,
) -> Result<Vec<Page>, PageError> {
    paths
        .par_iter()
        .map(|path| parse_page(path, converter))
        .collect()
}

/// Output file for a page link: `/` → `out/index.html`, `/guide` →
/// `out/guide/index.html`.
pub fn output_path(output_root: &Path, link: &str) -> PathBuf {
    let relative = link.trim_matches('/');
    if relative.is_empty() {
        output_root.join("index.html")
    } else {
        output_root.join(relative).join("index.html")
    }
}

/// Whether a link maps to a directory inside the output root. Base names
/// `.` and `..` (from `..md` and `...md`) do not.
pub fn is_safe_link(link: &str) -> bool {
    Path::new(link.trim_matches('/'))
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn check_links(pages: &[Page]) -> Result<(), BuildError> {
    match pages.iter().find(|p| !is_safe_link(&p.link)) {
        Some(page) => Err(BuildError::UnsafeLink {
            link: page.link.clone(),
            page: page.source.clone(),
        }),
        None => Ok(()),
    }
}

fn write_page(
    page: &Page,
    navigation: &[NavLink],
    template: &PageTemplate,
    project_title: &str,
    output_root: &Path,
) -> Result<BuiltPage, BuildError> {
    let html = template.render(page, navigation, project_title)?;

    let output = output_path(output_root, &page.link);
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir).map_err(|source| BuildError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(&output, html).map_err(|source| BuildError::Write {
        path: output.clone(),
        source,
    })?;

    tracing::debug!(link = %page.link, output = %output.display(), "wrote page");
    Ok(BuiltPage {
        title: page.title.clone(),
        link: page.link.clone(),
        source: page.source.clone(),
        output,
    })
}

fn clean_output(dir: &Path) -> Result<(), BuildError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BuildError::Clean {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn config_for(tmp: &TempDir) -> BuildConfig {
        BuildConfig {
            template: TemplateSource::Builtin,
            content_root: tmp.path().join("content"),
            output_root: tmp.path().join("out"),
            project_title: "Manual".to_string(),
        }
    }

    #[test]
    fn output_path_for_root_and_pages() {
        let root = Path::new("out");
        assert_eq!(output_path(root, "/"), PathBuf::from("out/index.html"));
        assert_eq!(
            output_path(root, "/guide"),
            PathBuf::from("out/guide/index.html")
        );
    }

    #[test]
    fn parse_pages_keeps_scan_order() {
        let tmp = TempDir::new().unwrap();
        let names: Vec<String> = (0..64).map(|i| format!("page{i:02}.md")).collect();
        let files: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "# T")).collect();
        write_files(tmp.path(), &files);

        let paths = scan(tmp.path()).unwrap();
        let pages = parse_pages(&paths, &CommonMark).unwrap();
        let sources: Vec<&PathBuf> = pages.iter().map(|p| &p.source).collect();
        assert_eq!(sources, paths.iter().collect::<Vec<_>>());
    }

    #[test]
    fn builds_pages_into_link_directories() {
        let tmp = TempDir::new().unwrap();
        write_files(
            &tmp.path().join("content"),
            &[("index.md", "# Welcome"), ("sub/guide.md", "# Guide")],
        );

        let report = build(&config_for(&tmp)).unwrap();
        assert_eq!(report.pages.len(), 2);
        assert!(tmp.path().join("out/index.html").is_file());
        assert!(tmp.path().join("out/guide/index.html").is_file());
    }

    #[test]
    fn previous_output_is_removed() {
        let tmp = TempDir::new().unwrap();
        write_files(&tmp.path().join("content"), &[("index.md", "# Welcome")]);
        write_files(&tmp.path().join("out"), &[("stale/index.html", "old")]);

        build(&config_for(&tmp)).unwrap();
        assert!(!tmp.path().join("out/stale").exists());
        assert!(tmp.path().join("out/index.html").is_file());
    }

    #[test]
    fn missing_template_file_fails() {
        let tmp = TempDir::new().unwrap();
        write_files(&tmp.path().join("content"), &[("index.md", "# Welcome")]);
        let config = BuildConfig {
            template: TemplateSource::File(tmp.path().join("nope.html")),
            ..config_for(&tmp)
        };

        let result = build(&config);
        assert!(matches!(
            result,
            Err(BuildError::Template(TemplateError::Read { .. }))
        ));
    }

    #[test]
    fn missing_content_root_fails() {
        let tmp = TempDir::new().unwrap();
        let result = build(&config_for(&tmp));
        assert!(matches!(result, Err(BuildError::Scan(_))));
    }

    #[test]
    fn check_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        write_files(
            &tmp.path().join("content"),
            &[("index.md", "# Welcome"), ("guide.md", "# Guide\n## Setup")],
        );

        let site = check(&config_for(&tmp)).unwrap();
        assert_eq!(site.pages.len(), 2);
        assert_eq!(site.navigation.len(), 2);
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn pages_render_through_template() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("content/guide.md", "# Setup\n\nText."),
                ("page.html", "{{.ProjectTitle}}/{{.Title}}{{range .Navigation}} {{.Link}}{{end}}"),
            ],
        );
        let config = BuildConfig {
            template: TemplateSource::File(tmp.path().join("page.html")),
            ..config_for(&tmp)
        };

        build(&config).unwrap();
        assert_eq!(
            read_output(&tmp.path().join("out"), "guide/index.html"),
            "Manual/Guide / /guide"
        );
    }

    #[test]
    fn dot_base_names_never_escape_output() {
        assert!(is_safe_link("/"));
        assert!(is_safe_link("/guide"));
        assert!(!is_safe_link("/.."));
        assert!(!is_safe_link("/."));

        let tmp = TempDir::new().unwrap();
        write_files(
            &tmp.path().join("content"),
            &[("index.md", "# Welcome"), ("...md", "# Escape")],
        );

        let result = build(&config_for(&tmp));
        assert!(matches!(
            result,
            Err(BuildError::UnsafeLink { ref link, .. }) if link == "/.."
        ));
        assert!(!tmp.path().join("index.html").exists());
        assert!(matches!(
            check(&config_for(&tmp)),
            Err(BuildError::UnsafeLink { .. })
        ));
    }

    struct Shouting;

    impl MarkdownConverter for Shouting {
        fn to_html(&self, source: &str) -> Result<String, crate::markdown::MarkdownError> {
            Ok(source.to_uppercase())
        }
    }

    #[test]
    fn check_uses_given_converter() {
        let tmp = TempDir::new().unwrap();
        write_files(&tmp.path().join("content"), &[("guide.md", "# Guide\ntext")]);

        let site = check_with_converter(&Shouting, &config_for(&tmp)).unwrap();
        assert_eq!(site.pages[0].body, "# GUIDE\nTEXT");
        // The heading-derived TOC does not depend on the converter
        assert!(site.pages[0].toc.contains(r##"href="#guide""##));
    }

    #[test]
    fn resolve_prefers_overrides() {
        let site = SiteConfig {
            title: "From File".to_string(),
            template: Some(PathBuf::from("theme.html")),
            ..SiteConfig::default()
        };
        let root = Path::new("docs");
        let out = Path::new("out");

        let config = BuildConfig::resolve(root, out, &site, &Overrides::default());
        assert_eq!(config.project_title, "From File");
        assert_eq!(
            config.template,
            TemplateSource::File(PathBuf::from("docs/theme.html"))
        );

        let overrides = Overrides {
            title: Some("From Flag".to_string()),
            template: Some(PathBuf::from("other.html")),
        };
        let config = BuildConfig::resolve(root, out, &site, &overrides);
        assert_eq!(config.project_title, "From Flag");
        assert_eq!(config.template, TemplateSource::File(PathBuf::from("other.html")));

        let config =
            BuildConfig::resolve(root, out, &SiteConfig::default(), &Overrides::default());
        assert_eq!(config.template, TemplateSource::Builtin);
        assert_eq!(config.project_title, "docs");
    }

    #[test]
    fn empty_content_builds_nothing() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("content")).unwrap();

        let report = build(&config_for(&tmp)).unwrap();
        assert!(report.pages.is_empty());
        assert_eq!(report.navigation, vec![NavLink::home()]);
    }
}
