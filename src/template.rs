//! Page templating.
//!
//! Pages are rendered through a Go `text/template` document (via `gtmpl`).
//! The template sees exactly these fields:
//!
//! | Field | Content |
//! |-------|---------|
//! | `.Navigation` | list of `{Title, Link}`, `Home` first |
//! | `.Title` | page title |
//! | `.ProjectTitle` | site-wide title |
//! | `.Body` | page body HTML |
//! | `.Toc` | table of contents HTML, empty when the page has no headings |
//!
//! ```html
//! <nav>{{range .Navigation}}<a href="{{.Link}}">{{.Title}}</a>{{end}}</nav>
//! <h1>{{.ProjectTitle}}: {{.Title}}</h1>
//! {{if .Toc}}<aside>{{.Toc}}</aside>{{end}}
//! <main>{{.Body}}</main>
//! ```
//!
//! Values are inserted verbatim: `text/template` does no HTML escaping, which
//! is what lets `.Body` and `.Toc` carry markup.
//!
//! A template is parsed once per build and then shared read-only by all
//! render workers. When no template file is configured the built-in one in
//! `static/page.html` is used.

use crate::types::{NavLink, Page};
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse template: {0}")]
    Parse(String),
    #[error("Cannot render page {link}: {message}")]
    Render { link: String, message: String },
}

/// Built-in page template, used when no template file is configured.
pub const BUILTIN_TEMPLATE: &str = include_str!("../static/page.html");

/// A parsed page template.
pub struct PageTemplate {
    template: Template,
}

impl PageTemplate {
    /// Parse template source text.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut template = Template::default();
        template
            .parse(source)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;
        Ok(Self { template })
    }

    /// Read and parse a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// The built-in template.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    /// Render one page to a complete HTML document.
    pub fn render(
        &self,
        page: &Page,
        navigation: &[NavLink],
        project_title: &str,
    ) -> Result<String, TemplateError> {
        let render_error = |message: String| TemplateError::Render {
            link: page.link.clone(),
            message,
        };

        let context = Context::from(page_data(page, navigation, project_title))
            .map_err(|e| render_error(e.to_string()))?;

        let mut out = Vec::with_capacity(page.body.len() + page.toc.len() + 4096);
        self.template
            .execute(&mut out, &context)
            .map_err(|e| render_error(e.to_string()))?;

        String::from_utf8(out).map_err(|e| render_error(e.to_string()))
    }
}

/// The value a page template is executed against.
fn page_data(page: &Page, navigation: &[NavLink], project_title: &str) -> Value {
    let mut data: HashMap<String, Value> = HashMap::new();
    data.insert(
        "Navigation".to_owned(),
        Value::Array(navigation.iter().map(Value::from).collect()),
    );
    data.insert("Title".to_owned(), Value::String(page.title.clone()));
    data.insert(
        "ProjectTitle".to_owned(),
        Value::String(project_title.to_owned()),
    );
    data.insert("Body".to_owned(), Value::String(page.body.clone()));
    data.insert("Toc".to_owned(), Value::String(page.toc.clone()));
    Value::Object(data)
}

impl From<&NavLink> for Value {
    fn from(link: &NavLink) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Title".to_owned(), Value::String(link.title.clone()));
        m.insert("Link".to_owned(), Value::String(link.link.clone()));
        Value::Object(m)
    }
}
