//! Browser session state: open documents (tabs), visit history, and
//! navigation including error-page recovery.

use flint_core::EngineError;
use flint_dom::Document;
use flint_html::HtmlParser;
use flint_net::ResourceLoader;
use log::debug;
use log::warn;
use url::Url;

/// In-memory stack of visited URLs for one session.
///
/// There is no forward list: popping truncates. Nothing is persisted to
/// disk.
#[derive(Debug, Clone, Default)]
pub struct History {
    pages: Vec<Url>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn push(&mut self, url: Url) {
        self.pages.push(url);
    }

    pub fn last(&self) -> Option<&Url> {
        self.pages.last()
    }

    /// Drops the most recent entry. Popping an empty history is a no-op.
    pub fn pop(&mut self) {
        self.pages.pop();
    }
}

/// One browser session: several documents (tabs), one of which is active,
/// plus the shared history and loader.
#[derive(Debug)]
pub struct Session {
    documents: Vec<Document>,
    active: usize,
    pub history: History,
    loader: ResourceLoader,
    parser: HtmlParser,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ResourceLoader::new())
    }
}

impl Session {
    pub fn new(loader: ResourceLoader) -> Self {
        Self {
            documents: vec![Document::new()],
            active: 0,
            history: History::new(),
            loader,
            parser: HtmlParser,
        }
    }

    pub fn active_document(&self) -> &Document {
        &self.documents[self.active.min(self.documents.len() - 1)]
    }

    pub fn active_document_mut(&mut self) -> &mut Document {
        let index = self.active.min(self.documents.len() - 1);
        &mut self.documents[index]
    }

    pub fn tab_count(&self) -> usize {
        self.documents.len()
    }

    /// Opens a new blank tab and makes it active, returning its index.
    pub fn open_tab(&mut self) -> usize {
        self.documents.push(Document::new());
        self.active = self.documents.len() - 1;
        self.active
    }

    /// Switches the active tab; out-of-range indices are ignored.
    pub fn switch_tab(&mut self, index: usize) -> bool {
        if index >= self.documents.len() {
            return false;
        }
        self.active = index;
        true
    }

    /// Loads `input` into the active tab.
    ///
    /// A successful load is parsed and pushed onto the history. A loader
    /// failure is recovered here: the active tab shows a generated error
    /// document and history is left untouched; it never crashes the window.
    ///
    /// The caller is responsible for scheduling a reflow afterwards; the
    /// session does not know about surfaces.
    pub fn navigate(&mut self, input: &str) {
        let document = match self.loader.load(input) {
            Ok(resource) => {
                debug!("loaded {} ({})", resource.url, resource.status_code);
                self.history.push(resource.url.clone());
                self.document_from_resource(
                    &resource.body,
                    &resource.content_type,
                    resource.url.as_str(),
                )
            }
            Err(error) => {
                warn!("navigation to `{input}` failed: {error}");
                self.error_document(input, &error)
            }
        };

        *self.active_document_mut() = document;
    }

    /// Navigates back: drops the current page and reloads the previous one
    /// without growing the history. With fewer than two entries this is a
    /// no-op.
    pub fn back(&mut self) {
        if self.history.page_count() < 2 {
            return;
        }
        self.history.pop();

        let Some(previous) = self.history.last().map(|url| url.to_string()) else {
            return;
        };
        let document = match self.loader.load(&previous) {
            Ok(resource) => self.document_from_resource(
                &resource.body,
                &resource.content_type,
                resource.url.as_str(),
            ),
            Err(error) => {
                warn!("going back to `{previous}` failed: {error}");
                self.error_document(&previous, &error)
            }
        };

        *self.active_document_mut() = document;
    }

    fn document_from_resource(&self, body: &str, content_type: &str, url: &str) -> Document {
        let mut document = if content_type.contains("html") {
            self.parser.parse(body)
        } else {
            self.parser.parse(&plain_text_markup(body))
        };
        document.url = Some(url.to_owned());
        document
    }

    fn error_document(&self, url: &str, error: &EngineError) -> Document {
        let markup = format!(
            "<html><head><title>Error</title></head><body>\
             <h1>Unable to load page</h1>\
             <p>{}</p><p>{}</p>\
             </body></html>",
            escape_text(url),
            escape_text(&error.to_string()),
        );
        let mut document = self.parser.parse(&markup);
        document.url = Some(url.to_owned());
        document
    }
}

fn plain_text_markup(body: &str) -> String {
    format!("<html><body><p>{}</p></body></html>", escape_text(body))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
