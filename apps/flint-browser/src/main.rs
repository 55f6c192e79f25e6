use eframe::egui;
use flint_core::EngineError;
use flint_core::EngineResult;
use flint_dom::Document;
use flint_dom::NodeId;
use flint_layout::LayoutEngine;
use flint_paint::Painter;
use flint_session::Session;
use flint_surface::CursorShape;
use flint_surface::Key;
use flint_surface::PointerButton;
use flint_surface::PollMode;
use flint_surface::PresentBackend;
use flint_surface::Surface;
use log::error;
use log::info;
use std::time::Duration;
use url::Url;

const DEFAULT_URL: &str = "about:home";
const POLL_REPAINT_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Flint")
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Flint",
        native_options,
        Box::new(|_cc| Ok(Box::new(FlintApp::new()))),
    )
}

/// Presents engine pixel buffers through an egui texture: each presenting
/// frame uploads the whole buffer and the full-surface image widget is the
/// quad that blits it.
struct EguiPresent<'a> {
    ctx: &'a egui::Context,
    texture: &'a mut Option<egui::TextureHandle>,
}

impl PresentBackend for EguiPresent<'_> {
    fn upload_pixels(&mut self, width: u32, height: u32, pixels: &[u8]) -> EngineResult<()> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(EngineError::new(
                "surface.texture_failed",
                format!(
                    "pixel buffer is {} bytes, expected {expected} for {width}x{height}",
                    pixels.len()
                ),
            ));
        }

        let image =
            egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], pixels);
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
            None => {
                *self.texture =
                    Some(self.ctx
                        .load_texture("flint-frame", image, egui::TextureOptions::NEAREST));
            }
        }
        Ok(())
    }

    fn present(&mut self) -> EngineResult<()> {
        // The swap happens when egui finishes the frame.
        Ok(())
    }
}

struct FlintApp {
    session: Session,
    surface: Surface,
    layout: LayoutEngine,
    painter: Painter,
    texture: Option<egui::TextureHandle>,
    address: String,
    pending_navigation: Option<String>,
    fatal: Option<String>,
}

impl FlintApp {
    fn new() -> Self {
        let home = std::env::var("FLINT_HOME_URL").unwrap_or_else(|_| DEFAULT_URL.to_owned());
        info!("starting with home page {home}");

        let mut app = Self {
            session: Session::default(),
            surface: Surface::new(1024, 768),
            layout: LayoutEngine,
            painter: Painter,
            texture: None,
            address: home.clone(),
            pending_navigation: None,
            fatal: None,
        };
        app.session.navigate(&home);
        app.surface.request_reflow();
        app.sync_address();
        app
    }

    fn sync_address(&mut self) {
        if let Some(url) = self.session.active_document().url.clone() {
            self.address = url;
        }
    }

    fn chrome(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("flint-chrome").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    self.session.back();
                    self.surface.request_reflow();
                    self.sync_address();
                }

                let field = ui.add_sized(
                    [ui.available_width() - 48.0, 22.0],
                    egui::TextEdit::singleline(&mut self.address),
                );
                let submitted =
                    field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Go").clicked() || submitted {
                    self.pending_navigation = Some(self.address.clone());
                }
            });
        });

        egui::TopBottomPanel::bottom("flint-status").show(ctx, |ui| {
            let document = self.session.active_document();
            let title = if document.title.is_empty() {
                "(untitled)"
            } else {
                document.title.as_str()
            };
            ui.label(format!(
                "{title} | {} page(s) in history",
                self.session.history.page_count()
            ));
        });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        let mut clicked_target: Option<NodeId> = None;

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let available = ui.available_size();
                let width = available.x.max(1.0) as u32;
                let height = available.y.max(1.0) as u32;

                let Self {
                    session,
                    surface,
                    layout,
                    painter,
                    texture,
                    ..
                } = self;

                surface.on_resize(width, height);

                let outcome = {
                    let mut backend = EguiPresent { ctx, texture };
                    surface.tick(
                        Some(session.active_document_mut()),
                        layout,
                        painter,
                        &mut backend,
                    )
                };

                match outcome {
                    Ok(outcome) => {
                        if outcome.poll == PollMode::PollEvents {
                            ctx.request_repaint_after(POLL_REPAINT_INTERVAL);
                        }
                    }
                    Err(failure) => {
                        // Presentation failures are fatal to the window.
                        error!("presentation failed: {failure}");
                        self.fatal = Some(failure.to_string());
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        return;
                    }
                }

                let Some(texture) = self.texture.as_ref() else {
                    return;
                };
                let response = ui.add(
                    egui::Image::new(texture).sense(egui::Sense::click()),
                );

                let origin = response.rect.min;
                if let Some(pointer) = response.hover_pos() {
                    self.surface.on_pointer_move(
                        f64::from(pointer.x - origin.x),
                        f64::from(pointer.y - origin.y),
                        Some(self.session.active_document()),
                    );
                }

                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    self.surface.on_scroll(
                        0.0,
                        f64::from(scroll) / 24.0,
                        Some(self.session.active_document_mut()),
                    );
                }

                if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
                    self.surface
                        .on_key(Key::Down, Some(self.session.active_document_mut()));
                }
                if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
                    self.surface
                        .on_key(Key::Up, Some(self.session.active_document_mut()));
                }

                if response.clicked() {
                    clicked_target = self.surface.on_click(
                        PointerButton::Primary,
                        false,
                        Some(self.session.active_document()),
                    );
                }

                if self.surface.cursor_shape() == CursorShape::Pointer {
                    ctx.output_mut(|output| {
                        output.cursor_icon = egui::CursorIcon::PointingHand;
                    });
                }
            });

        if let Some(target) = clicked_target {
            let document = self.session.active_document();
            if let Some(href) = link_href(document, target) {
                let destination = resolve_href(document.url.as_deref(), &href);
                self.pending_navigation = Some(destination);
            }
        }
    }
}

impl eframe::App for FlintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.fatal.is_some() {
            return;
        }

        self.chrome(ctx);
        self.canvas(ctx);

        if let Some(destination) = self.pending_navigation.take() {
            self.session.navigate(&destination);
            self.surface.request_reflow();
            self.sync_address();
            ctx.request_repaint();
        }
    }
}

/// The `href` carried by the node or its nearest ancestor link.
fn link_href(document: &Document, node: NodeId) -> Option<String> {
    let tree = document.tree();
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(href) = tree.attribute(id, "href") {
            return Some(href.to_owned());
        }
        current = tree.parent(id);
    }
    None
}

/// Resolves a possibly-relative href against the current document URL.
fn resolve_href(base: Option<&str>, href: &str) -> String {
    let absolute = base
        .and_then(|base| Url::parse(base).ok())
        .and_then(|base| base.join(href).ok())
        .map(|joined| joined.to_string());
    absolute.unwrap_or_else(|| href.to_owned())
}

#[cfg(test)]
mod tests {
    use super::link_href;
    use super::resolve_href;
    use flint_dom::Document;

    #[test]
    fn href_is_found_on_ancestors() {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        document.set_root(Some(root));
        let anchor = document.tree_mut().create("a");
        document.tree_mut().push_attribute(anchor, "href", "/docs");
        assert!(document.tree_mut().append_child(root, anchor).is_ok());
        let span = document.tree_mut().create("span");
        assert!(document.tree_mut().append_child(anchor, span).is_ok());

        assert_eq!(link_href(&document, span), Some("/docs".to_owned()));
        assert_eq!(link_href(&document, root), None);
    }

    #[test]
    fn relative_hrefs_resolve_against_the_document_url() {
        assert_eq!(
            resolve_href(Some("https://example.com/a/b"), "c"),
            "https://example.com/a/c"
        );
        assert_eq!(
            resolve_href(Some("https://example.com/"), "https://other.example/"),
            "https://other.example/"
        );
        assert_eq!(resolve_href(None, "about:blank"), "about:blank");
    }
}
