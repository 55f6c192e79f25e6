//! Document: the owner of one node tree plus its stylesheet rules.

use crate::hit;
use crate::style::StyleElement;
use crate::tree::DomTree;
use crate::tree::NodeId;
use flint_core::Profiler;

/// A parsed page: one root node tree, its stylesheet rules, and the source
/// metadata the session layer tracks per tab.
///
/// The document owns every node transitively through its arena; no node
/// outlives its document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tree: DomTree,
    root: Option<NodeId>,
    pub title: String,
    pub url: Option<String>,
    pub raw_source: String,
    pub scroll_y: f64,
    pub styles: Vec<StyleElement>,
    pub profiler: Profiler,
    pub debug: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some_and(|root| self.tree.is_alive(root))
    }

    /// Flags the whole document for geometry recomputation.
    pub fn request_reflow(&mut self) {
        if let Some(root) = self.root {
            self.tree.request_reflow(root);
        }
    }

    /// Flags the whole document for repaint without relayout.
    pub fn request_repaint(&mut self) {
        if let Some(root) = self.root {
            self.tree.request_repaint(root);
        }
    }

    pub fn needs_reflow(&self) -> bool {
        self.root.is_some_and(|root| self.tree.needs_reflow(root))
    }

    pub fn needs_repaint(&self) -> bool {
        self.root.is_some_and(|root| self.tree.needs_repaint(root))
    }

    /// Consumes the root-level reflow flag after the scheduler has relaid
    /// out the whole tree.
    pub fn clear_reflow(&mut self) {
        if let Some(root) = self.root {
            self.tree.clear_reflow(root);
        }
    }

    /// Consumes the root-level repaint flag after a repaint.
    pub fn clear_repaint(&mut self) {
        if let Some(root) = self.root {
            self.tree.clear_repaint(root);
        }
    }

    /// Resolves the topmost node at an absolute point, or `None` when no
    /// laid-out node contains it.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        let root = self.root?;
        hit::hit_test(&self.tree, root, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::geometry::RenderBox;

    #[test]
    fn empty_document_has_no_root_and_no_hits() {
        let document = Document::new();
        assert!(!document.has_root());
        assert_eq!(document.hit_test(10.0, 10.0), None);
    }

    #[test]
    fn document_level_dirty_requests_reach_the_whole_tree() {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        let body = document.tree_mut().create("body");
        assert!(document.tree_mut().append_child(root, body).is_ok());
        document.set_root(Some(root));

        document.request_reflow();
        assert!(document.needs_reflow());
        assert!(document.tree().needs_reflow(body));

        document.clear_reflow();
        assert!(!document.needs_reflow());
        assert!(document.tree().needs_reflow(body));
    }

    #[test]
    fn hit_test_uses_the_root_subtree() {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        document.set_root(Some(root));
        document.tree_mut().set_render_box(
            root,
            Some(RenderBox {
                width: 100.0,
                height: 100.0,
                ..RenderBox::default()
            }),
        );

        assert_eq!(document.hit_test(50.0, 50.0), Some(root));
    }

    #[test]
    fn stale_root_behaves_like_no_root() {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        document.set_root(Some(root));
        document.tree_mut().remove(root);

        assert!(!document.has_root());
        assert!(!document.needs_reflow());
        assert_eq!(document.hit_test(1.0, 1.0), None);
    }
}
