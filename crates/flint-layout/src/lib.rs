//! Block layout: computes every node's box geometry from styles and content.

use flint_dom::Display;
use flint_dom::Document;
use flint_dom::DomTree;
use flint_dom::EdgeSizes;
use flint_dom::NodeId;
use flint_dom::Position;
use flint_dom::RenderBox;
use flint_dom::Style;

const LINE_HEIGHT_FACTOR: f64 = 1.4;
const CHAR_ADVANCE_FACTOR: f64 = 0.5;

/// Current surface dimensions handed to the layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// The layout collaborator contract.
///
/// A pass regenerates the box of every node under the document root and must
/// be idempotent: repeated calls with an unchanged tree and viewport produce
/// identical geometry.
pub trait LayoutPass {
    fn layout(&mut self, document: &mut Document, viewport: Viewport);
}

/// Simple top-down block layout.
///
/// Blocks stack vertically inside their containing block; widths come from
/// explicit style widths or the containing width minus insets; heights come
/// from explicit style heights or estimated text height plus stacked
/// children. There is no text shaping: text height uses a fixed per-character
/// advance heuristic.
#[derive(Debug, Default)]
pub struct LayoutEngine;

impl LayoutPass for LayoutEngine {
    fn layout(&mut self, document: &mut Document, viewport: Viewport) {
        let Some(root) = document.root() else {
            return;
        };

        let tree = document.tree_mut();
        layout_block(tree, root, 0.0, 0.0, viewport.width.max(0.0));
    }
}

/// Lays out `id` with its containing block starting at (`left`, `top`) and
/// `width` available, returning the vertical space the node consumed.
fn layout_block(tree: &mut DomTree, id: NodeId, left: f64, top: f64, width: f64) -> f64 {
    let tag = tree.tag(id).unwrap_or("").to_owned();
    let style = match tree.style(id) {
        Some(resolved) => resolved.clone(),
        None => Style {
            font_size: default_font_size(&tag),
            ..Style::default()
        },
    };
    if style.display == Display::None {
        clear_boxes(tree, id);
        return 0.0;
    }

    let (margin, padding) = default_insets(&tag);
    let absolute = style.position == Position::Absolute;

    let content_left = if absolute {
        style.left.unwrap_or(0.0) + padding.left
    } else {
        left + margin.left + padding.left
    };
    let content_top = if absolute {
        style.top.unwrap_or(0.0) + padding.top
    } else {
        top + margin.top + padding.top
    };
    let content_width = style
        .width
        .unwrap_or_else(|| (width - margin.horizontal() - padding.horizontal()).max(0.0));

    let text_height = text_height(tree.content(id).unwrap_or(""), &style, content_width);

    let mut child_cursor = content_top + text_height;
    let children: Vec<NodeId> = tree.children(id).to_vec();
    for child in children {
        child_cursor += layout_block(tree, child, content_left, child_cursor, content_width);
    }

    let content_height = style.height.unwrap_or(child_cursor - content_top);

    tree.set_render_box(
        id,
        Some(RenderBox {
            top: content_top,
            left: content_left,
            width: content_width,
            height: content_height,
            margin,
            padding,
        }),
    );

    if absolute {
        return 0.0;
    }
    margin.vertical() + padding.vertical() + content_height
}

/// Estimated height of a text run at the node's font size, with a fixed
/// per-character advance instead of shaped glyph metrics.
fn text_height(content: &str, style: &Style, content_width: f64) -> f64 {
    let text = content.trim();
    if text.is_empty() {
        return 0.0;
    }

    let advance = style.font_size * CHAR_ADVANCE_FACTOR;
    let run_width = text.chars().count() as f64 * advance;
    let lines = if content_width > advance {
        (run_width / content_width).ceil().max(1.0)
    } else {
        1.0
    };
    lines * style.font_size * LINE_HEIGHT_FACTOR
}

/// Removes geometry from a subtree so `display: none` nodes are invisible to
/// hit-testing and painting even if they were laid out before.
fn clear_boxes(tree: &mut DomTree, id: NodeId) {
    let subtree: Vec<NodeId> = tree.descendants(id).collect();
    for node_id in subtree {
        tree.set_render_box(node_id, None);
    }
}

/// Per-tag default font sizes, standing in for a user-agent stylesheet.
/// Author-style resolution stays external; these apply only to unstyled
/// nodes.
fn default_font_size(tag: &str) -> f64 {
    match tag {
        "h1" => 32.0,
        "h2" => 24.0,
        "h3" => 20.0,
        "small" => 13.0,
        _ => 16.0,
    }
}

/// Per-tag default margins and paddings, standing in for a user-agent
/// stylesheet.
fn default_insets(tag: &str) -> (EdgeSizes, EdgeSizes) {
    match tag {
        "body" => (EdgeSizes::ZERO, EdgeSizes::uniform(8.0)),
        "h1" => (
            EdgeSizes {
                top: 16.0,
                bottom: 16.0,
                ..EdgeSizes::ZERO
            },
            EdgeSizes::ZERO,
        ),
        "h2" | "h3" => (
            EdgeSizes {
                top: 12.0,
                bottom: 12.0,
                ..EdgeSizes::ZERO
            },
            EdgeSizes::ZERO,
        ),
        "p" => (
            EdgeSizes {
                top: 8.0,
                bottom: 8.0,
                ..EdgeSizes::ZERO
            },
            EdgeSizes::ZERO,
        ),
        "ul" | "ol" => (
            EdgeSizes {
                top: 8.0,
                bottom: 8.0,
                ..EdgeSizes::ZERO
            },
            EdgeSizes {
                left: 24.0,
                ..EdgeSizes::ZERO
            },
        ),
        _ => (EdgeSizes::ZERO, EdgeSizes::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::LayoutEngine;
    use super::LayoutPass;
    use super::Viewport;
    use flint_dom::Display;
    use flint_dom::Document;
    use flint_dom::NodeId;
    use flint_dom::RenderBox;
    use flint_dom::Style;

    const VIEWPORT: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    fn document_with_children(count: usize) -> (Document, NodeId, Vec<NodeId>) {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        document.set_root(Some(root));

        let mut children = Vec::new();
        for _ in 0..count {
            let child = document.tree_mut().create("div");
            document
                .tree_mut()
                .set_content(child, "some readable text content");
            assert!(document.tree_mut().append_child(root, child).is_ok());
            children.push(child);
        }
        (document, root, children)
    }

    fn collect_boxes(document: &Document) -> Vec<Option<RenderBox>> {
        let Some(root) = document.root() else {
            return Vec::new();
        };
        document
            .tree()
            .descendants(root)
            .map(|id| document.tree().render_box(id))
            .collect()
    }

    #[test]
    fn every_node_gets_a_box() {
        let (mut document, _root, _children) = document_with_children(3);
        LayoutEngine.layout(&mut document, VIEWPORT);

        assert!(collect_boxes(&document).iter().all(|b| b.is_some()));
    }

    #[test]
    fn blocks_stack_top_to_bottom() {
        let (mut document, _root, children) = document_with_children(2);
        LayoutEngine.layout(&mut document, VIEWPORT);

        let first = document.tree().render_box(children[0]);
        let second = document.tree().render_box(children[1]);
        let (Some(first), Some(second)) = (first, second) else {
            panic!("children must be laid out");
        };
        assert!(second.top >= first.bottom());
        assert!(first.height > 0.0);
    }

    #[test]
    fn layout_is_idempotent() {
        let (mut document, _root, _children) = document_with_children(4);
        LayoutEngine.layout(&mut document, VIEWPORT);
        let first_pass = collect_boxes(&document);

        LayoutEngine.layout(&mut document, VIEWPORT);
        let second_pass = collect_boxes(&document);

        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn explicit_dimensions_override_computed_ones() {
        let (mut document, _root, children) = document_with_children(1);
        document.tree_mut().set_style(
            children[0],
            Some(Style {
                width: Some(120.0),
                height: Some(40.0),
                ..Style::default()
            }),
        );
        LayoutEngine.layout(&mut document, VIEWPORT);

        let Some(render_box) = document.tree().render_box(children[0]) else {
            panic!("styled child must be laid out");
        };
        assert_eq!(render_box.width, 120.0);
        assert_eq!(render_box.height, 40.0);
    }

    #[test]
    fn display_none_subtree_loses_its_boxes() {
        let (mut document, _root, children) = document_with_children(2);
        LayoutEngine.layout(&mut document, VIEWPORT);
        assert!(document.tree().render_box(children[0]).is_some());

        document.tree_mut().set_style(
            children[0],
            Some(Style {
                display: Display::None,
                ..Style::default()
            }),
        );
        LayoutEngine.layout(&mut document, VIEWPORT);

        assert!(document.tree().render_box(children[0]).is_none());
        assert!(document.tree().render_box(children[1]).is_some());
    }

    #[test]
    fn absolute_nodes_do_not_advance_the_flow() {
        let (mut document, _root, children) = document_with_children(2);
        document.tree_mut().set_style(
            children[0],
            Some(Style {
                position: flint_dom::Position::Absolute,
                top: Some(300.0),
                left: Some(40.0),
                width: Some(50.0),
                height: Some(50.0),
                ..Style::default()
            }),
        );
        LayoutEngine.layout(&mut document, VIEWPORT);

        let Some(absolute) = document.tree().render_box(children[0]) else {
            panic!("absolute child must be laid out");
        };
        let Some(flowed) = document.tree().render_box(children[1]) else {
            panic!("flowed child must be laid out");
        };
        assert_eq!(absolute.top, 300.0);
        assert!(flowed.top < 300.0, "flow must ignore the absolute sibling");
    }
}
