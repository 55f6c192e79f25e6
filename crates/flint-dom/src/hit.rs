//! Point-to-node resolution for pointer event routing.

use crate::tree::DomTree;
use crate::tree::NodeId;

/// Resolves the node that should receive a pointer event at `(x, y)`.
///
/// Walks the subtree under `root` in pre-order; every laid-out node whose box
/// contains the point (exclusive edges) overwrites the previous candidate, so
/// the result is the last match in document order: the visually topmost node,
/// since document order doubles as paint order. A non-matching node never
/// prunes its subtree: boxes are absolute, so a child can contain a point its
/// parent does not.
///
/// Nodes without computed geometry are invisible here: they never match and
/// never block deeper matches. `None` means "no target", not an error.
pub fn hit_test(tree: &DomTree, root: NodeId, x: f64, y: f64) -> Option<NodeId> {
    let mut target = None;

    for id in tree.descendants(root) {
        if let Some(render_box) = tree.render_box(id) {
            if render_box.contains(x, y) {
                target = Some(id);
            }
        }
    }

    target
}
