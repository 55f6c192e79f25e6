//! Node tree storage: a generational arena owned by the document.
//!
//! Parent/child links are ids into the arena, never owning pointers, so the
//! tree can hold parent back-references without reference cycles. A removed
//! node's slot may be reused; the generation bump makes old ids stale rather
//! than aliases of the new occupant.

use crate::geometry::RenderBox;
use crate::style::Style;
use flint_core::EngineError;
use flint_core::EngineResult;

/// Handle addressing a node inside its document's arena.
///
/// Stale handles (outliving their node) are detected and treated as a miss
/// by every accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn idx(self) -> usize {
        self.index as usize
    }
}

/// Generic key/value attribute. Keys are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    content: String,
    attributes: Vec<Attribute>,
    style: Option<Style>,
    render_box: Option<RenderBox>,
    needs_reflow: bool,
    needs_repaint: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: String) -> Self {
        Self {
            tag,
            content: String::new(),
            attributes: Vec::new(),
            style: None,
            render_box: None,
            needs_reflow: false,
            needs_repaint: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-backed node tree.
#[derive(Debug, Clone, Default)]
pub struct DomTree {
    slots: Vec<Option<Node>>,
    generations: Vec<u32>,
    free: Vec<usize>,
}

impl DomTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached node with the given tag.
    pub fn create(&mut self, tag: impl Into<String>) -> NodeId {
        let node = Node::new(tag.into());
        if let Some(index) = self.free.pop() {
            let generation = self.generations[index].wrapping_add(1);
            self.generations[index] = generation;
            self.slots[index] = Some(node);
            return NodeId {
                index: index as u32,
                generation,
            };
        }

        self.slots.push(Some(node));
        self.generations.push(1);
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 1,
        }
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots.get(id.idx()).is_some_and(|slot| slot.is_some())
            && self.generations[id.idx()] == id.generation
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get(id.idx()).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.idx()).and_then(|slot| slot.as_mut())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.tag.as_str())
    }

    pub fn content(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.content.as_str())
    }

    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.content = content.into();
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.node(id) {
            Some(node) => node.attributes.as_slice(),
            None => &[],
        }
    }

    pub fn push_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.attributes.push(Attribute {
                name: name.into(),
                value: value.into(),
            });
        }
    }

    /// Returns the value of the first attribute matching `name` in sequence
    /// order. Lookup is case-sensitive; a miss is `None`, not an error.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?
            .attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn style(&self, id: NodeId) -> Option<&Style> {
        self.node(id)?.style.as_ref()
    }

    pub fn set_style(&mut self, id: NodeId, style: Option<Style>) {
        if let Some(node) = self.node_mut(id) {
            node.style = style;
        }
    }

    pub fn render_box(&self, id: NodeId) -> Option<RenderBox> {
        self.node(id)?.render_box
    }

    /// Writes computed geometry. Only the layout pass may call this; an
    /// absent box means "not yet laid out".
    pub fn set_render_box(&mut self, id: NodeId, render_box: Option<RenderBox>) {
        if let Some(node) = self.node_mut(id) {
            node.render_box = render_box;
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(node) => node.children.as_slice(),
            None => &[],
        }
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// Rejected mutations leave the tree unchanged: a stale id, a child that
    /// already has a parent, or an attachment that would create a cycle all
    /// fail before anything is linked.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> EngineResult<()> {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return Err(EngineError::new(
                "dom.stale_node",
                "append_child on a stale node id",
            ));
        }

        if self.parent(child).is_some() {
            return Err(EngineError::new(
                "dom.node_attached",
                "node is already owned by a parent",
            ));
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(EngineError::new(
                    "dom.cycle",
                    "node would become its own ancestor",
                ));
            }
            ancestor = self.parent(current);
        }

        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes `id` and its whole subtree. Removing a stale id is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }

        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|existing| *existing != id);
            }
        }

        let subtree: Vec<NodeId> = self.descendants(id).collect();
        for node_id in subtree {
            self.slots[node_id.idx()] = None;
            self.free.push(node_id.idx());
        }
    }

    /// Pre-order traversal starting at `id` (the node itself first, then its
    /// children in sequence order). Document order doubles as paint order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.is_alive(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Flags `id` and every descendant as needing geometry recomputation.
    ///
    /// This is a pure cascade: it never clears flags and never reads layout
    /// state. It must mutate the live arena nodes, not copies, or the flags
    /// are silently lost.
    pub fn request_reflow(&mut self, id: NodeId) {
        self.cascade(id, |node| node.needs_reflow = true);
    }

    /// Flags `id` and every descendant as needing repaint.
    pub fn request_repaint(&mut self, id: NodeId) {
        self.cascade(id, |node| node.needs_repaint = true);
    }

    fn cascade(&mut self, id: NodeId, set: impl Fn(&mut Node)) {
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        for node_id in subtree {
            if let Some(node) = self.node_mut(node_id) {
                set(node);
            }
        }
    }

    pub fn needs_reflow(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.needs_reflow)
    }

    pub fn needs_repaint(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.needs_repaint)
    }

    /// Clears the reflow flag on this node only. The scheduler calls this
    /// after recomputing the whole subtree, so descendants' finer-grained
    /// flags need no cascading clear.
    pub fn clear_reflow(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.needs_reflow = false;
        }
    }

    /// Clears the repaint flag on this node only.
    pub fn clear_repaint(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.needs_repaint = false;
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pre-order iterator over a subtree.
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for child in self.tree.children(id).iter().rev() {
            self.stack.push(*child);
        }
        Some(id)
    }
}
