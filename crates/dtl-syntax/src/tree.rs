//! Red layer: an arena of positioned nodes built over a green root.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use dtl_errors::UsageError;
use la_arena::{Arena, Idx, RawIdx};
use line_index::LineIndex;
use text_size::{TextRange, TextSize};

use crate::walk::{Preorder, WalkEvent};
use crate::{GreenElement, GreenNode, InputEdit, Point, SyntaxKind};

pub type NodeId = Idx<NodeData>;

/// Per-node record of a [`SyntaxTree`]. The children of a node occupy
/// consecutive arena slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    kind: SyntaxKind,
    range: TextRange,
    parent: Option<NodeId>,
    first_child: u32,
    child_count: u32,
    index: u32,
    has_error: bool,
    has_changes: bool,
}

/// An immutable syntax tree. Cloning is cheap.
#[derive(Clone)]
pub struct SyntaxTree {
    inner: Arc<TreeInner>,
}

struct TreeInner {
    green: GreenNode,
    nodes: Arena<NodeData>,
    root: NodeId,
    text_len: TextSize,
    edited: bool,
}

impl SyntaxTree {
    pub fn new(green: GreenNode) -> Self {
        let mut nodes = Arena::new();
        let text_len = green.text_len();
        let root = nodes.alloc(NodeData {
            kind: green.kind(),
            range: TextRange::up_to(text_len),
            parent: None,
            first_child: 0,
            child_count: 0,
            index: 0,
            has_error: green.has_error(),
            has_changes: false,
        });

        let mut stack = vec![(root, green.clone(), TextSize::new(0))];
        while let Some((id, node, mut offset)) = stack.pop() {
            let first_child = raw(nodes.len());

            for (index, child) in node.children().iter().enumerate() {
                let len = child.text_len();
                let child_id = nodes.alloc(NodeData {
                    kind: child.kind(),
                    range: TextRange::at(offset, len),
                    parent: Some(id),
                    first_child: 0,
                    child_count: 0,
                    index: index as u32,
                    has_error: child.has_error(),
                    has_changes: false,
                });
                if let GreenElement::Node(child) = child {
                    stack.push((child_id, child.clone(), offset));
                }
                offset += len;
            }

            let data = &mut nodes[id];
            data.first_child = first_child;
            data.child_count = node.children().len() as u32;
        }

        Self { inner: Arc::new(TreeInner { green, nodes, root, text_len, edited: false }) }
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id: self.inner.root }
    }

    pub fn green(&self) -> &GreenNode {
        &self.inner.green
    }

    /// Length of the text the tree describes, after any edits.
    pub fn text_len(&self) -> TextSize {
        self.inner.text_len
    }

    pub fn is_edited(&self) -> bool {
        self.inner.edited
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (u32::from(id.into_raw()) < raw(self.inner.nodes.len()))
            .then_some(SyntaxNode { tree: self, id })
    }

    pub fn validate_edit(&self, edit: &InputEdit) -> Result<(), UsageError> {
        let (start, old_end, new_end) =
            (edit.start_byte.into(), edit.old_end_byte.into(), edit.new_end_byte.into());
        if start > old_end || start > new_end {
            return Err(UsageError::InvalidEdit { start, old_end, new_end });
        }
        if old_end > u32::from(self.text_len()) {
            return Err(UsageError::EditOutOfBounds { start, old_end, len: self.text_len().into() });
        }
        Ok(())
    }

    /// Returns a copy of the tree with node ranges moved to match `edit`.
    ///
    /// Nodes after the edit are shifted, nodes overlapping it are stretched
    /// over the replacement and flagged with [`SyntaxNode::has_changes`].
    pub fn edit(&self, edit: &InputEdit) -> Result<Self, UsageError> {
        self.validate_edit(edit)?;

        let mut nodes = self.inner.nodes.clone();
        for data in nodes.values_mut() {
            let range = data.range;
            if edit.touches(range) {
                data.has_changes = true;
            }
            let start = edit.map_start(range.start());
            data.range = TextRange::new(start, edit.map_end(range.end()).max(start));
        }

        let text_len = self.text_len() - (edit.old_end_byte - edit.start_byte)
            + (edit.new_end_byte - edit.start_byte);
        let root = &mut nodes[self.inner.root];
        root.range = TextRange::up_to(text_len);
        root.has_changes = true;

        Ok(Self {
            inner: Arc::new(TreeInner {
                green: self.inner.green.clone(),
                nodes,
                root: self.inner.root,
                text_len,
                edited: true,
            }),
        })
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.inner.nodes[id]
    }
}

impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.text_len() == other.text_len() && self.green() == other.green())
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.root())
            .field("nodes", &self.node_count())
            .field("edited", &self.is_edited())
            .finish()
    }
}

fn raw(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn id_at(raw_index: u32) -> NodeId {
    Idx::from_raw(RawIdx::from(raw_index))
}

/// A node or token of a [`SyntaxTree`], addressed by index.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl<'a> SyntaxNode<'a> {
    fn data(&self) -> &'a NodeData {
        self.tree.data(self.id)
    }

    fn at(&self, id: NodeId) -> Self {
        Self { tree: self.tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    pub fn start(&self) -> TextSize {
        self.range().start()
    }

    pub fn end(&self) -> TextSize {
        self.range().end()
    }

    pub fn start_point(&self, lines: &LineIndex) -> Point {
        Point::of_offset(lines, self.start())
    }

    pub fn end_point(&self, lines: &LineIndex) -> Point {
        Point::of_offset(lines, self.end())
    }

    pub fn is_named(&self) -> bool {
        self.kind().is_named()
    }

    pub fn is_token(&self) -> bool {
        self.kind().is_token()
    }

    pub fn is_error(&self) -> bool {
        self.kind() == SyntaxKind::ERROR
    }

    /// Whether this node is, or contains, an error node or an unknown token.
    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    /// Whether an edit applied to the tree overlapped this node.
    pub fn has_changes(&self) -> bool {
        self.data().has_changes
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(std::ops::Range::<usize>::from(self.range())).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| self.at(id))
    }

    pub fn index(&self) -> usize {
        self.data().index as usize
    }

    pub fn child_count(&self) -> usize {
        self.data().child_count as usize
    }

    pub fn child(&self, index: usize) -> Option<Self> {
        let data = self.data();
        let index = u32::try_from(index).ok().filter(|index| *index < data.child_count)?;
        Some(self.at(id_at(data.first_child + index)))
    }

    pub fn children(&self) -> Children<'a> {
        let data = self.data();
        let end = data.first_child + data.child_count;
        Children { tree: self.tree, next: data.first_child, end }
    }

    pub fn named_children(&self) -> impl Iterator<Item = Self> + use<'a> {
        self.children().filter(SyntaxNode::is_named)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    /// Children other than whitespace.
    pub fn significant_children(&self) -> impl Iterator<Item = Self> + use<'a> {
        self.children().filter(|child| !child.kind().is_trivia())
    }

    pub fn first_child(&self) -> Option<Self> {
        self.child(0)
    }

    pub fn last_child(&self) -> Option<Self> {
        self.child_count().checked_sub(1).and_then(|index| self.child(index))
    }

    pub fn next_sibling(&self) -> Option<Self> {
        self.parent()?.child(self.index() + 1)
    }

    pub fn prev_sibling(&self) -> Option<Self> {
        self.parent()?.child(self.index().checked_sub(1)?)
    }

    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<Self> {
        self.children().find(|child| child.kind() == kind)
    }

    pub fn ancestors(&self) -> impl Iterator<Item = Self> + use<'a> {
        std::iter::successors(Some(*self), SyntaxNode::parent)
    }

    pub fn preorder(&self) -> Preorder<'a> {
        Preorder::new(*self)
    }

    /// This node and all of its descendants, in document order.
    pub fn descendants(&self) -> impl Iterator<Item = Self> + use<'a> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    /// The node following `self` in a pre-order walk that stays inside `root`.
    pub fn next_in_preorder(&self, root: Self) -> Option<Self> {
        if let Some(child) = self.first_child() {
            return Some(child);
        }

        let mut node = *self;
        while node != root {
            if let Some(sibling) = node.next_sibling() {
                return Some(sibling);
            }
            node = node.parent()?;
        }
        None
    }

    /// Renders the named structure as an S-expression, e.g.
    /// `(template (expression (variable (variable_name))))`.
    pub fn to_sexp(&self) -> String {
        let mut buf = String::new();
        self.write_sexp(&mut buf);
        buf
    }

    fn write_sexp(&self, buf: &mut String) {
        buf.push('(');
        buf.push_str(self.kind().name());
        for child in self.named_children() {
            buf.push(' ');
            child.write_sexp(buf);
        }
        buf.push(')');
    }

    /// One line per node with kind and range, tokens followed by their text.
    pub fn debug_dump(&self, source: &str) -> String {
        let mut buf = String::new();
        let mut indent = 0;
        for event in self.preorder() {
            match event {
                WalkEvent::Enter(node) => {
                    let _ = write!(buf, "{:indent$}{:?}@{:?}", "", node.kind(), node.range());
                    if node.is_token() {
                        let _ = write!(buf, " {:?}", node.text(source));
                    }
                    buf.push('\n');
                    indent += 2;
                }
                WalkEvent::Leave(_) => indent -= 2,
            }
        }
        buf
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.range())
    }
}

#[derive(Clone)]
pub struct Children<'a> {
    tree: &'a SyntaxTree,
    next: u32,
    end: u32,
}

impl<'a> Iterator for Children<'a> {
    type Item = SyntaxNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        (self.next < self.end).then(|| {
            let id = id_at(self.next);
            self.next += 1;
            SyntaxNode { tree: self.tree, id }
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.end - self.next) as usize;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        (self.next < self.end).then(|| {
            self.end -= 1;
            SyntaxNode { tree: self.tree, id: id_at(self.end) }
        })
    }
}

impl ExactSizeIterator for Children<'_> {}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::Builder;
    use crate::SyntaxKind::*;

    // `ab{{ x }}`
    fn sample() -> SyntaxTree {
        let mut builder = Builder::new();
        builder.start_node(TEMPLATE);
        builder.token(CONTENT, 2.into());
        builder.start_node(EXPRESSION);
        builder.token(VARIABLE_OPEN, 2.into());
        builder.token(WHITESPACE, 1.into());
        builder.start_node(VARIABLE);
        builder.start_node(VARIABLE_NAME);
        builder.token(NAME, 1.into());
        builder.finish_node();
        builder.finish_node();
        builder.token(WHITESPACE, 1.into());
        builder.token(VARIABLE_CLOSE, 2.into());
        builder.finish_node();
        builder.finish_node();
        SyntaxTree::new(builder.finish_element().into_node().unwrap())
    }

    #[test]
    fn navigation() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(root.child_count(), 2);

        let expression = root.child(1).unwrap();
        assert_eq!(expression.kind(), EXPRESSION);
        assert_eq!(expression.range(), TextRange::new(2.into(), 9.into()));
        assert_eq!(expression.parent(), Some(root));
        assert_eq!(expression.prev_sibling().map(|n| n.kind()), Some(CONTENT));
        assert_eq!(expression.next_sibling(), None);
        assert_eq!(expression.child(2).unwrap().text("ab{{ x }}"), "x");
        assert_eq!(root.child(5), None);
    }

    #[test]
    fn dumps() {
        let tree = sample();
        assert_eq!(
            tree.root().to_sexp(),
            "(template (content) (expression (variable (variable_name))))"
        );
        expect![[r#"
            TEMPLATE@0..9
              CONTENT@0..2 "ab"
              EXPRESSION@2..9
                VARIABLE_OPEN@2..4 "{{"
                WHITESPACE@4..5 " "
                VARIABLE@5..6
                  VARIABLE_NAME@5..6
                    NAME@5..6 "x"
                WHITESPACE@6..7 " "
                VARIABLE_CLOSE@7..9 "}}"
        "#]]
        .assert_eq(&tree.root().debug_dump("ab{{ x }}"));
    }

    #[test]
    fn preorder_matches_descendants() {
        let tree = sample();
        let root = tree.root();
        let mut walked = vec![root];
        let mut node = root;
        while let Some(next) = node.next_in_preorder(root) {
            walked.push(next);
            node = next;
        }
        assert_eq!(walked, root.descendants().collect::<Vec<_>>());
        assert_eq!(walked.len(), tree.node_count());
    }

    #[test]
    fn edit_shifts_and_flags() {
        let tree = sample();
        let edit = InputEdit::replace("ab{{ x }}", TextRange::new(5.into(), 6.into()), "xyz");
        let edited = tree.edit(&edit).unwrap();

        let root = edited.root();
        assert!(edited.is_edited());
        assert_eq!(edited.text_len(), 11.into());
        assert_eq!(root.range(), TextRange::new(0.into(), 11.into()));
        assert!(root.has_changes());
        assert!(!root.child(0).unwrap().has_changes());

        let expression = root.child(1).unwrap();
        let name = expression.child(2).unwrap();
        assert_eq!(name.range(), TextRange::new(5.into(), 8.into()));
        assert_eq!(expression.child(4).unwrap().range(), TextRange::new(9.into(), 11.into()));
        assert!(!tree.root().has_changes());
    }

    #[test]
    fn edit_empty_tree() {
        let mut builder = Builder::new();
        builder.start_node(TEMPLATE);
        builder.finish_node();
        let tree = SyntaxTree::new(builder.finish_element().into_node().unwrap());
        assert_eq!(tree.text_len(), 0.into());

        let edit = InputEdit::replace("", TextRange::empty(0.into()), "{{ a }}");
        let edited = tree.edit(&edit).unwrap();
        let root = edited.root();
        assert_eq!(root.range(), TextRange::new(0.into(), 7.into()));
        assert!(root.has_changes());
        assert_eq!(edited.text_len(), 7.into());
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let tree = sample();
        let mut edit = InputEdit::replace("ab{{ x }}", TextRange::new(5.into(), 6.into()), "");
        edit.old_end_byte = 20.into();
        assert_eq!(
            tree.edit(&edit).unwrap_err(),
            UsageError::EditOutOfBounds { start: 5, old_end: 20, len: 9 }
        );

        edit.old_end_byte = 4.into();
        assert!(matches!(tree.edit(&edit), Err(UsageError::InvalidEdit { .. })));
    }
}
