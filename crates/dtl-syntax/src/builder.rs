//! Incremental builder for green trees.

use text_size::TextSize;

use crate::{GreenElement, GreenNode, GreenToken, SyntaxKind};

const DEFAULT_TREE_DEPTH: usize = 32;
const DEFAULT_CHILDREN_LEN: usize = 64;

/// Builds green elements from a sequence of start/token/finish calls.
///
/// Already built elements, such as a reused subtree of an older tree, can be
/// spliced in with [`Builder::push`].
#[derive(Debug)]
pub struct Builder {
    parents: Vec<(SyntaxKind, usize)>,
    children: Vec<GreenElement>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Builder {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.parents.is_empty() {
            panic!("you should call `Builder::finish()`");
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            parents: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            children: Vec::with_capacity(DEFAULT_CHILDREN_LEN),
        }
    }

    /// Starts a new node of the given kind.
    pub fn start_node(&mut self, kind: SyntaxKind) {
        self.parents.push((kind, self.children.len()));
    }

    pub fn token(&mut self, kind: SyntaxKind, len: TextSize) {
        self.children.push(GreenToken::new(kind, len).into());
    }

    pub fn push(&mut self, element: GreenElement) {
        self.children.push(element);
    }

    /// Finishes the most recently started node.
    #[track_caller]
    pub fn finish_node(&mut self) {
        let (kind, first_child) = self.parents.pop().expect("no opened nodes?");
        let children = self.children.split_off(first_child);
        self.children.push(GreenNode::new(kind, children).into());
    }

    /// Number of nodes started but not finished yet.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Returns the top-level elements.
    #[track_caller]
    pub fn finish(mut self) -> Vec<GreenElement> {
        assert!(self.parents.is_empty(), "unfinished nodes: {:?}", self.parents);
        std::mem::take(&mut self.children)
    }

    /// Returns the single top-level element.
    #[track_caller]
    pub fn finish_element(self) -> GreenElement {
        let mut elements = self.finish();
        assert_eq!(elements.len(), 1, "expected a single root element");
        elements.swap_remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::Builder;
    use crate::SyntaxKind::*;

    #[test]
    fn nested_nodes() {
        let mut builder = Builder::new();
        builder.start_node(TEMPLATE);
        builder.token(CONTENT, 2.into());
        builder.start_node(EXPRESSION);
        builder.token(VARIABLE_OPEN, 2.into());
        builder.token(VARIABLE_CLOSE, 2.into());
        builder.finish_node();
        builder.finish_node();

        let root = builder.finish_element().into_node().unwrap();
        assert_eq!(root.kind(), TEMPLATE);
        assert_eq!(root.text_len(), 6.into());
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[1].kind(), EXPRESSION);
    }

    #[test]
    #[should_panic(expected = "unfinished nodes")]
    fn unfinished_node_panics() {
        let mut builder = Builder::new();
        builder.start_node(TEMPLATE);
        let _ = builder.finish();
    }
}
