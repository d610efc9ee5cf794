//! Position-independent tree shared between parses.
//!
//! Green elements know their kind and length but not their offset, so an
//! unchanged subtree can be reused by a later parse of an edited text.

use std::fmt;
use std::sync::Arc;

use text_size::TextSize;

use crate::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    pub fn into_node(self) -> Option<N> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<T> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Node(node) => node.kind(),
            Self::Token(token) => token.kind(),
        }
    }

    pub fn text_len(&self) -> TextSize {
        match self {
            Self::Node(node) => node.text_len(),
            Self::Token(token) => token.text_len(),
        }
    }

    pub fn has_error(&self) -> bool {
        match self {
            Self::Node(node) => node.has_error(),
            Self::Token(token) => token.kind().is_error(),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        Self::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        Self::Token(token)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GreenToken {
    kind: SyntaxKind,
    len: TextSize,
}

impl GreenToken {
    pub fn new(kind: SyntaxKind, len: TextSize) -> Self {
        Self { kind, len }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn text_len(&self) -> TextSize {
        self.len
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind, self.len)
    }
}

#[derive(Clone)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenNodeData {
    kind: SyntaxKind,
    text_len: TextSize,
    has_error: bool,
    children: Box<[GreenElement]>,
}

impl GreenNode {
    pub fn new(kind: SyntaxKind, children: Vec<GreenElement>) -> Self {
        let text_len = children.iter().map(GreenElement::text_len).sum();
        let has_error = kind.is_error() || children.iter().any(GreenElement::has_error);

        Self {
            data: Arc::new(GreenNodeData {
                kind,
                text_len,
                has_error,
                children: children.into_boxed_slice(),
            }),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    /// Whether this node is, or contains, an error node or an unknown token.
    pub fn has_error(&self) -> bool {
        self.data.has_error
    }

    pub fn children(&self) -> &[GreenElement] {
        &self.data.children
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.data == other.data
    }
}

impl Eq for GreenNode {}

impl std::hash::Hash for GreenNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("children", &self.children().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind::*;

    fn token(kind: SyntaxKind, len: u32) -> GreenElement {
        GreenToken::new(kind, len.into()).into()
    }

    #[test]
    fn node_sums_children() {
        let node = GreenNode::new(
            EXPRESSION,
            vec![token(VARIABLE_OPEN, 2), token(WHITESPACE, 1), token(VARIABLE_CLOSE, 2)],
        );
        assert_eq!(node.text_len(), 5.into());
        assert!(!node.has_error());
    }

    #[test]
    fn error_propagates_up() {
        let inner = GreenNode::new(ERROR, vec![token(TAG_OPEN, 2)]);
        let outer = GreenNode::new(TEMPLATE, vec![inner.into(), token(CONTENT, 3)]);
        assert!(outer.has_error());

        let unknown = GreenNode::new(TAG, vec![token(UNKNOWN, 1)]);
        assert!(unknown.has_error());
    }

    #[test]
    fn structural_equality() {
        let a = GreenNode::new(TEMPLATE, vec![token(CONTENT, 3)]);
        let b = GreenNode::new(TEMPLATE, vec![token(CONTENT, 3)]);
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }
}
