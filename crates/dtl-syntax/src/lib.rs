//! Lossless syntax tree for Django templates.
//!
//! Parsing produces a position-independent green tree whose subtrees can be
//! shared between parses. A [`SyntaxTree`] lays the green tree out in an
//! arena of positioned nodes, navigated through copyable [`SyntaxNode`]
//! handles.

/// Typed AST wrappers around the raw syntax tree.
pub mod ast;
mod builder;
mod edit;
mod green;
mod syntax_kind;
mod syntax_set;
mod tree;
mod walk;

pub use builder::Builder;
pub use edit::{InputEdit, Point};
pub use green::{GreenElement, GreenNode, GreenToken, NodeOrToken};
pub use syntax_kind::SyntaxKind;
pub use syntax_set::SyntaxSet;
pub use text_size::{TextLen, TextRange, TextSize};
pub use tree::{Children, NodeData, NodeId, SyntaxNode, SyntaxTree};
pub use walk::{Preorder, WalkEvent};
