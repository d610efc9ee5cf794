//! C interface to the Django template parser.
//!
//! Handles are heap allocated and owned by the caller, who releases them
//! with the matching `*_delete` function. Nodes are plain values that
//! borrow their tree: a node must not outlive the tree it came from.
//!
//! Functions that can fail return a null handle or `false` and record the
//! reason, readable with [`dtl_last_error`] on the same thread.
//!
//! # Safety
//!
//! Every pointer argument must be null or point to a live object of the
//! expected type, created by this library.

mod error;
mod query;
mod tree;

pub use error::{DtlErrorCode, dtl_last_error};
pub use query::{
    DtlQueryCapture, DtlQueryCursor, DtlQueryMatch, dtl_query_capture_count,
    dtl_query_capture_name_for_id, dtl_query_cursor_delete, dtl_query_cursor_exec,
    dtl_query_cursor_next_match, dtl_query_delete, dtl_query_new, dtl_query_pattern_count,
};
pub use tree::{
    DtlInputEdit, DtlLanguage, DtlNode, DtlParser, DtlPoint, DtlTree, dtl_node_child,
    dtl_node_child_count, dtl_node_end_byte, dtl_node_has_error, dtl_node_is_named,
    dtl_node_is_null, dtl_node_kind, dtl_node_parent, dtl_node_start_byte, dtl_parser_delete,
    dtl_parser_new, dtl_parser_parse_string, dtl_parser_set_language, dtl_tree_delete,
    dtl_tree_edit, dtl_tree_root_node, tree_sitter_django,
};
