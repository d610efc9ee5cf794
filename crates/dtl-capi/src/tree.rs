use std::ffi::{CString, c_char};
use std::ptr;
use std::sync::{Arc, LazyLock};

use dtl_parse::{InputEdit, Language, Parser, Tree, language};
use dtl_syntax::{NodeId, Point, SyntaxKind, SyntaxNode};
use la_arena::RawIdx;
use text_size::TextSize;

use crate::error::{DtlErrorCode, clear_error, fail};

pub type DtlLanguage = Language;

pub struct DtlParser {
    parser: Parser,
}

pub struct DtlTree {
    pub(crate) tree: Tree,
    /// Source of the tree, gone once the tree is edited.
    pub(crate) text: Option<Arc<str>>,
}

/// A node of a tree, or the null node when `tree` is null.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtlNode {
    pub tree: *const DtlTree,
    pub id: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtlPoint {
    pub row: u32,
    pub column: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtlInputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    pub start_point: DtlPoint,
    pub old_end_point: DtlPoint,
    pub new_end_point: DtlPoint,
}

impl DtlNode {
    pub(crate) const NULL: Self = Self { tree: ptr::null(), id: 0 };

    pub(crate) fn new(tree: &DtlTree, node: SyntaxNode<'_>) -> Self {
        Self { tree, id: u32::from(node.id().into_raw()) }
    }

    /// # Safety
    ///
    /// `self.tree` is null or points to a live tree.
    pub(crate) unsafe fn get<'a>(self) -> Option<(&'a DtlTree, SyntaxNode<'a>)> {
        let tree = unsafe { self.tree.as_ref() }?;
        let node = tree.tree.syntax().node(NodeId::from_raw(RawIdx::from(self.id)))?;
        Some((tree, node))
    }
}

impl From<DtlPoint> for Point {
    fn from(point: DtlPoint) -> Self {
        Point::new(point.row, point.column)
    }
}

impl From<&DtlInputEdit> for InputEdit {
    fn from(edit: &DtlInputEdit) -> Self {
        InputEdit {
            start_byte: TextSize::new(edit.start_byte),
            old_end_byte: TextSize::new(edit.old_end_byte),
            new_end_byte: TextSize::new(edit.new_end_byte),
            start_point: edit.start_point.into(),
            old_end_point: edit.old_end_point.into(),
            new_end_point: edit.new_end_point.into(),
        }
    }
}

static KIND_NAMES: LazyLock<Box<[CString]>> = LazyLock::new(|| {
    SyntaxKind::ALL
        .iter()
        .map(|kind| CString::new(kind.name()).expect("kind names contain no NUL"))
        .collect()
});

/// The Django template language. Never freed.
#[unsafe(no_mangle)]
pub extern "C" fn tree_sitter_django() -> *const DtlLanguage {
    language()
}

#[unsafe(no_mangle)]
pub extern "C" fn dtl_parser_new() -> *mut DtlParser {
    Box::into_raw(Box::new(DtlParser { parser: Parser::new() }))
}

/// # Safety
///
/// `parser` is null or was returned by [`dtl_parser_new`] and not deleted.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_parser_delete(parser: *mut DtlParser) {
    if !parser.is_null() {
        drop(unsafe { Box::from_raw(parser) });
    }
}

/// # Safety
///
/// `parser` and `language` are null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_parser_set_language(
    parser: *mut DtlParser,
    language: *const DtlLanguage,
) -> bool {
    clear_error();
    let (Some(parser), Some(language)) = (unsafe { parser.as_mut() }, unsafe { language.as_ref() })
    else {
        return fail(DtlErrorCode::NullPointer, false);
    };

    // Only the process-wide language can be installed.
    if !ptr::eq(language, dtl_parse::language()) {
        return fail(DtlErrorCode::IncompatibleLanguage, false);
    }
    match parser.parser.set_language(dtl_parse::language()) {
        Ok(()) => true,
        Err(error) => fail(&error, false),
    }
}

/// Parses `len` bytes of UTF-8 at `bytes`, reusing `old_tree` when it is
/// not null. `old_tree` must have been edited to match the new text.
///
/// # Safety
///
/// `bytes` points to `len` readable bytes, the handles are null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_parser_parse_string(
    parser: *const DtlParser,
    old_tree: *const DtlTree,
    bytes: *const c_char,
    len: u32,
) -> *mut DtlTree {
    clear_error();
    let Some(parser) = (unsafe { parser.as_ref() }) else {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    };
    if bytes.is_null() && len > 0 {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    }

    let bytes = if len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(bytes.cast::<u8>(), len as usize) }
    };
    let Ok(text) = std::str::from_utf8(bytes) else {
        return fail(DtlErrorCode::InvalidUtf8, ptr::null_mut());
    };
    let old = unsafe { old_tree.as_ref() }.map(|old| &old.tree);

    match parser.parser.parse(text, old) {
        Ok(tree) => Box::into_raw(Box::new(DtlTree { tree, text: Some(text.into()) })),
        Err(error) => fail(&error, ptr::null_mut()),
    }
}

/// Returns a new tree with `edit` applied. The source tree is unchanged.
///
/// # Safety
///
/// `tree` and `edit` are null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_tree_edit(
    tree: *const DtlTree,
    edit: *const DtlInputEdit,
) -> *mut DtlTree {
    clear_error();
    let (Some(tree), Some(edit)) = (unsafe { tree.as_ref() }, unsafe { edit.as_ref() }) else {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    };

    match tree.tree.edit(&InputEdit::from(edit)) {
        Ok(tree) => Box::into_raw(Box::new(DtlTree { tree, text: None })),
        Err(error) => fail(&error, ptr::null_mut()),
    }
}

/// # Safety
///
/// `tree` is null or owned by the caller. Nodes of the tree become invalid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_tree_delete(tree: *mut DtlTree) {
    if !tree.is_null() {
        drop(unsafe { Box::from_raw(tree) });
    }
}

/// # Safety
///
/// `tree` is null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_tree_root_node(tree: *const DtlTree) -> DtlNode {
    match unsafe { tree.as_ref() } {
        Some(tree) => DtlNode::new(tree, tree.tree.root()),
        None => DtlNode::NULL,
    }
}

/// Name of the node's kind as a NUL-terminated static string, or null.
///
/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_kind(node: DtlNode) -> *const c_char {
    match unsafe { node.get() } {
        Some((_, node)) => KIND_NAMES[node.kind() as usize].as_ptr(),
        None => ptr::null(),
    }
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_start_byte(node: DtlNode) -> u32 {
    unsafe { node.get() }.map_or(0, |(_, node)| node.start().into())
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_end_byte(node: DtlNode) -> u32 {
    unsafe { node.get() }.map_or(0, |(_, node)| node.end().into())
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_child_count(node: DtlNode) -> u32 {
    unsafe { node.get() }.map_or(0, |(_, node)| node.child_count() as u32)
}

/// The child at `index`, or the null node.
///
/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_child(node: DtlNode, index: u32) -> DtlNode {
    unsafe { node.get() }
        .and_then(|(tree, node)| Some(DtlNode::new(tree, node.child(index as usize)?)))
        .unwrap_or(DtlNode::NULL)
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_parent(node: DtlNode) -> DtlNode {
    unsafe { node.get() }
        .and_then(|(tree, node)| Some(DtlNode::new(tree, node.parent()?)))
        .unwrap_or(DtlNode::NULL)
}

#[unsafe(no_mangle)]
pub extern "C" fn dtl_node_is_null(node: DtlNode) -> bool {
    node.tree.is_null()
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_is_named(node: DtlNode) -> bool {
    unsafe { node.get() }.is_some_and(|(_, node)| node.is_named())
}

/// # Safety
///
/// `node` is null or belongs to a live tree.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_node_has_error(node: DtlNode) -> bool {
    unsafe { node.get() }.is_some_and(|(_, node)| node.has_error())
}
