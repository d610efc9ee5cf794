use std::ffi::c_char;
use std::ptr;

use dtl_query::{Query, QueryCursor};

use crate::error::{DtlErrorCode, clear_error, fail};
use crate::tree::{DtlLanguage, DtlNode, DtlTree};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtlQueryCapture {
    pub node: DtlNode,
    pub index: u32,
}

/// A match whose `captures` stay valid until the next call on the cursor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtlQueryMatch {
    pub pattern_index: u32,
    pub capture_count: u32,
    pub captures: *const DtlQueryCapture,
}

pub struct DtlQueryCursor {
    query: *const Query,
    tree: *const DtlTree,
    cursor: QueryCursor,
    captures: Vec<DtlQueryCapture>,
}

/// Compiles `len` bytes of query source. On failure returns null and, when
/// `error_offset` is not null, stores the byte offset of the problem there.
///
/// # Safety
///
/// `source` points to `len` readable bytes, `error_offset` is null or
/// writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_new(
    language: *const DtlLanguage,
    source: *const c_char,
    len: u32,
    error_offset: *mut u32,
) -> *mut Query {
    clear_error();
    let Some(language) = (unsafe { language.as_ref() }) else {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    };
    if source.is_null() && len > 0 {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    }

    let bytes = if len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(source.cast::<u8>(), len as usize) }
    };
    let source = match std::str::from_utf8(bytes) {
        Ok(source) => source,
        Err(error) => {
            if let Some(offset) = unsafe { error_offset.as_mut() } {
                *offset = error.valid_up_to() as u32;
            }
            return fail(DtlErrorCode::InvalidUtf8, ptr::null_mut());
        }
    };

    match Query::new(language, source) {
        Ok(query) => Box::into_raw(Box::new(query)),
        Err(error) => {
            if let Some(offset) = unsafe { error_offset.as_mut() } {
                *offset = error.offset;
            }
            fail(&error, ptr::null_mut())
        }
    }
}

/// # Safety
///
/// `query` is null or owned by the caller, with no cursor still using it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_delete(query: *mut Query) {
    if !query.is_null() {
        drop(unsafe { Box::from_raw(query) });
    }
}

/// # Safety
///
/// `query` is null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_pattern_count(query: *const Query) -> u32 {
    unsafe { query.as_ref() }.map_or(0, |query| query.pattern_count() as u32)
}

/// # Safety
///
/// `query` is null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_capture_count(query: *const Query) -> u32 {
    unsafe { query.as_ref() }.map_or(0, |query| query.capture_names().len() as u32)
}

/// Name of capture `index`, not NUL-terminated, with its length in `len`.
///
/// # Safety
///
/// `query` is null or valid, `len` is writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_capture_name_for_id(
    query: *const Query,
    index: u32,
    len: *mut u32,
) -> *const c_char {
    let name =
        unsafe { query.as_ref() }.and_then(|query| query.capture_names().get(index as usize));
    let (name, name_len) = match name {
        Some(name) => (name.as_ptr().cast::<c_char>(), name.len() as u32),
        None => (ptr::null(), 0),
    };
    if let Some(len) = unsafe { len.as_mut() } {
        *len = name_len;
    }
    name
}

/// Starts matching `query` against `node` and its descendants.
///
/// # Safety
///
/// `query` and `node` are valid and outlive the cursor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_cursor_exec(
    query: *const Query,
    node: DtlNode,
) -> *mut DtlQueryCursor {
    clear_error();
    let (Some(_), Some((tree, node))) = (unsafe { query.as_ref() }, unsafe { node.get() }) else {
        return fail(DtlErrorCode::NullPointer, ptr::null_mut());
    };
    if tree.text.is_none() {
        return fail(DtlErrorCode::EditedTree, ptr::null_mut());
    }

    Box::into_raw(Box::new(DtlQueryCursor {
        query,
        tree,
        cursor: QueryCursor::new(node),
        captures: Vec::new(),
    }))
}

/// Advances to the next match and writes it to `out`. Returns `false` once
/// the matches are exhausted.
///
/// # Safety
///
/// `cursor` is null or valid, `out` is null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_cursor_next_match(
    cursor: *mut DtlQueryCursor,
    out: *mut DtlQueryMatch,
) -> bool {
    let Some(cursor) = (unsafe { cursor.as_mut() }) else {
        return false;
    };
    let query = unsafe { cursor.query.as_ref() };
    let tree = unsafe { cursor.tree.as_ref() };
    let (Some(query), Some(tree)) = (query, tree) else {
        return false;
    };
    let Some(text) = tree.text.as_deref() else {
        return false;
    };

    let Some(found) = cursor.cursor.next_match(query, tree.tree.syntax(), text) else {
        return false;
    };
    cursor.captures.clear();
    cursor.captures.extend(found.captures.iter().map(|capture| DtlQueryCapture {
        node: DtlNode::new(tree, capture.node),
        index: capture.index,
    }));

    if let Some(out) = unsafe { out.as_mut() } {
        *out = DtlQueryMatch {
            pattern_index: found.pattern_index as u32,
            capture_count: cursor.captures.len() as u32,
            captures: cursor.captures.as_ptr(),
        };
    }
    true
}

/// # Safety
///
/// `cursor` is null or owned by the caller.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dtl_query_cursor_delete(cursor: *mut DtlQueryCursor) {
    if !cursor.is_null() {
        drop(unsafe { Box::from_raw(cursor) });
    }
}
