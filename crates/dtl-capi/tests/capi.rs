use std::ffi::{CStr, c_char};
use std::ptr;

use dtl_capi::*;

struct Fixture {
    parser: *mut DtlParser,
}

impl Fixture {
    fn new() -> Self {
        let parser = dtl_parser_new();
        assert!(unsafe { dtl_parser_set_language(parser, tree_sitter_django()) });
        Self { parser }
    }

    fn parse(&self, text: &str, old: *const DtlTree) -> *mut DtlTree {
        unsafe { dtl_parser_parse_string(self.parser, old, chars(text), text.len() as u32) }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        unsafe { dtl_parser_delete(self.parser) }
    }
}

fn chars(text: &str) -> *const c_char {
    text.as_ptr().cast()
}

fn kind(node: DtlNode) -> &'static str {
    let name = unsafe { dtl_node_kind(node) };
    assert!(!name.is_null());
    unsafe { CStr::from_ptr(name) }.to_str().unwrap()
}

fn point(column: u32) -> DtlPoint {
    DtlPoint { row: 0, column }
}

#[test]
fn navigate_tree() {
    let fixture = Fixture::new();
    let text = "{% if a %}x{% endif %}";
    let tree = fixture.parse(text, ptr::null());
    assert!(!tree.is_null());

    unsafe {
        let root = dtl_tree_root_node(tree);
        assert_eq!(kind(root), "template");
        assert_eq!((dtl_node_start_byte(root), dtl_node_end_byte(root)), (0, 22));
        assert!(dtl_node_is_null(dtl_node_parent(root)));
        assert!(!dtl_node_has_error(root));

        let block = dtl_node_child(root, 0);
        assert_eq!(kind(block), "paired_statement");
        assert!(dtl_node_is_named(block));
        assert_eq!(dtl_node_parent(block), root);
        assert!(dtl_node_child_count(block) >= 3);

        let open = dtl_node_child(block, 0);
        assert_eq!(kind(open), "tag");
        assert_eq!(kind(dtl_node_child(open, 0)), "{%");
        assert!(!dtl_node_is_named(dtl_node_child(open, 0)));

        assert!(dtl_node_is_null(dtl_node_child(root, 99)));
        assert!(dtl_node_kind(DtlNode { tree: ptr::null(), id: 0 }).is_null());

        dtl_tree_delete(tree);
    }
}

#[test]
fn edit_and_reparse() {
    let fixture = Fixture::new();
    let tree = fixture.parse("{{ a }}{{ b }}", ptr::null());

    let edit = DtlInputEdit {
        start_byte: 3,
        old_end_byte: 4,
        new_end_byte: 6,
        start_point: point(3),
        old_end_point: point(4),
        new_end_point: point(6),
    };
    unsafe {
        let edited = dtl_tree_edit(tree, &edit);
        assert!(!edited.is_null());

        let root = dtl_tree_root_node(edited);
        assert_eq!(dtl_node_end_byte(root), 16);

        let query = dtl_query_new(tree_sitter_django(), chars("(variable)"), 10, ptr::null_mut());
        assert!(dtl_query_cursor_exec(query, root).is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::EditedTree);

        let reparsed = fixture.parse("{{ abc }}{{ b }}", edited);
        assert!(!reparsed.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::Ok);
        let first = dtl_node_child(dtl_tree_root_node(reparsed), 0);
        assert_eq!((dtl_node_start_byte(first), dtl_node_end_byte(first)), (0, 9));

        let mismatched = fixture.parse("{{ a }}", edited);
        assert!(mismatched.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::LengthMismatch);

        let out_of_bounds =
            DtlInputEdit { start_byte: 40, old_end_byte: 41, new_end_byte: 42, ..edit };
        assert!(dtl_tree_edit(tree, &out_of_bounds).is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::EditOutOfBounds);

        dtl_query_delete(query);
        dtl_tree_delete(reparsed);
        dtl_tree_delete(edited);
        dtl_tree_delete(tree);
    }
}

#[test]
fn run_query() {
    let fixture = Fixture::new();
    let text = "{{ a|upper }}{% if b %}{{ c }}{% endif %}";
    let tree = fixture.parse(text, ptr::null());
    let source = r#"(variable (variable_name) @name (#not-eq? @name "b"))"#;

    unsafe {
        let len = source.len() as u32;
        let query = dtl_query_new(tree_sitter_django(), chars(source), len, ptr::null_mut());
        assert!(!query.is_null());
        assert_eq!(dtl_query_pattern_count(query), 1);
        assert_eq!(dtl_query_capture_count(query), 1);

        let mut len = 0;
        let name = dtl_query_capture_name_for_id(query, 0, &mut len);
        let name = std::slice::from_raw_parts(name.cast::<u8>(), len as usize);
        assert_eq!(name, b"name");
        assert!(dtl_query_capture_name_for_id(query, 7, &mut len).is_null());
        assert_eq!(len, 0);

        let cursor = dtl_query_cursor_exec(query, dtl_tree_root_node(tree));
        let mut found = Vec::new();
        let mut current =
            DtlQueryMatch { pattern_index: 0, capture_count: 0, captures: ptr::null() };
        while dtl_query_cursor_next_match(cursor, &mut current) {
            assert_eq!(current.capture_count, 1);
            let capture = *current.captures;
            let range = dtl_node_start_byte(capture.node)..dtl_node_end_byte(capture.node);
            found.push(&text[range.start as usize..range.end as usize]);
        }
        assert_eq!(found, ["a", "c"]);

        dtl_query_cursor_delete(cursor);
        dtl_query_delete(query);
        dtl_tree_delete(tree);
    }
}

#[test]
fn error_codes() {
    unsafe {
        let parser = dtl_parser_new();
        let tree = dtl_parser_parse_string(parser, ptr::null(), chars("x"), 1);
        assert!(tree.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::NoLanguage);

        assert!(!dtl_parser_set_language(parser, ptr::null()));
        assert_eq!(dtl_last_error(), DtlErrorCode::NullPointer);

        assert!(dtl_parser_set_language(parser, tree_sitter_django()));
        let invalid = [b'{', 0xff];
        let tree = dtl_parser_parse_string(parser, ptr::null(), invalid.as_ptr().cast(), 2);
        assert!(tree.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::InvalidUtf8);

        let tree = dtl_parser_parse_string(parser, ptr::null(), ptr::null(), 0);
        assert!(!tree.is_null());
        assert_eq!(kind(dtl_tree_root_node(tree)), "template");
        dtl_tree_delete(tree);

        let mut offset = 0;
        let query = dtl_query_new(tree_sitter_django(), chars("(no_such_kind)"), 14, &mut offset);
        assert!(query.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::QueryNodeType);
        assert_eq!(offset, 1);

        let query = dtl_query_new(tree_sitter_django(), chars("(tag"), 4, &mut offset);
        assert!(query.is_null());
        assert_eq!(dtl_last_error(), DtlErrorCode::QuerySyntax);
        assert_eq!(offset, 4);

        dtl_parser_delete(parser);
    }
}
