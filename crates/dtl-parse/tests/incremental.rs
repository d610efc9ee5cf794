//! Reparsing after random edits must agree with parsing from scratch.

use dtl_parse::{InputEdit, Parser, Tree, language, parse};
use dtl_syntax::{TextRange, TextSize};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "{{", "}}", "{%", "%}", "{#", "#}", " ", "\n", "x", "user.name", "|", ":", "'a'", "\"b\"",
    "42", "if ", "endif", "elif", "else", "for ", " in ", "endfor", "empty", "comment",
    "endcomment", "verbatim", "endverbatim", "with a=1", "endwith", " and ", " not ", "==",
    "<p>", "é", "_", "=",
];

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..40).prop_map(|parts| parts.concat())
}

#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    len: usize,
    insert: String,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    let insert = arb_text().prop_map(|text| text.chars().take(12).collect::<String>());
    (any::<usize>(), 0usize..8, insert)
        .prop_map(|(start, len, insert)| Edit { start, len, insert })
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Applies `edit` to both the text and the tree.
fn apply(text: &mut String, tree: &Tree, edit: &Edit) -> Tree {
    let start = floor_char_boundary(text, edit.start % (text.len() + 1));
    let end = floor_char_boundary(text, start + edit.len).max(start);
    let range =
        TextRange::new(TextSize::try_from(start).unwrap(), TextSize::try_from(end).unwrap());

    let input_edit = InputEdit::replace(text, range, &edit.insert);
    text.replace_range(start..end, &edit.insert);
    tree.edit(&input_edit).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reparse_matches_fresh_parse(mut text in arb_text(), edit in arb_edit()) {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();

        let old = parser.parse(&text, None).unwrap();
        let edited = apply(&mut text, &old, &edit);
        let tree = parser.parse(&text, Some(&edited)).unwrap();

        prop_assert_eq!(tree.root().to_sexp(), parse(&text).root().to_sexp());
        prop_assert_eq!(tree, parse(&text));
    }

    #[test]
    fn several_edits_before_reparse(
        mut text in arb_text(),
        edits in prop::collection::vec(arb_edit(), 1..4),
    ) {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();

        let mut tree = parser.parse(&text, None).unwrap();
        for edit in &edits {
            tree = apply(&mut text, &tree, edit);
        }
        let tree = parser.parse(&text, Some(&tree)).unwrap();

        prop_assert_eq!(tree, parse(&text));
    }
}
