use dtl_parse::{InputEdit, Parser, Tree, UsageError, language, parse};
use dtl_syntax::ast::{self, Item, Node};
use dtl_syntax::{SyntaxKind, TextRange, TextSize, WalkEvent};
use expect_test::expect;

fn parser() -> Parser {
    let mut parser = Parser::new();
    parser.set_language(language()).unwrap();
    parser
}

fn edit(
    parser: &Parser,
    old: &Tree,
    text: &str,
    range: TextRange,
    insert: &str,
) -> (String, Tree) {
    let mut new_text = text.to_owned();
    new_text.replace_range(std::ops::Range::<usize>::from(range), insert);
    let edited = old.edit(&InputEdit::replace(text, range, insert)).unwrap();
    let tree = parser.parse(&new_text, Some(&edited)).unwrap();
    (new_text, tree)
}

/// Leaves tile the whole text in order.
fn assert_covers(tree: &Tree, text: &str) {
    let mut end = TextSize::new(0);
    for event in tree.root().preorder() {
        match event {
            WalkEvent::Enter(node) if node.is_token() => {
                assert_eq!(node.start(), end, "gap or overlap before {node:?}");
                end = node.end();
            }
            _ => {}
        }
    }
    assert_eq!(end, TextSize::of(text));
}

#[test]
fn if_block() {
    let text = "{% if x %}hi{% endif %}";
    let tree = parse(text);
    assert!(tree.diagnostics().is_empty());

    let template = ast::Template::cast(tree.root()).unwrap();
    let items = template.items().collect::<Vec<_>>();
    let [Item::Paired(paired)] = items[..] else { panic!("{items:?}") };

    let open = paired.open_tag().unwrap();
    assert_eq!(open.name(text), Some("if"));
    let arguments = open.arguments().map(|node| node.kind()).collect::<Vec<_>>();
    assert_eq!(arguments, [SyntaxKind::CONDITION]);
    let condition = open.condition().unwrap().expr().unwrap();
    let variable = ast::Variable::cast(condition).unwrap();
    assert_eq!(variable.name().unwrap().parts(text).collect::<Vec<_>>(), ["x"]);

    let body = paired.body(text).map(|item| item.syntax().text(text)).collect::<Vec<_>>();
    assert_eq!(body, ["hi"]);
    assert_eq!(paired.end_tag(text).unwrap().name(text), Some("endif"));
}

#[test]
fn filter_chain() {
    let text = "{{ x|default:'y' }}";
    let tree = parse(text);
    assert!(tree.diagnostics().is_empty());

    expect![[r#"
        TEMPLATE@0..19
          EXPRESSION@0..19
            VARIABLE_OPEN@0..2 "{{"
            WHITESPACE@2..3 " "
            VARIABLE@3..16
              VARIABLE_NAME@3..4
                NAME@3..4 "x"
              PIPE@4..5 "|"
              FILTER@5..16
                FILTER_NAME@5..12
                  NAME@5..12 "default"
                FILTER_ARGUMENT@12..16
                  COLON@12..13 ":"
                  STRING@13..16 "'y'"
            WHITESPACE@16..17 " "
            VARIABLE_CLOSE@17..19 "}}"
    "#]]
    .assert_eq(&tree.root().debug_dump(text));

    let expression = tree.root().first_child().and_then(ast::Expression::cast).unwrap();
    let filters = expression.variable().unwrap().filters().collect::<Vec<_>>();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].name(text), Some("default"));
    assert_eq!(filters[0].argument().unwrap().unquoted(text), Some("y"));
}

#[test]
fn unterminated_tag() {
    let text = "{% if x";
    let tree = parse(text);

    let root = tree.root();
    assert_eq!(root.child_count(), 1);
    let error = root.first_child().unwrap();
    assert_eq!(error.kind(), SyntaxKind::ERROR);
    assert_eq!(error.range(), TextRange::up_to(TextSize::of(text)));
    assert!(tree.has_error());

    let messages = tree.diagnostics().iter().map(|d| d.message()).collect::<Vec<_>>();
    assert_eq!(messages, ["unclosed tag, expected `%}`"]);
}

#[test]
fn insert_into_variable() {
    let parser = parser();
    let text = "{{ a }}";
    let old = parser.parse(text, None).unwrap();

    let (new_text, tree) = edit(&parser, &old, text, TextRange::empty(4.into()), "b");
    assert_eq!(new_text, "{{ ab }}");
    assert_eq!(tree, parse(&new_text));
    assert!(!tree.is_edited());
}

#[test]
fn insert_into_empty_template() {
    let parser = parser();
    let old = parser.parse("", None).unwrap();

    let (new_text, tree) = edit(&parser, &old, "", TextRange::empty(0.into()), "{{ a }}");
    assert_eq!(tree, parse(&new_text));
    assert_eq!(tree.root().range(), TextRange::new(0.into(), 7.into()));

    let (_, tree) = edit(&parser, &tree, &new_text, TextRange::up_to(7.into()), "");
    assert_eq!(tree, parse(""));
}

#[test]
fn untouched_segments_are_shared() {
    let parser = parser();
    let text = "{{ a }}<p>{% b %}</p>{{ c }}";
    let old = parser.parse(text, None).unwrap();
    assert_eq!(old.segment_count(), 5);

    let (new_text, tree) = edit(&parser, &old, text, TextRange::new(13.into(), 14.into()), "bb");
    assert_eq!(new_text, "{{ a }}<p>{% bb %}</p>{{ c }}");
    assert_eq!(tree, parse(&new_text));
    assert_eq!(tree.reused_segments(), 4);

    let old_children = old.syntax().green().children();
    let new_children = tree.syntax().green().children();
    let shared = |i: usize| match (&old_children[i], &new_children[i]) {
        (dtl_syntax::NodeOrToken::Node(a), dtl_syntax::NodeOrToken::Node(b)) => a.ptr_eq(b),
        _ => false,
    };
    assert!(shared(0));
    assert!(!shared(2));
    assert!(shared(4));
}

#[test]
fn reparsing_is_idempotent() {
    let text = "{% for x in xs %}{{ x|upper }}{% empty %}-{% endfor %}{# done #}";
    assert_eq!(parse(text), parse(text));

    let parser = parser();
    let first = parser.parse(text, None).unwrap();
    let second = parser.parse(text, Some(&first)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn leaves_cover_the_text() {
    for text in [
        "",
        "plain <b>html</b> { not a tag }",
        "{% if a and not b or c in d %}x{% elif e is not None %}y{% endif %}",
        "{{ 'unterminated }}\n{% with a=1 b=\"2\" only %}{% endwith %}",
        "{% comment %}{% if %}{% endcomment %}{# multi\nline #}",
        "{{ _private.x|f:_y }}{% cycle 'a' 'b' as row silent %}",
        "{% %}{{ }}{% 1 %}{{ | }}{% if %}",
        "héllo {{ wörld }} ✓",
    ] {
        let tree = parse(text);
        assert_covers(&tree, text);
        assert_eq!(tree.text_len(), TextSize::of(text));
    }
}

#[test]
fn adversarial_input_terminates() {
    for text in ["{{ {{ {{ {{", "{% {% {%", "{{%}}%{{#", "}}%}#}", "{% if not not not %}", "{%%}"] {
        let tree = parse(text);
        assert_covers(&tree, text);
    }

    let text = "{{ {{ {{ {{";
    let tree = parse(text);
    assert_eq!(tree.root().child_count(), 4);
    assert!(tree.root().children().all(|child| child.kind() == SyntaxKind::ERROR));
}

#[test]
fn empty_template() {
    let tree = parse("");
    assert_eq!(tree.root().kind(), SyntaxKind::TEMPLATE);
    assert_eq!(tree.root().child_count(), 0);
    assert!(tree.diagnostics().is_empty());
}

#[test]
fn custom_block_tags() {
    let text = "{% mytag %}x{% endmytag %}{% other %}";
    let tree = parse(text);
    assert!(tree.diagnostics().is_empty());
    assert_eq!(
        tree.root().to_sexp(),
        "(template (paired_statement (tag (tag_name)) (content) (tag (tag_name))) (tag (tag_name)))"
    );
}

fn messages(text: &str) -> Vec<String> {
    parse(text).diagnostics().iter().map(|d| d.message().to_owned()).collect()
}

#[test]
fn branch_order() {
    let text = "{% if a %}{% else %}{% elif b %}{% endif %}";
    assert_eq!(messages(text), ["`{% elif %}` cannot follow `{% else %}`"]);

    let text = "{% for a in b %}{% elif c %}{% endfor %}";
    assert_eq!(messages(text), ["`{% elif %}` is not valid inside `{% for %}`"]);
}

#[test]
fn leading_underscores() {
    let text = "{{ _x }}";
    let tree = parse(text);
    assert_eq!(tree.root().to_sexp(), "(template (expression (variable (variable_name))))");
    assert_eq!(tree.diagnostics()[0].range(), TextRange::new(3.into(), 5.into()));
    assert_eq!(messages(text), ["variables and attributes may not begin with underscores: `_x`"]);

    let text = "{% if a._b %}{% endif %}";
    assert_eq!(messages(text), ["variables and attributes may not begin with underscores: `_b`"]);
    assert!(messages("{{ a_b.c_ }}").is_empty());
}

#[test]
fn usage_errors() {
    assert_eq!(Parser::new().parse("x", None), Err(UsageError::NoLanguage));

    let parser = parser();
    let tree = parser.parse("abc", None).unwrap();
    assert_eq!(
        parser.parse("abcd", Some(&tree)),
        Err(UsageError::LengthMismatch { tree_len: 3, text_len: 4 })
    );

    let edit = InputEdit::replace("abcdef", TextRange::new(4.into(), 6.into()), "");
    assert!(matches!(tree.edit(&edit), Err(UsageError::EditOutOfBounds { .. })));
}
