use dtl_syntax::SyntaxKind::*;
use dtl_syntax::SyntaxSet;

use super::exprs;
use crate::language::{ARGUMENT_FIRST, LITERALS};
use crate::parser::Parser;

/// `{% tag_name arguments %}`
pub(crate) fn tag(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();

    match p.peek_kind() {
        NAME => {
            let name = p.current_text();
            let tag_name = p.start();
            p.set_tag_name();
            p.advance();
            tag_name.complete(p, TAG_NAME);

            match name {
                "if" | "elif" => if_arguments(p, name),
                "for" => for_arguments(p),
                "filter" => filter_arguments(p),
                _ => generic_arguments(p, name),
            }
        }
        TAG_CLOSE => p.error("empty block tag"),
        EOF => {}
        _ => {
            p.error("expected a tag name");
            generic_arguments(p, "");
        }
    }

    super::close(p, m, TAG_CLOSE, TAG, "unclosed tag, expected `%}`");
}

fn context(name: &str) -> String {
    if name.is_empty() { "tag".to_owned() } else { format!("`{name}` tag") }
}

fn if_arguments(p: &mut Parser<'_>, name: &str) {
    exprs::condition(p);
    super::arguments(p, &SyntaxSet::EMPTY, |_| {}, &context(name));
}

/// `variable_name ("," variable_name)* "in" filter_expression "reversed"?`
fn for_arguments(p: &mut Parser<'_>) {
    if p.at(NAME) {
        exprs::variable_name(p);
        while p.eat(COMMA) {
            if p.at(NAME) {
                exprs::variable_name(p);
            } else {
                p.error("expected a loop variable after `,`");
            }
        }
    } else {
        p.error("expected a loop variable");
    }

    if p.eat(IN_KW) {
        if !exprs::filter_expression(p) {
            p.error("expected a sequence to iterate over after `in`");
        }
        if p.at(NAME) && p.current_text() == "reversed" {
            p.advance_remap(KEYWORD);
        }
    } else {
        p.error("`for` tags should use the format `for x in y`");
    }

    super::arguments(p, &SyntaxSet::EMPTY, |_| {}, &context("for"));
}

/// `filter ("|" filter)*`
fn filter_arguments(p: &mut Parser<'_>) {
    exprs::filter(p);
    while p.eat(PIPE) {
        exprs::filter(p);
    }
    super::arguments(p, &SyntaxSet::EMPTY, |_| {}, &context("filter"));
}

fn generic_arguments(p: &mut Parser<'_>, name: &str) {
    super::arguments(p, &ARGUMENT_FIRST, argument, &context(name));
}

fn argument(p: &mut Parser<'_>) {
    match p.peek_kind() {
        NAME if p.language().is_keyword(p.current_text())
            && !matches!(p.nth_kind(1), EQ | DOT | PIPE) =>
        {
            p.advance_remap(KEYWORD);
        }
        NAME if p.nth_kind(1) == EQ => assignment(p),
        kind if kind == NAME || LITERALS.contains(kind) => {
            exprs::filter_expression(p);
        }
        _ => p.advance(),
    }
}

/// `variable_name "=" filter_expression`
fn assignment(p: &mut Parser<'_>) {
    let m = p.start();
    exprs::variable_name(p);
    p.advance();
    if !exprs::filter_expression(p) {
        p.error("expected a value after `=`");
    }
    m.complete(p, ASSIGNMENT);
}
