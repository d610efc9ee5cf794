use dtl_syntax::SyntaxKind::{self, *};
use dtl_syntax::SyntaxSet;

use crate::language::LITERALS;
use crate::parser::{CompletedMarker, Marker, Parser};

/// `{{ filter_expression }}`
pub(crate) fn expression(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();

    if p.at(VARIABLE_CLOSE) {
        p.error("empty variable tag");
    } else {
        filter_expression(p);
    }

    super::arguments(p, &SyntaxSet::EMPTY, |_| {}, "variable");
    super::close(p, m, VARIABLE_CLOSE, EXPRESSION, "unclosed variable tag, expected `}}`");
}

/// `(variable_name | literal) ("|" filter)*`
///
/// A bare literal stays a plain token; anything with a name or a filter is
/// wrapped in a `VARIABLE` node. Returns whether anything was parsed.
pub(crate) fn filter_expression(p: &mut Parser<'_>) -> bool {
    let m = p.start();
    let named = match p.peek_kind() {
        NAME => {
            variable_name(p);
            true
        }
        kind if LITERALS.contains(kind) => {
            p.advance();
            false
        }
        _ => {
            m.abandon(p);
            return false;
        }
    };

    if !named && !p.at(PIPE) {
        m.abandon(p);
        return true;
    }

    while p.eat(PIPE) {
        filter(p);
    }
    m.complete(p, VARIABLE);
    true
}

/// `NAME ("." (NAME | NUMBER))*`
pub(crate) fn variable_name(p: &mut Parser<'_>) {
    let m = p.start();
    name_part(p);
    while p.eat(DOT) {
        match p.peek_kind() {
            NAME => name_part(p),
            NUMBER => p.advance(),
            _ => p.error("expected an attribute name after `.`"),
        }
    }
    m.complete(p, VARIABLE_NAME);
}

fn name_part(p: &mut Parser<'_>) {
    if p.current_text().starts_with('_') {
        p.error(format!(
            "variables and attributes may not begin with underscores: `{}`",
            p.current_text()
        ));
    }
    p.advance();
}

/// `filter_name (":" filter_argument)?`, after the `|`.
pub(crate) fn filter(p: &mut Parser<'_>) {
    if !p.at(NAME) {
        p.error("expected a filter name");
        return;
    }

    let m = p.start();
    let name = p.start();
    p.advance();
    name.complete(p, FILTER_NAME);

    if p.at(COLON) {
        let argument = p.start();
        p.advance();
        match p.peek_kind() {
            NAME => variable_name(p),
            kind if LITERALS.contains(kind) => p.advance(),
            _ => p.error("expected a filter argument after `:`"),
        }
        argument.complete(p, FILTER_ARGUMENT);
    }

    m.complete(p, FILTER);
}

const OR_BP: u8 = 1;
const AND_BP: u8 = 2;
const NOT_BP: u8 = 3;
const COMPARISON_BP: u8 = 4;

/// The argument of `{% if %}` and `{% elif %}`.
pub(crate) fn condition(p: &mut Parser<'_>) {
    let m = p.start();
    if expr_bp(p, 0) {
        m.complete(p, CONDITION);
    } else {
        m.abandon(p);
        p.error("missing condition");
    }
}

enum Lhs {
    /// Started before the operand, not yet turned into a node.
    Open(Marker),
    Done(CompletedMarker),
}

/// Smart-if expressions: `or` < `and` < `not` < comparisons.
fn expr_bp(p: &mut Parser<'_>, min_bp: u8) -> bool {
    let mut lhs = if p.at(NOT_KW) {
        let m = p.start();
        p.advance();
        if !expr_bp(p, NOT_BP) {
            p.error("expected an operand after `not`");
        }
        Lhs::Done(m.complete(p, UNARY_EXPR))
    } else {
        let m = p.start();
        if !filter_expression(p) {
            m.abandon(p);
            return false;
        }
        Lhs::Open(m)
    };

    loop {
        let Some(bp) = infix_binding_power(p.peek_kind()) else { break };
        if bp < min_bp {
            break;
        }

        let m = match lhs {
            Lhs::Open(m) => m,
            Lhs::Done(completed) => completed.precede(p),
        };
        let operator = p.current_text();
        infix_operator(p);
        if !expr_bp(p, bp + 1) {
            p.error(format!("expected an operand after `{operator}`"));
        }
        lhs = Lhs::Done(m.complete(p, BINARY_EXPR));
    }

    if let Lhs::Open(m) = lhs {
        m.abandon(p);
    }
    true
}

fn infix_binding_power(kind: SyntaxKind) -> Option<u8> {
    match kind {
        OR_KW => Some(OR_BP),
        AND_KW => Some(AND_BP),
        OPERATOR | IN_KW | IS_KW | NOT_KW => Some(COMPARISON_BP),
        _ => None,
    }
}

/// Consumes `in`, `not in`, `is`, `is not` or a comparison operator.
fn infix_operator(p: &mut Parser<'_>) {
    match p.peek_kind() {
        NOT_KW => {
            p.advance();
            if !p.eat(IN_KW) {
                p.error("expected `in` after `not`");
            }
        }
        IS_KW => {
            p.advance();
            p.eat(NOT_KW);
        }
        _ => p.advance(),
    }
}
