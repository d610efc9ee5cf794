use dtl_syntax::SyntaxKind::{self, *};
use dtl_syntax::SyntaxSet;
use text_size::{TextRange, TextSize};
use tracing::trace;

use crate::language::CLOSERS;
use crate::parser::{Marker, Parser};

pub(crate) mod exprs;
pub(crate) mod tags;

/// Parses one top-level segment.
pub(crate) fn segment(p: &mut Parser<'_>) {
    match p.peek_kind() {
        CONTENT | COMMENT | RAW_TEXT => p.advance(),
        VARIABLE_OPEN => exprs::expression(p),
        TAG_OPEN => tags::tag(p),
        UNKNOWN => {
            let m = p.start();
            p.error("unclosed comment, expected `#}`");
            p.advance();
            m.complete(p, ERROR);
        }
        EOF => {}
        _ => {
            let m = p.start();
            p.error("unexpected token");
            p.advance();
            m.complete(p, ERROR);
        }
    }
}

enum Recovery {
    Normal,
    Recovering { marker: Marker, start: TextSize },
}

/// Parses the rest of a delimiter pair as a sequence of `item`s.
///
/// A token outside of `first` switches to recovery: an `ERROR` node is
/// opened and a single diagnostic covers every token up to the next one that
/// can start an item, or the closing delimiter.
pub(crate) fn arguments(
    p: &mut Parser<'_>,
    first: &SyntaxSet,
    mut item: impl FnMut(&mut Parser<'_>),
    context: &str,
) {
    let mut state = Recovery::Normal;

    while !p.at_any(&CLOSERS) {
        if first.contains(p.peek_kind()) {
            if let Recovery::Recovering { marker, start } =
                std::mem::replace(&mut state, Recovery::Normal)
            {
                finish_recovery(p, marker, start, context);
            }

            let before = p.offset();
            item(p);
            if p.offset() != before {
                continue;
            }
        }

        if let Recovery::Normal = state {
            trace!(kind = ?p.peek_kind(), context, "recovering");
            state = Recovery::Recovering { start: p.offset(), marker: p.start() };
        }
        p.advance();
    }

    if let Recovery::Recovering { marker, start } = state {
        finish_recovery(p, marker, start, context);
    }
}

fn finish_recovery(p: &mut Parser<'_>, marker: Marker, start: TextSize, context: &str) {
    let range = TextRange::new(start, p.last_end());
    let message = format!("unexpected `{}` in {context}", p.text_of(range));
    p.error_at(range, message);
    marker.complete(p, ERROR);
}

/// Consumes the closing delimiter of the pair opened by `m`.
///
/// The other kind of closer is accepted with a diagnostic. Without any
/// closer the whole pair becomes an `ERROR` node.
pub(crate) fn close(
    p: &mut Parser<'_>,
    m: Marker,
    closer: SyntaxKind,
    kind: SyntaxKind,
    message: &str,
) {
    if p.at(closer) {
        p.advance();
        m.complete(p, kind);
    } else if p.at_any(&SyntaxSet::new([TAG_CLOSE, VARIABLE_CLOSE])) {
        p.error(format!("expected `{}`, found `{}`", closer.name(), p.current_text()));
        p.advance();
        m.complete(p, kind);
    } else {
        p.flush_trivia();
        p.clear_tag_name();
        let range = p.segment_range();
        p.error_at(range, message);
        m.complete(p, ERROR);
    }
}
