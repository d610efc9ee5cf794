//! Compiles query source into patterns.

use dtl_parse::Language;
use dtl_syntax::SyntaxKind;
use rustc_hash::FxHashMap;

use crate::{QueryError, QueryErrorKind};

#[derive(Debug)]
pub(crate) struct Pattern {
    pub(crate) root: Step,
    pub(crate) predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Matcher {
    Kind(SyntaxKind),
    /// `(_)`
    Named,
    /// `_`
    Any,
}

/// One node of a pattern.
#[derive(Debug)]
pub(crate) struct Step {
    pub(crate) matcher: Matcher,
    pub(crate) children: Vec<Step>,
    pub(crate) captures: Vec<u32>,
}

#[derive(Debug)]
pub(crate) struct Predicate {
    pub(crate) negated: bool,
    pub(crate) capture: u32,
    pub(crate) value: PredicateValue,
}

#[derive(Debug)]
pub(crate) enum PredicateValue {
    Capture(u32),
    Text(Box<str>),
}

pub(crate) struct Compiled {
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) capture_names: Vec<Box<str>>,
}

pub(crate) fn compile(language: &Language, source: &str) -> Result<Compiled, QueryError> {
    let mut compiler = Compiler {
        language,
        source,
        pos: 0,
        capture_names: Vec::new(),
        capture_ids: FxHashMap::default(),
        pending: Vec::new(),
        defined: Vec::new(),
    };

    let mut patterns = Vec::new();
    loop {
        compiler.skip_trivia();
        if compiler.peek().is_none() {
            break;
        }
        patterns.push(compiler.pattern()?);
    }

    Ok(Compiled { patterns, capture_names: compiler.capture_names })
}

/// A predicate whose captures are resolved once its pattern is complete.
struct PendingPredicate {
    negated: bool,
    capture: (usize, Box<str>),
    value: PendingValue,
}

enum PendingValue {
    Capture(usize, Box<str>),
    Text(Box<str>),
}

struct Compiler<'a> {
    language: &'a Language,
    source: &'a str,
    pos: usize,
    capture_names: Vec<Box<str>>,
    capture_ids: FxHashMap<Box<str>, u32>,
    pending: Vec<PendingPredicate>,
    /// Captures of the pattern being compiled.
    defined: Vec<u32>,
}

impl<'a> Compiler<'a> {
    fn pattern(&mut self) -> Result<Pattern, QueryError> {
        self.defined.clear();
        let root = self.step()?;

        let predicates = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|pending| self.resolve(pending))
            .collect::<Result<_, _>>()?;
        Ok(Pattern { root, predicates })
    }

    fn resolve(&self, pending: PendingPredicate) -> Result<Predicate, QueryError> {
        let capture = self.defined_capture(&pending.capture)?;
        let value = match pending.value {
            PendingValue::Capture(offset, name) => {
                PredicateValue::Capture(self.defined_capture(&(offset, name))?)
            }
            PendingValue::Text(text) => PredicateValue::Text(text),
        };
        Ok(Predicate { negated: pending.negated, capture, value })
    }

    fn defined_capture(&self, (offset, name): &(usize, Box<str>)) -> Result<u32, QueryError> {
        self.capture_ids
            .get(name)
            .copied()
            .filter(|id| self.defined.contains(id))
            .ok_or_else(|| error(*offset, QueryErrorKind::Capture(name.to_string())))
    }

    fn step(&mut self) -> Result<Step, QueryError> {
        self.skip_trivia();
        let start = self.pos;

        let (matcher, children) = match self.peek() {
            Some('(') => {
                self.bump();
                self.skip_trivia();
                let name_start = self.pos;
                let name = self.word(|c| c.is_ascii_alphanumeric() || c == '_');
                let matcher = match name {
                    "" => return Err(error(name_start, QueryErrorKind::Syntax)),
                    "_" => Matcher::Named,
                    _ => Matcher::Kind(self.kind(name_start, name)?),
                };
                (matcher, self.node_body()?)
            }
            Some('"') => {
                let text = self.string()?;
                (Matcher::Kind(self.kind(start, &text)?), Vec::new())
            }
            Some('_') => {
                self.bump();
                (Matcher::Any, Vec::new())
            }
            _ => return Err(error(start, QueryErrorKind::Syntax)),
        };

        let mut captures = Vec::new();
        loop {
            self.skip_trivia();
            if !self.eat('@') {
                break;
            }
            let name = self.capture_name();
            if name.is_empty() {
                return Err(error(self.pos, QueryErrorKind::Syntax));
            }
            let id = self.intern_capture(name);
            captures.push(id);
            self.defined.push(id);
        }

        Ok(Step { matcher, children, captures })
    }

    /// Children and predicates up to the closing parenthesis.
    fn node_body(&mut self) -> Result<Vec<Step>, QueryError> {
        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(')') => {
                    self.bump();
                    return Ok(children);
                }
                Some('(') if self.rest()[1..].trim_start().starts_with('#') => {
                    self.predicate()?;
                }
                Some(_) => children.push(self.step()?),
                None => return Err(error(self.pos, QueryErrorKind::Syntax)),
            }
        }
    }

    /// `(#eq? @capture @capture)` or `(#not-eq? @capture "text")`
    fn predicate(&mut self) -> Result<(), QueryError> {
        let offset = self.pos;
        self.bump();
        self.skip_trivia();
        self.bump();

        let name = self.word(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '?'));
        let negated = match name {
            "eq?" => false,
            "not-eq?" => true,
            _ => {
                let message = format!("unknown predicate `#{name}`");
                return Err(error(offset, QueryErrorKind::Predicate(message)));
            }
        };

        self.skip_trivia();
        let capture_offset = self.pos;
        if !self.eat('@') {
            return Err(error(
                capture_offset,
                QueryErrorKind::Predicate("expected a capture after the predicate name".to_owned()),
            ));
        }
        let capture = (capture_offset, Box::from(self.capture_name()));

        self.skip_trivia();
        let value_offset = self.pos;
        let value = match self.peek() {
            Some('@') => {
                self.bump();
                PendingValue::Capture(value_offset, Box::from(self.capture_name()))
            }
            Some('"') => PendingValue::Text(self.string()?.into_boxed_str()),
            _ => {
                return Err(error(
                    value_offset,
                    QueryErrorKind::Predicate("expected a capture or a string".to_owned()),
                ));
            }
        };

        self.skip_trivia();
        if !self.eat(')') {
            return Err(error(self.pos, QueryErrorKind::Syntax));
        }

        self.pending.push(PendingPredicate { negated, capture, value });
        Ok(())
    }

    fn kind(&self, offset: usize, name: &str) -> Result<SyntaxKind, QueryError> {
        self.language
            .kind_for_name(name)
            .ok_or_else(|| error(offset, QueryErrorKind::NodeType(name.to_owned())))
    }

    fn intern_capture(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.capture_ids.get(name) {
            return id;
        }
        let id = self.capture_names.len() as u32;
        self.capture_names.push(name.into());
        self.capture_ids.insert(name.into(), id);
        id
    }

    /// A double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
    fn string(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(error(start, QueryErrorKind::Syntax))
    }

    fn capture_name(&mut self) -> &'a str {
        self.word(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    fn word(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(';') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }
}

fn error(offset: usize, kind: QueryErrorKind) -> QueryError {
    QueryError { offset: offset as u32, kind }
}
