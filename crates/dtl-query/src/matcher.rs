use dtl_syntax::{NodeId, SyntaxNode, SyntaxTree};

use crate::compile::{Matcher, Predicate, PredicateValue, Step};
use crate::{Query, QueryCapture, QueryMatch};

/// Resumable position of a match search.
///
/// The cursor holds no borrows, so it can be stored next to the tree it
/// walks and advanced one match at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCursor {
    root: NodeId,
    /// Node and pattern to try next.
    next: Option<(NodeId, usize)>,
}

impl QueryCursor {
    pub fn new(root: SyntaxNode<'_>) -> Self {
        Self { root: root.id(), next: Some((root.id(), 0)) }
    }

    /// Restarts the search from the root.
    pub fn reset(&mut self) {
        self.next = Some((self.root, 0));
    }

    pub fn next_match<'t>(
        &mut self,
        query: &Query,
        tree: &'t SyntaxTree,
        source: &str,
    ) -> Option<QueryMatch<'t>> {
        let root = tree.node(self.root)?;
        let patterns = query.patterns();

        while let Some((id, pattern_index)) = self.next {
            let node = tree.node(id)?;
            let Some(pattern) = patterns.get(pattern_index) else {
                self.next = node.next_in_preorder(root).map(|next| (next.id(), 0));
                continue;
            };
            self.next = Some((id, pattern_index + 1));

            let mut accept = |captures: &mut Vec<QueryCapture<'t>>| {
                predicates_hold(&pattern.predicates, captures, source)
            };
            let mut captures = Vec::new();
            if step_matches(&pattern.root, node, &mut captures, &mut accept) {
                return Some(QueryMatch { pattern_index, node, captures });
            }
        }
        None
    }
}

/// Iterator over the matches of a [`Query`], computed on demand.
#[derive(Debug, Clone)]
pub struct QueryMatches<'q, 't, 's> {
    query: &'q Query,
    tree: &'t SyntaxTree,
    source: &'s str,
    cursor: QueryCursor,
}

impl<'q, 't, 's> QueryMatches<'q, 't, 's> {
    pub(crate) fn new(query: &'q Query, node: SyntaxNode<'t>, source: &'s str) -> Self {
        Self { query, tree: node.tree(), source, cursor: QueryCursor::new(node) }
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl<'t> Iterator for QueryMatches<'_, 't, '_> {
    type Item = QueryMatch<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_match(self.query, self.tree, self.source)
    }
}

type Continuation<'c, 't> = dyn FnMut(&mut Vec<QueryCapture<'t>>) -> bool + 'c;

/// Matches `step` against `node`, then requires `rest` to accept the
/// captures. Backtracks over the ways child steps can be placed.
fn step_matches<'t>(
    step: &Step,
    node: SyntaxNode<'t>,
    captures: &mut Vec<QueryCapture<'t>>,
    rest: &mut Continuation<'_, 't>,
) -> bool {
    let accepted = match step.matcher {
        Matcher::Kind(kind) => node.kind() == kind,
        Matcher::Named => node.is_named(),
        Matcher::Any => !node.kind().is_trivia(),
    };
    if !accepted {
        return false;
    }

    let mark = captures.len();
    captures.extend(step.captures.iter().map(|&index| QueryCapture { index, node }));

    let children = if step.children.is_empty() {
        Vec::new()
    } else {
        node.significant_children().collect::<Vec<_>>()
    };
    if children_match(&step.children, &children, 0, captures, rest) {
        return true;
    }

    captures.truncate(mark);
    false
}

fn children_match<'t>(
    steps: &[Step],
    children: &[SyntaxNode<'t>],
    from: usize,
    captures: &mut Vec<QueryCapture<'t>>,
    rest: &mut Continuation<'_, 't>,
) -> bool {
    let Some((first, others)) = steps.split_first() else {
        return rest(captures);
    };

    (from..children.len()).any(|i| {
        let mut next = |captures: &mut Vec<QueryCapture<'t>>| {
            children_match(others, children, i + 1, captures, rest)
        };
        step_matches(first, children[i], captures, &mut next)
    })
}

fn predicates_hold(predicates: &[Predicate], captures: &[QueryCapture<'_>], source: &str) -> bool {
    let text = |index: u32| {
        captures
            .iter()
            .find(|capture| capture.index == index)
            .map(|capture| capture.node.text(source))
    };

    predicates.iter().all(|predicate| {
        let left = text(predicate.capture);
        let right = match &predicate.value {
            PredicateValue::Capture(index) => text(*index),
            PredicateValue::Text(text) => Some(&**text),
        };
        match (left, right) {
            (Some(left), Some(right)) => (left == right) != predicate.negated,
            _ => false,
        }
    })
}
