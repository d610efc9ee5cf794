//! Groups tag segments into block statements.

use dtl_errors::Diagnostic;
use dtl_syntax::SyntaxKind::{self, *};
use dtl_syntax::{Builder, GreenNode};
use rustc_hash::FxHashSet;
use text_size::TextRange;

use crate::language::{BranchTag, Language};
use crate::segment::Segment;

enum Role<'s> {
    Open { name: &'s str, branches: &'static [BranchTag], kind: SyntaxKind },
    Branch(&'s str),
    End(&'s str),
    Plain,
}

struct Block<'s> {
    name: &'s str,
    branches: &'static [BranchTag],
    /// Index into `branches` of the branch being built.
    branch: Option<usize>,
    range: TextRange,
}

pub(crate) struct Nested {
    pub(crate) root: GreenNode,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Builds the `TEMPLATE` root from segments.
///
/// Known block tags open blocks, and so does any other tag `foo` whenever
/// an `{% endfoo %}` appears somewhere in the template.
pub(crate) fn nest(segments: &[Segment], language: &Language) -> Nested {
    let custom_ends = segments
        .iter()
        .filter_map(|segment| segment.tag_name()?.strip_prefix("end"))
        .filter(|name| !name.is_empty())
        .collect::<FxHashSet<_>>();

    let mut nesting =
        Nesting { builder: Builder::new(), stack: Vec::new(), diagnostics: Vec::new() };
    nesting.builder.start_node(TEMPLATE);

    for segment in segments {
        let role = match segment.tag_name() {
            Some(name) => role(name, language, &custom_ends),
            None => Role::Plain,
        };
        match role {
            Role::Open { name, branches, kind } => {
                nesting.builder.start_node(kind);
                nesting.builder.push(segment.green.clone());
                nesting.stack.push(Block { name, branches, branch: None, range: segment.range() });
            }
            Role::Branch(name) => nesting.branch(segment, name),
            Role::End(name) => nesting.end(segment, name),
            Role::Plain => nesting.builder.push(segment.green.clone()),
        }
    }

    while let Some(block) = nesting.stack.pop() {
        nesting.close_unclosed(&block);
    }
    nesting.builder.finish_node();

    let Some(root) = nesting.builder.finish_element().into_node() else {
        unreachable!("the template root is a node")
    };
    Nested { root, diagnostics: nesting.diagnostics }
}

fn role<'s>(name: &'s str, language: &Language, custom_ends: &FxHashSet<&str>) -> Role<'s> {
    if let Some(tag) = language.block_tag(name) {
        return Role::Open { name, branches: tag.branches, kind: tag.kind };
    }
    if let Some(closed) = name.strip_prefix("end").filter(|closed| !closed.is_empty()) {
        return Role::End(closed);
    }
    if language.branch_tag(name).is_some() {
        return Role::Branch(name);
    }
    if custom_ends.contains(name) {
        return Role::Open { name, branches: &[], kind: PAIRED_STATEMENT };
    }
    Role::Plain
}

struct Nesting<'s> {
    builder: Builder,
    stack: Vec<Block<'s>>,
    diagnostics: Vec<Diagnostic>,
}

impl Nesting<'_> {
    fn branch(&mut self, segment: &Segment, name: &str) {
        let Some(block) = self.stack.last_mut() else {
            return self.stray(segment, format!("`{{% {name} %}}` is not valid outside of a block"));
        };
        let Some(index) = block.branches.iter().position(|branch| branch.name == name) else {
            let message = format!("`{{% {name} %}}` is not valid inside `{{% {} %}}`", block.name);
            return self.stray(segment, message);
        };

        if let Some(previous) = block.branch {
            let repeat = index == previous && block.branches[index].repeat;
            if index < previous || (index == previous && !repeat) {
                let previous = block.branches[previous].name;
                self.diagnostics.push(Diagnostic::error(
                    format!("`{{% {name} %}}` cannot follow `{{% {previous} %}}`"),
                    segment.range(),
                ));
            }
            self.builder.finish_node();
        }
        block.branch = Some(index.max(block.branch.unwrap_or(0)));

        self.builder.start_node(BRANCH_STATEMENT);
        self.builder.push(segment.green.clone());
    }

    fn end(&mut self, segment: &Segment, name: &str) {
        let Some(depth) = self.stack.iter().rposition(|block| block.name == name) else {
            let message = format!("`{{% end{name} %}}` has no matching `{{% {name} %}}`");
            return self.stray(segment, message);
        };

        while self.stack.len() > depth + 1 {
            if let Some(inner) = self.stack.pop() {
                self.close_unclosed(&inner);
            }
        }
        if let Some(block) = self.stack.pop() {
            if block.branch.is_some() {
                self.builder.finish_node();
            }
            self.builder.push(segment.green.clone());
            self.builder.finish_node();
        }
    }

    fn close_unclosed(&mut self, block: &Block<'_>) {
        if block.branch.is_some() {
            self.builder.finish_node();
        }
        self.builder.finish_node();
        self.diagnostics.push(Diagnostic::error(
            format!("unclosed `{0}` block, expected `{{% end{0} %}}`", block.name),
            block.range,
        ));
    }

    fn stray(&mut self, segment: &Segment, message: String) {
        self.builder.start_node(ERROR);
        self.builder.push(segment.green.clone());
        self.builder.finish_node();
        self.diagnostics.push(Diagnostic::error(message, segment.range()));
    }
}
