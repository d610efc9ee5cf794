use crate::SyntaxKind::{self, *};
use crate::SyntaxNode;

pub trait Node<'a> {
    fn cast(syntax: SyntaxNode<'a>) -> Option<Self>
    where
        Self: Sized;

    fn syntax(self) -> SyntaxNode<'a>;
}

macro_rules! ast_node {
    ($($name:ident => $kind:ident,)*) => {$(
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<'a>(SyntaxNode<'a>);

        impl<'a> Node<'a> for $name<'a> {
            fn cast(syntax: SyntaxNode<'a>) -> Option<Self> {
                (syntax.kind() == $kind).then_some(Self(syntax))
            }

            fn syntax(self) -> SyntaxNode<'a> {
                self.0
            }
        }
    )*};
}

ast_node! {
    Template => TEMPLATE,
    Expression => EXPRESSION,
    Variable => VARIABLE,
    VariableName => VARIABLE_NAME,
    Filter => FILTER,
    FilterArgument => FILTER_ARGUMENT,
    Tag => TAG,
    Condition => CONDITION,
    Assignment => ASSIGNMENT,
    PairedStatement => PAIRED_STATEMENT,
    PairedComment => PAIRED_COMMENT,
    BranchStatement => BRANCH_STATEMENT,
}

fn children_of<'a, N: Node<'a> + 'a>(node: SyntaxNode<'a>) -> impl Iterator<Item = N> + 'a {
    node.children().filter_map(N::cast)
}

fn child_of<'a, N: Node<'a> + 'a>(node: SyntaxNode<'a>) -> Option<N> {
    children_of(node).next()
}

const LITERALS: [SyntaxKind; 4] = [STRING, NUMBER, BOOLEAN, NONE];

/// A top-level or block-level piece of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    Content(SyntaxNode<'a>),
    Comment(SyntaxNode<'a>),
    Expression(Expression<'a>),
    Tag(Tag<'a>),
    Paired(PairedStatement<'a>),
    PairedComment(PairedComment<'a>),
    Error(SyntaxNode<'a>),
}

impl<'a> Node<'a> for Item<'a> {
    fn cast(syntax: SyntaxNode<'a>) -> Option<Self> {
        Some(match syntax.kind() {
            CONTENT | RAW_TEXT => Self::Content(syntax),
            COMMENT => Self::Comment(syntax),
            EXPRESSION => Self::Expression(Expression(syntax)),
            TAG => Self::Tag(Tag(syntax)),
            PAIRED_STATEMENT => Self::Paired(PairedStatement(syntax)),
            PAIRED_COMMENT => Self::PairedComment(PairedComment(syntax)),
            ERROR | UNKNOWN => Self::Error(syntax),
            _ => return None,
        })
    }

    fn syntax(self) -> SyntaxNode<'a> {
        match self {
            Self::Content(it) | Self::Comment(it) | Self::Error(it) => it,
            Self::Expression(it) => it.0,
            Self::Tag(it) => it.0,
            Self::Paired(it) => it.0,
            Self::PairedComment(it) => it.0,
        }
    }
}

impl<'a> Template<'a> {
    pub fn items(self) -> impl Iterator<Item = Item<'a>> + 'a {
        children_of(self.0)
    }
}

impl<'a> Expression<'a> {
    /// The filter expression between the delimiters.
    pub fn variable(self) -> Option<Variable<'a>> {
        child_of(self.0)
    }

    /// A bare literal such as `{{ "text" }}`.
    pub fn literal(self) -> Option<SyntaxNode<'a>> {
        self.0.children().find(|child| LITERALS.contains(&child.kind()))
    }
}

impl<'a> Variable<'a> {
    pub fn name(self) -> Option<VariableName<'a>> {
        child_of(self.0)
    }

    pub fn literal(self) -> Option<SyntaxNode<'a>> {
        self.0.children().find(|child| LITERALS.contains(&child.kind()))
    }

    pub fn filters(self) -> impl Iterator<Item = Filter<'a>> + 'a {
        children_of(self.0)
    }
}

impl<'a> VariableName<'a> {
    /// The dotted lookups, `["user", "name"]` for `user.name`.
    pub fn parts<'s>(self, source: &'s str) -> impl Iterator<Item = &'s str> {
        self.0
            .children()
            .filter(|child| matches!(child.kind(), NAME | NUMBER))
            .map(move |child| child.text(source))
    }
}

impl<'a> Filter<'a> {
    pub fn name<'s>(self, source: &'s str) -> Option<&'s str> {
        self.0.child_of_kind(FILTER_NAME).map(|name| name.text(source))
    }

    pub fn argument(self) -> Option<FilterArgument<'a>> {
        child_of(self.0)
    }
}

impl<'a> FilterArgument<'a> {
    pub fn value(self) -> Option<SyntaxNode<'a>> {
        self.0.significant_children().find(|child| child.kind() != COLON)
    }

    /// The argument text with string quotes removed.
    pub fn unquoted<'s>(self, source: &'s str) -> Option<&'s str> {
        let value = self.value()?;
        let text = value.text(source);
        if value.kind() == STRING && text.len() >= 2 {
            return text.get(1..text.len() - 1);
        }
        Some(text)
    }
}

impl<'a> Tag<'a> {
    pub fn name<'s>(self, source: &'s str) -> Option<&'s str> {
        self.0.child_of_kind(TAG_NAME).map(|name| name.text(source))
    }

    pub fn condition(self) -> Option<Condition<'a>> {
        child_of(self.0)
    }

    pub fn assignments(self) -> impl Iterator<Item = Assignment<'a>> + 'a {
        children_of(self.0)
    }

    /// Named nodes after the tag name.
    pub fn arguments(self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.0.named_children().filter(|child| child.kind() != TAG_NAME)
    }
}

impl<'a> Condition<'a> {
    pub fn expr(self) -> Option<SyntaxNode<'a>> {
        self.0.named_children().next()
    }
}

impl<'a> Assignment<'a> {
    pub fn name(self) -> Option<VariableName<'a>> {
        child_of(self.0)
    }

    pub fn value(self) -> Option<SyntaxNode<'a>> {
        self.0.named_children().nth(1)
    }
}

impl<'a> PairedStatement<'a> {
    pub fn open_tag(self) -> Option<Tag<'a>> {
        child_of(self.0)
    }

    /// The `end<name>` tag, missing when the block was never closed.
    pub fn end_tag(self, source: &str) -> Option<Tag<'a>> {
        let name = self.open_tag()?.name(source)?;
        let end = self.0.last_child().filter(|last| last.index() > 0).and_then(Tag::cast)?;
        (end.name(source)?.strip_prefix("end") == Some(name)).then_some(end)
    }

    /// Items between the opening tag and the first branch or the end tag.
    pub fn body(self, source: &str) -> impl Iterator<Item = Item<'a>> + use<'a> {
        let end = self.end_tag(source).map(Node::syntax);
        self.0
            .children()
            .skip(1)
            .take_while(move |child| child.kind() != BRANCH_STATEMENT && Some(*child) != end)
            .filter_map(Item::cast)
    }

    pub fn branches(self) -> impl Iterator<Item = BranchStatement<'a>> + 'a {
        children_of(self.0)
    }
}

impl<'a> PairedComment<'a> {
    pub fn open_tag(self) -> Option<Tag<'a>> {
        child_of(self.0)
    }

    pub fn end_tag(self) -> Option<Tag<'a>> {
        children_of(self.0).nth(1)
    }

    pub fn text<'s>(self, source: &'s str) -> &'s str {
        self.0.child_of_kind(RAW_TEXT).map_or("", |raw| raw.text(source))
    }
}

impl<'a> BranchStatement<'a> {
    pub fn tag(self) -> Option<Tag<'a>> {
        child_of(self.0)
    }

    pub fn body(self) -> impl Iterator<Item = Item<'a>> + 'a {
        self.0.children().skip(1).filter_map(Item::cast)
    }
}
