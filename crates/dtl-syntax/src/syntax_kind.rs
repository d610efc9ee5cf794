#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    CONTENT,
    COMMENT,
    RAW_TEXT,
    VARIABLE_OPEN,
    VARIABLE_CLOSE,
    TAG_OPEN,
    TAG_CLOSE,
    WHITESPACE,

    NAME,
    KEYWORD,
    NUMBER,
    STRING,
    BOOLEAN,
    NONE,

    AND_KW,
    OR_KW,
    NOT_KW,
    IN_KW,
    IS_KW,
    OPERATOR,

    PIPE,
    COLON,
    COMMA,
    EQ,
    DOT,

    UNKNOWN,
    EOF,

    TEMPLATE,
    EXPRESSION,
    VARIABLE,
    VARIABLE_NAME,
    FILTER,
    FILTER_NAME,
    FILTER_ARGUMENT,
    TAG,
    TAG_NAME,
    CONDITION,
    BINARY_EXPR,
    UNARY_EXPR,
    ASSIGNMENT,
    PAIRED_STATEMENT,
    PAIRED_COMMENT,
    BRANCH_STATEMENT,
    ERROR,
    TOMBSTONE,
}

use SyntaxKind::*;

impl SyntaxKind {
    pub const ALL: [Self; 45] = [
        CONTENT,
        COMMENT,
        RAW_TEXT,
        VARIABLE_OPEN,
        VARIABLE_CLOSE,
        TAG_OPEN,
        TAG_CLOSE,
        WHITESPACE,
        NAME,
        KEYWORD,
        NUMBER,
        STRING,
        BOOLEAN,
        NONE,
        AND_KW,
        OR_KW,
        NOT_KW,
        IN_KW,
        IS_KW,
        OPERATOR,
        PIPE,
        COLON,
        COMMA,
        EQ,
        DOT,
        UNKNOWN,
        EOF,
        TEMPLATE,
        EXPRESSION,
        VARIABLE,
        VARIABLE_NAME,
        FILTER,
        FILTER_NAME,
        FILTER_ARGUMENT,
        TAG,
        TAG_NAME,
        CONDITION,
        BINARY_EXPR,
        UNARY_EXPR,
        ASSIGNMENT,
        PAIRED_STATEMENT,
        PAIRED_COMMENT,
        BRANCH_STATEMENT,
        ERROR,
        TOMBSTONE,
    ];

    /// The stable name used by queries and the C interface.
    pub const fn name(self) -> &'static str {
        match self {
            CONTENT => "content",
            COMMENT => "comment",
            RAW_TEXT => "raw_text",
            VARIABLE_OPEN => "{{",
            VARIABLE_CLOSE => "}}",
            TAG_OPEN => "{%",
            TAG_CLOSE => "%}",
            WHITESPACE => "whitespace",
            NAME => "identifier",
            KEYWORD => "keyword",
            NUMBER => "number",
            STRING => "string",
            BOOLEAN => "boolean",
            NONE => "none",
            AND_KW => "and",
            OR_KW => "or",
            NOT_KW => "not",
            IN_KW => "in",
            IS_KW => "is",
            OPERATOR => "operator",
            PIPE => "|",
            COLON => ":",
            COMMA => ",",
            EQ => "=",
            DOT => ".",
            UNKNOWN => "unknown",
            EOF => "end",
            TEMPLATE => "template",
            EXPRESSION => "expression",
            VARIABLE => "variable",
            VARIABLE_NAME => "variable_name",
            FILTER => "filter",
            FILTER_NAME => "filter_name",
            FILTER_ARGUMENT => "filter_argument",
            TAG => "tag",
            TAG_NAME => "tag_name",
            CONDITION => "condition",
            BINARY_EXPR => "binary_expression",
            UNARY_EXPR => "unary_expression",
            ASSIGNMENT => "assignment",
            PAIRED_STATEMENT => "paired_statement",
            PAIRED_COMMENT => "paired_comment",
            BRANCH_STATEMENT => "branch_statement",
            ERROR => "ERROR",
            TOMBSTONE => "tombstone",
        }
    }

    /// Named kinds carry meaning on their own; anonymous kinds are
    /// punctuation, keyword operators and trivia.
    pub const fn is_named(self) -> bool {
        !matches!(
            self,
            VARIABLE_OPEN
                | VARIABLE_CLOSE
                | TAG_OPEN
                | TAG_CLOSE
                | WHITESPACE
                | NAME
                | AND_KW
                | OR_KW
                | NOT_KW
                | IN_KW
                | IS_KW
                | PIPE
                | COLON
                | COMMA
                | EQ
                | DOT
                | EOF
                | TOMBSTONE
        )
    }

    pub const fn is_trivia(self) -> bool {
        matches!(self, WHITESPACE)
    }

    pub const fn is_token(self) -> bool {
        (self as u16) < (TEMPLATE as u16)
    }

    pub const fn is_error(self) -> bool {
        matches!(self, ERROR | UNKNOWN)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }
}
