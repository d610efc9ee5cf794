//! The grammar table: Django's tag vocabulary and the syntax kind metadata.

use std::fmt;
use std::sync::LazyLock;

use dtl_errors::UsageError;
use dtl_syntax::SyntaxKind::{self, *};
use dtl_syntax::SyntaxSet;
use rustc_hash::FxHashMap;

pub const LANGUAGE_VERSION: u32 = 1;
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 1;

/// A tag that may appear between a block's opening and closing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTag {
    pub name: &'static str,
    /// Whether the branch may appear several times in a row (`elif`).
    pub repeat: bool,
}

/// A tag that opens a block closed by `end<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTag {
    pub name: &'static str,
    /// Legal branches, in the order they must appear.
    pub branches: &'static [BranchTag],
    /// The body is raw text, not template syntax.
    pub raw: bool,
    pub kind: SyntaxKind,
}

const fn block(name: &'static str) -> BlockTag {
    BlockTag { name, branches: &[], raw: false, kind: PAIRED_STATEMENT }
}

const fn branch(name: &'static str) -> BranchTag {
    BranchTag { name, repeat: false }
}

const PLURAL: &[BranchTag] = &[branch("plural")];

const BLOCK_TAGS: &[BlockTag] = &[
    block("autoescape"),
    block("block"),
    BlockTag { branches: PLURAL, ..block("blocktrans") },
    BlockTag { branches: PLURAL, ..block("blocktranslate") },
    block("cache"),
    BlockTag { raw: true, kind: PAIRED_COMMENT, ..block("comment") },
    block("filter"),
    BlockTag { branches: &[branch("empty")], ..block("for") },
    BlockTag {
        branches: &[BranchTag { name: "elif", repeat: true }, branch("else")],
        ..block("if")
    },
    BlockTag { branches: &[branch("else")], ..block("ifchanged") },
    block("language"),
    block("localize"),
    block("localtime"),
    block("spaceless"),
    block("timezone"),
    BlockTag { raw: true, ..block("verbatim") },
    block("with"),
];

/// Words that are keywords, not variables, in tag arguments.
const KEYWORDS: &[&str] = &[
    "as", "asvar", "by", "context", "count", "from", "noop", "off", "on", "only", "random",
    "reversed", "silent", "trimmed", "with",
];

pub(crate) const LITERALS: SyntaxSet = SyntaxSet::new([STRING, NUMBER, BOOLEAN, NONE]);

pub(crate) const EXPRESSION_FIRST: SyntaxSet = LITERALS.with(NAME);

/// Tokens that start an argument of a generic tag.
pub(crate) const ARGUMENT_FIRST: SyntaxSet = EXPRESSION_FIRST.union(&SyntaxSet::new([
    OPERATOR, AND_KW, OR_KW, NOT_KW, IN_KW, IS_KW, COMMA, EQ,
]));

/// Tokens that end the inside of a delimiter pair. `EOF` stands for the end
/// of the segment.
pub(crate) const CLOSERS: SyntaxSet = SyntaxSet::new([TAG_CLOSE, VARIABLE_CLOSE, EOF]);

pub struct Language {
    version: u32,
    block_tags: FxHashMap<&'static str, &'static BlockTag>,
    branch_tags: FxHashMap<&'static str, BranchTag>,
    kinds: FxHashMap<&'static str, SyntaxKind>,
}

static LANGUAGE: LazyLock<Language> = LazyLock::new(|| Language::new(LANGUAGE_VERSION));

/// The Django template language.
pub fn language() -> &'static Language {
    &LANGUAGE
}

impl Language {
    pub(crate) fn new(version: u32) -> Self {
        let block_tags = BLOCK_TAGS.iter().map(|tag| (tag.name, tag)).collect();
        let branch_tags = BLOCK_TAGS
            .iter()
            .flat_map(|tag| tag.branches.iter())
            .map(|branch| (branch.name, *branch))
            .collect();
        let kinds = SyntaxKind::ALL
            .into_iter()
            .filter(|kind| *kind != TOMBSTONE)
            .map(|kind| (kind.name(), kind))
            .collect();

        Self { version, block_tags, branch_tags, kinds }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn check_compatible(&self) -> Result<(), UsageError> {
        if (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&self.version) {
            Ok(())
        } else {
            Err(UsageError::IncompatibleLanguage {
                version: self.version,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            })
        }
    }

    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn kind_for_name(&self, name: &str) -> Option<SyntaxKind> {
        self.kinds.get(name).copied()
    }

    pub fn block_tag(&self, name: &str) -> Option<&'static BlockTag> {
        self.block_tags.get(name).copied()
    }

    pub fn block_tags(&self) -> impl Iterator<Item = &'static BlockTag> {
        BLOCK_TAGS.iter()
    }

    pub fn branch_tag(&self, name: &str) -> Option<BranchTag> {
        self.branch_tags.get(name).copied()
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        KEYWORDS.binary_search(&word).is_ok()
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("version", &self.version)
            .field("block_tags", &self.block_tags.len())
            .field("kinds", &self.kinds.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_sorted() {
        assert!(KEYWORDS.is_sorted());
        assert!(language().is_keyword("as"));
        assert!(!language().is_keyword("user"));
    }

    #[test]
    fn block_tags() {
        let language = language();
        let if_tag = language.block_tag("if").unwrap();
        assert_eq!(if_tag.branches.iter().map(|b| b.name).collect::<Vec<_>>(), ["elif", "else"]);
        assert!(language.block_tag("comment").unwrap().raw);
        assert_eq!(language.block_tag("comment").unwrap().kind, PAIRED_COMMENT);
        assert!(language.block_tag("url").is_none());
        assert!(language.branch_tag("empty").is_some());
        assert!(language.branch_tag("elif").unwrap().repeat);
    }

    #[test]
    fn kinds_by_name() {
        let language = language();
        assert_eq!(language.kind_for_name("paired_statement"), Some(PAIRED_STATEMENT));
        assert_eq!(language.kind_for_name("|"), Some(PIPE));
        assert_eq!(language.kind_for_name("tombstone"), None);
        assert_eq!(language.kind_count(), SyntaxKind::ALL.len() - 1);
    }

    #[test]
    fn version_check() {
        assert_eq!(language().check_compatible(), Ok(()));
        assert_eq!(
            Language::new(LANGUAGE_VERSION + 1).check_compatible(),
            Err(UsageError::IncompatibleLanguage {
                version: LANGUAGE_VERSION + 1,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            })
        );
    }
}
