use std::fs;
use std::path::{Path, PathBuf};

use expect_test::expect_file;

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    input: PathBuf,
    expected: PathBuf,
    text: String,
}

impl TestCase {
    fn list() -> Vec<Self> {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");

        let mut cases = fs::read_dir(&test_data_dir)
            .unwrap_or_else(|err| {
                panic!("Cannot read directory {}: {err}", test_data_dir.display())
            })
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "html" {
                    let expected = path.with_extension("txt");
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { input: path, expected, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        cases.sort();
        cases
    }
}

#[test]
fn parse() {
    let test_cases = TestCase::list();
    assert!(!test_cases.is_empty());

    for case in test_cases {
        let tree = crate::parse(&case.text);
        let diagnostics = tree
            .diagnostics()
            .iter()
            .map(|d| format!("  {:?} {}\n", d.range(), d.message()))
            .collect::<String>();

        let actual = format!("{}\nErrors:\n{diagnostics}", tree.root().to_sexp());
        expect_file![&case.expected].assert_eq(&actual);
    }
}

#[test]
fn reparse_from_scratch_matches() {
    for case in TestCase::list() {
        let fresh = crate::parse(&case.text);
        let mut parser = crate::Parser::new();
        parser.set_language(crate::language()).unwrap();
        let again = parser.parse(&case.text, Some(&fresh)).unwrap();
        assert_eq!(fresh, again, "{}", case.input.display());
    }
}
