mod json;

use std::io::IsTerminal as _;
use std::process::ExitCode;

use anyhow::{Context, bail, ensure};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use dtl_errors::{Diagnostic, Renderer};
use dtl_inputs::File;
use dtl_parse::{InputEdit, language};
use dtl_query::Query;
use dtl_syntax::{TextRange, TextSize};
use salsa::DatabaseImpl;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Parser for Django templates.
#[derive(Parser)]
enum Options {
    /// Print the syntax tree of a template.
    Parse {
        path: Utf8PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Tree)]
        format: Format,
    },
    /// Report the diagnostics of templates.
    Check {
        #[arg(required = true)]
        paths: Vec<Utf8PathBuf>,
    },
    /// Print the captures of a query.
    Query {
        path: Utf8PathBuf,
        /// Query source.
        #[arg(long, required_unless_present = "pattern_file", conflicts_with = "pattern_file")]
        pattern: Option<String>,
        /// File holding the query source.
        #[arg(long)]
        pattern_file: Option<Utf8PathBuf>,
    },
    /// Replace a byte range of a template and reparse it incrementally.
    Edit {
        path: Utf8PathBuf,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        #[arg(long, default_value = "")]
        insert: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Every node with its range, tokens with their text.
    Tree,
    /// Named nodes as an S-expression.
    Sexp,
    Json,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DTL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let renderer =
        if std::io::stderr().is_terminal() { Renderer::styled() } else { Renderer::plain() };
    let db = DatabaseImpl::default();

    match Options::parse() {
        Options::Parse { path, format } => {
            let file = File::new(&db, path.clone(), read(&path)?);
            let tree = file.parse(&db);
            let text = file.text(&db);

            match format {
                Format::Tree => print!("{}", tree.root().debug_dump(text)),
                Format::Sexp => println!("{}", tree.root().to_sexp()),
                Format::Json => {
                    let document = json::Document::new(tree.root(), tree.diagnostics(), text);
                    println!("{}", serde_json::to_string_pretty(&document)?);
                    return Ok(ExitCode::SUCCESS);
                }
            }
            report(&renderer, &path, text, tree.diagnostics());
            Ok(ExitCode::SUCCESS)
        }
        Options::Check { paths } => {
            let mut failed = 0;
            for path in paths {
                let file = File::new(&db, path.clone(), read(&path)?);
                let diagnostics = file.parse(&db).diagnostics();
                report(&renderer, &path, file.text(&db), diagnostics);
                failed += usize::from(!diagnostics.is_empty());
            }

            if failed == 0 {
                return Ok(ExitCode::SUCCESS);
            }
            eprintln!("{failed} file(s) with errors");
            Ok(ExitCode::FAILURE)
        }
        Options::Query { path, pattern, pattern_file } => {
            let source = match (pattern, pattern_file) {
                (Some(pattern), _) => pattern,
                (None, Some(pattern_file)) => read(&pattern_file)?,
                (None, None) => bail!("either `--pattern` or `--pattern-file` is required"),
            };
            let query = Query::new(language(), &source)
                .with_context(|| format!("invalid query `{}`", source.trim()))?;

            let file = File::new(&db, path.clone(), read(&path)?);
            let text = file.text(&db);
            let lines = file.line_index(&db);
            for found in query.matches(file.parse(&db).root(), text) {
                for capture in &found.captures {
                    let name = &query.capture_names()[capture.index as usize];
                    let position = lines.line_col(capture.node.start());
                    println!(
                        "pattern {} @{name} {}:{}: {:?}",
                        found.pattern_index,
                        position.line + 1,
                        position.col + 1,
                        capture.node.text(text),
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Options::Edit { path, start, end, insert } => {
            let text = read(&path)?;
            ensure!(start <= end, "`--start` {start} is after `--end` {end}");
            ensure!(
                end as usize <= text.len(),
                "`--end` {end} is past the end of `{path}` ({} bytes)",
                text.len()
            );
            ensure!(
                text.is_char_boundary(start as usize) && text.is_char_boundary(end as usize),
                "edit range {start}..{end} splits a character"
            );

            let range = TextRange::new(TextSize::new(start), TextSize::new(end));
            let mut new_text = text.clone();
            new_text.replace_range(start as usize..end as usize, &insert);

            let mut parser = dtl_parse::Parser::new();
            parser.set_language(language())?;
            let old = parser.parse(&text, None)?;
            let edited = old.edit(&InputEdit::replace(&text, range, &insert))?;
            let tree = parser.parse(&new_text, Some(&edited))?;

            println!("{}", tree.root().to_sexp());
            println!("reused {} of {} segments", tree.reused_segments(), tree.segment_count());
            if tree != dtl_parse::parse(&new_text) {
                bail!("incremental parse differs from a fresh parse");
            }
            report(&renderer, &path, &new_text, tree.diagnostics());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))
}

fn report(renderer: &Renderer, path: &Utf8Path, text: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render(renderer, path.as_str(), text));
    }
}
