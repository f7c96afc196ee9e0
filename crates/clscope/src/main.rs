use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clscope_core::{AnalysisConfig, ExcludeMode, TextRange};
use clscope_lsp::call_hierarchy::CallGraph;
use clscope_lsp::LineIndex;
use clscope_scope::{analyze, AnalysisResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "clscope",
    version,
    about = "Lexical scope analysis for Common Lisp source"
)]
struct Cli {
    /// Exclusion mode for definition collection (e.g. `comment-string`)
    #[arg(long, global = true, value_parser = parse_mode)]
    mode: Option<ExcludeMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the language server on stdio
    Lsp,
    /// Print every binding in a file
    Symbols { file: PathBuf },
    /// Print the call-hierarchy edges of a file
    Calls { file: PathBuf },
}

/// Unknown names fall back to excluding nothing, with a warning.
fn parse_mode(s: &str) -> Result<ExcludeMode, std::convert::Infallible> {
    Ok(ExcludeMode::parse_lossy(s))
}

#[tokio::main]
async fn main() {
    // stdout is the LSP channel, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::default();
    if let Some(mode) = cli.mode {
        config.static_analysis = mode;
    }

    match cli.command {
        Command::Lsp => clscope_lsp::run_server().await,
        Command::Symbols { file } => {
            let analysis = load(&file, &config);
            print!("{}", format_symbols(&analysis));
        }
        Command::Calls { file } => {
            let analysis = load(&file, &config);
            print!("{}", format_calls(&analysis));
        }
    }
}

fn load(file: &Path, config: &AnalysisConfig) -> AnalysisResult {
    match std::fs::read_to_string(file) {
        Ok(text) => analyze(&text, config),
        Err(e) => {
            eprintln!("Error reading {}: {e}", file.display());
            std::process::exit(1);
        }
    }
}

/// `line:col` with one-based numbers.
fn position(index: &LineIndex<'_>, offset: usize) -> String {
    let p = index.position(offset);
    format!("{}:{}", p.line + 1, p.character + 1)
}

fn span(index: &LineIndex<'_>, range: TextRange) -> String {
    format!("{}-{}", position(index, range.start), position(index, range.end))
}

/// One line per binding in source order:
/// `position  kind  name  [container]  [scope]`.
fn format_symbols(analysis: &AnalysisResult) -> String {
    let index = LineIndex::new(analysis.text());
    let mut bindings: Vec<_> = analysis.table().iter().map(|(_, b)| b).collect();
    bindings.sort_by_key(|b| (b.def_range.start, b.kind.as_str()));

    let mut out = String::new();
    for b in bindings {
        let _ = write!(
            out,
            "{}\t{}\t{}",
            position(&index, b.def_range.start),
            b.kind,
            b.name
        );
        if let Some(container) = &b.container {
            let _ = write!(out, "\tin {container}");
        }
        if let Some(scope) = b.scope {
            let _ = write!(out, "\tscope {}", span(&index, scope));
        }
        out.push('\n');
    }
    out
}

/// One line per call form: `caller -> callee  position`.
fn format_calls(analysis: &AnalysisResult) -> String {
    let index = LineIndex::new(analysis.text());
    let graph = CallGraph::build(analysis);
    let mut out = String::new();
    for edge in &graph.edges {
        let _ = writeln!(
            out,
            "{} -> {}\t{}",
            graph.nodes[edge.caller].name,
            graph.nodes[edge.callee].name,
            position(&index, edge.range.start)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_flag_is_lenient() {
        let cli = Cli::try_parse_from(["clscope", "--mode", "Comment_String", "calls", "a.lisp"])
            .unwrap();
        assert_eq!(cli.mode, Some(ExcludeMode::CommentString));
        let cli = Cli::try_parse_from(["clscope", "symbols", "a.lisp", "--mode", "bogus"]).unwrap();
        assert_eq!(cli.mode, Some(ExcludeMode::None));
    }

    #[test]
    fn symbols_listing() {
        let a = analyze("(defun f (x)\n  x)", &AnalysisConfig::default());
        assert_eq!(
            format_symbols(&a),
            "1:8\tfunction\tf\n1:11\tparameter\tx\tin f\tscope 1:12-2:4\n"
        );
    }

    #[test]
    fn calls_listing() {
        let a = analyze("(defun f () 1)\n(defun g () (f))\n(g)", &AnalysisConfig::default());
        assert_eq!(format_calls(&a), "g -> f\t2:13\ndocument -> g\t3:1\n");
    }
}
