use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use miette::{IntoDiagnostic, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pyline::{can_merge_with, statement_groups, unwrap_source, FormatConfig, Unwrapped};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the unwrapped logical lines of a Python file", long_about = None)]
struct Cli {
    /// Python source file
    file: PathBuf,

    /// JSON file with formatting options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit the unwrapped lines as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("could not read {}", path.display()))?;
            FormatConfig::from_json(&text)?
        }
        None => FormatConfig::default(),
    };

    let source = fs::read_to_string(&cli.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", cli.file.display()))?;
    info!(file = %cli.file.display(), bytes = source.len(), "unwrapping");

    let unwrapped = unwrap_source(&source)
        .wrap_err_with(|| format!("failed to unwrap {}", cli.file.display()))?;

    if cli.json {
        let out = serde_json::to_string_pretty(&unwrapped).into_diagnostic()?;
        println!("{out}");
    } else {
        print!("{}", render_report(&unwrapped, &config));
    }
    Ok(())
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "pyline=warn",
        1 => "pyline=debug",
        _ => "pyline=trace",
    }
}

/// One row per line, followed by the merge decision for its statement.
fn render_report(unwrapped: &Unwrapped, config: &FormatConfig) -> String {
    let mut out = String::new();
    for group in statement_groups(&unwrapped.lines) {
        for line in group {
            let flag = if line.is_header {
                'H'
            } else if line.is_comment_only {
                '#'
            } else {
                ' '
            };
            out.push_str(&format!(
                "{:>4} {} {}{}\n",
                line.lineno,
                flag,
                "    ".repeat(line.depth),
                line.text()
            ));
        }
        if group.iter().any(|line| line.is_header) {
            let merge = if can_merge_with(group, config) { "yes" } else { "no" };
            out.push_str(&format!("     merge: {merge}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_defaults() {
        assert_eq!(directive_for_verbosity(0), "pyline=warn");
        assert_eq!(directive_for_verbosity(1), "pyline=debug");
        assert_eq!(directive_for_verbosity(5), "pyline=trace");
    }

    #[test]
    fn report_marks_headers_and_merges() {
        let unwrapped = unwrap_source("if a: continue\nx = 1\n").expect("unwrap");
        let report = render_report(&unwrapped, &FormatConfig::default());
        assert_eq!(
            report,
            "   1 H if a :\n   1       continue\n     merge: yes\n   2   x = 1\n"
        );
    }
}
