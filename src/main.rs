use std::{io::Read, path::PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use shor::{FormatConfig, ShorTree};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Reformats a shor document.
#[derive(Debug, Parser)]
#[command(name = "shor", version, about, long_about = None)]
struct Cli {
    /// Produce single-line output
    #[arg(short, long)]
    single_line: bool,

    /// String used to indent one level
    #[arg(short, long, default_value = "\t")]
    indent: String,

    /// Input file. Reads stdin when omitted
    file: Option<PathBuf>,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("SHOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let input = read_input(cli.file.as_ref())?;
    let tree: ShorTree = input.parse()?;
    debug!(nodes = tree.len(), "parsed input");

    let config = if cli.single_line {
        FormatConfig::compact()
    } else {
        FormatConfig::new().indent(&cli.indent)
    };
    println!("{}", tree.format_with(tree.root(), &config));
    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> miette::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("failed to read stdin")?;
            Ok(input)
        }
    }
}
