use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod format;

/// Harbex - Harbor Image Exporter
///
/// Pulls every tagged image of the configured Harbor projects, saves them into
/// tar archives and writes an import script for the target registry.
#[derive(Parser, Debug)]
#[command(name = "harbex")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: PathBuf,

    /// Registry username (prompts for the password)
    #[arg(short, long)]
    username: Option<String>,

    /// Skip TLS certificate verification for the registry API
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log directives used when `RUST_LOG` is not set.
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "harbex=info,libharbex=info",
        1 => "harbex=debug,libharbex=debug",
        _ => "harbex=trace,libharbex=trace",
    }
}

fn init_tracing(verbose: u8, ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let formatter = format::Formatter::detect();
    init_tracing(cli.verbose, formatter.is_styled());

    let result = context::AppContext::build(&cli.file, cli.username.as_deref(), cli.insecure)
        .and_then(|ctx| commands::export::handle_export(&ctx, &formatter));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
