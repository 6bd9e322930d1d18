// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — command-line document scanner
//
// Entry point. Initialises logging, parses arguments and dispatches to the
// subcommand handlers.

mod commands;
mod files;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use scanwerk_core::human_errors::{Severity, humanize_error};

#[derive(Parser, Debug)]
#[command(
    name = "scanwerk",
    about = "Turn photographs of paper into flat, clean scans",
    version
)]
struct Cli {
    /// JSON settings file; missing keys keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find the document outline and print its corners as JSON.
    Detect(DetectArgs),
    /// Rectify the document to a flat, straight-on image.
    Scan(ScanArgs),
    /// Deskew, crop and tone-correct an already flat page.
    Enhance(EnhanceArgs),
    /// Straighten a page and print the measured angle.
    Deskew(DeskewArgs),
    /// List the built-in document templates.
    Templates,
}

#[derive(Args, Debug)]
struct DetectArgs {
    input: PathBuf,

    /// Also write the photo with the detected outline drawn on it.
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    /// Four corners as `x,y,x,y,x,y,x,y`, in any order. Skips detection.
    #[arg(long)]
    corners: Option<String>,

    /// Rectify to a template size and apply its processing, e.g. `receipt`.
    #[arg(long)]
    template: Option<String>,

    /// Run the enhancement pipeline on the scan.
    #[arg(long)]
    enhance: bool,
}

#[derive(Args, Debug)]
struct EnhanceArgs {
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct DeskewArgs {
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Scanwerk starting");

    let result = files::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Detect(args) => commands::detect(&config, &args.input, args.preview.as_deref()),
        Commands::Scan(args) => commands::scan(
            &config,
            &args.input,
            &args.output,
            args.corners.as_deref(),
            args.template.as_deref(),
            args.enhance,
        ),
        Commands::Enhance(args) => commands::enhance(&config, &args.input, &args.output),
        Commands::Deskew(args) => commands::deskew(&config, &args.input, &args.output),
        Commands::Templates => commands::templates(),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            match human.severity {
                // Retake or adjust; distinct so scripts can fall back to manual corners.
                Severity::ActionRequired => ExitCode::from(2),
                Severity::Transient | Severity::Permanent => ExitCode::FAILURE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_accepts_corners_and_template() {
        let cli = Cli::try_parse_from([
            "scanwerk",
            "scan",
            "photo.jpg",
            "-o",
            "out.png",
            "--corners",
            "0,0,10,0,10,10,0,10",
            "--template",
            "receipt",
            "--enhance",
        ])
        .expect("valid arguments");
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.corners.as_deref(), Some("0,0,10,0,10,10,0,10"));
        assert_eq!(args.template.as_deref(), Some("receipt"));
        assert!(args.enhance);
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["scanwerk", "templates", "--config", "s.json"])
            .expect("valid arguments");
        assert_eq!(cli.config, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn scan_requires_output() {
        assert!(Cli::try_parse_from(["scanwerk", "scan", "photo.jpg"]).is_err());
    }
}
