//! `spec-stream`: compile a JSONL patch stream from stdin into a UI spec.
//!
//! ```bash
//! # Plain patch stream
//! llm-client ... | spec-stream --check-orphans > spec.json
//!
//! # Chat output with a ```spec block, fail on an invalid result
//! spec-stream --mixed --strict < reply.txt
//! ```

use std::io;
use std::process::ExitCode;

use clap::Parser;
use json_render::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli, io::stdin().lock(), io::stdout().lock(), io::stderr()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
