//! The `spec-stream` command: compile a patch stream from stdin into a spec.

use std::io::{self, ErrorKind, Read, Write};

use clap::Parser;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::compiler::{CompileError, CompilerOptions, PatchErrorPolicy, SpecStreamCompiler};
use crate::mixed::{FenceOptions, MixedStreamParser};
use crate::patch::{apply_patch, Patch, PatchError};
use crate::validator::{auto_fix_spec, validate_spec_value, Severity, ValidateOptions};

/// Compile a JSONL patch stream (RFC 6902) from stdin into a json-render spec
///
/// The final document is printed to stdout as pretty JSON. Validation issues,
/// applied fixes and (with --mixed) conversational text go to stderr.
#[derive(Debug, Clone, Parser)]
#[command(name = "spec-stream", version, long_about = None)]
pub struct Cli {
    /// Input is chat text with patch lines or ```spec blocks mixed in
    #[arg(long)]
    pub mixed: bool,

    /// With --mixed, only accept patches inside a ```spec block
    #[arg(long, requires = "mixed")]
    pub fenced_only: bool,

    /// Stop at the first patch that fails to apply
    #[arg(long)]
    pub abort_on_error: bool,

    /// Warn about elements not reachable from the root
    #[arg(long)]
    pub check_orphans: bool,

    /// Move visible/on/repeat out of props before validating
    #[arg(long)]
    pub auto_fix: bool,

    /// Exit with a failure status when the spec has validation errors
    #[arg(long)]
    pub strict: bool,

    /// Read size in bytes
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,

    /// Initial document as a JSON string (defaults to `{}`)
    #[arg(long)]
    pub initial: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("invalid --initial document: {0}")]
    Initial(#[source] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl Cli {
    fn policy(&self) -> PatchErrorPolicy {
        if self.abort_on_error {
            PatchErrorPolicy::Abort
        } else {
            PatchErrorPolicy::Skip
        }
    }

    fn initial_document(&self) -> Result<Value, CliError> {
        match &self.initial {
            Some(raw) => serde_json::from_str(raw).map_err(CliError::Initial),
            None => Ok(Value::Object(Map::new())),
        }
    }
}

fn read_chunk(input: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

fn compile_lines(cli: &Cli, input: &mut dyn Read, buf: &mut [u8]) -> Result<Value, CliError> {
    let options = CompilerOptions {
        on_patch_error: cli.policy(),
        ..CompilerOptions::default()
    };
    let mut compiler = SpecStreamCompiler::with_options(cli.initial_document()?, options);
    loop {
        let n = read_chunk(input, buf)?;
        if n == 0 {
            break;
        }
        let update = compiler.push_bytes(&buf[..n])?;
        if !update.new_patches.is_empty() {
            tracing::debug!(
                patches = update.new_patches.len(),
                version = compiler.version(),
                "applied chunk"
            );
        }
    }
    Ok(compiler.result()?.as_ref().clone())
}

fn compile_mixed(
    cli: &Cli,
    input: &mut dyn Read,
    buf: &mut [u8],
    prose: &mut dyn Write,
) -> Result<Value, CliError> {
    let policy = cli.policy();
    let fence = FenceOptions {
        heuristic: !cli.fenced_only,
        ..FenceOptions::default()
    };
    let mut doc = cli.initial_document()?;
    let mut failure: Option<PatchError> = None;
    let mut echo_failure: Option<io::Error> = None;
    {
        let mut parser = MixedStreamParser::with_fence(
            |patch: Patch| {
                if failure.is_some() {
                    return;
                }
                if let Err(err) = apply_patch(&mut doc, &patch) {
                    match policy {
                        PatchErrorPolicy::Skip => {
                            tracing::warn!(op = patch.op(), path = patch.path(), error = %err, "skipping patch")
                        }
                        PatchErrorPolicy::Abort => failure = Some(err),
                    }
                }
            },
            |line: &str| {
                if echo_failure.is_none() {
                    if let Err(err) = writeln!(prose, "{line}") {
                        echo_failure = Some(err);
                    }
                }
            },
            fence,
        );
        loop {
            let n = read_chunk(input, buf)?;
            if n == 0 {
                break;
            }
            parser.push_bytes(&buf[..n]);
        }
        parser.flush();
    }
    if let Some(err) = echo_failure {
        return Err(err.into());
    }
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(doc),
    }
}

/// Runs the command. Returns `Ok(false)` when `--strict` is set and the spec
/// has validation errors.
pub fn run(cli: &Cli, mut input: impl Read, mut out: impl Write, mut err: impl Write) -> Result<bool, CliError> {
    let mut buf = vec![0u8; cli.chunk_size.max(1)];
    let doc = if cli.mixed {
        compile_mixed(cli, &mut input, &mut buf, &mut err)?
    } else {
        compile_lines(cli, &mut input, &mut buf)?
    };

    let doc = if cli.auto_fix {
        let fixed = auto_fix_spec(&doc);
        for fix in &fixed.fixes {
            writeln!(err, "fixed: {fix}")?;
        }
        fixed.spec
    } else {
        doc
    };

    let validation = validate_spec_value(
        &doc,
        ValidateOptions {
            check_orphans: cli.check_orphans,
        },
    );
    for issue in &validation.issues {
        let level = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        writeln!(err, "{level}[{}]: {}", issue.code, issue.message)?;
    }

    serde_json::to_writer_pretty(&mut out, &doc)?;
    writeln!(out)?;
    out.flush()?;
    Ok(validation.valid || !cli.strict)
}
