//! MOF compiler command line
//!
//! Run with: cargo run --bin cimmof -- --xml schema.mof > schema.xml

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use cimmof::{CompilerOptions, MemoryRepository, MofCompiler, OperationMode, DEFAULT_NAMESPACE};

#[derive(Parser)]
#[command(name = "cimmof")]
#[command(about = "Compile MOF into a CIM repository or CIM-XML")]
struct Args {
    /// MOF files to compile, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target namespace
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Directory searched for included files
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Write CIM-XML to stdout instead of updating the repository
    #[arg(long, conflicts_with_all = ["trace", "syntax_only"])]
    xml: bool,

    /// Echo each declaration as CIM-XML before storing it
    #[arg(long)]
    trace: bool,

    /// Check syntax only
    #[arg(long)]
    syntax_only: bool,

    /// Allow experimental classes
    #[arg(long)]
    allow_experimental: bool,

    /// Allow version changes when updating classes
    #[arg(long)]
    allow_version: bool,

    /// Allow redefining existing classes
    #[arg(long)]
    update_class: bool,

    /// Suppress warnings
    #[arg(short = 'w', long)]
    suppress_warnings: bool,

    /// Suppress all messages
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> CompilerOptions {
        let mode = if self.xml {
            OperationMode::XmlOutput
        } else if self.syntax_only {
            OperationMode::SyntaxOnly
        } else {
            OperationMode::UseRepository
        };
        let mut options = CompilerOptions::default()
            .with_namespace(self.namespace.clone())
            .with_mode(mode)
            .with_trace(self.trace)
            .with_update_class(self.update_class)
            .with_allow_experimental(self.allow_experimental)
            .with_allow_version(self.allow_version);
        options.include_paths = self.include.clone();
        options.suppress_warnings = self.suppress_warnings;
        options.suppress_all_messages = self.quiet;
        options
    }

    fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut compiler = MofCompiler::new(MemoryRepository::new(), args.options())
        .context("invalid options")?;
    compiler.compile_files(args.files.as_slice())?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(compiler.output())?;
    stdout.flush()?;

    let warnings = compiler.diagnostics().len();
    info!(files = args.files.len(), warnings, "compilation complete");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("cimmof: could not install log subscriber");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
