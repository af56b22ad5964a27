//! dsldoc: build DSL documentation from declaration files and query it.
//!
//! - `dsldoc query decls/*.json --class IO` prints a JSON document tree
//! - `dsldoc generate -o public/dsl decls/` writes static JSON pages
//! - `dsldoc check decls/ --method IO#write --args '{"path": "a"}'`
//!   reports build failures and validates call arguments

mod pages;
mod source;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dsldoc_core::markup::{PlainText, SimpleHtml};
use dsldoc_core::{ArgumentCheck, BuildReport, Config, DocStore, Query, Registry, RegistryBuilder};
use serde_json::Value;
use source::FileSource;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dsldoc", about = "Build, query and check versioned DSL documentation")]
struct Cli {
    /// More logging on stderr. Repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How descriptions are rendered when they are stored.
    #[arg(long, value_enum, default_value_t = MarkupKind::Plain, global = true)]
    markup: MarkupKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MarkupKind {
    Plain,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the documentation tree selected by a query as JSON.
    Query(QueryArgs),
    /// Write static JSON pages for every version, section, class and method.
    Generate(GenerateArgs),
    /// Report declarations that failed to build; optionally validate arguments.
    Check(CheckArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Declaration files, directories or glob patterns.
    #[arg(required = true)]
    files: Vec<String>,

    /// Documentation version (default: the configured default version).
    #[arg(long = "version", value_name = "VERSION")]
    doc_version: Option<String>,

    /// Class id or reference key.
    #[arg(long)]
    class: Option<String>,

    /// Method name; requires --class.
    #[arg(long, requires = "class")]
    method: Option<String>,

    /// Translate descriptions to this language.
    #[arg(long)]
    lang: Option<String>,

    #[arg(long)]
    section: Option<String>,

    /// Prepended to every generated url.
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Args)]
struct GenerateArgs {
    /// Declaration files, directories or glob patterns.
    #[arg(required = true)]
    files: Vec<String>,

    /// Output directory.
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Only this documentation version.
    #[arg(long = "version", value_name = "VERSION")]
    doc_version: Option<String>,

    /// Prepended to every generated url.
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Args)]
struct CheckArgs {
    /// Declaration files, directories or glob patterns.
    #[arg(required = true)]
    files: Vec<String>,

    /// Fail when any declaration could not be built.
    #[arg(long)]
    strict: bool,

    /// Method to validate arguments against: `Class#method` or
    /// `version#Class#method`.
    #[arg(long, requires = "args")]
    method: Option<String>,

    /// Arguments as a JSON object, or `@file` to read them from a file.
    #[arg(long, requires = "method")]
    args: Option<String>,

    /// Report missing required parameters.
    #[arg(long)]
    presence: bool,

    /// Reject undocumented argument keys.
    #[arg(long)]
    no_extra: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli);
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins unless -v was given; logs go to stderr so stdout stays
/// valid JSON.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let builder = match cli.markup {
        MarkupKind::Plain => RegistryBuilder::new(config).markup(Arc::new(PlainText)),
        MarkupKind::Html => RegistryBuilder::new(config).markup(Arc::new(SimpleHtml)),
    };

    match &cli.command {
        Commands::Query(args) => {
            let (registry, _) = open(builder, &args.files)?;
            let mut query = Query::new().url_prefix(args.prefix.as_str());
            if let Some(version) = &args.doc_version {
                query = query.version(version.as_str());
            }
            if let Some(class) = &args.class {
                query = query.class(class.as_str());
            }
            if let Some(method) = &args.method {
                query = query.method(method.as_str());
            }
            if let Some(lang) = &args.lang {
                query = query.language(lang.as_str());
            }
            if let Some(section) = &args.section {
                query = query.section(section.as_str());
            }
            let tree = registry.query(&query)?;
            println!("{}", tree.to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate(args) => {
            let (registry, _) = open(builder, &args.files)?;
            fs::create_dir_all(&args.output).with_context(|| {
                format!("failed to create output directory: {}", args.output.display())
            })?;
            let opts = pages::PageOptions {
                out_dir: &args.output,
                url_prefix: &args.prefix,
                version: args.doc_version.as_deref(),
            };
            let written = pages::generate(&registry, &opts)?;
            tracing::info!(written, out = %args.output.display(), "pages written");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => check(builder, args),
    }
}

fn check(builder: RegistryBuilder, args: &CheckArgs) -> Result<ExitCode> {
    let (registry, report) = open(builder, &args.files)?;
    for failure in &report.failures {
        println!("failed: {failure}");
    }

    if let (Some(method), Some(raw)) = (&args.method, &args.args) {
        let value: Value = serde_json::from_str(&read_args(raw)?).context("--args is not valid JSON")?;
        let Value::Object(call) = value else {
            anyhow::bail!("--args must be a JSON object");
        };
        let mode = ArgumentCheck::new()
            .presence(args.presence)
            .strict(args.no_extra);
        if let Err(e) = registry.check_arguments(method, &call, mode) {
            println!("invalid: {e}");
            return Ok(ExitCode::FAILURE);
        }
        println!("ok: {method}");
    }

    if args.strict && !report.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    if report.is_clean() {
        println!(
            "ok: {} version(s) built",
            registry.available_versions().len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn read_args(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
        None => Ok(raw.to_string()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: Config =
        toml::from_str(&text).with_context(|| format!("invalid config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Collect the declaration files and build the registry once.
fn open(builder: RegistryBuilder, patterns: &[String]) -> Result<(Arc<Registry>, BuildReport)> {
    let source = FileSource::new(patterns)?;
    tracing::debug!(files = source.files().len(), "declaration files found");
    let (store, report) = DocStore::open(builder, source)?;
    Ok((store.snapshot(), report))
}
