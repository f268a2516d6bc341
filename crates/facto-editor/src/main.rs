mod catalog;
mod history;
mod session;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use facto_client::{BackendConfig, CompileClient, CompileRequest, LogLevel, PowerPoleKind};
use tracing::info;

use crate::history::{HistoryRecord, HistorySink};
use crate::session::{CompileSession, Connectivity};

#[derive(Parser)]
#[command(
    name = "facto-editor",
    version,
    about = "Terminal front-end for the Facto web compiler"
)]
struct Cli {
    /// Backend base URL (overrides FACTO_BACKEND_URL).
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a Facto source file and print the blueprint string.
    Compile(CompileArgs),
    /// List bundled example programs, or print one by name.
    Examples {
        /// Example name; omit to list all.
        name: Option<String>,
    },
    /// Probe backend connectivity.
    Health,
}

#[derive(Args)]
struct CompileArgs {
    /// Path to the source file, or "-" for stdin.
    file: PathBuf,

    /// Power pole type for the layout pass (small, medium, big, substation).
    #[arg(long)]
    power_poles: Option<PowerPoleKind>,

    /// Name embedded in the generated blueprint.
    #[arg(long)]
    name: Option<String>,

    /// Skip the optimizer pass.
    #[arg(long)]
    no_optimize: bool,

    /// Compiler log verbosity (debug, info, warning, error).
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Use the atomic sync endpoint instead of streaming.
    #[arg(long)]
    sync: bool,

    /// Print the structured JSON artifact instead of the blueprint.
    #[arg(long)]
    json: bool,

    /// Write the artifact to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BackendConfig::resolve(cli.backend_url.as_deref());

    match cli.command {
        Command::Compile(args) => run_compile(config, args).await,
        Command::Examples { name } => run_examples(name),
        Command::Health => run_health(config).await,
    }
}

async fn run_compile(config: BackendConfig, args: CompileArgs) -> Result<()> {
    let source = read_source(&args.file)?;
    let request = CompileRequest {
        power_poles: args.power_poles,
        blueprint_name: args.name.clone(),
        no_optimize: args.no_optimize,
        json_output: args.json,
        log_level: args.log_level,
        ..CompileRequest::new(source)
    };

    let backend = config.base_url().to_string();
    info!(backend = %backend, sync = args.sync, "compiling");

    let mut session = CompileSession::new(CompileClient::new(config));
    let started = Instant::now();
    let outcome = if args.sync {
        session.compile_sync(&request).await?
    } else {
        session.compile(&request).await?
    };

    HistorySink::in_current_dir().record(&HistoryRecord {
        timestamp: chrono::Utc::now(),
        fingerprint: session::fingerprint(&request),
        backend,
        success: outcome.success,
        duration_ms: started.elapsed().as_millis() as u64,
        from_cache: outcome.from_cache,
        sync: args.sync,
    });

    if !outcome.success {
        bail!("compilation failed");
    }

    let artifact = if args.json {
        outcome
            .json
            .context("backend returned no JSON artifact")?
    } else {
        outcome
            .blueprint
            .context("backend returned no blueprint")?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &artifact)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "artifact written");
        }
        None => println!("{artifact}"),
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading source from stdin")?;
        Ok(source)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn run_examples(name: Option<String>) -> Result<()> {
    match name {
        Some(name) => {
            let example =
                catalog::find(&name).with_context(|| format!("no example named '{name}'"))?;
            print!("{}", example.source);
        }
        None => {
            for example in catalog::EXAMPLES {
                println!("{:<12} {}", example.name, example.description);
            }
        }
    }
    Ok(())
}

async fn run_health(config: BackendConfig) -> Result<()> {
    let mut session = CompileSession::new(CompileClient::new(config));
    let state = session.probe().await;
    println!("{state}");
    if state != Connectivity::Connected {
        std::process::exit(1);
    }
    Ok(())
}
