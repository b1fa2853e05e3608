use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use execguard::{CommandSpec, Engine, EngineConfig, ExecResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "execguard")]
#[command(about = "Run a program with bounded output and a wall-clock limit", long_about = None)]
#[command(version)]
struct Cli {
    /// Program to run (looked up under the working directory, then on PATH)
    executable: PathBuf,

    /// Arguments for the program; glob patterns are expanded in the working directory
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Working directory for the program
    #[arg(short = 'C', long, default_value = ".")]
    workdir: PathBuf,

    /// Kill the program after this many milliseconds (0 disables)
    #[arg(long, default_value_t = 0)]
    timeout_ms: u64,

    /// Maximum captured stdout bytes (0 uses the configured default)
    #[arg(long, default_value_t = 0)]
    stdout_cap: usize,

    /// Maximum captured stderr bytes (0 uses the configured default)
    #[arg(long, default_value_t = 0)]
    stderr_cap: usize,

    /// File whose contents are fed to the program's stdin ("-" reads our stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Argument for the resource limiter (repeatable); enables the limiter
    #[arg(long = "limiter-arg", allow_hyphen_values = true)]
    limiter_args: Vec<String>,

    /// Do not fall back to PATH when the program is not in the working directory
    #[arg(long)]
    no_path_lookup: bool,

    /// TOML engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(result) if result.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExecResult> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let input = match &cli.input {
        Some(path) => read_input(path)?,
        None => Vec::new(),
    };

    let spec = CommandSpec::new(cli.executable)
        .args(cli.args)
        .working_dir(cli.workdir)
        .input(input)
        .timeout(Duration::from_millis(cli.timeout_ms))
        .stdout_cap(cli.stdout_cap)
        .stderr_cap(cli.stderr_cap)
        .limiter_args(cli.limiter_args)
        .lookup_path(!cli.no_path_lookup);

    let result = Engine::new(config)
        .execute(spec)
        .context("Failed to start program")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to encode result")?;
        println!("{json}");
    } else {
        print_result(&result)?;
    }

    Ok(result)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read input from stdin")?;
        return Ok(buf);
    }
    fs::read(path).with_context(|| format!("Failed to read input file {}", path.display()))
}

fn print_result(result: &ExecResult) -> Result<()> {
    let summary = result.summary();
    let summary = if result.killed {
        summary.red().bold()
    } else if result.is_clean() {
        summary.green().bold()
    } else {
        summary.yellow().bold()
    };
    eprintln!("{summary}");

    let mut stdout = io::stdout();
    stdout.write_all(&result.stdout)?;
    stdout.flush()?;
    io::stderr().write_all(&result.stderr)?;
    Ok(())
}
