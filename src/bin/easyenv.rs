use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Command};

use clap::{Args, Parser, Subcommand};
use easyenv::{EnvLoader, EnvironmentSink, Error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "easyenv")]
#[command(about = "Run commands with variables loaded from KEY=VALUE files", long_about = None)]
#[command(version)]
struct Cli {
    /// Print loader diagnostics to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load files and execute a command with the resulting environment.
    Run {
        #[command(flatten)]
        files: FileArgs,

        /// Keep variables that are already set to a non-empty value.
        #[arg(short, long)]
        append: bool,

        /// Command to execute, followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<OsString>,
    },
    /// Parse files and print each entry with its coerced type.
    Check {
        #[command(flatten)]
        files: FileArgs,
    },
}

#[derive(Debug, Args)]
struct FileArgs {
    /// File path(s). Repeat or pass comma-separated paths. Defaults to .env.
    #[arg(short, long = "file", value_delimiter = ',')]
    files: Vec<PathBuf>,

    /// Skip missing files and invalid rows instead of failing.
    #[arg(short, long)]
    silent: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            files,
            append,
            command,
        } => execute_run(&files, append, command),
        Commands::Check { files } => execute_check(&files),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("easyenv: {err}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "easyenv=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn loader(files: &FileArgs) -> EnvLoader {
    EnvLoader::new().paths(&files.files)
}

fn execute_run(files: &FileArgs, append: bool, command: Vec<OsString>) -> Result<i32, String> {
    let mut loader = loader(files)
        .silent(files.silent)
        .append(append)
        .sink(ChildEnv::default());
    loader.load().map_err(format_loader_error)?;

    let (_, child_env) = loader.into_parts();

    let Some((program, args)) = command.split_first() else {
        return Err("missing command after `run`".to_owned());
    };
    let mut child = Command::new(program);
    // Inherited variables pass through as raw OS strings; only loaded
    // entries are set on top.
    child.args(args).envs(child_env.loaded);

    execute_command(child, program)
}

/// Environment of the child process: the inherited process environment plus
/// the entries loaded for it.
#[derive(Debug, Default)]
struct ChildEnv {
    loaded: BTreeMap<String, String>,
}

impl EnvironmentSink for ChildEnv {
    fn get_var(&self, key: &str) -> Option<String> {
        self.loaded.get(key).cloned().or_else(|| {
            env::var_os(key).map(|value| value.to_string_lossy().into_owned())
        })
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.loaded.insert(key.to_owned(), value.to_owned());
    }
}

fn execute_check(files: &FileArgs) -> Result<i32, String> {
    let entries = loader(files)
        .silent(files.silent)
        .parse_only()
        .map_err(format_loader_error)?;

    for entry in entries {
        println!("{}\t{}\t{}", entry.key, entry.value.type_name(), entry.value);
    }
    Ok(0)
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let err = command.exec();
    Err(format!(
        "failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let status = command
        .status()
        .map_err(|err| format!("failed to execute `{}`: {err}", program.to_string_lossy()))?;
    Ok(status.code().unwrap_or(1))
}

fn format_loader_error(err: Error) -> String {
    match err {
        Error::InvalidRow(row) => format!("{row} (use --silent to skip invalid rows)"),
        other => other.to_string(),
    }
}
