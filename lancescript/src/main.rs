//! LanceScript CLI

use clap::{Args, Parser, Subcommand, ValueEnum};
use lancescript::error::report_error;
use lancescript::interp::{Interpreter, InterpreterConfig, DEFAULT_MAX_RECURSION_DEPTH};
use lancescript::repl::Repl;
use lancescript::Tree;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lance", version, about = "LanceScript interpreter")]
struct Cli {
    /// Log verbosity; RUST_LOG takes precedence when set
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and run a LanceScript source file
    Run {
        /// Source file to run
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a syntax tree stored as JSON
    RunTree {
        /// JSON tree file
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run every script under a directory with mock input
    Test {
        /// Directory to walk
        dir: PathBuf,
        /// Seed for the mock input generator
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Parse and dump the tree as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Parse and print an indented outline of the tree (debug)
    Tree {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Start an interactive session
    Repl {
        #[command(flatten)]
        options: RunOptions,
    },
}

#[derive(Args)]
struct RunOptions {
    /// Answer `read` with pseudo-random values instead of stdin
    #[arg(long)]
    mock_input: bool,
    /// Seed for the mock input generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Maximum depth of nested function calls
    #[arg(long, default_value_t = DEFAULT_MAX_RECURSION_DEPTH)]
    max_depth: usize,
}

impl RunOptions {
    fn config(&self) -> InterpreterConfig {
        InterpreterConfig {
            mock_input: self.mock_input,
            seed: self.seed,
            max_recursion_depth: self.max_depth,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let result = match cli.command {
        Command::Run { file, options } => run_file(&file, options.config()),
        Command::RunTree { file, options } => run_tree_file(&file, options.config()),
        Command::Test { dir, seed } => test_dir(&dir, seed),
        Command::Parse { file } => parse_file(&file),
        Command::Tree { file } => print_tree(&file),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Repl { options } => run_repl(options.config()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so that program output on stdout stays clean
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

/// Read and parse a source file; parse errors are rendered with their source span
fn load_program(path: &Path) -> Result<Tree, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    lancescript::parse_source(&filename, &source).map_err(|err| -> Box<dyn std::error::Error> {
        if let Err(io) = report_error(&filename, &source, &err) {
            return io.into();
        }
        err.into()
    })
}

fn run_file(path: &Path, config: InterpreterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    let mut interpreter = Interpreter::with_config(config);
    interpreter.run(&program)?;
    Ok(())
}

fn run_tree_file(path: &Path, config: InterpreterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let program: Tree = serde_json::from_str(&json)?;
    let mut interpreter = Interpreter::with_config(config);
    interpreter.run(&program)?;
    Ok(())
}

/// Run each script under `dir` in mock-input mode, reporting failures and carrying on
fn test_dir(dir: &Path, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut scripts = Vec::new();
    collect_files(dir, &mut scripts)?;

    let mut failures = 0usize;
    for path in &scripts {
        println!("Running {}", path.display());

        let program = match read_script(path) {
            Ok(program) => program,
            Err(err) => {
                println!("Exception while parsing {}: {err}", path.display());
                failures += 1;
                continue;
            }
        };

        let config = InterpreterConfig {
            mock_input: true,
            seed,
            ..InterpreterConfig::default()
        };
        if let Err(err) = Interpreter::with_config(config).run(&program) {
            println!("Exception while executing {}: {err}", path.display());
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} scripts failed", scripts.len()).into());
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<Tree, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    Ok(lancescript::parse_source(&path.display().to_string(), &source)?)
}

/// Every regular file below `dir`, in sorted path order
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn parse_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn print_tree(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let program = load_program(path)?;
    print!("{}", program.pretty());
    Ok(())
}

fn tokenize_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;

    let tokens = lancescript::lexer::tokenize(&source)?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}

fn run_repl(config: InterpreterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = Repl::new(config)?;
    repl.run()?;
    Ok(())
}
