use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::*;
use tracing_subscriber::filter::LevelFilter;
use treematch::session::{Options, Session};

/// Reads a pattern line and a subject line at a time from stdin, and prints
/// the subject with every subtree the pattern matches marked.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// When to mark matches with terminal colours instead of brackets
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Don't write "> " before each result
    #[arg(long)]
    no_prompt: bool,

    /// Read all of stdin first and match the requests on every core.
    /// Output order is unchanged.
    #[arg(short, long)]
    parallel: bool,

    /// Write each successful match as a Graphviz DOT file into this directory
    #[arg(long)]
    dot_dir: Option<PathBuf>,

    /// Most verbose level written to stderr
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Also write every log event, at all levels, to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

fn init_logging(config: &Config) -> io::Result<()> {
    use tracing_subscriber::{fmt, prelude::*};

    // Console layer, quiet unless asked
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(config.log_level);

    // File layer capturing all logs
    let file_layer = match &config.log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(File::create(path)?))
                .with_filter(LevelFilter::TRACE),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn run(config: Config) -> io::Result<()> {
    if let Some(dir) = &config.dot_dir {
        std::fs::create_dir_all(dir)?;
    }

    let options = Options {
        colour: config.color.enabled(),
        prompt: !config.no_prompt,
        dot_dir: config.dot_dir.clone(),
    };
    debug!("Starting session with {:?}", options);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let mut session = Session::new(stdin, stdout, options);
    if config.parallel {
        session.run_parallel()?;
    } else {
        session.run()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = Config::parse();
    if let Err(e) = init_logging(&config) {
        eprintln!("error: could not open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("I/O failure: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
