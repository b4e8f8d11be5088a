use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use mirage_protocol::{Session, Translation};
use mirage_utils::{
    debug, default_log_file, info, init_logging, init_logging_to_file, init_logging_with_level, warn, LogFormat,
    LogLevel, LoggingError, LoggingGuard,
};

mod demo;

/// Text front end for a JSON debugger protocol.
#[derive(Parser, Debug)]
#[command(name = "mirage")]
#[command(version)]
#[command(about = "Text front end for a JSON debugger protocol: commands in, requests out, responses rendered", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty or json); overrides MIRAGE_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Log to a file only; without a path, ~/.mirage/<date>-mirage.log
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Read text commands from stdin and print JSON requests
    Translate
    {
        /// Number requests consecutively starting here (default: every request is 0)
        #[arg(long)]
        seq_start: Option<u64>,
    },
    /// Read JSON responses from stdin, one per line, and print their text
    Render,
    /// Run a transcript of "> command" and "< response" lines through one session
    Replay
    {
        /// Transcript file
        file: PathBuf,
        /// Number requests consecutively starting here (default: every request is 0)
        #[arg(long)]
        seq_start: Option<u64>,
    },
    /// Stop a small built-in program and show events, frames and mirrors
    Demo,
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match start_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn start_logging(cli: &Cli) -> Result<LoggingGuard, LoggingError>
{
    let format = cli.log_format.unwrap_or_default();
    match (&cli.log_file, cli.log_level) {
        (Some(path), level) => {
            let path = path.clone().unwrap_or_else(default_log_file);
            init_logging_to_file(&path, level, format)
        }
        (None, Some(level)) => init_logging_with_level(level, format),
        (None, None) if cli.log_format.is_some() => init_logging_with_level(LogLevel::default(), format),
        (None, None) => init_logging(),
    }
}

fn new_session(seq_start: Option<u64>) -> Session
{
    seq_start.map_or_else(Session::new, Session::numbered_from)
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Translate { seq_start } => {
            info!(?seq_start, "translating commands from stdin");
            let mut session = new_session(seq_start);
            for line in stdin.lock().lines() {
                translate_line(&mut session, &line?, &mut out)?;
            }
        }
        Commands::Render => {
            info!("rendering responses from stdin");
            let mut session = Session::new();
            for line in stdin.lock().lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    render_line(&mut session, &line, &mut out)?;
                }
            }
        }
        Commands::Replay { file, seq_start } => replay(&file, seq_start, &mut out)?,
        Commands::Demo => demo::run(&mut out)?,
    }

    out.flush()?;
    Ok(())
}

fn translate_line(session: &mut Session, line: &str, out: &mut impl Write) -> io::Result<()>
{
    if line.trim().is_empty() {
        return Ok(());
    }
    match session.translate(line) {
        Ok(Translation::Request(json)) => writeln!(out, "{json}")?,
        Ok(Translation::Help(lines)) => {
            for help in lines {
                writeln!(out, "{help}")?;
            }
        }
        Err(e) => {
            warn!(%e, line, "rejected command");
            eprintln!("{e}");
        }
    }
    Ok(())
}

fn render_line(session: &mut Session, json: &str, out: &mut impl Write) -> io::Result<()>
{
    let details = session.render_response(json);
    if !details.text.is_empty() {
        writeln!(out, "{}", details.text.trim_end_matches('\n'))?;
    }
    if details.running {
        writeln!(out, "[running]")?;
    }
    Ok(())
}

/// `> command` lines are translated, `< json` lines rendered; blank lines and
/// `#` comments are skipped.
fn replay(path: &Path, seq_start: Option<u64>, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>>
{
    let transcript = fs::read_to_string(path)?;
    info!(path = %path.display(), "replaying transcript");

    let mut session = new_session(seq_start);
    for (number, line) in transcript.lines().enumerate() {
        let line = line.trim_end();
        if let Some(command) = line.strip_prefix('>') {
            writeln!(out, "> {}", command.trim())?;
            translate_line(&mut session, command, out)?;
        } else if let Some(response) = line.strip_prefix('<') {
            render_line(&mut session, response.trim(), out)?;
        } else if !line.is_empty() && !line.starts_with('#') {
            debug!(line = number + 1, "skipping transcript line");
        }
    }
    Ok(())
}
