use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::OnceLock;

use clap::Parser;
use regex::Regex;
use tracing_subscriber::EnvFilter;

use tt::cli::{self, CliArgs, ConfigFile};
use tt::command::script_driver;
use tt::config::Config;
use tt::{Session, SessionEvent};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .with_writer(io::stderr)
        .init();

    let Some(mut config) = load_config(&args) else {
        return ExitCode::FAILURE;
    };
    args.apply_overrides(&mut config.bridge);

    let ses = Session::new("gts", config.bridge.clone());
    ses.import_vars(&config.vars);
    tracing::info!(session = ses.name(), config = ?ses.config(), "session started");

    match run(&ses, &config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        // A closed pipe on stdout is a normal way to stop.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tt: {e}");
            ExitCode::FAILURE
        }
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Read the config file `args` selects.  An explicit file that cannot be
/// read is fatal; bad directives inside it are only warnings.
fn load_config(args: &CliArgs) -> Option<Config> {
    let path = match args.config_file() {
        ConfigFile::Skip => return Some(Config::new()),
        ConfigFile::Explicit(p) => p,
        ConfigFile::Search => match cli::find_user_config() {
            Some(p) => p,
            None => return Some(Config::new()),
        },
    };

    match Config::load_file(&path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("tt: warning: {}: {e}", path.display());
            }
            tracing::debug!(path = %path.display(), commands = config.commands.len(), "config loaded");
            Some(config)
        }
        Err(e) => {
            eprintln!("tt: {}: {e}", path.display());
            None
        }
    }
}

// ── Main loop ─────────────────────────────────────────────────────────────────

fn run(ses: &Rc<Session>, config: &Config, args: &CliArgs) -> io::Result<()> {
    // SAFETY: isatty only inspects the descriptor.
    let plain = unsafe { libc::isatty(libc::STDOUT_FILENO) } == 0;
    let mut out = io::stdout().lock();

    for line in config.commands.iter().chain(args.command.iter()) {
        script_driver(ses, line);
        flush_events(ses, &mut out, plain)?;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if ses.is_closed() {
            break;
        }
        let line = line?;
        script_driver(ses, line.trim_end_matches('\r'));
        flush_events(ses, &mut out, plain)?;
    }

    ses.close();
    flush_events(ses, &mut out, plain)
}

/// Write everything the session produced since the last call.
fn flush_events(ses: &Session, out: &mut impl Write, plain: bool) -> io::Result<()> {
    for event in ses.drain_events() {
        let line = match event {
            SessionEvent::Output(s) => s,
            SessionEvent::Error(s) if plain => s,
            SessionEvent::Error(s) => format!("{s}\x1b[0m"),
            SessionEvent::Sent(s) => format!("> {s}"),
        };
        if plain {
            writeln!(out, "{}", strip_ansi(&line))?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid regex"))
        .replace_all(s, "")
}
