//! Console and log-file output for vizpack
//!
//! Every message goes to `vizpack.log` (truncated once per run). The
//! console only sees what the current verbosity allows; `--no-stdout`
//! silences it entirely.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

const LOG_FILE_NAME: &str = "vizpack.log";
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

struct LogState {
    file: Option<PathBuf>,
    verbosity: u8,
    no_stdout: bool,
}

static STATE: Mutex<LogState> = Mutex::new(LogState {
    file: None,
    verbosity: 0,
    no_stdout: false,
});
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Trace,
    Debug,
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Lowest verbosity at which the console shows this level
    fn min_verbosity(self) -> u8 {
        match self {
            Level::Trace => 2,
            Level::Debug | Level::Info => 1,
            Level::Success | Level::Warn | Level::Error => 0,
        }
    }

    fn prefix(self) -> Option<ColoredString> {
        match self {
            Level::Trace => Some("TRACE:".normal()),
            Level::Debug => Some("DEBUG:".blue().bold()),
            Level::Info => None,
            Level::Success => Some("\u{2714}".green().bold()),
            Level::Warn => Some("warning:".yellow().bold()),
            Level::Error => Some("Error:".red().bold()),
        }
    }
}

fn with_state<T>(read: impl FnOnce(&LogState) -> T, fallback: T) -> T {
    STATE.lock().map(|state| read(&state)).unwrap_or(fallback)
}

pub fn get_verbosity() -> u8 {
    with_state(|s| s.verbosity, 0)
}

/// Whether console output is suppressed (log file only)
pub fn get_no_stdout() -> bool {
    with_state(|s| s.no_stdout, false)
}

/// Initialize with a verbosity level: 0 = warnings, 1 = debug (-v),
/// 2 = trace (-vv). The log goes to `~/.config/vizpack/`.
pub fn init_with_verbosity(verbosity: u8, no_stdout: bool) -> Result<(), String> {
    if let Ok(mut state) = STATE.lock() {
        state.verbosity = verbosity;
        state.no_stdout = no_stdout;
    }
    init_in(log_dir()?)
}

/// Point the log at `log_dir`, starting a fresh file
pub fn init_in(log_dir: PathBuf) -> Result<(), String> {
    fs::create_dir_all(&log_dir)
        .map_err(|e| format!("Failed to create log directory {}: {}", log_dir.display(), e))?;

    let log_file = log_dir.join(LOG_FILE_NAME);
    if log_file.exists() {
        fs::remove_file(&log_file)
            .map_err(|e| format!("Failed to reset {}: {}", log_file.display(), e))?;
    }

    let mut state = STATE
        .lock()
        .map_err(|_| "Logger state lock poisoned".to_string())?;
    state.file = Some(log_file);
    Ok(())
}

fn log_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let base = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config");

    #[cfg(target_os = "windows")]
    let base = dirs::config_dir().ok_or("Could not determine config directory")?;

    Ok(base.join("vizpack"))
}

fn append(line: &str) {
    let Some(path) = with_state(|s| s.file.clone(), None) else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {}", timestamp, line);
    }
}

fn print_line(line: &str) {
    if get_no_stdout() {
        return;
    }
    match SPINNER.lock().ok().as_deref().and_then(Option::as_ref) {
        Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
        None => eprintln!("{}", line),
    }
}

fn emit(level: Level, message: &str) {
    append(&format!("{} {}", level.tag(), message));
    if get_verbosity() < level.min_verbosity() {
        return;
    }
    match level.prefix() {
        Some(prefix) => print_line(&format!("{} {}", prefix, message)),
        None => print_line(message),
    }
}

pub fn info(message: &str) {
    emit(Level::Info, message);
}

pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

pub fn error(message: &str) {
    emit(Level::Error, message);
}

pub fn success(message: &str) {
    emit(Level::Success, message);
}

/// A pipeline step; console only at -vv
pub fn step(message: &str) {
    emit(Level::Trace, message);
}

/// Record an external command and everything it printed
pub fn capture_output(command_name: &str, output: &std::process::Output) {
    append(&format!(
        "COMMAND {} (exit code: {:?})",
        command_name,
        output.status.code()
    ));
    for (stream, bytes) in [("STDOUT", &output.stdout), ("STDERR", &output.stderr)] {
        let text = String::from_utf8_lossy(bytes);
        if !text.trim().is_empty() {
            append(&format!("  {}:\n{}", stream, text.trim_end()));
        }
    }
}

pub fn get_log_path() -> Option<PathBuf> {
    with_state(|s| s.file.clone(), None)
}

pub fn show_log_path() {
    match get_log_path() {
        Some(path) => eprintln!("Log file: {}", path.display()),
        None => eprintln!("Log file location not available"),
    }
}

/// Show a spinner unless verbose output or `--no-stdout` is on
pub fn spinner_start(message: &str) {
    if get_verbosity() > 0 || get_no_stdout() {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(SPINNER_FRAMES)
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut slot) = SPINNER.lock() {
        if let Some(previous) = slot.replace(spinner) {
            previous.finish_and_clear();
        }
    }
}

pub fn spinner_success(message: &str) {
    spinner_stop();
    success(message);
}

pub fn spinner_error(message: &str) {
    spinner_stop();
    append(&format!("{} {}", Level::Error.tag(), message));
    print_line(&format!("  {} {}", "✗".red().bold(), message));
}

pub fn spinner_stop() {
    let spinner = SPINNER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
