//! Terminal output with colored module prefixes.
//!
//! This module provides:
//! - `log!` macro for one-line messages: `[build] collecting pages...`
//! - [`report`] for pre-formatted multi-line error reports
//! - [`Progress`] for a single in-place counter while pages compile
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "found {} pages", count);
//!
//! let progress = Progress::new("pages", pages.len(), true);
//! progress.inc();
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stderr, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Brackets around the module name plus the space after it: "[module] "
const PREFIX_OVERHEAD: usize = 3;

fn terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print one message line, truncated to the terminal width.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let max_len = (terminal_width() as usize).saturating_sub(module.len() + PREFIX_OVERHEAD);
    let message = truncate_str(message, max_len);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Print a pre-formatted report to stderr without truncation.
///
/// Build errors carry multi-line explanations; they are shown as-is.
pub fn report(text: &str) {
    let mut stderr = stderr().lock();
    writeln!(stderr).ok();
    writeln!(stderr, "{}", text.trim_end()).ok();
    writeln!(stderr).ok();
    stderr.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "make" => prefix.bright_green().bold(),
        "assets" => prefix.bright_blue().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate to at most `max_len` bytes on a UTF-8 boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Progress
// ============================================================================

/// Single-line progress counter: `[pages] 12/40`.
///
/// Redrawn in place on every increment. Page tasks run interleaved on one
/// thread, so the counter only needs to be atomic, not locked.
pub struct Progress {
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
    enabled: bool,
}

impl Progress {
    pub fn new(module: &str, total: usize, enabled: bool) -> Self {
        Self {
            prefix: colorize_prefix(module),
            total,
            current: AtomicUsize::new(0),
            // A counter for a single item is just noise
            enabled: enabled && total > 1,
        }
    }

    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.enabled {
            return;
        }
        let mut stdout = stdout().lock();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "\r{} {}/{}", self.prefix, current, self.total).ok();
        stdout.flush().ok();
    }

    pub fn count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    /// Clear the counter line.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let mut stdout = stdout().lock();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }
}
