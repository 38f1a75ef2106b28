//! Terminal output utilities: ANSI formatting for status and error notes.

use std::io::{IsTerminal, Write};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Format an error line. The plain form always starts with `error:`.
pub fn format_error(msg: &str, color: bool) -> String {
    if color {
        format!("{RED}{BOLD}✗{RESET} {msg}")
    } else {
        format!("error: {msg}")
    }
}

/// Format a status line for a written file.
pub fn format_success(msg: &str, color: bool) -> String {
    if color {
        format!("{GREEN}{BOLD}✓{RESET} {msg}")
    } else {
        format!("wrote {msg}")
    }
}

/// Print a formatted ERROR note to stderr.
pub fn note_error(msg: &str) {
    let stderr = std::io::stderr();
    let color = stderr.is_terminal() && supports_color();
    let _ = writeln!(stderr.lock(), "{}", format_error(msg, color));
}

/// Print a formatted SUCCESS note to `out`.
pub fn note_success(out: &mut impl Write, msg: &str, color: bool) -> std::io::Result<()> {
    writeln!(out, "{}", format_success(msg, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_error_has_marker() {
        assert_eq!(format_error("file zzz does not exist", false), "error: file zzz does not exist");
    }

    #[test]
    fn colored_notes_use_symbols() {
        assert!(format_error("boom", true).contains('✗'));
        assert!(format_success("out.txt", true).contains('✓'));
    }

    #[test]
    fn success_note_is_one_line() {
        let mut out = Vec::new();
        note_success(&mut out, "out/1.txt", false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "wrote out/1.txt\n");
    }
}
