//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Operator console styling and output sinks."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Operator-facing console output.
//!
//! The harness and the generator print human readable pass/fail lines. Colour
//! is decided once at startup from `USE_COLORS`/`TERM` (or an explicit
//! [`ColorMode`]) and the resulting [`Palette`] is read-only afterwards.

use std::io::{self, Write};
use std::sync::Arc;

use clap::ValueEnum;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 70;

/// Colour selection requested by configuration or command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Decide whether ANSI colours should be emitted.
///
/// Windows consoles only get colour when `USE_COLORS=1`; elsewhere colour is on
/// when `USE_COLORS=1` or `TERM` is anything but `dumb`.
pub fn colors_enabled(use_colors: Option<&str>, term: Option<&str>, is_windows: bool) -> bool {
    let forced = use_colors == Some("1");
    if is_windows {
        forced
    } else {
        forced || term != Some("dumb")
    }
}

/// ANSI escape sequences, empty when colour is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub green: &'static str,
    pub red: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub magenta: &'static str,
    pub cyan: &'static str,
    pub bold: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub const fn ansi() -> Self {
        Self {
            green: "\x1b[92m",
            red: "\x1b[91m",
            yellow: "\x1b[93m",
            blue: "\x1b[94m",
            magenta: "\x1b[95m",
            cyan: "\x1b[96m",
            bold: "\x1b[1m",
            reset: "\x1b[0m",
        }
    }

    pub const fn plain() -> Self {
        Self {
            green: "",
            red: "",
            yellow: "",
            blue: "",
            magenta: "",
            cyan: "",
            bold: "",
            reset: "",
        }
    }

    /// Resolve the palette for `mode`, consulting the process environment for `Auto`.
    pub fn resolve(mode: ColorMode) -> Self {
        let enabled = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => colors_enabled(
                std::env::var("USE_COLORS").ok().as_deref(),
                std::env::var("TERM").ok().as_deref(),
                cfg!(windows),
            ),
        };
        if enabled {
            Self::ansi()
        } else {
            Self::plain()
        }
    }
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared output handle for operator messages.
#[derive(Clone)]
pub struct Console {
    palette: Palette,
    sink: Sink,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

/// In-memory capture returned by [`Console::capture`].
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Console {
    pub fn stdout(palette: Palette) -> Self {
        Self {
            palette,
            sink: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// Console writing into memory, used to assert on operator output.
    pub fn capture(palette: Palette) -> (Self, CapturedOutput) {
        let buffer = CapturedOutput::default();
        let console = Self {
            palette,
            sink: Arc::new(Mutex::new(Box::new(CaptureWriter(buffer.0.clone())))),
        };
        (console, buffer)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Write one raw line. Console output is best effort; a closed stdout is ignored.
    pub fn line(&self, text: impl AsRef<str>) {
        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "{}", text.as_ref());
        let _ = sink.flush();
    }

    /// Write text without a trailing newline (prompts).
    pub fn inline(&self, text: impl AsRef<str>) {
        let mut sink = self.sink.lock();
        let _ = write!(sink, "{}", text.as_ref());
        let _ = sink.flush();
    }

    pub fn blank(&self) {
        self.line("");
    }

    pub fn header(&self, text: &str) {
        let p = &self.palette;
        let rule = "=".repeat(RULE_WIDTH);
        self.blank();
        self.line(format!("{}{}{}{}", p.bold, p.cyan, rule, p.reset));
        self.line(format!("{}{}{}{}", p.bold, p.cyan, text, p.reset));
        self.line(format!("{}{}{}{}", p.bold, p.cyan, rule, p.reset));
        self.blank();
    }

    pub fn section(&self, text: &str) {
        let p = &self.palette;
        self.blank();
        self.line(format!("{}{}{}{}", p.bold, p.blue, text, p.reset));
    }

    pub fn success(&self, message: impl AsRef<str>) {
        let p = &self.palette;
        self.line(format!("{}[PASS] {}{}", p.green, message.as_ref(), p.reset));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let p = &self.palette;
        self.line(format!("{}[FAIL] {}{}", p.red, message.as_ref(), p.reset));
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        let p = &self.palette;
        self.line(format!("{}[WARN] {}{}", p.yellow, message.as_ref(), p.reset));
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let p = &self.palette;
        self.line(format!("{}[INFO] {}{}", p.magenta, message.as_ref(), p.reset));
    }

    /// Wrap `text` in the given colour code.
    pub fn paint(&self, color: &str, text: impl AsRef<str>) -> String {
        format!("{}{}{}", color, text.as_ref(), self.palette.reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_requires_explicit_opt_in() {
        assert!(!colors_enabled(None, Some("xterm"), true));
        assert!(!colors_enabled(Some("0"), None, true));
        assert!(colors_enabled(Some("1"), None, true));
    }

    #[test]
    fn unix_disables_only_for_dumb_terminals() {
        assert!(colors_enabled(None, Some("xterm-256color"), false));
        assert!(colors_enabled(None, None, false));
        assert!(!colors_enabled(None, Some("dumb"), false));
        assert!(colors_enabled(Some("1"), Some("dumb"), false));
    }

    #[test]
    fn explicit_modes_override_environment() {
        assert_eq!(Palette::resolve(ColorMode::Never), Palette::plain());
        assert_eq!(Palette::resolve(ColorMode::Always), Palette::ansi());
    }

    #[test]
    fn capture_records_tagged_lines() {
        let (console, output) = Console::capture(Palette::plain());
        console.success("reading stored");
        console.error("boom");
        console.warning("careful");
        console.info("fyi");
        let text = output.contents();
        assert!(text.contains("[PASS] reading stored\n"));
        assert!(text.contains("[FAIL] boom\n"));
        assert!(text.contains("[WARN] careful\n"));
        assert!(text.contains("[INFO] fyi\n"));
    }

    #[test]
    fn plain_palette_emits_no_escape_codes() {
        let (console, output) = Console::capture(Palette::plain());
        console.header("Suite");
        assert!(!output.contents().contains('\x1b'));
    }

    #[test]
    fn color_mode_parses_case_insensitively() {
        assert_eq!(ColorMode::from_str("ALWAYS", true).unwrap(), ColorMode::Always);
        assert_eq!(ColorMode::from_str("never", false).unwrap(), ColorMode::Never);
        assert!(ColorMode::from_str("sometimes", true).is_err());
    }
}
