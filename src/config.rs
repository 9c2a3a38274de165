//! Startup configuration: whether to color output, and with which colors.
//!
//! Read once when the program starts and passed by reference to everything
//! that renders, so nothing downstream consults global state.

use std::io::IsTerminal;

/// Resets all color attributes
pub const RESET: &str = "\x1b[m";

/// Where configuration values come from
pub trait ConfigSource {
    /// Resolve a git color boolean (`always`/`auto`/`never`/`true`/...)
    fn colorbool(&self, key: &str, stdout_is_tty: bool) -> Option<bool>;

    /// Resolve a git color slot to an ANSI escape sequence
    fn color(&self, key: &str, default: &str) -> Option<String>;
}

/// When to color output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Follow `color.interactive`, coloring only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// ANSI escape sequences used for operator-facing output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// The "Stage this hunk" prompt
    pub prompt: String,
    /// Navigation errors
    pub error: String,
    /// The command legend
    pub help: String,
    /// Hunk header line numbers
    pub fraginfo: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            prompt: "\x1b[1;34m".to_string(),
            error: "\x1b[1;31m".to_string(),
            help: "\x1b[1;31m".to_string(),
            fraginfo: "\x1b[36m".to_string(),
        }
    }
}

impl Palette {
    /// Wrap `text` in `color` and a reset
    pub fn paint(color: &str, text: &str) -> String {
        format!("{color}{text}{RESET}")
    }
}

/// Process-wide settings for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub use_color: bool,
    pub palette: Palette,
}

impl Config {
    /// No color at all
    pub fn plain() -> Self {
        Self::default()
    }

    /// Color with the default palette
    pub fn colored() -> Self {
        Self {
            use_color: true,
            palette: Palette::default(),
        }
    }

    /// The palette, if output should be colored
    pub fn palette(&self) -> Option<&Palette> {
        self.use_color.then_some(&self.palette)
    }

    /// Build the configuration from `source` and the command-line choice.
    ///
    /// Color slots are `color.interactive.{prompt,error,help}` and
    /// `color.diff.frag`; unreadable slots keep their defaults. File heads
    /// are shown as the diff engine colored them.
    pub fn load(source: &impl ConfigSource, choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => source
                .colorbool("color.interactive", std::io::stdout().is_terminal())
                .unwrap_or(false),
        };

        if !use_color {
            return Self::plain();
        }

        let defaults = Palette::default();
        let slot = |key: &str, spec: &str, fallback: String| {
            source.color(key, spec).unwrap_or(fallback)
        };

        Self {
            use_color,
            palette: Palette {
                prompt: slot("color.interactive.prompt", "bold blue", defaults.prompt),
                error: slot("color.interactive.error", "bold red", defaults.error),
                help: slot("color.interactive.help", "red bold", defaults.help),
                fraginfo: slot("color.diff.frag", "cyan", defaults.fraginfo),
            },
        }
    }
}
