//! Progress bars on stderr.
//!
//! Bars are hidden when stderr is not a terminal, when `--quiet`-style
//! settings apply (`TESTVERDICT_QUIET`), or when JSON goes to stdout and
//! would be interleaved with bar redraws.
//!
//! ```rust,no_run
//! use testverdict::progress::{ProgressConfig, ProgressManager, TEMPLATE_PAIR_ANALYSIS};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false));
//! let bar = manager.create_bar(12, TEMPLATE_PAIR_ANALYSIS);
//! bar.set_message("Analyzing pairs");
//! bar.inc(1);
//! bar.finish_and_clear();
//! ```

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

pub const QUIET_ENV_VAR: &str = "TESTVERDICT_QUIET";

pub const TEMPLATE_PAIR_ANALYSIS: &str = "{spinner} {msg} {pos}/{len} pairs ({percent}%) - {eta}";
pub const TEMPLATE_SPINNER: &str = "{spinner} {msg}";

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    pub quiet_mode: bool,
}

impl ProgressConfig {
    pub fn from_env(quiet: bool) -> Self {
        Self {
            quiet_mode: quiet || std::env::var_os(QUIET_ENV_VAR).is_some(),
        }
    }

    pub fn should_show_progress(&self) -> bool {
        !self.quiet_mode && std::io::stderr().is_terminal()
    }
}

#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// A bar of `len` steps, hidden when progress is off. An invalid
    /// template falls back to the default bar style.
    pub fn create_bar(&self, len: u64, template: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }
        let bar = self.multi.add(ProgressBar::new(len));
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars(TICK_CHARS);
        bar.set_style(style);
        bar
    }

    pub fn create_spinner(&self, msg: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template(TEMPLATE_SPINNER)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        bar.set_style(style);
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    /// Remove every bar before printing the final output.
    pub fn clear(&self) -> std::io::Result<()> {
        self.multi.clear()
    }
}
