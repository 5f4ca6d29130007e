use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::Duration;

use crate::icons;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

pub struct SpinnerBuilder {
    message: Cow<'static, str>,
}

impl SpinnerBuilder {
    pub fn start(self) -> Spinner {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.set_message(self.message);
        pb.enable_steady_tick(Duration::from_millis(80));
        Spinner { pb }
    }
}

/// Spinner on stderr. Draws nothing when stderr is not a terminal.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn builder(message: impl Into<Cow<'static, str>>) -> SpinnerBuilder {
        SpinnerBuilder {
            message: message.into(),
        }
    }

    pub fn set_message(&self, message: impl Into<Cow<'static, str>>) {
        self.pb.set_message(message);
    }

    /// Stop and clear the line.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.pb.finish_and_clear();
        eprintln!("{} {}", icons::success(), message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.pb.finish_and_clear();
        eprintln!("{} {}", icons::error(), message.as_ref());
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
