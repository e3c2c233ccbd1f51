use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives one notification per dependency whose lookup settled.
pub trait ProgressSink: Sync {
    fn on_progress(&self, completed: usize, total: usize, name: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Sync,
{
    fn on_progress(&self, completed: usize, total: usize, name: &str) {
        self(completed, total, name)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize, _name: &str) {}
}

/// Terminal loader shown while registry lookups run.
pub struct LoaderBar {
    bar: ProgressBar,
}

impl LoaderBar {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template("  [{bar:40}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for LoaderBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for LoaderBar {
    fn on_progress(&self, completed: usize, total: usize, name: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        self.bar.set_message(format!("Checking {}", name));
    }
}

impl Drop for LoaderBar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
