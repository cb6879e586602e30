use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Informed once per settled item. Implementations must not block.
pub trait Progress: Send + Sync {
    fn advance(&self);

    fn finish(&self) {}
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self) {}
}

impl Progress for ProgressBar {
    fn advance(&self) {
        self.inc(1);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

/// A 50-column bar with `label`, percentage and `current/total`.
pub fn progress_bar(total: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    // The template is a constant, a parse failure leaves the default style.
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg}: [{bar:50}] {percent}% ({pos}/{len})")
    {
        bar.set_style(style.progress_chars("█░"));
    }
    bar.set_message(label.to_string());
    bar
}

/// Plain counter against a fixed total.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: u64,
    current: AtomicU64,
    finished: AtomicBool,
}

impl CountingProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            current: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        self.current().min(self.total) * 100 / self.total
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Progress for CountingProgress {
    fn advance(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_progress_percent() {
        let progress = CountingProgress::new(4);
        assert_eq!(progress.percent(), 0);
        progress.advance();
        assert_eq!(progress.percent(), 25);
        progress.advance();
        progress.advance();
        progress.advance();
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.current(), progress.total());
    }

    #[test]
    fn test_hidden_bar_counts() {
        let bar = ProgressBar::hidden();
        bar.set_length(3);
        bar.advance();
        bar.advance();
        assert_eq!(bar.position(), 2);
    }
}
