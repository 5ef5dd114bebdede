//! Progress and confirmation hooks the codec calls back into

/// Receives progress of a long load or save
pub trait ProgressSink {
    fn begin(&mut self, label: &str);

    /// Completion in percent, 0..=100
    fn report(&mut self, percent: u8);

    fn end(&mut self);

    /// Polled at report points; returning true aborts the operation
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Answers yes/no questions raised while loading
pub trait UserPrompt {
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}

impl<P: ProgressSink + ?Sized> ProgressSink for &mut P {
    fn begin(&mut self, label: &str) {
        (**self).begin(label)
    }

    fn report(&mut self, percent: u8) {
        (**self).report(percent)
    }

    fn end(&mut self) {
        (**self).end()
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<P: UserPrompt + ?Sized> UserPrompt for &mut P {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        (**self).confirm(title, message)
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&mut self, _label: &str) {}
    fn report(&mut self, _percent: u8) {}
    fn end(&mut self) {}
}

/// Logs progress at info level, skipping repeated percentages
#[derive(Debug, Default)]
pub struct LogProgress {
    label: String,
    last: Option<u8>,
}

impl ProgressSink for LogProgress {
    fn begin(&mut self, label: &str) {
        self.label = label.to_string();
        self.last = None;
        log::info!("{}", label);
    }

    fn report(&mut self, percent: u8) {
        if self.last != Some(percent) {
            self.last = Some(percent);
            log::info!("{}: {}%", self.label, percent);
        }
    }

    fn end(&mut self) {
        log::info!("{}: done", self.label);
    }
}

/// Accepts every question
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAccept;

impl UserPrompt for AlwaysAccept {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        log::info!("{}: {} (accepted)", title, message);
        true
    }
}

/// Declines every question
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDecline;

impl UserPrompt for AlwaysDecline {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        log::info!("{}: {} (declined)", title, message);
        false
    }
}

/// Scale `done` of `total` into a percentage
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u64 * 100) / total as u64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        reports: Vec<u8>,
    }

    impl ProgressSink for Recorder {
        fn begin(&mut self, _label: &str) {}
        fn report(&mut self, percent: u8) {
            self.reports.push(percent);
        }
        fn end(&mut self) {}
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(12, 10), 100);
        assert_eq!(percent(0, 0), 100);
    }

    fn drive<S: ProgressSink>(mut sink: S) -> bool {
        sink.report(40);
        sink.is_cancelled()
    }

    #[test]
    fn test_borrowed_sink_forwards() {
        let mut recorder = Recorder::default();
        assert!(!drive(&mut recorder));
        assert_eq!(recorder.reports, vec![40]);
    }

    #[test]
    fn test_fixed_prompts() {
        assert!(AlwaysAccept.confirm("Map error", "continue?"));
        assert!(!AlwaysDecline.confirm("Map error", "continue?"));
    }
}
