use std::time::{Duration, Instant};

/// Percent-done and ETA tracker over a fixed number of tasks
#[derive(Debug, Clone)]
pub struct Progress {
    started: Instant,
    done: usize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            started: Instant::now(),
            done: 0,
            total,
        }
    }

    /// Mark one more task as done
    pub fn advance(&mut self) {
        self.done += 1;
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent_done(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.done as f64 * 100.0 / self.total as f64
    }

    /// Remaining time at the average rate so far, given the elapsed time.
    /// `None` until at least one whole second has passed.
    pub fn eta(&self, elapsed: Duration) -> Option<Duration> {
        let seconds = elapsed.as_secs();
        if seconds == 0 || self.done == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.done) as f64;
        Some(Duration::from_secs_f64(
            remaining * seconds as f64 / self.done as f64,
        ))
    }

    /// Status line such as `37.50% done, ETA: 00:02:13`
    pub fn status(&self) -> String {
        self.status_after(self.started.elapsed())
    }

    pub fn status_after(&self, elapsed: Duration) -> String {
        let eta = self
            .eta(elapsed)
            .map(format_hms)
            .unwrap_or_else(|| "NA".to_string());
        format!("{:.2}% done, ETA: {}", self.percent_done(), eta)
    }
}

fn format_hms(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let mut progress = Progress::new(8);
        assert_eq!(progress.status_after(Duration::from_secs(10)), "0.00% done, ETA: NA");

        for _ in 0..2 {
            progress.advance();
        }
        assert_eq!(progress.status_after(Duration::ZERO), "25.00% done, ETA: NA");
        // 2 tasks in 60 s leaves 6 tasks, 180 s
        assert_eq!(
            progress.status_after(Duration::from_secs(60)),
            "25.00% done, ETA: 00:03:00"
        );
    }

    #[test]
    fn test_long_eta() {
        let mut progress = Progress::new(101);
        progress.advance();
        assert_eq!(
            progress.status_after(Duration::from_secs(3700)),
            "0.99% done, ETA: 102:46:40"
        );
    }

    #[test]
    fn test_empty_total() {
        let progress = Progress::new(0);
        assert_eq!(progress.percent_done(), 100.0);
    }
}
