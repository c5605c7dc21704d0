//! Majority-vote smoothing of the raw prediction stream.

use std::collections::VecDeque;

use tracing::debug;

/// Sentinel shown before any gesture has been confirmed.
pub(crate) const WAITING_LABEL: &str = "Waiting for input...";

/// Converts a noisy label stream into a stable displayed label.
///
/// A label is promoted only when it holds a strict majority of the most
/// recent window and differs from what is already shown; anything less is
/// treated as insufficient evidence and leaves the display untouched.
pub struct PredictionSmoother {
    window: VecDeque<String>,
    capacity: usize,
    displayed: String,
}

impl PredictionSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            displayed: WAITING_LABEL.to_string(),
        }
    }

    /// Raw form of the last promoted label (separator characters intact).
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Push an accepted raw label, evicting the oldest entry at capacity,
    /// then recompute. Returns the new display string when the stability
    /// condition promotes a different label.
    pub fn observe(&mut self, label: String) -> Option<String> {
        self.window.push_back(label);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.recompute()
    }

    /// Majority vote over the current window.
    pub fn recompute(&mut self) -> Option<String> {
        if self.window.len() < self.capacity {
            return None;
        }

        // Frequency table kept in first-seen order; ties resolve to the
        // label that reached the maximum count first in insertion order.
        let mut counts: Vec<(&String, usize)> = Vec::new();
        for label in &self.window {
            match counts.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }

        let mut winner: Option<(&String, usize)> = None;
        for &(label, count) in &counts {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((label, count));
            }
        }
        let (winner, count) = winner?;

        // Strict majority, and never a redundant re-render.
        if count * 2 <= self.capacity || *winner == self.displayed {
            return None;
        }

        let promoted = winner.clone();
        self.displayed = promoted;
        debug!(
            "smoothed label changed to {:?} ({count}/{})",
            self.displayed, self.capacity
        );
        Some(display_form(&self.displayed))
    }
}

/// Cosmetic transform for display: separators become spaces. Never used for
/// equality checks.
pub fn display_form(label: &str) -> String {
    label.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: usize = 10;

    fn fill(smoother: &mut PredictionSmoother, labels: &[&str]) -> Option<String> {
        let mut last = None;
        for label in labels {
            last = smoother.observe((*label).to_string());
        }
        last
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        for i in 0..25 {
            smoother.observe(format!("label_{i}"));
            assert!(smoother.window_len() <= WINDOW);
        }
        assert_eq!(smoother.window_len(), WINDOW);
        // FIFO law: the survivors are exactly the ten most recent pushes.
        let window: Vec<&String> = smoother.window.iter().collect();
        assert_eq!(window.first().map(|s| s.as_str()), Some("label_15"));
        assert_eq!(window.last().map(|s| s.as_str()), Some("label_24"));
    }

    #[test]
    fn strict_majority_promotes_and_formats() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        let labels = [
            "open_palm", "open_palm", "fist", "open_palm", "open_palm", "fist", "open_palm",
            "open_palm", "fist", "open_palm",
        ];
        let update = fill(&mut smoother, &labels);
        assert_eq!(update.as_deref(), Some("open palm"));
        assert_eq!(smoother.displayed(), "open_palm");
    }

    #[test]
    fn plurality_without_majority_keeps_label() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        // 4/3/3 split: a plurality exists but no strict majority.
        let labels = [
            "fist", "fist", "fist", "fist", "palm", "palm", "palm", "ok_sign", "ok_sign", "ok_sign",
        ];
        assert_eq!(fill(&mut smoother, &labels), None);
        assert_eq!(smoother.displayed(), WAITING_LABEL);
    }

    #[test]
    fn even_split_keeps_label() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        let labels = [
            "fist", "open_palm", "fist", "open_palm", "fist", "open_palm", "fist", "open_palm",
            "fist", "open_palm",
        ];
        assert_eq!(fill(&mut smoother, &labels), None);
        assert_eq!(smoother.displayed(), WAITING_LABEL);
    }

    #[test]
    fn insufficient_history_never_updates() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        for _ in 0..WINDOW - 1 {
            assert_eq!(smoother.observe("thumb_up".into()), None);
        }
        assert_eq!(smoother.displayed(), WAITING_LABEL);
    }

    #[test]
    fn same_winner_is_not_re_rendered() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        let labels = ["thumb_up"; 10];
        assert_eq!(fill(&mut smoother, &labels).as_deref(), Some("thumb up"));
        // Another confident frame keeps the same majority; no update fires.
        assert_eq!(smoother.observe("thumb_up".into()), None);
        assert_eq!(smoother.displayed(), "thumb_up");
    }

    #[test]
    fn responds_to_genuine_gesture_change() {
        let mut smoother = PredictionSmoother::new(WINDOW);
        fill(&mut smoother, &["fist"; 10]);
        assert_eq!(smoother.displayed(), "fist");
        // Six of the last ten now read open_palm: majority flips.
        let update = fill(&mut smoother, &["open_palm"; 6]);
        assert_eq!(update.as_deref(), Some("open palm"));
    }

    #[test]
    fn display_form_replaces_all_separators() {
        assert_eq!(display_form("c_shape"), "c shape");
        assert_eq!(display_form("fist_moved_fast"), "fist moved fast");
        assert_eq!(display_form("palm"), "palm");
    }
}
