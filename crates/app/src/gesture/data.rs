//! Plain data shared between the loop and the smoother.

/// Default confidence gate; predictions at or below the threshold are
/// discarded before they reach the smoothing window.
pub(crate) const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Default smoothing window length.
pub(crate) const DEFAULT_PREDICTION_WINDOW: usize = 10;

/// Default capture tick period in milliseconds.
pub(crate) const DEFAULT_TICK_INTERVAL_MS: u64 = 150;

/// One successful inference result. Ephemeral: it lives only long enough to
/// pass the confidence gate, after which the confidence is discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub confidence: f64,
}

impl RawPrediction {
    /// Strict gate: a prediction at exactly the threshold is rejected.
    pub fn passes_gate(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }
}
