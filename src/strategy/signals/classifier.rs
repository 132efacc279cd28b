use crate::data::{ImbalanceScore, Signal};
use crate::error::{ImbalanceError, Result};

/// Default signal threshold
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Maps an imbalance score onto a discrete signal.
///
/// `score > threshold` is StrongBuy, `score < -threshold` is StrongSell and
/// everything else, including scores exactly on ±threshold, is Neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalClassifier {
    threshold: f64,
}

impl SignalClassifier {
    /// # Arguments
    /// * `threshold` - Absolute score above which a signal fires, in (0, 1]
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, score: ImbalanceScore) -> Signal {
        let value = score.value();
        if value > self.threshold {
            Signal::StrongBuy
        } else if value < -self.threshold {
            Signal::StrongSell
        } else {
            Signal::Neutral
        }
    }
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Classify a score against a per-call threshold
pub fn classify(score: ImbalanceScore, threshold: f64) -> Result<Signal> {
    Ok(SignalClassifier::new(threshold)?.classify(score))
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
        return Err(ImbalanceError::invalid(format!(
            "threshold must be within (0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: f64) -> ImbalanceScore {
        ImbalanceScore::new(v).unwrap()
    }

    #[test]
    fn test_boundaries_are_neutral() {
        let classifier = SignalClassifier::new(0.6).unwrap();
        assert_eq!(classifier.classify(score(0.6)), Signal::Neutral);
        assert_eq!(classifier.classify(score(-0.6)), Signal::Neutral);
    }

    #[test]
    fn test_just_past_boundaries_fire() {
        let classifier = SignalClassifier::new(0.6).unwrap();
        assert_eq!(classifier.classify(score(0.6000001)), Signal::StrongBuy);
        assert_eq!(classifier.classify(score(-0.6000001)), Signal::StrongSell);
    }

    #[test]
    fn test_concrete_scenarios() {
        assert_eq!(classify(score(50.0 / 110.0), 0.6).unwrap(), Signal::Neutral);
        assert_eq!(classify(score(-1.0), 0.6).unwrap(), Signal::StrongSell);
        assert_eq!(classify(ImbalanceScore::ZERO, 0.6).unwrap(), Signal::Neutral);
        assert_eq!(classify(score(0.72), 0.6).unwrap(), Signal::StrongBuy);
    }

    #[test]
    fn test_threshold_of_one_never_fires() {
        let classifier = SignalClassifier::new(1.0).unwrap();
        assert_eq!(classifier.classify(score(1.0)), Signal::Neutral);
        assert_eq!(classifier.classify(score(-1.0)), Signal::Neutral);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            assert!(matches!(
                SignalClassifier::new(bad),
                Err(ImbalanceError::InvalidArgument(_))
            ));
        }
        assert!(classify(ImbalanceScore::ZERO, 0.0).is_err());
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(SignalClassifier::default().threshold(), 0.6);
    }
}
