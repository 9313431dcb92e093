use crate::{
    core::slot::{PerSlot, SLOTS_PER_DAY},
    prelude::*,
    quantity::power::Kilowatts,
};

/// Days of consumption history kept for prediction.
const MAX_HISTORY_DAYS: usize = 30;

/// The prediction is inflated by this margin so the plan does not undershoot
/// the actual consumption.
const SAFETY_MARGIN: f64 = 1.1;

/// Weighted-history predictor for the household load profile.
///
/// A recency-weighted average of the stored daily patterns: the most recent
/// day weighs 1.0 and every day of age discounts the weight by
/// `1 / (1 + 0.1 × age)`.
pub struct LoadPredictor {
    history: Vec<Vec<f64>>,
}

impl LoadPredictor {
    #[must_use]
    pub const fn new(history: Vec<Vec<f64>>) -> Self {
        Self { history }
    }

    /// Predict the per-slot load, falling back to the given profile while the
    /// history is still empty.
    #[must_use]
    pub fn predict(&self, fallback: &PerSlot<Kilowatts>) -> PerSlot<Kilowatts> {
        let mut prediction = [0.0_f64; SLOTS_PER_DAY];
        let mut total_weight = 0.0;

        for (age, pattern) in self.history.iter().rev().enumerate() {
            if pattern.len() != SLOTS_PER_DAY {
                continue;
            }
            #[expect(clippy::cast_precision_loss)]
            let weight = 1.0 / (1.0 + age as f64 * 0.1);
            for (slot, value) in pattern.iter().enumerate() {
                prediction[slot] += value * weight;
            }
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            debug!("no usable consumption history yet");
            return *fallback;
        }

        let mut slots = [Kilowatts::ZERO; SLOTS_PER_DAY];
        for (slot, value) in prediction.into_iter().enumerate() {
            slots[slot] = Kilowatts::from(value / total_weight * SAFETY_MARGIN);
        }
        slots
    }

    /// Record today's pattern, keeping at most [`MAX_HISTORY_DAYS`] days.
    pub fn observe(&mut self, pattern: &PerSlot<Kilowatts>) {
        self.history.push(pattern.iter().map(|power| power.0).collect());
        if self.history.len() > MAX_HISTORY_DAYS {
            let excess = self.history.len() - MAX_HISTORY_DAYS;
            self.history.drain(..excess);
        }
    }

    #[must_use]
    pub fn into_history(self) -> Vec<Vec<f64>> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_empty_history_falls_back() {
        let fallback = [Kilowatts::from(0.7); SLOTS_PER_DAY];
        let predicted = LoadPredictor::new(Vec::new()).predict(&fallback);
        assert_eq!(predicted, fallback);
    }

    #[test]
    fn test_single_day_with_margin() {
        let predictor = LoadPredictor::new(vec![vec![1.0; SLOTS_PER_DAY]]);
        let predicted = predictor.predict(&[Kilowatts::ZERO; SLOTS_PER_DAY]);
        assert_abs_diff_eq!(predicted[0].0, 1.1);
    }

    #[test]
    fn test_recent_days_weigh_more() {
        // An old day at 1.0 kW and a recent day at 2.0 kW: the prediction must
        // land above the plain average of 1.5 (times the margin):
        let predictor =
            LoadPredictor::new(vec![vec![1.0; SLOTS_PER_DAY], vec![2.0; SLOTS_PER_DAY]]);
        let predicted = predictor.predict(&[Kilowatts::ZERO; SLOTS_PER_DAY]);
        let expected = (2.0 + 1.0 / 1.1) / (1.0 + 1.0 / 1.1) * 1.1;
        assert_abs_diff_eq!(predicted[0].0, expected, epsilon = 1e-9);
        assert!(predicted[0].0 > 1.5 * 1.1);
    }

    #[test]
    fn test_malformed_patterns_are_skipped() {
        let predictor = LoadPredictor::new(vec![vec![9.0; 3], vec![1.0; SLOTS_PER_DAY]]);
        let predicted = predictor.predict(&[Kilowatts::ZERO; SLOTS_PER_DAY]);
        assert_abs_diff_eq!(predicted[0].0, 1.1);
    }

    #[test]
    fn test_history_is_capped() {
        let mut predictor = LoadPredictor::new(Vec::new());
        for day in 0..40 {
            predictor.observe(&[Kilowatts::from(f64::from(day)); SLOTS_PER_DAY]);
        }
        let history = predictor.into_history();
        assert_eq!(history.len(), MAX_HISTORY_DAYS);
        // The oldest days were dropped:
        assert_abs_diff_eq!(history[0][0], 10.0);
    }
}
