use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(
    Copy,
    Clone,
    PartialEq,
    PartialOrd,
    Deserialize,
    Serialize,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct Percent(pub f64);

impl Percent {
    /// Convert to a `[0, 1]` proportion.
    #[must_use]
    pub fn to_proportion(self) -> f64 {
        0.01 * self.0
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} %", self.0)
    }
}

impl Debug for Percent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_to_proportion() {
        assert_abs_diff_eq!(Percent(95.0).to_proportion(), 0.95, epsilon = 1e-12);
    }
}
