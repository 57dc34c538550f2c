use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

pub type Cost = Quantity<0, 0, 1>;

impl Cost {
    /// Per-interval and aggregated costs keep four decimal places.
    pub fn round_to_hundredths_of_cent(self) -> Self {
        self.round_to(4)
    }

    /// Subscription prorations are plain cents.
    pub fn round_to_cents(self) -> Self {
        self.round_to(2)
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} €", self.0)
    }
}

impl Debug for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}€", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_abs_diff_eq!(Cost::from(0.986_301).round_to_cents().0, 0.99);
    }
}
