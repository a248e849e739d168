use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Token amount in base units. All protocol accounting is integral;
/// arithmetic is explicit (checked or saturating), never panicking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u64);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);
    pub const MAX: TokenAmount = TokenAmount(u64::MAX);

    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub const fn to_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(&self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    pub fn saturating_add(&self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    pub fn min(&self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.min(other.0))
    }

    /// Basis-point fraction of this amount, rounded down.
    pub fn mul_bps(&self, bps: u16) -> TokenAmount {
        let scaled = (self.0 as u128) * (bps as u128) / 10_000;
        TokenAmount(scaled as u64)
    }

    /// Split into `parts` equal shares; returns (per-share, remainder).
    /// Zero parts yields a zero share with the full amount as remainder.
    pub fn split_evenly(&self, parts: u64) -> (TokenAmount, TokenAmount) {
        if parts == 0 {
            return (TokenAmount::ZERO, *self);
        }
        let per = self.0 / parts;
        let remainder = self.0 - per * parts;
        (TokenAmount(per), TokenAmount(remainder))
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = TokenAmount>>(iter: I) -> Self {
        iter.fold(TokenAmount::ZERO, |acc, a| acc.saturating_add(a))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        let a = TokenAmount::from_units(100);
        let b = TokenAmount::from_units(30);

        assert_eq!(a.checked_add(b), Some(TokenAmount::from_units(130)));
        assert_eq!(a.checked_sub(b), Some(TokenAmount::from_units(70)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(TokenAmount::MAX.checked_add(TokenAmount::from_units(1)), None);
    }

    #[test]
    fn test_saturating_arithmetic() {
        let a = TokenAmount::from_units(10);
        let b = TokenAmount::from_units(25);

        assert_eq!(a.saturating_sub(b), TokenAmount::ZERO);
        assert_eq!(
            TokenAmount::MAX.saturating_add(a),
            TokenAmount::MAX
        );
    }

    #[test]
    fn test_mul_bps() {
        let amount = TokenAmount::from_units(10_000);
        assert_eq!(amount.mul_bps(0), TokenAmount::ZERO);
        assert_eq!(amount.mul_bps(2_500), TokenAmount::from_units(2_500));
        assert_eq!(amount.mul_bps(10_000), amount);

        // Rounds down, no overflow at u64 scale
        let big = TokenAmount::from_units(u64::MAX);
        assert_eq!(big.mul_bps(10_000), big);
        assert_eq!(TokenAmount::from_units(3).mul_bps(5_000), TokenAmount::from_units(1));
    }

    #[test]
    fn test_split_evenly() {
        let amount = TokenAmount::from_units(100);

        let (per, rem) = amount.split_evenly(3);
        assert_eq!(per, TokenAmount::from_units(33));
        assert_eq!(rem, TokenAmount::from_units(1));

        let (per, rem) = amount.split_evenly(0);
        assert_eq!(per, TokenAmount::ZERO);
        assert_eq!(rem, amount);

        let (per, rem) = amount.split_evenly(4);
        assert_eq!(per, TokenAmount::from_units(25));
        assert_eq!(rem, TokenAmount::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: TokenAmount = [10u64, 20, 30]
            .iter()
            .map(|u| TokenAmount::from_units(*u))
            .sum();
        assert_eq!(total, TokenAmount::from_units(60));
    }
}
