use cosmwasm_std::{Decimal256, StdError, StdResult, Uint128, Uint256};

use crate::error::ContractError;

/// Exact fixed-point rational with (at least) 18 fractional digits. A thin
/// wrapper over [`Decimal256`] rather than a bespoke bignum type: the
/// teacher already leans on `Decimal256`/`Uint256` for every curve
/// computation that needs headroom beyond `Uint128` (see
/// `contracts/pair::compute_swap`), so this crate does the same instead of
/// inventing its own rational type.
///
/// Division truncates toward zero (`Decimal256`'s native behaviour).
/// Integer exponentiation is defined for non-negative integer exponents
/// only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dec(pub Decimal256);

impl Dec {
    pub const fn zero() -> Self {
        Dec(Decimal256::zero())
    }

    pub fn one() -> Self {
        Dec(Decimal256::one())
    }

    pub fn from_ratio(numerator: impl Into<Uint256>, denominator: impl Into<Uint256>) -> Self {
        Dec(Decimal256::from_ratio(numerator, denominator))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Dec) -> StdResult<Dec> {
        Ok(Dec(self.0.checked_add(other.0)?))
    }

    /// Fails with [`StdError`] on underflow rather than silently saturating:
    /// every caller in this crate treats a negative result as a curve-domain
    /// error, never a valid price.
    pub fn checked_sub(&self, other: Dec) -> StdResult<Dec> {
        Ok(Dec(self.0.checked_sub(other.0)?))
    }

    pub fn checked_mul(&self, other: Dec) -> StdResult<Dec> {
        Ok(Dec(self.0.checked_mul(other.0)?))
    }

    pub fn checked_div(&self, other: Dec) -> StdResult<Dec> {
        if other.is_zero() {
            return Err(StdError::divide_by_zero("Dec::checked_div"));
        }
        Ok(Dec(self.0.checked_div(other.0)?))
    }

    /// Integer power for a non-negative exponent, as required by the
    /// `Power` curve's `n` and the augmented curve's `κ`. Exponents are
    /// validated to fit `u32` at bond-creation time (see `bond::validate`);
    /// this function assumes that has already happened.
    pub fn checked_pow(&self, exp: u32) -> StdResult<Dec> {
        Ok(Dec(self.0.checked_pow(exp)?))
    }

    /// Truncates toward zero into a non-negative `Uint256`, discarding the
    /// fractional remainder. Rounding up would create a reserve deficit, so
    /// this direction is never reversed.
    pub fn truncate_uint256(&self) -> Uint256 {
        self.0.to_uint_floor()
    }

    /// Truncates and narrows to `Uint128`, the width used for amounts that
    /// cross the host boundary (coin amounts). Fails with
    /// [`ContractError::CurveDomain`] if the truncated value does not fit.
    pub fn truncate_to_coin_amount(&self) -> Result<Uint128, ContractError> {
        let wide = self.truncate_uint256();
        Uint128::try_from(wide)
            .map_err(|_| ContractError::CurveDomain("reserve amount overflows Uint128".into()))
    }

    pub fn from_uint256(v: Uint256) -> Self {
        Dec(Decimal256::from_ratio(v, 1u8))
    }

    pub fn from_uint128(v: Uint128) -> Self {
        Dec(Decimal256::from_ratio(v, 1u8))
    }
}

impl std::ops::Add for Dec {
    type Output = Dec;
    fn add(self, rhs: Dec) -> Dec {
        Dec(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Dec {
    type Output = Dec;
    fn sub(self, rhs: Dec) -> Dec {
        Dec(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Dec {
    type Output = Dec;
    fn mul(self, rhs: Dec) -> Dec {
        Dec(self.0 * rhs.0)
    }
}

impl std::fmt::Display for Dec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Dec {
    type Err = StdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Dec(Decimal256::from_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_toward_zero() {
        let d = Dec::from_ratio(10u128, 3u128);
        assert_eq!(d.truncate_uint256(), Uint256::from(3u128));
    }

    #[test]
    fn pow_matches_repeated_mul() {
        let base = Dec::from_ratio(2u128, 1u128);
        let squared = base.checked_pow(2).unwrap();
        assert_eq!(squared, base.checked_mul(base).unwrap());
    }

    #[test]
    fn div_by_zero_errors() {
        let d = Dec::one();
        assert!(d.checked_div(Dec::zero()).is_err());
    }
}
