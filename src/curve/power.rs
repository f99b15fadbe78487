use cosmwasm_schema::cw_serde;
use cosmwasm_std::Decimal256;

use super::PricingCurve;
use crate::decimal::Dec;
use crate::error::ContractError;

/// `spot_price(S) = m*S^n + c`, `n` a non-negative integer.
#[cw_serde]
pub struct Power {
    pub m: Decimal256,
    pub n: u32,
    pub c: Decimal256,
}

impl PricingCurve for Power {
    fn spot_price(&self, s: Dec) -> Result<Dec, ContractError> {
        let term = Dec(self.m).checked_mul(s.checked_pow(self.n)?)?;
        Ok(term.checked_add(Dec(self.c))?)
    }

    /// `reserve_for_supply(S) = m*S^(n+1)/(n+1) + c*S`, the closed-form
    /// antiderivative of `spot_price` from 0 to `S`.
    fn reserve_for_supply(&self, s: Dec) -> Result<Dec, ContractError> {
        let n_plus_1 = self
            .n
            .checked_add(1)
            .ok_or_else(|| ContractError::CurveDomain("n overflows u32".into()))?;
        let power_term = Dec(self.m)
            .checked_mul(s.checked_pow(n_plus_1)?)?
            .checked_div(Dec::from_uint128(cosmwasm_std::Uint128::from(n_plus_1)))?;
        let linear_term = Dec(self.c).checked_mul(s)?;
        Ok(power_term.checked_add(linear_term)?)
    }
}
