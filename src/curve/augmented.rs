use cosmwasm_schema::cw_serde;
use cosmwasm_std::Decimal256;

use super::PricingCurve;
use crate::decimal::Dec;
use crate::error::ContractError;

/// Power curve with a linear "hatch" phase below `S0`. `R0`, `S0`, `V0`
/// are derived once at bond creation (`Augmented::new`) and stored for
/// quick access, the same way `handleMsgCreateBond` in `x/bonds/handler.go`
/// appends them to `FunctionParameters` before persisting.
#[cw_serde]
pub struct Augmented {
    pub d0: Decimal256,
    pub p0: Decimal256,
    pub theta: Decimal256,
    pub kappa: Decimal256,
    /// `kappa` truncated to a non-negative integer exponent, the same way
    /// `kappa.TruncateInt64()` is applied before calling `Invariant` in
    /// `x/bonds/handler.go`.
    pub kappa_int: u32,
    pub r0: Decimal256,
    pub s0: Decimal256,
    pub v0: Decimal256,
}

/// `Invariant(R, S, κ) = R / S^κ`, named directly after the
/// `types.Invariant` helper in `x/bonds/handler.go`.
pub fn invariant(r: Dec, s: Dec, kappa_int: u32) -> Result<Dec, ContractError> {
    r.checked_div(s.checked_pow(kappa_int)?).map_err(Into::into)
}

impl Augmented {
    pub fn new(
        d0: Decimal256,
        p0: Decimal256,
        theta: Decimal256,
        kappa: Decimal256,
    ) -> Result<Self, ContractError> {
        if d0.is_zero() || p0.is_zero() {
            return Err(ContractError::InvalidFunctionParameter {
                name: "d0/p0".into(),
                constraint: "be strictly positive".into(),
            });
        }
        if theta >= Decimal256::one() {
            return Err(ContractError::InvalidFunctionParameter {
                name: "theta".into(),
                constraint: "lie in [0, 1)".into(),
            });
        }
        let kappa_int: u32 = Dec(kappa).truncate_uint256().try_into().map_err(|_| {
            ContractError::InvalidFunctionParameter {
                name: "kappa".into(),
                constraint: "truncate to a value that fits u32".into(),
            }
        })?;
        if kappa_int == 0 {
            return Err(ContractError::InvalidFunctionParameter {
                name: "kappa".into(),
                constraint: "truncate to at least 1".into(),
            });
        }

        let r0 = Dec(d0).checked_mul(Dec::one().checked_sub(Dec(theta))?)?;
        let s0 = Dec(d0).checked_div(Dec(p0))?;
        let v0 = invariant(r0, s0, kappa_int)?;

        Ok(Augmented {
            d0,
            p0,
            theta,
            kappa,
            kappa_int,
            r0: r0.0,
            s0: s0.0,
            v0: v0.0,
        })
    }

    pub fn s0(&self) -> Dec {
        Dec(self.s0)
    }

    pub fn in_hatch(&self, current_supply: Dec) -> bool {
        current_supply < self.s0()
    }
}

impl PricingCurve for Augmented {
    fn spot_price(&self, s: Dec) -> Result<Dec, ContractError> {
        if s <= self.s0() {
            return Ok(Dec(self.p0));
        }
        let exp = self.kappa_int.checked_sub(1).unwrap_or(0);
        let power_term = s.checked_pow(exp)?;
        Dec(self.v0)
            .checked_mul(Dec(self.kappa))?
            .checked_mul(power_term)
            .map_err(Into::into)
    }

    /// `R(S) = p0*S` below `S0` (linear hatch phase), `R(S) = V0*S^κ` at or
    /// above `S0` (the power curve). Continuous at `S0` by construction:
    /// `V0 = R0/S0^κ` so `V0*S0^κ = R0 = p0*S0` (since `R0 = d0(1-θ)`,
    /// `S0 = d0/p0` ⇒ `p0*S0 = d0(1-θ) = R0`).
    fn reserve_for_supply(&self, s: Dec) -> Result<Dec, ContractError> {
        if s <= self.s0() {
            return Ok(Dec(self.p0).checked_mul(s)?);
        }
        Dec(self.v0)
            .checked_mul(s.checked_pow(self.kappa_int)?)
            .map_err(Into::into)
    }
}
