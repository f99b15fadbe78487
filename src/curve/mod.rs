//! Pricing functions: pure functions mapping `(reserve, supply, parameters)`
//! to price, reserve-delta for a given supply-delta, and supply-delta for a
//! given reserve-delta. Four curve families are supported; each gets its
//! own module and struct, dispatched through the `Curve` tagged enum below.
//!
//! Swapper is the odd one out: it carries two reserves instead of a single
//! supply curve, so it does not implement [`PricingCurve`] - its math lives
//! entirely in `swapper.rs` and is invoked directly by the batch engine.

mod augmented;
mod power;
mod sigmoid;
mod swapper;

pub use augmented::Augmented;
pub use power::Power;
pub use sigmoid::Sigmoid;
pub use swapper::{check_sanity, swap_output, SwapperState};

use cosmwasm_schema::cw_serde;

use crate::decimal::Dec;
use crate::error::ContractError;

/// Shared capability set exposed by every non-swapper curve family.
///
/// `buy_reserve`/`sell_return` have sane defaults in terms of
/// `reserve_for_supply`
/// (`buy_reserve(S, ΔS) = reserve_for_supply(S+ΔS) - reserve_for_supply(S)`).
/// Individual curves may override them only when the closed form is
/// materially cheaper or more precise than two calls to
/// `reserve_for_supply`.
pub trait PricingCurve {
    /// Marginal price at supply `S`.
    fn spot_price(&self, s: Dec) -> Result<Dec, ContractError>;

    /// Cumulative reserve required to reach supply `S` from zero (the
    /// integral of `spot_price` from 0 to `S`).
    fn reserve_for_supply(&self, s: Dec) -> Result<Dec, ContractError>;

    /// Reserve to pay to mint `delta_s` new tokens from current supply `s`.
    fn buy_reserve(&self, s: Dec, delta_s: Dec) -> Result<Dec, ContractError> {
        let before = self.reserve_for_supply(s)?;
        let after = self.reserve_for_supply(s.checked_add(delta_s)?)?;
        after
            .checked_sub(before)
            .map_err(|_| ContractError::CurveDomain("reserve decreased with supply".into()))
    }

    /// Reserve returned for burning `delta_s` tokens from current supply
    /// `s`.
    fn sell_return(&self, s: Dec, delta_s: Dec) -> Result<Dec, ContractError> {
        if delta_s > s {
            return Err(ContractError::CurveDomain(
                "cannot sell more than current supply".into(),
            ));
        }
        let before = self.reserve_for_supply(s)?;
        let after = self.reserve_for_supply(s.checked_sub(delta_s)?)?;
        before
            .checked_sub(after)
            .map_err(|_| ContractError::CurveDomain("reserve increased with less supply".into()))
    }
}

/// The bonding curve selected for a bond, carrying its own parameters.
/// Swapper carries none here - its reserves live on the bond/batch, not the
/// curve.
#[cw_serde]
pub enum Curve {
    Power(Power),
    Sigmoid(Sigmoid),
    Swapper,
    Augmented(Augmented),
}

impl Curve {
    pub fn type_name(&self) -> &'static str {
        match self {
            Curve::Power(_) => "power",
            Curve::Sigmoid(_) => "sigmoid",
            Curve::Swapper => "swapper",
            Curve::Augmented(_) => "augmented",
        }
    }

    /// Dispatches to the underlying [`PricingCurve`] impl. Returns an error
    /// for `Swapper`, which is never addressed through this capability set
    /// (see module docs).
    pub fn as_pricing(&self) -> Result<&dyn PricingCurve, ContractError> {
        match self {
            Curve::Power(p) => Ok(p),
            Curve::Sigmoid(s) => Ok(s),
            Curve::Augmented(a) => Ok(a),
            Curve::Swapper => Err(ContractError::CurveDomain(
                "swapper bonds are not priced through the supply curve".into(),
            )),
        }
    }
}
