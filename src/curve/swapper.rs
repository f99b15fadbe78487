use cosmwasm_std::Uint128;

use crate::decimal::Dec;
use crate::error::ContractError;

/// The two reserve balances of a swapper bond, in `reserve_tokens` order.
/// Swapper bonds carry no supply curve - the reserves themselves are the
/// state, mirroring a plain constant-product AMM pool.
#[derive(Clone, Copy, Debug)]
pub struct SwapperState {
    pub r_a: Uint128,
    pub r_b: Uint128,
}

/// `y = Rb - (Ra*Rb)/(Ra + x')`, `x' = x*(1-tx_fee_pct)`, grounded directly
/// on `contracts/pair::compute_swap`'s constant-product math, generalized
/// from an offer/ask-pool fee split to the single `tx_fee_pct` a swapper
/// bond charges.
///
/// The whole expression is evaluated in `Decimal256` and truncated only
/// once, at the end - truncating the quotient `(Ra*Rb)/(Ra+x')` first and
/// then subtracting would make `y` one too large whenever that quotient has
/// a fractional part, which in turn makes the constant product `Ra*Rb`
/// *decrease* across the swap. The teacher's own `compute_swap` floors the
/// same way: one `Decimal256` subtraction, truncated at the very end.
///
/// The constant product `Ra*Rb` never decreases: `fee_pct > 0` strictly
/// increases it, `fee_pct == 0` leaves it unchanged.
pub fn swap_output(
    reserves: SwapperState,
    x: Uint128,
    tx_fee_pct: Dec,
) -> Result<Uint128, ContractError> {
    if reserves.r_a.is_zero() || reserves.r_b.is_zero() {
        return Err(ContractError::CurveDomain("pool has zero reserves".into()));
    }
    if x.is_zero() {
        return Err(ContractError::CurveDomain("swap input amount is zero".into()));
    }

    let one_minus_fee = Dec::one().checked_sub(tx_fee_pct)?;
    let x_prime = Dec::from_uint128(x).checked_mul(one_minus_fee)?.truncate_to_coin_amount()?;

    let ra = Dec::from_uint128(reserves.r_a);
    let rb = Dec::from_uint128(reserves.r_b);
    let cp = ra.checked_mul(rb)?;
    let new_ra = ra.checked_add(Dec::from_uint128(x_prime))?;
    if new_ra.is_zero() {
        return Err(ContractError::CurveDomain("swap input divides by zero reserve".into()));
    }
    let quotient = cp.checked_div(new_ra)?;

    let y = rb
        .checked_sub(quotient)
        .map_err(|_| ContractError::CurveDomain("swap output would exceed reserve".into()))?;

    y.truncate_to_coin_amount()
}

/// `R2/R1` must lie within `[sanity_rate*(1-margin), sanity_rate*(1+margin)]`
/// - i.e. the second reserve denom valued in units of the first (a pool
/// `reserve=[a,b]` with deposit ratio `a:b = 1:2` is checked against
/// `sanity_rate=2`, i.e. `b/a`). A zero `sanity_rate` disables the check.
pub fn check_sanity(
    r_a: Uint128,
    r_b: Uint128,
    sanity_rate: Dec,
    sanity_margin_pct: Dec,
) -> Result<(), ContractError> {
    if sanity_rate.is_zero() {
        return Ok(());
    }
    if r_a.is_zero() {
        return Err(ContractError::SanityViolation {});
    }
    let ratio = Dec::from_uint128(r_b).checked_div(Dec::from_uint128(r_a))?;
    let lower = sanity_rate.checked_mul(Dec::one().checked_sub(sanity_margin_pct)?)?;
    let upper = sanity_rate.checked_mul(Dec::one().checked_add(sanity_margin_pct)?)?;
    if ratio < lower || ratio > upper {
        return Err(ContractError::SanityViolation {});
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_matches_scenario_3() {
        // pool (100a, 200b), swap 10 a -> b, no fee
        let reserves = SwapperState {
            r_a: Uint128::new(100),
            r_b: Uint128::new(200),
        };
        let y = swap_output(reserves, Uint128::new(10), Dec::zero()).unwrap();
        assert_eq!(y, Uint128::new(18));
    }

    #[test]
    fn constant_product_never_decreases_with_fees() {
        let reserves = SwapperState {
            r_a: Uint128::new(100),
            r_b: Uint128::new(200),
        };
        let fee = Dec::from_ratio(3u128, 1000u128);
        let y = swap_output(reserves, Uint128::new(10), fee).unwrap();
        let new_ra = reserves.r_a.u128() + 10;
        let new_rb = reserves.r_b.u128() - y.u128();
        assert!(new_ra as u128 * new_rb as u128 >= reserves.r_a.u128() * reserves.r_b.u128());
    }

    #[test]
    fn sanity_check_rejects_out_of_band_ratio() {
        let rate = Dec::from_ratio(2u128, 1u128);
        let margin = Dec::from_ratio(1u128, 10u128);
        assert!(check_sanity(Uint128::new(100), Uint128::new(200), rate, margin).is_ok());
        assert!(check_sanity(Uint128::new(100), Uint128::new(1000), rate, margin).is_err());
    }
}
