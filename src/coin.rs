use std::collections::BTreeMap;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal256, StdResult, Uint128};

use crate::decimal::Dec;
use crate::error::ContractError;

/// `denom -> amount` with deterministic, lexicographic iteration. Backed by
/// a `BTreeMap` rather than a `HashMap` plus a sort step: deterministic
/// iteration is then a structural property of the type, not a convention
/// callers have to remember to uphold.
#[cw_serde]
#[derive(Default)]
pub struct CoinSet(BTreeMap<String, Uint128>);

impl CoinSet {
    pub fn new() -> Self {
        CoinSet(BTreeMap::new())
    }

    pub fn single(denom: impl Into<String>, amount: Uint128) -> Self {
        let mut set = CoinSet::new();
        if !amount.is_zero() {
            set.0.insert(denom.into(), amount);
        }
        set
    }

    pub fn get(&self, denom: &str) -> Uint128 {
        self.0.get(denom).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|a| a.is_zero())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Uint128)> {
        self.0.iter()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Adds `other` to `self`, denom-wise.
    pub fn checked_add(&self, other: &CoinSet) -> StdResult<CoinSet> {
        let mut out = self.0.clone();
        for (denom, amount) in other.iter() {
            let entry = out.entry(denom.clone()).or_insert_with(Uint128::zero);
            *entry = entry.checked_add(*amount)?;
        }
        Ok(CoinSet(out))
    }

    /// Subtracts `other` from `self`, denom-wise. Fails if any resulting
    /// amount would go negative - `CoinSet` amounts are non-negative by
    /// construction.
    pub fn checked_sub(&self, other: &CoinSet) -> StdResult<CoinSet> {
        let mut out = self.0.clone();
        for (denom, amount) in other.iter() {
            let entry = out.entry(denom.clone()).or_insert_with(Uint128::zero);
            *entry = entry.checked_sub(*amount)?;
        }
        out.retain(|_, v| !v.is_zero());
        Ok(CoinSet(out))
    }

    /// Scales every amount by `d` and truncates the fractional remainder.
    /// The dust is discarded, never rounded up - rounding up here would
    /// mint a reserve deficit.
    pub fn mul_dec(&self, d: Dec) -> Result<CoinSet, ContractError> {
        let mut out = BTreeMap::new();
        for (denom, amount) in self.iter() {
            let scaled = (Dec::from_uint128(*amount) * d).truncate_to_coin_amount()?;
            if !scaled.is_zero() {
                out.insert(denom.clone(), scaled);
            }
        }
        Ok(CoinSet(out))
    }

    /// True if every denom in `self` has an amount >= the matching denom in
    /// `other` (missing denoms in `other` count as zero).
    pub fn ge_all(&self, other: &CoinSet) -> bool {
        other.iter().all(|(denom, amount)| self.get(denom) >= *amount)
    }

    /// True if `self` is denom-wise strictly less than `other` in at least
    /// one denom present in `other` - used for the buy-side
    /// unfulfillable-price scan (`max_prices` below the clearing price).
    pub fn any_below(&self, other: &CoinSet) -> bool {
        other.iter().any(|(denom, amount)| self.get(denom) < *amount)
    }
}

/// `denom -> per-unit clearing price`. Kept distinct from [`CoinSet`]
/// because a clearing price is a rational rate, not an integer coin amount -
/// collapsing the two into one map type would either lose precision
/// (truncating the rate) or blur what a `Batch`'s `buy_prices`/`sell_prices`
/// fields actually hold.
#[cw_serde]
#[derive(Default)]
pub struct PriceSet(BTreeMap<String, Decimal256>);

impl PriceSet {
    pub fn new() -> Self {
        PriceSet(BTreeMap::new())
    }

    pub fn single(denom: impl Into<String>, rate: Dec) -> Self {
        let mut set = PriceSet(BTreeMap::new());
        set.0.insert(denom.into(), rate.0);
        set
    }

    pub fn get(&self, denom: &str) -> Dec {
        self.0.get(denom).copied().map(Dec).unwrap_or_else(Dec::zero)
    }

    /// The total cost of `amount` units of bond token at this price set's
    /// rates, denom-wise, truncated toward zero.
    pub fn cost_for(&self, amount: Uint128) -> Result<CoinSet, ContractError> {
        let mut out = CoinSet::new();
        for (denom, rate) in self.0.iter() {
            let cost = Dec::from_uint128(amount).checked_mul(Dec(*rate))?.truncate_to_coin_amount()?;
            out = out.checked_add(&CoinSet::single(denom.clone(), cost))?;
        }
        Ok(out)
    }
}
