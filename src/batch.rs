//! The batch auction engine. A `Batch` accumulates orders for
//! `blocks_remaining` blocks, re-pricing after every admission, then is
//! settled atomically: unfulfillable buys are refunded, and every remaining
//! order executes at the batch's uniform clearing price.
//!
//! Swapper bonds do not use the clearing-price machinery here - see
//! `curve::swapper` and `engine.rs` for their constant-product settlement
//! path.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

use crate::bond::Bond;
use crate::coin::{CoinSet, PriceSet};
use crate::curve::PricingCurve;
use crate::decimal::Dec;
use crate::error::ContractError;

#[cw_serde]
pub struct BuyOrder {
    pub account: String,
    pub amount: Uint128,
    pub max_prices: CoinSet,
    pub cancelled: bool,
    pub cancel_reason: String,
}

#[cw_serde]
pub struct SellOrder {
    pub account: String,
    pub amount: Uint128,
    pub cancelled: bool,
    pub cancel_reason: String,
}

#[cw_serde]
pub struct SwapOrder {
    pub account: String,
    pub from_denom: String,
    pub from_amount: Uint128,
    pub to_denom: String,
    pub cancelled: bool,
    pub cancel_reason: String,
}

/// A single bond's in-flight batch. One lives per bond while
/// `blocks_remaining > 0`; settlement replaces it with a fresh, empty batch.
#[cw_serde]
pub struct Batch {
    pub bond_id: String,
    pub blocks_remaining: u64,
    pub total_buy_amount: Uint128,
    pub total_sell_amount: Uint128,
    pub buy_prices: PriceSet,
    pub sell_prices: PriceSet,
    pub buys: Vec<BuyOrder>,
    pub sells: Vec<SellOrder>,
    pub swaps: Vec<SwapOrder>,
}

/// A buy/sell order cancelled during [`Batch::cancel_unfulfillable_buys`],
/// paired with the collateral to refund to its owner.
pub struct Refund {
    pub account: String,
    pub coins: CoinSet,
}

impl Batch {
    pub fn new(bond_id: impl Into<String>, batch_blocks: u64) -> Self {
        Batch {
            bond_id: bond_id.into(),
            blocks_remaining: batch_blocks,
            total_buy_amount: Uint128::zero(),
            total_sell_amount: Uint128::zero(),
            buy_prices: PriceSet::new(),
            sell_prices: PriceSet::new(),
            buys: Vec::new(),
            sells: Vec::new(),
            swaps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty() && self.swaps.is_empty()
    }

    pub fn admit_buy(
        &mut self,
        bond: &Bond,
        account: impl Into<String>,
        amount: Uint128,
        max_prices: CoinSet,
    ) -> Result<(), ContractError> {
        self.total_buy_amount = self.total_buy_amount.checked_add(amount)?;
        self.buys.push(BuyOrder {
            account: account.into(),
            amount,
            max_prices,
            cancelled: false,
            cancel_reason: String::new(),
        });
        self.reprice(bond)
    }

    pub fn admit_sell(
        &mut self,
        bond: &Bond,
        account: impl Into<String>,
        amount: Uint128,
    ) -> Result<(), ContractError> {
        self.total_sell_amount = self.total_sell_amount.checked_add(amount)?;
        self.sells.push(SellOrder {
            account: account.into(),
            amount,
            cancelled: false,
            cancel_reason: String::new(),
        });
        self.reprice(bond)
    }

    /// Swaps never alter the buy/sell clearing price and settle
    /// independently, in insertion order, against the reserves as they
    /// stand at settlement time.
    pub fn admit_swap(
        &mut self,
        account: impl Into<String>,
        from_denom: impl Into<String>,
        from_amount: Uint128,
        to_denom: impl Into<String>,
    ) {
        self.swaps.push(SwapOrder {
            account: account.into(),
            from_denom: from_denom.into(),
            from_amount,
            to_denom: to_denom.into(),
            cancelled: false,
            cancel_reason: String::new(),
        });
    }

    /// The single uniform per-unit clearing rate for this batch, or `None`
    /// if there is nothing (yet) to price.
    ///
    /// Buy and sell orders within a batch share one clearing rate `r`
    /// rather than independently-derived buy/sell prices:
    /// `r = buy_reserve(S, Δ)/Δ` for net mint (`Δ = total_buy-total_sell >
    /// 0`), the sell-side mirror for net burn, and `spot_price(S)` when
    /// `Δ == 0` with volume on both sides. This is the only choice under
    /// which `buy_total_cost - sell_total_gross` collapses to exactly
    /// `reserve_for_supply(S+Δ) - reserve_for_supply(S)` by construction,
    /// which is what settlement's reserve-conservation check requires; it
    /// also matches the simpler per-side formula whenever a batch is
    /// one-sided (`total_buy == 0` or `total_sell == 0`).
    fn clearing_rate(&self, bond: &Bond) -> Result<Option<Dec>, ContractError> {
        let buy = Dec::from_uint128(self.total_buy_amount);
        let sell = Dec::from_uint128(self.total_sell_amount);
        if buy.is_zero() && sell.is_zero() {
            return Ok(None);
        }
        let curve = bond.curve.as_pricing()?;
        let supply = bond.current_supply_dec();

        if buy == sell {
            return Ok(Some(curve.spot_price(supply)?));
        }
        if buy > sell {
            let delta = buy.checked_sub(sell)?;
            let reserve = curve.buy_reserve(supply, delta)?;
            Ok(Some(reserve.checked_div(delta)?))
        } else {
            let delta = sell.checked_sub(buy)?;
            let reserve = curve.sell_return(supply, delta)?;
            Ok(Some(reserve.checked_div(delta)?))
        }
    }

    fn reprice(&mut self, bond: &Bond) -> Result<(), ContractError> {
        if bond.is_swapper() {
            return Ok(());
        }
        match self.clearing_rate(bond)? {
            None => {
                self.buy_prices = PriceSet::new();
                self.sell_prices = PriceSet::new();
            }
            Some(rate) => {
                let denom = bond.reserve_tokens[0].clone();
                self.buy_prices = PriceSet::single(denom.clone(), rate);
                self.sell_prices = PriceSet::single(denom, rate);
            }
        }
        Ok(())
    }

    /// Scans active buys for `max_prices` that no longer covers the cost of
    /// the order at the current clearing rate, cancels them, and re-prices
    /// after every round - a cancellation can lower the clearing price
    /// enough to save an order that looked unfulfillable before it, so the
    /// scan repeats until a pass cancels nothing.
    pub fn cancel_unfulfillable_buys(&mut self, bond: &Bond) -> Result<Vec<Refund>, ContractError> {
        let mut refunds = Vec::new();
        loop {
            let mut cancelled_this_round = false;
            for order in self.buys.iter_mut() {
                if order.cancelled {
                    continue;
                }
                let required = self.buy_prices.cost_for(order.amount)?;
                if order.max_prices.any_below(&required) {
                    order.cancelled = true;
                    order.cancel_reason = "max_prices below clearing price".into();
                    cancelled_this_round = true;
                    refunds.push(Refund {
                        account: order.account.clone(),
                        coins: order.max_prices.clone(),
                    });
                }
            }
            if !cancelled_this_round {
                break;
            }
            self.total_buy_amount = self
                .buys
                .iter()
                .filter(|o| !o.cancelled)
                .try_fold(Uint128::zero(), |acc, o| acc.checked_add(o.amount))?;
            self.reprice(bond)?;
        }
        Ok(refunds)
    }

    fn active_buys(&self) -> impl Iterator<Item = &BuyOrder> {
        self.buys.iter().filter(|o| !o.cancelled)
    }
}

/// One buy's settlement outcome: mint `amount`, move `charged` from holding
/// custody to the reserve, route `fee` from the reserve to `fee_address`,
/// and refund `refund` (the unused portion of `max_prices`) to `account`.
pub struct BuySettlement {
    pub account: String,
    pub amount: Uint128,
    pub charged: CoinSet,
    pub fee: CoinSet,
    pub refund: CoinSet,
}

/// One sell's settlement outcome: burn `amount` (already burned eagerly at
/// admission), pay `payout` to `account` from the reserve, and route `fee`
/// to `fee_address`.
pub struct SellSettlement {
    pub account: String,
    pub amount: Uint128,
    pub payout: CoinSet,
    pub fee: CoinSet,
}

pub struct Settlement {
    pub new_supply: Uint128,
    pub buys: Vec<BuySettlement>,
    pub sells: Vec<SellSettlement>,
}

impl Batch {
    /// Computes the full settlement plan for a non-swapper bond. Does not
    /// mutate `bond` - the caller applies `new_supply` after executing the
    /// resulting bank operations.
    pub fn settle(&self, bond: &Bond) -> Result<Settlement, ContractError> {
        let reserve_denom = bond.reserve_tokens[0].clone();
        let active_buy_total: Uint128 = self
            .active_buys()
            .try_fold(Uint128::zero(), |acc, o| acc.checked_add(o.amount))?;
        let active_sell_total: Uint128 = self
            .sells
            .iter()
            .filter(|o| !o.cancelled)
            .try_fold(Uint128::zero(), |acc, o| acc.checked_add(o.amount))?;

        let new_supply = bond
            .current_supply
            .checked_add(active_buy_total)?
            .checked_sub(active_sell_total)?;
        bond.check_max_supply(new_supply)?;

        let buy_rate = self.buy_prices.get(&reserve_denom);
        let sell_rate = self.sell_prices.get(&reserve_denom);

        let mut buys = Vec::new();
        for order in self.active_buys() {
            let cost = Dec::from_uint128(order.amount)
                .checked_mul(buy_rate)?
                .truncate_to_coin_amount()?;
            let fee = Dec::from_uint128(cost)
                .checked_mul(Dec(bond.tx_fee_pct))?
                .truncate_to_coin_amount()?;
            let charged = CoinSet::single(reserve_denom.clone(), cost);
            let fee_coins = CoinSet::single(reserve_denom.clone(), fee);
            let refund = order.max_prices.checked_sub(&charged).map_err(|_| {
                ContractError::Invariant(
                    "buy settled at a cost exceeding its max_prices after cancellation scan".into(),
                )
            })?;
            buys.push(BuySettlement {
                account: order.account.clone(),
                amount: order.amount,
                charged,
                fee: fee_coins,
                refund,
            });
        }

        let mut sells = Vec::new();
        for order in self.sells.iter().filter(|o| !o.cancelled) {
            let gross = Dec::from_uint128(order.amount)
                .checked_mul(sell_rate)?
                .truncate_to_coin_amount()?;
            let fee = Dec::from_uint128(gross)
                .checked_mul(Dec(bond.exit_fee_pct))?
                .truncate_to_coin_amount()?;
            let payout = gross.checked_sub(fee)?;
            sells.push(SellSettlement {
                account: order.account.clone(),
                amount: order.amount,
                payout: CoinSet::single(reserve_denom.clone(), payout),
                fee: CoinSet::single(reserve_denom.clone(), fee),
            });
        }

        Ok(Settlement { new_supply, buys, sells })
    }
}
