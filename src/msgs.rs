//! Inbound messages, as one tagged `Msg` enum with one exhaustive match per
//! dispatch site, following the shape of `astroport::pair::ExecuteMsg`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal256, Uint128};

use crate::bond::{CurveParams, EditBondParams};
use crate::coin::CoinSet;

#[cw_serde]
pub enum Msg {
    CreateBond(CreateBond),
    EditBond(EditBond),
    Buy(Buy),
    Sell(Sell),
    Swap(Swap),
    MakeOutcomePayment(MakeOutcomePayment),
    WithdrawShare(WithdrawShare),
}

#[cw_serde]
pub struct CreateBond {
    pub bond_id: String,
    pub token: String,
    pub name: String,
    pub description: String,
    pub creator: String,
    pub curve: CurveParams,
    pub reserve_tokens: Vec<String>,
    pub tx_fee_pct: Decimal256,
    pub exit_fee_pct: Decimal256,
    pub fee_address: String,
    pub max_supply: Uint128,
    pub order_quantity_limits: CoinSet,
    pub sanity_rate: Decimal256,
    pub sanity_margin_pct: Decimal256,
    pub allow_sells: bool,
    pub batch_blocks: u64,
    pub outcome_payment: CoinSet,
}

#[cw_serde]
pub struct EditBond {
    pub bond_id: String,
    pub editor: String,
    pub edit: EditBondParams,
}

#[cw_serde]
pub struct Buy {
    pub buyer: String,
    pub bond_id: String,
    pub amount: Uint128,
    pub max_prices: CoinSet,
}

#[cw_serde]
pub struct Sell {
    pub seller: String,
    pub bond_id: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct Swap {
    pub swapper: String,
    pub bond_id: String,
    pub from_denom: String,
    pub from_amount: Uint128,
    pub to_denom: String,
}

#[cw_serde]
pub struct MakeOutcomePayment {
    pub sender: String,
    pub bond_id: String,
}

#[cw_serde]
pub struct WithdrawShare {
    pub recipient: String,
    pub bond_id: String,
}

/// Event attribute key constants, mirrored on every `Response` the engine
/// returns: each event carries the triggering message's fields plus any
/// derived ones (clearing price, amounts charged, fees).
pub mod attr {
    pub const BOND_ID: &str = "bond_id";
    pub const ACCOUNT: &str = "account";
    pub const AMOUNT: &str = "amount";
    pub const CLEARING_PRICE: &str = "clearing_price";
    pub const CHARGED: &str = "charged";
    pub const REFUNDED: &str = "refunded";
    pub const FEE: &str = "fee";
    pub const PAYOUT: &str = "payout";
    pub const CANCEL_REASON: &str = "cancel_reason";
    pub const NEW_STATE: &str = "new_state";
    pub const NEW_SUPPLY: &str = "new_supply";
}

pub mod event_type {
    pub const CREATE_BOND: &str = "create_bond";
    pub const EDIT_BOND: &str = "edit_bond";
    pub const BUY: &str = "buy";
    pub const SELL: &str = "sell";
    pub const SWAP: &str = "swap";
    pub const INIT_SWAPPER: &str = "init_swapper";
    pub const CANCEL_BUY: &str = "cancel_buy";
    pub const SETTLE_BATCH: &str = "settle_batch";
    pub const END_HATCH: &str = "end_hatch";
    pub const MAKE_OUTCOME_PAYMENT: &str = "make_outcome_payment";
    pub const WITHDRAW_SHARE: &str = "withdraw_share";
}
