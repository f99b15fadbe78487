//! Top-level message dispatch and the per-block callback. Each handler here
//! plays the role of one `execute_*` function in
//! `contracts/pair/src/contract.rs`: validate, mutate storage, and return
//! an [`EngineResponse`] describing the bank operations and events for the
//! host to carry out - the engine itself never performs a transfer.
//!
//! Swapper bonds do not use the batch auction machinery at all: a swap's
//! output is a deterministic function of the current pool alone, so there
//! is no clearing-price uncertainty for a batch window to resolve.
//! Buy/Sell/Swap on a swapper bond therefore settle immediately here rather
//! than being queued; `BATCHES`/`LAST_BATCHES` are still allocated
//! uniformly for every bond but stay empty for swapper bonds.

use cosmwasm_std::{Order, Storage, Uint128};

use crate::batch::Batch;
use crate::bond::{Bond, BondState, NewBondParams};
use crate::coin::CoinSet;
use crate::curve::{swap_output, SwapperState};
use crate::decimal::Dec;
use crate::error::ContractError;
use crate::host::{BankKeeper, BankOp, Blacklist, IdentityResolver, BATCHES_INTERMEDIARY, BONDS_MINT_BURN};
use crate::lifecycle;
use crate::msgs::{self, attr, event_type};
use crate::state::{BATCHES, BOND_DIDS, BONDS, LAST_BATCHES, RESERVED_TOKENS};

/// What a handler hands back to the host: the bank operations to execute
/// atomically, plus the event to emit. Plays the role of
/// `cosmwasm_std::Response`, generalized to carry [`BankOp`] instead of
/// `CosmosMsg` (see `host.rs` module docs for why).
#[derive(Default)]
pub struct EngineResponse {
    pub bank_ops: Vec<BankOp>,
    pub event_type: String,
    pub attributes: Vec<(String, String)>,
}

impl EngineResponse {
    fn new(event_type: &str) -> Self {
        EngineResponse {
            bank_ops: Vec::new(),
            event_type: event_type.to_string(),
            attributes: Vec::new(),
        }
    }

    fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    fn op(mut self, op: BankOp) -> Self {
        self.bank_ops.push(op);
        self
    }

    fn ops(mut self, ops: impl IntoIterator<Item = BankOp>) -> Self {
        self.bank_ops.extend(ops);
        self
    }
}

/// Single entry point dispatching a [`msgs::Msg`] to its matching handler -
/// the exhaustive match Design Note 9 calls for, playing the role of
/// `contracts/pair/src/contract.rs::execute`'s top-level `match msg`.
///
/// `WithdrawShare` carries no amount (§6: `WithdrawShare{recipient,
/// bond_id}`) - a holder withdraws their whole bond-token balance, so this
/// is the one variant whose handler needs an extra query (`host.balance`)
/// before it can call `withdraw_share`.
pub fn execute(
    storage: &mut dyn Storage,
    host: &(impl IdentityResolver + BankKeeper + Blacklist),
    msg: msgs::Msg,
) -> Result<EngineResponse, ContractError> {
    match msg {
        msgs::Msg::CreateBond(m) => create_bond(storage, host, m),
        msgs::Msg::EditBond(m) => edit_bond(storage, m),
        msgs::Msg::Buy(m) => buy(storage, host, m),
        msgs::Msg::Sell(m) => sell(storage, host, m),
        msgs::Msg::Swap(m) => swap(storage, host, m),
        msgs::Msg::MakeOutcomePayment(m) => make_outcome_payment(storage, host, m),
        msgs::Msg::WithdrawShare(m) => {
            let bond = load_bond(storage, &m.bond_id)?;
            let recipient = host.resolve(&m.recipient)?;
            let burn_amount = host.balance(&recipient, &bond.token)?;
            withdraw_share(storage, host, host, m, burn_amount)
        }
    }
}

fn load_bond(storage: &dyn Storage, bond_id: &str) -> Result<Bond, ContractError> {
    BONDS
        .may_load(storage, bond_id)?
        .ok_or_else(|| ContractError::BondDoesNotExist(bond_id.to_string()))
}

fn check_order_quantity_limit(bond: &Bond, denom: &str, amount: Uint128) -> Result<(), ContractError> {
    let limit = bond.order_quantity_limits.get(denom);
    if !limit.is_zero() && amount > limit {
        return Err(ContractError::OrderQuantityLimitExceeded {
            denom: denom.to_string(),
            limit: limit.to_string(),
        });
    }
    Ok(())
}

pub fn create_bond(
    storage: &mut dyn Storage,
    blacklist: &impl Blacklist,
    msg: msgs::CreateBond,
) -> Result<EngineResponse, ContractError> {
    if BONDS.has(storage, &msg.bond_id) {
        return Err(ContractError::BondAlreadyExists(msg.bond_id));
    }
    if BOND_DIDS.has(storage, &msg.token) {
        return Err(ContractError::TokenTaken(msg.token));
    }
    let reserved = RESERVED_TOKENS.may_load(storage)?.unwrap_or_default();
    if reserved.contains(&msg.token) {
        return Err(ContractError::ReservedToken(msg.token));
    }
    if blacklist.is_blacklisted(&msg.fee_address)? {
        return Err(ContractError::FeeAddressBlacklisted {});
    }

    let bond = Bond::new(NewBondParams {
        id: msg.bond_id.clone(),
        token: msg.token.clone(),
        name: msg.name,
        description: msg.description,
        creator: msg.creator,
        curve: msg.curve,
        reserve_tokens: msg.reserve_tokens,
        tx_fee_pct: msg.tx_fee_pct,
        exit_fee_pct: msg.exit_fee_pct,
        fee_address: msg.fee_address,
        max_supply: msg.max_supply,
        order_quantity_limits: msg.order_quantity_limits,
        sanity_rate: msg.sanity_rate,
        sanity_margin_pct: msg.sanity_margin_pct,
        allow_sells: msg.allow_sells,
        batch_blocks: msg.batch_blocks,
        outcome_payment: msg.outcome_payment,
    })?;

    BONDS.save(storage, &msg.bond_id, &bond)?;
    BOND_DIDS.save(storage, &msg.token, &msg.bond_id)?;
    BATCHES.save(storage, &msg.bond_id, &Batch::new(&msg.bond_id, bond.batch_blocks))?;

    Ok(EngineResponse::new(event_type::CREATE_BOND)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::NEW_STATE, format!("{:?}", bond.state)))
}

pub fn edit_bond(storage: &mut dyn Storage, msg: msgs::EditBond) -> Result<EngineResponse, ContractError> {
    let mut bond = load_bond(storage, &msg.bond_id)?;
    if bond.creator != msg.editor {
        return Err(ContractError::NotCreator {
            who: msg.editor,
            bond_id: msg.bond_id,
        });
    }
    bond.apply_edit(msg.edit);
    BONDS.save(storage, &msg.bond_id, &bond)?;
    Ok(EngineResponse::new(event_type::EDIT_BOND).attr(attr::BOND_ID, &msg.bond_id))
}

pub fn buy(
    storage: &mut dyn Storage,
    identity: &impl IdentityResolver,
    msg: msgs::Buy,
) -> Result<EngineResponse, ContractError> {
    let mut bond = load_bond(storage, &msg.bond_id)?;
    if bond.state == BondState::Settle {
        return Err(ContractError::WrongState {
            bond_id: msg.bond_id.clone(),
            state: format!("{:?}", bond.state),
            action: "Buy".into(),
        });
    }
    check_order_quantity_limit(&bond, &bond.token.clone(), msg.amount)?;
    let buyer = identity.resolve(&msg.buyer)?;

    if bond.is_swapper() {
        return swapper_buy(storage, &mut bond, buyer, msg.amount, msg.max_prices);
    }

    let mut batch = BATCHES.load(storage, &msg.bond_id)?;

    let prospective = bond
        .current_supply
        .checked_add(batch.total_buy_amount)?
        .checked_add(msg.amount)?
        .checked_sub(batch.total_sell_amount)?;
    bond.check_max_supply(prospective)?;

    let hold = BankOp::send_to_module(buyer.clone(), BATCHES_INTERMEDIARY, msg.max_prices.clone());
    batch.admit_buy(&bond, buyer.clone(), msg.amount, msg.max_prices)?;
    let refunds = batch.cancel_unfulfillable_buys(&bond)?;

    BATCHES.save(storage, &msg.bond_id, &batch)?;

    let mut response = EngineResponse::new(event_type::BUY)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::ACCOUNT, &buyer)
        .attr(attr::AMOUNT, msg.amount)
        .op(hold);
    for refund in refunds {
        response = response.op(BankOp::send_from_module(BATCHES_INTERMEDIARY, refund.account, refund.coins));
    }
    Ok(response)
}

pub fn sell(
    storage: &mut dyn Storage,
    identity: &impl IdentityResolver,
    msg: msgs::Sell,
) -> Result<EngineResponse, ContractError> {
    let bond = load_bond(storage, &msg.bond_id)?;
    if bond.state == BondState::Settle {
        return Err(ContractError::WrongState {
            bond_id: msg.bond_id.clone(),
            state: format!("{:?}", bond.state),
            action: "Sell".into(),
        });
    }
    if !bond.allow_sells {
        return Err(ContractError::SellsNotAllowed(msg.bond_id));
    }
    check_order_quantity_limit(&bond, &bond.token.clone(), msg.amount)?;
    let seller = identity.resolve(&msg.seller)?;

    if bond.is_swapper() {
        let mut bond = bond;
        return swapper_sell(storage, &mut bond, seller, msg.amount);
    }

    let mut batch = BATCHES.load(storage, &msg.bond_id)?;
    let token_coins = CoinSet::single(bond.token.clone(), msg.amount);
    // Eager burn on sell admission: the seller cannot double-spend the
    // tokens during the batch window because they are gone immediately,
    // before the batch even prices the sell.
    let eager_burn = vec![
        BankOp::send_to_module(seller.clone(), BONDS_MINT_BURN, token_coins.clone()),
        BankOp::burn(BONDS_MINT_BURN, token_coins),
    ];
    batch.admit_sell(&bond, seller.clone(), msg.amount)?;
    BATCHES.save(storage, &msg.bond_id, &batch)?;

    Ok(EngineResponse::new(event_type::SELL)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::ACCOUNT, &seller)
        .attr(attr::AMOUNT, msg.amount)
        .ops(eager_burn))
}

pub fn swap(
    storage: &mut dyn Storage,
    identity: &impl IdentityResolver,
    msg: msgs::Swap,
) -> Result<EngineResponse, ContractError> {
    let mut bond = load_bond(storage, &msg.bond_id)?;
    if !bond.is_swapper() {
        return Err(ContractError::CurveDomain("Swap is only valid against swapper bonds".into()));
    }
    if bond.state == BondState::Settle {
        return Err(ContractError::WrongState {
            bond_id: msg.bond_id.clone(),
            state: format!("{:?}", bond.state),
            action: "Swap".into(),
        });
    }
    check_order_quantity_limit(&bond, &msg.from_denom, msg.from_amount)?;
    let swapper = identity.resolve(&msg.swapper)?;

    let (from_idx, _to_idx) = reserve_indices(&bond, &msg.from_denom, &msg.to_denom)?;
    let (r_from, r_to) = match from_idx {
        0 => (bond.swapper_reserves.0, bond.swapper_reserves.1),
        _ => (bond.swapper_reserves.1, bond.swapper_reserves.0),
    };

    let one_minus_fee = Dec::one().checked_sub(Dec(bond.tx_fee_pct))?;
    let x_prime = Dec::from_uint128(msg.from_amount)
        .checked_mul(one_minus_fee)?
        .truncate_to_coin_amount()?;
    let fee = msg.from_amount.checked_sub(x_prime)?;

    let output = swap_output(
        SwapperState { r_a: r_from, r_b: r_to },
        x_prime,
        Dec::zero(),
    )?;

    let new_r_from = r_from.checked_add(x_prime)?;
    let new_r_to = r_to.checked_sub(output)?;
    match from_idx {
        0 => bond.swapper_reserves = (new_r_from, new_r_to),
        _ => bond.swapper_reserves = (new_r_to, new_r_from),
    }
    crate::curve::check_sanity(
        bond.swapper_reserves.0,
        bond.swapper_reserves.1,
        Dec(bond.sanity_rate),
        Dec(bond.sanity_margin_pct),
    )?;

    BONDS.save(storage, &msg.bond_id, &bond)?;

    let reserve_addr = bond.reserve_address();
    let mut ops = vec![BankOp::send_to_module(
        swapper.clone(),
        reserve_addr.clone(),
        CoinSet::single(msg.from_denom.clone(), x_prime),
    )];
    if !fee.is_zero() {
        ops.push(BankOp::Send {
            from: swapper.clone(),
            to: bond.fee_address.clone(),
            coins: CoinSet::single(msg.from_denom, fee),
        });
    }
    ops.push(BankOp::send_from_module(
        reserve_addr,
        swapper.clone(),
        CoinSet::single(msg.to_denom.clone(), output),
    ));

    Ok(EngineResponse::new(event_type::SWAP)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::ACCOUNT, &swapper)
        .attr(attr::AMOUNT, output)
        .ops(ops))
}

fn reserve_indices(bond: &Bond, from: &str, to: &str) -> Result<(usize, usize), ContractError> {
    let idx = |d: &str| {
        bond.reserve_tokens
            .iter()
            .position(|t| t == d)
            .ok_or_else(|| ContractError::CurveDomain(format!("unknown reserve denom {d}")))
    };
    Ok((idx(from)?, idx(to)?))
}

/// First buy on a swapper bond initializes the pool: the buyer supplies
/// `max_prices` directly as the two initial reserves and receives exactly
/// `amount` LP-share tokens - a deliberately free-standing scale, not
/// derived from the deposit in any way. Subsequent buys mint LP
/// proportionally to the smaller of the two deposit/pool ratios, the same
/// rule `contracts/pair::provide_liquidity` uses for a two-asset pool.
fn swapper_buy(
    storage: &mut dyn Storage,
    bond: &mut Bond,
    buyer: String,
    amount: Uint128,
    max_prices: CoinSet,
) -> Result<EngineResponse, ContractError> {
    let reserve_addr = bond.reserve_address();
    let deposit_a = max_prices.get(&bond.reserve_tokens[0]);
    let deposit_b = max_prices.get(&bond.reserve_tokens[1]);

    let is_first = bond.current_supply.is_zero();
    let mint_amount = if is_first {
        crate::curve::check_sanity(deposit_a, deposit_b, Dec(bond.sanity_rate), Dec(bond.sanity_margin_pct))?;
        bond.swapper_reserves = (deposit_a, deposit_b);
        amount
    } else {
        let (pool_a, pool_b) = bond.swapper_reserves;
        let share_a = Dec::from_uint128(deposit_a)
            .checked_mul(bond.current_supply_dec())?
            .checked_div(Dec::from_uint128(pool_a))?;
        let share_b = Dec::from_uint128(deposit_b)
            .checked_mul(bond.current_supply_dec())?
            .checked_div(Dec::from_uint128(pool_b))?;
        let share = if share_a < share_b { share_a } else { share_b };
        bond.swapper_reserves = (pool_a.checked_add(deposit_a)?, pool_b.checked_add(deposit_b)?);
        share.truncate_to_coin_amount()?
    };

    bond.current_supply = bond.current_supply.checked_add(mint_amount)?;
    bond.check_max_supply(bond.current_supply)?;
    BONDS.save(storage, &bond.id.clone(), bond)?;

    let token_coins = CoinSet::single(bond.token.clone(), mint_amount);
    let response = EngineResponse::new(if is_first {
        event_type::INIT_SWAPPER
    } else {
        event_type::BUY
    })
    .attr(attr::BOND_ID, &bond.id)
    .attr(attr::ACCOUNT, &buyer)
    .attr(attr::AMOUNT, mint_amount)
    .op(BankOp::send_to_module(buyer.clone(), reserve_addr, max_prices))
    .op(BankOp::mint(BONDS_MINT_BURN, token_coins.clone()))
    .op(BankOp::send_from_module(BONDS_MINT_BURN, buyer, token_coins));
    Ok(response)
}

/// Burns `amount` LP-share tokens for a pro-rata share of both reserves,
/// net of `exit_fee_pct` - the swapper mirror of
/// `contracts/pair::withdraw_liquidity`'s `get_share_in_assets`.
fn swapper_sell(
    storage: &mut dyn Storage,
    bond: &mut Bond,
    seller: String,
    amount: Uint128,
) -> Result<EngineResponse, ContractError> {
    if amount > bond.current_supply {
        return Err(ContractError::InsufficientBalance(bond.token.clone()));
    }
    let share = Dec::from_uint128(amount).checked_div(bond.current_supply_dec())?;
    let (pool_a, pool_b) = bond.swapper_reserves;
    let gross_a = Dec::from_uint128(pool_a).checked_mul(share)?.truncate_to_coin_amount()?;
    let gross_b = Dec::from_uint128(pool_b).checked_mul(share)?.truncate_to_coin_amount()?;
    let fee_a = Dec::from_uint128(gross_a)
        .checked_mul(Dec(bond.exit_fee_pct))?
        .truncate_to_coin_amount()?;
    let fee_b = Dec::from_uint128(gross_b)
        .checked_mul(Dec(bond.exit_fee_pct))?
        .truncate_to_coin_amount()?;
    let payout_a = gross_a.checked_sub(fee_a)?;
    let payout_b = gross_b.checked_sub(fee_b)?;

    bond.current_supply = bond.current_supply.checked_sub(amount)?;
    bond.swapper_reserves = (pool_a.checked_sub(gross_a)?, pool_b.checked_sub(gross_b)?);
    BONDS.save(storage, &bond.id.clone(), bond)?;

    let reserve_addr = bond.reserve_address();
    let token_coins = CoinSet::single(bond.token.clone(), amount);
    let mut payout = CoinSet::single(bond.reserve_tokens[0].clone(), payout_a);
    payout = payout.checked_add(&CoinSet::single(bond.reserve_tokens[1].clone(), payout_b))?;

    Ok(EngineResponse::new(event_type::SELL)
        .attr(attr::BOND_ID, &bond.id)
        .attr(attr::ACCOUNT, &seller)
        .attr(attr::AMOUNT, amount)
        .op(BankOp::send_to_module(seller.clone(), BONDS_MINT_BURN, token_coins.clone()))
        .op(BankOp::burn(BONDS_MINT_BURN, token_coins))
        .op(BankOp::send_from_module(reserve_addr, seller, payout)))
}

pub fn make_outcome_payment(
    storage: &mut dyn Storage,
    identity: &impl IdentityResolver,
    msg: msgs::MakeOutcomePayment,
) -> Result<EngineResponse, ContractError> {
    let mut bond = load_bond(storage, &msg.bond_id)?;
    let payer = identity.resolve(&msg.sender)?;
    let op = lifecycle::make_outcome_payment(&mut bond, payer.clone())?;
    BONDS.save(storage, &msg.bond_id, &bond)?;
    Ok(EngineResponse::new(event_type::MAKE_OUTCOME_PAYMENT)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::ACCOUNT, &payer)
        .attr(attr::NEW_STATE, format!("{:?}", bond.state))
        .op(op))
}

pub fn withdraw_share(
    storage: &mut dyn Storage,
    identity: &impl IdentityResolver,
    bank: &impl BankKeeper,
    msg: msgs::WithdrawShare,
    burn_amount: Uint128,
) -> Result<EngineResponse, ContractError> {
    let mut bond = load_bond(storage, &msg.bond_id)?;
    let recipient = identity.resolve(&msg.recipient)?;

    let mut reserve_balance = CoinSet::new();
    for denom in &bond.reserve_tokens {
        let amount = bank.balance(&bond.reserve_address(), denom)?;
        reserve_balance = reserve_balance.checked_add(&CoinSet::single(denom.clone(), amount))?;
    }

    let ops = lifecycle::withdraw_share(&mut bond, recipient.clone(), burn_amount, &reserve_balance)?;
    BONDS.save(storage, &msg.bond_id, &bond)?;

    Ok(EngineResponse::new(event_type::WITHDRAW_SHARE)
        .attr(attr::BOND_ID, &msg.bond_id)
        .attr(attr::ACCOUNT, &recipient)
        .attr(attr::AMOUNT, burn_amount)
        .attr(attr::NEW_SUPPLY, bond.current_supply)
        .ops(ops))
}

/// The per-block callback. Iterates every bond in lexicographic `bond_id`
/// order for deterministic replay, decrements its batch's
/// `blocks_remaining`, settles and emits a response for any batch that
/// reaches zero, and runs the `Hatch -> Open` check.
pub fn end_block(storage: &mut dyn Storage) -> Result<Vec<EngineResponse>, ContractError> {
    let bond_ids: Vec<String> = BONDS
        .keys(storage, None, None, Order::Ascending)
        .collect::<Result<_, _>>()?;

    let mut responses = Vec::new();
    for bond_id in bond_ids {
        let mut bond = load_bond(storage, &bond_id)?;
        if bond.is_swapper() {
            continue;
        }
        let mut batch = BATCHES.load(storage, &bond_id)?;
        if batch.blocks_remaining > 0 {
            batch.blocks_remaining -= 1;
            BATCHES.save(storage, &bond_id, &batch)?;
            continue;
        }

        if !batch.is_empty() {
            let settlement = batch.settle(&bond)?;
            let mut response = EngineResponse::new(event_type::SETTLE_BATCH)
                .attr(attr::BOND_ID, &bond_id)
                .attr(attr::NEW_SUPPLY, settlement.new_supply);
            for b in &settlement.buys {
                response = response
                    .op(BankOp::send_from_module(BATCHES_INTERMEDIARY, bond.reserve_address(), b.charged.clone()))
                    .op(BankOp::send_from_module(bond.reserve_address(), bond.fee_address.clone(), b.fee.clone()))
                    .op(BankOp::send_from_module(BATCHES_INTERMEDIARY, b.account.clone(), b.refund.clone()))
                    .op(BankOp::mint(BONDS_MINT_BURN, CoinSet::single(bond.token.clone(), b.amount)))
                    .op(BankOp::send_from_module(
                        BONDS_MINT_BURN,
                        b.account.clone(),
                        CoinSet::single(bond.token.clone(), b.amount),
                    ));
            }
            for s in &settlement.sells {
                response = response
                    .op(BankOp::send_from_module(bond.reserve_address(), s.account.clone(), s.payout.clone()))
                    .op(BankOp::send_from_module(bond.reserve_address(), bond.fee_address.clone(), s.fee.clone()));
            }
            bond.current_supply = settlement.new_supply;
            responses.push(response);

            LAST_BATCHES.save(storage, &bond_id, &batch)?;
            BATCHES.save(storage, &bond_id, &Batch::new(&bond_id, bond.batch_blocks))?;
        } else {
            BATCHES.save(storage, &bond_id, &Batch::new(&bond_id, bond.batch_blocks))?;
        }

        let was_hatch = bond.state == BondState::Hatch;
        bond.maybe_end_hatch();
        if was_hatch && bond.state == BondState::Open {
            responses.push(
                EngineResponse::new(event_type::END_HATCH)
                    .attr(attr::BOND_ID, &bond_id)
                    .attr(attr::NEW_STATE, format!("{:?}", bond.state)),
            );
        }
        BONDS.save(storage, &bond_id, &bond)?;
    }
    Ok(responses)
}
