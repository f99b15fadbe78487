//! The outcome-payment / withdraw-share tail of a bond's lifecycle. The
//! `Hatch -> Open` transition lives on `Bond` itself (`Bond::maybe_end_hatch`,
//! driven from `end_block`); this module covers `Open -> Settle` and the
//! pro-rata redemption that follows.

use cosmwasm_std::Uint128;

use crate::bond::{Bond, BondState};
use crate::coin::CoinSet;
use crate::decimal::Dec;
use crate::error::ContractError;
use crate::host::BankOp;

/// `Open -> Settle`: the designated payer deposits `bond.outcome_payment`
/// into the reserve and the bond stops accepting buys/sells/swaps.
pub fn make_outcome_payment(bond: &mut Bond, payer: impl Into<String>) -> Result<BankOp, ContractError> {
    if bond.state != BondState::Open {
        return Err(ContractError::WrongState {
            bond_id: bond.id.clone(),
            state: format!("{:?}", bond.state),
            action: "MakeOutcomePayment".into(),
        });
    }
    if bond.outcome_payment.is_empty() {
        return Err(ContractError::EmptyOutcomePayment(bond.id.clone()));
    }
    // SendToModule's `module` slot holds the bond's synthetic reserve
    // address here - any resolved custody destination works, not only the
    // two named module accounts in `host.rs`.
    let op = BankOp::SendToModule {
        from: payer.into(),
        module: bond.reserve_address(),
        coins: bond.outcome_payment.clone(),
    };
    bond.state = BondState::Settle;
    Ok(op)
}

/// `WithdrawShare`: burn `burn_amount` of bond token and receive
/// `reserve_balance * burn_amount / current_supply`, truncated down per
/// denom. Truncation direction is deliberately down: dust intentionally
/// stays behind - the last holder's withdrawal leaves a permanent,
/// non-negative residual rather than ever over-paying and risking an
/// insolvent reserve.
///
/// `reserve_balance` is supplied by the caller (a host bank query against
/// `bond.reserve_address()`), since the engine does not track reserve
/// balances for non-swapper bonds directly - outside `Settle` they're
/// derived from the curve, but once the outcome payment lands the curve
/// relationship no longer holds on purpose, so the actual on-chain balance
/// is now authoritative.
pub fn withdraw_share(
    bond: &mut Bond,
    recipient: impl Into<String>,
    burn_amount: Uint128,
    reserve_balance: &CoinSet,
) -> Result<Vec<BankOp>, ContractError> {
    if bond.state != BondState::Settle {
        return Err(ContractError::WrongState {
            bond_id: bond.id.clone(),
            state: format!("{:?}", bond.state),
            action: "WithdrawShare".into(),
        });
    }
    if burn_amount > bond.current_supply {
        return Err(ContractError::InsufficientBalance(bond.token.clone()));
    }

    let recipient = recipient.into();
    let share = Dec::from_uint128(burn_amount).checked_div(bond.current_supply_dec())?;
    let payout = reserve_balance.mul_dec(share)?;

    bond.current_supply = bond.current_supply.checked_sub(burn_amount)?;

    let token_coins = CoinSet::single(bond.token.clone(), burn_amount);
    let send_to_burn_op = BankOp::SendToModule {
        from: recipient.clone(),
        module: crate::host::BONDS_MINT_BURN.to_string(),
        coins: token_coins.clone(),
    };
    let burn_op = BankOp::Burn {
        module: crate::host::BONDS_MINT_BURN.to_string(),
        coins: token_coins,
    };
    let payout_op = BankOp::SendFromModule {
        module: bond.reserve_address(),
        to: recipient,
        coins: payout,
    };
    Ok(vec![send_to_burn_op, burn_op, payout_op])
}
