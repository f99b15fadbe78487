use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

/// Errors the engine can return. One variant per failure mode named in the
/// handler's error taxonomy: validation, authorization, state, bounds,
/// curve domain, sanity and insufficient-funds.
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // -- validation --
    #[error("Unknown bonding function type")]
    UnknownFunctionType {},

    #[error("Missing function parameter: {name}")]
    MissingFunctionParameter { name: String },

    #[error("Function parameter {name} must be {constraint}")]
    InvalidFunctionParameter { name: String, constraint: String },

    #[error("Percentage {0} must lie in [0, 100)")]
    InvalidPercentage(String),

    #[error("reserve_tokens must have exactly {expected} denom(s) for this function type, got {got}")]
    WrongReserveTokenCount { expected: usize, got: usize },

    #[error("swapper bonds require sanity_rate and sanity_margin_pct >= 0")]
    InvalidSanityParameters {},

    // -- authorization --
    #[error("{who} is not the creator of bond {bond_id}")]
    NotCreator { who: String, bond_id: String },

    #[error("fee_address is blacklisted")]
    FeeAddressBlacklisted {},

    // -- state --
    #[error("bond {0} already exists")]
    BondAlreadyExists(String),

    #[error("bond {0} does not exist")]
    BondDoesNotExist(String),

    #[error("token {0} is already taken by another bond")]
    TokenTaken(String),

    #[error("token {0} is reserved and cannot be used")]
    ReservedToken(String),

    #[error("bond {bond_id} is in state {state:?}, which does not permit {action}")]
    WrongState {
        bond_id: String,
        state: String,
        action: String,
    },

    #[error("sells are not allowed for bond {0}")]
    SellsNotAllowed(String),

    #[error("bond {0} has no outcome_payment configured, so it cannot be closed")]
    EmptyOutcomePayment(String),

    // -- bounds --
    #[error("order amount for denom {denom} exceeds the order quantity limit of {limit}")]
    OrderQuantityLimitExceeded { denom: String, limit: String },

    #[error("buy would exceed bond {bond_id}'s max supply")]
    MaxSupplyExceeded { bond_id: String },

    #[error("account does not hold sufficient balance to cover {0}")]
    InsufficientBalance(String),

    #[error("max_prices is below what clearing would require")]
    MaxPriceBelowClearing {},

    // -- curve domain --
    #[error("curve domain error: {0}")]
    CurveDomain(String),

    // -- sanity --
    #[error("swapper reserves would violate the configured sanity rate")]
    SanityViolation {},

    // -- insufficient funds --
    #[error("host custody refused the transfer: {0}")]
    InsufficientFunds(String),

    // -- fatal --
    /// A core bond/supply/reserve invariant was violated at settlement.
    /// Unreachable in a correct implementation; treat it as an assertion
    /// failure, never something to recover from.
    #[error("invariant violation (fatal): {0}")]
    Invariant(String),
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}
