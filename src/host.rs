//! Host-capability traits: one trait per concern, injected at engine
//! construction instead of a single god-object keeper. A concrete ledger
//! integration implements these and passes them in at call time, the same
//! way an `astroport-pair` handler is handed `Deps`/`DepsMut` rather than
//! reaching for a global.
//!
//! Persistence is not modelled here: the engine reads/writes through
//! `cosmwasm_std::Storage` directly (see `state.rs`), since that already is
//! a typed get/set/delete/iterate surface over byte-keyed records.
//!
//! Message signing, DID-to-pubkey resolution, and transaction routing are
//! out of scope and have no trait here; `IdentityResolver` only resolves an
//! opaque identity to the address the bank operations act on, which is the
//! one identity operation the engine itself needs.

use crate::coin::CoinSet;
use crate::error::ContractError;

/// Resolves an opaque creator/buyer/seller identity (a DID string) to the
/// address bank operations move funds to/from.
pub trait IdentityResolver {
    fn resolve(&self, did: &str) -> Result<String, ContractError>;
}

/// Read-only bank queries the engine needs to validate before it emits a
/// [`BankOp`] - e.g. confirming a buyer can actually cover `max_prices`
/// before it is moved into `BatchesIntermediary` custody.
pub trait BankKeeper {
    fn balance(&self, address: &str, denom: &str) -> Result<cosmwasm_std::Uint128, ContractError>;

    fn has(&self, address: &str, coins: &CoinSet) -> Result<bool, ContractError> {
        for (denom, amount) in coins.iter() {
            if self.balance(address, denom)? < *amount {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// `fee_address` must not be blacklisted at bond creation; the engine does
/// not otherwise police blacklists (a blacklisted buyer/seller is the
/// host's transaction-admission problem, not the engine's).
pub trait Blacklist {
    fn is_blacklisted(&self, address: &str) -> Result<bool, ContractError>;
}

/// A custody mutation the engine wants performed. The engine never moves
/// funds itself - the same way an `astroport-pair` handler returns
/// `CosmosMsg::Bank`/`WasmMsg` entries on its `Response` rather than
/// executing a transfer inline - it only ever *describes* one, and the host
/// executes the returned list atomically within its own transaction scope:
/// on any error, no state change and no events are emitted.
///
/// `Mint`/`Burn`/the two module-account sends have no equivalent in
/// `cosmwasm_std::BankMsg` (which only knows `Send`/`Burn` between real
/// accounts), because `BatchesIntermediary` and `BondsMintBurn` are logical
/// module accounts the host maintains, not wallets - so this is a small
/// custom enum rather than a reuse of `BankMsg`.
#[derive(Clone, Debug, PartialEq)]
pub enum BankOp {
    /// Moves coins directly between two resolved addresses.
    Send { from: String, to: String, coins: CoinSet },
    /// Pays out of a module account (e.g. refunding from
    /// `BatchesIntermediary`, paying a seller from a bond's reserve).
    SendFromModule {
        module: String,
        to: String,
        coins: CoinSet,
    },
    /// Moves coins from a resolved address into a module account (e.g. a
    /// buyer's `max_prices` into `BatchesIntermediary`).
    SendToModule {
        from: String,
        module: String,
        coins: CoinSet,
    },
    /// Mints bond tokens into `BondsMintBurn`, from where they are sent to
    /// the buyer.
    Mint { module: String, coins: CoinSet },
    /// Burns bond tokens already moved into `BondsMintBurn` (eager burn on
    /// sell admission).
    Burn { module: String, coins: CoinSet },
}

impl BankOp {
    pub fn send_from_module(module: impl Into<String>, to: impl Into<String>, coins: CoinSet) -> Self {
        BankOp::SendFromModule {
            module: module.into(),
            to: to.into(),
            coins,
        }
    }

    pub fn send_to_module(from: impl Into<String>, module: impl Into<String>, coins: CoinSet) -> Self {
        BankOp::SendToModule {
            from: from.into(),
            module: module.into(),
            coins,
        }
    }

    pub fn mint(module: impl Into<String>, coins: CoinSet) -> Self {
        BankOp::Mint {
            module: module.into(),
            coins,
        }
    }

    pub fn burn(module: impl Into<String>, coins: CoinSet) -> Self {
        BankOp::Burn {
            module: module.into(),
            coins,
        }
    }
}

/// The two module-owned custody accounts. Named constants rather than
/// configurable fields - they are structural to the engine, not a per-bond
/// parameter.
pub const BATCHES_INTERMEDIARY: &str = "BatchesIntermediary";
pub const BONDS_MINT_BURN: &str = "BondsMintBurn";
