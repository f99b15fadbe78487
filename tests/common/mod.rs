//! Shared test harness: a trivial in-memory stand-in for the host ledger,
//! playing the role `cosmwasm_std::testing::mock_dependencies` plays for
//! `astroport-pair`'s own `testing.rs`. Identity resolution is the identity
//! function - these tests treat `did:...` strings as already being
//! addresses, since DID resolution itself is out of scope here.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use bonds_engine::coin::CoinSet;
use bonds_engine::error::ContractError;
use bonds_engine::host::{BankKeeper, Blacklist, IdentityResolver};

#[derive(Default)]
pub struct MockHost {
    balances: RefCell<BTreeMap<(String, String), u128>>,
    blacklisted: RefCell<BTreeSet<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        MockHost::default()
    }

    pub fn credit(&self, address: &str, denom: &str, amount: u128) {
        let mut balances = self.balances.borrow_mut();
        *balances.entry((address.to_string(), denom.to_string())).or_insert(0) += amount;
    }

    pub fn blacklist(&self, address: &str) {
        self.blacklisted.borrow_mut().insert(address.to_string());
    }

    pub fn balance_of(&self, address: &str, denom: &str) -> u128 {
        self.balances
            .borrow()
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&self, address: &str, denom: &str, amount: u128) {
        let mut balances = self.balances.borrow_mut();
        let entry = balances.entry((address.to_string(), denom.to_string())).or_insert(0);
        *entry = entry
            .checked_sub(amount)
            .unwrap_or_else(|| panic!("{address} has insufficient {denom} (tried to debit {amount})"));
    }

    fn credit_coins(&self, address: &str, coins: &CoinSet) {
        for (denom, amount) in coins.iter() {
            self.credit(address, denom, amount.u128());
        }
    }

    fn debit_coins(&self, address: &str, coins: &CoinSet) {
        for (denom, amount) in coins.iter() {
            self.debit(address, denom, amount.u128());
        }
    }

    /// Applies a batch of [`BankOp`]s the way a real host would when it
    /// executes the ops an engine handler returned - the engine itself never
    /// touches balances directly; mutation is atomic and host-executed.
    pub fn apply_ops(&self, ops: &[bonds_engine::host::BankOp]) {
        use bonds_engine::host::BankOp;
        for op in ops {
            match op {
                BankOp::Send { from, to, coins } => {
                    self.debit_coins(from, coins);
                    self.credit_coins(to, coins);
                }
                BankOp::SendFromModule { module, to, coins } => {
                    self.debit_coins(module, coins);
                    self.credit_coins(to, coins);
                }
                BankOp::SendToModule { from, module, coins } => {
                    self.debit_coins(from, coins);
                    self.credit_coins(module, coins);
                }
                BankOp::Mint { module, coins } => {
                    self.credit_coins(module, coins);
                }
                BankOp::Burn { module, coins } => {
                    self.debit_coins(module, coins);
                }
            }
        }
    }
}

impl IdentityResolver for MockHost {
    fn resolve(&self, did: &str) -> Result<String, ContractError> {
        Ok(did.to_string())
    }
}

impl BankKeeper for MockHost {
    fn balance(&self, address: &str, denom: &str) -> Result<cosmwasm_std::Uint128, ContractError> {
        Ok(cosmwasm_std::Uint128::new(self.balance_of(address, denom)))
    }
}

impl Blacklist for MockHost {
    fn is_blacklisted(&self, address: &str) -> Result<bool, ContractError> {
        Ok(self.blacklisted.borrow().contains(address))
    }
}
