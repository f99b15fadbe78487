//! Persisted key-space, grounded on `contracts/factory/src/state.rs`'s
//! `Item`/`Map` conventions. The engine holds exclusive logical ownership of
//! these four prefixes; nothing else in a host's storage tree may write
//! under them.

use std::collections::BTreeSet;

use cw_storage_plus::{Item, Map};

use crate::batch::Batch;
use crate::bond::Bond;

/// `bond/<bond_id>` -> Bond.
pub const BONDS: Map<&str, Bond> = Map::new("bond");

/// `bond_did/<token>` -> `bond_id`. Reverse index from the minted token
/// denom back to its owning bond, so `token` uniqueness (I6) can be checked
/// without scanning every bond.
pub const BOND_DIDS: Map<&str, String> = Map::new("bond_did");

/// `batch/<bond_id>` -> the in-flight Batch.
pub const BATCHES: Map<&str, Batch> = Map::new("batch");

/// `last_batch/<bond_id>` -> the most recently settled Batch.
pub const LAST_BATCHES: Map<&str, Batch> = Map::new("last_batch");

/// `reserved_tokens` -> the set of denoms `CreateBond` may never mint.
pub const RESERVED_TOKENS: Item<BTreeSet<String>> = Item::new("reserved_tokens");
