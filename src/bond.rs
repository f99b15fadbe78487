use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal256, Uint128};

use crate::coin::CoinSet;
use crate::curve::{Augmented, Curve, Power, Sigmoid};
use crate::decimal::Dec;
use crate::error::ContractError;

/// Lifecycle states of an augmented bond. Every other function type starts
/// and stays `Open`.
#[cw_serde]
#[derive(Eq)]
pub enum BondState {
    Hatch,
    Open,
    Settle,
}

/// Curve selection plus its *raw*, creator-supplied parameters - i.e. what
/// a `CreateBond` message carries before the engine derives anything
/// (`R0`/`S0`/`V0` for augmented bonds). See [`Curve`] for the fully
/// resolved, post-derivation form stored on [`Bond`].
#[cw_serde]
pub enum CurveParams {
    Power { m: Decimal256, n: u32, c: Decimal256 },
    Sigmoid { a: Decimal256, b: Decimal256, c: Decimal256 },
    Swapper {},
    Augmented {
        d0: Decimal256,
        p0: Decimal256,
        theta: Decimal256,
        kappa: Decimal256,
    },
}

impl CurveParams {
    /// Number of reserve denoms this function type requires: one for every
    /// curve except swapper, which needs exactly two.
    pub fn required_reserve_count(&self) -> usize {
        match self {
            CurveParams::Swapper {} => 2,
            _ => 1,
        }
    }

    fn into_curve(self) -> Result<Curve, ContractError> {
        Ok(match self {
            CurveParams::Power { m, n, c } => Curve::Power(Power { m, n, c }),
            CurveParams::Sigmoid { a, b, c } => Curve::Sigmoid(Sigmoid { a, b, c }),
            CurveParams::Swapper {} => Curve::Swapper,
            CurveParams::Augmented { d0, p0, theta, kappa } => {
                Curve::Augmented(Augmented::new(d0, p0, theta, kappa)?)
            }
        })
    }
}

/// A parametric market-maker instance with its own curve and reserves.
/// One per market; `id` and `token` are each globally unique.
#[cw_serde]
pub struct Bond {
    pub id: String,
    pub token: String,
    pub name: String,
    pub description: String,
    pub creator: String,

    pub curve: Curve,
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

    pub state: BondState,
    pub current_supply: Uint128,

    /// `(R_a, R_b)` in `reserve_tokens` order. Only meaningful for swapper
    /// bonds - every other function type tracks its reserve implicitly as
    /// `reserve_for_supply(current_supply)`, since there the curve itself
    /// determines the reserve from the supply alone.
    pub swapper_reserves: (Uint128, Uint128),
}

#[allow(clippy::too_many_arguments)]
pub struct NewBondParams {
    pub id: String,
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

impl Bond {
    /// Validates and constructs a new bond. Mirrors
    /// `handleMsgCreateBond` in `x/bonds/handler.go`: state defaults to
    /// `Open`, is overridden to `Hatch` (with sells forced off) only for
    /// augmented bonds, since `S0 = d0/p0 > 0` always holds there.
    pub fn new(p: NewBondParams) -> Result<Bond, ContractError> {
        if p.batch_blocks == 0 {
            return Err(ContractError::InvalidFunctionParameter {
                name: "batch_blocks".into(),
                constraint: "be a positive integer".into(),
            });
        }
        validate_percentage(p.tx_fee_pct, "tx_fee_pct")?;
        validate_percentage(p.exit_fee_pct, "exit_fee_pct")?;

        let required = p.curve.required_reserve_count();
        if p.reserve_tokens.len() != required {
            return Err(ContractError::WrongReserveTokenCount {
                expected: required,
                got: p.reserve_tokens.len(),
            });
        }

        let is_swapper = matches!(p.curve, CurveParams::Swapper {});
        if !is_swapper && (!p.sanity_rate.is_zero() || !p.sanity_margin_pct.is_zero()) {
            return Err(ContractError::InvalidSanityParameters {});
        }

        let is_augmented = matches!(p.curve, CurveParams::Augmented { .. });
        let curve = p.curve.into_curve()?;

        let (state, allow_sells) = if is_augmented {
            // Augmented bonds always start in Hatch with sells off, since
            // S0 = d0/p0 > 0 is guaranteed by Augmented::new.
            (BondState::Hatch, false)
        } else {
            (BondState::Open, p.allow_sells)
        };

        Ok(Bond {
            id: p.id,
            token: p.token,
            name: p.name,
            description: p.description,
            creator: p.creator,
            curve,
            reserve_tokens: p.reserve_tokens,
            tx_fee_pct: p.tx_fee_pct,
            exit_fee_pct: p.exit_fee_pct,
            fee_address: p.fee_address,
            max_supply: p.max_supply,
            order_quantity_limits: p.order_quantity_limits,
            sanity_rate: p.sanity_rate,
            sanity_margin_pct: p.sanity_margin_pct,
            allow_sells,
            batch_blocks: p.batch_blocks,
            outcome_payment: p.outcome_payment,
            state,
            current_supply: Uint128::zero(),
            swapper_reserves: (Uint128::zero(), Uint128::zero()),
        })
    }

    /// The custody address holding this bond's reserve(s). Derived
    /// deterministically from the bond id rather than queried from the
    /// host, the same way an `astroport-pair` contract is its own reserve
    /// custodian via `env.contract.address` - here bonds aren't separate
    /// contracts, so the engine mints one synthetic address per bond.
    pub fn reserve_address(&self) -> String {
        format!("bond:{}:reserve", self.id)
    }

    pub fn is_swapper(&self) -> bool {
        matches!(self.curve, Curve::Swapper)
    }

    /// Rejects any prospective supply above `max_supply`.
    pub fn check_max_supply(&self, prospective_supply: Uint128) -> Result<(), ContractError> {
        if prospective_supply > self.max_supply {
            Err(ContractError::MaxSupplyExceeded {
                bond_id: self.id.clone(),
            })
        } else {
            Ok(())
        }
    }

    pub fn current_supply_dec(&self) -> Dec {
        Dec::from_uint128(self.current_supply)
    }

    /// Augmented bonds transition Hatch -> Open the first batch-end where
    /// `current_supply >= S0`. No-op for every other function type and once
    /// already past Hatch.
    pub fn maybe_end_hatch(&mut self) {
        if self.state != BondState::Hatch {
            return;
        }
        if let Curve::Augmented(a) = &self.curve {
            if !a.in_hatch(self.current_supply_dec()) {
                self.state = BondState::Open;
                self.allow_sells = true;
            }
        }
    }
}

fn validate_percentage(p: Decimal256, name: &str) -> Result<(), ContractError> {
    if p >= Decimal256::from_ratio(100u128, 1u128) {
        return Err(ContractError::InvalidPercentage(name.to_string()));
    }
    Ok(())
}

/// Fields a `CreateBond` caller may tweak post-creation. `None` means
/// "leave unchanged" - the same do-not-modify sentinel `x/bonds/handler.go`
/// uses, re-architected here as `Option<T>` instead of magic zero values.
#[cw_serde]
#[derive(Default)]
pub struct EditBondParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order_quantity_limits: Option<CoinSet>,
    pub sanity_rate: Option<Decimal256>,
    pub sanity_margin_pct: Option<Decimal256>,
}

impl Bond {
    pub fn apply_edit(&mut self, edit: EditBondParams) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(limits) = edit.order_quantity_limits {
            self.order_quantity_limits = limits;
        }
        if let Some(rate) = edit.sanity_rate {
            self.sanity_rate = rate;
        }
        if let Some(margin) = edit.sanity_margin_pct {
            self.sanity_margin_pct = margin;
        }
    }
}
