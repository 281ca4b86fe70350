//! Margin catalog records.
//!
//! Two generations of the catalog coexist:
//! - **V2 (flat)**: a basket lists symbols; the single interest rate lives on
//!   the `FinancialProductLoanPackage` that points at the basket.
//! - **V3 (tiered)**: a basket lists margin products, each with its own rate
//!   band and a list of loan policies carrying interest rates.
//!
//! On the wire both shapes share one record and are told apart by which list
//! is populated. `LoanBasket` decodes that record into a sum type so callers
//! match exhaustively instead of probing fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::{LoanBasketId, LoanPackageId, ProductId};
use super::Symbol;

/// Margin ratios attached to a V3 product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateBand {
    pub initial_rate: f64,
    pub maintenance_rate: f64,
    pub liquid_rate: f64,
}

/// Interest terms of one loan policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanPolicy {
    pub interest_rate: f64,
    /// Preferential period in days.
    pub preferential_period: u32,
    pub preferential_interest_rate: f64,
    /// Loan term in days.
    pub term: u32,
    pub allow_extend_loan_term: bool,
    pub allow_early_payment: bool,
}

/// Wire wrapper: products reference policies as `{"loanPolicy": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAssignment {
    pub loan_policy: LoanPolicy,
}

/// A V3 margin product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginProduct {
    pub id: ProductId,
    pub symbol: Symbol,
    #[serde(default)]
    pub loan_rate: RateBand,
    #[serde(default)]
    pub loan_policies: Vec<PolicyAssignment>,
}

impl MarginProduct {
    /// The policy with the lowest interest rate.
    ///
    /// Ties keep the earliest policy in list order. NaN rates never win.
    pub fn cheapest_policy(&self) -> Option<&LoanPolicy> {
        let mut best: Option<&LoanPolicy> = None;
        for assignment in &self.loan_policies {
            let policy = &assignment.loan_policy;
            if policy.interest_rate.is_nan() {
                continue;
            }
            match best {
                Some(current) if policy.interest_rate >= current.interest_rate => {}
                _ => best = Some(policy),
            }
        }
        best
    }
}

/// A loan basket in one of the two catalog generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLoanBasket", into = "RawLoanBasket")]
pub enum LoanBasket {
    /// V2: the basket lists symbols; the rate comes from its loan package.
    Flat {
        id: LoanBasketId,
        symbols: BTreeSet<Symbol>,
    },
    /// V3: the basket carries products with per-policy rates.
    Tiered {
        id: LoanBasketId,
        loan_products: Vec<MarginProduct>,
    },
}

impl LoanBasket {
    pub fn id(&self) -> LoanBasketId {
        match self {
            LoanBasket::Flat { id, .. } | LoanBasket::Tiered { id, .. } => *id,
        }
    }

    pub fn is_tiered(&self) -> bool {
        matches!(self, LoanBasket::Tiered { .. })
    }
}

/// The shared wire record both basket generations arrive in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoanBasket {
    id: LoanBasketId,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    symbols: BTreeSet<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    loan_products: Vec<MarginProduct>,
}

impl TryFrom<RawLoanBasket> for LoanBasket {
    type Error = String;

    fn try_from(raw: RawLoanBasket) -> Result<Self, Self::Error> {
        match (raw.symbols.is_empty(), raw.loan_products.is_empty()) {
            (false, true) => Ok(LoanBasket::Flat {
                id: raw.id,
                symbols: raw.symbols,
            }),
            (true, false) => Ok(LoanBasket::Tiered {
                id: raw.id,
                loan_products: raw.loan_products,
            }),
            (false, false) => Err(format!(
                "basket {} carries both symbols and loan products",
                raw.id
            )),
            (true, true) => Err(format!(
                "basket {} carries neither symbols nor loan products",
                raw.id
            )),
        }
    }
}

impl From<LoanBasket> for RawLoanBasket {
    fn from(basket: LoanBasket) -> Self {
        match basket {
            LoanBasket::Flat { id, symbols } => RawLoanBasket {
                id,
                symbols,
                loan_products: Vec::new(),
            },
            LoanBasket::Tiered { id, loan_products } => RawLoanBasket {
                id,
                symbols: BTreeSet::new(),
                loan_products,
            },
        }
    }
}

/// The V2 rate-bearing loan package record, joined to its basket by `loan_basket_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProductLoanPackage {
    pub id: LoanPackageId,
    pub loan_basket_id: LoanBasketId,
    pub name: String,
    #[serde(default)]
    pub loan_type: String,
    pub interest_rate: f64,
    #[serde(default)]
    pub initial_rate: f64,
    #[serde(default)]
    pub maintenance_rate: f64,
    #[serde(default)]
    pub liquid_rate: f64,
    #[serde(default)]
    pub buying_fee_rate: f64,
    #[serde(default)]
    pub transfer_fee: f64,
    #[serde(default)]
    pub term: u32,
    #[serde(default)]
    pub preferential_period: u32,
    #[serde(default)]
    pub preferential_interest_rate: f64,
    #[serde(default)]
    pub allow_extend_loan_term: bool,
    #[serde(default)]
    pub allow_early_payment: bool,
    #[serde(default)]
    pub description: String,
}
