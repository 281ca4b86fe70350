//! Promotion configuration — which loan packages are promoted for which symbols.
//!
//! The configuration is a full-replace document owned by an admin operation.
//! Resolution never caches it: every request reads a fresh copy and passes it
//! down explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::LoanPackageId;
use super::Symbol;

/// Who a resolution is performed for.
///
/// Account-scoped queries are retail: only retail symbol lists apply.
/// Catalog-wide public queries see every promoted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Retail,
    Public,
}

/// One promoted loan package and the symbols it is promoted for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionProduct {
    pub loan_package_id: LoanPackageId,
    #[serde(default)]
    pub retail_symbols: BTreeSet<Symbol>,
    #[serde(default)]
    pub non_retail_symbols: BTreeSet<Symbol>,
}

impl PromotionProduct {
    /// Union of retail and non-retail symbols.
    pub fn all_symbols(&self) -> BTreeSet<Symbol> {
        self.retail_symbols
            .union(&self.non_retail_symbols)
            .cloned()
            .collect()
    }

    /// Whether this package is promoted for `symbol` to the given audience.
    pub fn covers(&self, symbol: &str, audience: Audience) -> bool {
        match audience {
            Audience::Retail => self.retail_symbols.contains(symbol),
            Audience::Public => {
                self.retail_symbols.contains(symbol) || self.non_retail_symbols.contains(symbol)
            }
        }
    }

    /// Symbols visible to the given audience.
    pub fn symbols_for(&self, audience: Audience) -> BTreeSet<Symbol> {
        match audience {
            Audience::Retail => self.retail_symbols.clone(),
            Audience::Public => self.all_symbols(),
        }
    }
}

/// Ordered list of promoted packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionConfiguration {
    #[serde(default)]
    pub products: Vec<PromotionProduct>,
}

impl PromotionConfiguration {
    pub fn new(products: Vec<PromotionProduct>) -> Self {
        Self { products }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Every symbol promoted to the given audience, across all packages.
    pub fn symbols_for(&self, audience: Audience) -> BTreeSet<Symbol> {
        self.products
            .iter()
            .flat_map(|p| p.symbols_for(audience))
            .collect()
    }
}
