use serde::{Deserialize, Serialize};
use std::fmt;

/// Loan package id (shared by the catalog, configuration and account records)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanPackageId(pub i64);

impl fmt::Display for LoanPackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loan basket id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanBasketId(pub i64);

impl fmt::Display for LoanBasketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketing campaign id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Margin product id
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthetic id for the single product a flat (V2) basket yields for a symbol.
    pub fn for_flat_basket(basket: LoanBasketId, symbol: &str) -> Self {
        Self(format!("{basket}:{symbol}"))
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Brokerage account number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNo(pub String);

impl AccountNo {
    pub fn new(account_no: impl Into<String>) -> Self {
        Self(account_no.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_basket_product_id_is_stable() {
        let id = ProductId::for_flat_basket(LoanBasketId(7), "HPG");
        assert_eq!(id, ProductId::new("7:HPG"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&LoanPackageId(42)).unwrap();
        assert_eq!(json, "42");
        let account: AccountNo = serde_json::from_str("\"0001234567\"").unwrap();
        assert_eq!(account.as_str(), "0001234567");
    }
}
