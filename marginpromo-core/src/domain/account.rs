//! Account records from the account/loan-package service.

use serde::{Deserialize, Serialize};

use super::ids::{AccountNo, LoanBasketId, LoanPackageId};
use super::offer::LoanProduct;

/// An account belonging to a custody code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub account_no: AccountNo,
    #[serde(default)]
    pub custody_code: String,
    #[serde(default)]
    pub account_type: String,
}

/// A loan package actually assigned to an account, with its per-symbol products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLoanPackage {
    pub id: LoanPackageId,
    #[serde(default)]
    pub name: String,
    /// Account-type tag; `"M"` marks a margin package.
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(default)]
    pub loan_basket_id: Option<LoanBasketId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub loan_products: Vec<LoanProduct>,
}

impl AccountLoanPackage {
    pub fn has_type(&self, code: &str) -> bool {
        self.package_type == code
    }

    pub fn products_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a LoanProduct> {
        self.loan_products.iter().filter(move |p| p.symbol == symbol)
    }
}
