//! Outbound data source traits and structured error types.
//!
//! The engine only reads through these traits, so the same resolution code
//! runs against a snapshot file, the HTTP services, or a test double.

pub mod remote;
pub mod snapshot;

pub use remote::{RemoteConfig, RemoteSource};
pub use snapshot::{Snapshot, SnapshotSource};

use thiserror::Error;

use crate::domain::{
    AccountDetail, AccountLoanPackage, AccountNo, Campaign, CampaignStatus,
    FinancialProductLoanPackage, LoanBasket, LoanBasketId, LoanPackageId, MarginProduct,
    PromotionConfiguration, Symbol,
};

/// Structured error types for source operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited by service")]
    RateLimited,

    #[error("service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("i/o error: {0}")]
    Io(String),
}

/// Filter for the valid-products lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanProductFilter {
    pub symbol: Option<Symbol>,
}

impl LoanProductFilter {
    pub fn for_symbol(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: Some(symbol.into()),
        }
    }

    pub fn matches(&self, product: &MarginProduct) -> bool {
        self.symbol.as_ref().map_or(true, |s| &product.symbol == s)
    }
}

/// Promotion configuration and campaigns.
pub trait ConfigurationSource: Send + Sync {
    fn promotion_configuration(&self) -> Result<PromotionConfiguration, SourceError>;

    fn campaigns(&self, status: CampaignStatus) -> Result<Vec<Campaign>, SourceError>;
}

/// Margin catalog lookups (loan packages, baskets, currently valid products).
pub trait MarginCatalogSource: Send + Sync {
    fn loan_package_details(
        &self,
        ids: &[LoanPackageId],
    ) -> Result<Vec<FinancialProductLoanPackage>, SourceError>;

    fn margin_baskets_by_ids(&self, ids: &[LoanBasketId]) -> Result<Vec<LoanBasket>, SourceError>;

    fn loan_products(&self, filter: &LoanProductFilter) -> Result<Vec<MarginProduct>, SourceError>;
}

/// Account and assigned loan-package lookups.
pub trait AccountSource: Send + Sync {
    fn accounts_by_custody_code(&self, custody_code: &str)
        -> Result<Vec<AccountDetail>, SourceError>;

    fn account_loan_packages(
        &self,
        account_no: &AccountNo,
    ) -> Result<Vec<AccountLoanPackage>, SourceError>;
}
