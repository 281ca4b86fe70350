//! Engine error type.
//!
//! Every outbound failure is wrapped with the operation that issued it while
//! the original `SourceError` stays reachable, both through
//! `std::error::Error::source` and `EngineError::source_error`.

use marginpromo_core::{AccountNo, SourceError};
use thiserror::Error;

use crate::config::ConfigError;

/// Operation names used to label upstream failures.
pub mod ops {
    pub const GET_PROMOTION_CONFIGURATION: &str = "Eligibility GetPromotionConfiguration";
    pub const GET_ACTIVE_CAMPAIGNS: &str = "Eligibility GetActiveCampaigns";
    pub const GET_LOAN_PACKAGE_DETAILS: &str = "RateSelector GetLoanPackageDetails";
    pub const GET_MARGIN_BASKETS: &str = "RateSelector GetMarginBasketsByIds";
    pub const GET_LOAN_PRODUCTS: &str = "RateSelector GetLoanProducts";
    pub const GET_ACCOUNTS_BY_CUSTODY_CODE: &str = "FanOut GetAllAccountDetailByCustodyCode";
    pub const GET_ACCOUNT_LOAN_PACKAGES: &str = "FanOut GetAllAccountLoanPackages";
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested account does not belong to the custody code.
    #[error("account {account_no} is not valid for custody code {custody_code}")]
    AccountNoInvalid {
        account_no: AccountNo,
        custody_code: String,
    },

    #[error("{op}: {source}")]
    Upstream {
        op: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("worker pool: {0}")]
    Pool(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Wrap a source failure with the operation that issued it.
    pub fn upstream(op: &'static str) -> impl FnOnce(SourceError) -> EngineError {
        move |source| EngineError::Upstream { op, source }
    }

    /// Whether the caller supplied bad input (as opposed to a downstream failure).
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::AccountNoInvalid { .. })
    }

    /// The underlying source failure, if this error came from one.
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            EngineError::Upstream { source, .. } => Some(source),
            _ => None,
        }
    }
}
