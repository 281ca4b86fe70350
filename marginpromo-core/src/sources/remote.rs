//! HTTP client for the configuration, catalog and account services.
//!
//! One blocking client serves all three source traits. Each call maps to a
//! single GET with a JSON body; there are no retries here, a failed call
//! surfaces as a `SourceError` and the caller decides what to do with it.

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AccountSource, ConfigurationSource, LoanProductFilter, MarginCatalogSource, SourceError};
use crate::domain::{
    AccountDetail, AccountLoanPackage, AccountNo, Campaign, CampaignStatus,
    FinancialProductLoanPackage, LoanBasket, LoanBasketId, LoanPackageId, MarginProduct,
    PromotionConfiguration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct RemoteSource {
    client: Client,
    base_url: Url,
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, SourceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::Unavailable(format!("invalid base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Unavailable(format!(
                "base url cannot carry paths: {base_url}"
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Unavailable(format!("build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Build `base_url/segments...?query`.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        build_url(&self.base_url, segments, query)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| SourceError::Unavailable(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(classify_status(status, &url, body));
        }

        resp.json::<T>()
            .map_err(|e| SourceError::Decode(format!("{url}: {e}")))
    }
}

fn build_url(base: &Url, segments: &[&str], query: &[(&str, String)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    url
}

fn classify_status(status: StatusCode, url: &Url, body: String) -> SourceError {
    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(url.path().to_string()),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        _ => SourceError::Http {
            status: status.as_u16(),
            message: body,
        },
    }
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

impl ConfigurationSource for RemoteSource {
    fn promotion_configuration(&self) -> Result<PromotionConfiguration, SourceError> {
        self.get_json(self.endpoint(&["promotion-configuration"], &[]))
    }

    fn campaigns(&self, status: CampaignStatus) -> Result<Vec<Campaign>, SourceError> {
        self.get_json(self.endpoint(&["campaigns"], &[("status", status.as_str().to_string())]))
    }
}

impl MarginCatalogSource for RemoteSource {
    fn loan_package_details(
        &self,
        ids: &[LoanPackageId],
    ) -> Result<Vec<FinancialProductLoanPackage>, SourceError> {
        self.get_json(self.endpoint(&["loan-packages"], &[("ids", join_ids(ids))]))
    }

    fn margin_baskets_by_ids(&self, ids: &[LoanBasketId]) -> Result<Vec<LoanBasket>, SourceError> {
        self.get_json(self.endpoint(&["margin-baskets"], &[("ids", join_ids(ids))]))
    }

    fn loan_products(&self, filter: &LoanProductFilter) -> Result<Vec<MarginProduct>, SourceError> {
        let query: Vec<(&str, String)> = filter
            .symbol
            .iter()
            .map(|s| ("symbol", s.clone()))
            .collect();
        self.get_json(self.endpoint(&["loan-products"], &query))
    }
}

impl AccountSource for RemoteSource {
    fn accounts_by_custody_code(
        &self,
        custody_code: &str,
    ) -> Result<Vec<AccountDetail>, SourceError> {
        self.get_json(self.endpoint(&["custody-codes", custody_code, "accounts"], &[]))
    }

    fn account_loan_packages(
        &self,
        account_no: &AccountNo,
    ) -> Result<Vec<AccountLoanPackage>, SourceError> {
        self.get_json(self.endpoint(&["accounts", account_no.as_str(), "loan-packages"], &[]))
    }
}
