//! File-backed snapshot of every external source.
//!
//! A `Snapshot` is a single JSON document holding configuration, campaigns,
//! catalog and account data. `SnapshotSource` serves it through the source
//! traits with the same filtering the live services apply, which makes it
//! the fixture for tests and the offline mode of the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{AccountSource, ConfigurationSource, LoanProductFilter, MarginCatalogSource, SourceError};
use crate::domain::{
    AccountDetail, AccountLoanPackage, AccountNo, Campaign, CampaignStatus,
    FinancialProductLoanPackage, LoanBasket, LoanBasketId, LoanPackageId, MarginProduct,
    PromotionConfiguration,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub promotion: PromotionConfiguration,
    pub campaigns: Vec<Campaign>,
    pub loan_packages: Vec<FinancialProductLoanPackage>,
    pub baskets: Vec<LoanBasket>,
    pub loan_products: Vec<MarginProduct>,
    /// Custody code → accounts.
    pub accounts: BTreeMap<String, Vec<AccountDetail>>,
    pub account_loan_packages: BTreeMap<AccountNo, Vec<AccountLoanPackage>>,
}

impl Snapshot {
    pub fn from_json_str(content: &str) -> Result<Self, SourceError> {
        serde_json::from_str(content).map_err(|e| SourceError::Decode(format!("snapshot: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Io(format!("read snapshot {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String, SourceError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SourceError::Decode(format!("serialize snapshot: {e}")))
    }

    /// BLAKE3 fingerprint of the canonical JSON form.
    ///
    /// Every collection in the snapshot is ordered, so equal snapshots always
    /// hash equally.
    pub fn fingerprint(&self) -> Result<String, SourceError> {
        let json = serde_json::to_string(self)
            .map_err(|e| SourceError::Decode(format!("serialize snapshot: {e}")))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Serves a `Snapshot` through every source trait.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let snapshot = Snapshot::from_file(path)?;
        let fingerprint = snapshot.fingerprint()?;
        tracing::debug!(path = %path.display(), %fingerprint, "loaded snapshot");
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn fingerprint(&self) -> Result<String, SourceError> {
        self.snapshot.fingerprint()
    }
}

impl ConfigurationSource for SnapshotSource {
    fn promotion_configuration(&self) -> Result<PromotionConfiguration, SourceError> {
        Ok(self.snapshot.promotion.clone())
    }

    fn campaigns(&self, status: CampaignStatus) -> Result<Vec<Campaign>, SourceError> {
        Ok(self
            .snapshot
            .campaigns
            .iter()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }
}

impl MarginCatalogSource for SnapshotSource {
    fn loan_package_details(
        &self,
        ids: &[LoanPackageId],
    ) -> Result<Vec<FinancialProductLoanPackage>, SourceError> {
        Ok(self
            .snapshot
            .loan_packages
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn margin_baskets_by_ids(&self, ids: &[LoanBasketId]) -> Result<Vec<LoanBasket>, SourceError> {
        Ok(self
            .snapshot
            .baskets
            .iter()
            .filter(|b| ids.contains(&b.id()))
            .cloned()
            .collect())
    }

    fn loan_products(&self, filter: &LoanProductFilter) -> Result<Vec<MarginProduct>, SourceError> {
        Ok(self
            .snapshot
            .loan_products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

impl AccountSource for SnapshotSource {
    fn accounts_by_custody_code(
        &self,
        custody_code: &str,
    ) -> Result<Vec<AccountDetail>, SourceError> {
        Ok(self
            .snapshot
            .accounts
            .get(custody_code)
            .cloned()
            .unwrap_or_default())
    }

    fn account_loan_packages(
        &self,
        account_no: &AccountNo,
    ) -> Result<Vec<AccountLoanPackage>, SourceError> {
        Ok(self
            .snapshot
            .account_loan_packages
            .get(account_no)
            .cloned()
            .unwrap_or_default())
    }
}
