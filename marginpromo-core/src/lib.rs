//! MarginPromo Core — domain types and data sources for promotional margin lending.
//!
//! This crate contains everything the resolution engine reads:
//! - Promotion configuration and marketing campaigns
//! - Margin catalog records in both basket generations (flat V2, tiered V3)
//! - Account-assigned loan packages
//! - Resolved offers and grouped package output
//! - Source traits for the external services, with snapshot and HTTP implementations

pub mod domain;
pub mod sources;

pub use domain::{
    AccountDetail, AccountLoanPackage, AccountNo, Audience, Campaign, CampaignId, CampaignProduct,
    CampaignProductOffer, CampaignStatus, CampaignTag, FinancialProductLoanPackage,
    GroupedPackage, LoanBasket, LoanBasketId, LoanPackageId, LoanPolicy, LoanProduct,
    MarginProduct, PackageSummary, PolicyAssignment, ProductId, PromotionConfiguration,
    PromotionProduct, RateBand, ResolvedOffer, Symbol,
};
pub use sources::{
    AccountSource, ConfigurationSource, LoanProductFilter, MarginCatalogSource, RemoteConfig,
    RemoteSource, Snapshot, SnapshotSource, SourceError,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn domain_types_are_send_sync() {
        assert_send::<PromotionConfiguration>();
        assert_sync::<PromotionConfiguration>();
        assert_send::<Campaign>();
        assert_sync::<Campaign>();
        assert_send::<LoanBasket>();
        assert_sync::<LoanBasket>();
        assert_send::<AccountLoanPackage>();
        assert_sync::<AccountLoanPackage>();
        assert_send::<ResolvedOffer>();
        assert_sync::<ResolvedOffer>();
        assert_send::<GroupedPackage>();
        assert_sync::<GroupedPackage>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<SnapshotSource>();
        assert_sync::<SnapshotSource>();
        assert_send::<RemoteSource>();
        assert_sync::<RemoteSource>();
        assert_send::<SourceError>();
        assert_sync::<SourceError>();
    }
}
