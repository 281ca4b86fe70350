//! Domain types for margin promotion resolution

pub mod account;
pub mod campaign;
pub mod catalog;
pub mod ids;
pub mod offer;
pub mod promotion;

pub use account::{AccountDetail, AccountLoanPackage};
pub use campaign::{Campaign, CampaignProduct, CampaignStatus, CampaignTag};
pub use catalog::{
    FinancialProductLoanPackage, LoanBasket, LoanPolicy, MarginProduct, PolicyAssignment, RateBand,
};
pub use ids::{AccountNo, CampaignId, LoanBasketId, LoanPackageId, ProductId};
pub use offer::{CampaignProductOffer, GroupedPackage, LoanProduct, PackageSummary, ResolvedOffer};
pub use promotion::{Audience, PromotionConfiguration, PromotionProduct};

/// Symbol type alias
pub type Symbol = String;
