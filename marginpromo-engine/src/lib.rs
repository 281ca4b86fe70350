//! MarginPromo Engine — promotion resolution over the margin catalog.
//!
//! This crate builds on `marginpromo-core` to provide:
//! - Eligibility from promotion configuration and active campaigns
//! - Minimum-rate selection across flat (V2) and tiered (V3) baskets
//! - The margin-account gate for account-scoped queries
//! - Bounded, fail-fast fan-out per account and per symbol
//! - Campaign enrichment and grouping by loan package
//! - `PromotionService`, exposing the inbound operations

pub mod config;
pub mod eligibility;
pub mod enrichment;
pub mod error;
pub mod fanout;
pub mod gate;
pub mod selector;
pub mod service;

pub use config::{ConfigError, EngineConfig};
pub use eligibility::{eligible_packages, EligibilitySource, PromotionContext};
pub use enrichment::{enrich, group_by_package, CampaignIndex};
pub use error::EngineError;
pub use fanout::{fetch_account_packages, resolve_accounts, FanOut};
pub use gate::{is_margin_account, select_account_minimum_rate};
pub use selector::{
    compare_offers, index_packages_by_basket, normalize_product, resolve_catalog_offer,
    select_minimum_rate,
};
pub use service::{PromotionService, Sources};
