//! Eligibility filter — which loan packages are promoted for a symbol.
//!
//! Two sources of eligibility exist: the promotion configuration and the
//! active campaigns. `PromotionContext` holds a per-request copy of both and
//! is passed explicitly into every resolution, so resolution is a pure
//! function of its inputs.

use std::collections::BTreeSet;

use marginpromo_core::{
    Audience, Campaign, CampaignProduct, CampaignStatus, ConfigurationSource, LoanPackageId,
    PromotionConfiguration, SourceError, Symbol,
};

use crate::error::{ops, EngineError};

/// Where eligibility is read from.
#[derive(Debug, Clone, Copy)]
pub enum EligibilitySource<'a> {
    Configuration(&'a PromotionConfiguration),
    Campaigns(&'a [CampaignProduct]),
}

/// Loan packages eligible for `symbol` under `source`.
///
/// An empty set means "no offer available", never an error.
pub fn eligible_packages(
    symbol: &str,
    source: EligibilitySource<'_>,
    audience: Audience,
) -> BTreeSet<LoanPackageId> {
    match source {
        EligibilitySource::Configuration(config) => config
            .products
            .iter()
            .filter(|p| p.covers(symbol, audience))
            .map(|p| p.loan_package_id)
            .collect(),
        EligibilitySource::Campaigns(products) => products
            .iter()
            .filter(|p| p.covers(symbol, audience))
            .map(|p| p.loan_package_id)
            .collect(),
    }
}

/// Flatten the products of every active campaign.
pub fn flatten_campaign_products(campaigns: &[Campaign]) -> Vec<CampaignProduct> {
    campaigns
        .iter()
        .filter(|c| c.is_active())
        .flat_map(|c| c.products.iter().cloned())
        .collect()
}

/// Configuration and active campaigns read once per request.
#[derive(Debug, Clone, Default)]
pub struct PromotionContext {
    pub configuration: PromotionConfiguration,
    pub campaigns: Vec<Campaign>,
    campaign_products: Vec<CampaignProduct>,
}

impl PromotionContext {
    pub fn new(configuration: PromotionConfiguration, campaigns: Vec<Campaign>) -> Self {
        let mut campaigns: Vec<Campaign> = campaigns.into_iter().filter(|c| c.is_active()).collect();
        campaigns.sort_by_key(|c| c.id);
        let campaign_products = flatten_campaign_products(&campaigns);
        Self {
            configuration,
            campaigns,
            campaign_products,
        }
    }

    /// Read configuration and active campaigns from the source.
    ///
    /// A `NotFound` from either read means nothing is promoted.
    pub fn load(source: &dyn ConfigurationSource) -> Result<Self, EngineError> {
        let configuration = match source.promotion_configuration() {
            Ok(config) => config,
            Err(SourceError::NotFound(_)) => PromotionConfiguration::default(),
            Err(e) => return Err(EngineError::upstream(ops::GET_PROMOTION_CONFIGURATION)(e)),
        };
        let campaigns = match source.campaigns(CampaignStatus::Active) {
            Ok(campaigns) => campaigns,
            Err(SourceError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(EngineError::upstream(ops::GET_ACTIVE_CAMPAIGNS)(e)),
        };
        tracing::debug!(
            promoted_packages = configuration.products.len(),
            active_campaigns = campaigns.len(),
            "loaded promotion context"
        );
        Ok(Self::new(configuration, campaigns))
    }

    /// Packages eligible for `symbol` from configuration or campaigns.
    pub fn eligible_ids(&self, symbol: &str, audience: Audience) -> BTreeSet<LoanPackageId> {
        let mut ids = eligible_packages(
            symbol,
            EligibilitySource::Configuration(&self.configuration),
            audience,
        );
        ids.extend(eligible_packages(
            symbol,
            EligibilitySource::Campaigns(&self.campaign_products),
            audience,
        ));
        ids
    }

    /// Every symbol promoted to the audience by configuration or campaigns.
    pub fn promoted_symbols(&self, audience: Audience) -> BTreeSet<Symbol> {
        let mut symbols = self.configuration.symbols_for(audience);
        for product in &self.campaign_products {
            symbols.extend(product.symbols_for(audience));
        }
        symbols
    }
}
