//! Marketing campaigns.
//!
//! A campaign attaches a name, tag and description to (loan package, symbol)
//! pairs. Only active campaigns take part in resolution; their metadata is
//! additive and never removes an offer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::{CampaignId, LoanPackageId};
use super::promotion::Audience;
use super::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    Active,
    Inactive,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "Active",
            CampaignStatus::Inactive => "Inactive",
        }
    }
}

/// A loan package promoted by a campaign, with its symbol lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProduct {
    pub loan_package_id: LoanPackageId,
    #[serde(default)]
    pub symbols: BTreeSet<Symbol>,
    #[serde(default)]
    pub retail_symbols: BTreeSet<Symbol>,
}

impl CampaignProduct {
    pub fn covers(&self, symbol: &str, audience: Audience) -> bool {
        match audience {
            Audience::Retail => self.retail_symbols.contains(symbol),
            Audience::Public => self.symbols.contains(symbol) || self.retail_symbols.contains(symbol),
        }
    }

    pub fn symbols_for(&self, audience: Audience) -> BTreeSet<Symbol> {
        match audience {
            Audience::Retail => self.retail_symbols.clone(),
            Audience::Public => self.symbols.union(&self.retail_symbols).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub description: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub products: Vec<CampaignProduct>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    /// Metadata attached to offers resolved under this campaign.
    pub fn tag(&self) -> CampaignTag {
        CampaignTag {
            campaign_id: self.id,
            name: self.name.clone(),
            tag: self.tag.clone(),
            description: self.description.clone(),
        }
    }

    /// Every symbol this campaign promotes to the given audience.
    pub fn symbols_for(&self, audience: Audience) -> BTreeSet<Symbol> {
        self.products
            .iter()
            .flat_map(|p| p.symbols_for(audience))
            .collect()
    }
}

/// Campaign metadata carried by a resolved offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTag {
    pub campaign_id: CampaignId,
    pub name: String,
    pub tag: String,
    pub description: String,
}
