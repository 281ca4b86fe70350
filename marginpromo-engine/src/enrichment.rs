//! Campaign enrichment and package grouping.

use std::collections::{BTreeMap, HashMap};

use marginpromo_core::{
    Audience, Campaign, CampaignProductOffer, CampaignTag, GroupedPackage, LoanPackageId,
    ResolvedOffer, Symbol,
};

/// (loan package, symbol) → campaign metadata, built from active campaigns.
#[derive(Debug, Clone, Default)]
pub struct CampaignIndex {
    entries: HashMap<LoanPackageId, HashMap<Symbol, CampaignTag>>,
}

impl CampaignIndex {
    /// Index active campaigns for an audience.
    ///
    /// When two campaigns claim the same pair, the lowest campaign id wins.
    pub fn build(campaigns: &[Campaign], audience: Audience) -> Self {
        let mut ordered: Vec<&Campaign> = campaigns.iter().filter(|c| c.is_active()).collect();
        ordered.sort_by_key(|c| c.id);

        let mut entries: HashMap<LoanPackageId, HashMap<Symbol, CampaignTag>> = HashMap::new();
        for campaign in ordered {
            for product in &campaign.products {
                let by_symbol = entries.entry(product.loan_package_id).or_default();
                for symbol in product.symbols_for(audience) {
                    by_symbol.entry(symbol).or_insert_with(|| campaign.tag());
                }
            }
        }
        Self { entries }
    }

    pub fn lookup(&self, package: LoanPackageId, symbol: &str) -> Option<&CampaignTag> {
        self.entries.get(&package).and_then(|m| m.get(symbol))
    }
}

/// Attach campaign metadata when the offer's (package, symbol) is campaigned.
///
/// Offers without a campaign pass through unchanged.
pub fn enrich(mut offer: ResolvedOffer, index: &CampaignIndex) -> ResolvedOffer {
    if let Some(tag) = index.lookup(offer.package_id(), offer.symbol()) {
        offer.campaign = Some(tag.clone());
    }
    offer
}

/// Regroup offers so each loan package appears once.
///
/// Packages come out sorted by id; products inside a package by symbol, then
/// campaign id.
pub fn group_by_package(offers: Vec<ResolvedOffer>) -> Vec<GroupedPackage> {
    let mut groups: BTreeMap<LoanPackageId, GroupedPackage> = BTreeMap::new();
    for offer in offers {
        let product = CampaignProductOffer {
            loan_product: offer.loan_product,
            campaign: offer.campaign,
        };
        groups
            .entry(offer.package.id)
            .or_insert_with(|| GroupedPackage {
                package: offer.package,
                campaign_products: Vec::new(),
            })
            .campaign_products
            .push(product);
    }

    groups
        .into_values()
        .map(|mut group| {
            group.campaign_products.sort_by(|a, b| {
                a.loan_product
                    .symbol
                    .cmp(&b.loan_product.symbol)
                    .then_with(|| {
                        let a_id = a.campaign.as_ref().map(|c| c.campaign_id);
                        let b_id = b.campaign.as_ref().map(|c| c.campaign_id);
                        a_id.cmp(&b_id)
                    })
            });
            group
        })
        .collect()
}
