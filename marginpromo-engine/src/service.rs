//! Promotion service — the inbound operations.
//!
//! Each operation reads a fresh `PromotionContext`, resolves offers through
//! the selector or the account gate, decorates them with campaign metadata,
//! and shapes the output. Account-scoped operations are resolved for the
//! retail audience; catalog-wide operations for the public audience.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use marginpromo_core::{
    AccountLoanPackage, AccountNo, AccountSource, Audience, Campaign, ConfigurationSource,
    GroupedPackage, LoanPackageId, MarginCatalogSource, ResolvedOffer, Symbol,
};

use crate::config::EngineConfig;
use crate::eligibility::PromotionContext;
use crate::enrichment::{enrich, group_by_package, CampaignIndex};
use crate::error::EngineError;
use crate::fanout::{fetch_account_packages, resolve_accounts, FanOut};
use crate::gate::select_account_minimum_rate;
use crate::selector::resolve_catalog_offer;

/// The three external sources the engine reads.
#[derive(Clone)]
pub struct Sources {
    pub configuration: Arc<dyn ConfigurationSource>,
    pub catalog: Arc<dyn MarginCatalogSource>,
    pub accounts: Arc<dyn AccountSource>,
}

impl Sources {
    /// Use one value for all three sources.
    pub fn shared<S>(source: Arc<S>) -> Self
    where
        S: ConfigurationSource + MarginCatalogSource + AccountSource + 'static,
    {
        Self {
            configuration: source.clone(),
            catalog: source.clone(),
            accounts: source,
        }
    }
}

/// One (campaign, symbol) resolution unit.
struct CampaignTask<'a> {
    campaign: &'a Campaign,
    symbol: Symbol,
    eligible: BTreeSet<LoanPackageId>,
}

pub struct PromotionService {
    sources: Sources,
    config: EngineConfig,
    fan_out: FanOut,
}

impl PromotionService {
    pub fn new(sources: Sources, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let fan_out = FanOut::new(config.max_parallelism)?;
        Ok(Self {
            sources,
            config,
            fan_out,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn load_context(&self) -> Result<PromotionContext, EngineError> {
        PromotionContext::load(self.sources.configuration.as_ref())
    }

    /// Catalog-wide minimum-rate offer for one symbol, enriched.
    fn public_offer(
        &self,
        ctx: &PromotionContext,
        symbol: &str,
        index: &CampaignIndex,
    ) -> Result<Option<ResolvedOffer>, EngineError> {
        let eligible = ctx.eligible_ids(symbol, Audience::Public);
        let offer = resolve_catalog_offer(
            self.sources.catalog.as_ref(),
            symbol,
            &eligible,
            self.config.rate_ceiling,
        )?;
        Ok(offer.map(|o| enrich(o, index)))
    }

    /// One account's offers for each symbol with eligible packages.
    fn account_offers(
        &self,
        packages: &[AccountLoanPackage],
        eligible_by_symbol: &[(Symbol, BTreeSet<LoanPackageId>)],
        index: &CampaignIndex,
    ) -> Vec<ResolvedOffer> {
        eligible_by_symbol
            .iter()
            .filter_map(|(symbol, eligible)| {
                select_account_minimum_rate(
                    symbol,
                    packages,
                    eligible,
                    &self.config.margin_account_type,
                    self.config.rate_ceiling,
                )
            })
            .map(|offer| enrich(offer, index))
            .collect()
    }

    /// Custody check, then eligibility, then the per-account package fan-out.
    ///
    /// Returns `None` when no symbol has eligible packages, in which case no
    /// account packages are fetched.
    #[allow(clippy::type_complexity)]
    fn investor_inputs(
        &self,
        account_no: Option<&AccountNo>,
        custody_code: &str,
        symbols: Option<BTreeSet<Symbol>>,
    ) -> Result<
        Option<(
            HashMap<AccountNo, Vec<AccountLoanPackage>>,
            Vec<(Symbol, BTreeSet<LoanPackageId>)>,
            CampaignIndex,
        )>,
        EngineError,
    > {
        let account_nos = resolve_accounts(self.sources.accounts.as_ref(), custody_code, account_no)?;
        if account_nos.is_empty() {
            return Ok(None);
        }

        let ctx = self.load_context()?;
        let symbols = symbols.unwrap_or_else(|| ctx.promoted_symbols(Audience::Retail));
        let eligible_by_symbol: Vec<(Symbol, BTreeSet<LoanPackageId>)> = symbols
            .into_iter()
            .map(|s| {
                let ids = ctx.eligible_ids(&s, Audience::Retail);
                (s, ids)
            })
            .filter(|(_, ids)| !ids.is_empty())
            .collect();
        if eligible_by_symbol.is_empty() {
            return Ok(None);
        }

        let packages =
            fetch_account_packages(&self.fan_out, self.sources.accounts.as_ref(), &account_nos)?;
        let index = CampaignIndex::build(&ctx.campaigns, Audience::Retail);
        Ok(Some((packages, eligible_by_symbol, index)))
    }

    /// Minimum-rate offer for `symbol` per account of the custody code.
    pub fn promotion_loan_package_by_symbol(
        &self,
        symbol: &str,
        account_no: Option<&AccountNo>,
        custody_code: &str,
    ) -> Result<HashMap<AccountNo, ResolvedOffer>, EngineError> {
        let single: BTreeSet<Symbol> = [symbol.to_string()].into_iter().collect();
        let Some((packages, eligible_by_symbol, index)) =
            self.investor_inputs(account_no, custody_code, Some(single))?
        else {
            return Ok(HashMap::new());
        };

        let offers: HashMap<AccountNo, ResolvedOffer> = packages
            .into_iter()
            .filter_map(|(account, pkgs)| {
                self.account_offers(&pkgs, &eligible_by_symbol, &index)
                    .into_iter()
                    .next()
                    .map(|offer| (account, offer))
            })
            .collect();
        tracing::info!(symbol, custody_code, accounts = offers.len(), "resolved offer by symbol");
        Ok(offers)
    }

    /// Catalog-wide minimum-rate offer for one symbol.
    pub fn public_promotion_loan_package_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<ResolvedOffer>, EngineError> {
        let ctx = self.load_context()?;
        let index = CampaignIndex::build(&ctx.campaigns, Audience::Public);
        let offer = self.public_offer(&ctx, symbol, &index)?;
        tracing::info!(symbol, found = offer.is_some(), "resolved public offer");
        Ok(offer)
    }

    /// Catalog-wide offers for every promoted symbol, one entry per package.
    pub fn public_promotion_loan_packages(&self) -> Result<Vec<GroupedPackage>, EngineError> {
        let ctx = self.load_context()?;
        let index = CampaignIndex::build(&ctx.campaigns, Audience::Public);
        let symbols: Vec<Symbol> = ctx.promoted_symbols(Audience::Public).into_iter().collect();

        let offers = self
            .fan_out
            .collect_some(&symbols, |symbol| self.public_offer(&ctx, symbol, &index))?;
        let grouped = group_by_package(offers);
        tracing::info!(symbols = symbols.len(), packages = grouped.len(), "resolved public offers");
        Ok(grouped)
    }

    /// Every promoted symbol's offer for each account, sorted by symbol.
    pub fn investor_promotion_loan_packages(
        &self,
        account_no: Option<&AccountNo>,
        custody_code: &str,
    ) -> Result<HashMap<AccountNo, Vec<ResolvedOffer>>, EngineError> {
        let Some((packages, eligible_by_symbol, index)) =
            self.investor_inputs(account_no, custody_code, None)?
        else {
            return Ok(HashMap::new());
        };

        let offers: HashMap<AccountNo, Vec<ResolvedOffer>> = packages
            .into_iter()
            .filter_map(|(account, pkgs)| {
                let offers = self.account_offers(&pkgs, &eligible_by_symbol, &index);
                (!offers.is_empty()).then_some((account, offers))
            })
            .collect();
        tracing::info!(custody_code, accounts = offers.len(), "resolved investor offers");
        Ok(offers)
    }

    /// Each account's offers grouped by loan package, optionally for one symbol.
    pub fn promotion_loan_packages(
        &self,
        account_no: Option<&AccountNo>,
        custody_code: &str,
        symbol: Option<&str>,
    ) -> Result<HashMap<AccountNo, Vec<GroupedPackage>>, EngineError> {
        let symbols = symbol.map(|s| [s.to_string()].into_iter().collect());
        let Some((packages, eligible_by_symbol, index)) =
            self.investor_inputs(account_no, custody_code, symbols)?
        else {
            return Ok(HashMap::new());
        };

        let grouped: HashMap<AccountNo, Vec<GroupedPackage>> = packages
            .into_iter()
            .filter_map(|(account, pkgs)| {
                let offers = self.account_offers(&pkgs, &eligible_by_symbol, &index);
                (!offers.is_empty()).then(|| (account, group_by_package(offers)))
            })
            .collect();
        tracing::info!(custody_code, accounts = grouped.len(), "resolved grouped packages");
        Ok(grouped)
    }

    /// Catalog-wide offers per (active campaign, symbol), tagged and grouped by package.
    pub fn public_promotion_loan_packages_with_campaigns(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<GroupedPackage>, EngineError> {
        let ctx = self.load_context()?;

        let tasks: Vec<CampaignTask<'_>> = ctx
            .campaigns
            .iter()
            .flat_map(|campaign| {
                campaign
                    .symbols_for(Audience::Public)
                    .into_iter()
                    .filter(move |s| symbol.map_or(true, |wanted| s == wanted))
                    .map(move |s| {
                        let eligible = campaign
                            .products
                            .iter()
                            .filter(|p| p.covers(&s, Audience::Public))
                            .map(|p| p.loan_package_id)
                            .collect();
                        CampaignTask {
                            campaign,
                            symbol: s,
                            eligible,
                        }
                    })
            })
            .collect();

        let offers = self.fan_out.collect_some(&tasks, |task| {
            let offer = resolve_catalog_offer(
                self.sources.catalog.as_ref(),
                &task.symbol,
                &task.eligible,
                self.config.rate_ceiling,
            )?;
            Ok(offer.map(|mut o| {
                o.campaign = Some(task.campaign.tag());
                o
            }))
        })?;
        let grouped = group_by_package(offers);
        tracing::info!(
            tasks = tasks.len(),
            packages = grouped.len(),
            "resolved campaign offers"
        );
        Ok(grouped)
    }
}
