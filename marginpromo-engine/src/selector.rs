//! Rate selector — the minimum-interest-rate product across both catalog generations.
//!
//! Candidates come from two basket shapes:
//! - flat (V2) baskets contribute one product for the requested symbol,
//!   priced by the loan package that points at the basket;
//! - tiered (V3) baskets contribute each listed product that is still in
//!   the currently-valid set, priced by its cheapest loan policy.
//!
//! The running minimum starts at the rate ceiling, so a rate must be strictly
//! below it to be offered at all. Equal rates are broken by lowest loan
//! package id, then lowest product id, which keeps the result independent of
//! fetch or map order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use marginpromo_core::{
    FinancialProductLoanPackage, LoanBasket, LoanBasketId, LoanPackageId, LoanProduct,
    LoanProductFilter, MarginCatalogSource, MarginProduct, PackageSummary, ProductId,
    ResolvedOffer,
};

use crate::error::{ops, EngineError};

/// Keep one package per basket: the cheapest, then the lowest id.
pub fn index_packages_by_basket(
    packages: Vec<FinancialProductLoanPackage>,
) -> HashMap<LoanBasketId, FinancialProductLoanPackage> {
    let mut by_basket: HashMap<LoanBasketId, FinancialProductLoanPackage> = HashMap::new();
    for package in packages {
        match by_basket.get(&package.loan_basket_id) {
            Some(current)
                if current
                    .interest_rate
                    .total_cmp(&package.interest_rate)
                    .then(current.id.cmp(&package.id))
                    != Ordering::Greater => {}
            _ => {
                by_basket.insert(package.loan_basket_id, package);
            }
        }
    }
    by_basket
}

/// Normalize a V3 product through its cheapest loan policy.
pub fn normalize_product(product: &MarginProduct) -> Option<LoanProduct> {
    product
        .cheapest_policy()
        .map(|policy| LoanProduct::from_margin_product(product, policy))
}

/// Total order used to pick among candidate offers.
pub fn compare_offers(a: &ResolvedOffer, b: &ResolvedOffer) -> Ordering {
    a.interest_rate()
        .total_cmp(&b.interest_rate())
        .then_with(|| a.package_id().cmp(&b.package_id()))
        .then_with(|| a.loan_product.id.cmp(&b.loan_product.id))
}

/// Running minimum bounded by the rate ceiling.
pub(crate) struct MinimumRate {
    ceiling: f64,
    best: Option<ResolvedOffer>,
}

impl MinimumRate {
    pub(crate) fn new(ceiling: f64) -> Self {
        Self { ceiling, best: None }
    }

    pub(crate) fn offer(&mut self, candidate: ResolvedOffer) {
        let rate = candidate.interest_rate();
        if rate.is_nan() || rate >= self.ceiling {
            return;
        }
        match &self.best {
            Some(current) if compare_offers(&candidate, current) != Ordering::Less => {}
            _ => self.best = Some(candidate),
        }
    }

    pub(crate) fn finish(self) -> Option<ResolvedOffer> {
        self.best
    }
}

/// Select the minimum-rate offer for `symbol` among the given baskets.
///
/// Every flat basket with an eligible package competes at the package rate;
/// eligibility already tied the package to the symbol. Tiered products only
/// count when they match the symbol and their id is in `valid_products`.
pub fn select_minimum_rate(
    symbol: &str,
    packages_by_basket: &HashMap<LoanBasketId, FinancialProductLoanPackage>,
    baskets: &[LoanBasket],
    valid_products: &HashMap<ProductId, MarginProduct>,
    rate_ceiling: f64,
) -> Option<ResolvedOffer> {
    let mut minimum = MinimumRate::new(rate_ceiling);

    for basket in baskets {
        let Some(package) = packages_by_basket.get(&basket.id()) else {
            tracing::debug!(basket = %basket.id(), "basket has no eligible loan package");
            continue;
        };

        match basket {
            LoanBasket::Flat { .. } => {
                minimum.offer(ResolvedOffer::new(
                    PackageSummary::from(package),
                    LoanProduct::from_flat_package(package, symbol),
                ));
            }
            LoanBasket::Tiered { loan_products, .. } => {
                for product in loan_products {
                    if product.symbol != symbol {
                        continue;
                    }
                    if !valid_products.contains_key(&product.id) {
                        tracing::debug!(product = %product.id, symbol, "skipping stale product");
                        continue;
                    }
                    if let Some(normalized) = normalize_product(product) {
                        minimum.offer(ResolvedOffer::new(PackageSummary::from(package), normalized));
                    }
                }
            }
        }
    }

    minimum.finish()
}

/// Fetch the catalog for the eligible packages and select the minimum-rate offer.
///
/// Any lookup failure aborts the whole selection: a missing basket must never
/// make the result look cheaper than it is.
pub fn resolve_catalog_offer(
    catalog: &dyn MarginCatalogSource,
    symbol: &str,
    eligible: &BTreeSet<LoanPackageId>,
    rate_ceiling: f64,
) -> Result<Option<ResolvedOffer>, EngineError> {
    if eligible.is_empty() {
        return Ok(None);
    }

    let ids: Vec<LoanPackageId> = eligible.iter().copied().collect();
    let packages = catalog
        .loan_package_details(&ids)
        .map_err(EngineError::upstream(ops::GET_LOAN_PACKAGE_DETAILS))?;
    let packages: Vec<_> = packages
        .into_iter()
        .filter(|p| eligible.contains(&p.id))
        .collect();
    let packages_by_basket = index_packages_by_basket(packages);
    if packages_by_basket.is_empty() {
        return Ok(None);
    }

    let mut basket_ids: Vec<LoanBasketId> = packages_by_basket.keys().copied().collect();
    basket_ids.sort();
    let baskets = catalog
        .margin_baskets_by_ids(&basket_ids)
        .map_err(EngineError::upstream(ops::GET_MARGIN_BASKETS))?;

    let needs_valid_products = baskets.iter().any(LoanBasket::is_tiered);
    let valid_products: HashMap<ProductId, MarginProduct> = if needs_valid_products {
        catalog
            .loan_products(&LoanProductFilter::for_symbol(symbol))
            .map_err(EngineError::upstream(ops::GET_LOAN_PRODUCTS))?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect()
    } else {
        HashMap::new()
    };

    let offer = select_minimum_rate(
        symbol,
        &packages_by_basket,
        &baskets,
        &valid_products,
        rate_ceiling,
    );
    tracing::debug!(
        symbol,
        baskets = baskets.len(),
        valid_products = valid_products.len(),
        winner = ?offer.as_ref().map(|o| o.package_id()),
        "selected minimum rate"
    );
    Ok(offer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginpromo_core::{LoanPolicy, PolicyAssignment, RateBand};

    fn package(id: i64, basket: i64, rate: f64) -> FinancialProductLoanPackage {
        FinancialProductLoanPackage {
            id: LoanPackageId(id),
            loan_basket_id: LoanBasketId(basket),
            name: format!("package {id}"),
            interest_rate: rate,
            ..FinancialProductLoanPackage::default()
        }
    }

    fn margin_product(id: &str, symbol: &str, rates: &[f64]) -> MarginProduct {
        MarginProduct {
            id: ProductId::new(id),
            symbol: symbol.into(),
            loan_rate: RateBand::default(),
            loan_policies: rates
                .iter()
                .map(|&r| PolicyAssignment {
                    loan_policy: LoanPolicy {
                        interest_rate: r,
                        ..LoanPolicy::default()
                    },
                })
                .collect(),
        }
    }

    fn flat(id: i64, symbols: &[&str]) -> LoanBasket {
        LoanBasket::Flat {
            id: LoanBasketId(id),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn tiered(id: i64, products: Vec<MarginProduct>) -> LoanBasket {
        LoanBasket::Tiered {
            id: LoanBasketId(id),
            loan_products: products,
        }
    }

    fn valid(products: &[&MarginProduct]) -> HashMap<ProductId, MarginProduct> {
        products.iter().map(|p| (p.id.clone(), (*p).clone())).collect()
    }

    #[test]
    fn keeps_cheapest_package_per_basket() {
        let index = index_packages_by_basket(vec![
            package(1, 10, 0.12),
            package(2, 10, 0.09),
            package(3, 10, 0.09),
            package(4, 20, 0.15),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&LoanBasketId(10)].id, LoanPackageId(2));
        assert_eq!(index[&LoanBasketId(20)].id, LoanPackageId(4));
    }

    #[test]
    fn flat_only_picks_lowest_package_rate() {
        let packages = index_packages_by_basket(vec![package(1, 10, 0.12), package(2, 20, 0.08)]);
        let baskets = vec![flat(10, &["HPG"]), flat(20, &["HPG", "FPT"])];
        let offer = select_minimum_rate("HPG", &packages, &baskets, &HashMap::new(), 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(2));
        assert_eq!(offer.interest_rate(), 0.08);
        assert_eq!(offer.symbol(), "HPG");
    }

    #[test]
    fn flat_basket_competes_without_listing_symbol() {
        let packages = index_packages_by_basket(vec![package(1, 10, 0.05)]);
        let baskets = vec![flat(10, &["FPT"])];
        let offer = select_minimum_rate("HPG", &packages, &baskets, &HashMap::new(), 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(1));
        assert_eq!(offer.interest_rate(), 0.05);
        assert_eq!(offer.symbol(), "HPG");
    }

    #[test]
    fn tiered_uses_cheapest_policy() {
        let a = margin_product("A", "HPG", &[0.14, 0.11]);
        let packages = index_packages_by_basket(vec![package(1, 10, 0.5)]);
        let baskets = vec![tiered(10, vec![a.clone()])];
        let offer = select_minimum_rate("HPG", &packages, &baskets, &valid(&[&a]), 1.0).unwrap();
        assert_eq!(offer.interest_rate(), 0.11);
        assert_eq!(offer.loan_product.id, ProductId::new("A"));
        assert_eq!(offer.package_id(), LoanPackageId(1));
    }

    #[test]
    fn stale_product_is_skipped_even_when_cheapest() {
        let a = margin_product("A", "HPG", &[0.12]);
        let b = margin_product("B", "HPG", &[0.10]);
        let packages = index_packages_by_basket(vec![package(1, 10, 0.5)]);
        let baskets = vec![tiered(10, vec![a.clone(), b])];
        let offer = select_minimum_rate("HPG", &packages, &baskets, &valid(&[&a]), 1.0).unwrap();
        assert_eq!(offer.loan_product.id, ProductId::new("A"));
        assert_eq!(offer.interest_rate(), 0.12);
    }

    #[test]
    fn mixed_generations_compete() {
        let a = margin_product("A", "HPG", &[0.09]);
        let packages = index_packages_by_basket(vec![package(1, 10, 0.10), package(2, 20, 0.5)]);
        let baskets = vec![flat(10, &["HPG"]), tiered(20, vec![a.clone()])];
        let offer = select_minimum_rate("HPG", &packages, &baskets, &valid(&[&a]), 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(2));
        assert_eq!(offer.interest_rate(), 0.09);
    }

    #[test]
    fn rates_at_ceiling_are_no_offer() {
        let packages = index_packages_by_basket(vec![package(1, 10, 1.0)]);
        let baskets = vec![flat(10, &["HPG"])];
        assert!(select_minimum_rate("HPG", &packages, &baskets, &HashMap::new(), 1.0).is_none());
    }

    #[test]
    fn ties_break_on_package_then_product_id() {
        let a = margin_product("B", "HPG", &[0.1]);
        let b = margin_product("A", "HPG", &[0.1]);
        let packages = index_packages_by_basket(vec![package(5, 10, 0.1), package(3, 20, 0.5)]);
        let baskets = vec![flat(10, &["HPG"]), tiered(20, vec![a.clone(), b.clone()])];
        let offer =
            select_minimum_rate("HPG", &packages, &baskets, &valid(&[&a, &b]), 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(3));
        assert_eq!(offer.loan_product.id, ProductId::new("A"));
    }
}
