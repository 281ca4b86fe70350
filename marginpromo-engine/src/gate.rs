//! Account eligibility gate and per-account minimum-rate selection.
//!
//! Only margin accounts receive offers. The gate runs before any rate
//! comparison: a non-margin account gets nothing, however cheap its packages.

use std::collections::BTreeSet;

use marginpromo_core::{AccountLoanPackage, LoanPackageId, PackageSummary, ResolvedOffer};

use crate::selector::MinimumRate;

/// True iff at least one package carries the margin type tag.
pub fn is_margin_account(packages: &[AccountLoanPackage], margin_type: &str) -> bool {
    packages.iter().any(|p| p.has_type(margin_type))
}

/// The cheapest product for `symbol` among the account's eligible packages.
///
/// The winning package is reduced to that single product.
pub fn select_account_minimum_rate(
    symbol: &str,
    account_packages: &[AccountLoanPackage],
    eligible: &BTreeSet<LoanPackageId>,
    margin_type: &str,
    rate_ceiling: f64,
) -> Option<ResolvedOffer> {
    if !is_margin_account(account_packages, margin_type) {
        return None;
    }

    let mut minimum = MinimumRate::new(rate_ceiling);
    for package in account_packages.iter().filter(|p| eligible.contains(&p.id)) {
        for product in package.products_for(symbol) {
            minimum.offer(ResolvedOffer::new(
                PackageSummary::from(package),
                product.clone(),
            ));
        }
    }
    minimum.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginpromo_core::{LoanProduct, ProductId};

    fn product(id: &str, symbol: &str, rate: f64) -> LoanProduct {
        LoanProduct {
            id: ProductId::new(id),
            symbol: symbol.into(),
            interest_rate: rate,
            ..LoanProduct::default()
        }
    }

    fn package(id: i64, package_type: &str, products: Vec<LoanProduct>) -> AccountLoanPackage {
        AccountLoanPackage {
            id: LoanPackageId(id),
            name: format!("package {id}"),
            package_type: package_type.into(),
            loan_basket_id: None,
            description: String::new(),
            loan_products: products,
        }
    }

    fn eligible(ids: &[i64]) -> BTreeSet<LoanPackageId> {
        ids.iter().map(|&i| LoanPackageId(i)).collect()
    }

    #[test]
    fn margin_gate_needs_one_margin_package() {
        let normal = package(1, "N", vec![]);
        let margin = package(2, "M", vec![]);
        assert!(!is_margin_account(&[normal.clone()], "M"));
        assert!(is_margin_account(&[normal, margin], "M"));
        assert!(!is_margin_account(&[], "M"));
    }

    #[test]
    fn non_margin_account_gets_nothing() {
        let packages = vec![package(1, "N", vec![product("A", "HPG", 0.01)])];
        assert!(select_account_minimum_rate("HPG", &packages, &eligible(&[1]), "M", 1.0).is_none());
    }

    #[test]
    fn picks_cheapest_eligible_product_and_reduces_package() {
        let packages = vec![
            package(1, "M", vec![product("A", "HPG", 0.12), product("B", "FPT", 0.05)]),
            package(2, "M", vec![product("C", "HPG", 0.10)]),
            package(3, "M", vec![product("D", "HPG", 0.02)]),
        ];
        let offer =
            select_account_minimum_rate("HPG", &packages, &eligible(&[1, 2]), "M", 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(2));
        assert_eq!(offer.loan_product.id, ProductId::new("C"));
        assert_eq!(offer.package.loan_type, "M");
    }

    #[test]
    fn no_matching_symbol_is_no_offer() {
        let packages = vec![package(1, "M", vec![product("A", "FPT", 0.12)])];
        assert!(select_account_minimum_rate("HPG", &packages, &eligible(&[1]), "M", 1.0).is_none());
    }

    #[test]
    fn non_margin_packages_still_compete_once_gate_passes() {
        let packages = vec![
            package(1, "M", vec![product("A", "HPG", 0.12)]),
            package(2, "N", vec![product("B", "HPG", 0.08)]),
        ];
        let offer =
            select_account_minimum_rate("HPG", &packages, &eligible(&[1, 2]), "M", 1.0).unwrap();
        assert_eq!(offer.package_id(), LoanPackageId(2));
    }
}
