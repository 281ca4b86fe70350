//! Resolution output: normalized loan products, resolved offers and grouped packages.

use serde::{Deserialize, Serialize};

use super::account::AccountLoanPackage;
use super::campaign::CampaignTag;
use super::catalog::{FinancialProductLoanPackage, LoanPolicy, MarginProduct};
use super::ids::{LoanBasketId, LoanPackageId, ProductId};
use super::Symbol;

/// A loan product normalized across catalog generations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanProduct {
    pub id: ProductId,
    pub symbol: Symbol,
    pub interest_rate: f64,
    pub preferential_period: u32,
    pub preferential_interest_rate: f64,
    pub term: u32,
    pub allow_extend_loan_term: bool,
    pub allow_early_payment: bool,
    pub initial_rate: f64,
    pub maintenance_rate: f64,
    pub liquid_rate: f64,
}

impl LoanProduct {
    /// Normalize a V3 product using the given policy (normally its cheapest).
    pub fn from_margin_product(product: &MarginProduct, policy: &LoanPolicy) -> Self {
        Self {
            id: product.id.clone(),
            symbol: product.symbol.clone(),
            interest_rate: policy.interest_rate,
            preferential_period: policy.preferential_period,
            preferential_interest_rate: policy.preferential_interest_rate,
            term: policy.term,
            allow_extend_loan_term: policy.allow_extend_loan_term,
            allow_early_payment: policy.allow_early_payment,
            initial_rate: product.loan_rate.initial_rate,
            maintenance_rate: product.loan_rate.maintenance_rate,
            liquid_rate: product.loan_rate.liquid_rate,
        }
    }

    /// Synthesize the single product a flat (V2) package yields for `symbol`.
    pub fn from_flat_package(package: &FinancialProductLoanPackage, symbol: &str) -> Self {
        Self {
            id: ProductId::for_flat_basket(package.loan_basket_id, symbol),
            symbol: symbol.to_string(),
            interest_rate: package.interest_rate,
            preferential_period: package.preferential_period,
            preferential_interest_rate: package.preferential_interest_rate,
            term: package.term,
            allow_extend_loan_term: package.allow_extend_loan_term,
            allow_early_payment: package.allow_early_payment,
            initial_rate: package.initial_rate,
            maintenance_rate: package.maintenance_rate,
            liquid_rate: package.liquid_rate,
        }
    }
}

/// Package-level fields carried alongside a winning product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub id: LoanPackageId,
    pub name: String,
    pub loan_type: String,
    pub loan_basket_id: Option<LoanBasketId>,
    pub buying_fee_rate: f64,
    pub transfer_fee: f64,
    pub description: String,
}

impl From<&FinancialProductLoanPackage> for PackageSummary {
    fn from(p: &FinancialProductLoanPackage) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            loan_type: p.loan_type.clone(),
            loan_basket_id: Some(p.loan_basket_id),
            buying_fee_rate: p.buying_fee_rate,
            transfer_fee: p.transfer_fee,
            description: p.description.clone(),
        }
    }
}

impl From<&AccountLoanPackage> for PackageSummary {
    fn from(p: &AccountLoanPackage) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            loan_type: p.package_type.clone(),
            loan_basket_id: p.loan_basket_id,
            buying_fee_rate: 0.0,
            transfer_fee: 0.0,
            description: p.description.clone(),
        }
    }
}

/// The single winning package for a (symbol) or (account, symbol) pair,
/// reduced to exactly one loan product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOffer {
    pub package: PackageSummary,
    pub loan_product: LoanProduct,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CampaignTag>,
}

impl ResolvedOffer {
    pub fn new(package: PackageSummary, loan_product: LoanProduct) -> Self {
        Self {
            package,
            loan_product,
            campaign: None,
        }
    }

    pub fn package_id(&self) -> LoanPackageId {
        self.package.id
    }

    pub fn symbol(&self) -> &str {
        &self.loan_product.symbol
    }

    pub fn interest_rate(&self) -> f64 {
        self.loan_product.interest_rate
    }
}

/// One product inside a grouped package, with its campaign metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProductOffer {
    pub loan_product: LoanProduct,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CampaignTag>,
}

/// Offers regrouped so each distinct loan package appears once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedPackage {
    pub package: PackageSummary,
    pub campaign_products: Vec<CampaignProductOffer>,
}
