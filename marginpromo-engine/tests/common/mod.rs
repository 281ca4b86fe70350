//! Shared fixtures and source doubles for engine integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use marginpromo_core::{
    AccountDetail, AccountLoanPackage, AccountNo, AccountSource, Campaign, CampaignId,
    CampaignProduct, CampaignStatus, ConfigurationSource, FinancialProductLoanPackage, LoanBasket,
    LoanBasketId, LoanPackageId, LoanPolicy, LoanProduct, LoanProductFilter, MarginCatalogSource,
    MarginProduct, PolicyAssignment, ProductId, PromotionConfiguration, PromotionProduct,
    RateBand, Snapshot, SnapshotSource, SourceError,
};
use marginpromo_engine::{EngineConfig, PromotionService, Sources};

pub const CUSTODY: &str = "022C000001";
pub const OTHER_CUSTODY: &str = "022C000002";

pub fn set(symbols: &[&str]) -> BTreeSet<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

pub fn promotion(id: i64, retail: &[&str], non_retail: &[&str]) -> PromotionProduct {
    PromotionProduct {
        loan_package_id: LoanPackageId(id),
        retail_symbols: set(retail),
        non_retail_symbols: set(non_retail),
    }
}

pub fn campaign(
    id: i64,
    status: CampaignStatus,
    package: i64,
    symbols: &[&str],
    retail: &[&str],
) -> Campaign {
    Campaign {
        id: CampaignId(id),
        name: format!("Campaign {id}"),
        tag: format!("C{id}"),
        description: format!("Campaign {id} description"),
        status,
        products: vec![CampaignProduct {
            loan_package_id: LoanPackageId(package),
            symbols: set(symbols),
            retail_symbols: set(retail),
        }],
        created_at: None,
        updated_at: None,
    }
}

pub fn loan_package(id: i64, basket: i64, rate: f64) -> FinancialProductLoanPackage {
    FinancialProductLoanPackage {
        id: LoanPackageId(id),
        loan_basket_id: LoanBasketId(basket),
        name: format!("Package {id}"),
        loan_type: "MARGIN".into(),
        interest_rate: rate,
        ..FinancialProductLoanPackage::default()
    }
}

pub fn margin_product(id: &str, symbol: &str, policy_rates: &[f64]) -> MarginProduct {
    MarginProduct {
        id: ProductId::new(id),
        symbol: symbol.into(),
        loan_rate: RateBand {
            initial_rate: 0.5,
            maintenance_rate: 0.35,
            liquid_rate: 0.25,
        },
        loan_policies: policy_rates
            .iter()
            .map(|&rate| PolicyAssignment {
                loan_policy: LoanPolicy {
                    interest_rate: rate,
                    term: 90,
                    ..LoanPolicy::default()
                },
            })
            .collect(),
    }
}

pub fn flat_basket(id: i64, symbols: &[&str]) -> LoanBasket {
    LoanBasket::Flat {
        id: LoanBasketId(id),
        symbols: set(symbols),
    }
}

pub fn tiered_basket(id: i64, products: Vec<MarginProduct>) -> LoanBasket {
    LoanBasket::Tiered {
        id: LoanBasketId(id),
        loan_products: products,
    }
}

pub fn account(no: &str) -> AccountDetail {
    AccountDetail {
        account_no: AccountNo::new(no),
        custody_code: CUSTODY.into(),
        account_type: String::new(),
    }
}

pub fn account_product(id: &str, symbol: &str, rate: f64) -> LoanProduct {
    LoanProduct {
        id: ProductId::new(id),
        symbol: symbol.into(),
        interest_rate: rate,
        ..LoanProduct::default()
    }
}

pub fn account_package(id: i64, package_type: &str, products: Vec<LoanProduct>) -> AccountLoanPackage {
    AccountLoanPackage {
        id: LoanPackageId(id),
        name: format!("Package {id}"),
        package_type: package_type.into(),
        loan_basket_id: None,
        description: String::new(),
        loan_products: products,
    }
}

/// The shared scenario.
///
/// Public winners: FPT → package 1 (product C, 0.095), HPG → package 1
/// (product A, 0.12; product B at 0.10 is stale), VNM → package 2 (0.13),
/// MWG → package 3 (0.14).
///
/// Accounts of `CUSTODY`: 0001 and 0002 are margin accounts, 0003 is not.
pub fn scenario() -> Snapshot {
    let mut accounts = BTreeMap::new();
    accounts.insert(
        CUSTODY.to_string(),
        vec![account("0001"), account("0002"), account("0003")],
    );
    accounts.insert(OTHER_CUSTODY.to_string(), vec![account("0009")]);

    let mut account_loan_packages = BTreeMap::new();
    account_loan_packages.insert(
        AccountNo::new("0001"),
        vec![
            account_package(
                1,
                "M",
                vec![
                    account_product("A", "HPG", 0.12),
                    account_product("C", "FPT", 0.095),
                ],
            ),
            account_package(
                2,
                "M",
                vec![
                    account_product("2:HPG", "HPG", 0.13),
                    account_product("2:VNM", "VNM", 0.13),
                ],
            ),
        ],
    );
    account_loan_packages.insert(
        AccountNo::new("0002"),
        vec![account_package(
            2,
            "M",
            vec![
                account_product("2:HPG", "HPG", 0.105),
                account_product("2:VNM", "VNM", 0.13),
            ],
        )],
    );
    account_loan_packages.insert(
        AccountNo::new("0003"),
        vec![account_package(1, "N", vec![account_product("A", "HPG", 0.01)])],
    );

    Snapshot {
        promotion: PromotionConfiguration::new(vec![
            promotion(1, &["HPG"], &["FPT"]),
            promotion(2, &["HPG", "VNM"], &[]),
            promotion(3, &[], &["MWG"]),
        ]),
        campaigns: vec![
            campaign(1, CampaignStatus::Active, 1, &["HPG"], &["HPG"]),
            campaign(2, CampaignStatus::Active, 1, &["HPG"], &[]),
            campaign(3, CampaignStatus::Inactive, 2, &["VNM"], &["VNM"]),
        ],
        loan_packages: vec![
            loan_package(1, 10, 0.5),
            loan_package(2, 20, 0.13),
            loan_package(3, 30, 0.14),
        ],
        baskets: vec![
            tiered_basket(
                10,
                vec![
                    margin_product("A", "HPG", &[0.15, 0.12]),
                    margin_product("B", "HPG", &[0.10]),
                    margin_product("C", "FPT", &[0.095]),
                ],
            ),
            flat_basket(20, &["HPG", "VNM"]),
            flat_basket(30, &["MWG"]),
        ],
        loan_products: vec![
            margin_product("A", "HPG", &[0.15, 0.12]),
            margin_product("C", "FPT", &[0.095]),
        ],
        accounts,
        account_loan_packages,
    }
}

pub fn service_for(source: Arc<InstrumentedSource>, max_parallelism: usize) -> PromotionService {
    let config = EngineConfig {
        max_parallelism,
        ..EngineConfig::default()
    };
    PromotionService::new(Sources::shared(source), config).unwrap()
}

pub fn snapshot_service(snapshot: Snapshot) -> PromotionService {
    PromotionService::new(
        Sources::shared(Arc::new(SnapshotSource::new(snapshot))),
        EngineConfig::default(),
    )
    .unwrap()
}

/// Snapshot-backed source that counts calls, can delay account lookups,
/// and can fail chosen lookups.
pub struct InstrumentedSource {
    inner: SnapshotSource,
    pub configuration_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
    pub account_package_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    delay: Duration,
    failing_account: Option<AccountNo>,
    failing_baskets: bool,
}

impl InstrumentedSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: SnapshotSource::new(snapshot),
            configuration_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
            account_package_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
            failing_account: None,
            failing_baskets: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_account(mut self, account_no: &str) -> Self {
        self.failing_account = Some(AccountNo::new(account_no));
        self
    }

    pub fn failing_baskets(mut self) -> Self {
        self.failing_baskets = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.configuration_calls.load(Ordering::SeqCst)
            + self.catalog_calls.load(Ordering::SeqCst)
            + self.account_package_calls.load(Ordering::SeqCst)
    }
}

impl ConfigurationSource for InstrumentedSource {
    fn promotion_configuration(&self) -> Result<PromotionConfiguration, SourceError> {
        self.configuration_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.promotion_configuration()
    }

    fn campaigns(&self, status: CampaignStatus) -> Result<Vec<Campaign>, SourceError> {
        self.configuration_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.campaigns(status)
    }
}

impl MarginCatalogSource for InstrumentedSource {
    fn loan_package_details(
        &self,
        ids: &[LoanPackageId],
    ) -> Result<Vec<FinancialProductLoanPackage>, SourceError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.loan_package_details(ids)
    }

    fn margin_baskets_by_ids(&self, ids: &[LoanBasketId]) -> Result<Vec<LoanBasket>, SourceError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_baskets {
            return Err(SourceError::Unavailable("basket service down".into()));
        }
        self.inner.margin_baskets_by_ids(ids)
    }

    fn loan_products(&self, filter: &LoanProductFilter) -> Result<Vec<MarginProduct>, SourceError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.loan_products(filter)
    }
}

impl AccountSource for InstrumentedSource {
    fn accounts_by_custody_code(
        &self,
        custody_code: &str,
    ) -> Result<Vec<AccountDetail>, SourceError> {
        self.inner.accounts_by_custody_code(custody_code)
    }

    fn account_loan_packages(
        &self,
        account_no: &AccountNo,
    ) -> Result<Vec<AccountLoanPackage>, SourceError> {
        self.account_package_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_account.as_ref() == Some(account_no) {
            return Err(SourceError::Http {
                status: 503,
                message: format!("account {account_no} unavailable"),
            });
        }
        self.inner.account_loan_packages(account_no)
    }
}
