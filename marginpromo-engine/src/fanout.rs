//! Fan-out orchestrator — concurrent per-account and per-symbol resolution.
//!
//! Work runs on a private rayon pool (not the global one) sized by
//! `max_parallelism`; at most `min(inputs, max_parallelism)` tasks run at
//! once. Workers only return values. Aggregation happens in rayon's collect,
//! so no worker touches a shared map.
//!
//! Failure is fail-fast: collecting into `Result` stops handing out new work
//! once an error is seen, tasks already running finish and their output is
//! dropped, and the first error observed is returned. Result order carries no
//! meaning; callers sort when they need to.

use std::collections::HashMap;
use std::hash::Hash;

use rayon::prelude::*;

use marginpromo_core::{AccountLoanPackage, AccountNo, AccountSource};

use crate::error::{ops, EngineError};

pub struct FanOut {
    pool: rayon::ThreadPool,
}

impl FanOut {
    pub fn new(max_parallelism: usize) -> Result<Self, EngineError> {
        let max_parallelism = max_parallelism.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_parallelism)
            .thread_name(|i| format!("marginpromo-fanout-{i}"))
            .build()
            .map_err(|e| EngineError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Run `task` for every key concurrently and collect the results by key.
    pub fn per_key<K, V, F>(&self, keys: &[K], task: F) -> Result<HashMap<K, V>, EngineError>
    where
        K: Clone + Eq + Hash + Send + Sync,
        V: Send,
        F: Fn(&K) -> Result<V, EngineError> + Sync,
    {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        self.pool.install(|| {
            keys.par_iter()
                .map(|key| {
                    task(key).map(|value| (key.clone(), value)).map_err(|e| {
                        tracing::warn!(error = %e, "fan-out task failed");
                        e
                    })
                })
                .collect()
        })
    }

    /// Run `task` for every item concurrently, keeping the `Some` results.
    pub fn collect_some<T, R, F>(&self, items: &[T], task: F) -> Result<Vec<R>, EngineError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<Option<R>, EngineError> + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        self.pool.install(|| {
            items
                .par_iter()
                .filter_map(|item| {
                    task(item)
                        .map_err(|e| {
                            tracing::warn!(error = %e, "fan-out task failed");
                            e
                        })
                        .transpose()
                })
                .collect()
        })
    }
}

/// Accounts of a custody code, optionally narrowed to one requested account.
///
/// A requested account outside the custody code is `AccountNoInvalid`.
pub fn resolve_accounts(
    accounts: &dyn AccountSource,
    custody_code: &str,
    account_no: Option<&AccountNo>,
) -> Result<Vec<AccountNo>, EngineError> {
    let details = accounts
        .accounts_by_custody_code(custody_code)
        .map_err(EngineError::upstream(ops::GET_ACCOUNTS_BY_CUSTODY_CODE))?;
    let mut account_nos: Vec<AccountNo> = details.into_iter().map(|d| d.account_no).collect();
    account_nos.sort();
    account_nos.dedup();

    match account_no {
        None => Ok(account_nos),
        Some(requested) if account_nos.contains(requested) => Ok(vec![requested.clone()]),
        Some(requested) => Err(EngineError::AccountNoInvalid {
            account_no: requested.clone(),
            custody_code: custody_code.to_string(),
        }),
    }
}

/// Fetch every account's assigned loan packages concurrently.
pub fn fetch_account_packages(
    fan_out: &FanOut,
    accounts: &dyn AccountSource,
    account_nos: &[AccountNo],
) -> Result<HashMap<AccountNo, Vec<AccountLoanPackage>>, EngineError> {
    fan_out.per_key(account_nos, |account_no| {
        accounts
            .account_loan_packages(account_no)
            .map_err(EngineError::upstream(ops::GET_ACCOUNT_LOAN_PACKAGES))
    })
}
