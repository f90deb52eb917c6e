//! Concurrent existence checks for a set of referenced identifiers.
//!
//! Each identifier is checked on its own task. Results flow back over a
//! channel sized to the number of checks, so a task never blocks on send
//! even if the caller has gone away. The caller always waits for every
//! check before answering; dropping the caller's future does not cancel
//! checks already spawned.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{EngineError, Result};

/// Verifies that every identifier exists.
///
/// Duplicates are checked once. Returns the first failure to arrive, which
/// depends on completion order. A `false` answer becomes a not-found error
/// naming `role`; a check that errors becomes an internal error.
pub async fn verify_all_exist<Id, F, Fut>(ids: &[Id], role: &'static str, exists: F) -> Result<()>
where
    Id: Copy + Eq + Hash + Display + Send + 'static,
    F: Fn(Id) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = document_store::Result<bool>> + Send + 'static,
{
    let outcomes = fan_out(ids, role, exists).await;
    match outcomes.into_iter().find_map(|(_, outcome)| outcome.err()) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Like [`verify_all_exist`] but reports every failure, ordered by the
/// position of the identifier in `ids`.
pub async fn verify_all_exist_collect<Id, F, Fut>(
    ids: &[Id],
    role: &'static str,
    exists: F,
) -> std::result::Result<(), Vec<EngineError>>
where
    Id: Copy + Eq + Hash + Display + Send + 'static,
    F: Fn(Id) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = document_store::Result<bool>> + Send + 'static,
{
    let mut failures: Vec<(usize, EngineError)> = fan_out(ids, role, exists)
        .await
        .into_iter()
        .filter_map(|(index, outcome)| outcome.err().map(|err| (index, err)))
        .collect();

    if failures.is_empty() {
        return Ok(());
    }
    failures.sort_by_key(|(index, _)| *index);
    Err(failures.into_iter().map(|(_, err)| err).collect())
}

/// Runs one check per distinct identifier and returns `(index, outcome)`
/// pairs in completion order.
async fn fan_out<Id, F, Fut>(ids: &[Id], role: &'static str, exists: F) -> Vec<(usize, Result<()>)>
where
    Id: Copy + Eq + Hash + Display + Send + 'static,
    F: Fn(Id) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = document_store::Result<bool>> + Send + 'static,
{
    let mut seen = HashSet::with_capacity(ids.len());
    let checks: Vec<(usize, Id)> = ids
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, id)| seen.insert(*id))
        .collect();

    if checks.is_empty() {
        return Vec::new();
    }

    metrics::counter!("validation_fanout_checks_total", "role" => role)
        .increment(checks.len() as u64);

    let exists = Arc::new(exists);
    let (tx, mut rx) = mpsc::channel(checks.len());

    for (index, id) in checks.iter().copied() {
        let tx = tx.clone();
        let exists = Arc::clone(&exists);
        tokio::spawn(async move {
            let outcome = match exists(id).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(EngineError::not_found(role, id)),
                Err(e) => Err(EngineError::Store(e)),
            };
            // The receiver may already be gone; nothing left to report to.
            let _ = tx.send((index, outcome)).await;
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(checks.len());
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }

    // A task that panicked never reported; surface it instead of passing.
    if outcomes.len() < checks.len() {
        let reported: HashSet<usize> = outcomes.iter().map(|(index, _)| *index).collect();
        for (index, id) in checks {
            if !reported.contains(&index) {
                tracing::error!(%id, role, "existence check aborted");
                outcomes.push((
                    index,
                    Err(EngineError::Aborted(format!("existence check for {role} {id}"))),
                ));
            }
        }
    }

    outcomes
}
