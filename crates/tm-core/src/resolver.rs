//! Works out which discovered versions still need to run.

use crate::error::CoreResult;
use crate::history::HistoryStore;
use crate::version::Version;
use std::collections::BTreeSet;

/// Versions from `discovered` that are not in the ledger, ascending.
///
/// `discovered` must already be sorted and free of duplicates; the output
/// keeps its order. An empty input returns immediately without touching the
/// database.
pub fn resolve_pending(history: &HistoryStore<'_>, discovered: &[Version]) -> CoreResult<Vec<Version>> {
    if discovered.is_empty() {
        return Ok(Vec::new());
    }

    let candidates: BTreeSet<Version> = discovered.iter().copied().collect();
    let applied = history.applied_versions(&candidates)?;

    let pending: Vec<Version> = discovered
        .iter()
        .copied()
        .filter(|v| !applied.contains(v))
        .collect();

    log::debug!(
        "{} of {} discovered migrations already applied, {} pending",
        applied.len(),
        discovered.len(),
        pending.len()
    );
    Ok(pending)
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
