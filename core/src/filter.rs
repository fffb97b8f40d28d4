//! # Target Filter
//!
//! Turns a catalog snapshot into the candidate set of an acquisition.
//!
//! Validation is all-or-nothing: one malformed record or unparsable address
//! aborts the load, so a job never runs against a silently truncated catalog.
//! Blank records are the only rows dropped without an error. Target ids must
//! be unique across the whole snapshot, not just among the matching rows.

use std::collections::HashSet;

use corral_common::error::CatalogError;
use corral_common::target::{RawRecord, Target};

/// Validates `records` and keeps the targets matching `prefixes`.
///
/// With no prefixes every valid target passes. Otherwise a target passes when
/// the first label of its display name starts with at least one prefix
/// (case-sensitive). Targets without a display name never match a prefix.
pub fn filter_targets<I>(records: I, prefixes: &[String]) -> Result<Vec<Target>, CatalogError>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut targets = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let Some(target) = record.into_target(index)? else {
            continue;
        };

        if !seen.insert(target.id.clone()) {
            return Err(CatalogError::DuplicateId {
                id: target.id,
                index,
            });
        }

        if matches_prefixes(&target, prefixes) {
            targets.push(target);
        }
    }

    Ok(targets)
}

fn matches_prefixes(target: &Target, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }

    match target.first_label() {
        Some(label) => prefixes.iter().any(|prefix| label.starts_with(prefix.as_str())),
        None => false,
    }
}
