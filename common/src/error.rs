//! Error taxonomy shared by every corral crate.
//!
//! Catalog errors abort a whole load. Acquisition errors carry enough context
//! (counts, ids, raw values) to be diagnosed without querying the catalog again.

use std::fmt;

use thiserror::Error;

use crate::job::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Validation failures while turning raw catalog rows into targets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("record #{index} has an empty target id (name: {name:?}, ipv4: {ipv4:?}, ipv6: {ipv6:?})")]
    MalformedRecord {
        index: usize,
        name: String,
        ipv4: String,
        ipv6: String,
    },

    #[error("invalid non-empty {family} address \"{value}\" for target {id}")]
    InvalidAddress {
        id: String,
        family: AddressFamily,
        value: String,
    },

    #[error("target id {id} appears again at record #{index}")]
    DuplicateId { id: String, index: usize },
}

/// Rejections raised while validating an acquisition request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("name prefix #{index} cannot be empty if specified")]
    EmptyPrefix { index: usize },

    #[error("minimum device count {min} exceeds the maximum {max}")]
    InvertedBounds { min: usize, max: usize },
}

/// Failures reported by a locker backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockerError {
    /// The deadline passed. `granted` lists ids already reserved for the job.
    #[error("lock deadline exceeded with {} target(s) granted", .granted.len())]
    Timeout { granted: Vec<String> },

    /// Cancellation was observed. `granted` lists ids already reserved for the job.
    #[error("lock attempt cancelled with {} target(s) granted", .granted.len())]
    Cancelled { granted: Vec<String> },

    #[error("locker backend failure: {0}")]
    Backend(String),
}

/// Unlock calls that failed while releasing a partial reservation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to release {} of {attempted} lock(s): {}", .failures.len(), describe_failures(.failures))]
pub struct UnwindError {
    pub attempted: usize,
    pub failures: Vec<(String, LockerError)>,
}

impl UnwindError {
    /// Target ids whose release failed.
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(id, _)| id.as_str())
    }
}

fn describe_failures(failures: &[(String, LockerError)]) -> String {
    failures
        .iter()
        .map(|(id, err)| format!("{id}: {err}"))
        .collect::<Vec<String>>()
        .join("; ")
}

/// Locker replies that break the try-lock contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("locker reported unknown target {0}")]
    UnknownTarget(String),

    #[error("locker reported target {0} more than once")]
    DuplicateTarget(String),

    #[error("locker granted {got} targets, the limit was {limit}")]
    ExceedsLimit { limit: usize, got: usize },
}

/// Why an acquisition did not produce a locked target set.
///
/// Errors raised after locks were handed out keep the outcome of the
/// compensating release in `unwind`; a failed release never replaces the
/// primary error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("not enough candidates for job {job}: want {required}, got {available}")]
    InsufficientCandidates {
        job: JobId,
        required: usize,
        available: usize,
    },

    #[error("timed out locking targets for job {job} ({granted} granted before the deadline)")]
    LockTimeout {
        job: JobId,
        granted: usize,
        #[source]
        unwind: Option<UnwindError>,
    },

    #[error("acquisition for job {job} was cancelled ({granted} granted before cancellation)")]
    Cancelled {
        job: JobId,
        granted: usize,
        #[source]
        unwind: Option<UnwindError>,
    },

    #[error("can't lock enough targets for job {job}: required {required}, got {got}")]
    QuorumNotMet {
        job: JobId,
        required: usize,
        got: usize,
        #[source]
        unwind: Option<UnwindError>,
    },

    #[error("locker contract violated for job {job}: {violation}")]
    LockerInconsistency {
        job: JobId,
        violation: Inconsistency,
        #[source]
        unwind: Option<UnwindError>,
    },

    #[error("failed to lock targets for job {job}: {source}")]
    Locker {
        job: JobId,
        #[source]
        source: LockerError,
    },
}

impl AcquireError {
    /// Outcome of the compensating release, if one ran and failed.
    pub fn unwind_error(&self) -> Option<&UnwindError> {
        match self {
            AcquireError::LockTimeout { unwind, .. }
            | AcquireError::Cancelled { unwind, .. }
            | AcquireError::QuorumNotMet { unwind, .. }
            | AcquireError::LockerInconsistency { unwind, .. } => unwind.as_ref(),
            AcquireError::InsufficientCandidates { .. } | AcquireError::Locker { .. } => None,
        }
    }
}
