//! # corral-plugins
//!
//! Concrete collaborators for the acquisition core.
//!
//! * **[`lockers`]**: [`InMemoryLocker`](lockers::InMemoryLocker) for a single
//!   process, [`NoopLocker`](lockers::NoopLocker) when targets are never shared.
//! * **[`catalogs`]**: [`StaticCatalog`](catalogs::StaticCatalog), a fixed list
//!   of records.

pub mod catalogs;
pub mod lockers;
