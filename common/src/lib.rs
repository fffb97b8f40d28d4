//! # corral-common
//!
//! Shared vocabulary of the corral workspace: the target model, acquisition
//! requests, the error taxonomy and the collaborator traits the acquisition
//! core is written against.
//!
//! * **[`target`]**: raw catalog records and validated targets.
//! * **[`request`]**: what a job asks for.
//! * **[`catalog`]** / **[`locker`]**: ports implemented by plugins.
//! * **[`error`]**: typed failures for every stage.

pub mod catalog;
pub mod config;
pub mod error;
pub mod job;
pub mod locker;
pub mod logging;
pub mod request;
pub mod target;
