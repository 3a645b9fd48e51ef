// src/lib.rs

//! Factory Status
//!
//! Audits an Open Build Service tree: compares the current source checksum
//! of every package in one or more devel projects with the same-named
//! package in a Factory (integration) project.
//!
//! # Architecture
//!
//! - Accounts: API URL plus credentials, loaded from the osc configuration
//! - Listings: package names per project, merged and checked for duplicates
//! - Snapshots: listings with every package resolved to its current srcmd5
//! - Reconciliation: pure diff of a devel snapshot against a Factory snapshot

pub mod account;
pub mod client;
mod error;
pub mod parsers;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod snapshot;

pub use error::{Error, Result};
