// src/reconcile.rs

//! Devel vs. Factory reconciliation
//!
//! A package needs updating when Factory lacks it or carries a different
//! source checksum. A Factory package is obsolete when no devel project
//! provides it. This is a pure function of the two snapshots.

use crate::snapshot::{Package, Snapshot};

/// Outcome of comparing a devel snapshot with a Factory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Devel packages missing from Factory or out of date, by (project, name)
    pub to_update: Vec<Package>,
    /// Factory packages with no devel project, by name
    pub to_remove: Vec<Package>,
}

impl Reconciliation {
    /// True when there is nothing to update and nothing to remove
    pub fn is_reconciled(&self) -> bool {
        self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Compare two snapshots
pub fn reconcile(devel: &Snapshot, factory: &Snapshot) -> Reconciliation {
    let mut to_update: Vec<Package> = devel
        .iter()
        .filter(|package| match factory.get(&package.name) {
            Some(existing) => existing.source_checksum != package.source_checksum,
            None => true,
        })
        .cloned()
        .collect();

    to_update.sort_by(|a, b| a.project.cmp(&b.project).then_with(|| a.name.cmp(&b.name)));

    // Snapshot iteration is already by name
    let to_remove = factory
        .iter()
        .filter(|package| !devel.contains(&package.name))
        .cloned()
        .collect();

    Reconciliation { to_update, to_remove }
}
