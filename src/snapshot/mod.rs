// src/snapshot/mod.rs

//! Package snapshots
//!
//! Snapshots are built in two phases:
//! - Listing: every project's package names are fetched and merged into a
//!   `PackageListing`, rejecting duplicate names on insertion
//! - Resolution: a `Resolver` fetches each package's history and records
//!   its current srcmd5, producing an immutable `Snapshot`
//!
//! Several listings can be resolved together so progress covers one
//! combined total for the whole run.

mod resolver;

pub use resolver::Resolver;

use crate::account::{Account, AccountRegistry, ProjectRef};
use crate::client::DocumentFetcher;
use crate::error::{Error, Result};
use crate::parsers::{current_checksum, parse_directory, parse_history};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tracing::{debug, info};

/// One package of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub project: String,
    pub name: String,
    pub account: Arc<Account>,
    /// srcmd5 of the current revision, None until resolved
    pub source_checksum: Option<String>,
}

impl Package {
    /// Create an unresolved package
    pub fn new(project: &str, name: &str, account: Arc<Account>) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
            account,
            source_checksum: None,
        }
    }

    /// Set the resolved checksum
    pub fn with_checksum(mut self, checksum: &str) -> Self {
        self.source_checksum = Some(checksum.to_string());
        self
    }
}

/// A project together with the account it is reachable under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    pub account: Arc<Account>,
    pub project: String,
}

impl ProjectSpec {
    pub fn new(account: Arc<Account>, project: &str) -> Self {
        Self {
            account,
            project: project.to_string(),
        }
    }

    /// Pair a parsed project reference with its account
    pub fn from_ref(registry: &AccountRegistry, reference: &ProjectRef) -> Result<Self> {
        let account = registry.resolve(reference)?;
        debug!("Project {} uses account {}", reference.project, account.api_url());
        Ok(Self::new(account, &reference.project))
    }
}

/// List a project's package names in the order the service returns them
pub fn list_packages<F>(fetcher: &F, account: &Account, project: &str) -> Result<Vec<String>>
where
    F: DocumentFetcher + ?Sized,
{
    let body = fetcher.get(account, &format!("/source/{}", project))?;
    let names = parse_directory(&body)?;
    info!("Listed {} packages in {}", names.len(), project);
    Ok(names)
}

/// srcmd5 of the highest-numbered revision in a package's history
pub fn resolve_current_checksum<F>(
    fetcher: &F,
    account: &Account,
    project: &str,
    package: &str,
) -> Result<String>
where
    F: DocumentFetcher + ?Sized,
{
    let body = fetcher.get(account, &format!("/source/{}/{}/_history", project, package))?;
    let revisions = parse_history(&body)?;

    let checksum = current_checksum(&revisions).ok_or_else(|| Error::NoRevisions {
        project: project.to_string(),
        package: package.to_string(),
    })?;

    debug!(
        "Resolved {}/{} to {} ({} revisions)",
        project,
        package,
        checksum,
        revisions.len()
    );
    Ok(checksum.to_string())
}

/// Listed packages of one or more projects, keyed by unique name
#[derive(Debug, Clone, Default)]
pub struct PackageListing {
    packages: BTreeMap<String, Package>,
}

impl PackageListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// List every project in order and merge the results
    pub fn from_projects<F>(fetcher: &F, specs: &[ProjectSpec]) -> Result<Self>
    where
        F: DocumentFetcher + ?Sized,
    {
        let mut listing = Self::new();
        for spec in specs {
            listing.add_project(fetcher, spec)?;
        }
        Ok(listing)
    }

    /// List one project and insert its packages; returns how many were added
    pub fn add_project<F>(&mut self, fetcher: &F, spec: &ProjectSpec) -> Result<usize>
    where
        F: DocumentFetcher + ?Sized,
    {
        let names = list_packages(fetcher, &spec.account, &spec.project)?;
        let count = names.len();
        for name in names {
            self.insert(Package::new(&spec.project, &name, Arc::clone(&spec.account)))?;
        }
        Ok(count)
    }

    /// Insert a package, failing if its name is already present
    pub fn insert(&mut self, package: Package) -> Result<()> {
        match self.packages.entry(package.name.clone()) {
            Entry::Occupied(existing) => Err(Error::DuplicatePackage {
                name: package.name,
                existing_project: existing.get().project.clone(),
                project: package.project,
            }),
            Entry::Vacant(slot) => {
                slot.insert(package);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }
}

/// Resolved packages keyed by name, iterated in name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    packages: BTreeMap<String, Package>,
}

impl Snapshot {
    /// Build a snapshot from already resolved packages
    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Result<Self> {
        let mut listing = PackageListing::new();
        for package in packages {
            listing.insert(package)?;
        }
        Ok(Self::from_listing(listing))
    }

    pub(crate) fn from_listing(listing: PackageListing) -> Self {
        Self {
            packages: listing.packages,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }
}

/// List and resolve a set of projects into a single snapshot
pub fn build_snapshot<F>(fetcher: &F, specs: &[ProjectSpec], resolver: &Resolver<'_>) -> Result<Snapshot>
where
    F: DocumentFetcher + ?Sized,
{
    let listing = PackageListing::from_projects(fetcher, specs)?;
    resolver.resolve_one(fetcher, listing)
}
