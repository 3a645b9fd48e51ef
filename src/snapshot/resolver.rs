// src/snapshot/resolver.rs

//! Checksum resolution across listings

use super::{Package, PackageListing, Snapshot, resolve_current_checksum};
use crate::client::DocumentFetcher;
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use rayon::prelude::*;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Resolves the current checksum of every listed package
///
/// With `jobs <= 1` packages are resolved one at a time, in listing order.
/// Larger values use a thread pool of exactly `jobs` workers. Any failure
/// aborts the whole resolution.
pub struct Resolver<'a> {
    jobs: usize,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Resolver<'a> {
    /// Sequential resolver reporting to `progress`
    pub fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self { jobs: 1, progress }
    }

    /// Allow up to `jobs` concurrent history requests
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Resolve all listings together, returning one snapshot per listing
    ///
    /// Progress covers the combined total of every listing, in the order given.
    pub fn resolve<F>(&self, fetcher: &F, mut listings: Vec<PackageListing>) -> Result<Vec<Snapshot>>
    where
        F: DocumentFetcher + ?Sized,
    {
        self.resolve_in_place(fetcher, &mut listings)?;
        Ok(listings.into_iter().map(Snapshot::from_listing).collect())
    }

    /// Resolve a single listing
    pub fn resolve_one<F>(&self, fetcher: &F, listing: PackageListing) -> Result<Snapshot>
    where
        F: DocumentFetcher + ?Sized,
    {
        let mut listings = [listing];
        self.resolve_in_place(fetcher, &mut listings)?;
        let [listing] = listings;
        Ok(Snapshot::from_listing(listing))
    }

    fn resolve_in_place<F>(&self, fetcher: &F, listings: &mut [PackageListing]) -> Result<()>
    where
        F: DocumentFetcher + ?Sized,
    {
        let total: usize = listings.iter().map(PackageListing::len).sum();
        info!("Resolving {} packages with {} job(s)", total, self.jobs);
        if total == 0 {
            return Ok(());
        }

        let tracker = CompletionTracker::new(total, self.progress);
        let pending: Vec<&mut Package> = listings
            .iter_mut()
            .flat_map(|listing| listing.packages.values_mut())
            .collect();

        if self.jobs <= 1 {
            for package in pending {
                resolve_package(fetcher, package)?;
                tracker.complete();
            }
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create thread pool: {}", e)))?;

        pool.install(|| {
            pending.into_par_iter().try_for_each(|package| {
                resolve_package(fetcher, package)?;
                tracker.complete();
                Ok::<(), Error>(())
            })
        })
    }
}

fn resolve_package<F>(fetcher: &F, package: &mut Package) -> Result<()>
where
    F: DocumentFetcher + ?Sized,
{
    let checksum = resolve_current_checksum(fetcher, &package.account, &package.project, &package.name)?;
    package.source_checksum = Some(checksum);
    Ok(())
}

/// Completed-package counter shared by all workers
///
/// The increment and the progress call happen under one lock so reporters
/// always observe 1, 2, ... total in order.
struct CompletionTracker<'a> {
    started: Instant,
    total: usize,
    completed: Mutex<usize>,
    progress: &'a dyn ProgressReporter,
}

impl<'a> CompletionTracker<'a> {
    fn new(total: usize, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            started: Instant::now(),
            total,
            completed: Mutex::new(0),
            progress,
        }
    }

    fn complete(&self) {
        let mut completed = self
            .completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *completed += 1;
        debug!("Resolved {}/{}", *completed, self.total);
        self.progress
            .report(self.started.elapsed(), *completed, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::super::ProjectSpec;
    use super::super::testing::FakeService;
    use super::*;
    use crate::account::Account;
    use crate::progress::NoProgress;
    use std::sync::Arc;
    use std::time::Duration;

    /// Records every (completed, total) pair it is given
    #[derive(Default)]
    struct RecordingProgress {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, _elapsed: Duration, completed: usize, total: usize) {
            self.calls.lock().unwrap().push((completed, total));
        }
    }

    fn fixture() -> (FakeService, Vec<PackageListing>) {
        let account = Arc::new(Account::anonymous("https://api.example.org"));
        let service = FakeService::new()
            .project(&account, "Devel:A", &[("a1", "h1"), ("a2", "h2")])
            .project(&account, "Devel:B", &[("b1", "h3")])
            .project(&account, "Factory", &[("a1", "h1"), ("c1", "h4")]);

        let devel = PackageListing::from_projects(
            &service,
            &[
                ProjectSpec::new(Arc::clone(&account), "Devel:A"),
                ProjectSpec::new(Arc::clone(&account), "Devel:B"),
            ],
        )
        .unwrap();
        let factory =
            PackageListing::from_projects(&service, &[ProjectSpec::new(account, "Factory")]).unwrap();

        (service, vec![devel, factory])
    }

    #[test]
    fn test_progress_covers_combined_total() {
        let (service, listings) = fixture();
        let progress = RecordingProgress::default();

        let snapshots = Resolver::new(&progress).resolve(&service, listings).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].len(), 3);
        assert_eq!(snapshots[1].len(), 2);

        let calls = progress.calls.lock().unwrap();
        assert_eq!(*calls, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn test_every_package_resolved() {
        let (service, listings) = fixture();
        let progress = NoProgress;

        let snapshots = Resolver::new(&progress).resolve(&service, listings).unwrap();
        for snapshot in &snapshots {
            assert!(snapshot.iter().all(|p| p.source_checksum.is_some()));
        }
        assert_eq!(snapshots[1].get("c1").unwrap().source_checksum.as_deref(), Some("h4"));
    }

    #[test]
    fn test_parallel_resolution_is_monotonic() {
        let (service, listings) = fixture();
        let progress = RecordingProgress::default();

        let resolver = Resolver::new(&progress).with_jobs(4);
        assert_eq!(resolver.jobs(), 4);
        let snapshots = resolver.resolve(&service, listings).unwrap();
        assert_eq!(snapshots[0].get("b1").unwrap().source_checksum.as_deref(), Some("h3"));

        let completed: Vec<usize> = progress.calls.lock().unwrap().iter().map(|c| c.0).collect();
        assert_eq!(completed, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_packages_reports_nothing() {
        let progress = RecordingProgress::default();
        let service = FakeService::new();

        let snapshots = Resolver::new(&progress)
            .resolve(&service, vec![PackageListing::new(), PackageListing::new()])
            .unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(Snapshot::is_empty));
        assert!(progress.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_aborts_run() {
        let account = Arc::new(Account::anonymous("https://api.example.org"));
        let service = FakeService::new()
            .document(&account, "/source/P", "<directory><entry name=\"a\"/><entry name=\"b\"/></directory>")
            .document(
                &account,
                "/source/P/a/_history",
                "<revisionlist><revision rev=\"1\"><srcmd5>aa</srcmd5></revision></revisionlist>",
            );
        let listing = PackageListing::from_projects(&service, &[ProjectSpec::new(account, "P")]).unwrap();

        for jobs in [1, 3] {
            let progress = NoProgress;
            let result = Resolver::new(&progress)
                .with_jobs(jobs)
                .resolve(&service, vec![listing.clone()]);
            assert!(matches!(result, Err(Error::RemoteFetch { .. })));
        }
    }

    #[test]
    fn test_resolve_one() {
        let (service, mut listings) = fixture();
        let factory = listings.pop().unwrap();
        let progress = RecordingProgress::default();

        let snapshot = Resolver::new(&progress).resolve_one(&service, factory).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a1").unwrap().source_checksum.as_deref(), Some("h1"));
        assert_eq!(*progress.calls.lock().unwrap(), vec![(1, 2), (2, 2)]);

        let empty = Resolver::new(&progress)
            .resolve_one(&service, PackageListing::new())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_jobs_floor_is_one() {
        let progress = NoProgress;
        assert_eq!(Resolver::new(&progress).with_jobs(0).jobs(), 1);
    }
}
