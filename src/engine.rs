use crate::classify::{self, SheetFormat};
use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::extract;
use crate::model::SheetFile;
use crate::platform;
use crate::progress::ProgressReporter;
use crate::scanner;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, error, info, warn};

type CachedResult = Option<Arc<Vec<SheetFile>>>;

/// One entry of a deletion batch, naming a previously discovered file either
/// by its derived id or by its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    Id(String),
    Path(PathBuf),
}

impl fmt::Display for DeleteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteRequest::Id(id) => write!(f, "id '{}'", id),
            DeleteRequest::Path(path) => write!(f, "path '{}'", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeletionFailure {
    pub request: String,
    pub reason: String,
}

/// Per-request outcome of a deletion batch. Failures never abort the batch.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<DeletionFailure>,
}

/// Drives the scan pipeline and owns the memoized result of the last scan.
///
/// The cache holds exactly one result at a time, shared out behind an Arc and
/// replaced wholesale on recomputation. Holding the mutex across computation
/// serializes concurrent first reads and deletion batches, so at most one
/// scan runs at a time.
pub struct ScanEngine {
    config: AppConfig,
    cache: Mutex<CachedResult>,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
        }
    }

    /// Returns the scan result, computing it on the first call and serving
    /// the memoized value afterwards until a deletion batch refreshes it.
    pub fn results(
        &self,
        reporter: &dyn ProgressReporter,
    ) -> Result<Arc<Vec<SheetFile>>, Error> {
        let mut guard = self.lock_cache()?;
        if let Some(records) = guard.as_ref() {
            debug!("Serving {} records from cache", records.len());
            return Ok(Arc::clone(records));
        }
        let records = Arc::new(self.perform_scan(reporter)?);
        *guard = Some(Arc::clone(&records));
        Ok(records)
    }

    /// Removes the requested files from disk, then refreshes the cache with a
    /// fresh full scan. Each deletion is independent: a missing file or a
    /// permission error is reported and the rest of the batch proceeds. The
    /// rescan happens regardless of how many deletions succeeded.
    pub fn delete_files(
        &self,
        requests: &[DeleteRequest],
        reporter: &dyn ProgressReporter,
    ) -> Result<DeletionReport, Error> {
        info!("Deleting {} requested file(s)", requests.len());
        let mut guard = self.lock_cache()?;

        // Resolving an id needs a record list; on a cold cache, scan first.
        if guard.is_none() && requests.iter().any(|r| matches!(r, DeleteRequest::Id(_))) {
            *guard = Some(Arc::new(self.perform_scan(reporter)?));
        }

        let mut report = DeletionReport::default();
        for request in requests {
            let resolved = match request {
                DeleteRequest::Path(path) => Some(path.clone()),
                DeleteRequest::Id(id) => guard.as_ref().and_then(|records| {
                    records
                        .iter()
                        .find(|record| record.id() == *id)
                        .map(|record| record.full_path.clone())
                }),
            };

            let Some(path) = resolved else {
                warn!("No discovered file matches {}", request);
                report.failed.push(DeletionFailure {
                    request: request.to_string(),
                    reason: "no discovered file matches this id".to_string(),
                });
                continue;
            };

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted {}", path.display());
                    report.deleted.push(path);
                }
                Err(err) => {
                    error!("Failed to delete '{}': {}", path.display(), err);
                    report.failed.push(DeletionFailure {
                        request: request.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        *guard = Some(Arc::new(self.perform_scan(reporter)?));
        info!(
            "Deletion batch done: {} deleted, {} failed",
            report.deleted.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, CachedResult>, Error> {
        self.cache
            .lock()
            .map_err(|e| Error::Cache(format!("Failed to lock result cache: {}", e)))
    }

    /// The directories a scan starts from: the configured override when one
    /// is set, otherwise the machine's filesystem roots.
    fn scan_roots(&self) -> Result<Vec<PathBuf>, Error> {
        if self.config.root_paths.is_empty() {
            let roots = platform::enumerate_roots()
                .map_err(|e| Error::RootEnumeration(e.to_string()))?;
            if roots.is_empty() {
                return Err(Error::RootEnumeration("no roots reported".to_string()));
            }
            Ok(roots)
        } else {
            let non_overlapping =
                config::non_overlapping_directories(self.config.root_paths.clone());
            Ok(non_overlapping.into_iter().map(PathBuf::from).collect())
        }
    }

    /// Full pipeline: roots → walk → classify → extract. Walking is
    /// sequential so discovery order is stable; author extraction fans out
    /// across files, with the output order preserved.
    fn perform_scan(&self, reporter: &dyn ProgressReporter) -> Result<Vec<SheetFile>, Error> {
        let roots = self.scan_roots()?;
        info!("Scanning roots: {:?}", roots);
        let ignore_patterns = scanner::compile_ignore_patterns(&self.config.ignore_patterns);

        reporter.on_walk_start();
        let walk_start = Instant::now();
        let mut candidates: Vec<(PathBuf, SheetFormat)> = Vec::new();
        for root in &roots {
            let root_label = root.display().to_string();
            for path in scanner::walk_root(root, &ignore_patterns) {
                if let Some(format) = classify::classify(&path) {
                    debug!("Found candidate {}", path.display());
                    candidates.push((path, format));
                    reporter.on_walk_progress(candidates.len(), &root_label);
                }
            }
        }
        let walk_duration = walk_start.elapsed();
        reporter.on_walk_complete(candidates.len(), walk_duration.as_secs_f64());
        debug!(
            "Walk completed in {:.2}s — {} candidate files",
            walk_duration.as_secs_f64(),
            candidates.len(),
        );

        reporter.on_extract_start(candidates.len());
        let extract_start = Instant::now();
        let total = candidates.len();
        let done = AtomicUsize::new(0);
        let records: Vec<SheetFile> = candidates
            .par_iter()
            .map(|(path, format)| {
                let author = match extract::read_author(path, *format) {
                    Ok(author) => author,
                    Err(err) => {
                        debug!("No author extracted from {}: {}", path.display(), err);
                        None
                    }
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_extract_progress(finished, total);
                SheetFile::new(path.clone(), author)
            })
            .collect();
        let extract_duration = extract_start.elapsed();

        let with_author = records.iter().filter(|r| r.author.is_some()).count();
        reporter.on_extract_complete(with_author, extract_duration.as_secs_f64());
        info!(
            "Scan complete: {} spreadsheet files, {} with an author ({:.2}s walk, {:.2}s extract)",
            records.len(),
            with_author,
            walk_duration.as_secs_f64(),
            extract_duration.as_secs_f64(),
        );

        Ok(records)
    }
}
