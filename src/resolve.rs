//! Image resolution ahead of layout.
//!
//! Steps carry opaque image references. Before emission every reference is
//! handed to an [`ImageResolver`]; the fetched bytes are validated and
//! attached, and failures are recorded on the reference so the emitter can
//! draw a placeholder. Resolution never fails the whole document.

use crate::error::{Error, Result};
use crate::model::{ImageRef, Sop, StepRecord};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of image bytes for step image references.
pub trait ImageResolver: Send + Sync {
    /// Fetch the encoded bytes behind `reference`.
    fn resolve(&self, reference: &str) -> Result<Vec<u8>>;
}

impl<R: ImageResolver + ?Sized> ImageResolver for &R {
    fn resolve(&self, reference: &str) -> Result<Vec<u8>> {
        (**self).resolve(reference)
    }
}

/// Loads images from the local filesystem.
///
/// Accepts plain paths and `file://` URLs; relative paths are joined to the
/// base directory. Network URLs are rejected.
#[derive(Debug, Clone)]
pub struct FsImageResolver {
    base_dir: PathBuf,
}

impl FsImageResolver {
    /// Create a resolver rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Base directory for relative references.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Filesystem path a reference points to.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let reference = reference.trim();
        let raw = match reference.split_once("://") {
            Some(("file", rest)) => rest,
            Some((scheme, _)) => {
                return Err(Error::ImageResolve {
                    reference: reference.to_string(),
                    reason: format!("unsupported scheme '{}'", scheme),
                })
            }
            None => reference,
        };

        if raw.is_empty() {
            return Err(Error::ImageResolve {
                reference: reference.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let path = Path::new(raw);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        })
    }
}

impl ImageResolver for FsImageResolver {
    fn resolve(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.path_for(reference)?;
        std::fs::read(&path).map_err(|e| Error::ImageResolve {
            reference: reference.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Serves images from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageResolver {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImageResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(reference.into(), bytes);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_image(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if no image is stored.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageResolver for MemoryImageResolver {
    fn resolve(&self, reference: &str) -> Result<Vec<u8>> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::ImageResolve {
                reference: reference.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// Skips image loading; every reference becomes a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageResolver for NoImages {
    fn resolve(&self, reference: &str) -> Result<Vec<u8>> {
        Err(Error::ImageResolve {
            reference: reference.to_string(),
            reason: "image loading disabled".to_string(),
        })
    }
}

/// Outcome counts of one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// References that were attempted
    pub attempted: usize,
    /// References now resolved
    pub resolved: usize,
    /// References now failed
    pub failed: usize,
}

impl ResolveSummary {
    /// Count the image states of `steps` after a pass.
    pub fn of(steps: &[StepRecord], attempted: usize) -> Self {
        let mut summary = Self {
            attempted,
            ..Self::default()
        };
        for image in steps.iter().filter_map(|s| s.image.as_ref()) {
            if image.is_resolved() {
                summary.resolved += 1;
            } else if !image.is_unresolved() {
                summary.failed += 1;
            }
        }
        summary
    }
}

/// Resolve every unresolved image reference of `steps`.
///
/// Fetches run on a dedicated pool of at most `max_in_flight` threads.
/// Output order equals input order; references that are already resolved or
/// failed are left untouched.
///
/// # Errors
/// Only when the thread pool cannot be created. Individual fetch failures
/// are recorded on the step's [`ImageRef`].
pub fn resolve_images<R: ImageResolver + ?Sized>(
    steps: &[StepRecord],
    resolver: &R,
    max_in_flight: usize,
) -> Result<Vec<StepRecord>> {
    let attempted = pending_count(steps);
    if attempted == 0 {
        return Ok(steps.to_vec());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_in_flight.max(1))
        .thread_name(|i| format!("sopdoc-image-{}", i))
        .build()
        .map_err(|e| Error::Other(format!("image pool: {}", e)))?;

    let resolved: Vec<StepRecord> = pool.install(|| {
        steps
            .par_iter()
            .map(|step| resolve_step(step, resolver))
            .collect()
    });

    let summary = ResolveSummary::of(&resolved, attempted);
    log::debug!(
        "resolved {} of {} images ({} failed)",
        summary.resolved,
        summary.attempted,
        summary.failed
    );
    Ok(resolved)
}

/// Resolve the images of a whole SOP, returning a new SOP.
///
/// Steps without a title are left out of the result; layout drops them
/// anyway, so their images are never fetched.
pub fn resolve_sop<R: ImageResolver + ?Sized>(
    sop: &Sop,
    resolver: &R,
    max_in_flight: usize,
) -> Result<Sop> {
    let titled: Vec<StepRecord> = sop
        .steps
        .iter()
        .filter(|s| s.has_title())
        .cloned()
        .collect();
    Ok(Sop {
        id: sop.id.clone(),
        metadata: sop.metadata.clone(),
        steps: resolve_images(&titled, resolver, max_in_flight)?,
    })
}

fn pending_count(steps: &[StepRecord]) -> usize {
    steps
        .iter()
        .filter(|s| s.image.as_ref().is_some_and(ImageRef::is_unresolved))
        .count()
}

fn resolve_step<R: ImageResolver + ?Sized>(step: &StepRecord, resolver: &R) -> StepRecord {
    let mut step = step.clone();
    if let Some(image) = step.image.as_mut().filter(|i| i.is_unresolved()) {
        let fetched = resolver.resolve(&image.source);
        apply(image, fetched);
    }
    step
}

fn apply(image: &mut ImageRef, fetched: Result<Vec<u8>>) {
    match fetched {
        Ok(bytes) => {
            image.attach(bytes);
            if !image.is_resolved() {
                log::warn!("image '{}' is not a supported image format", image.source);
            }
        }
        Err(e) => {
            log::warn!("image '{}' could not be fetched: {}", image.source, e);
            image.fail(e.to_string());
        }
    }
}

/// Resolve images with an async fetcher, at most `max_in_flight` at a time.
///
/// Each fetch runs as a task in a [`tokio::task::JoinSet`] gated by a
/// semaphore. Dropping the returned future aborts every fetch still in
/// flight. Must be called from within a tokio runtime.
#[cfg(feature = "async")]
pub async fn resolve_images_async<F, Fut>(
    steps: &[StepRecord],
    max_in_flight: usize,
    fetch: F,
) -> Vec<StepRecord>
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    use std::sync::Arc;
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    let mut resolved = steps.to_vec();
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    for (index, step) in steps.iter().enumerate() {
        let Some(image) = step.image.as_ref().filter(|i| i.is_unresolved()) else {
            continue;
        };
        let semaphore = Arc::clone(&semaphore);
        let fetch = fetch(image.source.clone());
        tasks.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = semaphore.acquire_owned().await;
            (index, fetch.await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, fetched)) => {
                if let Some(image) = resolved[index].image.as_mut() {
                    apply(image, fetched);
                }
            }
            Err(e) => log::warn!("image fetch task failed: {}", e),
        }
    }

    // A panicked task leaves its reference untouched; mark it failed.
    for image in resolved.iter_mut().filter_map(|s| s.image.as_mut()) {
        if image.is_unresolved() {
            image.fail("fetch task aborted");
        }
    }

    resolved
}
