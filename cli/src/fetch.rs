//! Image fetching for the command line: HTTP(S) URLs and local files.

use indicatif::ProgressBar;
use sopdoc::resolve::{resolve_images_async, FsImageResolver, ImageResolver};
use sopdoc::{Error, StepRecord};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves step images over HTTP or from disk, reporting progress.
pub struct ImageFetcher {
    client: reqwest::Client,
    files: Arc<FsImageResolver>,
    progress: ProgressBar,
}

impl ImageFetcher {
    /// Create a fetcher; relative paths are resolved against `base_dir`.
    pub fn new(base_dir: PathBuf, progress: ProgressBar) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("sopdoc/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            files: Arc::new(FsImageResolver::new(base_dir)),
            progress,
        })
    }

    /// Resolve every pending image of `steps`, at most `max_in_flight` at once.
    pub async fn resolve(&self, steps: &[StepRecord], max_in_flight: usize) -> Vec<StepRecord> {
        resolve_images_async(steps, max_in_flight, |reference| {
            let client = self.client.clone();
            let files = Arc::clone(&self.files);
            let progress = self.progress.clone();
            async move {
                let result = fetch(client, files, reference).await;
                progress.inc(1);
                result
            }
        })
        .await
    }
}

/// Number of image references still waiting to be fetched.
pub fn pending_images(steps: &[StepRecord]) -> u64 {
    steps
        .iter()
        .filter_map(|s| s.image.as_ref())
        .filter(|image| image.is_unresolved())
        .count() as u64
}

fn is_remote(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

async fn fetch(
    client: reqwest::Client,
    files: Arc<FsImageResolver>,
    reference: String,
) -> sopdoc::Result<Vec<u8>> {
    if !is_remote(&reference) {
        return tokio::task::spawn_blocking(move || files.resolve(&reference))
            .await
            .map_err(|e| Error::Other(format!("file read task failed: {}", e)))?;
    }

    let resolve_error = |e: reqwest::Error| Error::ImageResolve {
        reference: reference.clone(),
        reason: e.to_string(),
    };

    let response = client
        .get(reference.trim())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(resolve_error)?;
    let bytes = response.bytes().await.map_err(resolve_error)?;
    Ok(bytes.to_vec())
}
