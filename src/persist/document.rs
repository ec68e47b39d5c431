//! Binary document downloads

use super::{part_path, PersistError, PersistOutcome};
use crate::crawler::{random_delay, HarvestContext};
use crate::url::{domain_of, file_name_from_url};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, warn};

/// Local file name for a document URL
///
/// The last path segment, with `.pdf` appended when it lacks the extension
/// (document-center links often end in a bare id or slug).
pub fn document_file_name(url: &str) -> Result<String, PersistError> {
    let name = file_name_from_url(url)?;
    if name.to_ascii_lowercase().ends_with(".pdf") {
        Ok(name)
    } else {
        Ok(format!("{}.pdf", name))
    }
}

/// Downloads a document into `dest_dir`
///
/// Skips without any request if the file is already there. Otherwise makes
/// up to `download-attempts` attempts, each preceded by the rate limiter,
/// with a random backoff between failed attempts.
pub async fn persist_document(
    ctx: &mut HarvestContext,
    url: &str,
    dest_dir: &Path,
) -> Result<PersistOutcome, PersistError> {
    let path = dest_dir.join(document_file_name(url)?);
    if path.exists() {
        info!("Skipping existing file: {}", path.display());
        return Ok(PersistOutcome::Skipped(path));
    }

    let domain = domain_of(url)?;
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| PersistError::io(dest_dir, e))?;

    let attempts = ctx.crawler.download_attempts.max(1);
    let mut attempt = 1;
    loop {
        ctx.rate_limiter.wait(&domain).await;

        match download_to(&ctx.client, url, &path).await {
            Ok(bytes) => {
                info!("Downloaded: {} ({} bytes)", path.display(), bytes);
                return Ok(PersistOutcome::Written(path));
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "Attempt {}/{} to download {} failed: {}",
                    attempt, attempts, url, e
                );
                tokio::time::sleep(random_delay(ctx.crawler.download_backoff_range())).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Failed to download {}: {}", url, e);
                return Err(e);
            }
        }
    }
}

/// Streams a response body to `path` via its `.part` file
async fn download_to(client: &Client, url: &str, path: &Path) -> Result<u64, PersistError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| PersistError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PersistError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let staging = part_path(path);
    let result = stream_body(response, url, &staging).await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&staging, path)
                .await
                .map_err(|e| PersistError::io(path, e))?;
            Ok(bytes)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                debug!("Could not remove {}: {}", staging.display(), cleanup);
            }
            Err(e)
        }
    }
}

async fn stream_body(
    response: reqwest::Response,
    url: &str,
    staging: &Path,
) -> Result<u64, PersistError> {
    let file = tokio::fs::File::create(staging)
        .await
        .map_err(|e| PersistError::io(staging, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| PersistError::Request {
            url: url.to_string(),
            source,
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| PersistError::io(staging, e))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| PersistError::io(staging, e))?;
    Ok(written)
}
