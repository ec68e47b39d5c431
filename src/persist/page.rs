//! HTML pages saved as markdown

use super::{sanitize_folder_name, write_atomic, PersistError, PersistOutcome};
use crate::crawler::{extract_main_content, extract_title, HarvestContext};
use crate::url::{domain_of, file_name_from_url};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Local file name for a page URL: its last path segment plus `.md`
pub fn page_file_name(url: &str) -> Result<String, PersistError> {
    Ok(format!("{}.md", file_name_from_url(url)?))
}

/// Fetches a page and saves its main content as markdown
///
/// Pages on the document domain go into a sub-folder named after the page
/// title; every other page goes straight into `dest_dir`. The existence
/// check for document-domain pages can only run once the title is known,
/// so those pages are always fetched.
pub async fn persist_page(
    ctx: &mut HarvestContext,
    url: &str,
    dest_dir: &Path,
) -> Result<PersistOutcome, PersistError> {
    let domain = domain_of(url)?;
    let file_name = page_file_name(url)?;
    let titled = ctx.is_document_domain(&domain);

    if !titled {
        let path = dest_dir.join(&file_name);
        if path.exists() {
            info!("Skipping existing file: {}", path.display());
            return Ok(PersistOutcome::Skipped(path));
        }
    }

    ctx.rate_limiter.wait(&domain).await;
    let body = fetch_text(ctx, url).await?;

    let title = if titled { extract_title(&body) } else { None };
    let content = extract_main_content(&body, &ctx.rules.content_classes).ok_or_else(|| {
        PersistError::NoContent {
            url: url.to_string(),
        }
    })?;

    let target_dir = if titled {
        titled_dir(dest_dir, title.as_deref(), url)
    } else {
        dest_dir.to_path_buf()
    };

    let path = target_dir.join(&file_name);
    if path.exists() {
        info!("Skipping existing file: {}", path.display());
        return Ok(PersistOutcome::Skipped(path));
    }

    let markdown = htmd::convert(&content).map_err(|e| PersistError::Convert {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    tokio::fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| PersistError::io(&target_dir, e))?;
    write_atomic(&path, markdown.as_bytes()).await?;

    info!("Saved Markdown: {}", path.display());
    Ok(PersistOutcome::Written(path))
}

async fn fetch_text(ctx: &HarvestContext, url: &str) -> Result<String, PersistError> {
    let response = ctx
        .client
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

    response.text().await.map_err(|source| PersistError::Request {
        url: url.to_string(),
        source,
    })
}

/// Sub-folder for a titled page, or `dest_dir` if the title is unusable
fn titled_dir(dest_dir: &Path, title: Option<&str>, url: &str) -> PathBuf {
    match title.map(sanitize_folder_name).filter(|name| !name.is_empty()) {
        Some(folder) => dest_dir.join(folder),
        None => {
            warn!("No usable title on {}, saving without sub-folder", url);
            dest_dir.to_path_buf()
        }
    }
}
