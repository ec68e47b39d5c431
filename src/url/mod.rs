//! URL handling module for Doc-Harvest
//!
//! Domain extraction, the document-domain URL rewrite, and file names
//! derived from URLs.

mod domain;

use crate::{UrlError, UrlResult};
use url::Url;

pub use domain::extract_domain;

/// Parses a URL string and returns its normalized domain
pub fn domain_of(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    extract_domain(&parsed).ok_or_else(|| UrlError::MissingDomain(url.to_string()))
}

/// Returns true if the URL belongs to the given domain
pub fn is_on_domain(url: &str, domain: &str) -> bool {
    domain_of(url).map(|d| d == domain).unwrap_or(false)
}

/// Rewrites document-domain URLs to their printable form
///
/// Code-library pages on the document domain render the whole code on a
/// print view: `https://<domain>/print/<id>?guid=<id>`, where `<id>` is the
/// last path segment of the original URL. URLs on other domains, and URLs
/// without a usable last segment, are returned unchanged.
///
/// # Examples
///
/// ```
/// use doc_harvest::url::amend_url;
///
/// let amended = amend_url("https://ecode360.com/12345678", Some("ecode360.com"));
/// assert_eq!(amended, "https://ecode360.com/print/12345678?guid=12345678");
///
/// let other = amend_url("https://town.example.gov/codes", Some("ecode360.com"));
/// assert_eq!(other, "https://town.example.gov/codes");
/// ```
pub fn amend_url(url: &str, document_domain: Option<&str>) -> String {
    let Some(document_domain) = document_domain else {
        return url.to_string();
    };
    if !is_on_domain(url, document_domain) {
        return url.to_string();
    }

    match last_path_segment(url) {
        Some(id) => format!("https://{}/print/{}?guid={}", document_domain, id, id),
        None => url.to_string(),
    }
}

/// Returns true if the URL path ends with `.pdf`, ignoring case
pub fn has_pdf_extension(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase().ends_with(".pdf"),
        Err(_) => {
            let without_query = url.split(&['?', '#'][..]).next().unwrap_or(url);
            without_query.to_ascii_lowercase().ends_with(".pdf")
        }
    }
}

/// Returns the final non-empty path segment of a URL, query string excluded
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}

/// Derives the local file name for a URL
///
/// Uses the last path segment with the query string stripped. Characters
/// that are unsafe in file names are replaced with `_`.
pub fn file_name_from_url(url: &str) -> UrlResult<String> {
    let segment =
        last_path_segment(url).ok_or_else(|| UrlError::NoFileName(url.to_string()))?;

    let name: String = segment
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if name.is_empty() || name == "." || name == ".." {
        return Err(UrlError::NoFileName(url.to_string()));
    }

    Ok(name)
}
