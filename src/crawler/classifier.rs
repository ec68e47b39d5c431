//! Link classification
//!
//! Splits a listing page's anchors into documents and HTML pages, and trims
//! the set down to documents only when a page links to too much.

use super::parser::resolve_link;
use crate::config::{CrawlerConfig, RulesConfig};
use crate::url::{extract_domain, has_pdf_extension};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Html,
    Pdf,
}

/// A classified absolute link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub kind: LinkKind,
    pub url: String,
}

impl Link {
    pub fn is_pdf(&self) -> bool {
        self.kind == LinkKind::Pdf
    }
}

/// The links an entry page resolves to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    /// Links to follow, in discovery order
    pub links: Vec<Link>,

    /// True if the volume threshold cut the set down to documents
    pub reduced: bool,

    /// Links found before any reduction
    pub discovered: usize,
}

impl LinkSet {
    pub fn pdf_count(&self) -> usize {
        self.links.iter().filter(|link| link.is_pdf()).count()
    }

    pub fn html_count(&self) -> usize {
        self.links.len() - self.pdf_count()
    }
}

/// Classifies anchors found on a page
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    threshold: usize,
    path_markers: Vec<String>,
    exempt_domain: Option<String>,
}

impl LinkClassifier {
    pub fn new(threshold: usize, path_markers: Vec<String>, exempt_domain: Option<String>) -> Self {
        Self {
            threshold,
            path_markers,
            exempt_domain: exempt_domain.map(|d| d.to_lowercase()),
        }
    }

    pub fn from_config(crawler: &CrawlerConfig, rules: &RulesConfig) -> Self {
        Self::new(
            crawler.link_volume_threshold,
            rules.document_path_markers.clone(),
            rules.document_domain.clone(),
        )
    }

    /// A link is a document if its path ends in `.pdf` or its URL contains
    /// a document path marker
    pub fn kind_of(&self, url: &Url) -> LinkKind {
        let is_document = has_pdf_extension(url.as_str())
            || self
                .path_markers
                .iter()
                .any(|marker| !marker.is_empty() && url.as_str().contains(marker.as_str()));

        if is_document {
            LinkKind::Pdf
        } else {
            LinkKind::Html
        }
    }

    /// Resolves and classifies `hrefs` relative to the page they came from
    ///
    /// Pages on the exempt domain yield nothing. When more than `threshold`
    /// links are found, only the documents are kept.
    pub fn classify(&self, page_url: &str, hrefs: &[String]) -> LinkSet {
        let Ok(base) = Url::parse(page_url) else {
            return LinkSet::default();
        };

        if let Some(exempt) = &self.exempt_domain {
            if extract_domain(&base).as_deref() == Some(exempt.as_str()) {
                return LinkSet::default();
            }
        }

        let links: Vec<Link> = hrefs
            .iter()
            .filter_map(|href| resolve_link(href, &base))
            .map(|url| Link {
                kind: self.kind_of(&url),
                url: url.to_string(),
            })
            .collect();

        let discovered = links.len();
        if discovered > self.threshold {
            LinkSet {
                links: links.into_iter().filter(Link::is_pdf).collect(),
                reduced: true,
                discovered,
            }
        } else {
            LinkSet {
                links,
                reduced: false,
                discovered,
            }
        }
    }
}
