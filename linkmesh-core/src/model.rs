use serde::{Deserialize, Serialize};
use url::Url;

/// Whether the crawler reported the page as indexable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indexability {
    Indexable,
    NonIndexable,
}

impl Indexability {
    /// Parse the crawl export label ("Indexable", "Non-Indexable", ...)
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("indexable") {
            Indexability::Indexable
        } else {
            Indexability::NonIndexable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Indexability::Indexable => "indexable",
            Indexability::NonIndexable => "non_indexable",
        }
    }
}

/// Search performance metrics for a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub impressions: f64,
    pub clicks: f64,
    pub ctr: f64,
    pub position: Option<f64>,
}

impl Performance {
    pub fn new(impressions: f64, position: Option<f64>) -> Self {
        Self {
            impressions,
            clicks: 0.0,
            ctr: 0.0,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub link_score: f64,
    pub unique_inlinks: u32,
    pub crawl_depth: u32,
    pub status_code: u16,
    pub indexability: Indexability,
    pub performance: Option<Performance>,
}

impl Page {
    /// A 200, indexable page with no performance data
    pub fn new(url: impl Into<String>, link_score: f64) -> Self {
        Self {
            url: url.into(),
            link_score,
            unique_inlinks: 0,
            crawl_depth: 0,
            status_code: 200,
            indexability: Indexability::Indexable,
            performance: None,
        }
    }

    pub fn with_inlinks(mut self, unique_inlinks: u32) -> Self {
        self.unique_inlinks = unique_inlinks;
        self
    }

    pub fn with_depth(mut self, crawl_depth: u32) -> Self {
        self.crawl_depth = crawl_depth;
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_indexability(mut self, indexability: Indexability) -> Self {
        self.indexability = indexability;
        self
    }

    pub fn with_performance(mut self, performance: Performance) -> Self {
        self.performance = Some(performance);
        self
    }

    /// Only 200 + indexable pages take part in scoring
    pub fn is_eligible(&self) -> bool {
        self.status_code == 200 && self.indexability == Indexability::Indexable
    }

    pub fn impressions(&self) -> Option<f64> {
        self.performance.as_ref().map(|p| p.impressions)
    }

    pub fn position(&self) -> Option<f64> {
        self.performance.as_ref().and_then(|p| p.position)
    }

    pub fn path(&self) -> String {
        extract_url_path(&self.url)
    }
}

/// An existing internal link taken from the link export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: String,
    pub destination: String,
    pub anchor: String,
}

impl LinkEdge {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            anchor: anchor.into(),
        }
    }
}

/// Extract the path component from a URL
///
/// Inputs that do not parse as absolute URLs (for example `/blog/post`) are
/// returned unchanged minus any query string or fragment.
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| {
            url.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
}
