//! Publication pipeline record.

use super::lab::LabData;
use super::{require_text, Collection, Record, ValidationError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static DOI_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*doi:\s*").expect("valid doi prefix regex"));

const DOI_RESOLVER: &str = "https://doi.org/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicationStatus {
    Draft,
    InProgress,
    Submitted,
    UnderReview,
    Accepted,
    Published,
}

impl PublicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Submitted => "submitted",
            Self::UnderReview => "under-review",
            Self::Accepted => "accepted",
            Self::Published => "published",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InProgress => "In Progress",
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::Accepted => "Accepted",
            Self::Published => "Published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "in-progress" => Some(Self::InProgress),
            "submitted" => Some(Self::Submitted),
            "under-review" => Some(Self::UnderReview),
            "accepted" => Some(Self::Accepted),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: String,
    pub status: PublicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this version does not model, kept so edits do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Publication {
    /// Year used for ordering; missing or non-numeric years count as 0.
    pub fn sort_year(&self) -> i32 {
        self.year
            .as_deref()
            .and_then(|year| year.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Resolvable link for the DOI, if one is recorded.
    pub fn doi_url(&self) -> Option<String> {
        let doi = self.doi.as_deref()?.trim();
        if doi.is_empty() {
            return None;
        }
        if doi.starts_with("http") {
            return Some(doi.to_string());
        }
        Some(format!("{DOI_RESOLVER}{}", DOI_PREFIX_RE.replace(doi, "")))
    }
}

impl Record for Publication {
    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

impl Collection<LabData> for Publication {
    const NAME: &'static str = "publications";

    fn records(container: &LabData) -> &[Self] {
        &container.publications
    }

    fn records_mut(container: &mut LabData) -> &mut Vec<Self> {
        &mut container.publications
    }
}
