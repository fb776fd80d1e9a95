//! Lab member record.

use super::lab::LabData;
use super::{require_text, Collection, Record, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display name used when a foreign key points at a deleted member.
pub const UNKNOWN_MEMBER_NAME: &str = "Unknown";
/// Name of the member seeded on a cold start.
pub const DEFAULT_PI_NAME: &str = "Principal Investigator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Phd,
    Masters,
    Undergraduate,
    Postdoc,
    Pi,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phd => "phd",
            Self::Masters => "masters",
            Self::Undergraduate => "undergraduate",
            Self::Postdoc => "postdoc",
            Self::Pi => "pi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Phd => "PhD Student",
            Self::Masters => "Master's Student",
            Self::Undergraduate => "Undergraduate",
            Self::Postdoc => "Postdoc",
            Self::Pi => "Principal Investigator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "phd" => Some(Self::Phd),
            "masters" => Some(Self::Masters),
            "undergraduate" => Some(Self::Undergraduate),
            "postdoc" => Some(Self::Postdoc),
            "pi" => Some(Self::Pi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this version does not model, kept so edits do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Member {
    /// The principal investigator seeded into an empty lab.
    pub fn default_pi(id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: DEFAULT_PI_NAME.to_string(),
            email: None,
            role: MemberRole::Pi,
            created_at,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// First letter of the name, upper-cased, for avatar rendering.
    pub fn initial(&self) -> Option<char> {
        self.name.trim().chars().next().map(|c| c.to_ascii_uppercase())
    }
}

impl Record for Member {
    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl Collection<LabData> for Member {
    const NAME: &'static str = "students";

    fn records(container: &LabData) -> &[Self] {
        &container.students
    }

    fn records_mut(container: &mut LabData) -> &mut Vec<Self> {
        &mut container.students
    }
}
