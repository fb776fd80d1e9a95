//! Logged lab activity.

use super::lab::LabData;
use super::{require_text, Collection, Record, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Advisory reference to a `Member`; may dangle.
    pub student_id: String,
    pub date: NaiveDate,
    /// Free numeric text as typed, e.g. `"2.5"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this version does not model, kept so edits do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Activity {
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

impl Collection<LabData> for Activity {
    const NAME: &'static str = "activities";

    fn records(container: &LabData) -> &[Self] {
        &container.activities
    }

    fn records_mut(container: &mut LabData) -> &mut Vec<Self> {
        &mut container.activities
    }
}
