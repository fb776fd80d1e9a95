//! Goal record and its completion lifecycle.
//!
//! # Invariants
//! - `completed == false` implies `completed_at.is_none()`.
//! - Reopening a goal clears `completed_at`.

use super::lab::LabData;
use super::{require_text, Collection, Record, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Goal horizon.
///
/// Stored as a free string; unknown values survive a round trip as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalType {
    Weekly,
    Monthly,
    LongTerm,
    Other(String),
}

impl GoalType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::LongTerm => "long-term",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for GoalType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "long-term" => Self::LongTerm,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for GoalType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<GoalType> for String {
    fn from(value: GoalType) -> Self {
        match value {
            GoalType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for GoalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: GoalType,
    /// Advisory reference to a `Member`; may dangle.
    pub student_id: String,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this version does not model, kept so edits do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Goal {
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
    }

    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Whole days until the deadline, rounded up; negative once overdue.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.deadline, now)
    }
}

/// `ceil((deadline - now) / 1 day)` with the deadline taken at UTC midnight.
pub fn days_until(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
    let deadline_at = deadline.and_time(chrono::NaiveTime::MIN).and_utc();
    let millis = (deadline_at - now).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

impl Record for Goal {
    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        if !self.completed && self.completed_at.is_some() {
            return Err(ValidationError::CompletedAtWithoutCompletion(
                self.id.clone(),
            ));
        }
        Ok(())
    }
}

impl Collection<LabData> for Goal {
    const NAME: &'static str = "goals";

    fn records(container: &LabData) -> &[Self] {
        &container.goals
    }

    fn records_mut(container: &mut LabData) -> &mut Vec<Self> {
        &mut container.goals
    }
}

#[cfg(test)]
mod tests {
    use super::{days_until, Goal, GoalType};
    use crate::model::{Record, ValidationError};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn goal() -> Goal {
        Goal {
            id: "g1".to_string(),
            title: "Draft chapter 2".to_string(),
            description: None,
            kind: GoalType::Weekly,
            student_id: "m1".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            completed: false,
            completed_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            updated_at: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn unknown_goal_type_round_trips() {
        let json = serde_json::to_value(GoalType::from("quarterly")).unwrap();
        assert_eq!(json, "quarterly");
        let decoded: GoalType = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, GoalType::Other("quarterly".to_string()));
        assert_eq!(
            serde_json::to_value(GoalType::LongTerm).unwrap(),
            "long-term"
        );
    }

    #[test]
    fn reopen_clears_completion_timestamp() {
        let mut goal = goal();
        goal.complete(Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap());
        assert!(goal.completed);
        assert!(goal.completed_at.is_some());

        goal.reopen();
        assert!(goal.is_active());
        assert_eq!(goal.completed_at, None);
        goal.validate().unwrap();
    }

    #[test]
    fn validate_rejects_stale_completion_timestamp() {
        let mut goal = goal();
        goal.completed_at = Some(Utc::now());
        assert_eq!(
            goal.validate().unwrap_err(),
            ValidationError::CompletedAtWithoutCompletion("g1".to_string())
        );
    }

    #[test]
    fn days_until_rounds_up_and_goes_negative() {
        let deadline = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let morning = Utc.with_ymd_and_hms(2025, 1, 8, 9, 0, 0).unwrap();
        assert_eq!(days_until(deadline, morning), 2);
        let midnight = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(days_until(deadline, midnight), 0);
        let later = Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap();
        assert_eq!(days_until(deadline, later), -2);
    }

    #[test]
    fn wire_shape_uses_camel_case_and_type_key() {
        let json = serde_json::to_value(goal()).unwrap();
        assert_eq!(json["type"], "weekly");
        assert_eq!(json["studentId"], "m1");
        assert_eq!(json["deadline"], "2025-01-10");
        assert_eq!(json["completed"], false);
        assert!(json.get("completedAt").is_none());
    }

    #[test]
    fn unmodelled_fields_survive_decode_and_encode() {
        let mut json = serde_json::to_value(goal()).unwrap();
        json["priority"] = serde_json::json!("high");
        let decoded: Goal = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.extra["priority"], "high");

        let encoded = serde_json::to_value(&decoded).unwrap();
        assert_eq!(encoded["priority"], "high");
        assert_eq!(encoded["type"], "weekly");
    }
}
