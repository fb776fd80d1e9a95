//! Private workspace document.
//!
//! Same identifier scheme and persistence contract as the shared lab data,
//! but never handed to the sync layer. No member references.

use super::{require_text, Collection, Container, Record, ValidationError};
use crate::repo::document_repo::PRIVATE_DATA_KEY;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateData {
    #[serde(default)]
    pub pi_goals: Vec<PrivateGoal>,
    #[serde(default)]
    pub pi_activities: Vec<WorkLogEntry>,
    #[serde(default)]
    pub pi_todos: Vec<Todo>,
}

impl Container for PrivateData {
    const DOCUMENT_KEY: &'static str = PRIVATE_DATA_KEY;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateGoal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PrivateGoal {
    pub fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then_some(at);
    }
}

impl Todo {
    pub fn toggle(&mut self, at: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then_some(at);
    }
}

fn check_completion(
    id: &str,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if !completed && completed_at.is_some() {
        return Err(ValidationError::CompletedAtWithoutCompletion(
            id.to_string(),
        ));
    }
    Ok(())
}

impl Record for PrivateGoal {
    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        check_completion(&self.id, self.completed, self.completed_at)
    }
}

impl Record for WorkLogEntry {
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

impl Record for Todo {
    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        check_completion(&self.id, self.completed, self.completed_at)
    }
}

impl Collection<PrivateData> for PrivateGoal {
    const NAME: &'static str = "piGoals";

    fn records(container: &PrivateData) -> &[Self] {
        &container.pi_goals
    }

    fn records_mut(container: &mut PrivateData) -> &mut Vec<Self> {
        &mut container.pi_goals
    }
}

impl Collection<PrivateData> for WorkLogEntry {
    const NAME: &'static str = "piActivities";

    fn records(container: &PrivateData) -> &[Self] {
        &container.pi_activities
    }

    fn records_mut(container: &mut PrivateData) -> &mut Vec<Self> {
        &mut container.pi_activities
    }
}

impl Collection<PrivateData> for Todo {
    const NAME: &'static str = "piTodos";

    fn records(container: &PrivateData) -> &[Self] {
        &container.pi_todos
    }

    fn records_mut(container: &mut PrivateData) -> &mut Vec<Self> {
        &mut container.pi_todos
    }
}
