//! Form input for creating or editing records.
//!
//! A draft creates a fresh record (`into_record`) or overwrites the editable
//! fields of an existing one (`apply_to`). Identity, `createdAt` and
//! unmodelled fields are never touched by `apply_to`. The one completion
//! change is that an open goal loses any stale `completedAt`.

use crate::model::activity::Activity;
use crate::model::goal::{Goal, GoalType};
use crate::model::member::{Member, MemberRole};
use crate::model::non_blank;
use crate::model::private::{PrivateGoal, WorkLogEntry};
use crate::model::publication::{Publication, PublicationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Map;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDraft {
    pub name: String,
    pub email: Option<String>,
    pub role: MemberRole,
}

impl MemberDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> Member {
        Member {
            id,
            name: self.name.trim().to_string(),
            email: non_blank(self.email),
            role: self.role,
            created_at: now,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn apply_to(self, member: &mut Member) {
        member.name = self.name.trim().to_string();
        member.email = non_blank(self.email);
        member.role = self.role;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub kind: GoalType,
    pub student_id: String,
    pub deadline: NaiveDate,
}

impl GoalDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> Goal {
        Goal {
            id,
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            kind: self.kind,
            student_id: self.student_id,
            deadline: self.deadline,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn apply_to(self, goal: &mut Goal) {
        goal.title = self.title.trim().to_string();
        goal.description = non_blank(self.description);
        goal.kind = self.kind;
        goal.student_id = self.student_id;
        goal.deadline = self.deadline;
        if !goal.completed {
            goal.completed_at = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub hours: Option<String>,
}

impl ActivityDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            student_id: self.student_id,
            date: self.date,
            hours: non_blank(self.hours),
            created_at: now,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn apply_to(self, activity: &mut Activity) {
        activity.title = self.title.trim().to_string();
        activity.description = self.description;
        activity.student_id = self.student_id;
        activity.date = self.date;
        activity.hours = non_blank(self.hours);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationDraft {
    pub title: String,
    pub authors: String,
    pub status: PublicationStatus,
    pub year: Option<String>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub notes: Option<String>,
}

impl PublicationDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> Publication {
        Publication {
            id,
            title: self.title.trim().to_string(),
            authors: self.authors.trim().to_string(),
            status: self.status,
            year: non_blank(self.year),
            venue: non_blank(self.venue),
            doi: non_blank(self.doi),
            notes: non_blank(self.notes),
            created_at: now,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn apply_to(self, publication: &mut Publication) {
        publication.title = self.title.trim().to_string();
        publication.authors = self.authors.trim().to_string();
        publication.status = self.status;
        publication.year = non_blank(self.year);
        publication.venue = non_blank(self.venue);
        publication.doi = non_blank(self.doi);
        publication.notes = non_blank(self.notes);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateGoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
}

impl PrivateGoalDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> PrivateGoal {
        PrivateGoal {
            id,
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            deadline: self.deadline,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLogDraft {
    pub title: String,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub hours: Option<String>,
}

impl WorkLogDraft {
    pub fn into_record(self, id: String, now: DateTime<Utc>) -> WorkLogEntry {
        WorkLogEntry {
            id,
            title: self.title.trim().to_string(),
            notes: non_blank(self.notes),
            date: self.date,
            hours: non_blank(self.hours),
            created_at: now,
            updated_at: None,
        }
    }
}
