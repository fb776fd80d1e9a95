//! Shared, syncable lab document.

use super::activity::Activity;
use super::goal::Goal;
use super::member::{Member, UNKNOWN_MEMBER_NAME};
use super::publication::Publication;
use super::Container;
use crate::id::new_id;
use crate::repo::document_repo::LAB_DATA_KEY;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The four shared collections, persisted and synchronized as one document.
///
/// Members serialize under `students` to stay compatible with existing
/// backups and remote documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabData {
    #[serde(default)]
    pub students: Vec<Member>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub publications: Vec<Publication>,
}

impl LabData {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.students.iter().find(|member| member.id == id)
    }

    /// Member name for a foreign key, or `"Unknown"` when it dangles.
    pub fn member_name(&self, id: &str) -> &str {
        self.member(id)
            .map_or(UNKNOWN_MEMBER_NAME, |member| member.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
            && self.goals.is_empty()
            && self.activities.is_empty()
            && self.publications.is_empty()
    }
}

impl Container for LabData {
    const DOCUMENT_KEY: &'static str = LAB_DATA_KEY;

    /// Guarantees at least one member on first run.
    fn bootstrap(&mut self) -> bool {
        if !self.students.is_empty() {
            return false;
        }
        self.students.push(Member::default_pi(new_id(), Utc::now()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::LabData;
    use crate::model::member::MemberRole;
    use crate::model::Container;

    #[test]
    fn missing_collections_deserialize_as_empty() {
        let data: LabData = serde_json::from_str(r#"{"goals":[]}"#).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn bootstrap_seeds_a_single_pi_once() {
        let mut data = LabData::default();
        assert!(data.bootstrap());
        assert!(!data.bootstrap());
        assert_eq!(data.students.len(), 1);
        assert_eq!(data.students[0].role, MemberRole::Pi);
    }

    #[test]
    fn dangling_member_reference_resolves_to_unknown() {
        let data = LabData::default();
        assert_eq!(data.member_name("gone"), "Unknown");
    }
}
