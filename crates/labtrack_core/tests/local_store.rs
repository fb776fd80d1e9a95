use labtrack_core::db::open_db;
use labtrack_core::repo::document_repo::{
    DocumentRepository, SqliteDocumentRepository, LAB_DATA_KEY, PRIVATE_DATA_KEY,
};
use labtrack_core::service::draft::{ActivityDraft, GoalDraft, MemberDraft, PublicationDraft};
use labtrack_core::store::{LabStore, StoreError};
use labtrack_core::{
    EditSession, EntityKind, GoalType, ImportOutcome, MemberRole, PublicationStatus,
    ServiceError, SyncSettings, Workspace,
};
use chrono::NaiveDate;

fn workspace() -> Workspace {
    Workspace::open_in_memory(SyncSettings::default()).unwrap()
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn member_draft(name: &str) -> MemberDraft {
    MemberDraft {
        name: name.to_string(),
        email: Some(format!("{}@lab.test", name.to_lowercase())),
        role: MemberRole::Phd,
    }
}

fn goal_draft(title: &str, student_id: &str, deadline: &str) -> GoalDraft {
    GoalDraft {
        title: title.to_string(),
        description: None,
        kind: GoalType::Weekly,
        student_id: student_id.to_string(),
        deadline: date(deadline),
    }
}

#[tokio::test]
async fn saved_records_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    let member_id = {
        let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
        let member = workspace
            .lab
            .save_member(&EditSession::Creating, member_draft("Ada"))
            .await
            .unwrap();
        workspace
            .lab
            .save_goal(
                &EditSession::Creating,
                goal_draft("Draft intro", &member.id, "2025-03-01"),
            )
            .await
            .unwrap();
        member.id
    };

    let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
    let data = workspace.lab.snapshot().unwrap();
    assert_eq!(data.students.len(), 2);
    assert_eq!(data.member_name(&member_id), "Ada");
    assert_eq!(data.goals.len(), 1);
    assert_eq!(data.goals[0].title, "Draft intro");
}

#[tokio::test]
async fn stored_document_uses_the_original_keys_and_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    {
        let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
        let member = workspace.lab.members().unwrap().remove(0);
        workspace
            .lab
            .save_goal(
                &EditSession::Creating,
                goal_draft("Weekly sync", &member.id, "2025-03-01"),
            )
            .await
            .unwrap();
    }

    let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
    let raw: serde_json::Value =
        serde_json::from_str(&repo.read_document(LAB_DATA_KEY).unwrap().unwrap()).unwrap();
    for key in ["students", "goals", "activities", "publications"] {
        assert!(raw[key].is_array(), "missing collection {key}");
    }
    let goal = &raw["goals"][0];
    assert_eq!(goal["type"], "weekly");
    assert_eq!(goal["completed"], false);
    assert!(goal["studentId"].is_string());
    assert!(goal["createdAt"].is_string());
    assert!(goal.get("completedAt").is_none());
}

#[tokio::test]
async fn deleting_a_member_leaves_dangling_references_named_unknown() {
    let workspace = workspace();
    let member = workspace
        .lab
        .save_member(&EditSession::Creating, member_draft("Linus"))
        .await
        .unwrap();
    let goal = workspace
        .lab
        .save_goal(
            &EditSession::Creating,
            goal_draft("Run assays", &member.id, "2025-04-01"),
        )
        .await
        .unwrap();
    workspace
        .lab
        .save_activity(
            &EditSession::Creating,
            ActivityDraft {
                title: "Bench work".to_string(),
                description: String::new(),
                student_id: member.id.clone(),
                date: date("2025-03-20"),
                hours: Some("3".to_string()),
            },
        )
        .await
        .unwrap();

    workspace.lab.delete_member(&member.id).await.unwrap();

    let data = workspace.lab.snapshot().unwrap();
    assert_eq!(data.goals.len(), 1);
    assert_eq!(data.activities.len(), 1);
    assert_eq!(data.goals[0].student_id, member.id);
    assert_eq!(workspace.lab.member_name(&goal.student_id).unwrap(), "Unknown");
}

#[tokio::test]
async fn completing_and_reopening_a_goal_tracks_completed_at() {
    let workspace = workspace();
    let pi = workspace.lab.members().unwrap().remove(0);
    let goal = workspace
        .lab
        .save_goal(
            &EditSession::Creating,
            goal_draft("Submit abstract", &pi.id, "2025-05-01"),
        )
        .await
        .unwrap();
    assert!(!goal.completed);
    assert!(goal.completed_at.is_none());

    let done = workspace.lab.complete_goal(&goal.id).await.unwrap();
    assert!(done.completed);
    assert!(done.completed_at.is_some());
    assert!(done.updated_at.is_some());

    let reopened = workspace.lab.reopen_goal(&goal.id).await.unwrap();
    assert!(!reopened.completed);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn editing_session_updates_in_place_and_keeps_identity() {
    let workspace = workspace();
    let publication = workspace
        .lab
        .save_publication(
            &EditSession::Creating,
            PublicationDraft {
                title: "Tiny models".to_string(),
                authors: "A. Lovelace".to_string(),
                status: PublicationStatus::Draft,
                year: None,
                venue: None,
                doi: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let session = EditSession::editing(EntityKind::Publication, publication.id.clone());
    let updated = workspace
        .lab
        .save_publication(
            &session,
            PublicationDraft {
                title: "Tiny models, revisited".to_string(),
                authors: "A. Lovelace".to_string(),
                status: PublicationStatus::Submitted,
                year: Some("2025".to_string()),
                venue: Some("NeurIPS".to_string()),
                doi: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, publication.id);
    assert_eq!(updated.created_at, publication.created_at);
    assert!(updated.updated_at.is_some());
    let all = workspace.lab.publications(None).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, PublicationStatus::Submitted);
}

#[tokio::test]
async fn session_for_another_kind_creates_instead_of_updating() {
    let workspace = workspace();
    let pi = workspace.lab.members().unwrap().remove(0);
    let session = EditSession::editing(EntityKind::Publication, "pub-1");

    workspace
        .lab
        .save_goal(&session, goal_draft("New goal", &pi.id, "2025-06-01"))
        .await
        .unwrap();

    assert_eq!(workspace.lab.snapshot().unwrap().goals.len(), 1);
}

#[tokio::test]
async fn invalid_mutation_leaves_store_unchanged() {
    let workspace = workspace();
    let before = workspace.lab.snapshot().unwrap();

    let err = workspace
        .lab
        .save_member(&EditSession::Creating, member_draft("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Validation(_))));

    let err = workspace.lab.delete_goal("missing").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Store(StoreError::NotFound { .. })
    ));
    assert_eq!(workspace.lab.snapshot().unwrap(), before);
}

#[tokio::test]
async fn lab_import_replaces_everything_and_defaults_missing_collections() {
    let workspace = workspace();
    let payload = r#"{
        "students": [{
            "id": "m1",
            "name": "Imported",
            "role": "masters",
            "createdAt": "2024-09-01T12:00:00Z"
        }]
    }"#;

    let outcome = workspace.lab.import(payload, |_| true).await.unwrap();
    assert_eq!(outcome, ImportOutcome::Applied);

    let data = workspace.lab.snapshot().unwrap();
    assert_eq!(data.students.len(), 1);
    assert_eq!(data.students[0].name, "Imported");
    assert!(data.goals.is_empty());
    assert!(data.publications.is_empty());
}

#[tokio::test]
async fn declined_or_malformed_import_changes_nothing() {
    let workspace = workspace();
    let before = workspace.lab.snapshot().unwrap();

    let outcome = workspace
        .lab
        .import(r#"{"students": []}"#, |_| false)
        .await
        .unwrap();
    assert_eq!(outcome, ImportOutcome::Declined);

    let mut asked = false;
    let err = workspace
        .lab
        .import("{ definitely not json", |_| {
            asked = true;
            true
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidImport(_)));
    assert!(!asked);
    assert_eq!(workspace.lab.snapshot().unwrap(), before);
}

#[tokio::test]
async fn private_import_touches_only_the_private_store() {
    let mut workspace = workspace();
    let shared_before = workspace.lab.snapshot().unwrap();
    workspace.private.add_todo("old todo").unwrap();

    let payload = r#"{
        "piGoals": [
            { "id": "pg1", "title": "Grant renewal", "completed": false,
              "createdAt": "2025-01-10T08:00:00Z" },
            { "id": "pg2", "title": "Hire postdoc", "deadline": "2025-06-30",
              "completed": false, "createdAt": "2025-01-11T08:00:00Z" }
        ],
        "piActivities": [],
        "piTodos": [
            { "id": "t1", "title": "Sign forms", "completed": false,
              "createdAt": "2025-01-12T08:00:00Z" }
        ]
    }"#;
    let outcome = workspace.private.import(payload, |_| true).unwrap();
    assert_eq!(outcome, ImportOutcome::Applied);

    let private = workspace.private.data();
    assert_eq!(private.pi_goals.len(), 2);
    assert_eq!(private.pi_goals[0].title, "Grant renewal");
    assert!(private.pi_activities.is_empty());
    assert_eq!(private.pi_todos.len(), 1);
    assert_eq!(private.pi_todos[0].title, "Sign forms");
    assert_eq!(workspace.lab.snapshot().unwrap(), shared_before);
}

#[test]
fn stores_keep_their_documents_apart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    {
        let mut workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
        workspace.private.add_todo("private only").unwrap();
    }

    let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
    let shared = repo.read_document(LAB_DATA_KEY).unwrap().unwrap();
    let private = repo.read_document(PRIVATE_DATA_KEY).unwrap().unwrap();
    assert!(!shared.contains("private only"));
    assert!(private.contains("private only"));
}

#[test]
fn non_object_snapshot_loads_as_empty_and_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
    repo.write_document(LAB_DATA_KEY, "\"just a string\"").unwrap();

    let store = LabStore::load(repo).unwrap();
    assert_eq!(store.data().students.len(), 1);
    assert_eq!(store.data().students[0].role, MemberRole::Pi);
    assert!(store.data().goals.is_empty());
}

#[test]
fn malformed_snapshot_object_still_opens_the_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    {
        let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
        repo.write_document(
            LAB_DATA_KEY,
            r#"{"students":{},"goals":[{"id":"g1","title":"x"}],
                "publications":[{"id":"p1","title":"Kept","status":"accepted",
                                 "createdAt":"2024-05-01T00:00:00Z"}]}"#,
        )
        .unwrap();
    }

    let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
    let data = workspace.lab.snapshot().unwrap();
    assert_eq!(data.students.len(), 1);
    assert_eq!(data.students[0].role, MemberRole::Pi);
    assert!(data.goals.is_empty());
    assert_eq!(data.publications.len(), 1);
    assert_eq!(data.publications[0].title, "Kept");
    assert!(workspace.lab.export(date("2025-03-20")).is_ok());
}

#[tokio::test]
async fn imported_open_goal_with_stale_completion_can_be_edited() {
    let workspace = workspace();
    let payload = r#"{
        "students": [],
        "goals": [{
            "id": "g1", "title": "Ship survey", "type": "monthly", "studentId": "m1",
            "deadline": "2025-02-01", "completed": false,
            "completedAt": "2025-01-20T09:00:00.000Z",
            "createdAt": "2025-01-02T09:00:00.000Z"
        }]
    }"#;
    workspace.lab.import(payload, |_| true).await.unwrap();

    let session = EditSession::editing(EntityKind::Goal, "g1");
    let edited = workspace
        .lab
        .save_goal(&session, goal_draft("Ship survey v2", "m1", "2025-02-15"))
        .await
        .unwrap();
    assert_eq!(edited.title, "Ship survey v2");
    assert!(!edited.completed);
    assert_eq!(edited.completed_at, None);
}

#[tokio::test]
async fn unmodelled_member_fields_survive_an_edit_and_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    {
        let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
        let payload = r#"{"students":[{"id":"m1","name":"Ada","role":"phd",
            "avatarColor":"teal","createdAt":"2025-01-05T10:00:00.000Z"}]}"#;
        workspace.lab.import(payload, |_| true).await.unwrap();
        workspace
            .lab
            .save_member(
                &EditSession::editing(EntityKind::Member, "m1"),
                MemberDraft {
                    name: "Ada L.".to_string(),
                    email: None,
                    role: MemberRole::Postdoc,
                },
            )
            .await
            .unwrap();
    }

    let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
    let stored = repo.read_document(LAB_DATA_KEY).unwrap().unwrap();
    assert!(stored.contains(r#""avatarColor":"teal""#));

    let workspace = Workspace::open(&path, SyncSettings::default()).unwrap();
    let member = workspace.lab.members().unwrap().remove(0);
    assert_eq!(member.name, "Ada L.");
    assert_eq!(member.extra["avatarColor"], "teal");
}

#[test]
fn save_rewrites_the_whole_container_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lab.sqlite3");
    let repo = SqliteDocumentRepository::new(open_db(&path).unwrap());
    let store = LabStore::load(repo.clone()).unwrap();

    repo.write_document(LAB_DATA_KEY, "{}").unwrap();
    store.save().unwrap();

    let stored = repo.read_document(LAB_DATA_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(value["students"][0]["role"], "pi");
    assert_eq!(value["goals"], serde_json::json!([]));
}
