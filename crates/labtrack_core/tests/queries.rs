use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use labtrack_core::model::goal::days_until;
use labtrack_core::service::query::{
    dashboard, filter_activities, filter_goals, filter_publications, ActivityFilter, GoalFilter,
    StatusFilter,
};
use labtrack_core::{GoalType, LabData, PublicationStatus};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap()
}

fn lab() -> LabData {
    serde_json::from_value(json!({
        "students": [
            { "id": "m1", "name": "Ada", "role": "phd", "createdAt": "2024-09-01T00:00:00Z" },
            { "id": "m2", "name": "Grace", "role": "postdoc", "createdAt": "2024-09-01T00:00:00Z" }
        ],
        "goals": [
            { "id": "g1", "title": "Later weekly", "type": "weekly", "studentId": "m1",
              "deadline": "2025-01-10", "completed": false, "createdAt": "2025-01-01T00:00:00Z" },
            { "id": "g2", "title": "Sooner weekly", "type": "weekly", "studentId": "m2",
              "deadline": "2025-01-05", "completed": false, "createdAt": "2025-01-01T00:00:00Z" },
            { "id": "g3", "title": "Done weekly", "type": "weekly", "studentId": "m1",
              "deadline": "2025-01-03", "completed": true,
              "completedAt": "2025-01-02T00:00:00Z", "createdAt": "2025-01-01T00:00:00Z" },
            { "id": "g4", "title": "Thesis", "type": "long-term", "studentId": "m1",
              "deadline": "2025-09-01", "completed": false, "createdAt": "2025-01-01T00:00:00Z" }
        ],
        "activities": [
            { "id": "a1", "title": "Old", "studentId": "m1", "date": "2024-12-01",
              "createdAt": "2024-12-01T00:00:00Z" },
            { "id": "a2", "title": "Recent", "studentId": "m2", "date": "2025-01-07",
              "createdAt": "2025-01-07T00:00:00Z" },
            { "id": "a3", "title": "Also recent", "studentId": "m1", "date": "2025-01-02",
              "createdAt": "2025-01-02T00:00:00Z" }
        ],
        "publications": [
            { "id": "p1", "title": "No year", "authors": "A", "status": "draft",
              "createdAt": "2025-01-01T00:00:00Z" },
            { "id": "p2", "title": "Older", "authors": "B", "status": "published", "year": "2021",
              "createdAt": "2025-01-01T00:00:00Z" },
            { "id": "p3", "title": "Newer", "authors": "C", "status": "under-review", "year": "2024",
              "createdAt": "2025-01-01T00:00:00Z" }
        ]
    }))
    .unwrap()
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| id(item).to_string()).collect()
}

#[test]
fn weekly_goals_are_ordered_by_deadline() {
    let data = lab();
    let filter = GoalFilter {
        kind: Some(GoalType::Weekly),
        student_id: None,
        status: StatusFilter::Active,
    };
    let goals = filter_goals(&data, &filter);
    assert_eq!(ids(&goals, |goal| goal.id.as_str()), vec!["g2", "g1"]);
}

#[test]
fn goal_filters_combine_member_and_status() {
    let data = lab();
    let filter = GoalFilter {
        kind: None,
        student_id: Some("m1".to_string()),
        status: StatusFilter::Completed,
    };
    let goals = filter_goals(&data, &filter);
    assert_eq!(ids(&goals, |goal| goal.id.as_str()), vec!["g3"]);

    let all = filter_goals(&data, &GoalFilter::default());
    assert_eq!(ids(&all, |goal| goal.id.as_str()), vec!["g3", "g2", "g1", "g4"]);
}

#[test]
fn activities_are_newest_first_and_filter_by_date() {
    let data = lab();
    let all = filter_activities(&data, &ActivityFilter::default());
    assert_eq!(ids(&all, |activity| activity.id.as_str()), vec!["a2", "a3", "a1"]);

    let filter = ActivityFilter {
        student_id: None,
        date: NaiveDate::from_ymd_opt(2025, 1, 2),
    };
    let on_day = filter_activities(&data, &filter);
    assert_eq!(ids(&on_day, |activity| activity.id.as_str()), vec!["a3"]);
}

#[test]
fn publications_sort_by_year_with_missing_year_last() {
    let data = lab();
    let all = filter_publications(&data, None);
    assert_eq!(ids(&all, |publication| publication.id.as_str()), vec!["p3", "p2", "p1"]);

    let published = filter_publications(&data, Some(PublicationStatus::Published));
    assert_eq!(ids(&published, |publication| publication.id.as_str()), vec!["p2"]);
}

#[test]
fn dashboard_counts_and_panels() {
    let board = dashboard(&lab(), now());

    assert_eq!(board.stats.active_goals, 3);
    assert_eq!(board.stats.completed_goals, 1);
    assert_eq!(board.stats.recent_activities, 2);
    assert_eq!(board.stats.publications, 3);
    assert_eq!(ids(&board.current_week_goals, |goal| goal.id.as_str()), vec!["g2", "g1"]);
    assert_eq!(ids(&board.recent_activities, |activity| activity.id.as_str()), vec!["a2", "a3", "a1"]);
}

#[test]
fn dashboard_of_an_empty_lab_is_zeroed() {
    let board = dashboard(&LabData::default(), now());
    assert_eq!(board.stats.active_goals, 0);
    assert!(board.current_week_goals.is_empty());
    assert!(board.recent_activities.is_empty());
}

#[test]
fn days_left_rounds_partial_days_up() {
    let deadline = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    assert_eq!(days_until(deadline, now()), 2);
    let past = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    assert_eq!(days_until(past, now()), -2);
}
