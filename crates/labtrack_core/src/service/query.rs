//! Read-side filters, orderings and dashboard aggregates.
//!
//! All functions are pure over a borrowed `LabData` snapshot.

use crate::model::activity::Activity;
use crate::model::goal::{Goal, GoalType};
use crate::model::lab::LabData;
use crate::model::publication::{Publication, PublicationStatus};
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Items shown per dashboard panel.
pub const DASHBOARD_PANEL_LIMIT: usize = 5;
/// Window for the "recent activities" counter.
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    fn matches(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !completed,
            Self::Completed => completed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalFilter {
    pub kind: Option<GoalType>,
    pub student_id: Option<String>,
    pub status: StatusFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub student_id: Option<String>,
    pub date: Option<chrono::NaiveDate>,
}

/// Goals matching `filter`, earliest deadline first.
pub fn filter_goals(data: &LabData, filter: &GoalFilter) -> Vec<Goal> {
    let mut goals: Vec<Goal> = data
        .goals
        .iter()
        .filter(|goal| filter.kind.as_ref().map_or(true, |kind| goal.kind == *kind))
        .filter(|goal| {
            filter
                .student_id
                .as_deref()
                .map_or(true, |id| goal.student_id == id)
        })
        .filter(|goal| filter.status.matches(goal.completed))
        .cloned()
        .collect();
    goals.sort_by(|a, b| a.deadline.cmp(&b.deadline));
    goals
}

/// Activities matching `filter`, newest date first.
pub fn filter_activities(data: &LabData, filter: &ActivityFilter) -> Vec<Activity> {
    let mut activities: Vec<Activity> = data
        .activities
        .iter()
        .filter(|activity| {
            filter
                .student_id
                .as_deref()
                .map_or(true, |id| activity.student_id == id)
        })
        .filter(|activity| filter.date.map_or(true, |date| activity.date == date))
        .cloned()
        .collect();
    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities
}

/// Publications with `status` (all when `None`), newest year first.
pub fn filter_publications(
    data: &LabData,
    status: Option<PublicationStatus>,
) -> Vec<Publication> {
    let mut publications: Vec<Publication> = data
        .publications
        .iter()
        .filter(|publication| status.map_or(true, |status| publication.status == status))
        .cloned()
        .collect();
    publications.sort_by_key(|publication| std::cmp::Reverse(publication.sort_year()));
    publications
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub active_goals: usize,
    pub completed_goals: usize,
    /// Activities dated within the last seven days.
    pub recent_activities: usize,
    pub publications: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    /// Incomplete weekly goals, earliest deadline first.
    pub current_week_goals: Vec<Goal>,
    /// Newest activities regardless of age.
    pub recent_activities: Vec<Activity>,
}

pub fn dashboard(data: &LabData, now: DateTime<Utc>) -> Dashboard {
    let completed_goals = data.goals.iter().filter(|goal| goal.completed).count();
    let window_start = now - Duration::days(RECENT_ACTIVITY_DAYS);
    let recent_activity_count = data
        .activities
        .iter()
        .filter(|activity| activity.date.and_time(NaiveTime::MIN).and_utc() >= window_start)
        .count();

    let mut current_week_goals = filter_goals(
        data,
        &GoalFilter {
            kind: Some(GoalType::Weekly),
            student_id: None,
            status: StatusFilter::Active,
        },
    );
    current_week_goals.truncate(DASHBOARD_PANEL_LIMIT);

    let mut recent_activities = filter_activities(data, &ActivityFilter::default());
    recent_activities.truncate(DASHBOARD_PANEL_LIMIT);

    Dashboard {
        stats: DashboardStats {
            active_goals: data.goals.len() - completed_goals,
            completed_goals,
            recent_activities: recent_activity_count,
            publications: data.publications.len(),
        },
        current_week_goals,
        recent_activities,
    }
}
