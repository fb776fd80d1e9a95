//! Plain-text rendering of core records for the terminal.

use chrono::{DateTime, Utc};
use labtrack_core::service::query::Dashboard;
use labtrack_core::{Activity, Goal, LabData, Member, PrivateGoal, Publication, Todo, WorkLogEntry};

pub fn member_line(member: &Member) -> String {
    let email = member.email.as_deref().unwrap_or("-");
    format!(
        "{}  {} <{}>  [{}]",
        member.id,
        member.name,
        email,
        member.role.label()
    )
}

/// "3 days left", "due today", "2 days overdue".
pub fn countdown(days_left: i64) -> String {
    match days_left {
        0 => "due today".to_string(),
        1 => "1 day left".to_string(),
        n if n > 1 => format!("{n} days left"),
        -1 => "1 day overdue".to_string(),
        n => format!("{} days overdue", -n),
    }
}

pub fn goal_line(goal: &Goal, data: &LabData, now: DateTime<Utc>) -> String {
    let state = if goal.completed {
        "done".to_string()
    } else {
        countdown(goal.days_left(now))
    };
    format!(
        "{}  [{}] {}  ({})  due {}  {}",
        goal.id,
        goal.kind,
        goal.title,
        data.member_name(&goal.student_id),
        goal.deadline,
        state
    )
}

pub fn activity_line(activity: &Activity, data: &LabData) -> String {
    let hours = activity
        .hours
        .as_deref()
        .map(|hours| format!("  {hours}h"))
        .unwrap_or_default();
    format!(
        "{}  {}  {}  ({}){hours}",
        activity.id,
        activity.date,
        activity.title,
        data.member_name(&activity.student_id)
    )
}

pub fn publication_line(publication: &Publication) -> String {
    let mut line = format!(
        "{}  {}  {}  [{}]",
        publication.id,
        publication.title,
        publication.authors,
        publication.status.label()
    );
    if let Some(venue) = publication.venue.as_deref() {
        line.push_str(&format!("  {venue}"));
    }
    if let Some(year) = publication.year.as_deref() {
        line.push_str(&format!(" {year}"));
    }
    if let Some(url) = publication.doi_url() {
        line.push_str(&format!("  {url}"));
    }
    line
}

pub fn dashboard(board: &Dashboard, data: &LabData, now: DateTime<Utc>) -> String {
    let stats = &board.stats;
    let mut out = format!(
        "active goals: {}\ncompleted goals: {}\nactivities (7 days): {}\npublications: {}\n",
        stats.active_goals, stats.completed_goals, stats.recent_activities, stats.publications
    );
    out.push_str("\nthis week:\n");
    if board.current_week_goals.is_empty() {
        out.push_str("  (none)\n");
    }
    for goal in &board.current_week_goals {
        out.push_str(&format!("  {}\n", goal_line(goal, data, now)));
    }
    out.push_str("\nrecent activity:\n");
    if board.recent_activities.is_empty() {
        out.push_str("  (none)\n");
    }
    for activity in &board.recent_activities {
        out.push_str(&format!("  {}\n", activity_line(activity, data)));
    }
    out
}

pub fn private_goal_line(goal: &PrivateGoal) -> String {
    let mark = if goal.completed { "x" } else { " " };
    let deadline = goal
        .deadline
        .map(|deadline| format!("  due {deadline}"))
        .unwrap_or_default();
    format!("{}  [{mark}] {}{deadline}", goal.id, goal.title)
}

pub fn work_log_line(entry: &WorkLogEntry) -> String {
    let hours = entry
        .hours
        .as_deref()
        .map(|hours| format!("  {hours}h"))
        .unwrap_or_default();
    format!("{}  {}  {}{hours}", entry.id, entry.date, entry.title)
}

pub fn todo_line(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!("{}  [{mark}] {}", todo.id, todo.title)
}
