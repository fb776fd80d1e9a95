//! Terminal front end for labtrack.
//!
//! # Responsibility
//! - Map subcommands onto the core mutation/query API and print the result.
//! - Own the process boundary: configuration from flags and environment,
//!   logging bootstrap, confirmation prompts.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use labtrack_core::service::draft::{
    ActivityDraft, GoalDraft, MemberDraft, PrivateGoalDraft, PublicationDraft, WorkLogDraft,
};
use labtrack_core::service::query::{ActivityFilter, GoalFilter, StatusFilter};
use labtrack_core::{
    ConnectOutcome, EditSession, EntityKind, GoalType, ImportOutcome, LoggingConfig, MemberRole,
    PublicationStatus, SyncCredentials, SyncSettings, Workspace,
};
use log::info;

mod render;

const DATABASE_FILE: &str = "labtrack.sqlite3";

#[derive(Parser)]
#[command(name = "labtrack", version)]
#[command(about = "Track a research lab's members, goals, activities and publications", long_about = None)]
struct Cli {
    /// Directory holding the local database and log files
    #[arg(long, env = "LABTRACK_DATA_DIR", default_value = ".labtrack", global = true)]
    data_dir: PathBuf,
    #[arg(long, env = "LABTRACK_LOG", default_value = "warn", global = true)]
    log_level: String,
    /// Write logs to <data-dir>/logs instead of stderr
    #[arg(long, global = true)]
    log_to_file: bool,
    /// Gist API base URL
    #[arg(long, env = "LABTRACK_GIST_API", global = true)]
    gist_api: Option<String>,
    /// Seconds between background pulls while watching
    #[arg(long, default_value_t = 60, global = true)]
    poll_secs: u64,
    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show goal and activity overview
    Dashboard,
    #[command(subcommand)]
    Members(MemberCommand),
    #[command(subcommand)]
    Goals(GoalCommand),
    #[command(subcommand)]
    Activities(ActivityCommand),
    #[command(subcommand)]
    Publications(PublicationCommand),
    /// PI-only workspace that never leaves this machine
    #[command(subcommand)]
    Private(PrivateCommand),
    /// Write a dated JSON backup
    Export {
        /// Export the private workspace instead of shared lab data
        #[arg(long)]
        private: bool,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Replace all data with a JSON backup
    Import {
        file: PathBuf,
        #[arg(long)]
        private: bool,
    },
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Subcommand)]
enum MemberCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_parser = parse_role, default_value = "phd")]
        role: MemberRole,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Pass an empty value to clear
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Option<MemberRole>,
    },
    /// Remove a member; their goals and activities are kept
    Remove { id: String },
}

#[derive(Subcommand)]
enum GoalCommand {
    List {
        #[arg(long, value_parser = parse_goal_type)]
        kind: Option<GoalType>,
        #[arg(long)]
        member: Option<String>,
        #[arg(long, value_parser = parse_status_filter, default_value = "all")]
        status: StatusFilter,
    },
    Add {
        title: String,
        #[arg(long)]
        member: String,
        #[arg(long)]
        deadline: NaiveDate,
        #[arg(long, value_parser = parse_goal_type, default_value = "weekly")]
        kind: GoalType,
        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        member: Option<String>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long, value_parser = parse_goal_type)]
        kind: Option<GoalType>,
        /// Pass an empty value to clear
        #[arg(long)]
        description: Option<String>,
    },
    Complete { id: String },
    Reopen { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum ActivityCommand {
    List {
        #[arg(long)]
        member: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Add {
        title: String,
        #[arg(long)]
        member: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        hours: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        member: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        /// Pass an empty value to clear
        #[arg(long)]
        hours: Option<String>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum PublicationCommand {
    List {
        #[arg(long, value_parser = parse_publication_status)]
        status: Option<PublicationStatus>,
    },
    Add {
        title: String,
        #[arg(long)]
        authors: String,
        #[arg(long, value_parser = parse_publication_status, default_value = "draft")]
        status: PublicationStatus,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        venue: Option<String>,
        #[arg(long)]
        doi: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        authors: Option<String>,
        #[arg(long, value_parser = parse_publication_status)]
        status: Option<PublicationStatus>,
        /// Pass an empty value to clear
        #[arg(long)]
        year: Option<String>,
        /// Pass an empty value to clear
        #[arg(long)]
        venue: Option<String>,
        /// Pass an empty value to clear
        #[arg(long)]
        doi: Option<String>,
        /// Pass an empty value to clear
        #[arg(long)]
        notes: Option<String>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum PrivateCommand {
    Goals,
    AddGoal {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    CompleteGoal { id: String },
    ReopenGoal { id: String },
    RemoveGoal { id: String },
    /// Work log, newest first
    Log,
    AddLog {
        title: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        hours: Option<String>,
    },
    RemoveLog { id: String },
    Todos,
    AddTodo { title: String },
    Toggle { id: String },
    RemoveTodo { id: String },
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Link a gist and run first-time setup
    Connect {
        gist_id: String,
        #[arg(long, env = "LABTRACK_GIST_TOKEN", hide_env_values = true)]
        token: String,
    },
    Pull,
    Push,
    Status,
    /// Forget credentials; local data is kept
    Disconnect,
    /// Pull on a timer until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("failed to create data directory {}", cli.data_dir.display()))?;
    init_logging(&cli)?;

    let mut settings =
        SyncSettings::default().with_poll_interval(Duration::from_secs(cli.poll_secs.max(1)));
    if let Some(api) = cli.gist_api.as_deref() {
        settings = settings.with_api_base(api);
    }
    let database = cli.data_dir.join(DATABASE_FILE);
    let mut workspace = Workspace::open(&database, settings)
        .with_context(|| format!("failed to open workspace at {}", database.display()))?;
    info!("event=cli_start module=cli status=ok");

    let yes = cli.yes;
    match cli.command {
        Commands::Dashboard => {
            let now = Utc::now();
            let data = workspace.lab.snapshot()?;
            let board = workspace.lab.dashboard(now)?;
            print!("{}", render::dashboard(&board, &data, now));
        }
        Commands::Members(command) => run_members(&workspace, command).await?,
        Commands::Goals(command) => run_goals(&workspace, command).await?,
        Commands::Activities(command) => run_activities(&workspace, command).await?,
        Commands::Publications(command) => run_publications(&workspace, command).await?,
        Commands::Private(command) => run_private(&mut workspace, command)?,
        Commands::Export { private, out_dir } => {
            let today = Utc::now().date_naive();
            let file = if private {
                workspace.private.export(today)?
            } else {
                workspace.lab.export(today)?
            };
            let path = out_dir.join(&file.file_name);
            std::fs::write(&path, file.contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported to {}.", path.display());
        }
        Commands::Import { file, private } => {
            let payload = read_file(&file)?;
            let outcome = if private {
                workspace.private.import(&payload, |data| {
                    confirm(
                        &format!(
                            "Replace private data with {} goals, {} log entries and {} to-dos?",
                            data.pi_goals.len(),
                            data.pi_activities.len(),
                            data.pi_todos.len()
                        ),
                        yes,
                    )
                })?
            } else {
                workspace
                    .lab
                    .import(&payload, |data| {
                        confirm(
                            &format!(
                                "Replace lab data with {} members, {} goals, {} activities and {} publications?",
                                data.students.len(),
                                data.goals.len(),
                                data.activities.len(),
                                data.publications.len()
                            ),
                            yes,
                        )
                    })
                    .await?
            };
            match outcome {
                ImportOutcome::Applied => println!("Imported {}.", file.display()),
                ImportOutcome::Declined => println!("Import cancelled."),
            }
        }
        Commands::Sync(command) => run_sync(&workspace, command, yes).await?,
    }
    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let mut config = LoggingConfig::new(&cli.log_level).map_err(|err| anyhow!("{err}"))?;
    if cli.log_to_file {
        let data_dir = cli
            .data_dir
            .canonicalize()
            .context("failed to resolve data directory")?;
        config = config
            .with_log_dir(data_dir.join("logs"))
            .map_err(|err| anyhow!("{err}"))?;
    }
    labtrack_core::init_logging(&config).map_err(|err| anyhow!("{err}"))
}

async fn run_members(workspace: &Workspace, command: MemberCommand) -> anyhow::Result<()> {
    let lab = &workspace.lab;
    match command {
        MemberCommand::List => {
            for member in lab.members()? {
                println!("{}", render::member_line(&member));
            }
        }
        MemberCommand::Add { name, email, role } => {
            let member = lab
                .save_member(&EditSession::Creating, MemberDraft { name, email, role })
                .await?;
            println!("Added {}.", render::member_line(&member));
        }
        MemberCommand::Edit {
            id,
            name,
            email,
            role,
        } => {
            let current = lab
                .members()?
                .into_iter()
                .find(|member| member.id == id)
                .with_context(|| format!("no member with id {id}"))?;
            let draft = MemberDraft {
                name: name.unwrap_or(current.name),
                email: email.or(current.email),
                role: role.unwrap_or(current.role),
            };
            let session = EditSession::editing(EntityKind::Member, id);
            let member = lab.save_member(&session, draft).await?;
            println!("Updated {}.", render::member_line(&member));
        }
        MemberCommand::Remove { id } => {
            let member = lab.delete_member(&id).await?;
            println!("Removed {}.", member.name);
        }
    }
    Ok(())
}

async fn run_goals(workspace: &Workspace, command: GoalCommand) -> anyhow::Result<()> {
    let lab = &workspace.lab;
    let now = Utc::now();
    match command {
        GoalCommand::List {
            kind,
            member,
            status,
        } => {
            let data = lab.snapshot()?;
            let filter = GoalFilter {
                kind,
                student_id: member,
                status,
            };
            for goal in lab.goals(&filter)? {
                println!("{}", render::goal_line(&goal, &data, now));
            }
        }
        GoalCommand::Add {
            title,
            member,
            deadline,
            kind,
            description,
        } => {
            let draft = GoalDraft {
                title,
                description,
                kind,
                student_id: member,
                deadline,
            };
            let goal = lab.save_goal(&EditSession::Creating, draft).await?;
            println!("Added goal {}.", goal.id);
        }
        GoalCommand::Edit {
            id,
            title,
            member,
            deadline,
            kind,
            description,
        } => {
            let current = lab
                .snapshot()?
                .goals
                .into_iter()
                .find(|goal| goal.id == id)
                .with_context(|| format!("no goal with id {id}"))?;
            let draft = GoalDraft {
                title: title.unwrap_or(current.title),
                description: description.or(current.description),
                kind: kind.unwrap_or(current.kind),
                student_id: member.unwrap_or(current.student_id),
                deadline: deadline.unwrap_or(current.deadline),
            };
            let session = EditSession::editing(EntityKind::Goal, id);
            let goal = lab.save_goal(&session, draft).await?;
            println!("Updated goal {}.", goal.id);
        }
        GoalCommand::Complete { id } => {
            let goal = lab.complete_goal(&id).await?;
            println!("Completed {}.", goal.title);
        }
        GoalCommand::Reopen { id } => {
            let goal = lab.reopen_goal(&id).await?;
            println!("Reopened {}.", goal.title);
        }
        GoalCommand::Remove { id } => {
            let goal = lab.delete_goal(&id).await?;
            println!("Removed {}.", goal.title);
        }
    }
    Ok(())
}

async fn run_activities(workspace: &Workspace, command: ActivityCommand) -> anyhow::Result<()> {
    let lab = &workspace.lab;
    match command {
        ActivityCommand::List { member, date } => {
            let data = lab.snapshot()?;
            let filter = ActivityFilter {
                student_id: member,
                date,
            };
            for activity in lab.activities(&filter)? {
                println!("{}", render::activity_line(&activity, &data));
            }
        }
        ActivityCommand::Add {
            title,
            member,
            date,
            description,
            hours,
        } => {
            let draft = ActivityDraft {
                title,
                description,
                student_id: member,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                hours,
            };
            let activity = lab.save_activity(&EditSession::Creating, draft).await?;
            println!("Logged activity {}.", activity.id);
        }
        ActivityCommand::Edit {
            id,
            title,
            member,
            date,
            description,
            hours,
        } => {
            let current = lab
                .snapshot()?
                .activities
                .into_iter()
                .find(|activity| activity.id == id)
                .with_context(|| format!("no activity with id {id}"))?;
            let draft = ActivityDraft {
                title: title.unwrap_or(current.title),
                description: description.unwrap_or(current.description),
                student_id: member.unwrap_or(current.student_id),
                date: date.unwrap_or(current.date),
                hours: hours.or(current.hours),
            };
            let session = EditSession::editing(EntityKind::Activity, id);
            let activity = lab.save_activity(&session, draft).await?;
            println!("Updated activity {}.", activity.id);
        }
        ActivityCommand::Remove { id } => {
            let activity = lab.delete_activity(&id).await?;
            println!("Removed {}.", activity.title);
        }
    }
    Ok(())
}

async fn run_publications(
    workspace: &Workspace,
    command: PublicationCommand,
) -> anyhow::Result<()> {
    let lab = &workspace.lab;
    match command {
        PublicationCommand::List { status } => {
            for publication in lab.publications(status)? {
                println!("{}", render::publication_line(&publication));
            }
        }
        PublicationCommand::Add {
            title,
            authors,
            status,
            year,
            venue,
            doi,
            notes,
        } => {
            let draft = PublicationDraft {
                title,
                authors,
                status,
                year,
                venue,
                doi,
                notes,
            };
            let publication = lab.save_publication(&EditSession::Creating, draft).await?;
            println!("Added publication {}.", publication.id);
        }
        PublicationCommand::Edit {
            id,
            title,
            authors,
            status,
            year,
            venue,
            doi,
            notes,
        } => {
            let current = lab
                .snapshot()?
                .publications
                .into_iter()
                .find(|publication| publication.id == id)
                .with_context(|| format!("no publication with id {id}"))?;
            let draft = PublicationDraft {
                title: title.unwrap_or(current.title),
                authors: authors.unwrap_or(current.authors),
                status: status.unwrap_or(current.status),
                year: year.or(current.year),
                venue: venue.or(current.venue),
                doi: doi.or(current.doi),
                notes: notes.or(current.notes),
            };
            let session = EditSession::editing(EntityKind::Publication, id);
            let publication = lab.save_publication(&session, draft).await?;
            println!("Updated publication {}.", publication.id);
        }
        PublicationCommand::Remove { id } => {
            let publication = lab.delete_publication(&id).await?;
            println!("Removed {}.", publication.title);
        }
    }
    Ok(())
}

fn run_private(workspace: &mut Workspace, command: PrivateCommand) -> anyhow::Result<()> {
    let private = &mut workspace.private;
    let today = Utc::now().date_naive();
    match command {
        PrivateCommand::Goals => {
            for goal in private.goals() {
                println!("{}", render::private_goal_line(goal));
            }
        }
        PrivateCommand::AddGoal {
            title,
            description,
            deadline,
        } => {
            let goal = private.add_goal(PrivateGoalDraft {
                title,
                description,
                deadline,
            })?;
            println!("Added {}.", render::private_goal_line(&goal));
        }
        PrivateCommand::CompleteGoal { id } => {
            let goal = private.set_goal_completed(&id, true)?;
            println!("{}", render::private_goal_line(&goal));
        }
        PrivateCommand::ReopenGoal { id } => {
            let goal = private.set_goal_completed(&id, false)?;
            println!("{}", render::private_goal_line(&goal));
        }
        PrivateCommand::RemoveGoal { id } => {
            let goal = private.delete_goal(&id)?;
            println!("Removed {}.", goal.title);
        }
        PrivateCommand::Log => {
            for entry in private.work_log() {
                println!("{}", render::work_log_line(&entry));
            }
        }
        PrivateCommand::AddLog {
            title,
            date,
            notes,
            hours,
        } => {
            let entry = private.add_work_log(WorkLogDraft {
                title,
                notes,
                date: date.unwrap_or(today),
                hours,
            })?;
            println!("Logged {}.", render::work_log_line(&entry));
        }
        PrivateCommand::RemoveLog { id } => {
            let entry = private.delete_work_log(&id)?;
            println!("Removed {}.", entry.title);
        }
        PrivateCommand::Todos => {
            for todo in private.todos() {
                println!("{}", render::todo_line(todo));
            }
        }
        PrivateCommand::AddTodo { title } => {
            let todo = private.add_todo(&title)?;
            println!("Added {}.", render::todo_line(&todo));
        }
        PrivateCommand::Toggle { id } => {
            let todo = private.toggle_todo(&id)?;
            println!("{}", render::todo_line(&todo));
        }
        PrivateCommand::RemoveTodo { id } => {
            let todo = private.delete_todo(&id)?;
            println!("Removed {}.", todo.title);
        }
    }
    Ok(())
}

async fn run_sync(workspace: &Workspace, command: SyncCommand, yes: bool) -> anyhow::Result<()> {
    let engine = &workspace.sync;
    match command {
        SyncCommand::Connect { gist_id, token } => {
            let credentials = SyncCredentials::new(token, gist_id);
            let outcome = engine
                .connect(credentials, |err| {
                    confirm(
                        &format!("Could not read the gist ({err}). Overwrite it with local data?"),
                        yes,
                    )
                })
                .await?;
            // Polling only runs under `watch`.
            engine.stop_polling();
            match outcome {
                ConnectOutcome::AdoptedRemote => println!("Connected; loaded data from the gist."),
                ConnectOutcome::InitializedRemote => {
                    println!("Connected; the gist was empty and now holds local data.")
                }
                ConnectOutcome::ForcedPush => {
                    println!("Connected; local data was written to the gist.")
                }
            }
        }
        SyncCommand::Pull => {
            let outcome = engine.pull_remote().await?;
            println!("Pull finished: {outcome:?}.");
        }
        SyncCommand::Push => {
            engine.push_local().await?;
            println!("Pushed local data.");
        }
        SyncCommand::Status => {
            let status = engine.status()?;
            println!("state: {:?}", status.state);
            println!("gist: {}", status.gist_id.as_deref().unwrap_or("-"));
            match status.last_sync {
                Some(at) => println!("last sync: {}", at.to_rfc3339()),
                None => println!("last sync: never"),
            }
            if let Some(error) = status.last_error {
                println!("last error: {error}");
            }
        }
        SyncCommand::Disconnect => {
            engine.disconnect()?;
            println!("Disconnected. Local data was kept.");
        }
        SyncCommand::Watch => {
            if !engine.is_connected() {
                bail!("sync is not connected; run `labtrack sync connect` first");
            }
            if let Err(err) = engine.pull_remote().await {
                eprintln!("initial pull failed: {err}");
                engine.take_error();
            }
            if !engine.start_polling() {
                bail!("failed to start background polling");
            }
            println!("Watching for remote changes. Press Ctrl-C to stop.");
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            engine.stop_polling();
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_role(value: &str) -> Result<MemberRole, String> {
    MemberRole::parse(value)
        .ok_or_else(|| format!("unknown role `{value}`; expected phd|masters|undergraduate|postdoc|pi"))
}

fn parse_publication_status(value: &str) -> Result<PublicationStatus, String> {
    PublicationStatus::parse(value).ok_or_else(|| {
        format!("unknown status `{value}`; expected draft|in-progress|submitted|under-review|accepted|published")
    })
}

fn parse_goal_type(value: &str) -> Result<GoalType, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("goal type cannot be empty".to_string());
    }
    Ok(GoalType::from(value))
}

fn parse_status_filter(value: &str) -> Result<StatusFilter, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(StatusFilter::All),
        "active" => Ok(StatusFilter::Active),
        "completed" => Ok(StatusFilter::Completed),
        other => Err(format!("unknown status `{other}`; expected all|active|completed")),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_goal_type, parse_role, parse_status_filter, Cli, Commands, MemberCommand};
    use clap::{CommandFactory, Parser};
    use labtrack_core::service::query::StatusFilter;
    use labtrack_core::{GoalType, MemberRole};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn value_parsers_accept_known_values() {
        assert_eq!(parse_role("PhD").unwrap(), MemberRole::Phd);
        assert!(parse_role("dean").is_err());
        assert_eq!(parse_goal_type("long-term").unwrap(), GoalType::LongTerm);
        assert_eq!(
            parse_status_filter("Completed").unwrap(),
            StatusFilter::Completed
        );
    }

    #[test]
    fn empty_edit_value_is_passed_through_as_a_clear() {
        let cli = Cli::try_parse_from(["labtrack", "members", "edit", "m1", "--email", ""]).unwrap();
        match cli.command {
            Commands::Members(MemberCommand::Edit { email, name, .. }) => {
                assert_eq!(email.as_deref(), Some(""));
                assert_eq!(name, None);
            }
            _ => panic!("expected members edit"),
        }
    }
}
