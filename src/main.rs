// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GG-EZ command-line client
//!
//! Signs in to the GG-EZ esports tracker and browses or administers events,
//! matches, teams and players. The session is kept in a token file between
//! runs.

use clap::{Args, Parser, Subcommand};
use ggez_client::{
    config::Config,
    error::ApiError,
    models::{
        Event, EventFilter, EventForm, Match, MatchFilter, MatchForm, MatchStatus, Player,
        PlayerForm, Registration, Role, Team, TeamForm,
    },
    navigation::{can_access, nav_items, Route},
    store::FileTokenStore,
    time_utils::{format_utc_rfc3339, parse_date, parse_timestamp},
    AppState,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ggez_client::config::ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid date {0:?}, expected YYYY-MM-DD or RFC3339")]
    InvalidDate(String),
    #[error("you need to sign in as staff to do that")]
    NotAllowed,
    #[error("match {0} has no {1}, pass --{1}")]
    MissingField(u64, &'static str),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "ggez", about = "GG-EZ esports tracker client")]
struct Cli {
    /// API base URL (overrides GGEZ_API_URL, which is then not needed)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "GGEZ_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the session
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GGEZ_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat of the password (defaults to --password)
        #[arg(long)]
        password_confirm: Option<String>,
        #[arg(long, default_value = "default_user")]
        role: Role,
    },
    /// Show the signed-in user
    Whoami,
    /// Show the navigation links available to the current session
    Nav,
    /// List events
    Events(EventListArgs),
    /// Show one event
    Event { id: u64 },
    /// List matches
    Matches(MatchListArgs),
    /// Show one match
    Match { id: u64 },
    /// List teams
    Teams,
    /// List players
    Players,
    /// Staff-only management commands
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct EventListArgs {
    /// Name contains (case-insensitive)
    #[arg(long)]
    search: Option<String>,
    /// Starting on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Ending on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    /// Fetch only this page instead of the whole list
    #[arg(long)]
    page: Option<u32>,
}

#[derive(Args, Debug)]
struct MatchListArgs {
    /// Either team name contains (case-insensitive)
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<MatchStatus>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    page: Option<u32>,
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    CreateEvent {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        /// Banner image to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    CreateMatch {
        #[arg(long)]
        event: u64,
        #[arg(long)]
        team1: u64,
        #[arg(long)]
        team2: u64,
        #[arg(long)]
        scheduled_time: String,
        #[arg(long, default_value = "upcoming")]
        status: MatchStatus,
        /// Final score, e.g. "2-1"
        #[arg(long)]
        result: Option<String>,
    },
    CreateTeam {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    CreatePlayer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Change an event; omitted fields keep their current value
    UpdateEvent {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Change a match, e.g. its status and result
    UpdateMatch {
        id: u64,
        #[arg(long)]
        event: Option<u64>,
        #[arg(long)]
        team1: Option<u64>,
        #[arg(long)]
        team2: Option<u64>,
        #[arg(long)]
        scheduled_time: Option<String>,
        #[arg(long)]
        status: Option<MatchStatus>,
        #[arg(long)]
        result: Option<String>,
    },
    UpdateTeam {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    UpdatePlayer {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        team: Option<u64>,
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Show teams and events available for a new match
    MatchOptions,
    Delete {
        #[arg(value_enum)]
        kind: ResourceKind,
        id: u64,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
    Event,
    Match,
    Team,
    Player,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();

    let config = Config::from_env_with_api_url(cli.api_url.as_deref())?;
    tracing::debug!(api = %config.api_base_url, "Starting GG-EZ client");

    let tokens = Arc::new(FileTokenStore::open(&config.token_file));
    tracing::debug!(
        path = %tokens.path().display(),
        memory_only = tokens.is_memory_only(),
        "Token store opened"
    );
    let state = AppState::new(config, tokens)?;

    if let Err(e) = run(&state, cli.command).await {
        if let CliError::Api(ApiError::Validation(errors)) = &e {
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("{}: {}", field, message);
                }
            }
        }
        return Err(e.into());
    }
    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), CliError> {
    let session = &state.session;
    let resources = &state.resources;

    // Sign-in and sign-up start from a clean slate; everything else
    // picks up the stored session first.
    if !matches!(command, Command::Login { .. } | Command::Register { .. }) {
        session.restore().await;
    }

    match command {
        Command::Login { username, password } => {
            let user = session.login(&username, &password).await?;
            print_json(&user)
        }
        Command::Logout => {
            session.logout().await;
            print_json(&session.snapshot())
        }
        Command::Register {
            username,
            email,
            password,
            password_confirm,
            role,
        } => {
            let form = Registration {
                username,
                email,
                password2: password_confirm.unwrap_or_else(|| password.clone()),
                password1: password,
                role,
            };
            session.register(&form).await?;
            println!("Account created, sign in with `ggez login`.");
            Ok(())
        }
        Command::Whoami => print_json(&session.snapshot()),
        Command::Nav => {
            let user = session.current_user();
            print_json(&nav_items(user.as_ref()))
        }
        Command::Events(args) => {
            let events = match args.page {
                Some(page) => resources.list_page::<Event>(page).await?.results,
                None => resources.list_all::<Event>().await?,
            };
            let filter = EventFilter {
                search: args.search,
                start_date: parse_day(args.from.as_deref())?,
                end_date: parse_day(args.to.as_deref())?,
            };
            print_json(&filter.apply(&events))
        }
        Command::Event { id } => print_json(&resources.get::<Event>(id).await?),
        Command::Matches(args) => {
            let matches = match args.page {
                Some(page) => resources.list_page::<Match>(page).await?.results,
                None => resources.list_all::<Match>().await?,
            };
            let filter = MatchFilter {
                search: args.search,
                status: args.status,
                start_date: parse_day(args.from.as_deref())?,
                end_date: parse_day(args.to.as_deref())?,
            };
            print_json(&filter.apply(&matches))
        }
        Command::Match { id } => print_json(&resources.get::<Match>(id).await?),
        Command::Teams => print_json(&resources.list_all::<Team>().await?),
        Command::Players => print_json(&resources.list_all::<Player>().await?),
        Command::Admin(admin) => {
            let user = session.current_user();
            if !can_access(Route::Admin, user.as_ref()) {
                return Err(CliError::NotAllowed);
            }
            run_admin(state, admin.command).await
        }
    }
}

async fn run_admin(state: &AppState, command: AdminSubcommand) -> Result<(), CliError> {
    let resources = &state.resources;

    match command {
        AdminSubcommand::CreateEvent {
            name,
            description,
            start_date,
            end_date,
            image,
        } => {
            let image = match image {
                Some(path) => Some(upload(state, &path).await?),
                None => None,
            };
            let form = EventForm {
                name,
                description,
                start_date: normalize_timestamp(&start_date)?,
                end_date: normalize_timestamp(&end_date)?,
                image,
            };
            print_json(&resources.create::<Event>(&form).await?)
        }
        AdminSubcommand::CreateMatch {
            event,
            team1,
            team2,
            scheduled_time,
            status,
            result,
        } => {
            let form = MatchForm {
                event,
                team1,
                team2,
                scheduled_time: normalize_timestamp(&scheduled_time)?,
                status,
                result,
            };
            print_json(&resources.create::<Match>(&form).await?)
        }
        AdminSubcommand::CreateTeam {
            name,
            description,
            logo,
        } => {
            let logo = match logo {
                Some(path) => Some(upload(state, &path).await?),
                None => None,
            };
            let form = TeamForm {
                name,
                description,
                logo,
            };
            print_json(&resources.create::<Team>(&form).await?)
        }
        AdminSubcommand::CreatePlayer {
            name,
            role,
            team,
            avatar,
        } => {
            let avatar = match avatar {
                Some(path) => Some(upload(state, &path).await?),
                None => None,
            };
            let form = PlayerForm {
                name,
                role,
                team,
                avatar,
            };
            print_json(&resources.create::<Player>(&form).await?)
        }
        AdminSubcommand::UpdateEvent {
            id,
            name,
            description,
            start_date,
            end_date,
            image,
        } => {
            let mut form = EventForm::from(&resources.get::<Event>(id).await?);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(start) = start_date {
                form.start_date = normalize_timestamp(&start)?;
            }
            if let Some(end) = end_date {
                form.end_date = normalize_timestamp(&end)?;
            }
            if let Some(path) = image {
                form.image = Some(upload(state, &path).await?);
            }
            print_json(&resources.update::<Event>(id, &form).await?)
        }
        AdminSubcommand::UpdateMatch {
            id,
            event,
            team1,
            team2,
            scheduled_time,
            status,
            result,
        } => {
            let current = resources.get::<Match>(id).await?;
            let scheduled_time = match scheduled_time {
                Some(raw) => normalize_timestamp(&raw)?,
                None => current.scheduled_time,
            };
            let form = MatchForm {
                event: event
                    .or(current.event)
                    .ok_or(CliError::MissingField(id, "event"))?,
                team1: team1
                    .or(current.team1)
                    .ok_or(CliError::MissingField(id, "team1"))?,
                team2: team2
                    .or(current.team2)
                    .ok_or(CliError::MissingField(id, "team2"))?,
                scheduled_time,
                status: status.unwrap_or(current.status),
                result: result.or(current.result),
            };
            print_json(&resources.update::<Match>(id, &form).await?)
        }
        AdminSubcommand::UpdateTeam {
            id,
            name,
            description,
            logo,
        } => {
            let mut form = TeamForm::from(&resources.get::<Team>(id).await?);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(path) = logo {
                form.logo = Some(upload(state, &path).await?);
            }
            print_json(&resources.update::<Team>(id, &form).await?)
        }
        AdminSubcommand::UpdatePlayer {
            id,
            name,
            role,
            team,
            avatar,
        } => {
            let mut form = PlayerForm::from(&resources.get::<Player>(id).await?);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(role) = role {
                form.role = role;
            }
            if team.is_some() {
                form.team = team;
            }
            if let Some(path) = avatar {
                form.avatar = Some(upload(state, &path).await?);
            }
            print_json(&resources.update::<Player>(id, &form).await?)
        }
        AdminSubcommand::MatchOptions => {
            let options = resources.load_match_form_options().await?;
            #[derive(Serialize)]
            struct Options {
                teams: Vec<Team>,
                events: Vec<Event>,
            }
            print_json(&Options {
                teams: options.teams,
                events: options.events,
            })
        }
        AdminSubcommand::Delete { kind, id } => {
            match kind {
                ResourceKind::Event => resources.delete::<Event>(id).await?,
                ResourceKind::Match => resources.delete::<Match>(id).await?,
                ResourceKind::Team => resources.delete::<Team>(id).await?,
                ResourceKind::Player => resources.delete::<Player>(id).await?,
            }
            println!("Deleted {:?} {}", kind, id);
            Ok(())
        }
    }
}

/// Upload a local image and return its hosted URL.
async fn upload(state: &AppState, path: &Path) -> Result<String, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let url = state
        .resources
        .upload_image(&filename, image_mime(path), bytes)
        .await?;
    Ok(url)
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn parse_day(raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, CliError> {
    raw.map(|r| parse_date(r).ok_or_else(|| CliError::InvalidDate(r.to_string())))
        .transpose()
}

fn normalize_timestamp(raw: &str) -> Result<String, CliError> {
    parse_timestamp(raw)
        .map(format_utc_rfc3339)
        .ok_or_else(|| CliError::InvalidDate(raw.to_string()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ggez_client=info,warn"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
