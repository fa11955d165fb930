use std::fmt;

use quiz_core::model::{GradeTier, Identity, PlayerId, QuizSettings};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod play;
mod report;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSeconds { raw: String },
    InvalidLimit { raw: String },
    InvalidPlayer { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid database url: {raw}"),
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidPlayer { raw } => write!(f, "invalid --player value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play]       [--grade <4-8>] [--seconds <n>] [player flags] [db flags]");
    eprintln!("  quiz stats        [--json] [player flags] [db flags]");
    eprintln!("  quiz leaderboard  [--limit <n>] [--json] [db flags]");
    eprintln!();
    eprintln!("Player flags:  --player <id> [--name <display name>] [--email <address>]");
    eprintln!("Db flags:      --db <sqlite_url> [--remote-db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3, remote store shares the local database");
    eprintln!("  --grade: last grade played (4 when none)");
    eprintln!("  --seconds 60");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_REMOTE_DB_URL, QUIZ_GRADE, QUIZ_PLAYER_ID,");
    eprintln!("  QUIZ_PLAYER_NAME, QUIZ_SESSION_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
    Leaderboard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            "leaderboard" => Some(Self::Leaderboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    remote_db_url: Option<String>,
    grade: Option<GradeTier>,
    player: Option<String>,
    name: Option<String>,
    email: Option<String>,
    session_secs: Option<u32>,
    limit: Option<u32>,
    json: bool,
}

impl Args {
    fn from_env() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url),
            remote_db_url: std::env::var("QUIZ_REMOTE_DB_URL")
                .ok()
                .map(normalize_sqlite_url),
            grade: std::env::var("QUIZ_GRADE")
                .ok()
                .map(|raw| GradeTier::parse_lenient(&raw)),
            player: std::env::var("QUIZ_PLAYER_ID").ok(),
            name: std::env::var("QUIZ_PLAYER_NAME").ok(),
            email: None,
            session_secs: std::env::var("QUIZ_SESSION_SECS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok()),
            limit: None,
            json: false,
        }
    }

    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--remote-db" => {
                    let value = require_value(args, "--remote-db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.remote_db_url = Some(normalize_sqlite_url(value));
                }
                "--grade" => {
                    let value = require_value(args, "--grade")?;
                    parsed.grade = Some(GradeTier::parse_lenient(&value));
                }
                "--player" => parsed.player = Some(require_value(args, "--player")?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    let secs = value
                        .parse::<u32>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ArgsError::InvalidSeconds { raw: value.clone() })?;
                    parsed.session_secs = Some(secs);
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    let limit = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                    parsed.limit = Some(limit);
                }
                "--json" => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn identity(&self) -> Result<Option<Identity>, ArgsError> {
        let Some(raw) = &self.player else {
            return Ok(None);
        };
        let player_id =
            PlayerId::new(raw.clone()).map_err(|_| ArgsError::InvalidPlayer { raw: raw.clone() })?;
        let mut identity = Identity::new(player_id);
        if let Some(name) = &self.name {
            identity = identity.with_display_name(name.clone());
        }
        if let Some(email) = &self.email {
            identity = identity.with_email(email.clone());
        }
        Ok(Some(identity))
    }

    fn settings(&self) -> Result<QuizSettings, Box<dyn std::error::Error>> {
        let settings = QuizSettings::default();
        Ok(match self.session_secs {
            Some(secs) => settings.with_session_secs(secs)?,
            None => settings,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_services(args: &Args) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(&args.db_url)?;
    if let Some(remote) = &args.remote_db_url {
        prepare_sqlite_file(remote)?;
    }
    let services = AppServices::new_sqlite(
        &args.db_url,
        args.remote_db_url.as_deref(),
        Clock::default(),
        args.settings()?,
    )
    .await?;
    Ok(services)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means a round of play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let identity = parsed.identity()?;
    let services = open_services(&parsed).await?;

    match cmd {
        Command::Play => play::play(&services, parsed.grade, identity).await,
        Command::Stats => report::stats(&services, identity.as_ref(), parsed.json).await,
        Command::Leaderboard => report::leaderboard(&services, parsed.limit, parsed.json).await,
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never interleave with the quiz on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
