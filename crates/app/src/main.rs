use std::fmt;
use std::path::PathBuf;

use lesson_core::model::{AwardPolicy, Catalog};
use lesson_core::session::{HeartsPolicy, SessionRules};
use services::{AppServices, Clock, load_catalog_from_path, load_catalog_from_str};
use tracing_subscriber::EnvFilter;

mod play;

const DEFAULT_CATALOG: &str = include_str!("../data/lessons.json");
const DEFAULT_LANGUAGE: &str = "english";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    BlankValue { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::BlankValue { flag } => write!(f, "{flag} cannot be blank"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::BlankValue { flag });
    }
    Ok(value)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  learn lessons  [--lang <code>] [options]");
    eprintln!("  learn play     [--lang <code>] [--lesson <id>] [options]");
    eprintln!("  learn progress [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     progress database (default sqlite://<cwd>/learn.sqlite3)");
    eprintln!("  --catalog <path>      lesson catalog JSON (default: built-in lessons)");
    eprintln!("  --keep-playing        keep answering at zero hearts instead of failing");
    eprintln!("  --repeat-awards       award points every time a lesson is completed");
    eprintln!("  -v, --verbose         debug logging");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_LANGUAGE, LEARN_CATALOG, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Lessons,
    Play,
    Progress,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "lessons" => Some(Self::Lessons),
            "play" => Some(Self::Play),
            "progress" => Some(Self::Progress),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    catalog: Option<PathBuf>,
    language: String,
    lesson: Option<String>,
    hearts_policy: HeartsPolicy,
    award_policy: AwardPolicy,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    parsed.db_url = sqlite_url(&value);
                }
                "--catalog" => {
                    parsed.catalog = Some(PathBuf::from(require_value(args, "--catalog")?));
                }
                "--lang" => parsed.language = require_value(args, "--lang")?,
                "--lesson" => parsed.lesson = Some(require_value(args, "--lesson")?),
                "--keep-playing" => parsed.hearts_policy = HeartsPolicy::KeepPlaying,
                "--repeat-awards" => parsed.award_policy = AwardPolicy::EveryCompletion,
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn from_env() -> Self {
        let db_url = non_blank_env("LEARN_DB_URL")
            .map_or_else(|| sqlite_url("learn.sqlite3"), |value| sqlite_url(&value));
        Self {
            db_url,
            catalog: non_blank_env("LEARN_CATALOG").map(PathBuf::from),
            language: non_blank_env("LEARN_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.into()),
            lesson: None,
            hearts_policy: HeartsPolicy::default(),
            award_policy: AwardPolicy::default(),
            verbose: false,
        }
    }

    fn rules(&self) -> SessionRules {
        SessionRules::default().with_hearts_policy(self.hearts_policy)
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Turn a `--db` value or bare path into an absolute `sqlite://` URL.
/// In-memory and `sqlite:file:` URIs pass through untouched.
fn sqlite_url(raw: &str) -> String {
    let raw = raw.trim();
    if ["sqlite::memory:", "sqlite://", "sqlite:file:"]
        .iter()
        .any(|prefix| raw.starts_with(prefix))
    {
        return raw.to_owned();
    }

    let path = PathBuf::from(raw.strip_prefix("sqlite:").unwrap_or(raw));
    let path = if path.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    } else {
        path
    };
    format!("sqlite://{}", path.display())
}

/// Where a database URL stores its data.
#[derive(Debug, PartialEq, Eq)]
enum DbLocation {
    Memory,
    File(PathBuf),
}

fn db_location(db_url: &str) -> Result<DbLocation, ArgsError> {
    if db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory") {
        return Ok(DbLocation::Memory);
    }
    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:file:"))
        .ok_or_else(invalid)?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    if path.is_empty() {
        return Err(invalid());
    }
    Ok(DbLocation::File(PathBuf::from(path)))
}

/// Create the database file and its directory so a first run can connect.
fn ensure_db_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let DbLocation::File(path) = db_location(db_url)? else {
        return Ok(());
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    // create_new never truncates an existing database.
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(_) => tracing::info!(path = %path.display(), "created progress database"),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog, services::CatalogLoadError> {
    match path {
        Some(path) => load_catalog_from_path(path),
        None => load_catalog_from_str(DEFAULT_CATALOG),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Lessons,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with('-') => Command::Lessons,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|first| !first.starts_with('-')) {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing(parsed.verbose);

    let catalog = load_catalog(parsed.catalog.as_ref())?;
    ensure_db_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), catalog)
        .await?
        .with_rules(parsed.rules())
        .with_award_policy(parsed.award_policy);
    tracing::debug!(db_url = %parsed.db_url, language = %parsed.language, "services ready");

    match cmd {
        Command::Lessons => {
            print_lessons(&services, &parsed.language).await;
            Ok(())
        }
        Command::Progress => {
            let progress = services.progress_store().progress().await;
            println!("{}", serde_json::to_string_pretty(&progress)?);
            Ok(())
        }
        Command::Play => {
            let player = services.lesson_player();
            let lesson_id = match parsed.lesson {
                Some(id) => id,
                None => next_lesson_id(&services, &parsed.language)
                    .await
                    .ok_or_else(|| format!("no lessons for language {}", parsed.language))?,
            };
            play::play_lesson(player, &parsed.language, &lesson_id).await
        }
    }
}

async fn print_lessons(services: &AppServices, language: &str) {
    let lessons = services.lesson_player().lesson_list(language).await;
    if lessons.is_empty() {
        let known: Vec<&str> = services
            .catalog()
            .languages()
            .map(|code| code.as_str())
            .collect();
        println!("No lessons for {language}. Available: {}", known.join(", "));
        return;
    }

    println!("Lessons ({language}):");
    for lesson in lessons {
        let mark = if lesson.completed { "x" } else { " " };
        println!(
            "  [{mark}] {:>3}  {} ({} steps)",
            lesson.id, lesson.title, lesson.step_count
        );
    }
}

/// First lesson not yet completed, or the first lesson when all are done.
async fn next_lesson_id(services: &AppServices, language: &str) -> Option<String> {
    let lessons = services.lesson_player().lesson_list(language).await;
    lessons
        .iter()
        .find(|lesson| !lesson.completed)
        .or_else(|| lessons.first())
        .map(|lesson| lesson.id.clone())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
