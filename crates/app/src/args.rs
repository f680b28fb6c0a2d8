use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{ParseIdError, ResultId, Subject, SubjectError};

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArg(&'static str),
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSubject(SubjectError),
    InvalidPage { raw: String },
    InvalidResultId(ParseIdError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg(name) => write!(f, "missing {name}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSubject(err) => write!(f, "invalid --subject value: {err}"),
            ArgsError::InvalidPage { raw } => write!(f, "invalid --page value: {raw}"),
            ArgsError::InvalidResultId(err) => write!(f, "invalid result id: {err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Quiz { subject: Subject },
    Results { page: u32 },
    Result { id: ResultId, review: bool },
}

#[derive(Debug)]
pub struct Args {
    pub db_url: String,
    pub api_url: Option<String>,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz login   --email <email> --password <password>");
    eprintln!("  quiz logout");
    eprintln!("  quiz quiz    --subject <LP|MA|CI>");
    eprintln!("  quiz results [--page <n>]");
    eprintln!("  quiz result  <id> [--review]");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>   local store (default {DEFAULT_DB_URL})");
    eprintln!("  --api <url>         quiz API base url");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_URL, QUIZ_API_TIMEOUT_SECS, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    /// Parse everything after the program name. `Ok(None)` means help was
    /// requested.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let name = match args.next() {
            None => return Err(ArgsError::MissingCommand),
            Some(arg) if arg == "--help" || arg == "-h" => return Ok(None),
            Some(arg) => arg,
        };

        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut api_url = None;
        let mut email = None;
        let mut password = None;
        let mut subject = None;
        let mut page = 1_u32;
        let mut review = false;
        let mut positional = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => api_url = Some(require_value(&mut args, "--api")?),
                "--email" => email = Some(require_value(&mut args, "--email")?),
                "--password" => password = Some(require_value(&mut args, "--password")?),
                "--subject" => {
                    let value = require_value(&mut args, "--subject")?;
                    subject = Some(value.parse::<Subject>().map_err(ArgsError::InvalidSubject)?);
                }
                "--page" => {
                    let value = require_value(&mut args, "--page")?;
                    page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|page| *page > 0)
                        .ok_or(ArgsError::InvalidPage { raw: value })?;
                }
                "--review" => review = true,
                "--help" | "-h" => return Ok(None),
                _ if !arg.starts_with("--") && positional.is_none() => positional = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match name.as_str() {
            "login" => Command::Login {
                email: email.ok_or(ArgsError::MissingValue { flag: "--email" })?,
                password: password.ok_or(ArgsError::MissingValue { flag: "--password" })?,
            },
            "logout" => Command::Logout,
            "quiz" => Command::Quiz {
                subject: subject.ok_or(ArgsError::MissingValue { flag: "--subject" })?,
            },
            "results" => Command::Results { page },
            "result" => Command::Result {
                id: positional
                    .take()
                    .ok_or(ArgsError::MissingArg("result id"))?
                    .parse::<ResultId>()
                    .map_err(ArgsError::InvalidResultId)?,
                review,
            },
            _ => return Err(ArgsError::UnknownCommand(name)),
        };
        if let Some(extra) = positional {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            db_url,
            api_url,
            command,
        }))
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file exists; `sqlx` will not create it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ArgsError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|_| invalid())?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|_| invalid())?;
    }
    Ok(())
}
