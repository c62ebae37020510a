//! Command-line front end over a stored reminder book.

pub mod commands;
pub mod output;

use std::collections::{HashMap, HashSet};
use std::env;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::{Config, ConfigManager};
use crate::errors::{ReminderError, StorageError};
use crate::storage::JsonStorage;

/// When set, the CLI never prompts and uses the precomputed approvals.
pub const SCRIPT_ENV: &str = "REMINDER_CORE_CLI_SCRIPT";

const BOOLEAN_FLAGS: &[&str] = &["all", "auto", "backlog", "disabled", "quiet"];

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Reminder(#[from] ReminderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

impl CliError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        CliError::InvalidArguments(message.into())
    }
}

/// Positional arguments plus `--name value` options and bare `--flag`s.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    pub positional: Vec<String>,
    options: HashMap<String, String>,
    flags: HashSet<String>,
}

impl ParsedArgs {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = ParsedArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            if BOOLEAN_FLAGS.contains(&name) {
                parsed.flags.insert(name.to_string());
                continue;
            }
            let value = args
                .next()
                .ok_or_else(|| CliError::usage(format!("option --{name} needs a value")))?;
            parsed.options.insert(name.to_string(), value);
        }
        Ok(parsed)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn positional(&self, index: usize, what: &str) -> Result<&str, CliError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CliError::usage(format!("missing {what}")))
    }

    pub fn date_option(&self, name: &str) -> Result<Option<NaiveDate>, CliError> {
        self.option(name).map(parse_date).transpose()
    }

    pub fn number_option<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, CliError> {
        self.option(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| CliError::usage(format!("--{name} expects a number, got `{raw}`")))
            })
            .transpose()
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::usage(format!("invalid date `{raw}` (expected YYYY-MM-DD)")))
}

/// Everything a command needs: storage, preferences and the selected book.
pub struct CliContext {
    pub storage: JsonStorage,
    pub config: Config,
    pub book_name: String,
    pub script_mode: bool,
}

impl CliContext {
    pub fn from_env(book: Option<&str>) -> Result<Self, CliError> {
        let config = ConfigManager::new()?.load()?;
        let storage = JsonStorage::new(None, Some(config.backup_retention))?;
        let book_name = book
            .map(str::to_string)
            .unwrap_or_else(|| config.default_book.clone());
        Ok(Self {
            storage,
            config,
            book_name,
            script_mode: env::var_os(SCRIPT_ENV).is_some(),
        })
    }
}

/// Parses `args` (without the program name) and runs the selected command.
pub fn run<I>(args: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = ParsedArgs::parse(args)?;
    if parsed.positional.is_empty() {
        print_usage();
        return Err(CliError::usage("no command given"));
    }
    let command = parsed.positional.remove(0);

    if command == "version" {
        commands::version();
        return Ok(());
    }
    if matches!(command.as_str(), "help" | "-h") {
        print_usage();
        return Ok(());
    }

    let ctx = CliContext::from_env(parsed.option("book"))?;
    output::set_preferences(output::OutputPreferences {
        plain: ctx.script_mode,
        quiet: parsed.flag("quiet"),
    });
    tracing::debug!(command = %command, book = %ctx.book_name, "dispatching command");

    match command.as_str() {
        "list" => commands::list(&ctx),
        "add" => commands::add(&ctx, &parsed),
        "remove" => commands::remove(&ctx, &parsed),
        "enable" => commands::set_enabled(&ctx, &parsed, true),
        "disable" => commands::set_enabled(&ctx, &parsed, false),
        "preview" => commands::preview(&ctx, &parsed),
        "pending" => commands::pending(&ctx, &parsed),
        "approve" => commands::approve(&ctx, &parsed),
        "backups" => commands::backups(&ctx),
        "restore" => commands::restore(&ctx, &parsed),
        other => {
            print_usage();
            Err(CliError::usage(format!("unknown command `{other}`")))
        }
    }
}

pub fn print_usage() {
    eprintln!(
        "Usage: reminder_core_cli [--book <name>] <command>\n\
         Commands:\n  \
         list\n  \
         add <description> <kind> <start YYYY-MM-DD> [--every N] [--until DATE] [--advance DAYS] [--auto] [--disabled]\n      \
         [--amount X --from <account-uuid> --to <account-uuid> [--memo TEXT]]\n  \
         remove <id>\n  \
         enable <id> | disable <id>\n  \
         preview <id> [--count N]\n  \
         pending [--as-of DATE] [--backlog]\n  \
         approve [--as-of DATE] [--backlog] [--all]\n  \
         backups | restore <backup-file>\n  \
         version\n\
         Kinds: once, daily, weekly, monthly, monthly-weekday, yearly"
    );
}
