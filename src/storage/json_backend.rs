use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::StorageError,
    ledger::Journal,
    recurring::ReminderBook,
    utils::{ensure_dir, PathResolver},
};

use super::{Result, StorageBackend};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Stores each reminder book as pretty JSON under `<root>/books`, with its
/// journal alongside in `<root>/journals` and rolling snapshots in
/// `<root>/backups/<book>`.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    books_dir: PathBuf,
    journals_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let books_dir = PathResolver::books_dir_in(&app_root);
        let journals_dir = PathResolver::journals_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&books_dir)?;
        ensure_dir(&journals_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            books_dir,
            journals_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn book_path(&self, name: &str) -> PathBuf {
        self.books_dir.join(format!("{}.json", canonical_name(name)))
    }

    pub fn journal_path(&self, name: &str) -> PathBuf {
        self.journals_dir
            .join(format!("{}.json", canonical_name(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Journal of transactions materialized for book `name`; empty when none
    /// was written yet.
    pub fn load_journal(&self, name: &str) -> Result<Journal> {
        let path = self.journal_path(name);
        if path.exists() {
            read_json(&path)
        } else {
            Ok(Journal::new())
        }
    }

    pub fn save_journal(&self, journal: &Journal, name: &str) -> Result<()> {
        write_json(journal, &self.journal_path(name))
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_name = unused_backup_name(&dir, name, None);
        fs::copy(path, dir.join(&backup_name))?;
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            let path = self.backup_path(name, entry);
            if let Err(err) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, book: &ReminderBook, name: &str) -> Result<()> {
        let path = self.book_path(name);
        self.backup_existing_file(name, &path)?;
        write_json(book, &path)?;
        tracing::info!(book = name, reminders = book.len(), "reminder book saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<ReminderBook> {
        load_book_from_path(&self.book_path(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.book_path(name).exists()
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(&self, book: &ReminderBook, name: &str, note: Option<&str>) -> Result<String> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_name = unused_backup_name(&dir, name, note);
        write_json(book, &dir.join(&backup_name))?;
        self.prune_backups(name)?;
        tracing::info!(book = name, backup = %backup_name, "backup written");
        Ok(backup_name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<ReminderBook> {
        if !is_plain_file_name(backup_name) {
            return Err(StorageError::InvalidBackupName(backup_name.to_string()));
        }
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(StorageError::BackupNotFound(backup_name.to_string()));
        }
        let book = load_book_from_path(&backup_path)?;
        let target = self.book_path(name);
        fs::copy(&backup_path, &target)?;
        tracing::info!(book = name, backup = backup_name, "backup restored");
        Ok(book)
    }
}

pub fn save_book_to_path(book: &ReminderBook, path: &Path) -> Result<()> {
    write_json(book, path)
}

pub fn load_book_from_path(path: &Path) -> Result<ReminderBook> {
    let book: ReminderBook = read_json(path)?;
    book.validate()?;
    Ok(book)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    write_file(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn backup_stem(name: &str, note: Option<&str>) -> String {
    let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
    let mut stem = format!("{}_{}", canonical_name(name), timestamp);
    if let Some(label) = sanitize_backup_note(note) {
        stem.push('_');
        stem.push_str(&label);
    }
    stem
}

/// Backup file name that does not exist yet in `dir`. Backups taken within
/// the same second get a `_2`, `_3`, ... counter.
fn unused_backup_name(dir: &Path, name: &str, note: Option<&str>) -> String {
    let stem = backup_stem(name, note);
    let mut candidate = format!("{}.{}", stem, BACKUP_EXTENSION);
    let mut counter = 2;
    while dir.join(&candidate).exists() {
        candidate = format!("{}_{}.{}", stem, counter, BACKUP_EXTENSION);
        counter += 1;
    }
    candidate
}

/// A bare file name: no separators, no parent references.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "reminders".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Finds the `<YYYYmmdd>_<HHMMSS>` pair inside a backup file name.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let parts: Vec<&str> = stem.split('_').collect();
    parts.windows(2).rev().find_map(|pair| {
        if !is_digits(pair[0], 8) || !is_digits(pair[1], 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", pair[0], pair[1]), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
