use std::str::FromStr;

use chrono::{Local, NaiveDate};
use dialoguer::{theme::ColorfulTheme, MultiSelect};
use uuid::Uuid;

use super::{output, CliContext, CliError, ParsedArgs};
use crate::ledger::TransactionTemplate;
use crate::recurring::{
    apply_approved, compute_backlog, compute_pending, ApplyReport, PendingReminder,
    RecurrenceKind, RecurrenceRule, Reminder, ReminderBook,
};
use crate::storage::StorageBackend;
use crate::utils::build_info;

const DEFAULT_PREVIEW_COUNT: usize = 5;

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_book(ctx: &CliContext) -> Result<ReminderBook, CliError> {
    Ok(ctx.storage.load_or_create(&ctx.book_name)?)
}

fn save_book(ctx: &CliContext, book: &ReminderBook) -> Result<(), CliError> {
    Ok(ctx.storage.save(book, &ctx.book_name)?)
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw).map_err(|_| CliError::usage(format!("invalid {what} `{raw}`")))
}

pub fn version() {
    output::row(build_info::current().summary());
}

pub fn list(ctx: &CliContext) -> Result<(), CliError> {
    let book = load_book(ctx)?;
    if book.is_empty() {
        output::info(format!("No reminders in `{}`.", ctx.book_name));
        return Ok(());
    }
    output::section(format!("Reminders in {}", book.name));
    for reminder in book.sorted() {
        let next = reminder
            .next_due_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".into());
        let mut line = format!(
            "{}  {:<24}  {:<40}  next: {}",
            short_id(reminder.id()),
            reminder.description(),
            reminder.rule().describe(reminder.start_date()),
            next
        );
        if !reminder.is_enabled() {
            line.push_str("  (disabled)");
        }
        if reminder.is_auto_create() {
            line.push_str("  (auto)");
        }
        output::row(line);
    }
    Ok(())
}

fn template_from_args(args: &ParsedArgs) -> Result<Option<TransactionTemplate>, CliError> {
    let Some(amount) = args.number_option::<f64>("amount")? else {
        return Ok(None);
    };
    let from = args
        .option("from")
        .ok_or_else(|| CliError::usage("--amount needs --from <account-uuid>"))?;
    let to = args
        .option("to")
        .ok_or_else(|| CliError::usage("--amount needs --to <account-uuid>"))?;
    let mut template = TransactionTemplate::new(
        parse_uuid(from, "account id")?,
        parse_uuid(to, "account id")?,
        amount,
    );
    if let Some(memo) = args.option("memo") {
        template = template.with_memo(memo);
    }
    Ok(Some(template))
}

pub fn add(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let description = args.positional(0, "description")?;
    let kind = RecurrenceKind::from_str(args.positional(1, "recurrence kind")?)?;
    let start = super::parse_date(args.positional(2, "start date")?)?;

    let mut rule = RecurrenceRule::new(kind, args.number_option("every")?.unwrap_or(1));
    if let Some(end) = args.date_option("until")? {
        rule = rule.until(end);
    }
    let mut reminder = Reminder::new(description, rule, start)?;
    reminder.set_days_advance(
        args.number_option("advance")?
            .unwrap_or(ctx.config.default_days_advance),
    );
    reminder.set_auto_create(args.flag("auto"));
    reminder.set_enabled(!args.flag("disabled"));
    reminder.set_notes(args.option("notes").map(str::to_string));
    reminder.set_transaction(template_from_args(args)?);

    let mut book = load_book(ctx)?;
    let id = book.add(reminder)?;
    save_book(ctx, &book)?;
    output::success(format!("Added reminder {} `{}`", short_id(id), description));
    Ok(())
}

pub fn remove(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let mut book = load_book(ctx)?;
    let id = book.find_by_prefix(args.positional(0, "reminder id")?)?.id();
    let removed = book.remove(id)?;
    save_book(ctx, &book)?;
    output::success(format!("Removed reminder `{}`", removed.description()));
    Ok(())
}

pub fn set_enabled(ctx: &CliContext, args: &ParsedArgs, enabled: bool) -> Result<(), CliError> {
    let mut book = load_book(ctx)?;
    let mut edit = book
        .find_by_prefix(args.positional(0, "reminder id")?)?
        .clone();
    edit.set_enabled(enabled);
    let description = edit.description().to_string();
    book.update(edit)?;
    save_book(ctx, &book)?;
    let state = if enabled { "enabled" } else { "disabled" };
    output::success(format!("Reminder `{description}` {state}"));
    Ok(())
}

pub fn preview(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let book = load_book(ctx)?;
    let reminder = book.find_by_prefix(args.positional(0, "reminder id")?)?;
    let count = args
        .number_option("count")?
        .unwrap_or(DEFAULT_PREVIEW_COUNT);

    output::section(format!(
        "{} ({})",
        reminder.description(),
        reminder.rule().describe(reminder.start_date())
    ));
    let upcoming: Vec<NaiveDate> = reminder.iter().take(count).collect();
    if upcoming.is_empty() {
        output::info("No further occurrences.");
    }
    for date in upcoming {
        output::row(date);
    }
    Ok(())
}

fn resolve(
    ctx: &CliContext,
    args: &ParsedArgs,
    book: &ReminderBook,
) -> Result<Vec<PendingReminder>, CliError> {
    let as_of = args.date_option("as-of")?.unwrap_or_else(today);
    let mut pending = if args.flag("backlog") {
        compute_backlog(book.reminders(), as_of)
    } else {
        compute_pending(book.reminders(), as_of)
    };
    if !ctx.config.auto_approve_auto_create {
        pending.iter_mut().for_each(PendingReminder::decline);
    }
    Ok(pending)
}

fn pending_line(entry: &PendingReminder) -> String {
    let mut line = format!("{}  {}", entry.due_date, entry.description);
    if entry.auto_create {
        line.push_str("  (auto)");
    }
    line
}

pub fn pending(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let book = load_book(ctx)?;
    let pending = resolve(ctx, args, &book)?;
    if pending.is_empty() {
        output::info("Nothing due.");
        return Ok(());
    }
    output::section("Pending reminders");
    for entry in &pending {
        output::row(pending_line(entry));
    }
    Ok(())
}

fn review(pending: &mut [PendingReminder]) -> Result<(), CliError> {
    let labels: Vec<String> = pending.iter().map(pending_line).collect();
    let defaults: Vec<bool> = pending.iter().map(|entry| entry.approved).collect();
    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select reminders to record (space toggles, enter confirms)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;
    for (index, entry) in pending.iter_mut().enumerate() {
        if chosen.contains(&index) {
            entry.approve();
        } else {
            entry.decline();
        }
    }
    Ok(())
}

fn report_outcome(book: &ReminderBook, report: &ApplyReport) {
    for fired in &report.fired {
        let description = book
            .get(fired.reminder_id)
            .map(Reminder::description)
            .unwrap_or("(removed)");
        let suffix = match fired.transaction_id {
            Some(txn) => format!(" (transaction {})", short_id(txn)),
            None => String::new(),
        };
        output::success(format!("Recorded `{description}` for {}{suffix}", fired.due_date));
    }
    for failure in &report.failures {
        output::warning(format!(
            "{} on {} not applied: {}",
            short_id(failure.reminder_id),
            failure.due_date,
            failure.error
        ));
    }
    if report.declined > 0 {
        output::info(format!("{} reminder(s) left pending", report.declined));
    }
}

pub fn approve(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let mut book = load_book(ctx)?;
    let mut pending = resolve(ctx, args, &book)?;
    if pending.is_empty() {
        output::info("Nothing due.");
        return Ok(());
    }
    if args.flag("all") {
        pending.iter_mut().for_each(PendingReminder::approve);
    } else if !ctx.script_mode {
        review(&mut pending)?;
    }

    let mut journal = ctx.storage.load_journal(&ctx.book_name)?;
    let original = book.clone();
    let report = apply_approved(&mut book, &pending, &mut journal);
    if !report.fired.is_empty() {
        save_book(ctx, &book)?;
        if let Err(err) = ctx.storage.save_journal(&journal, &ctx.book_name) {
            // Put the cursors back so the unrecorded occurrences stay due.
            if let Err(rollback) = save_book(ctx, &original) {
                tracing::error!(error = %rollback, "book rollback failed after journal write error");
            }
            return Err(err.into());
        }
    }
    report_outcome(&book, &report);
    Ok(())
}

pub fn backups(ctx: &CliContext) -> Result<(), CliError> {
    let backups = ctx.storage.list_backups(&ctx.book_name)?;
    if backups.is_empty() {
        output::info(format!("No backups for `{}`.", ctx.book_name));
        return Ok(());
    }
    output::section(format!("Backups of {}", ctx.book_name));
    for name in backups {
        output::row(name);
    }
    Ok(())
}

pub fn restore(ctx: &CliContext, args: &ParsedArgs) -> Result<(), CliError> {
    let backup = args.positional(0, "backup file name")?;
    let book = ctx.storage.restore(&ctx.book_name, backup)?;
    output::success(format!(
        "Restored `{}` from {backup} ({} reminders)",
        ctx.book_name,
        book.len()
    ));
    Ok(())
}
