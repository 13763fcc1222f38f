use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Weekday};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::builder::{reduce, Action, Update};
use crate::cadence::{self, Recurrence};
use crate::config::BuilderDefaults;
use crate::csv_import::{self, ImportSummary, ParseOptions};
use crate::data::{
    BuilderState, Cadence, ImportRow, LookbackDays, Recipient, RecipientKey, RowStatus,
};
use crate::payload;
use crate::status::{self, BuilderVariant};

pub fn resolve_now(now: Option<NaiveDateTime>) -> NaiveDateTime {
    now.unwrap_or_else(|| Local::now().naive_local())
}

/// Known addresses, one per line. Blank lines are ignored.
fn read_existing_emails(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read existing emails: {:?}", path))?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Read and parse a contacts CSV, flagging rows already in `existing`
pub fn preview_import(
    file: &Path,
    existing: Option<&Path>,
    require_name: bool,
) -> Result<(Vec<ImportRow>, ImportSummary)> {
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read CSV: {:?}", file))?;

    let mut rows = csv_import::parse_with(&text, ParseOptions { require_name })?;
    if let Some(path) = existing {
        let known = read_existing_emails(path)?;
        csv_import::mark_duplicates(&mut rows, &known);
    }

    let summary = ImportSummary::from_rows(&rows);
    Ok((rows, summary))
}

/// Parse a contacts CSV and print the import preview
pub fn import_csv(
    file: &Path,
    existing: Option<&Path>,
    require_name: bool,
    format: &str,
) -> Result<()> {
    let (rows, summary) = preview_import(file, existing, require_name)?;
    tracing::info!(
        batch_id = %summary.batch_id,
        total = summary.total,
        valid = summary.valid,
        errors = summary.errors,
        duplicates = summary.duplicates,
        "Import preview ready"
    );

    match format {
        "json" => {
            let out = serde_json::json!({
                "summary": summary,
                "rows": rows,
                "importable": csv_import::importable(&rows),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "table" => {
            println!(
                "{:<6} {:<32} {:<24} {:<10} REASON",
                "LINE", "EMAIL", "NAME", "STATUS"
            );
            println!("{}", "-".repeat(84));
            for row in &rows {
                let status = match row.status {
                    RowStatus::Valid => "valid",
                    RowStatus::Error => "error",
                    RowStatus::Duplicate => "duplicate",
                };
                println!(
                    "{:<6} {:<32} {:<24} {:<10} {}",
                    row.line,
                    row.email,
                    row.name,
                    status,
                    row.reason.as_deref().unwrap_or("")
                );
            }
            println!();
            println!(
                "{} rows: {} ready to import, {} errors, {} duplicates",
                summary.total, summary.valid, summary.errors, summary.duplicates
            );
        }
        other => anyhow::bail!("Unknown format: {} (supported: table, json)", other),
    }

    Ok(())
}

pub fn load_state(path: &Path) -> Result<BuilderState> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read state: {:?}", path))?;
    let state: BuilderState = serde_json::from_str(&content)
        .with_context(|| format!("Invalid state JSON: {:?}", path))?;
    Ok(state)
}

fn save_state(path: &Path, state: &BuilderState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("Failed to write state: {:?}", path))?;
    Ok(())
}

/// Write a fresh builder state seeded from the defaults
pub fn init_state(config: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let defaults = BuilderDefaults::load_or_default(config)?;
    let state = BuilderState::from_defaults(&defaults);

    match output {
        Some(path) => {
            save_state(path, &state)?;
            println!("Wrote new builder state to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(())
}

fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .with_context(|| format!("Invalid value for {}: {}", field, value))
}

fn parse_number(field: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid number for {}: {}", field, value))
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid flag for {} (expected true/false): {}", field, value))
}

/// Turn a `field=value` pair from the command line into an update.
pub fn parse_assignment(assignment: &str) -> Result<Update> {
    let (field, value) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected field=value, got: {}", assignment))?;
    let field = field.trim();
    let value = value.trim();
    let unset = value.is_empty() || value.eq_ignore_ascii_case("none");

    let update = match field {
        "name" => Update::Name(value.to_string()),
        "report_type" => Update::ReportType(parse_enum(field, value)?),
        "lookback_days" => {
            let days = parse_number(field, value)?;
            Update::LookbackDays(LookbackDays::try_from(days).map_err(anyhow::Error::msg)?)
        }
        "area_type" => Update::AreaType(parse_enum(field, value)?),
        "city" => Update::City((!unset).then(|| value.to_string())),
        "zip_codes" => Update::ZipCodes(value.split(',').map(|z| z.to_string()).collect()),
        "audience_filter" => {
            Update::AudienceFilter(if unset { None } else { Some(parse_enum(field, value)?) })
        }
        "cadence" => Update::Cadence(parse_enum(field, value)?),
        "weekly_day_of_week" => Update::WeeklyDayOfWeek(
            value
                .parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("Invalid weekday: {}", value))?,
        ),
        "monthly_day_of_month" => Update::MonthlyDayOfMonth(parse_number(field, value)?),
        "send_hour" => Update::SendHour(parse_number(field, value)?),
        "send_minute" => Update::SendMinute(parse_number(field, value)?),
        "timezone" => Update::Timezone(value.to_string()),
        "view_in_browser" => Update::ViewInBrowser(parse_flag(field, value)?),
        "download_pdf" => Update::DownloadPdf(parse_flag(field, value)?),
        "download_social_image" => Update::DownloadSocialImage(parse_flag(field, value)?),
        "send_via_email" => Update::SendViaEmail(parse_flag(field, value)?),
        "recipients" => anyhow::bail!("Use --add-contact, --add-group or --add-email for recipients"),
        other => anyhow::bail!("Unknown field: {}", other),
    };

    Ok(update)
}

pub struct EditRequest<'a> {
    pub assignments: &'a [String],
    pub add_contacts: &'a [String],
    pub add_groups: &'a [String],
    pub add_emails: &'a [String],
    pub remove: &'a [String],
}

/// `contact:<id>`, `group:<id>` or `email:<address>`
pub fn parse_recipient_key(raw: &str) -> Result<RecipientKey> {
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Expected kind:value, got: {}", raw))?;
    let value = value.trim().to_string();
    match kind.trim() {
        "contact" => Ok(RecipientKey::Contact(value)),
        "group" => Ok(RecipientKey::Group(value)),
        "email" => Ok(RecipientKey::Email(value.to_lowercase())),
        other => anyhow::bail!("Unknown recipient kind: {} (contact, group, email)", other),
    }
}

/// Apply edits to a state file in order, then save it back
pub fn edit_state(path: &Path, edits: &EditRequest, variant: BuilderVariant, now: NaiveDateTime) -> Result<()> {
    let mut actions: Vec<Action> = Vec::new();
    for assignment in edits.assignments {
        actions.push(parse_assignment(assignment)?.into());
    }
    actions.extend(edits.add_contacts.iter().map(|id| {
        Action::AddRecipient(Recipient::Contact {
            id: id.clone(),
            name: None,
        })
    }));
    actions.extend(edits.add_groups.iter().map(|id| {
        Action::AddRecipient(Recipient::Group {
            id: id.clone(),
            name: None,
        })
    }));
    actions.extend(
        edits
            .add_emails
            .iter()
            .map(|email| Action::AddRecipient(Recipient::ManualEmail { email: email.clone() })),
    );
    for raw in edits.remove {
        actions.push(Action::RemoveRecipient(parse_recipient_key(raw)?));
    }

    let applied = actions.len();
    let state = actions.into_iter().fold(load_state(path)?, reduce);
    save_state(path, &state)?;

    tracing::info!(path = %path.display(), applied, "Builder state updated");
    print_status(&state, variant, now);
    Ok(())
}

fn print_status(state: &BuilderState, variant: BuilderVariant, now: NaiveDateTime) {
    for view in status::section_views(state, variant, now) {
        println!(
            "{} {:<12} {}",
            view.status.icon(),
            view.section.label(),
            view.summary
        );
    }

    let blocking = status::blocking_sections(state, variant);
    if blocking.is_empty() {
        println!("\nSubmit: enabled");
    } else {
        let labels: Vec<_> = blocking.iter().map(|s| s.label()).collect();
        println!("\nSubmit: disabled ({})", labels.join(", "));
    }
}

/// Show per-section status and the submit gate for a state file
pub fn show_status(path: &Path, variant: BuilderVariant, now: NaiveDateTime, format: &str) -> Result<()> {
    let state = load_state(path)?;

    match format {
        "json" => {
            let out = serde_json::json!({
                "variant": variant,
                "sections": status::section_views(&state, variant, now),
                "blocking": status::blocking_sections(&state, variant),
                "is_valid": status::is_valid(&state, variant),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "text" => print_status(&state, variant, now),
        other => anyhow::bail!("Unknown format: {} (supported: text, json)", other),
    }
    Ok(())
}

pub struct NextRunRequest {
    pub cadence: Cadence,
    pub day_of_week: Option<Weekday>,
    pub day_of_month: Option<u32>,
    pub hour: u32,
    pub minute: u32,
}

pub fn next_run(request: &NextRunRequest, now: NaiveDateTime) -> Result<()> {
    let recurrence = match request.cadence {
        Cadence::Weekly => Recurrence::Weekly(
            request
                .day_of_week
                .ok_or_else(|| anyhow::anyhow!("--day-of-week is required for weekly cadence"))?,
        ),
        Cadence::Monthly => Recurrence::Monthly(
            request
                .day_of_month
                .ok_or_else(|| anyhow::anyhow!("--day-of-month is required for monthly cadence"))?,
        ),
    };

    let at = cadence::next_run(recurrence, request.hour, request.minute, now)
        .ok_or_else(|| anyhow::anyhow!("Invalid send time {}:{:02}", request.hour, request.minute))?;

    println!("{}", cadence::format_run(at));
    Ok(())
}

/// Print the request body the builder would submit
pub fn show_payload(path: &Path, variant: BuilderVariant) -> Result<()> {
    let state = load_state(path)?;
    let body = payload::build(&state, variant)?;

    println!("POST {}", payload::endpoint(variant));
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
