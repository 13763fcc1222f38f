use chrono::Weekday;
use std::collections::HashSet;

use crate::data::{
    AreaType, AudienceFilter, BuilderState, Cadence, LookbackDays, Recipient, RecipientKey,
    ReportType,
};
use crate::status::{is_visible, BuilderVariant, Section};

/// Replacement value for exactly one builder field
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Name(String),
    ReportType(ReportType),
    LookbackDays(LookbackDays),
    AreaType(AreaType),
    City(Option<String>),
    ZipCodes(Vec<String>),
    AudienceFilter(Option<AudienceFilter>),
    Cadence(Cadence),
    WeeklyDayOfWeek(Weekday),
    MonthlyDayOfMonth(u32),
    SendHour(u32),
    SendMinute(u32),
    Timezone(String),
    Recipients(Vec<Recipient>),
    ViewInBrowser(bool),
    DownloadPdf(bool),
    DownloadSocialImage(bool),
    SendViaEmail(bool),
}

impl Update {
    pub fn field(&self) -> &'static str {
        match self {
            Update::Name(_) => "name",
            Update::ReportType(_) => "report_type",
            Update::LookbackDays(_) => "lookback_days",
            Update::AreaType(_) => "area_type",
            Update::City(_) => "city",
            Update::ZipCodes(_) => "zip_codes",
            Update::AudienceFilter(_) => "audience_filter",
            Update::Cadence(_) => "cadence",
            Update::WeeklyDayOfWeek(_) => "weekly_day_of_week",
            Update::MonthlyDayOfMonth(_) => "monthly_day_of_month",
            Update::SendHour(_) => "send_hour",
            Update::SendMinute(_) => "send_minute",
            Update::Timezone(_) => "timezone",
            Update::Recipients(_) => "recipients",
            Update::ViewInBrowser(_) => "view_in_browser",
            Update::DownloadPdf(_) => "download_pdf",
            Update::DownloadSocialImage(_) => "download_social_image",
            Update::SendViaEmail(_) => "send_via_email",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set(Update),
    AddRecipient(Recipient),
    RemoveRecipient(RecipientKey),
}

impl From<Update> for Action {
    fn from(update: Update) -> Self {
        Action::Set(update)
    }
}

/// Apply one action and return the resulting state.
pub fn reduce(mut state: BuilderState, action: Action) -> BuilderState {
    state.dispatch(action);
    state
}

impl BuilderState {
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Set(update) => self.update_state(update),
            Action::AddRecipient(recipient) => self.add_recipient(recipient),
            Action::RemoveRecipient(key) => self.remove_recipient(&key),
        }
    }

    /// Replace a single field, keeping dependent fields consistent.
    pub fn update_state(&mut self, update: Update) {
        tracing::debug!(field = update.field(), "Builder field updated");

        match update {
            Update::Name(name) => self.name = name,
            Update::ReportType(report_type) => {
                self.report_type = report_type;
                // The audience filter only exists for some report kinds
                if !is_visible(Section::AudienceFilter, self, BuilderVariant::ReportBuilder) {
                    self.audience_filter = None;
                }
            }
            Update::LookbackDays(days) => self.lookback_days = days,
            Update::AreaType(area_type) => {
                self.area_type = area_type;
                match area_type {
                    AreaType::City => self.zip_codes.clear(),
                    AreaType::Zip => self.city = None,
                }
            }
            Update::City(city) => {
                self.city = city
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
            }
            Update::ZipCodes(zips) => self.zip_codes = normalize_zip_codes(zips),
            Update::AudienceFilter(filter) => self.audience_filter = filter,
            Update::Cadence(cadence) => self.cadence = cadence,
            Update::WeeklyDayOfWeek(day) => self.weekly_day_of_week = day,
            Update::MonthlyDayOfMonth(day) => self.monthly_day_of_month = day.clamp(1, 31),
            Update::SendHour(hour) => self.send_hour = hour.min(23),
            Update::SendMinute(minute) => self.send_minute = minute.min(59),
            Update::Timezone(timezone) => self.timezone = timezone,
            Update::Recipients(recipients) => self.recipients = dedup_recipients(recipients),
            Update::ViewInBrowser(on) => self.delivery.view_in_browser = on,
            Update::DownloadPdf(on) => self.delivery.download_pdf = on,
            Update::DownloadSocialImage(on) => self.delivery.download_social_image = on,
            Update::SendViaEmail(on) => self.delivery.send_via_email = on,
        }
    }

    /// Append a recipient unless one with the same identity is present.
    pub fn add_recipient(&mut self, recipient: Recipient) {
        let recipient = match recipient {
            Recipient::ManualEmail { email } => {
                let email = email.trim().to_lowercase();
                if !email.contains('@') {
                    tracing::debug!(email = %email, "Ignoring malformed manual recipient");
                    return;
                }
                Recipient::ManualEmail { email }
            }
            other => other,
        };

        if self.has_recipient(&recipient) {
            return;
        }
        self.recipients.push(recipient);
    }

    pub fn remove_recipient(&mut self, key: &RecipientKey) {
        self.recipients.retain(|r| &r.key() != key);
    }
}

fn dedup_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    recipients
        .into_iter()
        .filter(|r| seen.insert(r.key()))
        .collect()
}

fn normalize_zip_codes(zips: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    zips.into_iter()
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty())
        .filter(|z| seen.insert(z.clone()))
        .collect()
}
