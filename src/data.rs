use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::config::BuilderDefaults;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Valid,
    Error,
    Duplicate,
}

/// One parsed CSV record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRow {
    /// 1-based line in the source text
    pub line: usize,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: String,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ImportRow {
    pub fn is_valid(&self) -> bool {
        self.status == RowStatus::Valid
    }

    pub fn mark(&mut self, status: RowStatus, reason: impl Into<String>) {
        self.status = status;
        self.reason = Some(reason.into());
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    MarketSnapshot,
    NewListingsGallery,
    Closed,
    Inventory,
    PriceBands,
    OpenHouses,
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            ReportType::MarketSnapshot => "Market Snapshot",
            ReportType::NewListingsGallery => "New Listings Gallery",
            ReportType::Closed => "Closed Sales",
            ReportType::Inventory => "Inventory",
            ReportType::PriceBands => "Price Bands",
            ReportType::OpenHouses => "Open Houses",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ReportType::MarketSnapshot => "📊",
            ReportType::NewListingsGallery => "🏠",
            ReportType::Closed => "✅",
            ReportType::Inventory => "📦",
            ReportType::PriceBands => "💲",
            ReportType::OpenHouses => "🚪",
        }
    }
}

/// Lookback window in days. Only 7, 14, 30, 60 and 90 are offered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u32", into = "u32")]
pub enum LookbackDays {
    D7,
    D14,
    D30,
    D60,
    D90,
}

impl LookbackDays {
    pub fn days(&self) -> u32 {
        match self {
            LookbackDays::D7 => 7,
            LookbackDays::D14 => 14,
            LookbackDays::D30 => 30,
            LookbackDays::D60 => 60,
            LookbackDays::D90 => 90,
        }
    }
}

impl TryFrom<u32> for LookbackDays {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(LookbackDays::D7),
            14 => Ok(LookbackDays::D14),
            30 => Ok(LookbackDays::D30),
            60 => Ok(LookbackDays::D60),
            90 => Ok(LookbackDays::D90),
            other => Err(format!(
                "unsupported lookback window: {} (expected 7, 14, 30, 60 or 90)",
                other
            )),
        }
    }
}

impl From<LookbackDays> for u32 {
    fn from(value: LookbackDays) -> Self {
        value.days()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    City,
    Zip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudienceFilter {
    /// No narrowing; treated the same as an unset filter
    All,
    FirstTimeBuyer,
    MoveUp,
    Luxury,
    Investor,
    Downsizer,
}

impl AudienceFilter {
    pub fn label(&self) -> &'static str {
        match self {
            AudienceFilter::All => "All listings",
            AudienceFilter::FirstTimeBuyer => "First-time buyers",
            AudienceFilter::MoveUp => "Move-up buyers",
            AudienceFilter::Luxury => "Luxury",
            AudienceFilter::Investor => "Investors",
            AudienceFilter::Downsizer => "Downsizers",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recipient {
    Contact {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Group {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    ManualEmail {
        email: String,
    },
}

/// Identity of a recipient: `(type, id)` for contacts and groups, the
/// lower-cased address for manual entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecipientKey {
    Contact(String),
    Group(String),
    Email(String),
}

impl Recipient {
    pub fn key(&self) -> RecipientKey {
        match self {
            Recipient::Contact { id, .. } => RecipientKey::Contact(id.clone()),
            Recipient::Group { id, .. } => RecipientKey::Group(id.clone()),
            Recipient::ManualEmail { email } => RecipientKey::Email(email.trim().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub view_in_browser: bool,
    pub download_pdf: bool,
    pub download_social_image: bool,
    pub send_via_email: bool,
}

impl DeliveryOptions {
    pub fn any_enabled(&self) -> bool {
        self.view_in_browser || self.download_pdf || self.download_social_image || self.send_via_email
    }

    pub fn channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.view_in_browser {
            channels.push("Browser");
        }
        if self.download_pdf {
            channels.push("PDF");
        }
        if self.download_social_image {
            channels.push("Social image");
        }
        if self.send_via_email {
            channels.push("Email");
        }
        channels
    }
}

/// The form model behind the schedule wizard and the report builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuilderState {
    pub name: String,
    pub report_type: ReportType,
    pub lookback_days: LookbackDays,
    pub area_type: AreaType,
    pub city: Option<String>,
    pub zip_codes: Vec<String>,
    pub audience_filter: Option<AudienceFilter>,
    pub cadence: Cadence,
    pub weekly_day_of_week: Weekday,
    pub monthly_day_of_month: u32,
    pub send_hour: u32,
    pub send_minute: u32,
    pub timezone: String,
    pub recipients: Vec<Recipient>,
    pub delivery: DeliveryOptions,
}

impl BuilderState {
    pub fn from_defaults(defaults: &BuilderDefaults) -> Self {
        Self {
            name: String::new(),
            report_type: defaults.report_type,
            lookback_days: defaults.lookback_days,
            area_type: AreaType::City,
            city: None,
            zip_codes: Vec::new(),
            audience_filter: None,
            cadence: defaults.cadence,
            weekly_day_of_week: defaults.weekly_day_of_week,
            monthly_day_of_month: defaults.monthly_day_of_month,
            send_hour: defaults.send_hour,
            send_minute: defaults.send_minute,
            timezone: defaults.timezone.clone(),
            recipients: Vec::new(),
            delivery: defaults.delivery,
        }
    }

    pub fn has_recipient(&self, recipient: &Recipient) -> bool {
        let key = recipient.key();
        self.recipients.iter().any(|r| r.key() == key)
    }
}

impl Default for BuilderState {
    fn default() -> Self {
        Self::from_defaults(&BuilderDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_rejects_unsupported_window() {
        assert_eq!(LookbackDays::try_from(30), Ok(LookbackDays::D30));
        assert!(LookbackDays::try_from(45).is_err());
    }

    #[test]
    fn test_state_json_uses_snake_case_wire_names() {
        let mut state = BuilderState::default();
        state.report_type = ReportType::NewListingsGallery;
        state.audience_filter = Some(AudienceFilter::FirstTimeBuyer);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["report_type"], "new_listings_gallery");
        assert_eq!(json["audience_filter"], "first_time_buyer");
        assert_eq!(json["lookback_days"], 30);
    }

    #[test]
    fn test_partial_state_file_fills_defaults() {
        let parsed: BuilderState =
            serde_json::from_str(r#"{"name": "Weekly Austin", "area_type": "zip"}"#).unwrap();

        assert_eq!(parsed.name, "Weekly Austin");
        assert_eq!(parsed.area_type, AreaType::Zip);
        assert_eq!(parsed.timezone, BuilderDefaults::default().timezone);
    }

    #[test]
    fn test_recipient_json_is_tagged() {
        let recipient = Recipient::ManualEmail {
            email: "a@b.com".into(),
        };
        let json = serde_json::to_value(&recipient).unwrap();
        assert_eq!(json["type"], "manual_email");

        let group: Recipient =
            serde_json::from_str(r#"{"type": "group", "id": "g-1"}"#).unwrap();
        assert_eq!(group.key(), RecipientKey::Group("g-1".into()));
    }

    #[test]
    fn test_manual_email_key_ignores_case() {
        let a = Recipient::ManualEmail {
            email: " Jane@Example.com".into(),
        };
        let b = Recipient::ManualEmail {
            email: "jane@example.com".into(),
        };
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_import_row_mark_sets_reason() {
        let mut row = ImportRow {
            line: 2,
            email: "x@y.com".into(),
            first_name: None,
            last_name: None,
            name: String::new(),
            status: RowStatus::Valid,
            reason: None,
        };
        row.mark(RowStatus::Duplicate, "Already a contact");
        assert!(!row.is_valid());
        assert_eq!(row.reason.as_deref(), Some("Already a contact"));
    }
}
