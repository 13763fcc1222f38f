use chrono::NaiveDateTime;
use serde::Serialize;

use crate::cadence;
use crate::data::{AreaType, AudienceFilter, BuilderState, Recipient, ReportType};

/// Which of the two builder screens is being driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BuilderVariant {
    /// Recurring schedule wizard
    Schedule,
    /// One-off report builder in the admin console
    ReportBuilder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Complete,
    Warning,
    Optional,
    Incomplete,
}

impl SectionStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            SectionStatus::Complete => "✓",
            SectionStatus::Warning => "!",
            SectionStatus::Optional => "○",
            SectionStatus::Incomplete => "✗",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Name,
    ReportType,
    Area,
    AudienceFilter,
    Cadence,
    Recipients,
    Delivery,
}

impl Section {
    /// Display order of the accordion
    pub const ALL: [Section; 7] = [
        Section::Name,
        Section::ReportType,
        Section::Area,
        Section::AudienceFilter,
        Section::Cadence,
        Section::Recipients,
        Section::Delivery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Name => "Name",
            Section::ReportType => "Report type",
            Section::Area => "Area",
            Section::AudienceFilter => "Audience",
            Section::Cadence => "Cadence",
            Section::Recipients => "Recipients",
            Section::Delivery => "Delivery",
        }
    }
}

/// Whether a section is rendered for the current state.
pub fn is_visible(section: Section, state: &BuilderState, variant: BuilderVariant) -> bool {
    match section {
        Section::Name | Section::Cadence => variant == BuilderVariant::Schedule,
        Section::Delivery => variant == BuilderVariant::ReportBuilder,
        Section::AudienceFilter => state.report_type == ReportType::NewListingsGallery,
        Section::ReportType | Section::Area | Section::Recipients => true,
    }
}

pub fn area_is_valid(state: &BuilderState) -> bool {
    match state.area_type {
        AreaType::City => state.city.as_deref().is_some_and(|c| !c.trim().is_empty()),
        AreaType::Zip => !state.zip_codes.is_empty(),
    }
}

pub fn section_status(section: Section, state: &BuilderState, variant: BuilderVariant) -> SectionStatus {
    match section {
        Section::Name => {
            if state.name.trim().is_empty() {
                SectionStatus::Incomplete
            } else {
                SectionStatus::Complete
            }
        }
        Section::ReportType | Section::Cadence => SectionStatus::Complete,
        Section::Area => match (area_is_valid(state), variant) {
            (true, _) => SectionStatus::Complete,
            (false, BuilderVariant::Schedule) => SectionStatus::Incomplete,
            (false, BuilderVariant::ReportBuilder) => SectionStatus::Warning,
        },
        Section::AudienceFilter => match state.audience_filter {
            Some(filter) if filter != AudienceFilter::All => SectionStatus::Complete,
            _ => SectionStatus::Optional,
        },
        Section::Recipients => {
            if state.recipients.is_empty() {
                SectionStatus::Warning
            } else {
                SectionStatus::Complete
            }
        }
        Section::Delivery => {
            let email_without_recipients =
                state.delivery.send_via_email && state.recipients.is_empty();
            if !state.delivery.any_enabled() || email_without_recipients {
                SectionStatus::Warning
            } else {
                SectionStatus::Complete
            }
        }
    }
}

pub fn section_summary(section: Section, state: &BuilderState, now: NaiveDateTime) -> String {
    match section {
        Section::Name => match state.name.trim() {
            "" => "Untitled".to_string(),
            name => name.to_string(),
        },
        Section::ReportType => format!(
            "{} {} · Last {} days",
            state.report_type.icon(),
            state.report_type.label(),
            state.lookback_days.days()
        ),
        Section::Area => summarize_area(state),
        Section::AudienceFilter => state
            .audience_filter
            .unwrap_or(AudienceFilter::All)
            .label()
            .to_string(),
        Section::Cadence => cadence::describe(state, now),
        Section::Recipients => summarize_recipients(&state.recipients),
        Section::Delivery => {
            let channels = state.delivery.channels();
            if channels.is_empty() {
                return "No delivery channel selected".to_string();
            }
            let mut summary = channels.join(", ");
            if state.delivery.send_via_email && state.recipients.is_empty() {
                summary.push_str(" (email needs at least one recipient)");
            }
            summary
        }
    }
}

fn summarize_area(state: &BuilderState) -> String {
    match state.area_type {
        AreaType::City => match state.city.as_deref() {
            Some(city) => format!("City: {}", city),
            None => "No city selected".to_string(),
        },
        AreaType::Zip => {
            if state.zip_codes.is_empty() {
                return "No ZIP codes selected".to_string();
            }
            let shown = state.zip_codes.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            match state.zip_codes.len().saturating_sub(3) {
                0 => format!("ZIP: {}", shown),
                more => format!("ZIP: {} +{} more", shown, more),
            }
        }
    }
}

fn summarize_recipients(recipients: &[Recipient]) -> String {
    if recipients.is_empty() {
        return "No recipients".to_string();
    }

    let (mut contacts, mut groups, mut emails) = (0, 0, 0);
    for recipient in recipients {
        match recipient {
            Recipient::Contact { .. } => contacts += 1,
            Recipient::Group { .. } => groups += 1,
            Recipient::ManualEmail { .. } => emails += 1,
        }
    }

    [(contacts, "contact"), (groups, "group"), (emails, "email")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| {
            if count == 1 {
                format!("1 {}", noun)
            } else {
                format!("{} {}s", count, noun)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sections that currently keep the submit action disabled.
pub fn blocking_sections(state: &BuilderState, variant: BuilderVariant) -> Vec<Section> {
    let mut blocking = Vec::new();

    if variant == BuilderVariant::Schedule && state.name.trim().is_empty() {
        blocking.push(Section::Name);
    }
    if !area_is_valid(state) {
        blocking.push(Section::Area);
    }
    if !state.delivery.any_enabled() {
        blocking.push(Section::Delivery);
    }
    if state.delivery.send_via_email && state.recipients.is_empty() {
        blocking.push(Section::Recipients);
    }

    blocking
}

/// Aggregate submit gate
pub fn is_valid(state: &BuilderState, variant: BuilderVariant) -> bool {
    blocking_sections(state, variant).is_empty()
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub section: Section,
    pub status: SectionStatus,
    pub summary: String,
}

/// Status and summary of every visible section, in display order
pub fn section_views(state: &BuilderState, variant: BuilderVariant, now: NaiveDateTime) -> Vec<SectionView> {
    Section::ALL
        .into_iter()
        .filter(|s| is_visible(*s, state, variant))
        .map(|section| SectionView {
            section,
            status: section_status(section, state, variant),
            summary: section_summary(section, state, now),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Update;
    use crate::data::DeliveryOptions;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn ready_state() -> BuilderState {
        let mut state = BuilderState::default();
        state.update_state(Update::Name("Austin weekly".into()));
        state.update_state(Update::City(Some("Austin".into())));
        state
    }

    fn contact(id: &str) -> Recipient {
        Recipient::Contact {
            id: id.into(),
            name: None,
        }
    }

    #[test]
    fn test_ready_state_is_valid_in_both_variants() {
        let state = ready_state();
        assert!(is_valid(&state, BuilderVariant::Schedule));
        assert!(is_valid(&state, BuilderVariant::ReportBuilder));
    }

    #[test]
    fn test_email_without_recipients_blocks_submit() {
        let mut state = ready_state();
        state.update_state(Update::SendViaEmail(true));
        assert!(!is_valid(&state, BuilderVariant::ReportBuilder));
        assert_eq!(
            blocking_sections(&state, BuilderVariant::ReportBuilder),
            vec![Section::Recipients]
        );

        state.add_recipient(contact("c-1"));
        assert!(is_valid(&state, BuilderVariant::ReportBuilder));
    }

    #[test]
    fn test_no_delivery_channel_blocks_regardless_of_rest() {
        let mut state = ready_state();
        state.add_recipient(contact("c-1"));
        state.delivery = DeliveryOptions {
            view_in_browser: false,
            download_pdf: false,
            download_social_image: false,
            send_via_email: false,
        };

        assert!(!is_valid(&state, BuilderVariant::Schedule));
        assert!(!is_valid(&state, BuilderVariant::ReportBuilder));
        assert_eq!(
            section_status(Section::Delivery, &state, BuilderVariant::ReportBuilder),
            SectionStatus::Warning
        );
    }

    #[test]
    fn test_area_status_differs_by_variant() {
        let state = BuilderState::default();
        assert_eq!(
            section_status(Section::Area, &state, BuilderVariant::Schedule),
            SectionStatus::Incomplete
        );
        assert_eq!(
            section_status(Section::Area, &state, BuilderVariant::ReportBuilder),
            SectionStatus::Warning
        );
        assert!(blocking_sections(&state, BuilderVariant::ReportBuilder).contains(&Section::Area));
    }

    #[test]
    fn test_zip_area_valid_with_codes() {
        let mut state = ready_state();
        state.update_state(Update::AreaType(crate::data::AreaType::Zip));
        assert!(!area_is_valid(&state));

        state.update_state(Update::ZipCodes(vec!["78701".into()]));
        assert!(area_is_valid(&state));
    }

    #[test]
    fn test_name_required_only_for_schedule() {
        let mut state = ready_state();
        state.update_state(Update::Name("  ".into()));

        assert_eq!(
            section_status(Section::Name, &state, BuilderVariant::Schedule),
            SectionStatus::Incomplete
        );
        assert!(!is_valid(&state, BuilderVariant::Schedule));
        assert!(is_valid(&state, BuilderVariant::ReportBuilder));
    }

    #[test]
    fn test_audience_filter_all_is_optional() {
        let mut state = ready_state();
        state.update_state(Update::ReportType(ReportType::NewListingsGallery));
        let variant = BuilderVariant::ReportBuilder;
        assert_eq!(section_status(Section::AudienceFilter, &state, variant), SectionStatus::Optional);

        state.update_state(Update::AudienceFilter(Some(AudienceFilter::All)));
        assert_eq!(section_status(Section::AudienceFilter, &state, variant), SectionStatus::Optional);

        state.update_state(Update::AudienceFilter(Some(AudienceFilter::Luxury)));
        assert_eq!(section_status(Section::AudienceFilter, &state, variant), SectionStatus::Complete);
    }

    #[test]
    fn test_recipients_status_and_summary() {
        let mut state = ready_state();
        let variant = BuilderVariant::Schedule;
        assert_eq!(section_status(Section::Recipients, &state, variant), SectionStatus::Warning);

        state.add_recipient(contact("c-1"));
        state.add_recipient(contact("c-2"));
        state.add_recipient(Recipient::Group {
            id: "g-1".into(),
            name: None,
        });
        assert_eq!(section_status(Section::Recipients, &state, variant), SectionStatus::Complete);
        assert_eq!(
            section_summary(Section::Recipients, &state, now()),
            "2 contacts, 1 group"
        );
    }

    #[test]
    fn test_visibility_per_variant() {
        let state = BuilderState::default();
        assert!(is_visible(Section::Name, &state, BuilderVariant::Schedule));
        assert!(!is_visible(Section::Name, &state, BuilderVariant::ReportBuilder));
        assert!(is_visible(Section::Delivery, &state, BuilderVariant::ReportBuilder));
        assert!(!is_visible(Section::Cadence, &state, BuilderVariant::ReportBuilder));
        assert!(!is_visible(Section::AudienceFilter, &state, BuilderVariant::Schedule));
    }

    #[test]
    fn test_area_summary_truncates_zip_list() {
        let mut state = BuilderState::default();
        state.update_state(Update::AreaType(crate::data::AreaType::Zip));
        state.update_state(Update::ZipCodes(
            ["78701", "78702", "78703", "78704", "78705"]
                .iter()
                .map(|z| z.to_string())
                .collect(),
        ));

        assert_eq!(
            section_summary(Section::Area, &state, now()),
            "ZIP: 78701, 78702, 78703 +2 more"
        );
    }

    #[test]
    fn test_report_type_summary() {
        let state = BuilderState::default();
        assert_eq!(
            section_summary(Section::ReportType, &state, now()),
            "📊 Market Snapshot · Last 30 days"
        );
    }

    #[test]
    fn test_section_views_follow_visibility() {
        let state = ready_state();
        let views = section_views(&state, BuilderVariant::Schedule, now());
        let sections: Vec<_> = views.iter().map(|v| v.section).collect();

        assert_eq!(
            sections,
            vec![
                Section::Name,
                Section::ReportType,
                Section::Area,
                Section::Cadence,
                Section::Recipients
            ]
        );
        assert_eq!(views[0].summary, "Austin weekly");
    }
}
