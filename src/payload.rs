use serde::Serialize;

use crate::data::{
    AreaType, AudienceFilter, BuilderState, Cadence, DeliveryOptions, LookbackDays, Recipient,
    ReportType,
};
use crate::error::BuilderError;
use crate::status::{blocking_sections, is_visible, BuilderVariant, Section};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CadencePayload {
    pub cadence: Cadence,
    /// 0 = Sunday
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_dow: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_dom: Option<u32>,
    pub send_hour: u32,
    pub send_minute: u32,
    pub timezone: String,
}

/// Request body sent when the builder is submitted
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub report_type: ReportType,
    pub lookback_days: LookbackDays,
    pub area_type: AreaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zip_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_filter: Option<AudienceFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<CadencePayload>,
    pub recipients: Vec<Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryOptions>,
}

pub fn endpoint(variant: BuilderVariant) -> &'static str {
    match variant {
        BuilderVariant::Schedule => "/api/proxy/v1/schedules",
        BuilderVariant::ReportBuilder => "/api/proxy/v1/reports",
    }
}

/// Serialize a submittable state. Fails when the submit gate is closed.
pub fn build(state: &BuilderState, variant: BuilderVariant) -> Result<RequestPayload, BuilderError> {
    let blocking = blocking_sections(state, variant);
    if !blocking.is_empty() {
        return Err(BuilderError::NotSubmittable { blocking });
    }

    let (city, zip_codes) = match state.area_type {
        AreaType::City => (state.city.clone(), Vec::new()),
        AreaType::Zip => (None, state.zip_codes.clone()),
    };

    let audience_filter = state
        .audience_filter
        .filter(|f| *f != AudienceFilter::All)
        .filter(|_| is_visible(Section::AudienceFilter, state, variant));

    let schedule = is_visible(Section::Cadence, state, variant).then(|| CadencePayload {
        cadence: state.cadence,
        weekly_dow: (state.cadence == Cadence::Weekly)
            .then(|| state.weekly_day_of_week.num_days_from_sunday()),
        monthly_dom: (state.cadence == Cadence::Monthly).then_some(state.monthly_day_of_month),
        send_hour: state.send_hour,
        send_minute: state.send_minute,
        timezone: state.timezone.clone(),
    });

    Ok(RequestPayload {
        name: (variant == BuilderVariant::Schedule).then(|| state.name.trim().to_string()),
        report_type: state.report_type,
        lookback_days: state.lookback_days,
        area_type: state.area_type,
        city,
        zip_codes,
        audience_filter,
        schedule,
        recipients: state.recipients.clone(),
        delivery: is_visible(Section::Delivery, state, variant).then_some(state.delivery),
    })
}
