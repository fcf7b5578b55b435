// --- File: crates/bodywork_booking/src/validation.rs ---
//! Parsing and sanitising of submitted booking forms.

use crate::hours::BusinessHours;
use bodywork_common::models::{AppointmentStatus, FieldError, NewAppointment, PressurePreference};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SPECIAL_REQUESTS_LEN: usize = 1000;
const MAX_FOCUS_AREAS: usize = 10;
const MAX_FOCUS_AREA_LEN: usize = 50;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

static PHONE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\+?[0-9()\-.\s]+$").ok());

static MARKUP_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]*>").ok());

/// A number of minutes sent either as a JSON number or as a numeric string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum Minutes {
    Number(f64),
    Text(String),
}

impl Minutes {
    /// Whole, positive minutes; `None` for anything else.
    pub fn as_minutes(&self) -> Option<u32> {
        let value = match self {
            Minutes::Number(n) => *n,
            Minutes::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        if value.fract() != 0.0 || value <= 0.0 || value > f64::from(u16::MAX) {
            return None;
        }
        // range checked above
        Some(value as u32)
    }
}

/// Focus areas as a list or a comma separated string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum FocusAreas {
    List(Vec<String>),
    Text(String),
}

impl FocusAreas {
    fn entries(&self) -> Vec<String> {
        match self {
            FocusAreas::List(items) => items.clone(),
            FocusAreas::Text(text) => text.split(',').map(str::to_string).collect(),
        }
    }
}

/// The booking form as submitted. Every field is optional here so that missing
/// fields are reported together instead of failing deserialization on the first one.
#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    #[cfg_attr(feature = "openapi", schema(example = "Jane Doe"))]
    pub full_name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "jane@example.com"))]
    pub email: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "+41 79 123 45 67"))]
    pub phone: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07"))]
    pub appointment_date: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub start_time: Option<String>,
    pub duration: Option<Minutes>,
    pub focus_areas: Option<FocusAreas>,
    #[cfg_attr(feature = "openapi", schema(example = "medium"))]
    pub pressure_preference: Option<String>,
    pub special_requests: Option<String>,
}

/// A booking form that passed validation, already sanitised.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub focus_areas: Vec<String>,
    pub pressure_preference: Option<PressurePreference>,
    pub special_requests: Option<String>,
}

impl ValidBooking {
    pub fn into_new_appointment(
        self,
        status: AppointmentStatus,
        created_at: DateTime<Utc>,
    ) -> NewAppointment {
        NewAppointment {
            client_name: self.client_name,
            email: self.email,
            phone: self.phone,
            appointment_date: self.appointment_date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            focus_areas: self.focus_areas,
            pressure_preference: self.pressure_preference,
            special_requests: self.special_requests,
            status,
            created_at,
        }
    }
}

/// Strip markup and control characters, collapse runs of whitespace when
/// `single_line` is set, and trim.
pub fn sanitize_text(raw: &str, single_line: bool) -> String {
    let without_markup = match MARKUP_PATTERN.as_ref() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    let cleaned: String = without_markup
        .chars()
        .filter(|c| !c.is_control() || (!single_line && (*c == '\n' || *c == '\t')))
        .collect();
    if single_line {
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        cleaned.trim().to_string()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN
        && EMAIL_PATTERN
            .as_ref()
            .is_some_and(|re| re.is_match(email))
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
        && PHONE_PATTERN.as_ref().is_some_and(|re| re.is_match(phone))
}

fn required<'a>(
    value: &'a Option<String>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(FieldError::new(field, "This field is required"));
            None
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// `HH:MM`, or `HH:MM:00` as sent by browser time inputs. Schedules are kept in whole
/// minutes, so any other seconds value is rejected.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .filter(|t| t.second() == 0 && t.nanosecond() == 0)
}

/// Parse `date` and `time` the way the booking form does, reporting failures under
/// the given field names.
pub fn parse_slot_fields(
    date: Option<&str>,
    time: Option<&str>,
    date_field: &str,
    time_field: &str,
    errors: &mut Vec<FieldError>,
) -> (Option<NaiveDate>, Option<NaiveTime>) {
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => {
            errors.push(FieldError::new(date_field, "This field is required"));
            None
        }
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.push(FieldError::new(date_field, "Use the format YYYY-MM-DD"));
            }
            parsed
        }
    };
    let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
        None => {
            errors.push(FieldError::new(time_field, "This field is required"));
            None
        }
        Some(raw) => {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                errors.push(FieldError::new(time_field, "Use the format HH:MM"));
            }
            parsed
        }
    };
    (date, time)
}

/// Check a duration against the configured options.
pub fn parse_duration(
    value: Option<&Minutes>,
    hours: &BusinessHours,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<u32> {
    let Some(value) = value else {
        errors.push(FieldError::new(field, "This field is required"));
        return None;
    };
    match value.as_minutes() {
        Some(minutes) if hours.offers_duration(minutes) => Some(minutes),
        _ => {
            let offered: Vec<String> = hours
                .duration_options()
                .iter()
                .map(|d| d.minutes.to_string())
                .collect();
            errors.push(FieldError::new(
                field,
                format!("Choose one of the offered durations: {} minutes", offered.join(", ")),
            ));
            None
        }
    }
}

/// Validate and sanitise a booking form.
///
/// Every problem is collected; the error list names each offending field once.
pub fn validate_booking(
    input: &BookingInput,
    hours: &BusinessHours,
) -> Result<ValidBooking, Vec<FieldError>> {
    let mut errors = Vec::new();

    let client_name = required(&input.full_name, "fullName", &mut errors)
        .map(|raw| sanitize_text(raw, true))
        .and_then(|name| {
            let len = name.chars().count();
            if len < 2 {
                errors.push(FieldError::new("fullName", "Please enter your full name"));
                None
            } else if len > MAX_NAME_LEN {
                errors.push(FieldError::new(
                    "fullName",
                    format!("Must be at most {} characters", MAX_NAME_LEN),
                ));
                None
            } else {
                Some(name)
            }
        });

    let email = required(&input.email, "email", &mut errors).and_then(|raw| {
        let email = raw.to_ascii_lowercase();
        if is_valid_email(&email) {
            Some(email)
        } else {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
            None
        }
    });

    let phone = required(&input.phone, "phone", &mut errors).and_then(|raw| {
        let phone = sanitize_text(raw, true);
        if is_valid_phone(&phone) {
            Some(phone)
        } else {
            errors.push(FieldError::new("phone", "Please enter a valid phone number"));
            None
        }
    });

    let (appointment_date, start_time) = parse_slot_fields(
        input.appointment_date.as_deref(),
        input.start_time.as_deref(),
        "appointmentDate",
        "startTime",
        &mut errors,
    );

    let duration_minutes = parse_duration(input.duration.as_ref(), hours, "duration", &mut errors);

    let mut focus_areas: Vec<String> = Vec::new();
    if let Some(areas) = &input.focus_areas {
        for entry in areas.entries() {
            let area = sanitize_text(&entry, true);
            if area.is_empty() || focus_areas.contains(&area) {
                continue;
            }
            if area.chars().count() > MAX_FOCUS_AREA_LEN {
                errors.push(FieldError::new(
                    "focusAreas",
                    format!("Each focus area must be at most {} characters", MAX_FOCUS_AREA_LEN),
                ));
                break;
            }
            focus_areas.push(area);
        }
        if focus_areas.len() > MAX_FOCUS_AREAS {
            errors.push(FieldError::new(
                "focusAreas",
                format!("Choose at most {} focus areas", MAX_FOCUS_AREAS),
            ));
        }
    }

    let pressure_preference = match input.pressure_preference.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<PressurePreference>() {
            Ok(p) => Some(p),
            Err(_) => {
                errors.push(FieldError::new(
                    "pressurePreference",
                    "Choose light, medium, firm or deep",
                ));
                None
            }
        },
    };

    let special_requests = input
        .special_requests
        .as_deref()
        .map(|raw| sanitize_text(raw, false))
        .filter(|s| !s.is_empty());
    if let Some(text) = &special_requests {
        if text.chars().count() > MAX_SPECIAL_REQUESTS_LEN {
            errors.push(FieldError::new(
                "specialRequests",
                format!("Must be at most {} characters", MAX_SPECIAL_REQUESTS_LEN),
            ));
        }
    }

    match (
        client_name,
        email,
        phone,
        appointment_date,
        start_time,
        duration_minutes,
    ) {
        (
            Some(client_name),
            Some(email),
            Some(phone),
            Some(appointment_date),
            Some(start_time),
            Some(duration_minutes),
        ) if errors.is_empty() => Ok(ValidBooking {
            client_name,
            email,
            phone,
            appointment_date,
            start_time,
            duration_minutes,
            focus_areas,
            pressure_preference,
            special_requests,
        }),
        _ => Err(errors),
    }
}
