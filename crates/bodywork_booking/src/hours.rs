// --- File: crates/bodywork_booking/src/hours.rs ---
//! Typed business hours, validated once at startup.

use bodywork_common::models::minute_of_day;
use bodywork_config::{BusinessHoursConfig, DurationOption};
use chrono::{Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use thiserror::Error;

const DEFAULT_SLOT_STEP_MINUTES: u32 = 15;
const DEFAULT_CURRENCY: &str = "CHF";

#[derive(Error, Debug, PartialEq)]
pub enum HoursError {
    #[error("Invalid weekday number {0}; expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),
    #[error("Invalid time '{0}'; expected HH:MM")]
    InvalidTime(String),
    #[error("Time block {from}-{to} ends before it starts")]
    EmptyBlock { from: String, to: String },
    #[error("At least one duration option is required")]
    NoDurations,
    #[error("Duration options must be positive")]
    ZeroDuration,
    #[error("slot_step_minutes must be positive")]
    ZeroStep,
    #[error("Unknown time zone '{0}'")]
    InvalidTimeZone(String),
    #[error("min_notice_minutes must not be negative")]
    NegativeNotice,
}

/// A bookable window in minutes since midnight, `from` inclusive and `to` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteRange {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct Block {
    day: Option<u8>,
    range: MinuteRange,
}

/// Weekday number used in the configuration: 0 = Sunday ... 6 = Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always < 7
    date.weekday().num_days_from_sunday() as u8
}

#[derive(Debug, Clone)]
pub struct BusinessHours {
    working_days: BTreeSet<u8>,
    blocks: Vec<Block>,
    durations: Vec<DurationOption>,
    pub break_minutes: u32,
    pub slot_step_minutes: u32,
    pub time_zone: Tz,
    pub min_notice_minutes: i64,
    pub currency: String,
}

fn parse_minute(raw: &str) -> Result<u32, HoursError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(minute_of_day)
        .map_err(|_| HoursError::InvalidTime(raw.to_string()))
}

impl BusinessHours {
    pub fn from_config(config: &BusinessHoursConfig) -> Result<Self, HoursError> {
        let mut working_days = BTreeSet::new();
        for &day in &config.working_days {
            if day > 6 {
                return Err(HoursError::InvalidWeekday(day));
            }
            working_days.insert(day);
        }

        let mut blocks = Vec::with_capacity(config.time_blocks.len());
        for block in &config.time_blocks {
            if let Some(day) = block.day {
                if day > 6 {
                    return Err(HoursError::InvalidWeekday(day));
                }
            }
            let from = parse_minute(&block.from)?;
            let to = parse_minute(&block.to)?;
            if from >= to {
                return Err(HoursError::EmptyBlock {
                    from: block.from.clone(),
                    to: block.to.clone(),
                });
            }
            blocks.push(Block {
                day: block.day,
                range: MinuteRange { from, to },
            });
        }

        if config.duration_options.is_empty() {
            return Err(HoursError::NoDurations);
        }
        if config.duration_options.iter().any(|d| d.minutes == 0) {
            return Err(HoursError::ZeroDuration);
        }
        let mut durations = config.duration_options.clone();
        durations.sort_by_key(|d| d.minutes);

        let slot_step_minutes = config
            .slot_step_minutes
            .unwrap_or(DEFAULT_SLOT_STEP_MINUTES);
        if slot_step_minutes == 0 {
            return Err(HoursError::ZeroStep);
        }

        let time_zone = match &config.time_zone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| HoursError::InvalidTimeZone(name.clone()))?,
            None => Tz::UTC,
        };

        let min_notice_minutes = config.min_notice_minutes.unwrap_or(0);
        if min_notice_minutes < 0 {
            return Err(HoursError::NegativeNotice);
        }

        Ok(Self {
            working_days,
            blocks,
            durations,
            break_minutes: config.break_minutes,
            slot_step_minutes,
            time_zone,
            min_notice_minutes,
            currency: config
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&weekday_number(date))
    }

    /// Time blocks that apply on `date`; empty on days off.
    pub fn blocks_for(&self, date: NaiveDate) -> Vec<MinuteRange> {
        if !self.is_working_day(date) {
            return Vec::new();
        }
        let day = weekday_number(date);
        self.blocks
            .iter()
            .filter(|b| b.day.map_or(true, |d| d == day))
            .map(|b| b.range)
            .collect()
    }

    pub fn working_days(&self) -> impl Iterator<Item = u8> + '_ {
        self.working_days.iter().copied()
    }

    /// `(day, range)` for every configured block.
    pub fn time_blocks(&self) -> impl Iterator<Item = (Option<u8>, MinuteRange)> + '_ {
        self.blocks.iter().map(|b| (b.day, b.range))
    }

    /// Offered durations, shortest first.
    pub fn duration_options(&self) -> &[DurationOption] {
        &self.durations
    }

    pub fn offers_duration(&self, minutes: u32) -> bool {
        self.durations.iter().any(|d| d.minutes == minutes)
    }
}
