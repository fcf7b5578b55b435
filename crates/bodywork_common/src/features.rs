//! Runtime feature switches.
//!
//! Optional integrations are enabled in two places: a `use_*` flag and the matching
//! configuration section. Both have to be present for the integration to start.
//!
//! ## Available switches
//!
//! - `use_notifications` + `[notifications]`: client and practitioner mail
//! - `use_calendar` + `[calendar]`: external calendar sync

use bodywork_config::AppConfig;

/// `true` when the flag is set and the section is configured.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

pub fn is_notifications_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_notifications, config.notifications.as_ref())
}

pub fn is_calendar_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_calendar, config.calendar.as_ref())
}
