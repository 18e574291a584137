use crate::domain::models::{parse_due_date, parse_due_time};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;

static DISPLAY_CONFIG: OnceCell<DisplayConfig> = OnceCell::new();
static DEFAULT_DISPLAY_CONFIG: DisplayConfig = DisplayConfig {
    timezone: chrono_tz::UTC,
    date_format: "%b %-d",
    time_format: "%-I:%M %p",
};

/// Timezone and patterns shared by every date label in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    pub timezone: Tz,
    pub date_format: &'static str,
    pub time_format: &'static str,
}

impl DisplayConfig {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            ..DEFAULT_DISPLAY_CONFIG.clone()
        }
    }

    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// `"Mar 5"` or `"Mar 5, 2:00 PM"`; unparseable input is echoed back.
    pub fn format_due_label(&self, due_date: &str, due_time: Option<&str>) -> String {
        let Some(date) = parse_due_date(due_date) else {
            return due_date.to_string();
        };
        let date_label = date.format(self.date_format).to_string();
        match due_time.and_then(parse_due_time) {
            Some(time) => format!("{date_label}, {}", self.format_time(time)),
            None => date_label,
        }
    }

    pub fn format_time(&self, time: NaiveTime) -> String {
        time.format(self.time_format).to_string()
    }

    /// Coarse relative label such as `"5 minutes ago"` or `"in 3 days"`.
    pub fn format_relative(&self, then: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let seconds = (then - now).num_seconds();
        let magnitude = seconds.unsigned_abs();
        if magnitude < 45 {
            return "just now".to_string();
        }

        let (amount, unit) = if magnitude < 3_600 {
            ((magnitude / 60).max(1), "minute")
        } else if magnitude < 86_400 {
            (magnitude / 3_600, "hour")
        } else if magnitude < 30 * 86_400 {
            (magnitude / 86_400, "day")
        } else if magnitude < 365 * 86_400 {
            (magnitude / (30 * 86_400), "month")
        } else {
            (magnitude / (365 * 86_400), "year")
        };
        let plural = if amount == 1 { "" } else { "s" };

        if seconds < 0 {
            format!("{amount} {unit}{plural} ago")
        } else {
            format!("in {amount} {unit}{plural}")
        }
    }
}

/// Installs the process-wide display configuration.
///
/// Returns `false` when a different configuration is already installed.
pub fn init_display_config(timezone: Tz) -> bool {
    let config = DISPLAY_CONFIG.get_or_init(|| DisplayConfig::new(timezone));
    config.timezone == timezone
}

pub fn display_config() -> &'static DisplayConfig {
    DISPLAY_CONFIG.get().unwrap_or(&DEFAULT_DISPLAY_CONFIG)
}
