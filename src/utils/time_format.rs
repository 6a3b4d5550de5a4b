use chrono::{DateTime, Utc};

use crate::types::session::{Timestamp, Timezone};

/// Formats a signed minute offset as the SBI `±HH:MM` time zone.
pub fn format_sbi_timezone(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let magnitude = offset_minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
}

pub fn sbi_timezone(timezone: Option<&Timezone>) -> Option<String> {
    timezone.map(|tz| format_sbi_timezone(tz.offset_minutes))
}

pub fn to_gateway_timestamp(time: Option<&DateTime<Utc>>) -> Option<Timestamp> {
    time.map(|t| Timestamp {
        seconds: t.timestamp(),
        nanos: t.timestamp_subsec_nanos() as i32,
    })
}
