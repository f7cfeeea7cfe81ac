use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub(crate) fn unix_epoch_seconds_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

pub(crate) fn unix_epoch_millis_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
pub(crate) fn unix_epoch_nanos_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// ISO-8601 instant in UTC, millisecond precision.
pub(crate) fn iso8601_timestamp(at: OffsetDateTime) -> anyhow::Result<String> {
    let at = at.to_offset(time::UtcOffset::UTC);
    let at = at.replace_millisecond(at.millisecond())?;
    Ok(at.format(&Rfc3339)?)
}

/// `YYYY-MM-DD` of the UTC day containing `at`.
pub(crate) fn iso8601_date(at: OffsetDateTime) -> anyhow::Result<String> {
    let date = at.to_offset(time::UtcOffset::UTC).date();
    Ok(date.format(format_description!("[year]-[month]-[day]"))?)
}
