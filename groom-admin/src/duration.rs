//! Duration codec: minutes <-> "H:MM"

/// Duration used when a breed has no active rule to derive one from
pub const DEFAULT_MINUTES: u32 = 60;

/// Largest duration the rules table can hold (`duration_modifier_minutes` is an int4)
pub const MAX_MINUTES: u32 = i32::MAX as u32;

/// Format minutes as "H:MM" (hours unbounded, minutes zero-padded)
pub fn format_duration(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Parse "H:MM" into minutes
///
/// Accepts surrounding whitespace, one or more hour digits and exactly
/// two minute digits below 60. Anything else yields `None`.
pub fn parse_duration(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if minutes.len() != 2 || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    hours.parse::<u32>().ok()?.checked_mul(60)?.checked_add(minutes)
}

/// Parse, falling back to the last valid value on malformed input
pub fn resolve_duration(text: &str, last_valid: u32) -> u32 {
    parse_duration(text).unwrap_or(last_valid)
}
