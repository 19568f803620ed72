use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::ERR_INVALID_DATE;
use crate::error::{AppError, Result};

/// Reject empty or whitespace-only values for a required field
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Reject values outside a closed set
pub fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(AppError::InvalidInput(format!(
            "{} must be one of: {}",
            field,
            allowed.join(", ")
        )));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(ERR_INVALID_DATE.to_string()))
}

/// UTC midnight at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
