//! Memory and duration string conversions.
//!
//! Two external notations are understood:
//!
//! | Source | Memory | Duration |
//! |--------|--------|----------|
//! | Nextflow | `1.5 GB`, `124.GB` (decimal units) | `1h 2m 3s`, `350ms` |
//! | PBS Pro | `1048576kb` (binary units) | `HH:MM:SS` |
//!
//! Internally memory is in megabytes and time in seconds, both rounded up.

use thiserror::Error;

/// Unit parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// Memory string could not be parsed.
    #[error("invalid memory value: '{0}'")]
    Memory(String),

    /// Duration string could not be parsed.
    #[error("invalid duration value: '{0}'")]
    Duration(String),
}

const NEXTFLOW_MEMORY_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const PBS_MEMORY_UNITS: [&str; 5] = ["b", "kb", "mb", "gb", "tb"];

/// Splits `"1.5 GB"` / `"124.GB"` / `"512kb"` into amount and unit.
fn split_unit(s: &str) -> (&str, &str) {
    let s = s.trim();
    let split = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (amount, unit) = s.split_at(split);
    (amount.trim_end_matches(|c: char| c == ' ' || c == '.'), unit)
}

/// Parses a Nextflow memory string into megabytes.
///
/// ```
/// use u_allocate::units::nf_memory_to_mb;
/// assert_eq!(nf_memory_to_mb("124.GB").unwrap(), 124_000);
/// assert_eq!(nf_memory_to_mb("1.5 MB").unwrap(), 2);
/// assert_eq!(nf_memory_to_mb("0").unwrap(), 0);
/// ```
pub fn nf_memory_to_mb(s: &str) -> Result<u64, UnitError> {
    if s.trim() == "0" {
        return Ok(0);
    }
    let err = || UnitError::Memory(s.to_string());
    let (amount, unit) = split_unit(s);
    let power = NEXTFLOW_MEMORY_UNITS
        .iter()
        .position(|u| *u == unit)
        .ok_or_else(err)?;
    let amount: f64 = amount.parse().map_err(|_| err())?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(err());
    }
    let mb = amount * 1000f64.powi(power as i32 - 2);
    Ok(mb.ceil() as u64)
}

/// Parses a Nextflow duration (`1d 2h 3m 4s 5ms`) into whole seconds.
pub fn nf_time_to_seconds(s: &str) -> Result<u64, UnitError> {
    let err = || UnitError::Duration(s.to_string());
    let mut total = 0.0;
    for token in s.split_whitespace() {
        let (amount, scale) = if let Some(v) = token.strip_suffix("ms") {
            (v, 0.001)
        } else if let Some(v) = token.strip_suffix('d') {
            (v, 86_400.0)
        } else if let Some(v) = token.strip_suffix('h') {
            (v, 3600.0)
        } else if let Some(v) = token.strip_suffix('m') {
            (v, 60.0)
        } else if let Some(v) = token.strip_suffix('s') {
            (v, 1.0)
        } else {
            return Err(err());
        };
        let amount: f64 = amount.parse().map_err(|_| err())?;
        total += amount * scale;
    }
    if !total.is_finite() || total < 0.0 {
        return Err(err());
    }
    Ok(total.ceil() as u64)
}

/// Formats seconds as a Nextflow duration in whole minutes (rounded up).
pub fn seconds_to_nf_time(seconds: f64) -> String {
    format!("{}.m", (seconds / 60.0).ceil() as u64)
}

/// Formats megabytes as a Nextflow memory literal.
pub fn mb_to_nf_memory(mb: u64) -> String {
    format!("{mb}.MB")
}

/// Parses a PBS `HH:MM:SS` walltime into seconds.
pub fn pbs_walltime_to_seconds(s: &str) -> Result<u64, UnitError> {
    let err = || UnitError::Duration(s.to_string());
    let parts: Vec<&str> = s.trim().split(':').collect();
    let [h, m, sec] = parts.as_slice() else {
        return Err(err());
    };
    let h: u64 = h.parse().map_err(|_| err())?;
    let m: u64 = m.parse().map_err(|_| err())?;
    let sec: u64 = sec.parse().map_err(|_| err())?;
    Ok(h * 3600 + m * 60 + sec)
}

/// Parses a PBS memory string (`1048576kb`) into megabytes.
///
/// Strings shorter than three characters are treated as 1 MB.
pub fn pbs_memory_to_mb(s: &str) -> Result<u64, UnitError> {
    let trimmed = s.trim();
    if trimmed.len() < 3 {
        return Ok(1);
    }
    let err = || UnitError::Memory(s.to_string());
    let (amount, unit) = split_unit(trimmed);
    let unit = unit.to_ascii_lowercase();
    let power = PBS_MEMORY_UNITS
        .iter()
        .position(|u| *u == unit)
        .ok_or_else(err)?;
    let amount: u64 = amount.parse().map_err(|_| err())?;
    let mb = amount as f64 * 1024f64.powi(power as i32 - 2);
    Ok(mb.ceil() as u64)
}
