//! Byte sizes as written in volume options.
//!
//! Units are case-insensitive. `KiB`..`PiB` (or `Ki`..`Pi`) are binary,
//! `KB`..`PB` are decimal, and a bare unit letter (`K`..`P`) is binary, the
//! way container tooling reads `-m 512m`. Fractions are allowed (`1.5TiB`).

pub const KIB: u64 = 1 << 10;
pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;
pub const TIB: u64 = 1 << 40;
pub const PIB: u64 = 1 << 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    #[error("empty size")]
    Empty,
    #[error("invalid size number: {0}")]
    InvalidNumber(String),
    #[error("unknown size unit: {0}")]
    UnknownUnit(String),
    #[error("size out of range: {0}")]
    OutOfRange(String),
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let m = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "ki" | "kib" => KIB,
        "m" | "mi" | "mib" => MIB,
        "g" | "gi" | "gib" => GIB,
        "t" | "ti" | "tib" => TIB,
        "p" | "pi" | "pib" => PIB,
        "kb" => 1_000,
        "mb" => 1_000_000,
        "gb" => 1_000_000_000,
        "tb" => 1_000_000_000_000,
        "pb" => 1_000_000_000_000_000,
        _ => return None,
    };
    Some(m)
}

/// Parse a size string into bytes.
pub fn parse_size(input: &str) -> Result<u64, SizeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SizeError::Empty);
    }

    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let unit = unit.trim();

    let multiplier =
        unit_multiplier(unit).ok_or_else(|| SizeError::UnknownUnit(unit.to_owned()))?;

    // Integers stay exact; only fractional input goes through f64.
    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| SizeError::OutOfRange(input.to_owned()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| SizeError::InvalidNumber(number.to_owned()))?;
    let bytes = value * multiplier as f64;
    if !bytes.is_finite() || bytes < 0.0 || bytes > u64::MAX as f64 {
        return Err(SizeError::OutOfRange(input.to_owned()));
    }
    Ok(bytes.round() as u64)
}

/// Render bytes with the largest binary unit that divides them evenly.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (PIB, "PiB"),
        (TIB, "TiB"),
        (GIB, "GiB"),
        (MIB, "MiB"),
        (KIB, "KiB"),
    ];
    for (size, name) in UNITS {
        if bytes >= size && bytes % size == 0 {
            return format!("{}{}", bytes / size, name);
        }
    }
    format!("{}B", bytes)
}
