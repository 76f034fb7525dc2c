use std::time::Duration;

/// Parses `<digits><unit>` where unit is `ms`, `s`, `m` or `h` (default `s`).
pub(crate) fn parse_duration_value(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    if digits.is_empty() {
        return Err(format!("Invalid duration '{}'.", value));
    }
    let number: u64 = digits
        .parse()
        .map_err(|err| format!("Invalid duration '{}': {}", value, err))?;

    let millis_per_unit: u64 = match unit.trim() {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => return Err(format!("Invalid duration unit '{}'.", other)),
    };
    let millis = number
        .checked_mul(millis_per_unit)
        .ok_or_else(|| "Duration overflow.".to_owned())?;
    if millis == 0 {
        return Err("Duration must be > 0.".to_owned());
    }
    Ok(Duration::from_millis(millis))
}
