/// Parses an SBI bit rate into bits per second.
///
/// Accepts a plain integer or `"<value> bps|Kbps|Mbps|Gbps"`. Values above
/// `u32::MAX` saturate; anything unparseable yields 0.
pub fn parse_bit_rate(value: &str) -> u32 {
    match parse_bit_rate_u64(value) {
        Some(bps) => u32::try_from(bps).unwrap_or(u32::MAX),
        None => {
            tracing::debug!("Ignoring unparseable bit rate: {}", value);
            0
        }
    }
}

pub fn parse_optional_bit_rate(value: Option<&str>) -> u32 {
    value.map(parse_bit_rate).unwrap_or(0)
}

fn parse_bit_rate_u64(value: &str) -> Option<u64> {
    let value = value.trim().to_uppercase();
    if value.is_empty() {
        return None;
    }

    if let Ok(plain) = value.parse::<u64>() {
        return Some(plain);
    }

    let (numeric_part, unit) = if value.ends_with("GBPS") {
        (value.trim_end_matches("GBPS").trim(), 1_000_000_000u64)
    } else if value.ends_with("MBPS") {
        (value.trim_end_matches("MBPS").trim(), 1_000_000)
    } else if value.ends_with("KBPS") {
        (value.trim_end_matches("KBPS").trim(), 1_000)
    } else if value.ends_with("BPS") {
        (value.trim_end_matches("BPS").trim(), 1)
    } else {
        return None;
    };

    let amount: f64 = numeric_part.parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Some((amount * unit as f64) as u64)
}
