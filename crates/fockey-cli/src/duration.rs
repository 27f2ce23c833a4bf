//! Human duration arguments: `25m`, `1h30m`, `90s`, `2d`. A bare number is minutes.

use anyhow::{bail, Result};

pub fn parse_duration_ms(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Empty duration");
    }
    if let Ok(minutes) = text.parse::<u64>() {
        let Some(ms) = minutes.checked_mul(60_000) else {
            bail!("Duration {text:?} is too long");
        };
        return Ok(ms);
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit_ms = match ch.to_ascii_lowercase() {
            'd' => 24 * 60 * 60 * 1000,
            'h' => 60 * 60 * 1000,
            'm' => 60 * 1000,
            's' => 1000,
            _ => bail!("Invalid duration {text:?}: unknown unit '{ch}'"),
        };
        let Ok(value) = digits.parse::<u64>() else {
            bail!("Invalid duration {text:?}: expected a number before '{ch}'");
        };
        let Some(sum) = value.checked_mul(unit_ms).and_then(|ms| total.checked_add(ms)) else {
            bail!("Duration {text:?} is too long");
        };
        total = sum;
        digits.clear();
    }

    if !digits.is_empty() {
        bail!("Invalid duration {text:?}: missing unit after {digits}");
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_ms("25").unwrap(), 25 * 60_000);
        assert_eq!(parse_duration_ms("25m").unwrap(), 25 * 60_000);
        assert_eq!(parse_duration_ms("1h30m").unwrap(), 90 * 60_000);
        assert_eq!(parse_duration_ms("90s").unwrap(), 90_000);
        assert_eq!(parse_duration_ms("2D").unwrap(), 2 * 24 * 60 * 60_000);
    }

    #[test]
    fn test_parse_duration_rejects() {
        assert!(parse_duration_ms("").is_err());
        assert!(parse_duration_ms("h").is_err());
        assert!(parse_duration_ms("10x").is_err());
        assert!(parse_duration_ms("1h30").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        let err = parse_duration_ms("999999999999999999").unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert!(parse_duration_ms("99999999999999999d").is_err());
        assert!(parse_duration_ms("18446744073709551615s").is_err());
    }
}
