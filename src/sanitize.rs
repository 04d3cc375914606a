use crate::error::PredictError;

/// First run of digits in `raw`, e.g. `"70\n+2"` -> 70, `"75kg"` -> 75.
/// Fractions are not read: `"6.5"` -> 6.
pub fn first_number(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    raw[start..start + len].parse::<f64>().ok()
}

pub fn parse_field(field: &'static str, raw: &str) -> Result<f64, PredictError> {
    first_number(raw).ok_or_else(|| PredictError::MalformedField {
        field,
        raw: raw.to_string(),
    })
}

pub fn parse_rating(field: &'static str, raw: &str) -> Result<f64, PredictError> {
    let value = parse_field(field, raw)?;
    check_range(field, value, 0.0, 100.0)
}

pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, PredictError> {
    if !value.is_finite() || value < min || value > max {
        return Err(PredictError::OutOfRange { field, value });
    }
    Ok(value)
}

/// Leading four-digit year of a season label ("2023-2024", "2023/24", "2024").
pub fn season_start_year(season: &str) -> Option<u32> {
    let bytes = season.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|idx| season[idx..idx + 4].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_takes_leading_token_only() {
        assert_eq!(first_number("70\n80"), Some(70.0));
        assert_eq!(first_number("70+2"), Some(70.0));
        assert_eq!(first_number(" 75kg"), Some(75.0));
        assert_eq!(first_number("180cm / 5'11\""), Some(180.0));
        assert_eq!(first_number("6.5"), Some(6.0));
        assert_eq!(first_number("12."), Some(12.0));
    }

    #[test]
    fn first_number_rejects_text() {
        assert_eq!(first_number(""), None);
        assert_eq!(first_number("n/a"), None);
        assert_eq!(first_number("\n"), None);
    }

    #[test]
    fn parse_rating_enforces_bounds() {
        assert_eq!(parse_rating("Stamina", "88\n+1").unwrap(), 88.0);
        assert!(matches!(
            parse_rating("Stamina", "120"),
            Err(PredictError::OutOfRange { field: "Stamina", .. })
        ));
        assert!(matches!(
            parse_rating("Stamina", "--"),
            Err(PredictError::MalformedField { field: "Stamina", .. })
        ));
    }

    #[test]
    fn season_start_year_handles_common_labels() {
        assert_eq!(season_start_year("2023-2024"), Some(2023));
        assert_eq!(season_start_year("2019/20"), Some(2019));
        assert_eq!(season_start_year("FIFA 2024"), Some(2024));
        assert_eq!(season_start_year("24/25"), None);
    }
}
