use chrono::{Datelike, NaiveDate};

fn parse(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// "2024-03-05" becomes "5 mar 2024".
pub fn format_date(date: &str) -> Option<String> {
    let date = parse(date)?;
    Some(format!(
        "{} {} {}",
        date.day(),
        date.format("%b").to_string().to_lowercase(),
        date.year()
    ))
}

/// True when `date` is `today` or later.
pub fn is_future_date(date: &str, today: NaiveDate) -> bool {
    parse(date).map(|d| d >= today).unwrap_or(false)
}

pub fn release_year(date: Option<&str>) -> Option<i32> {
    date.and_then(parse).map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05").as_deref(), Some("5 mar 2024"));
        assert_eq!(format_date("1999-12-31").as_deref(), Some("31 dec 1999"));
        assert_eq!(format_date(""), None);
    }

    #[test]
    fn test_is_future_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(is_future_date("2026-10-18", today));
        assert!(is_future_date("2027-01-01", today));
        assert!(!is_future_date("2026-10-17", today));
        assert!(!is_future_date("soon", today));
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("1999-10-15")), Some(1999));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }
}
