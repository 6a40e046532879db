//! Contract date parsing and Spanish legal date text

use chrono::{Datelike, Local, NaiveDate};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Parse a `DD/MM/YYYY` contract date. Missing or unparseable input falls
/// back to today.
pub fn parse_contract_date(raw: Option<&str>) -> NaiveDate {
    try_parse_contract_date(raw).unwrap_or_else(|| Local::now().date_naive())
}

/// Strict variant: `None` when the value is absent or malformed.
pub fn try_parse_contract_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut parts = raw.splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month as usize - 1).min(11)]
}

/// "27 de junio de 2026"
pub fn legal_date_text(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// "27/06/2026"
pub fn simple_date_text(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

/// Calendar-month addition with day clamping (31/01 + 1 month = 28/02).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let mut day = date.day();
    loop {
        if let Some(result) = NaiveDate::from_ymd_opt(year, month, day) {
            return result;
        }
        day -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_month_year() {
        let date = try_parse_contract_date(Some("27/06/2026")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 6, 27).unwrap());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(try_parse_contract_date(Some("2026-06-27")).is_none());
        assert!(try_parse_contract_date(Some("32/01/2026")).is_none());
        assert!(try_parse_contract_date(Some("")).is_none());
        assert!(try_parse_contract_date(None).is_none());
    }

    #[test]
    fn legal_text_uses_spanish_months() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 27).unwrap();
        assert_eq!(legal_date_text(date), "27 de junio de 2026");
        assert_eq!(simple_date_text(date), "27/06/2026");
    }

    #[test]
    fn month_addition_clamps_day() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            add_months(date, 1),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        let eod = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        assert_eq!(
            add_months(eod, 1),
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
        );
    }
}
