//! Legal amount formatting
//!
//! Contract paragraphs spell amounts out in Spanish legal style:
//! 30000.00 USD -> "TREINTA MIL DÓLARES ESTADOUNIDENSES (USD 30,000.00)".

const UNITS: [&str; 30] = [
    "cero",
    "uno",
    "dos",
    "tres",
    "cuatro",
    "cinco",
    "seis",
    "siete",
    "ocho",
    "nueve",
    "diez",
    "once",
    "doce",
    "trece",
    "catorce",
    "quince",
    "dieciséis",
    "diecisiete",
    "dieciocho",
    "diecinueve",
    "veinte",
    "veintiuno",
    "veintidós",
    "veintitrés",
    "veinticuatro",
    "veinticinco",
    "veintiséis",
    "veintisiete",
    "veintiocho",
    "veintinueve",
];

const TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "ciento",
    "doscientos",
    "trescientos",
    "cuatrocientos",
    "quinientos",
    "seiscientos",
    "setecientos",
    "ochocientos",
    "novecientos",
];

fn spell_under_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    if n < 30 {
        return UNITS[n as usize].to_string();
    }
    if n < 100 {
        let tens = TENS[(n / 10) as usize];
        let rest = n % 10;
        return if rest == 0 {
            tens.to_string()
        } else {
            format!("{tens} y {}", UNITS[rest as usize])
        };
    }
    if n == 100 {
        return "cien".to_string();
    }
    let hundreds = HUNDREDS[(n / 100) as usize];
    let rest = n % 100;
    if rest == 0 {
        hundreds.to_string()
    } else {
        format!("{hundreds} {}", spell_under_thousand(rest))
    }
}

/// "uno" apocopates to "un" when it quantifies mil/millones.
fn apocopate(spelled: String) -> String {
    if let Some(stem) = spelled.strip_suffix("veintiuno") {
        format!("{stem}veintiún")
    } else if let Some(stem) = spelled.strip_suffix("uno") {
        format!("{stem}un")
    } else {
        spelled
    }
}

/// Spell a non-negative integer in Spanish (supported up to 999,999,999).
pub fn spell_integer(n: u64) -> String {
    if n >= 1_000_000 {
        let millions = n / 1_000_000;
        let head = if millions == 1 {
            "un millón".to_string()
        } else {
            format!("{} millones", apocopate(spell_integer(millions)))
        };
        let rest = n % 1_000_000;
        return if rest == 0 {
            head
        } else {
            format!("{head} {}", spell_integer(rest))
        };
    }
    if n >= 1000 {
        let thousands = n / 1000;
        let head = if thousands == 1 {
            "mil".to_string()
        } else {
            format!("{} mil", apocopate(spell_under_thousand(thousands)))
        };
        let rest = n % 1000;
        return if rest == 0 {
            head
        } else {
            format!("{head} {}", spell_under_thousand(rest))
        };
    }
    spell_under_thousand(n)
}

fn currency_words(currency: &str) -> (String, String) {
    match currency {
        "USD" => ("DÓLARES ESTADOUNIDENSES".to_string(), "USD".to_string()),
        "DOP" => ("PESOS DOMINICANOS".to_string(), "RD$".to_string()),
        other => (other.to_uppercase(), other.to_string()),
    }
}

/// Thousands-separated two-decimal rendering: 20000 -> "20,000.00".
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02}")
}

/// Full legal form: "TREINTA MIL DÓLARES ESTADOUNIDENSES (USD 30,000.00)".
pub fn amount_to_legal_text(amount: f64, currency: &str) -> String {
    let (currency_text, symbol) = currency_words(currency);
    let spelled = spell_integer(amount.max(0.0) as u64).to_uppercase();
    format!("{spelled} {currency_text} ({symbol} {})", format_amount(amount))
}

/// Simple form without the numeric restatement.
pub fn amount_to_simple_text(amount: f64, currency: &str) -> String {
    let (currency_text, _) = currency_words(currency);
    let spelled = spell_integer(amount.max(0.0) as u64).to_uppercase();
    format!("{spelled} {currency_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spells_round_thousands() {
        assert_eq!(spell_integer(20_000), "veinte mil");
        assert_eq!(spell_integer(30_000), "treinta mil");
        assert_eq!(spell_integer(1_000), "mil");
        assert_eq!(spell_integer(21_000), "veintiún mil");
        assert_eq!(spell_integer(31_000), "treinta y un mil");
    }

    #[test]
    fn spells_mixed_values() {
        assert_eq!(spell_integer(0), "cero");
        assert_eq!(spell_integer(115), "ciento quince");
        assert_eq!(spell_integer(100), "cien");
        assert_eq!(spell_integer(999), "novecientos noventa y nueve");
        assert_eq!(spell_integer(1_500), "mil quinientos");
        assert_eq!(spell_integer(2_000_000), "dos millones");
        assert_eq!(spell_integer(1_000_250), "un millón doscientos cincuenta");
    }

    #[test]
    fn formats_amounts_with_separators() {
        assert_eq!(format_amount(20000.0), "20,000.00");
        assert_eq!(format_amount(1234567.5), "1,234,567.50");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn legal_text_for_usd() {
        assert_eq!(
            amount_to_legal_text(30000.0, "USD"),
            "TREINTA MIL DÓLARES ESTADOUNIDENSES (USD 30,000.00)"
        );
        assert_eq!(
            amount_to_simple_text(20000.0, "DOP"),
            "VEINTE MIL PESOS DOMINICANOS"
        );
    }
}
