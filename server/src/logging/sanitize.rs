//! Log sanitizers
//!
//! Identity documents and person ids are PII; log lines keep just enough of
//! each value to correlate events.

/// Keep the first 8 characters of an opaque id.
pub fn sanitize_person_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    if prefix.chars().count() == id.chars().count() {
        id.to_string()
    } else {
        format!("{prefix}…")
    }
}

/// Mask all but the last 4 characters of an identity document number.
pub fn sanitize_document_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

/// Reduce a display name to initials.
pub fn sanitize_name(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .map(|c| format!("{c}."))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_numbers_keep_last_four() {
        assert_eq!(sanitize_document_number("00112345678"), "*******5678");
        assert_eq!(sanitize_document_number("123"), "****");
    }

    #[test]
    fn names_become_initials() {
        assert_eq!(sanitize_name("Juan Pérez"), "J. P.");
    }

    #[test]
    fn short_ids_pass_through() {
        assert_eq!(sanitize_person_id("abc"), "abc");
        assert_eq!(sanitize_person_id("0123456789abcdef"), "01234567…");
    }
}
