//! Field normalization shared by registration and updates.

/// Trimmed value, or an error naming the empty field.
pub fn required(field: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Lower-cased, trimmed email with one `@` and something on both sides.
pub fn email(value: &str) -> Result<String, String> {
    let email = value.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(format!("invalid email: {value}")),
    }
}

/// Phone number with spaces and dashes removed; digits with an optional
/// leading `+`.
pub fn phone(value: &str) -> Result<String, String> {
    let phone: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if digits.len() >= 7 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(phone)
    } else {
        Err(format!("invalid phone: {value}"))
    }
}

/// Upper-cased alphanumeric code of exactly `len` characters.
pub fn code(field: &str, value: &str, len: usize) -> Result<String, String> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() == len && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(code)
    } else {
        Err(format!("{field} must be {len} letters or digits"))
    }
}

/// Blank optional strings become `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert_eq!(email("  A@X.com ").unwrap(), "a@x.com");
        assert!(email("nope").is_err());
        assert!(email("@x.com").is_err());
        assert!(email("a@b@c").is_err());
    }

    #[test]
    fn test_phone() {
        assert_eq!(phone("+91 98765-43210").unwrap(), "+919876543210");
        assert!(phone("12").is_err());
        assert!(phone("call me").is_err());
    }

    #[test]
    fn test_code_and_optional() {
        assert_eq!(code("PAN", " abcde1234f ", 10).unwrap(), "ABCDE1234F");
        assert!(code("PAN", "ABC", 10).is_err());
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" Delhi ".into())), Some("Delhi".into()));
    }
}
