use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CPF - Brazilian individual taxpayer id
// ============================================================================
//
// An 11-digit string whose last two digits are mod-11 check digits over the
// preceding nine (and ten) digits. Formatting characters such as `.`, `-` or
// spaces are accepted on input and stripped before validation.
//
// ============================================================================

const CPF_LENGTH: usize = 11;

/// Strip every non-digit character.
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Check an already-sanitized CPF.
///
/// Any length other than 11, or a string made of one repeated digit, is
/// invalid even if its check digits would otherwise match.
pub fn is_valid(digits: &str) -> bool {
    if digits.len() != CPF_LENGTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let numbers: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();

    if numbers.iter().all(|&n| n == numbers[0]) {
        return false;
    }

    check_digit(&numbers[..9]) == numbers[9] && check_digit(&numbers[..10]) == numbers[10]
}

fn check_digit(digits: &[u32]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();

    match sum % 11 {
        0 | 1 => 0,
        remainder => 11 - remainder,
    }
}

/// A sanitized CPF that passed check-digit validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Sanitize then validate. Returns `None` when the digits do not form a valid CPF.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = sanitize(raw);
        is_valid(&digits).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Cpf {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid CPF: {value}"))
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_cpf() {
        assert!(is_valid("52998224725"));
        assert!(is_valid("12345678909"));
    }

    #[test]
    fn test_rejects_wrong_lengths_and_empty() {
        assert!(!is_valid(""));
        assert!(!is_valid("123"));
        assert!(!is_valid("123456789012345"));
    }

    #[test]
    fn test_rejects_repeated_digits() {
        for digit in 0..=9 {
            let cpf = digit.to_string().repeat(11);
            assert!(!is_valid(&cpf), "{cpf} should be invalid");
        }
    }

    #[test]
    fn test_rejects_wrong_check_digits() {
        assert!(!is_valid("52998224724"));
        assert!(!is_valid("52998224715"));
    }

    #[test]
    fn test_sanitize_strips_formatting() {
        assert_eq!(sanitize("123.456.789-00"), "12345678900");
        assert_eq!(sanitize("123.456.789.00"), "12345678900");
        assert_eq!(sanitize(" 529 982 247-25 "), "52998224725");
        assert_eq!(sanitize("abc123def"), "123");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["123.456.789-00", "abc123def", "", "  -.-  ", "52998224725"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_parse_formatted_cpf() {
        let cpf = Cpf::parse("529.982.247-25").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
        assert!(Cpf::parse("111.111.111-11").is_none());
    }

    #[test]
    fn test_cpf_deserialization_validates() {
        let cpf: Cpf = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(cpf.to_string(), "52998224725");

        let invalid = serde_json::from_str::<Cpf>("\"111.111.111-11\"");
        assert!(invalid.is_err());
    }
}
