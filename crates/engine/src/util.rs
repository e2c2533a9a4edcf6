//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use rust_decimal::Decimal;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Parse a decimal column value. Amounts are stored as text so that no value
/// ever round-trips through binary floating point.
pub(crate) fn parse_decimal(raw: &str, what: &str) -> ResultEngine<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|_| EngineError::InvalidInput(format!("invalid {what}: {raw}")))
}

/// NFKC + casefold normalization used for per-owner name uniqueness.
pub(crate) fn normalize_name(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_folds_case_and_width() {
        assert_eq!(normalize_name("  Checking "), "checking");
        // Fullwidth forms normalize to ASCII under NFKC.
        assert_eq!(normalize_name("Ｂａｎｋ"), "bank");
    }

    #[test]
    fn parse_decimal_rejects_garbage() {
        assert!(parse_decimal("100.00", "amount").is_ok());
        assert!(parse_decimal("1e3x", "amount").is_err());
    }
}
