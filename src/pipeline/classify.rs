//! Severity classification.
//!
//! Maps severity kinds and raw codes onto canonical type names and a
//! fatality class. Exception events bypass the table entirely and always
//! carry the fixed `Exception` type.

use crate::core::types::Severity;
use std::borrow::Cow;

/// Type name assigned to every unhandled-exception event.
pub const EXCEPTION_TYPE: &str = "Exception";

/// Canonical type name for a known severity kind.
pub fn classify(severity: Severity) -> &'static str {
    severity.name()
}

/// Canonical type name for a raw severity code.
///
/// Unknown codes fall back to their stringified numeric value.
pub fn classify_code(code: u32) -> Cow<'static, str> {
    match Severity::from_code(code) {
        Some(severity) => Cow::Borrowed(severity.name()),
        None => Cow::Owned(code.to_string()),
    }
}

/// Whether a raw severity code belongs to the fatal class.
///
/// Unknown codes are never fatal.
pub fn is_fatal_code(code: u32) -> bool {
    Severity::from_code(code).is_some_and(|severity| severity.is_fatal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_use_canonical_names() {
        assert_eq!(classify_code(1), "E_ERROR");
        assert_eq!(classify_code(2), "E_WARNING");
        assert_eq!(classify_code(8), "E_NOTICE");
        assert_eq!(classify_code(8192), "E_DEPRECATED");
        assert_eq!(classify_code(16384), "E_USER_DEPRECATED");
        assert_eq!(classify(Severity::CoreError), "E_CORE_ERROR");
    }

    #[test]
    fn test_fatal_class() {
        for code in [1, 4, 16, 64] {
            assert!(is_fatal_code(code), "code {} should be fatal", code);
        }
        for code in [2, 8, 32, 128, 256, 512, 1024, 2048, 4096, 8192, 16384] {
            assert!(!is_fatal_code(code), "code {} should not be fatal", code);
        }
    }

    #[test]
    fn test_unknown_codes_stringify() {
        assert_eq!(classify_code(3), "3");
        assert_eq!(classify_code(0), "0");
        assert_eq!(classify_code(32768), "32768");
        assert!(!is_fatal_code(3));
        assert!(!is_fatal_code(32768));
    }

    #[test]
    fn test_exception_type_is_fixed() {
        assert_eq!(EXCEPTION_TYPE, "Exception");
    }
}
