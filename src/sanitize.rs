//! Input sanitization for outgoing payment fields.
//!
//! The broker restricts purchase ids, descriptions and entrance codes to a
//! fixed character set with hard length limits. Values are adjusted locally
//! before the call; every adjustment is reported as an [`Adjustment`] so it
//! stays observable without blocking the payment.

use crate::error::{Adjustment, AdjustmentCode};

/// Characters the broker accepts in purchase ids and descriptions besides
/// ASCII alphanumerics.
pub const TEXT_EXTRA_CHARS: &str = " =%*+,./&@\"':;?()$-";

/// Maximum purchase id length.
pub const PURCHASE_ID_MAX: usize = 16;

/// Maximum description length.
pub const DESCRIPTION_MAX: usize = 32;

/// Maximum entrance code length.
pub const ENTRANCE_CODE_MAX: usize = 40;

fn is_text_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || TEXT_EXTRA_CHARS.contains(c)
}

/// True iff `s` is a purchase id the broker accepts verbatim: whitelist
/// characters only, length 1 to 16.
pub fn is_valid_purchase_id(s: &str) -> bool {
    let len = s.chars().count();
    (1..=PURCHASE_ID_MAX).contains(&len) && s.chars().all(is_text_char)
}

/// True iff `s` is a description the broker accepts verbatim: whitelist
/// characters only, length 0 to 32.
pub fn is_valid_description(s: &str) -> bool {
    s.chars().count() <= DESCRIPTION_MAX && s.chars().all(is_text_char)
}

/// Convert a euro amount to whole cents, rounding half up at the cent
/// boundary.
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0 + 0.5).floor() as i64
}

/// Clean a purchase id for the wire.
///
/// Values within the length limit pass through untouched. Longer values
/// get every disallowed character blanked to a space and are then hard
/// truncated to 16 characters.
pub fn clean_purchase_id(raw: &str) -> (String, Vec<Adjustment>) {
    if raw.chars().count() <= PURCHASE_ID_MAX {
        return (raw.to_string(), Vec::new());
    }

    let cleaned: String = raw
        .chars()
        .map(|c| if is_text_char(c) { c } else { ' ' })
        .take(PURCHASE_ID_MAX)
        .collect();

    let adjustment = Adjustment::new(
        AdjustmentCode::PurchaseIdShortened,
        format!("purchase id shortened to {PURCHASE_ID_MAX} characters: '{cleaned}'"),
    );
    (cleaned, vec![adjustment])
}

/// Clean a description for the wire.
///
/// Disallowed characters become spaces, whitespace runs collapse to a
/// single space and trailing whitespace is trimmed. Values still longer
/// than 32 characters are reported but sent unchanged.
pub fn clean_description(raw: &str) -> (String, Vec<Adjustment>) {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if is_text_char(c) { c } else { ' ' };
        if c == ' ' && cleaned.ends_with(' ') {
            continue;
        }
        cleaned.push(c);
    }
    let cleaned = cleaned.trim_end().to_string();

    let mut adjustments = Vec::new();
    if cleaned.chars().count() > DESCRIPTION_MAX {
        adjustments.push(Adjustment::new(
            AdjustmentCode::DescriptionTooLong,
            format!("description exceeds {DESCRIPTION_MAX} characters and may be refused"),
        ));
    }
    (cleaned, adjustments)
}

/// Derive the entrance code sent on the wire.
///
/// Falls back to the purchase id when absent, strips everything outside
/// `[A-Za-z0-9]` and truncates to 40 characters. A code equal to the
/// purchase id is cleared: the broker substitutes the purchase id for an
/// empty entrance code itself.
pub fn clean_entrance_code(raw: Option<&str>, purchase_id: &str) -> (String, Vec<Adjustment>) {
    let base = raw.unwrap_or(purchase_id);
    let stripped: String = base.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    let mut adjustments = Vec::new();
    let code = if stripped.chars().count() > ENTRANCE_CODE_MAX {
        adjustments.push(Adjustment::new(
            AdjustmentCode::EntranceCodeShortened,
            format!("entrance code shortened to {ENTRANCE_CODE_MAX} characters"),
        ));
        stripped.chars().take(ENTRANCE_CODE_MAX).collect()
    } else {
        stripped
    };

    let code = if code == purchase_id {
        String::new()
    } else {
        code
    };
    (code, adjustments)
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Predicates ---

    #[test]
    fn test_valid_purchase_id() {
        assert!(is_valid_purchase_id("Valid Name-1"));
        assert!(is_valid_purchase_id("a"));
        assert!(is_valid_purchase_id("0123456789abcdef"));
    }

    #[test]
    fn test_invalid_purchase_id() {
        assert!(!is_valid_purchase_id(""));
        assert!(!is_valid_purchase_id("0123456789abcdefg")); // 17 chars
        assert!(!is_valid_purchase_id("naïve")); // non-ASCII
        assert!(!is_valid_purchase_id("tab\there"));
    }

    #[test]
    fn test_valid_description() {
        assert!(is_valid_description(""));
        assert!(is_valid_description("Order 42, please (rush)"));
        assert!(!is_valid_description(&"x".repeat(33)));
        assert!(!is_valid_description("emoji \u{1F600}"));
    }

    // --- Amount conversion ---

    #[test]
    fn test_amount_rounds_half_up() {
        assert_eq!(amount_to_cents(12.345), 1235);
        assert_eq!(amount_to_cents(12.344), 1234);
    }

    #[test]
    fn test_amount_exact_values() {
        assert_eq!(amount_to_cents(0.01), 1);
        assert_eq!(amount_to_cents(10.0), 1000);
        assert_eq!(amount_to_cents(99.995), 10000);
    }

    // --- Purchase id cleaning ---

    #[test]
    fn test_short_purchase_id_untouched() {
        let (cleaned, adjustments) = clean_purchase_id("order#1");
        // Within the limit nothing is rewritten, even disallowed characters.
        assert_eq!(cleaned, "order#1");
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_long_purchase_id_blanked_and_truncated() {
        let (cleaned, adjustments) = clean_purchase_id("order#123_with_extra_tail");
        assert_eq!(cleaned.chars().count(), 16);
        assert_eq!(cleaned, "order 123 with e");
        assert_eq!(adjustments.len(), 1);
        assert_eq!(
            adjustments[0].code,
            crate::error::AdjustmentCode::PurchaseIdShortened
        );
    }

    #[test]
    fn test_exactly_sixteen_chars_untouched() {
        let id = "0123456789abcdef";
        let (cleaned, adjustments) = clean_purchase_id(id);
        assert_eq!(cleaned, id);
        assert!(adjustments.is_empty());
    }

    // --- Description cleaning ---

    #[test]
    fn test_description_collapses_whitespace() {
        let (cleaned, adjustments) = clean_description("two  euro\tcoffee   ");
        assert_eq!(cleaned, "two euro coffee");
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_description_keeps_single_leading_space() {
        let (cleaned, _) = clean_description("   padded");
        assert_eq!(cleaned, " padded");
    }

    #[test]
    fn test_long_description_warned_not_truncated() {
        let long = "d".repeat(40);
        let (cleaned, adjustments) = clean_description(&long);
        assert_eq!(cleaned, long);
        assert_eq!(adjustments.len(), 1);
        assert_eq!(
            adjustments[0].code,
            crate::error::AdjustmentCode::DescriptionTooLong
        );
    }

    #[test]
    fn test_description_at_limit_not_warned() {
        let (cleaned, adjustments) = clean_description(&"d".repeat(32));
        assert_eq!(cleaned.chars().count(), 32);
        assert!(adjustments.is_empty());
    }

    // --- Entrance code cleaning ---

    #[test]
    fn test_entrance_code_defaults_to_purchase_id_and_clears() {
        // Defaulted code strips to the purchase id itself, so it clears.
        let (code, adjustments) = clean_entrance_code(None, "order1042");
        assert_eq!(code, "");
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_entrance_code_stripped_to_alphanumerics() {
        let (code, _) = clean_entrance_code(Some("ec-2024/001"), "order1042");
        assert_eq!(code, "ec2024001");
    }

    #[test]
    fn test_entrance_code_equal_after_strip_cleared() {
        let (code, _) = clean_entrance_code(Some("order-1042"), "order1042");
        assert_eq!(code, "");
    }

    #[test]
    fn test_entrance_code_truncated_at_forty() {
        let long = "e".repeat(50);
        let (code, adjustments) = clean_entrance_code(Some(&long), "order1042");
        assert_eq!(code.chars().count(), 40);
        assert_eq!(adjustments.len(), 1);
        assert_eq!(
            adjustments[0].code,
            crate::error::AdjustmentCode::EntranceCodeShortened
        );
    }
}
