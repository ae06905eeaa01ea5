//! Choice decoding from free-form model output.
//!
//! Language models answer in prose, so recovering a [`Choice`] is a parsing
//! problem with no guaranteed answer. All of that uncertainty lives behind the
//! [`ChoiceDecoder`] trait; orchestration code only ever sees a
//! [`DecodedChoice`], which records whether the fallback was taken.
//!
//! The default [`DigitScanDecoder`] policy:
//!
//! 1. The principle is the first character in `1..=4`.
//! 2. For principles 3 and 4, the constraint is the first dollar amount after
//!    that character (`$13,000`, `13000`, `13k`, `12.5k`).
//! 3. No principle digit: principle 1, flagged as a fallback.

use super::choice::{Choice, Principle};
use serde::{Deserialize, Serialize};

/// What a decoder recovered from a model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedChoice {
    pub principle_id: u8,
    /// Floor for principle 3, range for principle 4
    pub constraint: Option<i64>,
    /// True when nothing usable was found and the default was applied
    pub fallback: bool,
}

impl DecodedChoice {
    /// Attach reasoning text and place the constraint in the right slot
    pub fn into_choice(self, reasoning: impl Into<String>) -> Choice {
        let choice = Choice::raw(self.principle_id, reasoning);
        match (Principle::from_id(self.principle_id), self.constraint) {
            (Some(Principle::FloorConstraint), Some(floor)) => choice.with_floor_constraint(floor),
            (Some(Principle::RangeConstraint), Some(range)) => choice.with_range_constraint(range),
            _ => choice,
        }
    }
}

/// Narrow interface for turning an extractor reply into a choice
pub trait ChoiceDecoder: Send + Sync {
    fn decode(&self, reply: &str) -> DecodedChoice;
}

/// First-digit scan with a principle-1 default
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitScanDecoder;

impl DigitScanDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ChoiceDecoder for DigitScanDecoder {
    fn decode(&self, reply: &str) -> DecodedChoice {
        let Some((pos, digit)) = reply.char_indices().find(|(_, c)| matches!(c, '1'..='4')) else {
            return DecodedChoice {
                principle_id: Principle::MaximizeFloor.id(),
                constraint: None,
                fallback: true,
            };
        };

        let principle_id = digit as u8 - b'0';
        let constraint = match Principle::from_id(principle_id) {
            Some(p) if p.requires_floor() || p.requires_range() => {
                scan_amount(&reply[pos + digit.len_utf8()..])
            }
            _ => None,
        };

        DecodedChoice {
            principle_id,
            constraint,
            fallback: false,
        }
    }
}

/// Find the first dollar amount in `text`.
///
/// Accepts digit runs with comma separators, an optional decimal part and an
/// optional `k`/`K` suffix. Without the suffix the decimal part (cents) is
/// ignored. Digits glued to the principle number (e.g. the `0` in `30`) are skipped
/// by requiring the run to start after a non-digit.
fn scan_amount(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut i = 0;

    // Skip the remainder of a number the principle digit was part of
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let mut value: i64 = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_digit() {
                value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
                i += 1;
            } else if b == b',' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                i += 1;
            } else {
                break;
            }
        }

        // Fraction digits beyond thousandths are dropped
        let (mut fraction, mut scale) = (0i64, 1i64);
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                if scale < 1000 {
                    fraction = fraction * 10 + i64::from(bytes[i] - b'0');
                    scale *= 10;
                }
                i += 1;
            }
        }

        if i < bytes.len() && matches!(bytes[i], b'k' | b'K') {
            value = value
                .checked_mul(1000)?
                .checked_add(fraction * 1000 / scale)?;
        }

        return Some(value);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(reply: &str) -> DecodedChoice {
        DigitScanDecoder::new().decode(reply)
    }

    #[test]
    fn test_decimal_thousands_keep_their_fraction() {
        assert_eq!(decode("3 with a floor of 12.5k").constraint, Some(12_500));
        assert_eq!(decode("4, range 1.25K please").constraint, Some(1_250));
        assert_eq!(decode("3: $13,000.75 floor").constraint, Some(13_000));
        assert_eq!(decode("3 at $14,000.").constraint, Some(14_000));
    }

    #[test]
    fn test_first_valid_digit_wins() {
        assert_eq!(decode("Principle 2 is best").principle_id, 2);
        assert_eq!(decode("I pick 4, not 1").principle_id, 4);
    }

    #[test]
    fn test_digits_outside_range_are_skipped() {
        let decoded = decode("Option 0 or 9? No: 3 with a $15,000 floor");
        assert_eq!(decoded.principle_id, 3);
        assert_eq!(decoded.constraint, Some(15000));
    }

    #[test]
    fn test_no_digit_falls_back_to_principle_one() {
        let decoded = decode("I am still undecided.");
        assert!(decoded.fallback);
        assert_eq!(decoded.principle_id, 1);
        assert_eq!(decoded.constraint, None);
    }

    #[test]
    fn test_constraint_formats() {
        assert_eq!(decode("3 floor 13000").constraint, Some(13000));
        assert_eq!(decode("4: range of $10,500").constraint, Some(10500));
        assert_eq!(decode("principle 3, floor 12k").constraint, Some(12000));
    }

    #[test]
    fn test_constraint_ignored_for_plain_principles() {
        let decoded = decode("2 because $30,000 average beats everything");
        assert_eq!(decoded.principle_id, 2);
        assert_eq!(decoded.constraint, None);
    }

    #[test]
    fn test_missing_constraint_is_not_a_fallback() {
        let decoded = decode("principle 4");
        assert!(!decoded.fallback);
        assert_eq!(decoded.constraint, None);
    }

    #[test]
    fn test_into_choice_places_constraint() {
        let floor = decode("3 - floor $12,000").into_choice("reasoning");
        assert_eq!(floor.floor_constraint, Some(12000));
        assert_eq!(floor.range_constraint, None);
        assert_eq!(floor.reasoning, "reasoning");

        let range = decode("4 - range 8000").into_choice("");
        assert_eq!(range.range_constraint, Some(8000));
        assert_eq!(range.floor_constraint, None);
    }
}
