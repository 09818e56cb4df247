//! National identifier validation and classification.
//!
//! NHS, CHI and HSC numbers share the same shape: ten digits with a
//! mod-11 check digit over the first nine. The numeric range tells the
//! schemes apart, which matters because the extract files are known to
//! deliver CHI and HSC numbers in the NHS column. A CHI number starts
//! with the day of birth, so days 01 to 09 produce a leading zero and
//! the value arrives as nine digits in integer form; those are valid
//! CHI numbers and are zero-padded before checksum verification.

/// Classification of a candidate national identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// Not ten digits, or the check digit does not verify
    Invalid,
    /// NHS number (England and Wales)
    Nhs,
    /// CHI number (Scotland)
    Chi,
    /// HSC number (Northern Ireland)
    Hsc,
}

impl IdentifierKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Nhs => "NHS",
            Self::Chi => "CHI",
            Self::Hsc => "HSC",
        }
    }
}

/// CHI numbers start here; day-of-birth values 01 to 09 lose their
/// leading zero in integer form, so the range reaches below ten digits
pub const CHI_LOWER_BOUND: i64 = 10_000_010;
/// CHI numbers sit below this bound
pub const CHI_UPPER_BOUND: i64 = 3_200_000_000;
/// HSC numbers sit below this bound (and at or above `CHI_UPPER_BOUND`)
pub const HSC_UPPER_BOUND: i64 = 4_000_000_000;

const MAX_TEN_DIGIT: i64 = 9_999_999_999;

/// Classify a numeric national identifier
///
/// # Arguments
/// * `value` - The candidate identifier as a number
///
/// # Returns
/// The scheme the value belongs to, or `Invalid` when it falls outside
/// every scheme's range or its check digit does not verify
#[must_use]
pub fn classify(value: i64) -> IdentifierKind {
    if !(CHI_LOWER_BOUND..=MAX_TEN_DIGIT).contains(&value) {
        return IdentifierKind::Invalid;
    }

    if !check_digit_valid(value) {
        return IdentifierKind::Invalid;
    }

    if value < CHI_UPPER_BOUND {
        IdentifierKind::Chi
    } else if value < HSC_UPPER_BOUND {
        IdentifierKind::Hsc
    } else {
        IdentifierKind::Nhs
    }
}

/// Verify the mod-11 check digit of an identifier, zero-padded to ten
/// digits
///
/// Digits are weighted 10 down to 2, the weighted sum is reduced mod 11
/// and the check digit is 11 minus the remainder (11 maps to 0, 10 is
/// never valid).
fn check_digit_valid(value: i64) -> bool {
    let mut digits = [0u8; 10];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = (rest % 10) as u8;
        rest /= 10;
    }

    let sum: u32 = digits[..9]
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * (10 - i as u32))
        .sum();

    let expected = match 11 - (sum % 11) {
        11 => 0,
        10 => return false,
        n => n,
    };

    u32::from(digits[9]) == expected
}
