//! Decoding of the ASCII payloads the glove microcontroller sends.
//!
//! Every value on the wire is a decimal integer in ASCII, NUL-padded to the
//! read width. Axis values are integer-scaled physical units, not floats.

/// The fixed-width payload of one successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample<'a>(&'a [u8]);

impl<'a> RawSample<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Leading decimal integer, `atoi` style: optional whitespace and sign,
    /// digits up to the first non-digit. No digits decodes as 0.
    pub fn integer(&self) -> i64 {
        let mut bytes = self
            .0
            .iter()
            .copied()
            .skip_while(|b| b.is_ascii_whitespace())
            .peekable();

        let negative = match bytes.peek() {
            Some(b'-') => {
                bytes.next();
                true
            }
            Some(b'+') => {
                bytes.next();
                false
            }
            _ => false,
        };

        let magnitude = bytes
            .take_while(u8::is_ascii_digit)
            .fold(0i64, |acc, digit| {
                acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
            });

        if negative { -magnitude } else { magnitude }
    }

    /// Unsigned count. Negative values clamp to 0.
    pub fn count(&self) -> u32 {
        u32::try_from(self.integer().max(0)).unwrap_or(u32::MAX)
    }

    /// Contact state. The firmware reports a closed circuit as 0, so any
    /// non-zero value means no contact.
    pub fn contact(&self) -> bool {
        self.integer() == 0
    }

    pub fn axis(&self) -> f64 {
        self.integer() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_polarity_is_inverted() {
        assert!(!RawSample::new(b"1").contact());
        assert!(RawSample::new(b"0").contact());
    }

    #[test]
    fn nul_padding_is_ignored() {
        assert_eq!(RawSample::new(b"512\0").count(), 512);
        assert_eq!(RawSample::new(b"7\0\0\0").count(), 7);
        assert_eq!(RawSample::new(b"-1234\0").axis(), -1234.0);
    }

    #[test]
    fn leading_whitespace_and_sign_are_accepted() {
        assert_eq!(RawSample::new(b"  42").integer(), 42);
        assert_eq!(RawSample::new(b"+9").integer(), 9);
        assert_eq!(RawSample::new(b"\t-3").integer(), -3);
    }

    #[test]
    fn garbage_decodes_as_zero() {
        assert_eq!(RawSample::new(b"").integer(), 0);
        assert_eq!(RawSample::new(b"\0\0\0\0").integer(), 0);
        assert_eq!(RawSample::new(b"ab12").integer(), 0);
        assert_eq!(RawSample::new(b"-").integer(), 0);
        // garbage reads as "contact", same as the firmware's zero
        assert!(RawSample::new(b"x").contact());
    }

    #[test]
    fn digits_stop_at_first_non_digit() {
        assert_eq!(RawSample::new(b"12x4").integer(), 12);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(RawSample::new(b"-5").count(), 0);
    }
}
