//! Client-side token estimation
//!
//! Rough GPT-style heuristic: one token per four characters. Used for the
//! live counter next to the composer and embedded in every submission.

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`
///
/// Returns `0` for empty text and at least `1` otherwise. Length is measured
/// in Unicode scalar values, so the estimate is deterministic and monotonic in
/// `text.chars().count()`.
#[inline]
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    let len = text.chars().count();
    if len == 0 {
        return 0;
    }
    len.div_ceil(CHARS_PER_TOKEN).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn short_text_rounds_up() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // four multi-byte chars are still one token
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_length(a in ".{0,64}", b in ".{0,64}") {
            let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
            prop_assert!(estimate_tokens(&short) <= estimate_tokens(&long));
        }

        #[test]
        fn prop_non_empty_is_positive(s in ".{1,64}") {
            prop_assert!(estimate_tokens(&s) >= 1);
        }
    }
}
