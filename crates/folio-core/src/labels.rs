#![forbid(unsafe_code)]

//! Card labels: Russian plural agreement, difficulty glyphs and the year tag.
//!
//! # Invariants
//!
//! 1. [`plural_form`] depends only on `n % 100`.
//! 2. [`difficulty_stars`] always yields exactly [`MAX_DIFFICULTY`] glyphs.

/// Upper bound of the difficulty rating.
pub const MAX_DIFFICULTY: u8 = 5;

pub const FILLED_STAR: char = '★';
pub const EMPTY_STAR: char = '☆';

/// Russian plural category of a cardinal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralForm {
    /// 1, 21, 31, 101 ...
    One,
    /// 2–4, 22–24 ...
    Few,
    /// 0, 5–20, 25–30, 111–114 ...
    Many,
}

/// Classify `n` by the Russian plural rules.
#[must_use]
pub const fn plural_form(n: u64) -> PluralForm {
    let last_two = n % 100;
    let last = n % 10;
    if last_two >= 11 && last_two <= 14 {
        return PluralForm::Many;
    }
    match last {
        1 => PluralForm::One,
        2..=4 => PluralForm::Few,
        _ => PluralForm::Many,
    }
}

/// The two-line "unique solutions" caption under the resolved-issue count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionWords {
    pub qualifier: &'static str,
    pub noun: &'static str,
}

/// Caption agreeing with `n`.
#[must_use]
pub const fn solution_words(n: u64) -> SolutionWords {
    match plural_form(n) {
        PluralForm::One => SolutionWords {
            qualifier: "уникальное",
            noun: "решение",
        },
        PluralForm::Few => SolutionWords {
            qualifier: "уникальных",
            noun: "решения",
        },
        PluralForm::Many => SolutionWords {
            qualifier: "уникальных",
            noun: "решений",
        },
    }
}

/// `difficulty` filled glyphs followed by empty ones, five in total.
///
/// Ratings are clamped to `1..=MAX_DIFFICULTY`; a missing rating (0) shows
/// one star.
#[must_use]
pub fn difficulty_stars(difficulty: u8) -> String {
    let filled = usize::from(difficulty.clamp(1, MAX_DIFFICULTY));
    let empty = usize::from(MAX_DIFFICULTY) - filled;
    let mut stars = String::with_capacity(usize::from(MAX_DIFFICULTY) * FILLED_STAR.len_utf8());
    stars.extend(std::iter::repeat_n(FILLED_STAR, filled));
    stars.extend(std::iter::repeat_n(EMPTY_STAR, empty));
    stars
}

/// "2023 г." or "- г." when the year is unknown.
#[must_use]
pub fn year_label(year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{year} г."),
        None => "- г.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plural_boundaries() {
        assert_eq!(plural_form(1), PluralForm::One);
        for n in [2, 3, 4] {
            assert_eq!(plural_form(n), PluralForm::Few, "n={n}");
        }
        for n in 5..=14 {
            assert_eq!(plural_form(n), PluralForm::Many, "n={n}");
        }
        assert_eq!(plural_form(0), PluralForm::Many);
        assert_eq!(plural_form(21), PluralForm::One);
        assert_eq!(plural_form(22), PluralForm::Few);
        assert_eq!(plural_form(101), PluralForm::One);
        assert_eq!(plural_form(111), PluralForm::Many);
        assert_eq!(plural_form(112), PluralForm::Many);
    }

    #[test]
    fn solution_words_agree_with_count() {
        assert_eq!(solution_words(1).qualifier, "уникальное");
        assert_eq!(solution_words(1).noun, "решение");
        assert_eq!(solution_words(3).noun, "решения");
        assert_eq!(solution_words(3).qualifier, "уникальных");
        assert_eq!(solution_words(11).noun, "решений");
        assert_eq!(solution_words(25).noun, "решений");
    }

    #[test]
    fn difficulty_four_of_five() {
        assert_eq!(difficulty_stars(4), "★★★★☆");
    }

    #[test]
    fn difficulty_above_max_is_clamped() {
        assert_eq!(difficulty_stars(9), "★★★★★");
    }

    #[test]
    fn difficulty_below_one_is_clamped() {
        assert_eq!(difficulty_stars(0), "★☆☆☆☆");
    }

    #[test]
    fn year_label_handles_missing_year() {
        assert_eq!(year_label(Some(2024)), "2024 г.");
        assert_eq!(year_label(None), "- г.");
    }

    proptest! {
        #[test]
        fn plural_form_is_periodic_in_hundreds(n in 0u64..1_000_000) {
            prop_assert_eq!(plural_form(n), plural_form(n % 100));
        }

        #[test]
        fn difficulty_always_five_glyphs(d in any::<u8>()) {
            let stars = difficulty_stars(d);
            prop_assert_eq!(stars.chars().count(), 5);
            prop_assert_eq!(
                stars.chars().filter(|&c| c == FILLED_STAR).count(),
                usize::from(d.clamp(1, MAX_DIFFICULTY))
            );
        }
    }
}
