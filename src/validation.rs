//! Field checks shared by every entity. Each helper returns the value it
//! accepted (trimmed where that matters) so callers can validate and assign
//! in one step.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LibraryError, Result};

const MAX_NAME_LEN: usize = 100;
const MAX_AGE_YEARS: u32 = 150;
/// Earliest publication year accepted for a book.
pub const EARLIEST_PUBLICATION_YEAR: i32 = 1500;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}[\p{L} .'\-]*$").expect("name regex is valid"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]*[0-9]$").expect("phone regex is valid"));

/// First and last names: letters, spaces, apostrophes, hyphens and periods.
pub fn name(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::validation(field, "must not be empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(LibraryError::validation(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    if !NAME_RE.is_match(value) {
        return Err(LibraryError::validation(field, "contains invalid characters"));
    }
    Ok(value.to_string())
}

/// Any non-blank free text.
pub fn text(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(LibraryError::validation(field, "must not be empty"))
    } else {
        Ok(value.to_string())
    }
}

pub fn email(value: &str) -> Result<String> {
    let value = value.trim();
    if EMAIL_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(LibraryError::validation("email", format!("'{value}' is not an email address")))
    }
}

pub fn phone_number(value: &str) -> Result<String> {
    let value = value.trim();
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if PHONE_RE.is_match(value) && (7..=15).contains(&digits) {
        Ok(value.to_string())
    } else {
        Err(LibraryError::validation(
            "phone number",
            format!("'{value}' is not a phone number"),
        ))
    }
}

/// ISBN-10 or ISBN-13. Hyphens and spaces are accepted and preserved; the
/// check digit must match.
pub fn isbn(value: &str) -> Result<String> {
    let value = value.trim();
    let compact: Vec<char> = value.chars().filter(|c| *c != '-' && *c != ' ').collect();
    let valid = match compact.len() {
        10 => isbn10_checksum(&compact),
        13 => isbn13_checksum(&compact),
        _ => false,
    };
    if valid {
        Ok(value.to_string())
    } else {
        Err(LibraryError::validation("ISBN", format!("'{value}' is not a valid ISBN")))
    }
}

fn isbn10_checksum(chars: &[char]) -> bool {
    let mut sum = 0;
    for (i, c) in chars.iter().enumerate() {
        let digit = match c {
            'X' | 'x' if i == 9 => 10,
            c => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += digit * (10 - i as u32);
    }
    sum % 11 == 0
}

fn isbn13_checksum(chars: &[char]) -> bool {
    let mut sum = 0;
    for (i, c) in chars.iter().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { digit } else { digit * 3 };
    }
    sum % 10 == 0
}

pub fn date_of_birth(value: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
    if value > today {
        return Err(LibraryError::validation(
            "date of birth",
            "cannot be in the future",
        ));
    }
    let oldest = today.checked_sub_months(Months::new(MAX_AGE_YEARS * 12));
    if oldest.is_some_and(|oldest| value < oldest) {
        return Err(LibraryError::validation(
            "date of birth",
            format!("cannot be more than {MAX_AGE_YEARS} years ago"),
        ));
    }
    Ok(value)
}

pub fn publication_year(value: i32, current_year: i32) -> Result<i32> {
    if (EARLIEST_PUBLICATION_YEAR..=current_year).contains(&value) {
        Ok(value)
    } else {
        Err(LibraryError::validation(
            "publication year",
            format!("must be between {EARLIEST_PUBLICATION_YEAR} and {current_year}"),
        ))
    }
}

pub fn positive(field: &'static str, value: u32) -> Result<u32> {
    if value > 0 {
        Ok(value)
    } else {
        Err(LibraryError::validation(field, "must be positive"))
    }
}

pub fn rating(value: f64) -> Result<f64> {
    if value > 0.0 && value <= 5.0 {
        Ok(value)
    } else {
        Err(LibraryError::validation(
            "rating",
            "must be greater than 0 and at most 5",
        ))
    }
}
