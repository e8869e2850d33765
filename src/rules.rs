//! Reusable validation rules. Each constructor returns a closure usable as a
//! field validator; shape rules skip empty values so that presence stays the
//! responsibility of `required`.

use std::borrow::Cow;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use crate::validation::ValidationError;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PHONE_PATTERN: &str = r"^\+?[1-9][0-9]{0,15}$";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError(Cow<'static, str>);

impl FieldError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self(message.into())
    }
}

impl ValidationError for FieldError {
    fn message(&self) -> Cow<'static, str> {
        self.0.clone()
    }
}

pub fn required<T>(
    message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    move |_, value| {
        if value.trim().is_empty() {
            Err(FieldError::new(message))
        } else {
            Ok(())
        }
    }
}

pub fn min_length<T>(
    min: usize,
    message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    move |_, value| {
        if !value.is_empty() && value.chars().count() < min {
            Err(FieldError::new(message))
        } else {
            Ok(())
        }
    }
}

pub fn email<T>(
    message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    let pattern = Regex::new(EMAIL_PATTERN).expect("email pattern must compile");
    move |_, value| {
        if value.is_empty() || pattern.is_match(value) {
            Ok(())
        } else {
            Err(FieldError::new(message))
        }
    }
}

/// Optional leading `+`, then up to 16 digits with a non-zero first digit.
/// Spaces, hyphens, and parentheses are stripped before the check.
pub fn phone<T>(
    message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    let pattern = Regex::new(PHONE_PATTERN).expect("phone pattern must compile");
    move |_, value| {
        if value.is_empty() {
            return Ok(());
        }
        let digits: String = value
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        if pattern.is_match(&digits) {
            Ok(())
        } else {
            Err(FieldError::new(message))
        }
    }
}

/// Minimum age computed against the local calendar date at validation time.
pub fn minimum_age<T>(
    years: u32,
    invalid_date_message: &'static str,
    too_young_message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    move |_, value| {
        check_minimum_age(
            value,
            Local::now().date_naive(),
            years,
            invalid_date_message,
            too_young_message,
        )
    }
}

/// `minimum_age` against a fixed reference date. Deterministic variant for
/// callers that must not depend on the wall clock.
pub fn minimum_age_on<T>(
    today: NaiveDate,
    years: u32,
    invalid_date_message: &'static str,
    too_young_message: &'static str,
) -> impl for<'a> Fn(&'a T, &'a String) -> Result<(), FieldError> + Send + Sync {
    move |_, value| check_minimum_age(value, today, years, invalid_date_message, too_young_message)
}

fn check_minimum_age(
    value: &str,
    today: NaiveDate,
    years: u32,
    invalid_date_message: &'static str,
    too_young_message: &'static str,
) -> Result<(), FieldError> {
    if value.is_empty() {
        return Ok(());
    }
    let Ok(born) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
        return Err(FieldError::new(invalid_date_message));
    };

    // Whole-year difference, minus one if the birthday has not occurred yet
    // this year.
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    if age < years as i32 {
        Err(FieldError::new(too_young_message))
    } else {
        Ok(())
    }
}
