//! # Input Requirements
//!
//! A `Requirement` is a named predicate over raw user input plus the message
//! shown when the predicate does not hold. Requirements are plain `static`
//! values so any number of parameters can share them by reference.
//!
//! The validation pipeline evaluates a parameter's requirements in declared
//! order and stops at the first one that fails:
//!
//! ```rust,ignore
//! use vapor::action::requirement::{validate_all, NONEMPTY, POSITIVE_INTEGER};
//!
//! let rejection = validate_all(&[&NONEMPTY, &POSITIVE_INTEGER], "").unwrap_err();
//! assert_eq!(rejection.message, NONEMPTY.message);
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::value::{parse_date, parse_datetime};

/// A condition to enforce on a raw string, and the message to report when
/// the condition is not met.
pub struct Requirement {
    /// Stable identifier, e.g. `NONEMPTY`
    pub name: &'static str,
    /// Human-readable description of the violated condition
    pub message: &'static str,
    predicate: fn(&str) -> bool,
}

impl Requirement {
    pub const fn new(name: &'static str, predicate: fn(&str) -> bool, message: &'static str) -> Self {
        Requirement {
            name,
            message,
            predicate,
        }
    }

    /// Check whether `value` satisfies this requirement
    pub fn accepts(&self, value: &str) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

/// The first requirement a value failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    pub requirement: &'static str,
    pub message: &'static str,
}

impl From<&Requirement> for Rejection {
    fn from(requirement: &Requirement) -> Self {
        Rejection {
            requirement: requirement.name,
            message: requirement.message,
        }
    }
}

/// Run `value` through `requirements` in order.
///
/// Returns the first failing requirement's message; later requirements are
/// not evaluated.
pub fn validate_all(requirements: &[&Requirement], value: &str) -> Result<(), Rejection> {
    match requirements.iter().find(|req| !req.accepts(value)) {
        Some(failed) => Err(Rejection::from(*failed)),
        None => Ok(()),
    }
}

// Standard requirements

pub static NONEMPTY: Requirement =
    Requirement::new("NONEMPTY", is_nonempty, "value cannot be empty");

pub static POSITIVE_INTEGER: Requirement = Requirement::new(
    "POSITIVE_INTEGER",
    is_digits,
    "value must be a whole number made of digits only",
);

/// Fits the store's 32-bit integer columns
pub static INTEGER_RANGE: Requirement = Requirement::new(
    "INTEGER_RANGE",
    fits_i32,
    "value must be between -2147483648 and 2147483647",
);

pub static ISO_DATE: Requirement =
    Requirement::new("ISO_DATE", is_iso_date, "value must be a date formatted as YYYY-MM-DD");

pub static ISO_DATETIME: Requirement = Requirement::new(
    "ISO_DATETIME",
    is_iso_datetime,
    "value must be a date and time formatted as YYYY-MM-DD HH:MM:SS",
);

pub static MONEY_AMOUNT: Requirement = Requirement::new(
    "MONEY_AMOUNT",
    is_money_amount,
    "value must be an amount with at most two decimal places, e.g. 19.99",
);

// Column widths of the store's text columns

pub static USERNAME_LENGTH: Requirement = Requirement::new(
    "USERNAME_LENGTH",
    |s| char_len_at_most(s, 25),
    "username must be at most 25 characters long",
);

pub static GAME_NAME_LENGTH: Requirement = Requirement::new(
    "GAME_NAME_LENGTH",
    |s| char_len_at_most(s, 35),
    "game name must be at most 35 characters long",
);

pub static COMMENT_LENGTH: Requirement = Requirement::new(
    "COMMENT_LENGTH",
    |s| char_len_at_most(s, 100),
    "comment must be at most 100 characters long",
);

#[allow(clippy::unwrap_used)]
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

#[allow(clippy::unwrap_used)]
static MONEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").unwrap());

fn is_nonempty(s: &str) -> bool {
    !s.is_empty()
}

fn is_digits(s: &str) -> bool {
    DIGITS.is_match(s)
}

fn fits_i32(s: &str) -> bool {
    s.parse::<i32>().is_ok()
}

fn is_iso_date(s: &str) -> bool {
    parse_date(s).is_some()
}

fn is_iso_datetime(s: &str) -> bool {
    parse_datetime(s).is_some()
}

fn is_money_amount(s: &str) -> bool {
    MONEY.is_match(s)
}

fn char_len_at_most(s: &str, max: usize) -> bool {
    s.chars().count() <= max
}
