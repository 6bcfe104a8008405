//! Single-value validators and the reason codes they report.
//!
//! Every validator is a pure function of the raw input (and, for the date
//! rules, of "today"). Only [`FieldValidator::Required`] reports a blank
//! value; every other rule accepts blank input so a missing value surfaces
//! as a single `required` reason.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReasonCode {
    Required,
    Pattern,
    MinLength,
    MaxLength,
    Min,
    Max,
    InvalidEmail,
    WeakPassword,
    FechaFutura,
    FechaAnterior,
    HoraFutura,
    Repetido,
    PasswordMatch,
    NumeroRepetido,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::Required => "required",
            ReasonCode::Pattern => "pattern",
            ReasonCode::MinLength => "minlength",
            ReasonCode::MaxLength => "maxlength",
            ReasonCode::Min => "min",
            ReasonCode::Max => "max",
            ReasonCode::InvalidEmail => "invalidEmail",
            ReasonCode::WeakPassword => "weakPassword",
            ReasonCode::FechaFutura => "fechaFutura",
            ReasonCode::FechaAnterior => "fechaAnterior",
            ReasonCode::HoraFutura => "horaFutura",
            ReasonCode::Repetido => "repetido",
            ReasonCode::PasswordMatch => "passwordMatch",
            ReasonCode::NumeroRepetido => "numeroRepetido",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub type Reasons = BTreeSet<ReasonCode>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(Reasons),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn reasons(&self) -> Reasons {
        match self {
            ValidationResult::Valid => Reasons::new(),
            ValidationResult::Invalid(reasons) => reasons.clone(),
        }
    }

    pub fn has(&self, code: ReasonCode) -> bool {
        match self {
            ValidationResult::Valid => false,
            ValidationResult::Invalid(reasons) => reasons.contains(&code),
        }
    }

    fn from_reasons(reasons: Reasons) -> Self {
        if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(reasons)
        }
    }
}

/// Source of "now" for date and time rules.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];
const IMAGE_CDN_PREFIXES: &[&str] = &["https://flagcdn.com/", "https://upload.wikimedia.org/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValidator {
    Required,
    /// Latin letters (including U+00C0..=U+00FF) and whitespace only.
    NameCharset,
    Length { min: usize, max: usize },
    /// Integer-only; non-integers report `pattern`.
    IntRange { min: i64, max: i64 },
    Email,
    StrongPassword,
    /// Strictly before today.
    PastDate,
    /// Today or later.
    FutureOrToday,
    TeamCode,
    ImageUrl,
    /// `HH:MM` or `HH:MM:SS`.
    TimeOfDay,
    OneOf(&'static [&'static str]),
}

impl FieldValidator {
    pub fn check(&self, raw: &str, today: NaiveDate) -> Option<ReasonCode> {
        let value = raw.trim();
        if value.is_empty() {
            return match self {
                FieldValidator::Required => Some(ReasonCode::Required),
                _ => None,
            };
        }
        match self {
            FieldValidator::Required => None,
            FieldValidator::NameCharset => {
                (!value.chars().all(is_name_char)).then_some(ReasonCode::Pattern)
            }
            FieldValidator::Length { min, max } => {
                let len = raw.chars().count();
                if len < *min {
                    Some(ReasonCode::MinLength)
                } else if len > *max {
                    Some(ReasonCode::MaxLength)
                } else {
                    None
                }
            }
            FieldValidator::IntRange { min, max } => match value.parse::<i64>() {
                Ok(n) if n < *min => Some(ReasonCode::Min),
                Ok(n) if n > *max => Some(ReasonCode::Max),
                Ok(_) => None,
                Err(_) => Some(ReasonCode::Pattern),
            },
            FieldValidator::Email => (!is_email(value)).then_some(ReasonCode::InvalidEmail),
            FieldValidator::StrongPassword => {
                (!is_strong_password(raw)).then_some(ReasonCode::WeakPassword)
            }
            FieldValidator::PastDate => match parse_date(value) {
                Some(date) if date >= today => Some(ReasonCode::FechaFutura),
                Some(_) => None,
                None => Some(ReasonCode::Pattern),
            },
            FieldValidator::FutureOrToday => match parse_date(value) {
                Some(date) if date < today => Some(ReasonCode::FechaAnterior),
                Some(_) => None,
                None => Some(ReasonCode::Pattern),
            },
            FieldValidator::TeamCode => {
                let ok =
                    value.chars().count() == 3 && value.chars().all(|c| c.is_ascii_uppercase());
                (!ok).then_some(ReasonCode::Pattern)
            }
            FieldValidator::ImageUrl => (!is_image_url(value)).then_some(ReasonCode::Pattern),
            FieldValidator::TimeOfDay => parse_time(value)
                .is_none()
                .then_some(ReasonCode::Pattern),
            FieldValidator::OneOf(options) => {
                (!options.contains(&value)).then_some(ReasonCode::Pattern)
            }
        }
    }
}

/// Runs every validator in order; the result carries the union of reasons.
pub fn run_validators(
    validators: &[FieldValidator],
    raw: &str,
    today: NaiveDate,
) -> ValidationResult {
    let reasons = validators
        .iter()
        .filter_map(|v| v.check(raw, today))
        .collect::<Reasons>();
    ValidationResult::from_reasons(reasons)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{00FF}').contains(&c) || c.is_whitespace()
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if local.is_empty() || !local_ok {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_strong_password(value: &str) -> bool {
    !value.contains(['\n', '\r'])
        && value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

fn is_image_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    if IMAGE_CDN_PREFIXES.iter().any(|p| value.starts_with(p) && value.len() > p.len()) {
        return true;
    }
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    let Some(rest) = rest else {
        return false;
    };
    let Some((host, path)) = rest.split_once('/') else {
        return false;
    };
    if host.is_empty() {
        return false;
    }
    let path = path.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a `T...` time part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}
