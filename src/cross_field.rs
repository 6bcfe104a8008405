//! Rules spanning sibling fields of one form.
//!
//! Each rule owns exactly one reason code on exactly one target field. The
//! form applies an [`CrossOutcome`] by inserting or removing that code only,
//! so re-running a rule never disturbs reasons set by anything else.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::validate::{ReasonCode, parse_date, parse_time};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossValidator {
    /// When `date` is today, `time` must be later than the wall clock.
    MatchTimeNotPast {
        date: &'static str,
        time: &'static str,
    },
    /// `second` must not repeat `first`.
    TeamRepeat {
        first: &'static str,
        second: &'static str,
    },
    PasswordConfirmation {
        password: &'static str,
        confirm: &'static str,
    },
    /// `field` must not collide with any number already on the roster.
    JerseyNumberUnique {
        field: &'static str,
        taken: BTreeSet<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossOutcome {
    pub target: &'static str,
    pub code: ReasonCode,
    pub fired: bool,
}

impl CrossValidator {
    pub fn target(&self) -> &'static str {
        match self {
            CrossValidator::MatchTimeNotPast { time, .. } => *time,
            CrossValidator::TeamRepeat { second, .. } => *second,
            CrossValidator::PasswordConfirmation { confirm, .. } => *confirm,
            CrossValidator::JerseyNumberUnique { field, .. } => *field,
        }
    }

    pub fn code(&self) -> ReasonCode {
        match self {
            CrossValidator::MatchTimeNotPast { .. } => ReasonCode::HoraFutura,
            CrossValidator::TeamRepeat { .. } => ReasonCode::Repetido,
            CrossValidator::PasswordConfirmation { .. } => ReasonCode::PasswordMatch,
            CrossValidator::JerseyNumberUnique { .. } => ReasonCode::NumeroRepetido,
        }
    }

    /// Evaluates against live sibling values read through `value_of`.
    pub fn evaluate<'a>(
        &self,
        value_of: impl Fn(&str) -> Option<&'a str>,
        now: NaiveDateTime,
    ) -> CrossOutcome {
        let fired = match self {
            CrossValidator::MatchTimeNotPast { date, time } => {
                let date = value_of(date).and_then(parse_date);
                let time = value_of(time).and_then(parse_time);
                match (date, time) {
                    (Some(date), Some(time)) => date == now.date() && time <= now.time(),
                    _ => false,
                }
            }
            CrossValidator::TeamRepeat { first, second } => {
                let a = value_of(first).unwrap_or_default().trim();
                let b = value_of(second).unwrap_or_default().trim();
                a == b
            }
            CrossValidator::PasswordConfirmation { password, confirm } => {
                let password = value_of(password).unwrap_or_default();
                let confirm = value_of(confirm).unwrap_or_default();
                !password.is_empty() && !confirm.is_empty() && password != confirm
            }
            CrossValidator::JerseyNumberUnique { field, taken } => value_of(field)
                .and_then(|raw| raw.trim().parse::<u32>().ok())
                .is_some_and(|n| taken.contains(&n)),
        };
        CrossOutcome {
            target: self.target(),
            code: self.code(),
            fired,
        }
    }
}
