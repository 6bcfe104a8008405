use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::cross_field::{CrossOutcome, CrossValidator};
use crate::error::SubmitBlocked;
use crate::validate::{
    Clock, FieldValidator, ReasonCode, Reasons, SystemClock, ValidationResult, parse_date,
    parse_time, run_validators,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub validators: Vec<FieldValidator>,
}

impl FieldSpec {
    pub fn new(name: &'static str, validators: Vec<FieldValidator>) -> Self {
        Self {
            name,
            default: "",
            validators,
        }
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }
}

/// One form slot: raw input plus the bookkeeping the editor renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    raw: String,
    initial: String,
    touched: bool,
    dirty: bool,
    own: Reasons,
    cross: Reasons,
}

impl FieldValue {
    fn new(initial: String) -> Self {
        Self {
            raw: initial.clone(),
            initial,
            touched: false,
            dirty: false,
            own: Reasons::new(),
            cross: Reasons::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reasons(&self) -> Reasons {
        self.own.union(&self.cross).copied().collect()
    }

    pub fn validity(&self) -> ValidationResult {
        let reasons = self.reasons();
        if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(reasons)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.own.is_empty() && self.cross.is_empty()
    }

    /// Reasons worth rendering: only once the user has touched the field.
    pub fn visible_reasons(&self) -> Reasons {
        if self.touched {
            self.reasons()
        } else {
            Reasons::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Pristine,
    Dirty,
    Submitting,
    Closed,
}

#[derive(Clone)]
pub struct FormSession {
    specs: Vec<FieldSpec>,
    values: Vec<FieldValue>,
    cross: Vec<CrossValidator>,
    phase: FormPhase,
    last_error: Option<String>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("values", &self.values)
            .field("phase", &self.phase)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl FormSession {
    /// Opens with every field at its `FieldSpec` default.
    pub fn open_create(specs: Vec<FieldSpec>, cross: Vec<CrossValidator>) -> Self {
        Self::open_with_clock(specs, cross, &[], Arc::new(SystemClock))
    }

    /// Opens from an entity's current values; missing names fall back to defaults.
    pub fn open_edit(
        specs: Vec<FieldSpec>,
        cross: Vec<CrossValidator>,
        values: &[(&str, String)],
    ) -> Self {
        Self::open_with_clock(specs, cross, values, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        specs: Vec<FieldSpec>,
        cross: Vec<CrossValidator>,
        values: &[(&str, String)],
        clock: Arc<dyn Clock>,
    ) -> Self {
        let field_values = specs
            .iter()
            .map(|spec| {
                let initial = values
                    .iter()
                    .find(|(name, _)| *name == spec.name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| spec.default.to_string());
                FieldValue::new(initial)
            })
            .collect();
        let mut session = Self {
            specs,
            values: field_values,
            cross,
            phase: FormPhase::Pristine,
            last_error: None,
            clock,
        };
        session.revalidate_all();
        session
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != FormPhase::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.index_of(name).map(|idx| &self.values[idx])
    }

    pub fn value(&self, name: &str) -> &str {
        self.field(name).map(FieldValue::raw).unwrap_or_default()
    }

    pub fn text(&self, name: &str) -> String {
        self.value(name).trim().to_string()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).trim().parse().ok()
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        parse_date(self.value(name))
    }

    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        parse_time(self.value(name))
    }

    pub fn reasons(&self, name: &str) -> Reasons {
        self.field(name).map(FieldValue::reasons).unwrap_or_default()
    }

    pub fn has_reason(&self, name: &str, code: ReasonCode) -> bool {
        self.reasons(name).contains(&code)
    }

    pub fn is_valid(&self) -> bool {
        self.values.iter().all(FieldValue::is_valid)
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        self.specs
            .iter()
            .zip(&self.values)
            .filter(|(_, value)| !value.is_valid())
            .map(|(spec, _)| spec.name)
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.values.iter().any(FieldValue::is_dirty)
    }

    /// Applies one user edit and re-runs that field's rules and every cross rule.
    ///
    /// Edits are ignored while submitting or after close. Returns whether the
    /// value was applied.
    pub fn set_value(&mut self, name: &str, raw: impl Into<String>) -> bool {
        if matches!(self.phase, FormPhase::Submitting | FormPhase::Closed) {
            return false;
        }
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        let raw = raw.into();
        let today = self.clock.today();
        let value = &mut self.values[idx];
        value.dirty = raw != value.initial;
        value.raw = raw;
        value.own = run_validators(&self.specs[idx].validators, &value.raw, today).reasons();
        self.phase = FormPhase::Dirty;
        self.run_cross();
        true
    }

    pub fn touch(&mut self, name: &str) {
        if let Some(idx) = self.index_of(name) {
            self.values[idx].touched = true;
        }
    }

    pub fn mark_all_touched(&mut self) {
        self.values.iter_mut().for_each(|v| v.touched = true);
    }

    /// Back to the opening values, untouched.
    pub fn reset(&mut self) {
        if self.phase == FormPhase::Submitting {
            return;
        }
        for value in &mut self.values {
            *value = FieldValue::new(value.initial.clone());
        }
        if self.phase != FormPhase::Closed {
            self.phase = FormPhase::Pristine;
        }
        self.last_error = None;
        self.revalidate_all();
    }

    /// Swaps the taken-number set of a jersey rule and re-evaluates.
    pub fn set_taken_numbers(&mut self, numbers: BTreeSet<u32>) {
        for rule in &mut self.cross {
            if let CrossValidator::JerseyNumberUnique { taken, .. } = rule {
                *taken = numbers.clone();
            }
        }
        self.run_cross();
    }

    /// Moves to `Submitting` when the form is valid.
    ///
    /// An invalid form never reaches the transport; every field is marked
    /// touched so latent errors become visible.
    pub fn begin_submit(&mut self) -> Result<(), SubmitBlocked> {
        match self.phase {
            FormPhase::Closed => return Err(SubmitBlocked::Closed),
            FormPhase::Submitting => return Err(SubmitBlocked::InFlight),
            FormPhase::Pristine | FormPhase::Dirty => {}
        }
        self.revalidate_all();
        if !self.is_valid() {
            self.mark_all_touched();
            return Err(SubmitBlocked::Invalid {
                fields: self.invalid_fields(),
            });
        }
        self.phase = FormPhase::Submitting;
        self.last_error = None;
        Ok(())
    }

    /// Undoes `begin_submit` when the caller decides not to send anything.
    pub fn abort_submit(&mut self) {
        if self.phase == FormPhase::Submitting {
            self.phase = if self.is_dirty() {
                FormPhase::Dirty
            } else {
                FormPhase::Pristine
            };
        }
    }

    pub fn submit_succeeded(&mut self) {
        self.phase = FormPhase::Closed;
        self.last_error = None;
    }

    /// Back to an editable state with the server reason kept for display.
    pub fn submit_failed(&mut self, reason: impl Into<String>) {
        if self.phase == FormPhase::Closed {
            return;
        }
        self.phase = FormPhase::Dirty;
        self.last_error = Some(reason.into());
    }

    /// Discards the session. Refused while a submission is in flight.
    pub fn cancel(&mut self) -> Result<(), SubmitBlocked> {
        if self.phase == FormPhase::Submitting {
            return Err(SubmitBlocked::InFlight);
        }
        self.phase = FormPhase::Closed;
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.name == name)
    }

    fn revalidate_all(&mut self) {
        let today = self.clock.today();
        for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
            value.own = run_validators(&spec.validators, &value.raw, today).reasons();
        }
        self.run_cross();
    }

    fn run_cross(&mut self) {
        let now = self.clock.now();
        let outcomes: Vec<CrossOutcome> = self
            .cross
            .iter()
            .map(|rule| {
                rule.evaluate(
                    |name| {
                        self.specs
                            .iter()
                            .position(|spec| spec.name == name)
                            .map(|idx| self.values[idx].raw.as_str())
                    },
                    now,
                )
            })
            .collect();
        for outcome in outcomes {
            let Some(idx) = self.index_of(outcome.target) else {
                continue;
            };
            let cross = &mut self.values[idx].cross;
            if outcome.fired {
                cross.insert(outcome.code);
            } else {
                cross.remove(&outcome.code);
            }
        }
    }
}
