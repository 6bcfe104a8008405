use std::sync::Arc;

use serde_json::{Value, json};

use crate::api::{ApiResult, Backend};
use crate::diff::{ChangeSet, Editable, Snapshot, text_value};
use crate::error::SubmitBlocked;
use crate::form::FormSession;
use crate::forms::{self, fixture, score};
use crate::model::{Match, MatchStatus, NewMatch, ScoreUpdate};
use crate::validate::{Clock, SystemClock, parse_date, parse_time};

/// Splits a kickoff (`YYYY-MM-DDTHH:MM[:SS][Z]`) into the form's date and time.
pub fn split_kickoff(kickoff: &str) -> (String, String) {
    let date = parse_date(kickoff)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let time = kickoff
        .split_once('T')
        .and_then(|(_, t)| t.get(..5))
        .and_then(parse_time)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();
    (date, time)
}

pub fn join_kickoff(date: &str, time: &str) -> String {
    format!("{}T{}:00", date.trim(), time.trim())
}

fn normalized_kickoff(kickoff: &str) -> String {
    let (date, time) = split_kickoff(kickoff);
    join_kickoff(&date, &time)
}

impl Editable for Match {
    fn editable_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("equipoAId", text_value(&self.team_a.id)),
            ("equipoBId", text_value(&self.team_b.id)),
            (fixture::DATE, json!(normalized_kickoff(&self.kickoff))),
            (fixture::STADIUM, text_value(&self.stadium)),
            (fixture::CITY, text_value(&self.city)),
            (fixture::STAGE, text_value(&self.stage)),
            (fixture::GROUP, text_value(&self.group)),
            (fixture::REFEREE, text_value(&self.referee)),
        ]
    }
}

fn match_form_values(m: &Match) -> Vec<(&'static str, String)> {
    let (date, time) = split_kickoff(&m.kickoff);
    vec![
        (fixture::TEAM_A, m.team_a.id.clone()),
        (fixture::TEAM_B, m.team_b.id.clone()),
        (fixture::DATE, date),
        (fixture::TIME, time),
        (fixture::STADIUM, m.stadium.clone()),
        (fixture::CITY, m.city.clone()),
        (fixture::STAGE, m.stage.clone()),
        (fixture::GROUP, m.group.clone()),
        (fixture::REFEREE, m.referee.clone()),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchSubmitPlan {
    Create(NewMatch),
    Update { id: String, changes: ChangeSet },
}

pub fn execute_match_submit(
    backend: &dyn Backend,
    token: &str,
    plan: &MatchSubmitPlan,
) -> ApiResult<Match> {
    match plan {
        MatchSubmitPlan::Create(fixture) => backend.create_match(token, fixture),
        MatchSubmitPlan::Update { id, changes } => backend.update_match(token, id, changes),
    }
}

/// Create/edit editor for a fixture.
pub struct MatchEditor {
    snapshot: Option<Snapshot<Match>>,
    form: FormSession,
}

impl MatchEditor {
    pub fn open_create() -> Self {
        Self::create_with_clock(Arc::new(SystemClock))
    }

    pub fn create_with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshot: None,
            form: FormSession::open_with_clock(
                forms::match_fields(),
                forms::match_cross(),
                &[],
                clock,
            ),
        }
    }

    pub fn open_edit(m: &Match) -> Self {
        Self::edit_with_clock(m, Arc::new(SystemClock))
    }

    pub fn edit_with_clock(m: &Match, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshot: Some(Snapshot::take(m)),
            form: FormSession::open_with_clock(
                forms::match_fields(),
                forms::match_cross(),
                &match_form_values(m),
                clock,
            ),
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.get().id.as_str())
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn is_saving(&self) -> bool {
        self.form.is_submitting()
    }

    fn edited(&self, snapshot: &Match) -> Match {
        let mut out = snapshot.clone();
        out.team_a.id = self.form.text(fixture::TEAM_A);
        out.team_b.id = self.form.text(fixture::TEAM_B);
        out.kickoff = join_kickoff(self.form.value(fixture::DATE), self.form.value(fixture::TIME));
        out.stadium = self.form.text(fixture::STADIUM);
        out.city = self.form.text(fixture::CITY);
        out.stage = self.form.text(fixture::STAGE);
        out.group = self.form.text(fixture::GROUP);
        out.referee = self.form.text(fixture::REFEREE);
        out
    }

    pub fn changes(&self) -> ChangeSet {
        match &self.snapshot {
            Some(snapshot) => ChangeSet::between(snapshot, &self.edited(snapshot.get())),
            None => ChangeSet::default(),
        }
    }

    pub fn prepare_submit(&mut self) -> Result<MatchSubmitPlan, SubmitBlocked> {
        self.form.begin_submit()?;
        let Some(snapshot) = &self.snapshot else {
            return Ok(MatchSubmitPlan::Create(NewMatch {
                team_a_id: self.form.text(fixture::TEAM_A),
                team_b_id: self.form.text(fixture::TEAM_B),
                kickoff: join_kickoff(
                    self.form.value(fixture::DATE),
                    self.form.value(fixture::TIME),
                ),
                stadium: self.form.text(fixture::STADIUM),
                city: self.form.text(fixture::CITY),
                stage: self.form.text(fixture::STAGE),
                group: self.form.text(fixture::GROUP),
                referee: self.form.text(fixture::REFEREE),
            }));
        };
        let id = snapshot.get().id.clone();
        let changes = self.changes();
        if changes.is_empty() {
            self.form.abort_submit();
            return Err(SubmitBlocked::NothingToSave);
        }
        Ok(MatchSubmitPlan::Update { id, changes })
    }

    pub fn settle(&mut self, result: ApiResult<Match>) -> ApiResult<Match> {
        match result {
            Ok(m) => {
                self.form.submit_succeeded();
                Ok(m)
            }
            Err(err) => {
                self.form.submit_failed(err.user_notice());
                Err(err)
            }
        }
    }

    pub fn cancel(&mut self) -> Result<(), SubmitBlocked> {
        self.form.cancel()
    }
}

/// Live score editor: goal deltas on top of the current score plus a note.
pub struct ScoreEditor {
    match_id: String,
    form: FormSession,
}

impl ScoreEditor {
    pub fn open(m: &Match) -> Result<Self, SubmitBlocked> {
        Self::open_with_clock(m, Arc::new(SystemClock))
    }

    pub fn open_with_clock(m: &Match, clock: Arc<dyn Clock>) -> Result<Self, SubmitBlocked> {
        if m.status != MatchStatus::InProgress {
            return Err(SubmitBlocked::NotAllowed(
                "Solo se puede actualizar el marcador de un partido en curso.".to_string(),
            ));
        }
        Ok(Self {
            match_id: m.id.clone(),
            form: FormSession::open_with_clock(forms::score_fields(), Vec::new(), &[], clock),
        })
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn prepare_submit(&mut self) -> Result<ScoreUpdate, SubmitBlocked> {
        self.form.begin_submit()?;
        let goals = |name| {
            self.form
                .int(name)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or_default()
        };
        let update = ScoreUpdate {
            goals_a: goals(score::GOALS_A),
            goals_b: goals(score::GOALS_B),
            note: self.form.text(score::NOTE),
        };
        if update.goals_a == 0 && update.goals_b == 0 && update.note.is_empty() {
            self.form.abort_submit();
            return Err(SubmitBlocked::NothingToSave);
        }
        Ok(update)
    }

    pub fn settle(&mut self, result: ApiResult<Match>) -> ApiResult<Match> {
        match result {
            Ok(m) => {
                self.form.submit_succeeded();
                Ok(m)
            }
            Err(err) => {
                self.form.submit_failed(err.user_notice());
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTransition {
    Start,
    Finish,
}

/// Status rules checked before any request: start from scheduled, finish
/// from in progress.
pub fn check_transition(m: &Match, transition: MatchTransition) -> Result<(), SubmitBlocked> {
    let allowed = match transition {
        MatchTransition::Start => m.status == MatchStatus::Scheduled,
        MatchTransition::Finish => m.status == MatchStatus::InProgress,
    };
    if allowed {
        Ok(())
    } else {
        Err(SubmitBlocked::NotAllowed(match transition {
            MatchTransition::Start => "El partido ya comenzó o terminó.".to_string(),
            MatchTransition::Finish => "El partido no está en curso.".to_string(),
        }))
    }
}

pub fn execute_transition(
    backend: &dyn Backend,
    token: &str,
    match_id: &str,
    transition: MatchTransition,
) -> ApiResult<Match> {
    match transition {
        MatchTransition::Start => backend.start_match(token, match_id),
        MatchTransition::Finish => backend.finish_match(token, match_id),
    }
}
