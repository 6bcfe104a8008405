//! Team editor: field diff, roster sub-form and the two-phase submit.
//!
//! A submit is a parent `PUT` carrying only the changed fields, followed by
//! one request per pending roster operation. Roster operations fan out in
//! parallel once the parent update has succeeded and are settled together;
//! whatever succeeded stays committed even when a sibling fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::api::{ApiResult, Backend};
use crate::diff::{ChangeSet, Editable, Snapshot, text_value};
use crate::error::{ApiError, FailedOperation, SubmitBlocked, SubmitFailure};
use crate::form::FormSession;
use crate::forms::{self, player, team};
use crate::model::{NewPlayer, NewTeam, Player, Team};
use crate::validate::{Clock, SystemClock};

pub const TEMP_ID_PREFIX: &str = "temp_";

impl Editable for Team {
    fn editable_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            (team::NAME, text_value(&self.name)),
            (team::COUNTRY, text_value(&self.country_name)),
            (team::FLAG, text_value(self.flag_url.as_deref().unwrap_or_default())),
            (team::INFO, text_value(self.info.as_deref().unwrap_or_default())),
            (team::GROUP, text_value(self.group.as_deref().unwrap_or_default())),
            (team::RANKING, json!(self.fifa_ranking)),
        ]
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn team_form_values(team: &Team) -> Vec<(&'static str, String)> {
    vec![
        (team::NAME, team.name.clone()),
        (team::COUNTRY, team.country_name.clone()),
        (team::FLAG, team.flag_url.clone().unwrap_or_default()),
        (team::INFO, team.info.clone().unwrap_or_default()),
        (team::CODE, team.code.clone().unwrap_or_default()),
        (team::GROUP, team.group.clone().unwrap_or_default()),
        (
            team::RANKING,
            team.fifa_ranking.map(|r| r.to_string()).unwrap_or_default(),
        ),
    ]
}

/// The snapshot with the form's current values laid over it.
fn edited_team(snapshot: &Team, form: &FormSession) -> Team {
    let mut out = snapshot.clone();
    out.name = form.text(team::NAME);
    out.country_name = form.text(team::COUNTRY);
    out.flag_url = non_empty(form.text(team::FLAG));
    out.info = non_empty(form.text(team::INFO));
    out.group = non_empty(form.text(team::GROUP));
    out.fifa_ranking = form.int(team::RANKING).and_then(|r| u32::try_from(r).ok());
    out
}

fn new_player_from_form(form: &FormSession) -> Option<NewPlayer> {
    Some(NewPlayer {
        first_name: form.text(player::FIRST_NAME),
        last_name: form.text(player::LAST_NAME),
        birth_date: form.date(player::BIRTH_DATE)?.format("%Y-%m-%d").to_string(),
        shirt_number: u32::try_from(form.int(player::NUMBER)?).ok()?,
        position: form.text(player::POSITION),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlayer {
    pub temp_id: String,
    pub player: NewPlayer,
}

/// Roster operations queued until the next submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRoster {
    pub additions: Vec<PendingPlayer>,
    /// Persisted players taken off the roster.
    pub removals: Vec<Player>,
}

impl PendingRoster {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSubmitPlan {
    pub team_id: String,
    pub changes: ChangeSet,
    pub additions: Vec<PendingPlayer>,
    pub removals: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParentOutcome {
    /// Nothing changed on the team itself; no request was sent.
    Skipped,
    Updated(Team),
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSubmitReport {
    pub parent: ParentOutcome,
    pub additions: Vec<(String, ApiResult<Player>)>,
    pub removals: Vec<(String, ApiResult<()>)>,
}

enum RosterOp<'a> {
    Add(&'a PendingPlayer),
    Remove(&'a Player),
}

enum RosterOpResult {
    Added(String, ApiResult<Player>),
    Removed(String, ApiResult<()>),
}

/// Runs a prepared plan against the backend.
///
/// Roster calls are only issued once the parent update succeeded (or was not
/// needed).
pub fn execute_team_submit(
    backend: &dyn Backend,
    token: &str,
    plan: &TeamSubmitPlan,
) -> TeamSubmitReport {
    info!(
        team_id = %plan.team_id,
        changes = plan.changes.len(),
        additions = plan.additions.len(),
        removals = plan.removals.len(),
        "submitting team edit"
    );
    let parent = if plan.changes.is_empty() {
        ParentOutcome::Skipped
    } else {
        match backend.update_team(token, &plan.team_id, &plan.changes) {
            Ok(team) => ParentOutcome::Updated(team),
            Err(err) => {
                warn!(team_id = %plan.team_id, %err, "team update failed, roster untouched");
                return TeamSubmitReport {
                    parent: ParentOutcome::Failed(err),
                    additions: Vec::new(),
                    removals: Vec::new(),
                };
            }
        }
    };

    let ops: Vec<RosterOp<'_>> = plan
        .additions
        .iter()
        .map(RosterOp::Add)
        .chain(plan.removals.iter().map(RosterOp::Remove))
        .collect();
    let results: Vec<RosterOpResult> = ops
        .par_iter()
        .map(|op| match op {
            RosterOp::Add(pending) => RosterOpResult::Added(
                pending.temp_id.clone(),
                backend.add_player(token, &plan.team_id, &pending.player),
            ),
            RosterOp::Remove(player) => RosterOpResult::Removed(
                player.id.clone(),
                backend.remove_player(token, &plan.team_id, &player.id),
            ),
        })
        .collect();

    let mut additions = Vec::new();
    let mut removals = Vec::new();
    for result in results {
        match result {
            RosterOpResult::Added(temp_id, res) => additions.push((temp_id, res)),
            RosterOpResult::Removed(id, res) => removals.push((id, res)),
        }
    }
    TeamSubmitReport {
        parent,
        additions,
        removals,
    }
}

/// What a settled submit left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSettled {
    /// Server-side state after the submit, when anything was committed.
    pub committed: Option<Team>,
    pub outcome: Result<(), SubmitFailure>,
}

pub struct TeamEditSession {
    snapshot: Snapshot<Team>,
    /// Parent as the server returned it after an accepted update. Later
    /// diffs are taken against this so a retry never resends the same fields.
    committed_parent: Option<Snapshot<Team>>,
    form: FormSession,
    roster: Vec<Player>,
    pending: PendingRoster,
    player_form: FormSession,
    next_temp: u64,
    clock: Arc<dyn Clock>,
}

impl TeamEditSession {
    pub fn open(team: &Team) -> Self {
        Self::open_with_clock(team, Arc::new(SystemClock))
    }

    pub fn open_with_clock(team: &Team, clock: Arc<dyn Clock>) -> Self {
        let form = FormSession::open_with_clock(
            forms::team_fields(false),
            Vec::new(),
            &team_form_values(team),
            clock.clone(),
        );
        let taken = team.players.iter().map(|p| p.shirt_number).collect();
        Self {
            snapshot: Snapshot::take(team),
            committed_parent: None,
            form,
            roster: team.players.clone(),
            pending: PendingRoster::default(),
            player_form: Self::blank_player_form(taken, clock.clone()),
            next_temp: 1,
            clock,
        }
    }

    fn blank_player_form(taken: BTreeSet<u32>, clock: Arc<dyn Clock>) -> FormSession {
        FormSession::open_with_clock(forms::player_fields(), forms::player_cross(taken), &[], clock)
    }

    pub fn team_id(&self) -> &str {
        &self.snapshot.get().id
    }

    pub fn snapshot(&self) -> &Team {
        self.snapshot.get()
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn player_form(&self) -> &FormSession {
        &self.player_form
    }

    pub fn player_form_mut(&mut self) -> &mut FormSession {
        &mut self.player_form
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn pending(&self) -> &PendingRoster {
        &self.pending
    }

    pub fn is_saving(&self) -> bool {
        self.form.is_submitting()
    }

    pub fn is_open(&self) -> bool {
        self.form.is_open()
    }

    pub fn taken_numbers(&self) -> BTreeSet<u32> {
        self.roster.iter().map(|p| p.shirt_number).collect()
    }

    fn baseline(&self) -> &Snapshot<Team> {
        self.committed_parent.as_ref().unwrap_or(&self.snapshot)
    }

    /// Fields that differ from the last state the server confirmed.
    pub fn changes(&self) -> ChangeSet {
        let baseline = self.baseline();
        ChangeSet::between(baseline, &edited_team(baseline.get(), &self.form))
    }

    /// Validates the roster sub-form and queues the player for creation.
    ///
    /// The player shows up on the roster right away under a temporary id.
    pub fn propose_player(&mut self) -> Result<&Player, SubmitBlocked> {
        if self.is_saving() {
            return Err(SubmitBlocked::InFlight);
        }
        self.player_form.set_taken_numbers(self.taken_numbers());
        self.player_form.begin_submit()?;
        let Some(new_player) = new_player_from_form(&self.player_form) else {
            self.player_form.abort_submit();
            return Err(SubmitBlocked::Invalid {
                fields: self.player_form.invalid_fields(),
            });
        };
        let temp_id = format!("{TEMP_ID_PREFIX}{}", self.next_temp);
        self.next_temp += 1;
        self.roster.push(new_player.with_id(temp_id.clone()));
        self.pending.additions.push(PendingPlayer {
            temp_id,
            player: new_player,
        });
        self.player_form = Self::blank_player_form(self.taken_numbers(), self.clock.clone());
        Ok(&self.roster[self.roster.len() - 1])
    }

    /// Drops a player from the roster. A player that was only pending is
    /// simply forgotten; a persisted one is queued for removal.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        if self.is_saving() {
            return false;
        }
        let Some(idx) = self.roster.iter().position(|p| p.id == player_id) else {
            return false;
        };
        let removed = self.roster.remove(idx);
        if let Some(pos) = self
            .pending
            .additions
            .iter()
            .position(|p| p.temp_id == player_id)
        {
            self.pending.additions.remove(pos);
        } else if !self.pending.removals.iter().any(|p| p.id == removed.id) {
            self.pending.removals.push(removed);
        }
        self.player_form.set_taken_numbers(self.taken_numbers());
        true
    }

    /// Validates, diffs and moves the session into the saving state.
    pub fn prepare_submit(&mut self) -> Result<TeamSubmitPlan, SubmitBlocked> {
        self.form.begin_submit()?;
        let changes = self.changes();
        if changes.is_empty() && self.pending.is_empty() {
            self.form.abort_submit();
            return Err(SubmitBlocked::NothingToSave);
        }
        Ok(TeamSubmitPlan {
            team_id: self.team_id().to_string(),
            changes,
            additions: self.pending.additions.clone(),
            removals: self.pending.removals.clone(),
        })
    }

    /// Folds a report back into the session.
    ///
    /// Succeeded roster operations leave the pending queues and temporary ids
    /// are swapped for server ids in place, so a resubmit after a partial
    /// failure only retries what failed.
    pub fn settle(&mut self, report: TeamSubmitReport) -> TeamSettled {
        let parent_team = match report.parent {
            ParentOutcome::Failed(err) => {
                self.form.submit_failed(err.user_notice());
                return TeamSettled {
                    committed: None,
                    outcome: Err(SubmitFailure::Parent(err)),
                };
            }
            ParentOutcome::Updated(team) => {
                self.committed_parent = Some(Snapshot::take(&team));
                Some(team)
            }
            ParentOutcome::Skipped => None,
        };
        let mut committed_any = parent_team.is_some();
        let mut failed = Vec::new();

        for (temp_id, result) in report.additions {
            let Some(pos) = self
                .pending
                .additions
                .iter()
                .position(|p| p.temp_id == temp_id)
            else {
                continue;
            };
            match result {
                Ok(created) => {
                    committed_any = true;
                    self.pending.additions.remove(pos);
                    if let Some(slot) = self.roster.iter_mut().find(|p| p.id == temp_id) {
                        *slot = created;
                    }
                }
                Err(error) => {
                    let p = &self.pending.additions[pos].player;
                    failed.push(FailedOperation {
                        label: format!(
                            "alta de {} {} #{}",
                            p.first_name, p.last_name, p.shirt_number
                        ),
                        error,
                    });
                }
            }
        }

        for (player_id, result) in report.removals {
            let Some(pos) = self.pending.removals.iter().position(|p| p.id == player_id) else {
                continue;
            };
            match result {
                Ok(()) => {
                    committed_any = true;
                    self.pending.removals.remove(pos);
                }
                Err(error) => failed.push(FailedOperation {
                    label: format!("baja de {}", self.pending.removals[pos].display_name()),
                    error,
                }),
            }
        }

        let committed = committed_any.then(|| {
            let mut team = parent_team
                .unwrap_or_else(|| edited_team(self.baseline().get(), &self.form));
            team.players = self
                .roster
                .iter()
                .filter(|p| !p.id.starts_with(TEMP_ID_PREFIX))
                .chain(self.pending.removals.iter())
                .cloned()
                .collect();
            team
        });

        let outcome = if failed.is_empty() {
            self.form.submit_succeeded();
            Ok(())
        } else {
            let failure = SubmitFailure::Partial { failed };
            warn!(team_id = %self.team_id(), %failure, "team edit partially applied");
            self.form.submit_failed(failure.user_notice());
            Err(failure)
        };
        TeamSettled { committed, outcome }
    }

    /// Closes the editor. Refused while a submit is in flight.
    pub fn cancel(&mut self) -> Result<(), SubmitBlocked> {
        self.form.cancel()
    }
}

/// Team creation editor; the roster is managed after the team exists.
pub struct TeamCreateSession {
    form: FormSession,
}

impl TeamCreateSession {
    pub fn open() -> Self {
        Self::open_with_clock(Arc::new(SystemClock))
    }

    pub fn open_with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            form: FormSession::open_with_clock(forms::team_fields(true), Vec::new(), &[], clock),
        }
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormSession {
        &mut self.form
    }

    pub fn prepare_submit(&mut self) -> Result<NewTeam, SubmitBlocked> {
        self.form.begin_submit()?;
        let Some(ranking) = self.form.int(team::RANKING).and_then(|r| u32::try_from(r).ok()) else {
            self.form.abort_submit();
            return Err(SubmitBlocked::Invalid {
                fields: vec![team::RANKING],
            });
        };
        Ok(NewTeam {
            name: self.form.text(team::NAME),
            country_name: self.form.text(team::COUNTRY),
            flag_url: self.form.text(team::FLAG),
            info: self.form.text(team::INFO),
            code: self.form.text(team::CODE),
            group: self.form.text(team::GROUP),
            fifa_ranking: ranking,
            players: Vec::new(),
        })
    }

    pub fn settle(&mut self, result: ApiResult<Team>) -> ApiResult<Team> {
        match result {
            Ok(team) => {
                self.form.submit_succeeded();
                Ok(team)
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
