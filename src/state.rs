//! Application state owned by the UI thread.
//!
//! Editors hand out [`Command`]s for the worker; results come back as
//! [`Delta`]s and are folded in by [`apply_delta`]. Local collections only
//! change once a delta carries a server-confirmed result.

use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use crate::account::{ProfileEditor, RegisterForm};
use crate::api::ApiResult;
use crate::error::{ApiError, NOTICE_REGISTERED, StoreError, SubmitBlocked};
use crate::match_edit::{
    MatchEditor, MatchSubmitPlan, MatchTransition, ScoreEditor, check_transition,
};
use crate::model::{
    AuthResponse, FavoriteKind, LoginRequest, Match, NewTeam, ProfileUpdate, RegisterRequest,
    ScoreUpdate, Team, UserProfile,
};
use crate::notice::NoticeBoard;
use crate::reconcile::{Catalog, MatchFilter, TeamFilter};
use crate::session::{SessionError, SessionState, account_notice};
use crate::team_edit::{TeamCreateSession, TeamEditSession, TeamSubmitPlan, TeamSubmitReport};

const MAX_LOGS: usize = 200;

/// Work for the network worker. Every variant carries what it needs; the
/// worker holds no state of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RefreshTeams,
    RefreshMatches,
    CreateTeam { token: String, team: NewTeam },
    SubmitTeamEdit { token: String, plan: TeamSubmitPlan },
    SubmitMatch { token: String, plan: MatchSubmitPlan },
    SubmitScore { token: String, match_id: String, update: ScoreUpdate },
    Transition { token: String, match_id: String, transition: MatchTransition },
    DeleteMatch { token: String, match_id: String },
    Favorite { token: String, user_id: String, kind: FavoriteKind, id: String, add: bool },
    Login(LoginRequest),
    Register(RegisterRequest),
    UpdateProfile { token: String, update: ProfileUpdate },
    DeleteAccount { token: String, user_id: String },
    Shutdown,
}

impl Command {
    /// Variant name for logs; payloads carry tokens and passwords.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RefreshTeams => "refresh_teams",
            Command::RefreshMatches => "refresh_matches",
            Command::CreateTeam { .. } => "create_team",
            Command::SubmitTeamEdit { .. } => "submit_team_edit",
            Command::SubmitMatch { .. } => "submit_match",
            Command::SubmitScore { .. } => "submit_score",
            Command::Transition { .. } => "transition",
            Command::DeleteMatch { .. } => "delete_match",
            Command::Favorite { .. } => "favorite",
            Command::Login(_) => "login",
            Command::Register(_) => "register",
            Command::UpdateProfile { .. } => "update_profile",
            Command::DeleteAccount { .. } => "delete_account",
            Command::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Teams(ApiResult<Vec<Team>>),
    Matches(ApiResult<Vec<Match>>),
    TeamCreated(ApiResult<Team>),
    TeamEdited(TeamSubmitReport),
    MatchSaved(ApiResult<Match>),
    ScoreSaved(ApiResult<Match>),
    Transitioned { match_id: String, transition: MatchTransition, result: ApiResult<Match> },
    MatchDeleted { match_id: String, result: ApiResult<()> },
    Favorite { kind: FavoriteKind, id: String, add: bool, result: ApiResult<String> },
    LoggedIn(ApiResult<AuthResponse>),
    Registered(ApiResult<AuthResponse>),
    ProfileUpdated(ApiResult<UserProfile>),
    AccountDeleted(ApiResult<()>),
}

pub struct AppState {
    pub session: SessionState,
    pub teams: Catalog<Team>,
    pub matches: Catalog<Match>,
    pub team_create: Option<TeamCreateSession>,
    pub team_edit: Option<TeamEditSession>,
    pub match_edit: Option<MatchEditor>,
    pub score_edit: Option<ScoreEditor>,
    pub register: Option<RegisterForm>,
    pub profile_edit: Option<ProfileEditor>,
    pub notices: NoticeBoard,
    pub logs: VecDeque<String>,
    favorites_in_flight: BTreeSet<(FavoriteKind, String)>,
    /// Matches with a start, finish or delete awaiting its result.
    matches_in_flight: BTreeSet<String>,
}

impl AppState {
    pub fn new(session: SessionState, notice_ttl: Duration) -> Self {
        Self {
            session,
            teams: Catalog::default(),
            matches: Catalog::default(),
            team_create: None,
            team_edit: None,
            match_edit: None,
            score_edit: None,
            register: None,
            profile_edit: None,
            notices: NoticeBoard::new(notice_ttl),
            logs: VecDeque::new(),
            favorites_in_flight: BTreeSet::new(),
            matches_in_flight: BTreeSet::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn token(&mut self) -> Option<String> {
        match self.session.token() {
            Some(token) => Some(token.to_string()),
            None => {
                self.notices.error(ApiError::NotSignedIn.user_notice());
                None
            }
        }
    }

    fn blocked(&mut self, reason: SubmitBlocked) -> Option<Command> {
        self.push_log(format!("[INFO] submit blocked: {reason}"));
        self.notices.error(reason.user_notice());
        None
    }

    fn refilter_all(&mut self) {
        let favorites = self.session.favorites().clone();
        self.teams.refilter(&favorites);
        self.matches.refilter(&favorites);
    }

    pub fn set_team_filter(&mut self, filter: TeamFilter) {
        self.teams.set_filter(filter, self.session.favorites());
    }

    pub fn set_match_filter(&mut self, filter: MatchFilter) {
        self.matches.set_filter(filter, self.session.favorites());
    }

    /// Opens the editor for a listed team. Refused while another team edit
    /// is saving.
    pub fn open_team_edit(&mut self, team_id: &str) -> bool {
        if self.team_edit.as_ref().is_some_and(TeamEditSession::is_saving) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return false;
        }
        let Some(listed) = self.teams.get(team_id) else {
            return false;
        };
        self.team_edit = Some(TeamEditSession::open(&listed.entity));
        true
    }

    pub fn open_team_create(&mut self) {
        if self.team_create.as_ref().is_some_and(|c| c.form().is_submitting()) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return;
        }
        self.team_create = Some(TeamCreateSession::open());
    }

    pub fn open_match_create(&mut self) {
        if self.match_edit.as_ref().is_some_and(MatchEditor::is_saving) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return;
        }
        self.match_edit = Some(MatchEditor::open_create());
    }

    pub fn open_match_edit(&mut self, match_id: &str) -> bool {
        if self.match_edit.as_ref().is_some_and(MatchEditor::is_saving) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return false;
        }
        let Some(listed) = self.matches.get(match_id) else {
            return false;
        };
        self.match_edit = Some(MatchEditor::open_edit(&listed.entity));
        true
    }

    pub fn open_score_edit(&mut self, match_id: &str) -> bool {
        let Some(listed) = self.matches.get(match_id) else {
            return false;
        };
        match ScoreEditor::open(&listed.entity) {
            Ok(editor) => {
                self.score_edit = Some(editor);
                true
            }
            Err(reason) => {
                self.notices.error(reason.user_notice());
                false
            }
        }
    }

    pub fn open_register(&mut self) {
        if self.register.as_ref().is_some_and(|r| r.form().is_submitting()) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return;
        }
        self.register = Some(RegisterForm::open());
    }

    /// Opens the profile editor seeded from the signed-in user.
    pub fn open_profile_edit(&mut self) -> bool {
        if self.profile_edit.as_ref().is_some_and(|p| p.form().is_submitting()) {
            self.notices.error(SubmitBlocked::InFlight.user_notice());
            return false;
        }
        let Some(user) = self.session.user() else {
            self.notices.error(ApiError::NotSignedIn.user_notice());
            return false;
        };
        self.profile_edit = Some(ProfileEditor::open(user));
        true
    }

    pub fn request_team_create(&mut self) -> Option<Command> {
        let token = self.token()?;
        let editor = self.team_create.as_mut()?;
        match editor.prepare_submit() {
            Ok(team) => Some(Command::CreateTeam { token, team }),
            Err(reason) => self.blocked(reason),
        }
    }

    pub fn request_team_submit(&mut self) -> Option<Command> {
        let token = self.token()?;
        let editor = self.team_edit.as_mut()?;
        match editor.prepare_submit() {
            Ok(plan) => Some(Command::SubmitTeamEdit { token, plan }),
            Err(reason) => self.blocked(reason),
        }
    }

    pub fn request_match_submit(&mut self) -> Option<Command> {
        let token = self.token()?;
        let editor = self.match_edit.as_mut()?;
        match editor.prepare_submit() {
            Ok(plan) => Some(Command::SubmitMatch { token, plan }),
            Err(reason) => self.blocked(reason),
        }
    }

    pub fn request_score_submit(&mut self) -> Option<Command> {
        let token = self.token()?;
        let editor = self.score_edit.as_mut()?;
        let match_id = editor.match_id().to_string();
        match editor.prepare_submit() {
            Ok(update) => Some(Command::SubmitScore {
                token,
                match_id,
                update,
            }),
            Err(reason) => self.blocked(reason),
        }
    }

    /// Marks the match busy; `None` when another change to it is pending.
    fn claim_match(&mut self, match_id: &str) -> Option<()> {
        if self.matches_in_flight.insert(match_id.to_string()) {
            Some(())
        } else {
            self.blocked(SubmitBlocked::InFlight);
            None
        }
    }

    pub fn request_transition(
        &mut self,
        match_id: &str,
        transition: MatchTransition,
    ) -> Option<Command> {
        let token = self.token()?;
        let listed = self.matches.get(match_id)?;
        if let Err(reason) = check_transition(&listed.entity, transition) {
            return self.blocked(reason);
        }
        self.claim_match(match_id)?;
        Some(Command::Transition {
            token,
            match_id: match_id.to_string(),
            transition,
        })
    }

    pub fn request_delete_match(&mut self, match_id: &str) -> Option<Command> {
        let token = self.token()?;
        self.matches.get(match_id)?;
        self.claim_match(match_id)?;
        Some(Command::DeleteMatch {
            token,
            match_id: match_id.to_string(),
        })
    }

    pub fn match_in_flight(&self, match_id: &str) -> bool {
        self.matches_in_flight.contains(match_id)
    }

    /// One toggle per entity at a time; the set flips only when the result
    /// arrives.
    pub fn request_toggle_favorite(&mut self, kind: FavoriteKind, id: &str) -> Option<Command> {
        let (token, user_id) = match self.session.credentials() {
            Ok(creds) => creds,
            Err(err) => {
                self.notices.error(err.user_notice());
                return None;
            }
        };
        if !self.favorites_in_flight.insert((kind, id.to_string())) {
            return self.blocked(SubmitBlocked::InFlight);
        }
        let add = !self.session.favorites().contains(kind, id);
        Some(Command::Favorite {
            token,
            user_id,
            kind,
            id: id.to_string(),
            add,
        })
    }

    pub fn request_register(&mut self) -> Option<Command> {
        let form = self.register.as_mut()?;
        match form.prepare_submit() {
            Ok(request) => Some(Command::Register(request)),
            Err(reason) => self.blocked(reason),
        }
    }

    /// The whole profile is sent, so current favorites ride along.
    pub fn request_update_profile(&mut self) -> Option<Command> {
        let token = self.token()?;
        let favorites = self.session.favorites().to_lists();
        let editor = self.profile_edit.as_mut()?;
        match editor.prepare_submit(favorites) {
            Ok(update) => Some(Command::UpdateProfile { token, update }),
            Err(reason) => self.blocked(reason),
        }
    }

    pub fn request_delete_account(&mut self) -> Option<Command> {
        match self.session.credentials() {
            Ok((token, user_id)) => Some(Command::DeleteAccount { token, user_id }),
            Err(err) => {
                self.notices.error(err.user_notice());
                None
            }
        }
    }

    pub fn favorite_in_flight(&self, kind: FavoriteKind, id: &str) -> bool {
        self.favorites_in_flight.contains(&(kind, id.to_string()))
    }
}

fn close_if_done<T>(slot: &mut Option<T>, is_open: impl Fn(&T) -> bool) {
    if slot.as_ref().is_some_and(|s| !is_open(s)) {
        *slot = None;
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Teams(Ok(teams)) => {
            state.push_log(format!("[INFO] {} teams loaded", teams.len()));
            let favorites = state.session.favorites().clone();
            state.teams.load(teams, &favorites);
        }
        Delta::Matches(Ok(matches)) => {
            state.push_log(format!("[INFO] {} matches loaded", matches.len()));
            let favorites = state.session.favorites().clone();
            state.matches.load(matches, &favorites);
        }
        Delta::Teams(Err(err)) | Delta::Matches(Err(err)) => {
            state.push_log(format!("[WARN] list fetch failed: {err}"));
            state.notices.error(err.user_notice());
        }
        Delta::TeamCreated(result) => {
            let Some(editor) = state.team_create.as_mut() else {
                return;
            };
            match editor.settle(result) {
                Ok(team) => {
                    let favorites = state.session.favorites().clone();
                    state.teams.insert(team, &favorites);
                    state.notices.success("Equipo creado.");
                    state.team_create = None;
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::TeamEdited(report) => {
            let Some(editor) = state.team_edit.as_mut() else {
                return;
            };
            let settled = editor.settle(report);
            if let Some(team) = settled.committed {
                let favorites = state.session.favorites().clone();
                state.teams.apply_update(team, &favorites);
            }
            match settled.outcome {
                Ok(()) => {
                    state.notices.success("Equipo actualizado.");
                    close_if_done(&mut state.team_edit, TeamEditSession::is_open);
                }
                Err(failure) => {
                    state.push_log(format!("[WARN] team edit: {failure}"));
                    state.notices.error(failure.user_notice());
                }
            }
        }
        Delta::MatchSaved(result) => {
            let Some(editor) = state.match_edit.as_mut() else {
                return;
            };
            match editor.settle(result) {
                Ok(saved) => {
                    let favorites = state.session.favorites().clone();
                    state.matches.insert(saved, &favorites);
                    state.notices.success("Partido guardado.");
                    state.match_edit = None;
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::ScoreSaved(result) => {
            let Some(editor) = state.score_edit.as_mut() else {
                return;
            };
            match editor.settle(result) {
                Ok(saved) => {
                    let favorites = state.session.favorites().clone();
                    state.matches.apply_update(saved, &favorites);
                    state.notices.success("Marcador actualizado.");
                    state.score_edit = None;
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::Transitioned {
            match_id,
            transition,
            result,
        } => {
            state.matches_in_flight.remove(&match_id);
            match result {
                Ok(updated) => {
                    let favorites = state.session.favorites().clone();
                    state.matches.apply_update(updated, &favorites);
                    state.notices.success(match transition {
                        MatchTransition::Start => "Partido iniciado.",
                        MatchTransition::Finish => "Partido finalizado.",
                    });
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::MatchDeleted { match_id, result } => {
            state.matches_in_flight.remove(&match_id);
            match result {
                Ok(()) => {
                    let favorites = state.session.favorites().clone();
                    state.matches.remove(&match_id, &favorites);
                    state.notices.success("Partido eliminado.");
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::Favorite {
            kind,
            id,
            add,
            result,
        } => {
            state.favorites_in_flight.remove(&(kind, id.clone()));
            match result {
                Ok(message) => {
                    let stored = state.session.apply_favorite(kind, &id, add);
                    state.refilter_all();
                    match stored {
                        Ok(()) if !message.is_empty() => state.notices.success(message),
                        Ok(()) => {}
                        Err(err) => store_failed(state, err),
                    }
                }
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::LoggedIn(result) => {
            let outcome = result.map_err(SessionError::from).and_then(|auth| {
                let user = state.session.sign_in(auth)?;
                Ok(user.first_name.clone())
            });
            state.refilter_all();
            match outcome {
                Ok(first_name) => state.notices.success(format!("Bienvenido, {first_name}")),
                Err(err) => state.notices.error(err.user_notice()),
            }
        }
        Delta::Registered(result) => {
            let Some(form) = state.register.as_mut() else {
                return;
            };
            match form.settle(result) {
                Ok(auth) => {
                    let text = auth.message.unwrap_or_else(|| NOTICE_REGISTERED.to_string());
                    state.notices.success(text);
                    state.register = None;
                }
                Err(err) => state.notices.error(account_notice(&err)),
            }
        }
        Delta::ProfileUpdated(result) => {
            let Some(editor) = state.profile_edit.as_mut() else {
                return;
            };
            match editor.settle(result) {
                Ok(user) => {
                    state.profile_edit = None;
                    match state.session.replace_user(user) {
                        Ok(()) => state.notices.success("Perfil actualizado."),
                        Err(err) => store_failed(state, err),
                    }
                }
                Err(err) => state.notices.error(account_notice(&err)),
            }
        }
        Delta::AccountDeleted(result) => match result {
            Ok(()) => {
                let cleared = state.session.logout();
                state.refilter_all();
                state.profile_edit = None;
                match cleared {
                    Ok(()) => state.notices.info("Cuenta eliminada."),
                    Err(err) => store_failed(state, err),
                }
            }
            Err(err) => state.notices.error(account_notice(&err)),
        },
    }
}

/// The server already confirmed; memory stays, the user hears about the store.
fn store_failed(state: &mut AppState, err: StoreError) {
    state.push_log(format!("[WARN] session store: {err}"));
    state.notices.error(err.user_notice());
}
