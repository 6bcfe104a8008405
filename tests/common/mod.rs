#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use wc26_admin::api::{ApiResult, Backend};
use wc26_admin::diff::ChangeSet;
use wc26_admin::error::ApiError;
use wc26_admin::model::{
    AuthResponse, FavoriteKind, FavoriteLists, LoginRequest, Match, MatchStatus, NewMatch,
    NewPlayer, NewTeam, Player, ProfileUpdate, RegisterRequest, ScoreUpdate, Team, TeamRef,
    UserProfile,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTeams,
    GetTeam(String),
    CreateTeam(NewTeam),
    UpdateTeam { id: String, body: Value },
    AddPlayer { team_id: String, player: NewPlayer },
    RemovePlayer { team_id: String, player_id: String },
    ListMatches,
    CreateMatch(NewMatch),
    UpdateMatch { id: String, body: Value },
    UpdateScore { id: String, score: ScoreUpdate },
    StartMatch(String),
    FinishMatch(String),
    DeleteMatch(String),
    AddFavorite { kind: FavoriteKind, id: String, user_id: String },
    RemoveFavorite { kind: FavoriteKind, id: String, user_id: String },
    Register(RegisterRequest),
    Login(LoginRequest),
    UpdateProfile(ProfileUpdate),
    DeleteAccount(String),
}

/// In-memory backend that records every call. Failures are keyed by
/// operation: `update_team`, `add_player:<shirt>`, `remove_player:<id>`,
/// `add_favorite`, `login`, ...
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    teams: Mutex<Vec<Team>>,
    matches: Mutex<Vec<Match>>,
    user: Mutex<Option<UserProfile>>,
    failures: Mutex<HashMap<String, ApiError>>,
    next_id: Mutex<u32>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(self, team: Team) -> Self {
        self.teams.lock().expect("lock").push(team);
        self
    }

    pub fn with_match(self, m: Match) -> Self {
        self.matches.lock().expect("lock").push(m);
        self
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        *self.user.lock().expect("lock") = Some(user);
        self
    }

    pub fn fail(&self, key: &str, err: ApiError) {
        self.failures.lock().expect("lock").insert(key.to_string(), err);
    }

    pub fn recover(&self, key: &str) {
        self.failures.lock().expect("lock").remove(key);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("lock").clear();
    }

    pub fn team(&self, id: &str) -> Option<Team> {
        self.teams.lock().expect("lock").iter().find(|t| t.id == id).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }

    fn check(&self, key: &str) -> ApiResult<()> {
        match self.failures.lock().expect("lock").get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().expect("lock");
        *next += 1;
        format!("{prefix}{next}")
    }

    fn not_found() -> ApiError {
        ApiError::Rejected {
            status: 404,
            message: None,
        }
    }
}

fn merge<T: serde::Serialize + serde::de::DeserializeOwned>(entity: &T, changes: &Value) -> T {
    let mut json = serde_json::to_value(entity).expect("serialize");
    if let (Some(target), Some(patch)) = (json.as_object_mut(), changes.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(json).expect("deserialize merged entity")
}

impl Backend for MockBackend {
    fn list_teams(&self) -> ApiResult<Vec<Team>> {
        self.record(Call::ListTeams);
        self.check("list_teams")?;
        Ok(self.teams.lock().expect("lock").clone())
    }

    fn get_team(&self, id: &str) -> ApiResult<Team> {
        self.record(Call::GetTeam(id.to_string()));
        self.check("get_team")?;
        self.team(id).ok_or_else(Self::not_found)
    }

    fn create_team(&self, _token: &str, team: &NewTeam) -> ApiResult<Team> {
        self.record(Call::CreateTeam(team.clone()));
        self.check("create_team")?;
        let created = Team {
            id: self.fresh_id("t"),
            name: team.name.clone(),
            country_name: team.country_name.clone(),
            flag_url: Some(team.flag_url.clone()).filter(|f| !f.is_empty()),
            info: Some(team.info.clone()),
            code: Some(team.code.clone()),
            group: Some(team.group.clone()),
            fifa_ranking: Some(team.fifa_ranking),
            created_at: None,
            players: Vec::new(),
        };
        self.teams.lock().expect("lock").push(created.clone());
        Ok(created)
    }

    fn update_team(&self, _token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Team> {
        let body = changes.to_json();
        self.record(Call::UpdateTeam {
            id: id.to_string(),
            body: body.clone(),
        });
        self.check("update_team")?;
        let mut teams = self.teams.lock().expect("lock");
        let slot = teams.iter_mut().find(|t| t.id == id).ok_or_else(Self::not_found)?;
        *slot = merge(slot, &body);
        Ok(slot.clone())
    }

    fn add_player(&self, _token: &str, team_id: &str, player: &NewPlayer) -> ApiResult<Player> {
        self.record(Call::AddPlayer {
            team_id: team_id.to_string(),
            player: player.clone(),
        });
        self.check(&format!("add_player:{}", player.shirt_number))?;
        let created = player.with_id(self.fresh_id("p"));
        let mut teams = self.teams.lock().expect("lock");
        let team = teams.iter_mut().find(|t| t.id == team_id).ok_or_else(Self::not_found)?;
        team.players.push(created.clone());
        Ok(created)
    }

    fn remove_player(&self, _token: &str, team_id: &str, player_id: &str) -> ApiResult<()> {
        self.record(Call::RemovePlayer {
            team_id: team_id.to_string(),
            player_id: player_id.to_string(),
        });
        self.check(&format!("remove_player:{player_id}"))?;
        let mut teams = self.teams.lock().expect("lock");
        let team = teams.iter_mut().find(|t| t.id == team_id).ok_or_else(Self::not_found)?;
        team.players.retain(|p| p.id != player_id);
        Ok(())
    }

    fn list_matches(&self) -> ApiResult<Vec<Match>> {
        self.record(Call::ListMatches);
        self.check("list_matches")?;
        Ok(self.matches.lock().expect("lock").clone())
    }

    fn create_match(&self, _token: &str, fixture: &NewMatch) -> ApiResult<Match> {
        self.record(Call::CreateMatch(fixture.clone()));
        self.check("create_match")?;
        let mut created = sample_match(&self.fresh_id("m"), MatchStatus::Scheduled);
        created.team_a.id = fixture.team_a_id.clone();
        created.team_b.id = fixture.team_b_id.clone();
        created.kickoff = fixture.kickoff.clone();
        created.stadium = fixture.stadium.clone();
        created.city = fixture.city.clone();
        self.matches.lock().expect("lock").push(created.clone());
        Ok(created)
    }

    fn update_match(&self, _token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Match> {
        let body = changes.to_json();
        self.record(Call::UpdateMatch {
            id: id.to_string(),
            body: body.clone(),
        });
        self.check("update_match")?;
        let mut matches = self.matches.lock().expect("lock");
        let slot = matches.iter_mut().find(|m| m.id == id).ok_or_else(Self::not_found)?;
        *slot = merge(slot, &body);
        Ok(slot.clone())
    }

    fn update_score(&self, _token: &str, id: &str, score: &ScoreUpdate) -> ApiResult<Match> {
        self.record(Call::UpdateScore {
            id: id.to_string(),
            score: score.clone(),
        });
        self.check("update_score")?;
        let mut matches = self.matches.lock().expect("lock");
        let slot = matches.iter_mut().find(|m| m.id == id).ok_or_else(Self::not_found)?;
        slot.goals_a += score.goals_a;
        slot.goals_b += score.goals_b;
        Ok(slot.clone())
    }

    fn start_match(&self, _token: &str, id: &str) -> ApiResult<Match> {
        self.record(Call::StartMatch(id.to_string()));
        self.check("start_match")?;
        let mut matches = self.matches.lock().expect("lock");
        let slot = matches.iter_mut().find(|m| m.id == id).ok_or_else(Self::not_found)?;
        slot.status = MatchStatus::InProgress;
        Ok(slot.clone())
    }

    fn finish_match(&self, _token: &str, id: &str) -> ApiResult<Match> {
        self.record(Call::FinishMatch(id.to_string()));
        self.check("finish_match")?;
        let mut matches = self.matches.lock().expect("lock");
        let slot = matches.iter_mut().find(|m| m.id == id).ok_or_else(Self::not_found)?;
        slot.status = MatchStatus::Finished;
        Ok(slot.clone())
    }

    fn delete_match(&self, _token: &str, id: &str) -> ApiResult<()> {
        self.record(Call::DeleteMatch(id.to_string()));
        self.check("delete_match")?;
        self.matches.lock().expect("lock").retain(|m| m.id != id);
        Ok(())
    }

    fn add_favorite(
        &self,
        _token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String> {
        self.record(Call::AddFavorite {
            kind,
            id: entity_id.to_string(),
            user_id: user_id.to_string(),
        });
        self.check("add_favorite")?;
        Ok("Agregado a favoritos".to_string())
    }

    fn remove_favorite(
        &self,
        _token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String> {
        self.record(Call::RemoveFavorite {
            kind,
            id: entity_id.to_string(),
            user_id: user_id.to_string(),
        });
        self.check("remove_favorite")?;
        Ok("Eliminado de favoritos".to_string())
    }

    fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.record(Call::Register(request.clone()));
        self.check("register")?;
        let mut user = sample_user();
        user.email = request.email.clone();
        user.role = request.role.clone();
        Ok(AuthResponse {
            user,
            token: None,
            message: Some("Usuario registrado".to_string()),
        })
    }

    fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.record(Call::Login(request.clone()));
        self.check("login")?;
        let user = self.user.lock().expect("lock").clone().unwrap_or_else(sample_user);
        Ok(AuthResponse {
            user,
            token: Some("tok-123".to_string()),
            message: None,
        })
    }

    fn update_profile(&self, _token: &str, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        self.record(Call::UpdateProfile(update.clone()));
        self.check("update_profile")?;
        let mut user = self.user.lock().expect("lock").clone().unwrap_or_else(sample_user);
        user.first_name = update.first_name.clone();
        user.last_name = update.last_name.clone();
        user.birth_date = update.birth_date.clone();
        user.favorites = Some(update.favorites.clone());
        Ok(user)
    }

    fn delete_account(&self, _token: &str, user_id: &str) -> ApiResult<()> {
        self.record(Call::DeleteAccount(user_id.to_string()));
        self.check("delete_account")
    }
}

pub fn sample_player(id: &str, shirt: u32) -> Player {
    Player {
        id: id.to_string(),
        first_name: "Lionel".to_string(),
        last_name: "Andrés".to_string(),
        birth_date: "1987-06-24".to_string(),
        shirt_number: shirt,
        position: "Mediocentro".to_string(),
    }
}

pub fn sample_team(id: &str) -> Team {
    Team {
        id: id.to_string(),
        name: "Argentina".to_string(),
        country_name: "República Argentina".to_string(),
        flag_url: Some("https://flagcdn.com/w320/ar.png".to_string()),
        info: Some("Campeón vigente".to_string()),
        code: Some("ARG".to_string()),
        group: Some("C".to_string()),
        fifa_ranking: Some(12),
        created_at: None,
        players: vec![sample_player("p-10", 10), sample_player("p-23", 23)],
    }
}

pub fn sample_match(id: &str, status: MatchStatus) -> Match {
    Match {
        id: id.to_string(),
        team_a: TeamRef {
            id: "t-arg".to_string(),
            name: "Argentina".to_string(),
            code: Some("ARG".to_string()),
            flag_url: None,
        },
        team_b: TeamRef {
            id: "t-mex".to_string(),
            name: "México".to_string(),
            code: Some("MEX".to_string()),
            flag_url: None,
        },
        goals_a: 0,
        goals_b: 0,
        kickoff: "2026-06-20T18:00:00".to_string(),
        stadium: "Estadio Azteca".to_string(),
        city: "Ciudad de México".to_string(),
        status,
        stage: "Fase de grupos".to_string(),
        group: "C".to_string(),
        referee: "Pierluigi Collina".to_string(),
        created_at: None,
        updated_at: None,
    }
}

pub fn sample_user() -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Pérez".to_string(),
        birth_date: "1990-05-04T00:00:00.000Z".to_string(),
        email: "ana@example.com".to_string(),
        role: "admin".to_string(),
        registered_at: "2025-01-01".to_string(),
        active: true,
        favorites: Some(FavoriteLists {
            matches: vec!["m-1".to_string()],
            teams: vec!["t-arg".to_string()],
        }),
    }
}
