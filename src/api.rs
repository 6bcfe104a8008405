use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::diff::ChangeSet;
use crate::error::ApiError;
use crate::http_client::http_client;
use crate::model::{
    AuthResponse, FavoriteKind, LoginRequest, Match, MessageResponse, NewMatch, NewPlayer,
    NewTeam, Player, ProfileUpdate, RegisterRequest, ScoreUpdate, Team, UserProfile,
};

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote tournament API. Mutating calls take the bearer token as an opaque
/// string.
pub trait Backend: Send + Sync {
    fn list_teams(&self) -> ApiResult<Vec<Team>>;
    fn get_team(&self, id: &str) -> ApiResult<Team>;
    fn create_team(&self, token: &str, team: &NewTeam) -> ApiResult<Team>;
    fn update_team(&self, token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Team>;
    fn add_player(&self, token: &str, team_id: &str, player: &NewPlayer) -> ApiResult<Player>;
    fn remove_player(&self, token: &str, team_id: &str, player_id: &str) -> ApiResult<()>;

    fn list_matches(&self) -> ApiResult<Vec<Match>>;
    fn create_match(&self, token: &str, fixture: &NewMatch) -> ApiResult<Match>;
    fn update_match(&self, token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Match>;
    fn update_score(&self, token: &str, id: &str, score: &ScoreUpdate) -> ApiResult<Match>;
    fn start_match(&self, token: &str, id: &str) -> ApiResult<Match>;
    fn finish_match(&self, token: &str, id: &str) -> ApiResult<Match>;
    fn delete_match(&self, token: &str, id: &str) -> ApiResult<()>;

    fn add_favorite(
        &self,
        token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String>;
    fn remove_favorite(
        &self,
        token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String>;

    fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse>;
    fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;
    fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ApiResult<UserProfile>;
    fn delete_account(&self, token: &str, user_id: &str) -> ApiResult<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Passes a 2xx body through; anything else becomes `Rejected`, carrying
/// the server's `message` when the body has one.
pub fn check_status(status: u16, body: String) -> ApiResult<String> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message);
    Err(ApiError::Rejected { status, message })
}

/// Parses a success body. Tunnel interstitials and other HTML land here as
/// `InvalidBody`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str::<T>(body).map_err(|err| {
        let snippet: String = body.chars().take(120).collect();
        warn!(%err, %snippet, "response is not the expected json");
        ApiError::InvalidBody(err.to_string())
    })
}

pub struct HttpBackend {
    base_url: String,
    client: &'static Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        decode_body(&self.execute(req)?)
    }

    fn execute(&self, req: RequestBuilder) -> ApiResult<String> {
        let resp = req
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let body = resp
            .text()
            .map_err(|err| ApiError::Transport(format!("failed reading body: {err}")))?;
        debug!(%url, status, "api response");
        check_status(status, body)
    }

    fn favorite_path(kind: FavoriteKind, entity_id: &str, user_id: &str) -> String {
        format!("Favoritos/{}/{entity_id}/{user_id}", kind.path_segment())
    }

    fn message(&self, req: RequestBuilder) -> ApiResult<String> {
        self.fetch::<MessageResponse>(req).map(|resp| resp.message)
    }
}

impl Backend for HttpBackend {
    fn list_teams(&self) -> ApiResult<Vec<Team>> {
        self.fetch(self.request(Method::GET, "Equipo", None))
    }

    fn get_team(&self, id: &str) -> ApiResult<Team> {
        self.fetch(self.request(Method::GET, &format!("Equipo/{id}"), None))
    }

    fn create_team(&self, token: &str, team: &NewTeam) -> ApiResult<Team> {
        self.fetch(self.request(Method::POST, "Equipo", Some(token)).json(team))
    }

    fn update_team(&self, token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Team> {
        let req = self.request(Method::PUT, &format!("Equipo/{id}"), Some(token));
        self.fetch(req.json(&changes.to_json()))
    }

    fn add_player(&self, token: &str, team_id: &str, player: &NewPlayer) -> ApiResult<Player> {
        let req = self.request(Method::POST, &format!("Equipo/{team_id}/jugadores"), Some(token));
        self.fetch(req.json(player))
    }

    fn remove_player(&self, token: &str, team_id: &str, player_id: &str) -> ApiResult<()> {
        let path = format!("Equipo/{team_id}/jugadores/{player_id}");
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .map(|_| ())
    }

    fn list_matches(&self) -> ApiResult<Vec<Match>> {
        self.fetch(self.request(Method::GET, "Partido", None))
    }

    fn create_match(&self, token: &str, fixture: &NewMatch) -> ApiResult<Match> {
        self.fetch(self.request(Method::POST, "Partido", Some(token)).json(fixture))
    }

    fn update_match(&self, token: &str, id: &str, changes: &ChangeSet) -> ApiResult<Match> {
        let req = self.request(Method::PUT, &format!("Partido/{id}"), Some(token));
        self.fetch(req.json(&changes.to_json()))
    }

    fn update_score(&self, token: &str, id: &str, score: &ScoreUpdate) -> ApiResult<Match> {
        let req = self.request(Method::PUT, &format!("Partido/{id}/marcador"), Some(token));
        self.fetch(req.json(score))
    }

    fn start_match(&self, token: &str, id: &str) -> ApiResult<Match> {
        self.fetch(self.request(Method::PUT, &format!("Partido/{id}/iniciar"), Some(token)))
    }

    fn finish_match(&self, token: &str, id: &str) -> ApiResult<Match> {
        self.fetch(self.request(Method::PUT, &format!("Partido/{id}/finalizar"), Some(token)))
    }

    fn delete_match(&self, token: &str, id: &str) -> ApiResult<()> {
        self.execute(self.request(Method::DELETE, &format!("Partido/{id}"), Some(token)))
            .map(|_| ())
    }

    fn add_favorite(
        &self,
        token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String> {
        let path = Self::favorite_path(kind, entity_id, user_id);
        self.message(self.request(Method::POST, &path, Some(token)).json(&serde_json::json!({})))
    }

    fn remove_favorite(
        &self,
        token: &str,
        kind: FavoriteKind,
        entity_id: &str,
        user_id: &str,
    ) -> ApiResult<String> {
        let path = Self::favorite_path(kind, entity_id, user_id);
        self.message(self.request(Method::DELETE, &path, Some(token)))
    }

    fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.fetch(self.request(Method::POST, "Usuarios", None).json(request))
    }

    fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.fetch(self.request(Method::POST, "Usuarios/login", None).json(request))
    }

    fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        self.fetch(self.request(Method::PUT, "Usuarios", Some(token)).json(update))
    }

    fn delete_account(&self, token: &str, user_id: &str) -> ApiResult<()> {
        self.execute(self.request(Method::DELETE, &format!("Usuarios/{user_id}"), Some(token)))
            .map(|_| ())
    }
}
