//! Signed-in user state as an explicit service.
//!
//! Created once at startup with [`SessionState::hydrate`], torn down with
//! [`SessionState::logout`]. Every change to the user or favorites is written
//! through to the [`SessionStore`] in the same call.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiResult, Backend};
use crate::error::{ApiError, StoreError};
use crate::model::{AuthResponse, FavoriteKind, LoginRequest, ProfileUpdate, UserProfile};
use crate::persist::{PersistedSession, SessionStore};
use crate::reconcile::FavoritesIndex;

pub const DEFAULT_ROLE: &str = "user";

const MSG_EMAIL_TAKEN: &str = "El correo ya está registrado";
const MSG_BAD_CREDENTIALS: &str = "Credenciales inválidas";
const MSG_USER_NOT_FOUND: &str = "Usuario no encontrado";

/// A session operation failed remotely, or succeeded remotely but could
/// not be written to the store. In the second case memory already holds the
/// confirmed state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    pub fn user_notice(&self) -> String {
        match self {
            SessionError::Api(err) => account_notice(err),
            SessionError::Store(err) => err.user_notice(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug)]
pub struct SessionState {
    store: SessionStore,
    current: Option<SignedIn>,
    favorites: FavoritesIndex,
}

impl SessionState {
    /// Restores whatever the store holds; a missing file means signed out.
    pub fn hydrate(store: SessionStore) -> Self {
        let (current, favorites) = match store.load() {
            Some(saved) => (
                Some(SignedIn {
                    token: saved.token,
                    user: saved.user,
                }),
                saved.favorites,
            ),
            None => (None, FavoritesIndex::default()),
        };
        Self {
            store,
            current,
            favorites,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.current.as_ref().map(|c| &c.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.token.as_str())
    }

    /// Token and user id, or `NotSignedIn`.
    pub fn credentials(&self) -> ApiResult<(String, String)> {
        self.current
            .as_ref()
            .map(|c| (c.token.clone(), c.user.id.clone()))
            .ok_or(ApiError::NotSignedIn)
    }

    pub fn favorites(&self) -> &FavoritesIndex {
        &self.favorites
    }

    /// Adopts a login response; favorites come from the profile.
    pub fn sign_in(&mut self, auth: AuthResponse) -> SessionResult<&UserProfile> {
        let Some(token) = auth.token.filter(|t| !t.is_empty()) else {
            return Err(ApiError::InvalidBody("login response without token".to_string()).into());
        };
        self.favorites = auth
            .user
            .favorites
            .as_ref()
            .map(FavoritesIndex::from_lists)
            .unwrap_or_default();
        info!(user = %auth.user.email, "signed in");
        self.current = Some(SignedIn {
            token,
            user: auth.user,
        });
        self.persist()?;
        Ok(self.user().ok_or(ApiError::NotSignedIn)?)
    }

    pub fn login(
        &mut self,
        backend: &dyn Backend,
        email: &str,
        password: &str,
    ) -> SessionResult<&UserProfile> {
        let auth = backend.login(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })?;
        self.sign_in(auth)
    }

    /// Clears memory, then storage. Memory is cleared even when the store
    /// cannot be.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        self.current = None;
        self.favorites = FavoritesIndex::default();
        self.store.clear().inspect_err(|err| {
            warn!(%err, path = %self.store.path().display(), "failed to clear session store");
        })
    }

    /// Records a server-confirmed favorite change and rewrites the store.
    pub fn apply_favorite(
        &mut self,
        kind: FavoriteKind,
        id: &str,
        added: bool,
    ) -> Result<(), StoreError> {
        self.favorites.apply_confirmed(kind, id, added);
        self.persist()
    }

    /// Adds or removes a favorite depending on current membership.
    ///
    /// The local set only changes after the server confirmed; a failed call
    /// leaves it exactly as it was.
    pub fn toggle_favorite(
        &mut self,
        backend: &dyn Backend,
        kind: FavoriteKind,
        id: &str,
    ) -> SessionResult<String> {
        let (token, user_id) = self.credentials()?;
        let add = !self.favorites.contains(kind, id);
        let message = if add {
            backend.add_favorite(&token, kind, id, &user_id)?
        } else {
            backend.remove_favorite(&token, kind, id, &user_id)?
        };
        self.apply_favorite(kind, id, add)?;
        Ok(message)
    }

    pub fn replace_user(&mut self, user: UserProfile) -> Result<(), StoreError> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        current.user = user;
        self.persist()
    }

    pub fn update_profile(
        &mut self,
        backend: &dyn Backend,
        update: &ProfileUpdate,
    ) -> SessionResult<&UserProfile> {
        let (token, _) = self.credentials()?;
        let user = backend.update_profile(&token, update)?;
        self.replace_user(user)?;
        Ok(self.user().ok_or(ApiError::NotSignedIn)?)
    }

    /// Deletes the account server-side, then signs out locally.
    pub fn delete_account(&mut self, backend: &dyn Backend) -> SessionResult<()> {
        let (token, user_id) = self.credentials()?;
        backend.delete_account(&token, &user_id)?;
        self.logout()?;
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(current) = self.current.as_ref() else {
            return Ok(());
        };
        let saved = PersistedSession::new(
            current.token.clone(),
            current.user.clone(),
            self.favorites.clone(),
        );
        self.store.save(&saved).inspect_err(|err| {
            warn!(%err, path = %self.store.path().display(), "failed to persist session");
        })
    }
}

/// Friendlier wording for the messages the user endpoints are known to send.
pub fn account_notice(err: &ApiError) -> String {
    match err.server_message() {
        Some(MSG_EMAIL_TAKEN) => {
            "El correo electronico ingresado ya está asignado a una cuenta!.".to_string()
        }
        Some(MSG_BAD_CREDENTIALS) => {
            "La contraseña o el correo son incorrectos. Intentalo de nuevo".to_string()
        }
        Some(MSG_USER_NOT_FOUND) => "Error Usuario no encontrado.".to_string(),
        _ => err.user_notice(),
    }
}
