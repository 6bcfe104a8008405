use thiserror::Error;

pub const NOTICE_RETRY_LATER: &str = "No se pudo contactar al servidor, inténtalo más tarde.";
pub const NOTICE_UNAUTHORIZED: &str = "No autorizado o la sesión expiró, inicia sesión de nuevo.";
pub const NOTICE_NOT_FOUND: &str = "El recurso solicitado no existe.";
pub const NOTICE_BAD_REQUEST: &str = "Los datos enviados no son válidos.";
pub const NOTICE_INVALID_FORM: &str = "Error verifica tu información.";
pub const NOTICE_NOTHING_TO_SAVE: &str = "No hay cambios para guardar.";
pub const NOTICE_REGISTERED: &str = "Registro exitoso, ya puedes iniciar sesión.";
pub const NOTICE_STORE_FAILED: &str = "No se pudo guardar la sesión en este equipo.";

/// Failure of a single call against the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never reached the server or was never answered.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with something that is not the expected JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
    #[error("http {status}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },
    /// A mutating call was attempted without a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::InvalidBody(_))
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Text for the transient notice shown to the user.
    pub fn user_notice(&self) -> String {
        match self {
            ApiError::Transport(_) | ApiError::InvalidBody(_) => NOTICE_RETRY_LATER.to_string(),
            ApiError::NotSignedIn => NOTICE_UNAUTHORIZED.to_string(),
            ApiError::Rejected { status, .. } => {
                if let Some(message) = self.server_message() {
                    return message.to_string();
                }
                match status {
                    401 | 403 => NOTICE_UNAUTHORIZED.to_string(),
                    404 => NOTICE_NOT_FOUND.to_string(),
                    400 => NOTICE_BAD_REQUEST.to_string(),
                    _ => NOTICE_RETRY_LATER.to_string(),
                }
            }
        }
    }
}

/// Why a submission never left the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error("form session is closed")]
    Closed,
    #[error("a submission is already in flight")]
    InFlight,
    #[error("form has invalid fields: {}", fields.join(", "))]
    Invalid { fields: Vec<&'static str> },
    #[error("nothing to save")]
    NothingToSave,
    #[error("operation not allowed: {0}")]
    NotAllowed(String),
}

impl SubmitBlocked {
    pub fn user_notice(&self) -> String {
        match self {
            SubmitBlocked::Invalid { .. } => NOTICE_INVALID_FORM.to_string(),
            SubmitBlocked::NothingToSave => NOTICE_NOTHING_TO_SAVE.to_string(),
            SubmitBlocked::InFlight => "Guardando, espera un momento.".to_string(),
            SubmitBlocked::Closed => "El editor ya está cerrado.".to_string(),
            SubmitBlocked::NotAllowed(reason) => reason.clone(),
        }
    }
}

/// One named sub-operation that failed while the others were committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedOperation {
    pub label: String,
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitFailure {
    /// The parent update failed; no sub-operation was attempted.
    #[error("update rejected: {0}")]
    Parent(ApiError),
    #[error("{} operation(s) failed: {}", failed.len(), failed_labels(failed))]
    Partial { failed: Vec<FailedOperation> },
}

fn failed_labels(failed: &[FailedOperation]) -> String {
    failed
        .iter()
        .map(|f| f.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SubmitFailure {
    pub fn user_notice(&self) -> String {
        match self {
            SubmitFailure::Parent(err) => err.user_notice(),
            SubmitFailure::Partial { failed } => {
                format!("Algunos cambios no se guardaron: {}", failed_labels(failed))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store format: {0}")]
    Format(#[from] serde_json::Error),
}

impl StoreError {
    pub fn user_notice(&self) -> String {
        NOTICE_STORE_FAILED.to_string()
    }
}
