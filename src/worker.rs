use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::api::Backend;
use crate::match_edit::{execute_match_submit, execute_transition};
use crate::state::{Command, Delta};
use crate::team_edit::execute_team_submit;

/// Runs one command to completion. `None` for `Shutdown`.
pub fn execute(backend: &dyn Backend, cmd: Command) -> Option<Delta> {
    let delta = match cmd {
        Command::RefreshTeams => Delta::Teams(backend.list_teams()),
        Command::RefreshMatches => Delta::Matches(backend.list_matches()),
        Command::CreateTeam { token, team } => {
            Delta::TeamCreated(backend.create_team(&token, &team))
        }
        Command::SubmitTeamEdit { token, plan } => {
            Delta::TeamEdited(execute_team_submit(backend, &token, &plan))
        }
        Command::SubmitMatch { token, plan } => {
            Delta::MatchSaved(execute_match_submit(backend, &token, &plan))
        }
        Command::SubmitScore {
            token,
            match_id,
            update,
        } => Delta::ScoreSaved(backend.update_score(&token, &match_id, &update)),
        Command::Transition {
            token,
            match_id,
            transition,
        } => {
            let result = execute_transition(backend, &token, &match_id, transition);
            Delta::Transitioned {
                match_id,
                transition,
                result,
            }
        }
        Command::DeleteMatch { token, match_id } => {
            let result = backend.delete_match(&token, &match_id);
            Delta::MatchDeleted { match_id, result }
        }
        Command::Favorite {
            token,
            user_id,
            kind,
            id,
            add,
        } => {
            let result = if add {
                backend.add_favorite(&token, kind, &id, &user_id)
            } else {
                backend.remove_favorite(&token, kind, &id, &user_id)
            };
            Delta::Favorite {
                kind,
                id,
                add,
                result,
            }
        }
        Command::Login(request) => Delta::LoggedIn(backend.login(&request)),
        Command::Register(request) => Delta::Registered(backend.register(&request)),
        Command::UpdateProfile { token, update } => {
            Delta::ProfileUpdated(backend.update_profile(&token, &update))
        }
        Command::DeleteAccount { token, user_id } => {
            Delta::AccountDeleted(backend.delete_account(&token, &user_id))
        }
        Command::Shutdown => return None,
    };
    Some(delta)
}

/// Owns the network on a background thread. Commands are served in order;
/// the thread exits on `Shutdown` or when either channel closes.
pub fn spawn_worker(
    backend: Arc<dyn Backend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<Command>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            debug!(command = cmd.name(), "worker command");
            let Some(delta) = execute(backend.as_ref(), cmd) else {
                break;
            };
            if tx.send(delta).is_err() {
                break;
            }
        }
        debug!("worker stopped");
    })
}
