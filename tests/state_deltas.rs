mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use common::{Call, MockBackend, sample_match, sample_team};
use wc26_admin::error::{
    ApiError, NOTICE_NOTHING_TO_SAVE, NOTICE_RETRY_LATER, NOTICE_STORE_FAILED,
    NOTICE_UNAUTHORIZED,
};
use wc26_admin::forms::{account, player, team};
use wc26_admin::match_edit::MatchTransition;
use wc26_admin::model::{FavoriteKind, LoginRequest, MatchStatus};
use wc26_admin::notice::NoticeKind;
use wc26_admin::persist::SessionStore;
use wc26_admin::session::SessionState;
use wc26_admin::state::{AppState, Command, Delta, apply_delta};
use wc26_admin::worker::{execute, spawn_worker};

fn app(dir: &tempfile::TempDir) -> AppState {
    AppState::new(
        SessionState::hydrate(SessionStore::in_dir(dir.path())),
        Duration::from_secs(3),
    )
}

fn run(state: &mut AppState, backend: &MockBackend, cmd: Command) {
    let delta = execute(backend, cmd).expect("not a shutdown");
    apply_delta(state, delta);
}

fn login(state: &mut AppState, backend: &MockBackend) {
    run(
        state,
        backend,
        Command::Login(LoginRequest {
            email: "ana@example.com".to_string(),
            password: "Abcdef1!".to_string(),
        }),
    );
    assert!(state.session.is_signed_in());
}

fn last_notice(state: &AppState) -> (NoticeKind, String) {
    let notice = state.notices.latest().expect("a notice was posted");
    (notice.kind, notice.text.clone())
}

#[test]
fn refresh_failure_becomes_a_retry_notice() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new();
    backend.fail("list_teams", ApiError::InvalidBody("<html>".to_string()));
    let mut state = app(&dir);
    run(&mut state, &backend, Command::RefreshTeams);
    assert_eq!(last_notice(&state), (NoticeKind::Error, NOTICE_RETRY_LATER.to_string()));
    assert!(state.teams.items().is_empty());
}

#[test]
fn mutations_need_a_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new().with_team(sample_team("t-arg"));
    let mut state = app(&dir);
    run(&mut state, &backend, Command::RefreshTeams);
    assert!(state.open_team_edit("t-arg"));
    assert!(state.request_team_submit().is_none());
    assert_eq!(last_notice(&state), (NoticeKind::Error, NOTICE_UNAUTHORIZED.to_string()));
    assert!(state.request_toggle_favorite(FavoriteKind::Team, "t-arg").is_none());
}

#[test]
fn team_edit_round_trip_updates_the_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new().with_team(sample_team("t-arg"));
    let mut state = app(&dir);
    login(&mut state, &backend);
    run(&mut state, &backend, Command::RefreshTeams);
    let image = state.teams.get("t-arg").expect("listed").image.clone();

    assert!(state.open_team_edit("t-arg"));
    let editor = state.team_edit.as_mut().expect("editor open");
    editor.form_mut().set_value(team::RANKING, "15");
    let form = editor.player_form_mut();
    form.set_value(player::FIRST_NAME, "Julián");
    form.set_value(player::LAST_NAME, "Álvarez");
    form.set_value(player::BIRTH_DATE, "2000-01-31");
    form.set_value(player::NUMBER, "9");
    form.set_value(player::POSITION, "Mediocentro");
    editor.propose_player().expect("valid player");

    let cmd = state.request_team_submit().expect("command issued");
    assert!(state.request_team_submit().is_none());
    run(&mut state, &backend, cmd);

    assert!(state.team_edit.is_none());
    let listed = state.teams.get("t-arg").expect("still listed");
    assert_eq!(listed.image, image);
    assert_eq!(listed.entity.fifa_ranking, Some(15));
    assert_eq!(listed.entity.players.len(), 3);
    assert_eq!(last_notice(&state).0, NoticeKind::Success);
}

#[test]
fn favorite_toggle_is_applied_only_on_confirmation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new();
    let mut state = app(&dir);
    login(&mut state, &backend);

    let cmd = state
        .request_toggle_favorite(FavoriteKind::Team, "t-mex")
        .expect("command issued");
    assert!(state.favorite_in_flight(FavoriteKind::Team, "t-mex"));
    assert!(!state.session.favorites().contains(FavoriteKind::Team, "t-mex"));
    assert!(state.request_toggle_favorite(FavoriteKind::Team, "t-mex").is_none());

    run(&mut state, &backend, cmd);
    assert!(state.session.favorites().contains(FavoriteKind::Team, "t-mex"));
    assert!(!state.favorite_in_flight(FavoriteKind::Team, "t-mex"));

    backend.fail("remove_favorite", ApiError::Transport("offline".to_string()));
    let cmd = state
        .request_toggle_favorite(FavoriteKind::Team, "t-mex")
        .expect("command issued");
    run(&mut state, &backend, cmd);
    assert!(state.session.favorites().contains(FavoriteKind::Team, "t-mex"));
    assert_eq!(last_notice(&state).0, NoticeKind::Error);
}

#[test]
fn transitions_and_deletion_reconcile_the_match_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new()
        .with_match(sample_match("m-1", MatchStatus::Scheduled))
        .with_match(sample_match("m-2", MatchStatus::Finished));
    let mut state = app(&dir);
    login(&mut state, &backend);
    run(&mut state, &backend, Command::RefreshMatches);

    assert!(state.request_transition("m-2", MatchTransition::Start).is_none());
    let cmd = state
        .request_transition("m-1", MatchTransition::Start)
        .expect("scheduled match can start");
    run(&mut state, &backend, cmd);
    assert_eq!(
        state.matches.get("m-1").expect("listed").entity.status,
        MatchStatus::InProgress
    );

    assert!(state.open_score_edit("m-1"));
    let cmd = state.request_delete_match("m-2").expect("command issued");
    run(&mut state, &backend, cmd);
    assert!(state.matches.get("m-2").is_none());
    assert!(backend.calls().contains(&Call::DeleteMatch("m-2".to_string())));
}

#[test]
fn one_pending_change_per_match() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new()
        .with_match(sample_match("m-1", MatchStatus::Scheduled))
        .with_match(sample_match("m-2", MatchStatus::Scheduled));
    let mut state = app(&dir);
    login(&mut state, &backend);
    run(&mut state, &backend, Command::RefreshMatches);

    let start = state
        .request_transition("m-1", MatchTransition::Start)
        .expect("first start issued");
    assert!(state.match_in_flight("m-1"));
    assert!(state.request_transition("m-1", MatchTransition::Start).is_none());
    assert!(state.request_delete_match("m-1").is_none());
    assert!(state.request_delete_match("m-2").is_some());

    run(&mut state, &backend, start);
    assert!(!state.match_in_flight("m-1"));
    assert!(state.request_transition("m-1", MatchTransition::Finish).is_some());
}

#[test]
fn failed_delete_releases_the_match() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new().with_match(sample_match("m-1", MatchStatus::Finished));
    backend.fail("delete_match", ApiError::Transport("offline".to_string()));
    let mut state = app(&dir);
    login(&mut state, &backend);
    run(&mut state, &backend, Command::RefreshMatches);

    let cmd = state.request_delete_match("m-1").expect("command issued");
    run(&mut state, &backend, cmd);
    assert_eq!(last_notice(&state), (NoticeKind::Error, NOTICE_RETRY_LATER.to_string()));
    assert!(state.matches.get("m-1").is_some());
    assert!(!state.match_in_flight("m-1"));
    assert!(state.request_delete_match("m-1").is_some());
}

#[test]
fn confirmed_favorite_with_unwritable_store_posts_a_notice() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new();
    let mut state = app(&dir);
    login(&mut state, &backend);
    let path = SessionStore::in_dir(dir.path()).path().to_path_buf();
    std::fs::remove_file(&path).expect("remove session file");
    std::fs::create_dir(&path).expect("block the path with a directory");

    let cmd = state
        .request_toggle_favorite(FavoriteKind::Team, "t-mex")
        .expect("command issued");
    run(&mut state, &backend, cmd);
    assert!(state.session.favorites().contains(FavoriteKind::Team, "t-mex"));
    assert_eq!(last_notice(&state), (NoticeKind::Error, NOTICE_STORE_FAILED.to_string()));
}

#[test]
fn registration_goes_through_the_form() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new();
    let mut state = app(&dir);
    state.open_register();
    assert!(state.request_register().is_none());
    assert_eq!(last_notice(&state).0, NoticeKind::Error);
    assert!(backend.calls().is_empty());

    let form = state.register.as_mut().expect("form open").form_mut();
    form.set_value(account::FIRST_NAME, "Luis");
    form.set_value(account::LAST_NAME, "Gómez");
    form.set_value(account::BIRTH_DATE, "1992-11-20");
    form.set_value(account::EMAIL, "luis@example.com");
    form.set_value(account::PASSWORD, "Secreta1!");
    form.set_value(account::CONFIRM, "Secreta1!");
    let cmd = state.request_register().expect("valid form");
    assert!(state.request_register().is_none());
    run(&mut state, &backend, cmd);

    assert!(state.register.is_none());
    assert_eq!(last_notice(&state), (NoticeKind::Success, "Usuario registrado".to_string()));
    assert!(matches!(
        &backend.calls()[0],
        Call::Register(req) if req.role == "user" && req.birth_date == "1992-11-20T00:00:00.000Z"
    ));
}

#[test]
fn profile_edit_sends_the_form_with_current_favorites() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = MockBackend::new();
    let mut state = app(&dir);
    assert!(!state.open_profile_edit());
    login(&mut state, &backend);
    assert!(state.open_profile_edit());

    assert!(state.request_update_profile().is_none());
    assert_eq!(last_notice(&state), (NoticeKind::Error, NOTICE_NOTHING_TO_SAVE.to_string()));

    let editor = state.profile_edit.as_mut().expect("editor open");
    editor.form_mut().set_value(account::FIRST_NAME, "Ana María");
    let cmd = state.request_update_profile().expect("command issued");
    run(&mut state, &backend, cmd);

    assert!(state.profile_edit.is_none());
    assert_eq!(state.session.user().map(|u| u.first_name.as_str()), Some("Ana María"));
    assert_eq!(last_notice(&state).0, NoticeKind::Success);
    let Some(Call::UpdateProfile(update)) = backend.calls().last().cloned() else {
        panic!("expected a profile update call");
    };
    assert!(update.favorites.teams.contains(&"t-arg".to_string()));
    assert_eq!(update.email, "ana@example.com");
}

#[test]
fn worker_thread_serves_commands_until_shutdown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = Arc::new(MockBackend::new().with_team(sample_team("t-arg")));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_worker(backend.clone(), tx, cmd_rx);

    let mut state = app(&dir);
    cmd_tx.send(Command::RefreshTeams).expect("send");
    let delta = rx.recv().expect("delta");
    assert!(matches!(&delta, Delta::Teams(Ok(teams)) if teams.len() == 1));
    apply_delta(&mut state, delta);
    assert_eq!(state.teams.view().len(), 1);

    cmd_tx.send(Command::Shutdown).expect("send");
    handle.join().expect("worker exits cleanly");
    assert_eq!(backend.calls(), vec![Call::ListTeams]);
}

#[test]
fn server_messages_win_over_status_notices() {
    let with_message = ApiError::Rejected {
        status: 400,
        message: Some("El equipo ya existe".to_string()),
    };
    assert_eq!(with_message.user_notice(), "El equipo ya existe");

    let unauthorized = ApiError::Rejected {
        status: 401,
        message: None,
    };
    assert_eq!(unauthorized.user_notice(), NOTICE_UNAUTHORIZED);
    assert_eq!(
        ApiError::Transport("timeout".to_string()).user_notice(),
        NOTICE_RETRY_LATER
    );
}
