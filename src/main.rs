use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::EnvFilter;

use wc26_admin::account::LoginForm;
use wc26_admin::api::HttpBackend;
use wc26_admin::config::AppConfig;
use wc26_admin::forms::account;
use wc26_admin::model::FavoriteKind;
use wc26_admin::notice::NoticeKind;
use wc26_admin::reconcile::{MatchFilter, TeamFilter};
use wc26_admin::session::SessionState;
use wc26_admin::state::{AppState, Command, Delta, apply_delta};
use wc26_admin::worker::spawn_worker;

const USAGE: &str = "usage: wc26_admin <command>

commands:
  teams [search] [--group X] [--favorites]
  matches [team] [--live] [--favorites]
  login <email> <password>
  logout
  whoami
  fav-team <team-id>
  fav-match <match-id>";

struct Cli {
    state: AppState,
    cmd_tx: Sender<Command>,
    rx: Receiver<Delta>,
}

impl Cli {
    /// Sends one command and folds its result in before returning.
    fn round_trip(&mut self, cmd: Command) -> Result<()> {
        self.cmd_tx.send(cmd).map_err(|_| anyhow!("worker is gone"))?;
        let delta = self.rx.recv().context("worker stopped before answering")?;
        apply_delta(&mut self.state, delta);
        Ok(())
    }

    /// Prints notices posted since `since`; true when one of them is an error.
    fn flush_notices(&self, since: Instant) -> bool {
        let mut failed = false;
        for notice in self.state.notices.history().filter(|n| n.posted_at >= since) {
            failed |= notice.kind == NoticeKind::Error;
            eprintln!("[{}] {}", notice.kind.tag(), notice.text);
        }
        failed
    }
}

fn flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn option(args: &[String], name: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == name)?;
    args.get(idx + 1).cloned()
}

/// Flags that take the next argument as their value.
const VALUE_FLAGS: [&str; 1] = ["--group"];
const SWITCHES: [&str; 2] = ["--live", "--favorites"];

/// Arguments that are not a known flag or a flag's value. Anything else
/// passes through untouched, so a password may start with `--`.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip = true;
        } else if !SWITCHES.contains(&arg.as_str()) {
            out.push(arg.as_str());
        }
    }
    out
}

fn run(cli: &mut Cli, args: &[String]) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        bail!("{USAGE}");
    };
    match command.as_str() {
        "teams" => {
            cli.round_trip(Command::RefreshTeams)?;
            cli.state.set_team_filter(TeamFilter {
                search: positional(rest).join(" "),
                group: option(rest, "--group"),
                favorites_only: flag(rest, "--favorites"),
            });
            let favorites = cli.state.session.favorites();
            for listed in cli.state.teams.view() {
                let team = &listed.entity;
                let star = if favorites.contains(FavoriteKind::Team, &team.id) { "*" } else { " " };
                println!(
                    "{star} {:<26} {:<4} grupo {:<2} ranking {:>3}  {} jugadores  [{}]",
                    team.name,
                    team.code.as_deref().unwrap_or("-"),
                    team.group.as_deref().unwrap_or("-"),
                    team.fifa_ranking.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                    team.players.len(),
                    team.id,
                );
            }
        }
        "matches" => {
            cli.round_trip(Command::RefreshMatches)?;
            cli.state.set_match_filter(MatchFilter {
                live_only: flag(rest, "--live"),
                favorites_only: flag(rest, "--favorites"),
                team_search: positional(rest).join(" "),
            });
            let favorites = cli.state.session.favorites();
            for listed in cli.state.matches.view() {
                let m = &listed.entity;
                let star = if favorites.contains(FavoriteKind::Match, &m.id) { "*" } else { " " };
                println!(
                    "{star} {} {} {}-{} {}  {:?}  {}, {}  [{}]",
                    m.kickoff,
                    m.team_a.name,
                    m.goals_a,
                    m.goals_b,
                    m.team_b.name,
                    m.status,
                    m.stadium,
                    m.city,
                    m.id,
                );
            }
        }
        "login" => {
            let words = positional(rest);
            let [email, password] = words.as_slice() else {
                bail!("usage: wc26_admin login <email> <password>");
            };
            let mut form = LoginForm::open();
            form.form_mut().set_value(account::EMAIL, *email);
            form.form_mut().set_value(account::PASSWORD, *password);
            let request = form
                .prepare_submit()
                .map_err(|blocked| anyhow!("{}: {blocked}", blocked.user_notice()))?;
            cli.round_trip(Command::Login(request))?;
        }
        "logout" => {
            cli.state
                .session
                .logout()
                .map_err(|err| anyhow!("{}: {err}", err.user_notice()))?;
            println!("sesión cerrada");
        }
        "whoami" => match cli.state.session.user() {
            Some(user) => {
                let favorites = cli.state.session.favorites();
                println!(
                    "{} {} <{}> rol={}",
                    user.first_name, user.last_name, user.email, user.role
                );
                println!("equipos favoritos: {}", favorites.teams.len());
                println!("partidos favoritos: {}", favorites.matches.len());
            }
            None => println!("sin sesión"),
        },
        "fav-team" | "fav-match" => {
            let kind = if command == "fav-team" { FavoriteKind::Team } else { FavoriteKind::Match };
            let words = positional(rest);
            let [id] = words.as_slice() else {
                bail!("usage: wc26_admin {command} <id>");
            };
            if let Some(cmd) = cli.state.request_toggle_favorite(kind, id) {
                cli.round_trip(cmd)?;
            }
        }
        other => bail!("unknown command `{other}`\n\n{USAGE}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let backend = HttpBackend::new(&config.api_base_url, config.timeout)?;
    let session = SessionState::hydrate(config.session_store());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let worker = spawn_worker(Arc::new(backend), tx, cmd_rx);

    let mut cli = Cli {
        state: AppState::new(session, config.notice_ttl),
        cmd_tx,
        rx,
    };
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let started = Instant::now();
    let result = run(&mut cli, &args);
    let failed = cli.flush_notices(started);

    let _ = cli.cmd_tx.send(Command::Shutdown);
    let _ = worker.join();
    result?;
    if failed {
        bail!("command failed");
    }
    Ok(())
}
