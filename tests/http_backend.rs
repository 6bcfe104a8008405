use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wc26_admin::api::{Backend, HttpBackend};
use wc26_admin::error::{ApiError, NOTICE_UNAUTHORIZED};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Answers exactly one request with a canned response and hands back the
/// request head, lowercased.
fn serve_once(status: &str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    let status = status.to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read request") == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        head.to_ascii_lowercase()
    });
    (format!("http://{addr}/api"), handle)
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).expect("client builds")
}

#[test]
fn lists_teams_from_the_wire() {
    let (url, server) = serve_once("200 OK", read_fixture("teams.json"));
    let teams = backend(&url).list_teams().expect("teams parse");
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].code.as_deref(), Some("ARG"));

    let head = server.join().expect("server thread");
    assert!(head.starts_with("get /api/equipo http/1.1"));
    assert!(head.contains("ngrok-skip-browser-warning: 1"));
}

#[test]
fn html_on_success_is_an_invalid_body() {
    let html = "<!DOCTYPE html><p>tunnel warning</p>".to_string();
    let (url, server) = serve_once("200 OK", html);
    let err = backend(&url).list_matches().expect_err("not json");
    assert!(matches!(err, ApiError::InvalidBody(_)));
    server.join().expect("server thread");
}

#[test]
fn rejection_carries_the_server_message_and_token() {
    let body = r#"{"message":"No se puede eliminar un partido en curso"}"#.to_string();
    let (url, server) = serve_once("400 Bad Request", body);
    let err = backend(&url).delete_match("tok-9", "m-9").expect_err("rejected");
    assert_eq!(
        err,
        ApiError::Rejected {
            status: 400,
            message: Some("No se puede eliminar un partido en curso".to_string()),
        }
    );
    assert_eq!(err.user_notice(), "No se puede eliminar un partido en curso");

    let head = server.join().expect("server thread");
    assert!(head.starts_with("delete /api/partido/m-9 http/1.1"));
    assert!(head.contains("authorization: bearer tok-9"));
}

#[test]
fn bare_unauthorized_maps_to_the_session_notice() {
    let (url, server) = serve_once("401 Unauthorized", String::new());
    let err = backend(&url).remove_player("tok", "t-arg", "p-10").expect_err("rejected");
    assert_eq!(
        err,
        ApiError::Rejected {
            status: 401,
            message: None,
        }
    );
    assert_eq!(err.user_notice(), NOTICE_UNAUTHORIZED);
    server.join().expect("server thread");
}

#[test]
fn unreachable_server_is_a_transport_failure() {
    let port = {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind local port");
        listener.local_addr().expect("local addr").port()
    };
    let err = backend(&format!("http://127.0.0.1:{port}/api"))
        .list_teams()
        .expect_err("nothing listening");
    assert!(matches!(err, ApiError::Transport(_)));
}
