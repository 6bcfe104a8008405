use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide blocking client; the first caller's timeout wins.
pub fn http_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let mut headers = HeaderMap::new();
        // Tunnelled dev servers answer with an HTML interstitial without this.
        headers.insert("ngrok-skip-browser-warning", HeaderValue::from_static("1"));
        Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build http client")
    })
}
