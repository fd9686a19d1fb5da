//! Shared fixtures for unit tests: a bot and a session over an in-memory pipe.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kneiss_proto::{Capability, Transport};
use tokio::io::{duplex, AsyncReadExt, DuplexStream};

use crate::bot::{Bot, Identity};
use crate::handlers::Registry;
use crate::network::{Session, SessionConfig};

pub fn test_bot() -> Arc<Bot> {
    let commands = HashMap::from([
        ("!discord".to_string(), "https://discord.gg/kneiss".to_string()),
        ("uptime".to_string(), "forever".to_string()),
    ]);
    Arc::new(Bot::new(
        Identity {
            username: "kneissbot".into(),
            token: "secret".into(),
        },
        Capability::ALL.to_vec(),
        commands,
        Duration::from_secs(5),
    ))
}

/// Session with the default handlers; the second value is the server side.
pub fn start_session() -> (Session, DuplexStream) {
    start_session_with(Arc::new(Registry::with_defaults()), test_bot())
}

pub fn start_session_with(registry: Arc<Registry>, bot: Arc<Bot>) -> (Session, DuplexStream) {
    let (client, server) = duplex(16 * 1024);
    let session = Session::start(Transport::stream(client), SessionConfig::default(), registry, bot);
    (session, server)
}

/// Read exactly `n` lines written by the session, without their terminators.
pub async fn read_lines(server: &mut DuplexStream, n: usize) -> Vec<String> {
    let read = async {
        let mut lines = Vec::with_capacity(n);
        let mut line = Vec::new();
        while lines.len() < n {
            let byte = server.read_u8().await.expect("session stopped writing");
            if byte == b'\n' {
                let text = String::from_utf8(std::mem::take(&mut line)).expect("utf-8 line");
                lines.push(text.trim_end_matches('\r').to_string());
            } else {
                line.push(byte);
            }
        }
        lines
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("timed out waiting for session output")
}
