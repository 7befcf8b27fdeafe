//! Line-oriented binary transport.
//!
//! One command per line: `OPEN <user> <password>`, `CLOSE <session-id>`,
//! `PING`. Replies are `OK [<session-id>]`, `PONG` or `ERR <code> <message>`.

use log::{debug, trace, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use super::error::FrontendError;
use super::session::SessionManager;

pub async fn serve(
    listener: TcpListener,
    sessions: Arc<SessionManager>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    trace!("Binary connection from {peer}");
                    tokio::spawn(handle_connection(
                        stream,
                        Arc::clone(&sessions),
                        shutdown.clone(),
                    ));
                }
                Err(e) => warn!("Binary accept failed: {e}"),
            },
            _ = shutdown.changed() => break,
        }
    }
    debug!("Binary transport stopped accepting connections");
}

async fn handle_connection(
    stream: TcpStream,
    sessions: Arc<SessionManager>,
    mut shutdown: watch::Receiver<bool>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown.changed() => return,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                debug!("Binary connection read failed: {e}");
                return;
            }
        };

        let mut reply = process_command(&line, &sessions);
        reply.push('\n');
        if let Err(e) = writer.write_all(reply.as_bytes()).await {
            debug!("Binary connection write failed: {e}");
            return;
        }
    }
}

/// Execute one command line and produce the reply line (without newline).
pub fn process_command(line: &str, sessions: &SessionManager) -> String {
    let mut parts = line.split_whitespace();
    let result = match parts.next().map(str::to_ascii_uppercase).as_deref() {
        Some("PING") => return "PONG".to_string(),
        Some("OPEN") => {
            let user = parts.next().unwrap_or("");
            let password = parts.next().unwrap_or("");
            sessions.open(user, password).map(|id| format!("OK {id}"))
        }
        Some("CLOSE") => match parts.next() {
            Some(id) => sessions.close(id).map(|_| "OK".to_string()),
            None => Err(FrontendError::Protocol {
                reason: "CLOSE requires a session id".to_string(),
            }),
        },
        Some(other) => Err(FrontendError::Protocol {
            reason: format!("unknown command '{other}'"),
        }),
        None => Err(FrontendError::Protocol {
            reason: "empty command".to_string(),
        }),
    };

    result.unwrap_or_else(|e| format!("ERR {} {e}", e.code()))
}
