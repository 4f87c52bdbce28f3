//! Raw TCP line-protocol adapter
//!
//! A line-oriented handshake in the style of content-adaptation protocols:
//! the server greets, the client issues commands, prompt bodies are
//! dot-terminated with SMTP-style dot-stuffing. Decision semantics are
//! identical to the HTTP adapter — both go through [`AppState::decide`].
//!
//! ```text
//! S: GATE/1.0 READY
//! C: OPTIONS
//! S: 200 METHODS CHECK QUIT
//! C: CHECK alice
//! S: 100 SEND-PROMPT
//! C: I want to kill the process.
//! C: .
//! S: 200 VERDICT block
//! S: REASON matched banned keyword: kill
//! S: PROMPT I want to kill the process.
//! S: .
//! C: QUIT
//! S: 221 BYE
//! ```

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Greeting sent on connect
pub const GREETING: &str = "GATE/1.0 READY";

/// Body terminator, a dot on its own line
pub const BODY_TERMINATOR: &str = ".";

/// Longest accepted line, bytes
const MAX_LINE_BYTES: usize = 64 * 1024;

/// A parsed client command
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Options,
    Check { user_id: String },
    Quit,
    Unknown,
}

/// Parse one command line. Command words are case-insensitive.
fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    match parts.next().map(|w| w.to_ascii_uppercase()) {
        Some(ref w) if w == "OPTIONS" => Command::Options,
        Some(ref w) if w == "CHECK" => match parts.next() {
            Some(user_id) if parts.next().is_none() => Command::Check {
                user_id: user_id.to_string(),
            },
            _ => Command::Unknown,
        },
        Some(ref w) if w == "QUIT" => Command::Quit,
        _ => Command::Unknown,
    }
}

/// Undo dot-stuffing: a body line beginning with ".." carried a literal "."
fn unstuff(line: &str) -> &str {
    if line.starts_with("..") {
        &line[1..]
    } else {
        line
    }
}

/// Accept connections until the listener is dropped or the task is aborted
pub async fn serve(listener: TcpListener, state: AppState) {
    info!(addr = ?listener.local_addr().ok(), "TCP adapter listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "TCP connection accepted");
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        debug!(%peer, "TCP connection ended: {}", e);
                    }
                });
            }
            Err(e) => {
                warn!("TCP accept failed: {}", e);
            }
        }
    }
}

/// Drive one client connection through the handshake
async fn handle_connection(stream: TcpStream, state: AppState) -> Result<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    framed.send(GREETING).await?;

    while let Some(line) = framed.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                // Oversized or malformed line; tell the client and close.
                let _ = framed.send("500 LINE-TOO-LONG").await;
                return Err(e.into());
            }
        };

        match parse_command(&line) {
            Command::Options => {
                framed.send("200 METHODS CHECK QUIT").await?;
            }
            Command::Check { user_id } => {
                framed.send("100 SEND-PROMPT").await?;

                let Some(prompt) = read_body(&mut framed).await? else {
                    // Client went away mid-body; nothing to answer.
                    return Ok(());
                };

                let verdict = state.decide("tcp", &user_id, &prompt).await;
                send_verdict(&mut framed, &verdict).await?;
            }
            Command::Quit => {
                framed.send("221 BYE").await?;
                return Ok(());
            }
            Command::Unknown => {
                framed.send("500 UNKNOWN-COMMAND").await?;
            }
        }
    }

    Ok(())
}

/// Read a dot-terminated body. `None` means the peer disconnected first.
async fn read_body(framed: &mut Framed<TcpStream, LinesCodec>) -> Result<Option<String>> {
    let mut lines: Vec<String> = Vec::new();

    while let Some(line) = framed.next().await {
        let line = line?;
        if line == BODY_TERMINATOR {
            return Ok(Some(lines.join("\n")));
        }
        lines.push(unstuff(&line).to_string());
    }

    Ok(None)
}

/// Serialize a verdict onto the wire
async fn send_verdict(
    framed: &mut Framed<TcpStream, LinesCodec>,
    verdict: &promptgate_core::Verdict,
) -> Result<()> {
    framed
        .send(format!("200 VERDICT {}", verdict.action))
        .await?;

    let reason = if verdict.reason.is_empty() {
        "-"
    } else {
        verdict.reason.as_str()
    };
    framed.send(format!("REASON {}", reason)).await?;

    for line in verdict.prompt_out.lines() {
        framed.send(format!("PROMPT {}", line)).await?;
    }
    framed.send(BODY_TERMINATOR).await?;

    Ok(())
}
