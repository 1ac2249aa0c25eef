//! Terminal projection of session snapshots
//!
//! Presentation only: renders what the runtime publishes and translates
//! typed input into session operations or one-shot backend calls. Errors
//! never reach this layer as exceptions; it observes snapshot flags.

use crate::api::ApiClient;
use crate::auth::TokenStore;
use crate::runtime::{SessionHandle, Snapshot};
use crate::session::Speaker;
use crossterm::style::{Color, Stylize};
use crossterm::{cursor, execute, terminal};
use std::io::{stdout, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// Where `/say` writes the synthesized audio.
const TTS_OUTPUT: &str = "pulsepath-tts.wav";

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

fn notice(text: &str) {
    println!("{}", text.green());
}

fn warn(text: &str) {
    println!("{}", text.yellow());
}

/// Redraw the whole transcript view from one snapshot.
fn redraw(snapshot: &Snapshot) -> std::io::Result<()> {
    let mut out = stdout();
    execute!(
        out,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    )?;

    if let Some(mood) = &snapshot.mood {
        writeln!(
            out,
            "{} {} {} ({:.0}%)",
            "Mood trend:".bold(),
            "  ".on(rgb(mood.color)),
            mood.label.clone().with(rgb(mood.color)),
            mood.confidence * 100.0
        )?;
    }

    for msg in &snapshot.messages {
        let chip = msg
            .annotation
            .as_ref()
            .map(|sample| {
                format!(
                    " [{} {:.0}%]",
                    sample.sentiment, sample.confidence * 100.0
                )
            })
            .unwrap_or_default();
        match msg.speaker {
            Speaker::User => {
                let marker = if msg.pending { " …" } else { "" };
                writeln!(out, "{}{}", format!("You: {}", msg.text).cyan(), marker.dim())?;
            }
            Speaker::Assistant => {
                writeln!(out, "AI: {}{}", msg.text, chip.dim())?;
            }
        }
    }

    if let Some(error) = &snapshot.status.error {
        writeln!(out, "{}", format!("! {error}").red())?;
    }
    if let Some(success) = &snapshot.status.success {
        writeln!(out, "{}", format!("* {success}").green())?;
    }
    if snapshot.status.pending {
        writeln!(out, "{}", "waiting for reply...".dim())?;
    }

    write!(out, "> ")?;
    out.flush()
}

fn print_help() {
    println!("Type a message to talk, or:");
    println!("  /login <user> <pass>   authenticate and load your history");
    println!("  /signup <user> <pass>  create an account");
    println!("  /logout                forget the stored credential");
    println!("  /clear                 delete the chat history");
    println!("  /sentiment <text>      one-shot sentiment check");
    println!("  /say <text>            synthesize speech to {TTS_OUTPUT}");
    println!("  /transcribe <file>     transcribe a WAV recording");
    println!("  /quit                  exit");
}

/// Interactive loop: stdin lines in, snapshot redraws out.
pub async fn run(
    client: Arc<ApiClient>,
    tokens: Arc<dyn TokenStore>,
    handle: SessionHandle,
    mut snapshots: watch::Receiver<Snapshot>,
) -> std::io::Result<()> {
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow().clone();
                redraw(&snapshot)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&client, &tokens, &handle, line.trim()).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Dispatch one input line. Returns false when the user quits.
async fn handle_line(
    client: &ApiClient,
    tokens: &Arc<dyn TokenStore>,
    handle: &SessionHandle,
    line: &str,
) -> bool {
    if line.is_empty() {
        return true;
    }
    if !line.starts_with('/') {
        handle.submit(line).await;
        return true;
    }

    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match command {
        "/help" => print_help(),
        "/quit" | "/exit" => return false,
        "/login" => login(client, tokens, handle, rest).await,
        "/signup" => signup(client, rest).await,
        "/logout" => {
            tokens.clear();
            notice("Logged out.");
        }
        "/clear" => handle.clear().await,
        "/sentiment" => sentiment(client, rest).await,
        "/say" => say(client, rest).await,
        "/transcribe" => transcribe(client, rest).await,
        unknown => warn(&format!("Unknown command {unknown}; try /help")),
    }
    true
}

fn credentials(args: &str) -> Option<(&str, &str)> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(username), Some(password), None) => Some((username, password)),
        _ => None,
    }
}

async fn login(
    client: &ApiClient,
    tokens: &Arc<dyn TokenStore>,
    handle: &SessionHandle,
    args: &str,
) {
    let Some((username, password)) = credentials(args) else {
        warn("usage: /login <username> <password>");
        return;
    };
    match client.login(username, password).await {
        Ok(token) => {
            tokens.set(&token);
            notice("Logged in.");
            handle.hydrate().await;
        }
        Err(err) => warn(&err.to_string()),
    }
}

async fn signup(client: &ApiClient, args: &str) {
    let Some((username, password)) = credentials(args) else {
        warn("usage: /signup <username> <password>");
        return;
    };
    match client.signup(username, password).await {
        Ok(message) => notice(&message),
        Err(err) => warn(&err.to_string()),
    }
}

async fn sentiment(client: &ApiClient, text: &str) {
    if text.is_empty() {
        warn("usage: /sentiment <text>");
        return;
    }
    match client.sentiment(text).await {
        Ok(sample) => {
            let color = rgb(sample.sentiment.color());
            println!(
                "{} {} ({:.0}%)",
                "  ".on(color),
                sample.sentiment.to_string().with(color),
                sample.confidence * 100.0
            );
        }
        Err(err) => warn(&err.to_string()),
    }
}

async fn say(client: &ApiClient, text: &str) {
    if text.is_empty() {
        warn("usage: /say <text>");
        return;
    }
    match client.tts(text).await {
        Ok(audio) => match tokio::fs::write(TTS_OUTPUT, audio).await {
            Ok(()) => notice(&format!("Wrote {TTS_OUTPUT}")),
            Err(err) => warn(&format!("Could not write {TTS_OUTPUT}: {err}")),
        },
        Err(err) => warn(&err.to_string()),
    }
}

async fn transcribe(client: &ApiClient, path: &str) {
    if path.is_empty() {
        warn("usage: /transcribe <file.wav>");
        return;
    }
    let wav = match tokio::fs::read(path).await {
        Ok(wav) => wav,
        Err(err) => {
            warn(&format!("Could not read {path}: {err}"));
            return;
        }
    };
    match client.stt(&wav).await {
        Ok(text) => notice(&format!("Transcript: {text}")),
        Err(err) => warn(&err.to_string()),
    }
}
