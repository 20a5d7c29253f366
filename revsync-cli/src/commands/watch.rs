//! Interactive conversation view.
//!
//! Stdin carries both the realtime stream and the user's input, one item per
//! line:
//!
//! * a JSON object is a realtime frame (`{"type":"Message",...}`)
//! * `:send`, `:older`, `:cancel`, `:reconnect`, `:quit`
//! * `:reply ID`, `:mention ID`, `:unreply ID`, `:edit ID`
//! * `:attach PATH`, `:unattach INDEX`, `:insert TEXT`
//! * anything else replaces the composed text

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use revsync::{
    Command, ConversationSnapshot, Directory, MessageId, RealtimeHub, User, UserId,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::build_authed_client;
use crate::handlers::channel::{open, read_attachment};
use crate::output::{print_snapshot, OutputFormat};

/// One parsed line of input.
#[derive(Debug)]
pub enum Input {
    Frame(String),
    Command(Command),
    Attach(PathBuf),
    Reconnect,
    Quit,
}

fn require_arg<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str> {
    match arg.map(str::trim) {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => anyhow::bail!(":{} needs an argument", name),
    }
}

/// Parse a line of input. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Result<Option<Input>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with('{') {
        return Ok(Some(Input::Frame(trimmed.to_string())));
    }
    let Some(directive) = trimmed.strip_prefix(':') else {
        return Ok(Some(Input::Command(Command::SetContent(line.to_string()))));
    };

    let (name, arg) = match directive.split_once(' ') {
        Some((name, arg)) => (name, Some(arg)),
        None => (directive, None),
    };
    let id = |arg: Option<&str>| require_arg(name, arg).map(MessageId::new);

    let input = match name {
        "send" => Input::Command(Command::Send),
        "older" => Input::Command(Command::FetchOlder),
        "cancel" => Input::Command(Command::CancelEdit),
        "reconnect" => Input::Reconnect,
        "quit" | "q" => Input::Quit,
        "reply" => Input::Command(Command::ReplyTo(id(arg)?)),
        "mention" => Input::Command(Command::ToggleMention(id(arg)?)),
        "unreply" => Input::Command(Command::RemoveReply(id(arg)?)),
        "edit" => Input::Command(Command::Edit(id(arg)?)),
        "attach" => Input::Attach(PathBuf::from(require_arg(name, arg)?)),
        "unattach" => {
            let index = require_arg(name, arg)?
                .parse()
                .context("Attachment index must be a number")?;
            Input::Command(Command::RemoveAttachment(index))
        }
        "insert" => Input::Command(Command::Insert(arg.unwrap_or_default().to_string())),
        other => anyhow::bail!("Unknown command :{}", other),
    };
    Ok(Some(input))
}

async fn known_users(directory: &Directory, snapshot: &ConversationSnapshot) -> Vec<User> {
    let ids: BTreeSet<&UserId> = snapshot
        .messages
        .iter()
        .map(|m| &m.author)
        .chain(snapshot.typing.iter())
        .collect();

    let mut users = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = directory.user(id).await {
            users.push(user);
        }
    }
    users
}

pub async fn run(
    channel: &str,
    server: Option<&str>,
    tail: usize,
    format: OutputFormat,
) -> Result<()> {
    let client = build_authed_client()?;
    let directory = Directory::in_memory();
    let ctl = open(&client, channel, server, directory.clone()).await?;
    tracing::info!(channel, messages = ctl.store().len(), "Conversation opened");

    let mut snapshots = ctl.subscribe();
    let hub = RealtimeHub::default();
    let (tx, rx) = mpsc::channel(32);
    let conversation = tokio::spawn(ctl.run(hub.subscribe(), rx));

    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let users = known_users(&directory, &snapshot).await;
            print_snapshot(&snapshot, &users, tail, format);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let command = match parse_input(&line) {
                    Ok(None) => continue,
                    Ok(Some(Input::Frame(text))) => {
                        if !hub.dispatch_raw(&text) {
                            tracing::debug!("Ignored frame: {}", text);
                        }
                        continue;
                    }
                    Ok(Some(Input::Reconnect)) => {
                        hub.reconnected();
                        continue;
                    }
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(Input::Command(command))) => command,
                    Ok(Some(Input::Attach(path))) => match read_attachment(&path) {
                        Ok(attachment) => Command::QueueAttachment(attachment),
                        Err(e) => {
                            eprintln!("{}", format!("{:#}", e).red());
                            continue;
                        }
                    },
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                };
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = tx.send(Command::Dispose).await;
    let ctl = conversation.await.context("Conversation task failed")?;
    tracing::info!(channel, messages = ctl.store().len(), "Conversation closed");
    drop(ctl);
    let _ = printer.await;
    Ok(())
}
