//! Channel commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use crate::config::build_authed_client;
use crate::handlers::channel::{self as handlers, ReplyArg};
use crate::output::{print_table, OutputFormat};

#[derive(Subcommand)]
pub enum ChannelAction {
    /// Show channel history
    #[command(alias = "h")]
    History {
        /// Channel ID
        channel: String,
        /// Messages per page (1-100)
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only messages older than this ID
        #[arg(short, long)]
        before: Option<String>,
    },

    /// Send a message
    Send {
        /// Channel ID
        channel: String,
        /// Message content
        #[arg(default_value = "")]
        content: String,
        /// Reply to a message, as ID or ID:mention
        #[arg(short, long = "reply")]
        replies: Vec<String>,
        /// Attach a file (repeatable)
        #[arg(short, long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Edit a message
    Edit {
        /// Channel ID
        channel: String,
        /// Message ID
        message: String,
        /// New content
        content: String,
    },

    /// Mark a channel read up to a message
    Ack {
        /// Channel ID
        channel: String,
        /// Message ID
        message: String,
    },
}

pub async fn handle(action: ChannelAction, format: OutputFormat, _verbose: bool) -> Result<()> {
    match action {
        ChannelAction::History {
            channel,
            limit,
            before,
        } => show_history(&channel, limit, before.as_deref(), format).await,
        ChannelAction::Send {
            channel,
            content,
            replies,
            attachments,
        } => send_message(&channel, &content, &replies, &attachments, format).await,
        ChannelAction::Edit {
            channel,
            message,
            content,
        } => {
            let client = build_authed_client()?;
            handlers::edit(&client, &channel, &message, &content).await?;
            println!("{}", format!("Edited {}", message).green());
            Ok(())
        }
        ChannelAction::Ack { channel, message } => {
            let client = build_authed_client()?;
            handlers::ack(&client, &channel, &message).await?;
            println!("Marked {} read up to {}", channel.cyan(), message.cyan());
            Ok(())
        }
    }
}

async fn show_history(
    channel: &str,
    limit: usize,
    before: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let client = build_authed_client()?;
    let result = handlers::history(&client, channel, limit, before).await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if matches!(format, OutputFormat::Plain) {
        println!("{}\n", format!("History of {}", channel).bold());
    }
    print_table(result.messages, format);

    if let Some(before) = result.before {
        println!(
            "\n{}",
            format!("Older: revsync channel history {} --before {}", channel, before).dimmed()
        );
    }
    Ok(())
}

/// Parse `ID` or `ID:mention`.
pub fn parse_reply(arg: &str) -> Result<ReplyArg> {
    let (id, mention) = match arg.split_once(':') {
        Some((id, "mention")) => (id, true),
        Some((_, flag)) => anyhow::bail!("Unknown reply flag '{}'", flag),
        None => (arg, false),
    };
    if id.is_empty() {
        anyhow::bail!("Empty reply target");
    }
    Ok(ReplyArg {
        id: id.to_string(),
        mention,
    })
}

async fn send_message(
    channel: &str,
    content: &str,
    replies: &[String],
    attachments: &[PathBuf],
    format: OutputFormat,
) -> Result<()> {
    let replies = replies
        .iter()
        .map(|r| parse_reply(r))
        .collect::<Result<Vec<_>>>()
        .context("Invalid --reply")?;

    let client = build_authed_client()?;
    let result = handlers::send(&client, channel, content, &replies, attachments).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            let mut line = format!("Sent to {}", result.channel);
            if result.attachments > 0 {
                line.push_str(&format!(
                    " ({} files in {} messages)",
                    result.attachments, result.messages
                ));
            }
            println!("{}", line.green());
        }
    }
    Ok(())
}
