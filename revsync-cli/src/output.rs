//! Output formatting.

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use revsync::{ConversationSnapshot, Message, User, UserId};
use serde::Serialize;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table format
    Table,
    /// JSON format
    Json,
    /// Plain text format
    #[default]
    Plain,
}

/// Trait for plain text output.
pub trait PlainPrint {
    /// Print as plain text with formatting.
    fn plain_print(&self);
}

/// Trait for table row generation.
pub trait TableRow {
    /// Get table headers.
    fn headers() -> Vec<&'static str>;
    /// Get row data as strings.
    fn row(&self) -> Vec<String>;
}

/// Print items in plain text format.
pub fn print_plain<T: PlainPrint>(items: &[T]) {
    if items.is_empty() {
        println!("No results");
        return;
    }
    for item in items {
        item.plain_print();
    }
}

/// Format a creation time for display.
pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Display name of a user, or the raw ID if unknown.
pub fn display_name(id: &UserId, users: &[User]) -> String {
    users
        .iter()
        .find(|u| &u.id == id)
        .map(|u| u.display().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Print a table of items with proper formatting for each output mode.
pub fn print_table<T: TableRow + Serialize + PlainPrint>(items: Vec<T>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items).unwrap_or_default());
        }
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results");
                return;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(T::headers());
            for item in &items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Plain => {
            print_plain(&items);
        }
    }
}

/// Row for message display.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRow {
    pub id: String,
    pub author: String,
    pub author_id: String,
    pub time: String,
    pub content: String,
    pub attachments: Vec<String>,
    pub replies: Vec<String>,
    pub reactions: usize,
    pub edited: bool,
    /// Continues the group of the message above it.
    pub tail: bool,
}

impl MessageRow {
    /// Build a row, resolving the author through `users`.
    pub fn new(message: &Message, users: &[User]) -> Self {
        let author = message
            .masquerade
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| display_name(&message.author, users));

        Self {
            id: message.id.to_string(),
            author,
            author_id: message.author.to_string(),
            time: format_time(message.id.created_at()),
            content: match &message.system {
                Some(event) => format!("<{}>", event.kind),
                None => message.content.clone().unwrap_or_default(),
            },
            attachments: message
                .attachments
                .iter()
                .map(|a| a.filename.clone())
                .collect(),
            replies: message.replies.iter().map(|r| r.to_string()).collect(),
            reactions: message.reactions.values().map(Vec::len).sum(),
            edited: message.edited.is_some(),
            tail: message.tail,
        }
    }

    /// Rows oldest first, the order a transcript reads in.
    pub fn transcript(messages: &[Message], users: &[User]) -> Vec<Self> {
        messages.iter().rev().map(|m| Self::new(m, users)).collect()
    }
}

impl TableRow for MessageRow {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Author", "Time", "Content", "Files"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            if self.tail {
                String::new()
            } else {
                self.author.clone()
            },
            self.time.clone(),
            self.content.clone(),
            self.attachments.join(", "),
        ]
    }
}

impl PlainPrint for MessageRow {
    fn plain_print(&self) {
        if !self.tail {
            println!(
                "{} {} {}",
                self.author.green().bold(),
                self.time.dimmed(),
                format!("[{}]", self.id).dimmed()
            );
        }
        for reply in &self.replies {
            println!("   {} {}", "↪".dimmed(), reply.dimmed());
        }
        if !self.content.is_empty() {
            let edited = if self.edited { " (edited)" } else { "" };
            println!("   {}{}", self.content, edited.dimmed());
        }
        for file in &self.attachments {
            println!("   {} {}", "📎".cyan(), file.cyan());
        }
        if self.reactions > 0 {
            println!("   {}", format!("{} reactions", self.reactions).dimmed());
        }
    }
}

/// Print a conversation snapshot.
pub fn print_snapshot(
    snapshot: &ConversationSnapshot,
    users: &[User],
    tail: usize,
    format: OutputFormat,
) {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string(snapshot).unwrap_or_default());
        return;
    }

    let shown = snapshot.messages.len().min(tail);
    let rows = MessageRow::transcript(&snapshot.messages[..shown], users);
    println!("{}", "─".repeat(40).dimmed());
    print_table(rows, format);

    if !snapshot.typing.is_empty() {
        let names: Vec<String> = snapshot
            .typing
            .iter()
            .map(|id| display_name(id, users))
            .collect();
        println!("{}", format!("{} typing...", names.join(", ")).italic());
    }

    let composer = &snapshot.composer;
    let mut status = Vec::new();
    if let Some(id) = &composer.editing {
        status.push(format!("editing {}", id));
    }
    if !composer.replies.is_empty() {
        let replies: Vec<String> = composer
            .replies
            .iter()
            .map(|r| if r.mention { format!("@{}", r.id) } else { r.id.to_string() })
            .collect();
        status.push(format!("replying to {}", replies.join(", ")));
    }
    if !composer.attachments.is_empty() {
        status.push(format!("{} files queued", composer.attachments.len()));
    }
    if snapshot.sending {
        status.push(format!("sending {:.0}%", composer.upload_progress * 100.0));
    }
    if snapshot.loading_older {
        status.push("loading older".to_string());
    } else if snapshot.exhausted {
        status.push("start of history".to_string());
    }
    if !status.is_empty() {
        println!("{}", status.join(" | ").dimmed());
    }
    if !composer.content.is_empty() {
        println!("{} {}", ">".bold(), composer.content);
    }
    if let Some(err) = &snapshot.last_error {
        println!("{}", err.red());
    }
}
