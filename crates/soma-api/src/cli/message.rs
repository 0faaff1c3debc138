//! `soma search` and `soma history`.

use anyhow::Result;
use console::style;

use soma_types::message::{Message, MessageRole};

use crate::state::AppState;

fn print_message(msg: &Message, show_session: bool) {
    let when = msg
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S");
    let role = match msg.role {
        MessageRole::User => style("user").green(),
        MessageRole::Assistant => style("assistant").cyan(),
    };
    if show_session {
        println!("  [{when}] {role} {}", style(format!("({})", msg.session_id)).dim());
    } else {
        println!("  [{when}] {role}");
    }
    println!("    {}", msg.content);
    println!();
}

/// Newest matches first.
pub async fn search(
    state: &AppState,
    query: &str,
    limit: usize,
    case_sensitive: bool,
    json: bool,
) -> Result<()> {
    let results = state
        .conversation
        .search_messages(query, limit, case_sensitive)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!();
    println!("  Search results for {}", style(format!("\"{query}\"")).yellow());
    println!();
    if results.is_empty() {
        println!("  No results found.");
        println!();
        return Ok(());
    }
    for msg in &results {
        print_message(msg, true);
    }
    println!("  Found {} result{}.", results.len(), if results.len() == 1 { "" } else { "s" });
    println!();
    Ok(())
}

/// Oldest first, ending at the most recent message.
pub async fn history(state: &AppState, session_id: &str, limit: usize, json: bool) -> Result<()> {
    let messages = state.conversation.get_history(session_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    if messages.is_empty() {
        println!(
            "  {} No messages for session '{}'.",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }
    for msg in &messages {
        print_message(msg, false);
    }
    Ok(())
}
