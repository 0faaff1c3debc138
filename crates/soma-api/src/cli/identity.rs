//! `soma identities`: known fingerprint-to-subject bindings.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// Hash prefix shown in tables.
const HASH_PREVIEW: usize = 16;

pub async fn list_identities(state: &AppState, json: bool) -> Result<()> {
    let identities = state.conversation.get_all_identities().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identities)?);
        return Ok(());
    }

    if identities.is_empty() {
        println!();
        println!(
            "  {} No identities found. Send a screenshot, then say {}.",
            style("i").blue().bold(),
            style("\"that's me\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Subject").fg(Color::White),
        Cell::new("Fingerprint").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Last seen").fg(Color::White),
        Cell::new("Notes").fg(Color::White),
    ]);

    for identity in &identities {
        let hash = identity
            .image_fingerprint
            .get(..HASH_PREVIEW)
            .unwrap_or(&identity.image_fingerprint);
        table.add_row(vec![
            Cell::new(&identity.subject).fg(Color::Cyan),
            Cell::new(format!("{hash}...")).fg(Color::DarkGrey),
            Cell::new(identity.confidence.to_string()),
            Cell::new(identity.source.to_string()),
            Cell::new(
                identity
                    .last_seen_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(identity.notes.as_deref().unwrap_or("")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} identit{}",
        style(identities.len()).bold(),
        if identities.len() == 1 { "y" } else { "ies" }
    );
    println!();
    Ok(())
}
