//! `soma cleanup` and `soma clear`.

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

use crate::state::AppState;

/// Purge rows older than the retention period, then show what is left.
pub async fn cleanup(state: &AppState, days: Option<u32>, json: bool) -> Result<()> {
    let days = days.unwrap_or(state.config().retention_days);
    let report = state.conversation.cleanup(Some(days)).await?;

    if json {
        let out = serde_json::json!({
            "retention_days": days,
            "messages_deleted": report.messages_deleted,
            "sessions_deleted": report.sessions_deleted,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  Retention period: {} days", style(days).bold());
    println!(
        "  {} Deleted {} message{} and {} session{}.",
        style("✓").green().bold(),
        report.messages_deleted,
        if report.messages_deleted == 1 { "" } else { "s" },
        report.sessions_deleted,
        if report.sessions_deleted == 1 { "" } else { "s" },
    );

    crate::cli::stats::show_stats(state, false).await
}

/// Wipe every record set after confirmation.
pub async fn clear(state: &AppState, yes: bool, json: bool) -> Result<()> {
    if !yes {
        if json {
            anyhow::bail!("refusing to clear without --yes in JSON mode");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} Delete ALL conversations, identities and facts?",
                style("⚠").yellow().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.conversation.clear_all().await?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("  {} All data deleted.", style("x").red().bold());
    }
    Ok(())
}
