//! `soma stats`: database statistics.

use anyhow::Result;
use console::style;

use soma_infra::sqlite::pool::DATABASE_FILE;

use crate::state::AppState;

pub async fn show_stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.conversation.store_stats().await?;
    let db_path = state.data_dir.join(DATABASE_FILE);
    let db_bytes = tokio::fs::metadata(&db_path).await.map(|m| m.len()).ok();

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "messages": stats.messages,
            "sessions": stats.sessions,
            "identities": stats.identities,
            "facts": stats.facts,
            "last_activity": stats.last_activity.map(|t| t.to_rfc3339()),
            "database_bytes": db_bytes,
            "retention_days": state.config().retention_days,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} Soma memory v{}", style("◆").cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Memory ──").dim());
    println!("  Messages:   {}", style(stats.messages).bold());
    println!("  Sessions:   {}", style(stats.sessions).bold());
    println!("  Identities: {}", style(stats.identities).bold());
    println!("  Facts:      {}", style(stats.facts).bold());
    if let Some(last) = stats.last_activity {
        println!(
            "  Last activity: {}",
            last.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:  {}", style(state.data_dir.display()).dim());
    if let Some(bytes) = db_bytes {
        println!("  Database:  {} (SQLite, WAL mode)", format_bytes(bytes));
    }
    println!("  Retention: {} days", state.config().retention_days);
    println!();

    Ok(())
}

fn format_bytes(n: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if n as f64 >= MB {
        format!("{:.2} MB", n as f64 / MB)
    } else if n >= 1024 {
        format!("{:.1} KB", n as f64 / 1024.0)
    } else {
        format!("{n} B")
    }
}
