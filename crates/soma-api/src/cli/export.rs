//! `soma export`: dump conversations, identities and facts to JSON files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use soma_infra::filesystem::exports_dir;

use crate::state::AppState;

/// Files written by one export run.
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub conversations: (usize, PathBuf),
    pub identities: (usize, PathBuf),
    pub facts: (usize, PathBuf),
}

/// Filesystem-safe timestamp used in export file names.
fn file_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

async fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let body = serde_json::to_string_pretty(rows)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Write the three export files into `dir`.
pub async fn write_export(state: &AppState, dir: &Path, limit: usize) -> Result<ExportSummary> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let stamp = file_stamp(Utc::now());

    let conversations = state.conversation.recent_messages(limit).await?;
    let identities = state.conversation.get_all_identities().await?;
    let facts = state.conversation.list_facts(None).await?;

    let conv_path = dir.join(format!("conversations_{stamp}.json"));
    let id_path = dir.join(format!("identities_{stamp}.json"));
    let fact_path = dir.join(format!("facts_{stamp}.json"));

    write_json(&conv_path, &conversations).await?;
    write_json(&id_path, &identities).await?;
    write_json(&fact_path, &facts).await?;

    tracing::info!(
        dir = %dir.display(),
        messages = conversations.len(),
        identities = identities.len(),
        facts = facts.len(),
        "export written"
    );

    Ok(ExportSummary {
        conversations: (conversations.len(), conv_path),
        identities: (identities.len(), id_path),
        facts: (facts.len(), fact_path),
    })
}

pub async fn export(state: &AppState, dir: Option<PathBuf>, limit: usize, json: bool) -> Result<()> {
    let dir = dir.unwrap_or_else(|| exports_dir(&state.data_dir));
    let summary = write_export(state, &dir, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    for (label, (count, path)) in [
        ("conversations", &summary.conversations),
        ("identities", &summary.identities),
        ("facts", &summary.facts),
    ] {
        println!(
            "  {} Exported {} {label} to {}",
            style("✓").green().bold(),
            style(count).bold(),
            style(path.display()).dim()
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use soma_types::config::MemoryConfig;

    #[test]
    fn test_file_stamp_has_no_colons() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let stamp = file_stamp(now);
        assert_eq!(stamp, "2026-03-04T05-06-07-000Z");
        assert!(!stamp.contains(':'));
    }

    #[tokio::test]
    async fn test_export_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_config(dir.path().to_path_buf(), MemoryConfig::default())
            .await
            .unwrap();
        state
            .conversation
            .submit_text_turn(Some("s1"), "what was on my screen")
            .await
            .unwrap();

        let out = dir.path().join("out");
        let summary = write_export(&state, &out, 100).await.unwrap();
        assert_eq!(summary.conversations.0, 2);
        assert_eq!(summary.identities.0, 0);
        assert_eq!(summary.facts.0, 0);

        let body = tokio::fs::read_to_string(&summary.conversations.1).await.unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(rows[0]["role"], "user");
        assert_eq!(rows[1]["role"], "assistant");
    }
}
