// src/pipeline/export.rs

//! Report writers: JSON, CSV and Markdown views of the record store.
//!
//! Rows are ordered by lifecycle state (weights first) and star count
//! descending, so the most actionable repos sit at the top of every
//! report.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::models::{RepoRecord, RepoState};
use crate::pipeline::Summary;

fn sorted_records(repos: &HashMap<String, RepoRecord>) -> Vec<&RepoRecord> {
    let mut records: Vec<&RepoRecord> = repos.values().collect();
    records.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then(b.stars.cmp(&a.stars))
            .then(a.full_name.cmp(&b.full_name))
    });
    records
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    repos: Vec<&'a RepoRecord>,
}

/// Write the full store as a JSON report.
pub async fn export_json(
    path: impl AsRef<Path>,
    repos: &HashMap<String, RepoRecord>,
    summary: &Summary,
) -> Result<()> {
    let report = JsonReport {
        summary,
        repos: sorted_records(repos),
    };
    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(path.as_ref(), json).await?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write the store as CSV.
pub async fn export_csv(path: impl AsRef<Path>, repos: &HashMap<String, RepoRecord>) -> Result<()> {
    let mut out = String::from(
        "full_name,stars,status,weight_status,weight_confidence,conference,conference_year,arxiv_id,last_checked,url\n",
    );
    for record in sorted_records(repos) {
        let row = [
            csv_field(&record.full_name),
            record.stars.to_string(),
            record.status.as_str().to_string(),
            csv_field(&record.weight_status),
            csv_field(&record.weight_confidence),
            csv_field(record.conference.as_deref().unwrap_or("")),
            csv_field(record.conference_year.as_deref().unwrap_or("")),
            csv_field(record.arxiv_id.as_deref().unwrap_or("")),
            record.last_checked.to_string(),
            csv_field(&record.url),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    tokio::fs::write(path.as_ref(), out).await?;
    Ok(())
}

fn section_title(status: RepoState) -> &'static str {
    match status {
        RepoState::HasWeights => "Weights available",
        RepoState::ComingSoon => "Coming soon",
        RepoState::NoWeights => "No weights",
    }
}

/// Write the store as a Markdown report: fresh releases first, then
/// one section per state. The coming-soon section carries the promise
/// evidence so the watchlist is reviewable at a glance.
pub async fn export_markdown(
    path: impl AsRef<Path>,
    repos: &HashMap<String, RepoRecord>,
    summary: &Summary,
    today: chrono::NaiveDate,
    fresh_window_days: i64,
) -> Result<()> {
    let mut out = String::from("# Tracked Repositories\n\n");
    out.push_str(&format!(
        "{} repos tracked, {} fresh releases, {} new this run.\n",
        summary.total_repos, summary.fresh_releases, summary.new_this_run
    ));

    let records = sorted_records(repos);

    let fresh: Vec<&&RepoRecord> = records
        .iter()
        .filter(|r| r.is_fresh_release(today, fresh_window_days))
        .collect();
    if !fresh.is_empty() {
        out.push_str(&format!("\n## Fresh releases ({})\n\n", fresh.len()));
        out.push_str("| Repository | Stars | Previously | Released | Weights |\n");
        out.push_str("|---|---|---|---|---|\n");
        for record in fresh {
            let previously = record
                .previous_status
                .map(|s| s.as_str())
                .unwrap_or("-");
            out.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} |\n",
                record.full_name,
                record.url,
                record.stars,
                previously,
                record.status_changed_date,
                record.weight_status,
            ));
        }
    }
    for status in [
        RepoState::HasWeights,
        RepoState::ComingSoon,
        RepoState::NoWeights,
    ] {
        let section: Vec<&&RepoRecord> =
            records.iter().filter(|r| r.status == status).collect();
        if section.is_empty() {
            continue;
        }

        let watchlist = status == RepoState::ComingSoon;
        out.push_str(&format!("\n## {} ({})\n\n", section_title(status), section.len()));
        if watchlist {
            out.push_str("| Repository | Stars | Promise | Venue | Paper | Checked |\n");
        } else {
            out.push_str("| Repository | Stars | Weights | Venue | Paper | Checked |\n");
        }
        out.push_str("|---|---|---|---|---|---|\n");
        for record in section {
            let venue = match (&record.conference, &record.conference_year) {
                (Some(venue), Some(year)) => format!("{} {}", venue, year),
                (Some(venue), None) => venue.clone(),
                _ => "-".to_string(),
            };
            let paper = record
                .arxiv_id
                .as_ref()
                .map(|id| format!("[{}](https://arxiv.org/abs/{})", id, id))
                .unwrap_or_else(|| "-".to_string());
            let evidence = if watchlist {
                record
                    .coming_soon_details
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "-".to_string())
            } else {
                record.weight_status.clone()
            };
            out.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} | {} |\n",
                record.full_name,
                record.url,
                record.stars,
                evidence,
                venue,
                paper,
                record.last_checked,
            ));
        }
    }

    tokio::fs::write(path.as_ref(), out).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::queue::CandidateQueue;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store() -> HashMap<String, RepoRecord> {
        let mut repos = HashMap::new();

        let mut a = RepoRecord::new("x/weights", date("2026-01-01"));
        a.update_status(RepoState::HasWeights, date("2026-01-10"));
        a.stars = 50;
        a.weight_status = "HF".to_string();
        a.arxiv_id = Some("2401.12345".to_string());
        repos.insert(a.full_name.clone(), a);

        let mut b = RepoRecord::new("x/plain", date("2026-01-01"));
        b.stars = 900;
        b.description = "has, a comma".to_string();
        repos.insert(b.full_name.clone(), b);

        repos
    }

    fn summary(repos: &HashMap<String, RepoRecord>) -> Summary {
        Summary::compute(repos, &CandidateQueue::new(), 0, date("2026-01-12"), 7)
    }

    #[test]
    fn test_sorted_by_state_then_stars() {
        let repos = store();
        let sorted = sorted_records(&repos);
        // Weights-holding repo first despite fewer stars.
        assert_eq!(sorted[0].full_name, "x/weights");
        assert_eq!(sorted[1].full_name, "x/plain");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn test_csv_export_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let repos = store();

        export_csv(&path, &repos).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[0].starts_with("full_name,stars,status"));
        assert!(lines[1].starts_with("x/weights,50,has_weights,HF"));
    }

    #[tokio::test]
    async fn test_markdown_export_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let repos = store();

        export_markdown(&path, &repos, &summary(&repos), date("2026-01-12"), 7)
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();

        assert!(content.contains("## Weights available (1)"));
        assert!(content.contains("## No weights (1)"));
        assert!(content.contains("[x/weights](https://github.com/x/weights)"));
        assert!(content.contains("arxiv.org/abs/2401.12345"));
    }

    #[tokio::test]
    async fn test_markdown_fresh_release_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        // x/weights transitioned on 2026-01-10; two days later it is
        // inside the 7-day window.
        let repos = store();

        export_markdown(&path, &repos, &summary(&repos), date("2026-01-12"), 7)
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();

        assert!(content.contains("## Fresh releases (1)"));
        assert!(content.contains("| no_weights | 2026-01-10 |"));

        // Outside the window the section disappears.
        export_markdown(&path, &repos, &summary(&repos), date("2026-02-12"), 7)
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!content.contains("## Fresh releases"));
    }

    #[tokio::test]
    async fn test_markdown_watchlist_shows_promise_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        let mut repos = HashMap::new();
        let mut record = RepoRecord::new("x/promised", date("2026-01-01"));
        record.update_status(RepoState::ComingSoon, date("2026-01-05"));
        record.coming_soon_detected = true;
        record.coming_soon_details = vec!["coming soon: 'Weights coming soon!'".to_string()];
        repos.insert(record.full_name.clone(), record);

        export_markdown(&path, &repos, &summary(&repos), date("2026-01-12"), 7)
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();

        assert!(content.contains("## Coming soon (1)"));
        assert!(content.contains("| Repository | Stars | Promise |"));
        assert!(content.contains("coming soon: 'Weights coming soon!'"));
    }

    #[tokio::test]
    async fn test_json_export_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let repos = store();

        export_json(&path, &repos, &summary(&repos)).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["summary"]["total_repos"], 2);
        assert_eq!(value["repos"].as_array().unwrap().len(), 2);
    }
}
