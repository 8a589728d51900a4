//! Append-only JSONL journal of ledger mutations made through the CLI.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Journal {
    pub path: PathBuf,
    run_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    run_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn open(path: &Path, run_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            run_id: run_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            run_id: &self.run_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn like_toggled(&mut self, article_id: &str, user_id: &str, liked: bool) -> Result<()> {
        self.log(
            "like_toggled",
            serde_json::json!({
                "article_id": article_id,
                "user_id": user_id,
                "liked": liked,
            }),
        )
    }

    pub fn likes_cleared(&mut self, article_id: &str) -> Result<()> {
        self.log(
            "likes_cleared",
            serde_json::json!({ "article_id": article_id }),
        )
    }

    /// Log a reaction save
    pub fn reaction_saved(
        &mut self,
        session_id: &str,
        reaction_id: &str,
        version: u64,
    ) -> Result<()> {
        self.log(
            "reaction_saved",
            serde_json::json!({
                "session_id": session_id,
                "reaction_id": reaction_id,
                "version": version,
            }),
        )
    }

    pub fn reaction_deleted(&mut self, session_id: &str) -> Result<()> {
        self.log(
            "reaction_deleted",
            serde_json::json!({ "session_id": session_id }),
        )
    }

    /// Log a mentor mutation; `change` names the operation
    pub fn mentor_updated(&mut self, mentor_id: &str, change: &str, ok: bool) -> Result<()> {
        self.log(
            "mentor_updated",
            serde_json::json!({
                "mentor_id": mentor_id,
                "change": change,
                "ok": ok,
            }),
        )
    }

    pub fn mentors_imported(&mut self, source: &str, ok: bool) -> Result<()> {
        self.log(
            "mentors_imported",
            serde_json::json!({
                "source": source,
                "ok": ok,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_events(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_events_are_appended_as_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("journal.jsonl");
        let mut journal = Journal::open(&path, "run-1").unwrap();
        journal.like_toggled("a1", "u1", true).unwrap();
        journal.mentor_updated("2", "add_skill", true).unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["type"], "like_toggled");
        assert_eq!(events[0]["run_id"], "run-1");
        assert_eq!(events[0]["liked"], true);
        assert_eq!(events[1]["change"], "add_skill");
        assert!(events[1]["ts"].is_string());
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        Journal::open(&path, "a")
            .unwrap()
            .reaction_saved("s1", "reaction_x", 1)
            .unwrap();
        Journal::open(&path, "b")
            .unwrap()
            .reaction_deleted("s1")
            .unwrap();

        let events = read_events(&path);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["run_id"], "b");
    }
}
