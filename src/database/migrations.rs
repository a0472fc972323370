// Database migrations for the meeting-notes worker
// Creates and updates the database schema

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version
const SCHEMA_VERSION: i32 = 3;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    ).unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    ).unwrap_or(0);

    Ok(version)
}

/// Initial schema creation (version 1)
fn migrate_v1(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v1");

    conn.execute_batch(r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Meetings table: Core metadata for each uploaded meeting
        CREATE TABLE IF NOT EXISTS meetings (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'uploaded',
            audio_url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            started_at TEXT,
            duration_sec REAL
        );

        CREATE INDEX IF NOT EXISTS idx_meetings_status_created
        ON meetings(status, created_at);

        -- Speakers table: One row per (meeting, provider label)
        CREATE TABLE IF NOT EXISTS speakers (
            id TEXT PRIMARY KEY NOT NULL,
            meeting_id TEXT NOT NULL,
            label TEXT NOT NULL,
            display_name TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (meeting_id, label),
            FOREIGN KEY (meeting_id) REFERENCES meetings(id) ON DELETE CASCADE
        );

        -- Transcript segments table: Time-aligned diarized transcript pieces
        CREATE TABLE IF NOT EXISTS transcript_segments (
            id TEXT PRIMARY KEY NOT NULL,
            meeting_id TEXT NOT NULL,
            speaker_id TEXT,
            start_ms INTEGER NOT NULL,
            end_ms INTEGER NOT NULL,
            text TEXT NOT NULL,
            confidence REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (meeting_id) REFERENCES meetings(id) ON DELETE CASCADE,
            FOREIGN KEY (speaker_id) REFERENCES speakers(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transcript_segments_meeting_start
        ON transcript_segments(meeting_id, start_ms);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
    "#).context("Failed to run migration v1")?;

    log::info!("Migration v1 completed successfully");
    Ok(())
}

/// Meeting notes and action items (version 2)
fn migrate_v2(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v2 - Notes and action items");

    conn.execute_batch(r#"
        -- One notes row per meeting; regeneration replaces it
        CREATE TABLE IF NOT EXISTS meeting_notes (
            meeting_id TEXT PRIMARY KEY NOT NULL,
            summary_md TEXT NOT NULL,
            key_points_json TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL,
            FOREIGN KEY (meeting_id) REFERENCES meetings(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS action_items (
            id TEXT PRIMARY KEY NOT NULL,
            meeting_id TEXT NOT NULL,
            owner_name TEXT,
            task TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            source_segment_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (meeting_id) REFERENCES meetings(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_action_items_meeting
        ON action_items(meeting_id);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (2);
    "#).context("Failed to run migration v2")?;

    log::info!("Migration v2 completed successfully");
    Ok(())
}

/// Durable job queue (version 3)
fn migrate_v3(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v3 - Job queue");

    conn.execute_batch(r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY NOT NULL,
            queue TEXT NOT NULL,
            meeting_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            attempts INTEGER NOT NULL DEFAULT 0,
            max_attempts INTEGER NOT NULL DEFAULT 3,
            run_at_ms INTEGER NOT NULL,
            last_error TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_queue_status_run_at
        ON jobs(queue, status, run_at_ms);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (3);
    "#).context("Failed to run migration v3")?;

    log::info!("Migration v3 completed successfully");
    Ok(())
}
