use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::{SectionRow, StoredSection};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

/// One segmented document as persisted alongside its sections.
#[derive(Debug, Clone)]
pub struct DocumentRecord<'a> {
    pub filename: &'a str,
    pub sha256: &'a str,
    pub format: &'a str,
    pub year: Option<i32>,
    pub chapter_count: usize,
    pub rows: &'a [SectionRow],
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
          filename TEXT PRIMARY KEY,
          sha256 TEXT NOT NULL,
          format TEXT NOT NULL,
          year INTEGER,
          chapter_count INTEGER NOT NULL,
          section_count INTEGER NOT NULL,
          segmented_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sections (
          section_id TEXT PRIMARY KEY,
          filename TEXT NOT NULL,
          seq INTEGER NOT NULL,
          chapter TEXT NOT NULL,
          section_type TEXT NOT NULL,
          section TEXT NOT NULL,
          FOREIGN KEY(filename) REFERENCES documents(filename)
        );

        CREATE INDEX IF NOT EXISTS idx_sections_filename_seq ON sections(filename, seq);
        CREATE INDEX IF NOT EXISTS idx_sections_type ON sections(section_type);
        ",
        )
        .context("failed to create schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            [DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

/// Replaces the stored sections of every given document. Returns the number
/// of section rows written.
pub fn replace_documents(
    connection: &mut Connection,
    documents: &[DocumentRecord<'_>],
    segmented_at: &str,
) -> Result<usize> {
    let tx = connection.transaction()?;
    let mut inserted = 0;

    {
        let mut document_statement = tx.prepare(
            "
            INSERT INTO documents(filename, sha256, format, year, chapter_count, section_count, segmented_at)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(filename) DO UPDATE SET
              sha256=excluded.sha256,
              format=excluded.format,
              year=excluded.year,
              chapter_count=excluded.chapter_count,
              section_count=excluded.section_count,
              segmented_at=excluded.segmented_at
            ",
        )?;
        let mut section_statement = tx.prepare(
            "
            INSERT INTO sections(section_id, filename, seq, chapter, section_type, section)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )?;

        for document in documents {
            tx.execute(
                "DELETE FROM sections WHERE filename = ?1",
                [document.filename],
            )?;

            document_statement.execute(params![
                document.filename,
                document.sha256,
                document.format,
                document.year,
                document.chapter_count as i64,
                document.rows.len() as i64,
                segmented_at,
            ])?;

            for (seq, row) in document.rows.iter().enumerate() {
                section_statement.execute(params![
                    section_id_for(document.filename, seq),
                    document.filename,
                    seq as i64,
                    &row.chapter,
                    row.section_type.as_str(),
                    &row.section,
                ])?;
                inserted += 1;
            }
        }
    }

    tx.commit()?;
    Ok(inserted)
}

pub fn load_sections(connection: &Connection) -> Result<Vec<StoredSection>> {
    let mut statement = connection.prepare(
        "
        SELECT section_id, filename, chapter, section_type, section
        FROM sections
        ORDER BY filename, seq
        ",
    )?;

    let rows = statement.query_map([], |row| {
        Ok(StoredSection {
            section_id: row.get(0)?,
            filename: row.get(1)?,
            chapter: row.get(2)?,
            section_type: row.get(3)?,
            section: row.get(4)?,
        })
    })?;

    rows.collect::<rusqlite::Result<Vec<StoredSection>>>()
        .context("failed to load stored sections")
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_sections_by_type(connection: &Connection) -> Result<Vec<(String, i64)>> {
    let mut statement = connection.prepare(
        "SELECT section_type, COUNT(*) FROM sections GROUP BY section_type ORDER BY section_type",
    )?;
    let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<(String, i64)>>>()
        .context("failed to count sections by type")
}

fn section_id_for(filename: &str, seq: usize) -> String {
    format!("{filename}:{seq:05}")
}
