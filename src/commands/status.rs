use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::segment::LATEST_RUN_MANIFEST;
use crate::model::{SegmentRunManifest, TextInventoryManifest};
use crate::store::{count_rows, count_sections_by_type};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let run_path = manifest_dir.join(LATEST_RUN_MANIFEST);
    let inventory_path = manifest_dir.join("text_inventory.json");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("rplan_sections.sqlite"));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if run_path.exists() {
        let run: SegmentRunManifest = read_json(&run_path)?;

        info!(
            run_id = %run.run_id,
            status = %run.status,
            started_at = %run.started_at,
            updated_at = %run.updated_at,
            db_schema_version = %run.db_schema_version,
            text_count = run.counts.text_count,
            processed = run.counts.processed_count,
            skipped = run.counts.skipped_count,
            empty_texts = run.counts.empty_text_count,
            sections = run.counts.sections_total,
            "loaded latest segment run"
        );
        for skipped in &run.skipped {
            warn!(filename = %skipped.filename, kind = %skipped.kind, reason = %skipped.reason, "skipped in latest run");
        }
    } else {
        warn!(path = %run_path.display(), "segment run manifest missing");
    }

    if inventory_path.exists() {
        let inventory: TextInventoryManifest = read_json(&inventory_path)?;

        info!(
            generated_at = %inventory.generated_at,
            text_count = inventory.text_count,
            unresolved = inventory.unresolved_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let documents = count_rows(&conn, "SELECT COUNT(*) FROM documents").unwrap_or(0);
        let sections = count_rows(&conn, "SELECT COUNT(*) FROM sections").unwrap_or(0);

        info!(
            path = %db_path.display(),
            documents,
            sections,
            "database status"
        );
        for (section_type, count) in count_sections_by_type(&conn).unwrap_or_default() {
            info!(section_type = %section_type, count, "sections by type");
        }
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}
