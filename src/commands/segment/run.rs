use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::SegmentArgs;
use crate::commands::inventory;
use crate::config::FormatRegistry;
use crate::model::{SegmentPaths, SegmentRunManifest};
use crate::store::{self, DB_SCHEMA_VERSION};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

use super::batch::segment_texts;

pub const LATEST_RUN_MANIFEST: &str = "latest_segment_run.json";

pub fn run(args: SegmentArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let text_dir = args
        .text_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("text"));
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| cache_root.join("regional_plan_sections.json"));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("rplan_sections.sqlite"));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "segment_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(text_dir = %text_dir.display(), run_id = %run_id, "starting segmentation");

    let registry = FormatRegistry::load(&args.config_path)
        .with_context(|| format!("failed to load {}", args.config_path.display()))?;
    info!(
        path = %args.config_path.display(),
        formats = registry.formats().count(),
        "loaded format config"
    );

    let inventory = inventory::build_manifest(&text_dir, &registry)?;
    let outcome = segment_texts(&text_dir, &inventory, &registry);

    write_json_pretty(&output_path, &outcome.rows())?;
    info!(path = %output_path.display(), "wrote section table");

    let mut connection = store::open_store(&db_path)?;
    let updated_at = now_utc_string();
    let stored = store::replace_documents(&mut connection, &outcome.records(), &updated_at)?;
    info!(path = %db_path.display(), sections = stored, "stored sections");

    for skipped in &outcome.skipped {
        warn!(filename = %skipped.filename, kind = %skipped.kind, "document skipped in this run");
    }

    let counts = outcome.counts(inventory.text_count);
    let manifest = SegmentRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at,
        command: render_segment_command(&args),
        paths: SegmentPaths {
            text_dir: text_dir.display().to_string(),
            config_path: args.config_path.display().to_string(),
            output_path: output_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts,
        skipped: outcome.skipped.clone(),
        source_hashes: inventory.texts,
        warnings: outcome.warnings.clone(),
    };

    write_json_pretty(&manifest_path, &manifest)?;
    write_json_pretty(&manifest_dir.join(LATEST_RUN_MANIFEST), &manifest)?;

    info!(path = %manifest_path.display(), "wrote segment run manifest");
    info!(
        processed = manifest.counts.processed_count,
        skipped = manifest.counts.skipped_count,
        sections = manifest.counts.sections_total,
        "segmentation completed"
    );

    Ok(())
}

fn render_segment_command(args: &SegmentArgs) -> String {
    let mut command = vec![
        "rplan".to_string(),
        "segment".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--config-path".to_string(),
        args.config_path.display().to_string(),
    ];

    if let Some(path) = &args.text_dir {
        command.push("--text-dir".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.output_path {
        command.push("--output-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
