use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::config::FormatRegistry;
use crate::model::{SkippedDocument, TextEntry, TextInventoryManifest};
use crate::segmenter::resolve_format;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let text_dir = args
        .text_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("text"));
    let registry = FormatRegistry::load(&args.config_path)
        .with_context(|| format!("failed to load {}", args.config_path.display()))?;

    let manifest = build_manifest(&text_dir, &registry)?;

    for entry in manifest.texts.iter().filter(|entry| entry.format.is_none()) {
        warn!(filename = %entry.filename, "no format config lists this document");
    }

    if args.dry_run {
        info!(
            text_count = manifest.text_count,
            unresolved = manifest.unresolved_count,
            unreadable = manifest.unreadable.len(),
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.cache_root.join("manifests").join("text_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        text_count = manifest.text_count,
        unresolved = manifest.unresolved_count,
        unreadable = manifest.unreadable.len(),
        "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(text_dir: &Path, registry: &FormatRegistry) -> Result<TextInventoryManifest> {
    let mut text_paths = discover_texts(text_dir)?;
    text_paths.sort();

    if text_paths.is_empty() {
        bail!("no text files found in {}", text_dir.display());
    }

    let text_count = text_paths.len();
    let mut texts = Vec::with_capacity(text_count);
    let mut unreadable = Vec::new();
    for path in text_paths {
        match inspect_text(&path, registry) {
            Ok(entry) => texts.push(entry),
            Err(err) => {
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                warn!(filename = %stem, error = %format!("{err:#}"), "text file unreadable; skipping");
                unreadable.push(SkippedDocument::read_failed(&stem, &err));
            }
        }
    }

    let unresolved_count = texts.iter().filter(|entry| entry.format.is_none()).count();

    Ok(TextInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: text_dir.display().to_string(),
        text_count,
        unresolved_count,
        texts,
        unreadable,
    })
}

fn inspect_text(path: &Path, registry: &FormatRegistry) -> Result<TextEntry> {
    let filename = file_name_string(path)?;
    let stem = file_stem_string(path)?;
    let bytes = fs::metadata(path)
        .with_context(|| format!("failed to inspect {}", path.display()))?
        .len();
    let sha256 = sha256_file(path)?;
    let format = resolve_format(&stem, registry)
        .ok()
        .map(|format| format.name.clone());

    Ok(TextEntry {
        filename,
        stem,
        bytes,
        sha256,
        format,
    })
}

pub fn discover_texts(text_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut texts = Vec::new();

    let entries = fs::read_dir(text_dir)
        .with_context(|| format!("failed to read {}", text_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", text_dir.display()))?;
        let path = entry.path();

        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;
        // Symlinks are followed later; a dangling one is reported as unreadable.
        if !file_type.is_file() && !file_type.is_symlink() {
            warn!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text {
            texts.push(path);
        }
    }

    Ok(texts)
}

pub fn file_stem_string(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 file stem: {}", path.display()))
}

fn file_name_string(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))
}
