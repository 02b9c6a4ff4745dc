//! Writing extracted files to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use mkvsubs_core::OutputFile;
use tokio::io::AsyncWriteExt;

/// Reduce a container-supplied name to a bare file name, so attachments
/// cannot be written outside the output directory.
pub fn sanitize_name(name: &str) -> Option<String> {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim_matches(char::from(0))
        .trim();

    match base {
        "" | "." | ".." => None,
        base => Some(base.to_string()),
    }
}

/// Sanitized, unique file names for `files`, in order. A name already taken
/// by an earlier output gets a numeric suffix (`font.ttf`, `font_2.ttf`).
pub fn unique_names(files: &[OutputFile]) -> Result<Vec<String>> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let name = sanitize_name(&file.name)
                .ok_or_else(|| anyhow!("Refusing to write output with unusable name {:?}", file.name))?;
            let mut candidate = name.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = with_suffix(&name, n);
                n += 1;
            }
            if candidate != name {
                tracing::warn!("Output name {} already used, writing {} instead", name, candidate);
            }
            Ok(candidate)
        })
        .collect()
}

fn with_suffix(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, n, ext),
        _ => format!("{}_{}", name, n),
    }
}

/// Write every output file into `dir`. Existing files are only replaced when
/// `overwrite` is set; otherwise nothing is written if any target exists.
pub async fn write_outputs(dir: &Path, files: &[OutputFile], overwrite: bool) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let paths: Vec<PathBuf> = unique_names(files)?.into_iter().map(|name| dir.join(name)).collect();
    if !overwrite {
        for path in &paths {
            if tokio::fs::try_exists(path).await? {
                bail!("{} already exists (use --overwrite to replace it)", path.display());
            }
        }
    }

    let mut written = Vec::with_capacity(files.len());
    for (file, path) in files.iter().zip(paths) {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut handle = options
            .open(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        handle
            .write_all(file.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        handle.flush().await?;

        tracing::info!("Wrote {} ({} bytes)", path.display(), file.len());
        written.push(path);
    }

    Ok(written)
}
