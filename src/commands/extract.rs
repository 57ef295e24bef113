use anyhow::Result;
use collate::ModArchive;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub fn run(archive_path: String, dest: String) -> Result<()> {
    let archive = ModArchive::open(&archive_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", archive_path, e))?;
    let dest = PathBuf::from(dest);

    println!(
        "Extracting {} v{} to {}...",
        archive.header().mod_name,
        archive.header().mod_version,
        dest.display()
    );

    for entry in archive.entries() {
        let target = dest.join(safe_relative(&entry.path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, archive.extract(&entry.path)?)?;
        log::debug!("extracted {}", entry.path);
    }

    println!("  Extracted {} files", archive.entries().len());
    Ok(())
}

/// Entry paths must stay inside the destination
fn safe_relative(entry_path: &str) -> Result<&Path> {
    let path = Path::new(entry_path);
    if entry_path.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
        anyhow::bail!("Refusing to extract unsafe entry path: {}", entry_path);
    }
    Ok(path)
}
