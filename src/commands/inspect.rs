use anyhow::Result;
use collate::archive::read_archive;
use collate::Visibility;
use serde_json::json;

pub fn run(archive_path: String, json: bool) -> Result<()> {
    let archive = read_archive(&archive_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", archive_path, e))?;

    if json {
        let report = json!({
            "format": archive.header().format.token(),
            "header": archive.header(),
            "metadata": archive.metadata(),
            "entries": archive.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let header = archive.header();
    let metadata = archive.metadata();
    let references = &metadata.references;

    println!("{} v{}", header.mod_name, header.mod_version);
    println!("  Loader version: {}", header.loader_version);
    println!("  Format: {}", header.format.token());
    println!();

    println!("Properties:");
    for (key, value) in metadata.properties.iter() {
        println!("  {}: {}", key, value);
    }
    println!();

    if !references.is_empty() {
        println!("References:");
        for r in &references.mods {
            let weak = if r.weak { " (weak)" } else { "" };
            println!("  mod      {} {}{}", r.name, r.version, weak);
        }
        for r in &references.assemblies {
            let public = if r.public { " (public)" } else { "" };
            println!("  assembly {} [{}]{}", r.name, r.path, public);
        }
        for r in &references.packages {
            let public = if r.public { " (public)" } else { "" };
            println!("  package  {} {}{}", r.id, r.version, public);
        }
        println!();
    }

    println!("Entries ({}):", archive.entries().len());
    for entry in archive.entries() {
        let flag = match entry.visibility {
            Visibility::Normal => " ",
            Visibility::HiddenCode => "C",
            Visibility::HiddenResource => "R",
        };
        let stored = if entry.compressed {
            format!("{} -> {}", super::format_size(entry.raw_len), super::format_size(entry.stored_len))
        } else {
            super::format_size(entry.raw_len)
        };
        println!("  {} {} ({})", flag, entry.path, stored);
    }

    Ok(())
}
