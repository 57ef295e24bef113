//! Package command - pack a built mod into a .tmod archive
//!
//! Normally invoked by the build tooling after compilation, with the
//! reference lists it dumped into the project's obj/ directory.

use anyhow::Result;
use clap::Args;
use collate::properties::{self, parse_bool};
use collate::{BuildProperties, Config, Decision, Packer, PackingOptions, ProgressCallback, References, Visibility};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct PackageArgs {
    /// The display name of the mod
    #[arg(long)]
    pub display_name: Option<String>,

    /// The author(s) of the mod
    #[arg(long)]
    pub author: Option<String>,

    /// The version of the mod
    #[arg(long)]
    pub mod_version: Option<String>,

    /// The homepage of the mod
    #[arg(long)]
    pub homepage: Option<String>,

    /// Side the mod is loaded on (Both, Client, Server, NoSync)
    #[arg(long)]
    pub mod_side: Option<String>,

    /// Mods this mod should load before
    #[arg(long)]
    pub sort_before: Option<String>,

    /// Mods this mod should load after
    #[arg(long)]
    pub sort_after: Option<String>,

    /// Hide the mod's assembly from tooling
    #[arg(long, value_parser = parse_flag)]
    pub hide_code: Option<bool>,

    /// Hide the mod's resources from tooling
    #[arg(long, value_parser = parse_flag)]
    pub hide_resources: Option<bool>,

    /// Pack source files as well
    #[arg(long, value_parser = parse_flag)]
    pub include_source: Option<bool>,

    /// Glob patterns of files to leave out (';'-separated)
    #[arg(long)]
    pub build_ignore: Option<String>,

    /// Assembly reference list written by the build
    #[arg(long)]
    pub asmrefs_path: Option<PathBuf>,

    /// Package reference list written by the build
    #[arg(long)]
    pub nugetrefs_path: Option<PathBuf>,

    /// Mod reference list written by the build
    #[arg(long)]
    pub modrefs_path: Option<PathBuf>,

    /// The project directory
    #[arg(short = 'p', long)]
    pub proj_dir: PathBuf,

    /// The build output directory (defaults to <proj-dir>/bin/Release)
    #[arg(long)]
    pub proj_out_dir: Option<PathBuf>,

    /// The assembly name (defaults to the project directory name)
    #[arg(long)]
    pub asm_name: Option<String>,

    /// The mod loader version to target
    #[arg(long)]
    pub tml_ver: String,

    /// Where to write the archive (file or directory)
    #[arg(long)]
    pub out_path: Option<PathBuf>,

    /// Print resolved options and properties
    #[arg(long)]
    pub debug: bool,
}

fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    parse_bool(value).ok_or_else(|| format!("expected true or false, got '{}'", value))
}

/// Render a flag the way the loader's own tooling writes it
fn flag_value(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

impl PackageArgs {
    /// Properties for every option that was given
    pub fn properties(&self) -> BuildProperties {
        let mut props = BuildProperties::new();

        props.insert_opt(properties::DISPLAY_NAME, self.display_name.as_deref());
        props.insert_opt(properties::AUTHOR, self.author.as_deref());
        props.insert_opt(properties::MOD_VERSION, self.mod_version.as_deref());
        props.insert_opt(properties::HOMEPAGE, self.homepage.as_deref());
        props.insert_opt(properties::SIDE, self.mod_side.as_deref());
        props.insert_opt(properties::SORT_BEFORE, self.sort_before.as_deref());
        props.insert_opt(properties::SORT_AFTER, self.sort_after.as_deref());
        props.insert_opt(properties::HIDE_CODE, self.hide_code.map(flag_value));
        props.insert_opt(properties::HIDE_RESOURCES, self.hide_resources.map(flag_value));
        props.insert_opt(properties::INCLUDE_SOURCE, self.include_source.map(flag_value));
        props.insert_opt(properties::BUILD_IGNORE, self.build_ignore.as_deref());

        props
    }
}

/// Create an indicatif-based progress callback for CLI display
fn create_progress_callback(bar: ProgressBar) -> Result<ProgressCallback> {
    bar.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.green/white} {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );

    Ok(Arc::new(move |msg: &str, current: u64, total: u64| {
        bar.set_length(total);
        bar.set_position(current);
        bar.set_message(msg.to_string());
    }))
}

pub fn run(args: PackageArgs) -> Result<()> {
    let config = Config::load()?;

    let project_dir = args.proj_dir.clone();
    if !project_dir.exists() {
        anyhow::bail!("Project directory does not exist: {}", project_dir.display());
    }

    let assembly_name = match &args.asm_name {
        Some(name) => name.clone(),
        None => project_dir
            .canonicalize()?
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine assembly name from project directory"))?,
    };

    let build_dir = args
        .proj_out_dir
        .clone()
        .unwrap_or_else(|| project_dir.join("bin").join("Release"));
    let mods_dir = config.packing.mods_dir();
    let archive_path = resolve_output_path(
        args.out_path.as_deref(),
        mods_dir.as_deref(),
        &build_dir,
        &assembly_name,
    );

    let properties = args.properties();

    if args.debug {
        println!("Options:");
        println!("  asmrefs-path: {}", display_opt(&args.asmrefs_path));
        println!("  nugetrefs-path: {}", display_opt(&args.nugetrefs_path));
        println!("  modrefs-path: {}", display_opt(&args.modrefs_path));
        println!("  proj-dir: {}", project_dir.display());
        println!("  proj-out-dir: {}", build_dir.display());
        println!("  asm-name: {}", assembly_name);
        println!("  tml-ver: {}", args.tml_ver);
        println!("  out-path: {}", archive_path.display());
        println!("Properties:");
        for (key, value) in properties.iter() {
            println!("  {}: {}", key, value);
        }
        println!();
    }

    let references = References::load(
        args.modrefs_path.as_deref(),
        args.asmrefs_path.as_deref(),
        args.nugetrefs_path.as_deref(),
    )?;

    println!("Packing {}...", assembly_name);
    println!("  Loader version: {}", args.tml_ver);
    println!(
        "  References: {} mods, {} assemblies, {} packages",
        references.mods.len(),
        references.assemblies.len(),
        references.packages.len()
    );

    let options = PackingOptions::new(
        project_dir,
        build_dir,
        assembly_name,
        args.tml_ver.clone(),
        archive_path,
    )
    .with_properties(properties)
    .with_references(references);

    let bar = ProgressBar::new(0);
    let summary = Packer::new(options)
        .with_config(&config.packing)
        .with_progress(create_progress_callback(bar.clone())?)
        .pack();
    bar.finish_and_clear();
    let summary = summary?;

    if args.debug {
        for (path, decision) in &summary.excluded {
            match decision {
                Decision::Ignored(pattern) => println!("  - {} (ignored by '{}')", path, pattern),
                Decision::Source => println!("  - {} (source file)", path),
                Decision::Include(_) => {}
            }
        }
    }

    let hidden = summary
        .entries
        .iter()
        .filter(|e| e.visibility != Visibility::Normal)
        .count();
    let checksum = super::calculate_checksum(&summary.archive_path)?;

    println!();
    println!("Mod packaged successfully!");
    println!();
    println!("  Output: {}", summary.archive_path.display());
    println!(
        "  Files: {} packed ({} hidden), {} excluded",
        summary.entries.len(),
        hidden,
        summary.excluded.len()
    );
    println!("  Size: {}", super::format_size(summary.size));
    println!("  Checksum: {}", checksum);

    Ok(())
}

/// Work out where the archive goes
///
/// An explicit output that is an existing directory, or ends with a path
/// separator, gets `<assembly>.tmod` appended. Without one, the configured
/// mods directory is used, then the build output directory.
fn resolve_output_path(
    out_path: Option<&Path>,
    mods_dir: Option<&Path>,
    build_dir: &Path,
    assembly_name: &str,
) -> PathBuf {
    let file_name = format!("{}.tmod", assembly_name);

    match out_path {
        Some(out) if out.is_dir() || out.to_string_lossy().ends_with(['/', '\\']) => {
            out.join(file_name)
        }
        Some(out) => out.to_path_buf(),
        None => mods_dir.unwrap_or(build_dir).join(file_name),
    }
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}
