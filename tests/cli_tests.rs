
use assert_cmd::Command;
use collate::{ModArchive, Visibility};
use predicates::prelude::*;
use std::fs;
use test_utils::{TestMod, ASSEMBLY};

/// Helper to get the binary command
fn collate_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_collate"))
}

/// `package` with the required properties, isolated from the user's config
fn package_cmd(project: &TestMod) -> Command {
    let mut cmd = collate_cmd();
    cmd.env("COLLATE_CONFIG_DIR", &project.config_dir)
        .arg("package")
        .arg("-p")
        .arg(&project.project_dir)
        .args(["--tml-ver", "2024.5.3.0"])
        .args(["--display-name", "Test Mod"])
        .args(["--author", "Tester"])
        .args(["--mod-version", "1.2.3"])
        .args(["--mod-side", "Both"]);
    cmd
}

#[test]
fn test_package_defaults_to_build_output() {
    let project = TestMod::with_typical_output();

    package_cmd(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mod packaged successfully!"))
        .stdout(predicate::str::contains("Checksum:"));

    let archive_path = project.build_dir.join(format!("{}.tmod", ASSEMBLY));
    let archive = ModArchive::open(&archive_path).unwrap();
    assert_eq!(archive.header().mod_name, ASSEMBLY);
    assert_eq!(archive.entries().len(), 5);
}

#[test]
fn test_package_to_directory() {
    let project = TestMod::with_typical_output();
    let out_dir = project.path().join("mods");
    fs::create_dir_all(&out_dir).unwrap();

    package_cmd(&project)
        .arg("--out-path")
        .arg(&out_dir)
        .args(["--hide-code", "True", "--build-ignore", "*.pdb"])
        .assert()
        .success();

    let archive = ModArchive::open(out_dir.join("TestMod.tmod")).unwrap();
    assert!(archive.entry("TestMod.pdb").is_none());
    assert_eq!(
        archive.entry("TestMod.dll").unwrap().visibility,
        Visibility::HiddenCode
    );
}

#[test]
fn test_package_uses_configured_mods_dir() {
    let project = TestMod::new();
    let mods_dir = project.path().join("ModLoader").join("Mods");
    fs::create_dir_all(&mods_dir).unwrap();
    fs::write(
        project.config_dir.join("config.toml"),
        format!("[packing]\nmods_dir = {:?}\n", mods_dir.to_string_lossy()),
    )
    .unwrap();

    package_cmd(&project).assert().success();

    assert!(mods_dir.join("TestMod.tmod").is_file());
}

#[test]
fn test_package_with_reference_lists() {
    let project = TestMod::new();
    let modrefs = project.write_refs("modrefs.txt", "CalamityMod;2.0;false\n");
    let out = project.archive_path();

    package_cmd(&project)
        .arg("--modrefs-path")
        .arg(&modrefs)
        .arg("--out-path")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("References: 1 mods"));

    let archive = ModArchive::open(&out).unwrap();
    assert_eq!(archive.metadata().references.mods[0].name, "CalamityMod");
}

#[test]
fn test_package_missing_property_fails() {
    let project = TestMod::new();

    collate_cmd()
        .env("COLLATE_CONFIG_DIR", &project.config_dir)
        .arg("package")
        .arg("-p")
        .arg(&project.project_dir)
        .args(["--tml-ver", "2024.5.3.0"])
        .args(["--author", "Tester", "--mod-version", "1.0", "--mod-side", "Both"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("displayName"));

    assert!(!project.build_dir.join("TestMod.tmod").exists());
}

#[test]
fn test_package_rejects_bad_flag() {
    let project = TestMod::new();

    package_cmd(&project)
        .args(["--hide-code", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected true or false"));
}

#[test]
fn test_package_debug_lists_options() {
    let project = TestMod::new();

    package_cmd(&project)
        .arg("--debug")
        .assert()
        .success()
        .stdout(predicate::str::contains("asm-name: TestMod"))
        .stdout(predicate::str::contains("displayName: Test Mod"));
}

#[test]
fn test_inspect_json() {
    let project = TestMod::with_typical_output();
    package_cmd(&project).assert().success();
    let archive_path = project.build_dir.join("TestMod.tmod");

    let output = collate_cmd()
        .arg("inspect")
        .arg(&archive_path)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["header"]["mod_name"], "TestMod");
    assert_eq!(report["metadata"]["properties"]["displayName"], "Test Mod");
    assert_eq!(report["entries"].as_array().unwrap().len(), 5);
}

#[test]
fn test_inspect_text() {
    let project = TestMod::with_typical_output();
    package_cmd(&project).assert().success();

    collate_cmd()
        .arg("inspect")
        .arg(project.build_dir.join("TestMod.tmod"))
        .assert()
        .success()
        .stdout(predicate::str::contains("TestMod v1.2.3"))
        .stdout(predicate::str::contains("Localization/en-US.hjson"));
}

#[test]
fn test_inspect_rejects_garbage() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let bogus = temp_dir.path().join("bogus.tmod");
    fs::write(&bogus, b"definitely not an archive").unwrap();

    collate_cmd()
        .arg("inspect")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_extract() {
    let project = TestMod::with_typical_output();
    package_cmd(&project).assert().success();
    let dest = project.path().join("extracted");

    collate_cmd()
        .arg("extract")
        .arg(project.build_dir.join("TestMod.tmod"))
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted 5 files"));

    for name in ["icon.png", "Localization/en-US.hjson", "TestMod.dll"] {
        assert_eq!(
            fs::read(dest.join(name)).unwrap(),
            fs::read(project.build_dir.join(name)).unwrap(),
            "{}",
            name
        );
    }
}

#[test]
fn test_config_set_and_show() {
    let project = TestMod::new();

    collate_cmd()
        .env("COLLATE_CONFIG_DIR", &project.config_dir)
        .args(["config", "set", "packing.compression_level", "9"])
        .assert()
        .success();

    let saved = fs::read_to_string(project.config_dir.join("config.toml")).unwrap();
    assert!(saved.contains("compression_level = 9"));

    collate_cmd()
        .env("COLLATE_CONFIG_DIR", &project.config_dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compression_level = 9"));
}

#[test]
fn test_config_set_unknown_key() {
    let project = TestMod::new();

    collate_cmd()
        .env("COLLATE_CONFIG_DIR", &project.config_dir)
        .args(["config", "set", "registry.url", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_completions() {
    collate_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("collate"));
}
