//! End-to-end checks of the analysis pipeline with the fallback adapter:
//! configuration loading, dependency ordering, lint aggregation, and state
//! persistence.

use hdlcheck_builders::BuilderState;
use hdlcheck_common::{CanonPath, ContentHash, Identifier};
use hdlcheck_config::{parse_config, BuilderKind};
use hdlcheck_database::Database;
use hdlcheck_diagnostics::Severity;
use hdlcheck_project::{compile_order, has_errors, PersistedState, Project, CACHE_FILE_NAME};
use std::path::{Path, PathBuf};

fn write_sources(dir: &Path) -> PathBuf {
    std::fs::write(
        dir.join("pkg.vhd"),
        "package util_pkg is\n  constant width : integer := 8;\nend package;\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("body.vhd"),
        "package body util_pkg is\nend package body;\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("top.vhd"),
        "use work.util_pkg.all;\n\
         entity top is\nend top;\n\
         architecture rtl of top is\n  signal dangling : std_logic;\nbegin\nend rtl;\n",
    )
    .unwrap();

    let config = dir.join("project.prj");
    std::fs::write(
        &config,
        "builder = fallback\n\
         vhdl work_lib pkg.vhd\n\
         vhdl work_lib body.vhd\n\
         vhdl work_lib top.vhd\n",
    )
    .unwrap();
    config
}

#[test]
fn lint_and_synthetic_diagnostics_flow_through() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_sources(dir.path());

    let project = Project::new(Some(config)).unwrap();
    let diags = project.messages_for(&dir.path().join("top.vhd"), false);

    assert!(diags
        .iter()
        .any(|d| d.severity == Severity::StyleWarning
            && d.text == "signal 'dangling' is never used"));
    assert!(!has_errors(&diags));
}

#[test]
fn package_and_body_order_before_dependents() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_sources(dir.path());
    let text = std::fs::read_to_string(&config_path).unwrap();
    let config = parse_config(
        &config_path,
        &text,
        ContentHash::from_bytes(text.as_bytes()),
    )
    .unwrap();

    let mut db = Database::new();
    db.accept(&config);
    db.refresh_all();

    let schedule = compile_order(&mut db, &[]);
    assert_eq!(schedule.order.len(), 3);
    assert!(schedule.advisories.is_empty());

    let pos = |name: &str| {
        let path = CanonPath::new(dir.path().join(name));
        schedule.order.iter().position(|p| *p == path).unwrap()
    };
    // The package declares util_pkg; its body and the entity both depend
    // on it and must come later.
    assert!(pos("pkg.vhd") < pos("body.vhd"));
    assert!(pos("pkg.vhd") < pos("top.vhd"));
}

#[test]
fn database_state_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_sources(dir.path());
    let text = std::fs::read_to_string(&config_path).unwrap();
    let config = parse_config(
        &config_path,
        &text,
        ContentHash::from_bytes(text.as_bytes()),
    )
    .unwrap();

    let mut db = Database::new();
    db.accept(&config);
    db.refresh_all();

    let state = PersistedState::new(
        BuilderKind::Ghdl,
        BuilderState::default(),
        Some(config.content_hash),
        db.clone(),
    );
    let file = dir.path().join(CACHE_FILE_NAME);
    state.save(&file).unwrap();

    let loaded = PersistedState::load(&file).unwrap();
    assert_eq!(loaded.database, db);
    assert_eq!(loaded.config_hash, Some(config.content_hash));

    // The rebuilt name index must answer the same queries.
    let mut restored = loaded.database;
    assert_eq!(
        restored.resolve(&Identifier::vhdl("work_lib"), &Identifier::vhdl("util_pkg")),
        db.resolve(&Identifier::vhdl("work_lib"), &Identifier::vhdl("util_pkg"))
    );
    assert_eq!(
        restored
            .dependencies_of(&CanonPath::new(dir.path().join("top.vhd")))
            .len(),
        1
    );
}

#[test]
fn repeated_messages_for_is_idempotent_without_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_sources(dir.path());
    let project = Project::new(Some(config)).unwrap();

    let top = dir.path().join("top.vhd");
    let first = project.messages_for(&top, false);
    let second = project.messages_for(&top, false);
    let third = project.messages_for(&top, true);
    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn full_build_covers_every_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_sources(dir.path());
    let project = Project::new(Some(config)).unwrap();

    let diags = project.run_full_build();
    assert!(!has_errors(&diags));

    let ui = project.ui_messages();
    assert!(ui.iter().any(|m| m.text.contains("build finished")));
    assert!(!ui.iter().any(|m| m.text.contains("missing dependencies")));
}
