//! Unit tests for CLI commands

use crate::cli::{explain_class, summarize, weave_inputs, Cli, Commands, WeaveInputs};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

const MANIFEST: &str = r#"
classes:
  - name: Acme::PostRepository
    methods:
      - { name: add }
      - { name: remove }
  - name: Acme::Unrelated
    methods: [{ name: run }]
  - name: Acme::LogAspect
    tags: [aspect]
    methods:
      - name: trace
        advice:
          - before: "method(Acme::PostRepository->add())"
      - name: when_enabled
        advice:
          - pointcut: "setting(audit.enabled)"
      - name: audit
        advice:
          - after: "method(Acme::PostRepository->remove()) && Acme::LogAspect->when_enabled"
"#;

fn inputs(dir: &tempfile::TempDir, settings: Option<&str>) -> WeaveInputs {
    let manifest = dir.path().join("classes.yaml");
    fs::write(&manifest, MANIFEST).unwrap();
    let settings = settings.map(|content| {
        let path = dir.path().join("settings.yaml");
        fs::write(&path, content).unwrap();
        path
    });
    WeaveInputs {
        manifest,
        settings,
        config: None,
    }
}

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "aopweave",
        "generate",
        "--manifest",
        "classes.yaml",
        "--output",
        "out",
        "--force",
        "--dry-run",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate {
            inputs,
            output,
            force,
            dry_run,
        } => {
            assert_eq!(inputs.manifest, PathBuf::from("classes.yaml"));
            assert_eq!(output, PathBuf::from("out"));
            assert!(force);
            assert!(dry_run);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_explain_requires_class() {
    assert!(Cli::try_parse_from(["aopweave", "explain", "--manifest", "classes.yaml"]).is_err());
    let cli = Cli::try_parse_from([
        "aopweave",
        "-v",
        "explain",
        "--manifest",
        "classes.yaml",
        "--class",
        "Acme::PostRepository",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert!(matches!(
        cli.command,
        Commands::Explain { class, .. } if class == "Acme::PostRepository"
    ));
}

#[test]
fn test_check_reports_proxies() {
    let dir = tempfile::tempdir().unwrap();
    let context = weave_inputs(&inputs(&dir, None)).unwrap();
    let report = summarize(&context);
    assert!(report.starts_with("✅ Weave OK: 1 aspect(s), 2 target class(es), 1 proxy(ies)"));
    assert!(report.contains("Acme::PostRepository -> Acme::PostRepositoryAopProxy"));
}

#[test]
fn test_explain_follows_settings() {
    let dir = tempfile::tempdir().unwrap();

    let context = weave_inputs(&inputs(&dir, Some("audit:\n  enabled: true\n"))).unwrap();
    let text = explain_class(&context, "Acme::PostRepository").unwrap();
    assert!(text.contains("  add [advised] declared by Acme::PostRepository"));
    assert!(text.contains("    before          Acme::LogAspect::trace"));
    assert!(text.contains("  remove [advised]"));
    assert!(text.contains("    after           Acme::LogAspect::audit"));

    let context = weave_inputs(&inputs(&dir, Some("audit:\n  enabled: false\n"))).unwrap();
    let text = explain_class(&context, "Acme::PostRepository").unwrap();
    assert!(text.contains("  remove [passthrough]"));

    assert_eq!(
        explain_class(&context, "Acme::Unrelated").unwrap(),
        "Acme::Unrelated is not woven\n"
    );
    assert!(explain_class(&context, "Acme::LogAspect").is_err());
}

#[test]
fn test_missing_manifest_is_reported_with_path() {
    let err = weave_inputs(&WeaveInputs {
        manifest: PathBuf::from("/nonexistent/classes.yaml"),
        settings: None,
        config: None,
    })
    .unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/classes.yaml"));
}
