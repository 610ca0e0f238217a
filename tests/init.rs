use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prlens"))
        .arg("init")
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "prlens init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".prlens.toml");
    assert!(config_path.exists(), ".prlens.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[github]"));
    assert!(content.contains("[llm]"));
    assert!(content.contains("[server]"));

    let config: prlens_core::PrLensConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.llm.model, "gpt-4-turbo");
    assert!(config.github.token.is_none());
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".prlens.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prlens"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".prlens.toml")).unwrap(),
        "# existing"
    );
}

#[test]
fn analyze_without_token_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prlens"))
        .args(["analyze", "https://github.com/acme/widgets/pull/1"])
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("LLM_API_KEY")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("GITHUB_TOKEN"));
}
