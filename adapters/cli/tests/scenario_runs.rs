use std::process::Command;

#[test]
fn bundled_scenario_runs_to_completion() {
    let scenario = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/ambush.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_tile-skirmish"))
        .args(["--scenario", scenario, "--ticks", "12", "--frame-ms", "250"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch tile-skirmish");

    assert!(output.status.success(), "tile-skirmish exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("distance maps built"), "unexpected output {stdout}");
    assert!(stdout.contains("player at"), "unexpected output {stdout}");
}

#[test]
fn missing_scenario_fails() {
    let status = Command::new(env!("CARGO_BIN_EXE_tile-skirmish"))
        .args(["--scenario", "does-not-exist.toml"])
        .env("RUST_LOG", "off")
        .status()
        .expect("failed to launch tile-skirmish");

    assert!(!status.success());
}
