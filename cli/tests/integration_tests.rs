use std::fs;
use std::process::{Command, Output};

fn run_demo(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_farg-demo"))
        .args(args)
        .env_remove("FARG_DEMO_CONFIG")
        .output()
        .expect("failed to run farg-demo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Successful runs
// ---------------------------------------------------------------------------

#[test]
fn text_report_uses_defaults() {
    let out = run_demo(&["eth2"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("interface: eth2"));
    assert!(text.contains("type: eth"));
    assert!(text.contains("number: 2"));
    assert!(text.contains("mtu: 1500"));
    assert!(text.contains("mode: access"));
    assert!(!text.contains("weight"));
}

#[test]
fn json_report_reflects_options() {
    let out = run_demo(&[
        "--format=json",
        "-m9000",
        "--mo",
        "tr",
        "--weight",
        "0.25",
        "-vv",
        "agg7",
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["interface"], "agg7");
    assert_eq!(report["interface_type"], "agg");
    assert_eq!(report["interface_number"], "7");
    assert_eq!(report["mtu"], 9000);
    assert_eq!(report["mode"], "trunk");
    assert_eq!(report["weight"], 0.25);
    assert_eq!(report["verbosity"], 2);
}

#[test]
fn output_file_receives_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");

    let out = run_demo(&["-o", path.to_str().unwrap(), "eth0"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).is_empty());
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("interface: eth0"));
}

#[test]
fn dry_run_leaves_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    fs::write(&path, "previous report\n").unwrap();

    let out = run_demo(&["-n", "--output", path.to_str().unwrap(), "eth1"]);

    assert!(out.status.success());
    assert!(stderr(&out).contains("dry run"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous report\n");
}

#[test]
fn dry_run_creates_no_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");

    let out = run_demo(&["-n", "-o", path.to_str().unwrap(), "eth1"]);

    assert!(out.status.success());
    assert!(!path.exists());
}

#[test]
fn unwritable_output_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.txt");

    let out = run_demo(&["-o", path.to_str().unwrap(), "eth1"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Failed to open"));
}

#[test]
fn help_prints_usage() {
    let out = run_demo(&["--help"]);

    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.starts_with("usage: farg-demo [<interface>]"));
    assert!(text.contains("[--mtu <the MTU>]"));
    assert!(text.contains("[--verbose*]"));
    assert!(!text.contains("--help"));
}

#[test]
fn config_file_enables_pass_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("parser.yaml");
    fs::write(&config, "unused_tokens: pass_back\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_farg-demo"))
        .args(["--format", "json", "eth3", "extra"])
        .env("FARG_DEMO_CONFIG", &config)
        .output()
        .expect("failed to run farg-demo");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["leftover"], serde_json::json!(["extra"]));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn rejects_out_of_range_mtu() {
    let out = run_demo(&["--mtu", "100", "eth0"]);

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("error: the value '100' given for the MTU is not valid"));
    assert!(err.contains("576 to 9216"));
}

#[test]
fn rejects_bad_interface() {
    let out = run_demo(&["ether"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("the interface type must be eth or agg"));

    let out = run_demo(&["eth"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("eth must be followed by a number"));
}

#[test]
fn enforces_groups() {
    let out = run_demo(&["-v", "--quiet", "eth0"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("please don't specify more than 1 of"));

    let out = run_demo(&["--weight", "0.5", "eth0"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("can only be specified together with the --mode option"));
}

#[test]
fn requires_interface() {
    let out = run_demo(&["--mtu", "1500"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("an interface name is required"));
}

#[test]
fn reports_unknown_option() {
    let out = run_demo(&["--frobnicate", "eth0"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out).trim_end(), "error: there is no --frobnicate option");
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_farg-demo"))
        .arg("eth0")
        .env("FARG_DEMO_CONFIG", dir.path().join("absent.yaml"))
        .output()
        .expect("failed to run farg-demo");

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Failed to load parser config"));
}
