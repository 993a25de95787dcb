use std::io::Write;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_lamport-sim");

fn script_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn prints_history_for_reference_script() {
    let script = script_file("p0: s1 r1 l r1\np1: s0 s2 r0 l s2 s0 l r2\np2: l s1 r1 r1\n");
    let output = Command::new(BIN)
        .arg("-i")
        .arg(script.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("p0: s1@1 r1@2 l@3 r1@7"));
    assert_eq!(lines.next(), Some("p1: s0@1 s2@2 r0@3 l@4 s2@5 s0@6 l@7 r2@8"));
    assert_eq!(lines.next(), Some("p2: l@1 s1@2 r1@3 r1@6"));
    assert_eq!(lines.next(), Some("p0@1 -> p1@3"));
}

#[test]
fn writes_history_to_output_file() {
    let script = script_file("p0: s1\np1: r0\n");
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("history.txt");

    let status = Command::new(BIN)
        .arg("-i")
        .arg(script.path())
        .arg("-o")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        std::fs::read_to_string(out).unwrap(),
        "p0: s1@1\np1: r0@2\np0@1 -> p1@2\n"
    );
}

#[test]
fn reports_script_errors() {
    let script = script_file("p0: x1\n");
    let output = Command::new(BIN)
        .arg("--input")
        .arg(script.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown operation `x1`"), "{stderr}");
}

#[test]
fn liveness_timeout_flag_stops_deadlocked_script() {
    let script = script_file("p0: r1\np1: l\n");
    let output = Command::new(BIN)
        .arg("-i")
        .arg(script.path())
        .arg("--timeout-ms")
        .arg("100")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("liveness timeout"), "{stderr}");
}
