//! End-to-end tests for the reqbench binary.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

fn reqbench() -> Command {
    Command::new(env!("CARGO_BIN_EXE_reqbench"))
}

fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("reqbench.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Run to completion, failing the test instead of hanging.
fn run_bounded(mut command: Command, timeout: Duration) -> Output {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn reqbench");

    match child.wait_timeout(timeout).unwrap() {
        Some(_) => child.wait_with_output().unwrap(),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            panic!("reqbench did not finish within {:?}", timeout);
        }
    }
}

fn process_alive(pid: i32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

fn read_pid(path: &Path) -> i32 {
    std::fs::read_to_string(path).unwrap().trim().parse().unwrap()
}

fn wait_for_file(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        assert!(start.elapsed() < timeout, "{} was not created", path.display());
        thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn test_report_for_all_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
benchmark:
  title: Shell Benchmark
  description:
    - Pairs a sleeping server with a few shell testers.
  test_timeout: 1s
  shutdown_grace: 500ms
  parameters:
    NUM_TESTS: "3"
servers:
  - name: sleepy_server
    command: [sh, -c, "exec sleep 30"]
testers:
  - name: quick_tester
    command: [sh, -c, "[ \"$NUM_TESTS\" = 3 ]"]
  - name: failing_tester
    command: [sh, -c, "exit 3"]
  - name: slow_tester
    command: [sh, -c, "exec sleep 10"]
pairings:
  - matrix:
      servers: [sleepy_server]
      testers: [quick_tester, failing_tester, slow_tester]
"#,
    );

    let mut command = reqbench();
    command.arg("--config").arg(&config);
    let output = run_bounded(command, Duration::from_secs(20));

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines[0], "# Shell Benchmark");
    assert!(stdout.contains("Pairs a sleeping server with a few shell testers."));
    assert!(stdout.contains("This page was last updated at "));
    assert!(stdout.contains("| --------: |"));

    let rows: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with("| Sleepy server")).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains("| Quick tester "));
    assert!(!rows[0].contains("Error"));
    assert!(rows[1].ends_with("| Error     |"));
    assert!(rows[2].ends_with("| Timeout (1 s) |"));
    assert!(!stdout.contains("Aborted"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut command = reqbench();
    command.arg("--config").arg(dir.path().join("missing.yaml"));

    let output = run_bounded(command, Duration::from_secs(10));

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read config file"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
servers:
  - name: server
    command: [sleep, "30"]
testers:
  - name: tester
    command: ["true"]
pairings:
  - server: server
    tester: unknown_tester
"#,
    );
    let mut command = reqbench();
    command.arg("--config").arg(&config);

    let output = run_bounded(command, Duration::from_secs(10));

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown tester: unknown_tester"));
}

#[test]
fn test_progress_line_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
servers:
  - name: sleepy_server
    command: [sh, -c, "exec sleep 30"]
testers:
  - name: half_second_tester
    command: [sleep, "0.5"]
pairings:
  - server: sleepy_server
    tester: half_second_tester
"#,
    );
    let mut command = reqbench();
    command.arg("--progress").arg("--config").arg(&config);

    let output = run_bounded(command, Duration::from_secs(10));

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\x1b[33m| Sleepy server"));
    assert!(stderr.contains('\r'));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains('\x1b'));
    assert!(stdout.contains("| Half second tester "));
}

#[test]
fn test_interrupt_aborts_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let server_pid = dir.path().join("server.pid");
    let tester_pid = dir.path().join("tester.pid");
    let config = write_config(
        dir.path(),
        &format!(
            r#"
benchmark:
  test_timeout: 60s
servers:
  - name: sleepy_server
    command: [sh, -c, "echo $$ > {server}; exec sleep 60"]
testers:
  - name: stuck_tester
    command: [sh, -c, "echo $$ > {tester}; exec sleep 60"]
  - name: never_run
    command: ["true"]
pairings:
  - matrix:
      servers: [sleepy_server]
      testers: [stuck_tester, never_run]
"#,
            server = server_pid.display(),
            tester = tester_pid.display()
        ),
    );

    let mut child = reqbench()
        .arg("--config")
        .arg(&config)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    wait_for_file(&tester_pid, Duration::from_secs(5));
    thread::sleep(Duration::from_millis(200));
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(child.id() as i32),
        nix::sys::signal::Signal::SIGINT,
    )
    .unwrap();

    let status = match child.wait_timeout(Duration::from_secs(10)).unwrap() {
        Some(status) => status,
        None => {
            let _ = child.kill();
            panic!("reqbench ignored the interrupt");
        }
    };
    let output = child.wait_with_output().unwrap();

    assert_eq!(status.code(), Some(130));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("| Aborted   |"));
    assert!(stdout.ends_with("\nAborted\n"));
    assert!(!stdout.contains("Never run"));

    assert!(!process_alive(read_pid(&server_pid)));
    assert!(!process_alive(read_pid(&tester_pid)));
}

#[test]
fn test_second_interrupt_exits_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let tester_pid = dir.path().join("tester.pid");
    let config = write_config(
        dir.path(),
        &format!(
            r#"
benchmark:
  test_timeout: 60s
  shutdown_grace: 30s
servers:
  - name: sleepy_server
    command: [sh, -c, "exec sleep 60"]
testers:
  - name: deaf_tester
    command: [sh, -c, "trap '' INT; echo $$ > {tester}; exec sleep 60"]
pairings:
  - server: sleepy_server
    tester: deaf_tester
"#,
            tester = tester_pid.display()
        ),
    );

    let mut child = reqbench()
        .arg("--config")
        .arg(&config)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let reqbench_pid = nix::unistd::Pid::from_raw(child.id() as i32);

    wait_for_file(&tester_pid, Duration::from_secs(5));
    thread::sleep(Duration::from_millis(200));
    nix::sys::signal::kill(reqbench_pid, nix::sys::signal::Signal::SIGINT).unwrap();
    thread::sleep(Duration::from_millis(300));
    assert!(child.try_wait().unwrap().is_none(), "first interrupt should wait out the grace period");
    nix::sys::signal::kill(reqbench_pid, nix::sys::signal::Signal::SIGINT).unwrap();

    let status = child.wait_timeout(Duration::from_secs(5)).unwrap();

    // The deaf tester outlives an immediate exit.
    let tester = nix::unistd::Pid::from_raw(read_pid(&tester_pid));
    let _ = nix::sys::signal::killpg(tester, nix::sys::signal::Signal::SIGKILL);

    match status {
        Some(status) => assert_eq!(status.code(), Some(130)),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            panic!("reqbench ignored the second interrupt");
        }
    }
}
