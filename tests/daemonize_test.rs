// End-to-end daemonization through the dmode binary

use dmode::daemon::ROLE_ENV;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{getsid, Pid};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(15);

/// One "<pid> <role> <sid>" line written by a worker
#[derive(Debug)]
struct WorkerLine {
    pid: Pid,
    role: String,
    sid: Pid,
}

fn dmode() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dmode"));
    command.env_remove(ROLE_ENV);
    command
}

fn wait_for<F: FnMut() -> bool>(mut condition: F) -> bool {
    let started = Instant::now();
    while started.elapsed() < WAIT {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    false
}

fn workers(state_file: &Path) -> Vec<WorkerLine> {
    let Ok(content) = fs::read_to_string(state_file) else {
        return Vec::new();
    };

    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return None;
            }
            Some(WorkerLine {
                pid: Pid::from_raw(fields[0].parse().ok()?),
                role: fields[1].to_string(),
                sid: Pid::from_raw(fields[2].parse().ok()?),
            })
        })
        .collect()
}

fn supervisor_pid(pid_file: &Path) -> Pid {
    let content = fs::read_to_string(pid_file).unwrap();
    Pid::from_raw(content.lines().next().unwrap().parse().unwrap())
}

#[test]
fn test_supervised_worker_stops_cleanly_on_sigterm() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("dmode.pid");
    let state_file = temp_dir.path().join("state");

    let status = dmode()
        .arg("run")
        .arg("--pid-file")
        .arg(&pid_file)
        .arg("--state-file")
        .arg(&state_file)
        .arg("--restart-delay-ms")
        .arg("100")
        .arg("--repeat-daemonize")
        .status()
        .unwrap();
    assert!(status.success(), "launcher exited with {:?}", status);

    assert!(wait_for(|| workers(&state_file).len() == 1));
    assert!(wait_for(|| pid_file.exists()));

    let supervisor = supervisor_pid(&pid_file);
    let worker = &workers(&state_file)[0];
    assert_eq!(worker.role, "worker");
    assert_ne!(worker.pid, supervisor);

    // Both left the test's session
    let own_session = getsid(None).unwrap();
    assert_ne!(worker.sid, own_session);
    assert_eq!(getsid(Some(supervisor)).unwrap(), supervisor);

    let comment = fs::read_to_string(&pid_file).unwrap();
    assert!(comment.lines().nth(1).unwrap().starts_with("# "));
    assert!(comment.contains("--repeat-daemonize"));

    // SIGTERM is relayed, the worker exits 0, the supervisor cleans up
    kill(supervisor, Signal::SIGTERM).unwrap();
    assert!(wait_for(|| !pid_file.exists()), "PID file was not removed");
    assert_eq!(workers(&state_file).len(), 1);
}

#[test]
fn test_sighup_restarts_worker() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("dmode.pid");
    let state_file = temp_dir.path().join("state");

    let status = dmode()
        .arg("run")
        .arg("--pid-file")
        .arg(&pid_file)
        .arg("--state-file")
        .arg(&state_file)
        .arg("--restart-delay-ms")
        .arg("100")
        .status()
        .unwrap();
    assert!(status.success());

    assert!(wait_for(|| workers(&state_file).len() == 1 && pid_file.exists()));
    let supervisor = supervisor_pid(&pid_file);

    // The worker exits 1 on SIGHUP, which asks for a restart
    kill(supervisor, Signal::SIGHUP).unwrap();
    assert!(wait_for(|| workers(&state_file).len() == 2));

    let lines = workers(&state_file);
    assert_ne!(lines[0].pid, lines[1].pid);
    assert!(pid_file.exists());
    assert_eq!(supervisor_pid(&pid_file), supervisor);

    kill(supervisor, Signal::SIGTERM).unwrap();
    assert!(wait_for(|| !pid_file.exists()));
}

#[test]
fn test_killed_worker_is_respawned() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("dmode.toml");
    let pid_file = temp_dir.path().join("dmode.pid");
    let state_file = temp_dir.path().join("state");

    // Options from a config file; the long delay must not apply to signal deaths
    fs::write(
        &config_file,
        format!(
            "pid_file = \"{}\"\nrestart_delay_ms = 60000\n",
            pid_file.display()
        ),
    )
    .unwrap();

    let status = dmode()
        .arg("run")
        .arg("--config")
        .arg(&config_file)
        .arg("--state-file")
        .arg(&state_file)
        .status()
        .unwrap();
    assert!(status.success());

    assert!(wait_for(|| workers(&state_file).len() == 1 && pid_file.exists()));
    let supervisor = supervisor_pid(&pid_file);

    kill(workers(&state_file)[0].pid, Signal::SIGKILL).unwrap();
    assert!(wait_for(|| workers(&state_file).len() == 2));
    assert!(pid_file.exists());

    kill(supervisor, Signal::SIGTERM).unwrap();
    assert!(wait_for(|| !pid_file.exists()));
}

#[test]
fn test_nonzero_exit_keeps_restarting() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("dmode.pid");
    let state_file = temp_dir.path().join("state");

    let status = dmode()
        .arg("run")
        .arg("--pid-file")
        .arg(&pid_file)
        .arg("--state-file")
        .arg(&state_file)
        .arg("--restart-delay-ms")
        .arg("100")
        .arg("--exit-code")
        .arg("3")
        .arg("--lifetime-ms")
        .arg("20")
        .status()
        .unwrap();
    assert!(status.success());

    assert!(wait_for(|| workers(&state_file).len() >= 3));
    assert!(pid_file.exists());
    let supervisor = supervisor_pid(&pid_file);

    // An unclean stop leaves the PID file behind
    kill(supervisor, Signal::SIGKILL).unwrap();
    thread::sleep(Duration::from_millis(200));
    assert!(pid_file.exists());
}

#[test]
fn test_no_restart_backgrounds_worker_only() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("dmode.pid");
    let state_file = temp_dir.path().join("state");

    let status = dmode()
        .arg("run")
        .arg("--no-restart")
        .arg("--pid-file")
        .arg(&pid_file)
        .arg("--state-file")
        .arg(&state_file)
        .status()
        .unwrap();
    assert!(status.success());

    assert!(wait_for(|| workers(&state_file).len() == 1));
    let worker = &workers(&state_file)[0];
    assert_eq!(worker.role, "worker");

    // The worker leads its own session and no supervisor wrote a PID file
    assert_eq!(worker.sid, worker.pid);
    assert!(!pid_file.exists());

    kill(worker.pid, Signal::SIGTERM).unwrap();
}

#[test]
fn test_invalid_config_file_fails_in_foreground() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("dmode.yaml");
    fs::write(&config_file, "pid_file: /tmp/x.pid\n").unwrap();

    let output = dmode()
        .arg("run")
        .arg("--config")
        .arg(&config_file)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported file format"));
}

/// Run a short-lived worker with the caller's output piped; returns the
/// captured stdout and stderr
fn run_short_worker(keep_stderr: bool) -> (String, String) {
    let temp_dir = TempDir::new().unwrap();
    let state_file = temp_dir.path().join("state");

    let mut command = dmode();
    command
        .env("RUST_LOG", "info")
        .arg("run")
        .arg("--no-restart")
        .arg("--exit-code")
        .arg("0")
        .arg("--lifetime-ms")
        .arg("200")
        .arg("--state-file")
        .arg(&state_file);
    if keep_stderr {
        command.arg("--keep-stderr");
    }

    let output = command.output().unwrap();
    assert!(output.status.success());

    assert!(wait_for(|| workers(&state_file).len() == 1));

    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn test_keep_stderr_attaches_worker_stderr() {
    let (stdout, stderr) = run_short_worker(true);

    assert!(stderr.contains("Worker exiting with status 0"), "stderr: {}", stderr);
    assert!(stdout.is_empty());
}

#[test]
fn test_worker_stderr_is_discarded_by_default() {
    let (stdout, stderr) = run_short_worker(false);

    assert!(!stderr.contains("Worker exiting"), "stderr: {}", stderr);
    assert!(stdout.is_empty());
}
