// Signal exiter, standalone and in-process

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

fn exit_code_after(signal: Signal) -> Option<i32> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dmode"))
        .arg("exiter")
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "ready");

    kill(Pid::from_raw(child.id() as i32), signal).unwrap();
    child.wait().unwrap().code()
}

#[test]
fn test_sigterm_exits_zero() {
    assert_eq!(exit_code_after(Signal::SIGTERM), Some(0));
}

#[test]
fn test_sigint_exits_zero() {
    assert_eq!(exit_code_after(Signal::SIGINT), Some(0));
}

#[test]
fn test_sigquit_exits_zero() {
    assert_eq!(exit_code_after(Signal::SIGQUIT), Some(0));
}

#[test]
fn test_sighup_exits_one() {
    assert_eq!(exit_code_after(Signal::SIGHUP), Some(1));
}

#[test]
fn test_next_signal_in_process() {
    let mut exiter = dmode::SigExiter::install().unwrap();

    kill(Pid::this(), Signal::SIGHUP).unwrap();
    assert_eq!(exiter.next_signal(), Some(Signal::SIGHUP));
}
