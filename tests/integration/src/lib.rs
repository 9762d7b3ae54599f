//! End-to-end tests for the `crypt` binary.
//!
//! The binary is spawned with piped stdio, so every test exercises the
//! non-terminal input path. Build it first with `cargo build -p crypt-cli`.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Locates the `crypt` binary in the workspace target directory.
pub fn find_crypt_binary() -> Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let root = Path::new(&manifest_dir).join("../..");

    let candidates = [
        root.join("target/debug/crypt"),
        root.join("target/release/crypt"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.canonicalize()?);
        }
    }

    bail!(
        "Could not find crypt binary. Run 'cargo build -p crypt-cli' first. Searched in: {:?}",
        candidates
    )
}

/// A `crypt` command with `args` and piped stdio, ready to spawn.
pub fn crypt_command(args: &[&str]) -> Result<Command> {
    let mut command = Command::new(find_crypt_binary()?);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    Ok(command)
}

/// Starts `crypt` with `args` and piped stdio.
pub fn spawn_crypt(args: &[&str]) -> Result<Child> {
    crypt_command(args)?
        .spawn()
        .context("Failed to start crypt")
}

/// Runs `crypt` to completion with `input` on stdin.
pub fn run_crypt(args: &[&str], input: &[u8]) -> Result<Output> {
    let mut child = spawn_crypt(args)?;
    {
        let mut stdin = child.stdin.take().context("stdin not captured")?;
        stdin.write_all(input).context("Failed to write stdin")?;
    }
    child.wait_with_output().context("Failed to wait for crypt")
}

/// `Hash: ` lines from captured stdout, without the label.
pub fn hash_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.strip_prefix("Hash: "))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::os::unix::process::{CommandExt, ExitStatusExt};
    use std::thread;
    use std::time::Duration;

    fn stderr(output: &Output) -> String {
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    #[test]
    fn test_empty_input_exits_cleanly() {
        let output = run_crypt(&["$2b$", "4"], b"").unwrap();
        assert!(output.status.success());
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_bcrypt_hash_line() {
        let output = run_crypt(&["$2b$", "4"], b"hunter2\n").unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let hashes = hash_lines(&output);
        assert_eq!(hashes.len(), 1);
        assert!(hashes[0].starts_with("$2b$04$"));
        assert_eq!(hashes[0].len(), 60);
    }

    #[test]
    fn test_default_algorithm_is_argon2id() {
        let output = run_crypt(&[], b"hunter2\n").unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let hashes = hash_lines(&output);
        assert_eq!(hashes.len(), 1);
        assert!(hashes[0].starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_each_line_gets_its_own_salt() {
        let output = run_crypt(&["$2b$", "4"], b"same\nsame\n").unwrap();

        let hashes = hash_lines(&output);
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_empty_line_stops_reading() {
        let output = run_crypt(&["$2b$", "4"], b"first\n\nsecond\n").unwrap();

        assert!(output.status.success());
        assert_eq!(hash_lines(&output).len(), 1);
    }

    #[test]
    fn test_control_character_rejected() {
        let output = run_crypt(&["$2b$", "4"], b"bad\x07bell\ngood\n").unwrap();

        assert!(output.status.success());
        assert_eq!(hash_lines(&output).len(), 1);
        assert!(stderr(&output).contains("error: control character 0x07 in password"));
    }

    #[test]
    fn test_invalid_rounds_exit_1() {
        let output = run_crypt(&["$2b$", "twelve"], b"").unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_out_of_range_cost_is_fatal() {
        let output = run_crypt(&["$2b$", "99"], b"hunter2\n").unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(hash_lines(&output).is_empty());
        assert!(stderr(&output).starts_with("fatal: "));
    }

    #[test]
    fn test_unsupported_prefix_is_fatal() {
        let output = run_crypt(&["$1$"], b"hunter2\n").unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("unsupported hash prefix"));
    }

    #[test]
    fn test_help_exits_0() {
        let output = run_crypt(&["--help"], b"").unwrap();

        assert!(output.status.success());
        let usage = String::from_utf8_lossy(&output.stdout);
        assert!(usage.contains("Example session"));
        assert!(usage.contains("<prefix>"));
    }

    #[test]
    fn test_sigterm_while_waiting_for_input() {
        let mut child = spawn_crypt(&["$2b$", "4"]).unwrap();
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"partial").unwrap();
        stdin.flush().unwrap();

        thread::sleep(Duration::from_millis(300));
        let pid = libc::pid_t::try_from(child.id()).unwrap();
        // SAFETY: `pid` is our own live child process.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        assert_eq!(rc, 0);

        let output = child.wait_with_output().unwrap();
        drop(stdin);

        assert_eq!(output.status.signal(), Some(libc::SIGTERM));
        assert!(hash_lines(&output).is_empty());
    }

    #[test]
    fn test_signal_ignored_by_parent_stays_ignored() {
        let mut command = crypt_command(&["$2b$", "4"]).unwrap();
        // SAFETY: only async-signal-safe `signal` runs between fork and exec.
        unsafe {
            command.pre_exec(|| {
                libc::signal(libc::SIGINT, libc::SIG_IGN);
                Ok(())
            });
        }
        let mut child = command.spawn().unwrap();

        thread::sleep(Duration::from_millis(300));
        let pid = libc::pid_t::try_from(child.id()).unwrap();
        // SAFETY: `pid` is our own live child process.
        let rc = unsafe { libc::kill(pid, libc::SIGINT) };
        assert_eq!(rc, 0);

        {
            let mut stdin = child.stdin.take().unwrap();
            stdin.write_all(b"hunter2\n").unwrap();
        }
        let output = child.wait_with_output().unwrap();

        assert!(output.status.success(), "status: {:?}", output.status);
        assert_eq!(hash_lines(&output).len(), 1);
    }
}
