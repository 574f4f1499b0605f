//! Process existence checking.

/// Check if a process with the given PID exists.
///
/// On Unix this uses `kill(pid, 0)`, which sends no signal but reports whether
/// the process exists. A zombie that has not been reaped yet still counts as
/// existing; a reaped process does not.
///
/// # Examples
///
/// ```rust,no_run
/// use reqbench_process::process_exists;
///
/// if process_exists(1234) {
///     println!("Process 1234 is still around");
/// }
/// ```
pub fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    match kill(Pid::from_raw(raw), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        // Exists, but belongs to someone else
        Err(nix::errno::Errno::EPERM) => true,
        Err(e) => {
            tracing::debug!("Existence check for PID {} failed: {}", pid, e);
            false
        }
    }
}
