//! Signal delivery primitives.
//!
//! Children are spawned as leaders of their own process group, so signals are
//! sent to the whole group. Wrapper tools like `npm start` or `poetry run`
//! fork the real server; signalling only the leader would orphan it.

use std::io;

/// Send the cooperative interrupt (SIGINT) to the process group led by `pid`.
pub fn send_interrupt(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        signal_group(pid, nix::sys::signal::Signal::SIGINT)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "graceful interrupt is only supported on Unix",
        ))
    }
}

/// Send SIGKILL to the process group led by `pid`.
pub fn force_kill(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process group kill is only supported on Unix",
        ))
    }
}

/// Whether a signalling error only means the target is already gone.
pub fn is_already_gone(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        error.raw_os_error() == Some(nix::errno::Errno::ESRCH as i32)
    }

    #[cfg(not(unix))]
    {
        error.kind() == io::ErrorKind::NotFound
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid PID: {}", pid)))?;
    if raw <= 0 {
        // killpg(0) would hit our own group
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid PID: {}", pid),
        ));
    }

    killpg(Pid::from_raw(raw), signal).map_err(io::Error::from)
}
