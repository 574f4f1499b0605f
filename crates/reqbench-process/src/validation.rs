//! Command validation utilities.

use reqbench_common::{ProcessError, ProcessResult};

/// Validate a command line before handing it to the OS.
pub fn validate_command(id: &str, command: &[String]) -> ProcessResult<()> {
    let Some(program) = command.first() else {
        return Err(ProcessError::invalid_command(id, "Command cannot be empty"));
    };

    if program.trim().is_empty() {
        return Err(ProcessError::invalid_command(id, "Program name cannot be empty"));
    }

    if program.contains('\0') {
        return Err(ProcessError::invalid_command(id, "Program name contains a NUL byte"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_command() {
        assert!(validate_command("express", &cmd(&["npm", "start"])).is_ok());
    }

    #[test]
    fn test_empty_command() {
        let err = validate_command("express", &[]).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidCommand { .. }));
        assert!(validate_command("express", &cmd(&["  ", "start"])).is_err());
    }
}
