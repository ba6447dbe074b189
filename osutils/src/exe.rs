use std::{
    io,
    os::unix::process::ExitStatusExt,
    process::{Command, Output},
};

use log::trace;

use crate::{crate_private::Sealed, evidence::EvidenceError};

/// Extension for `std::process::Output` to check the exit status and get stdout.
/// This is a sealed trait, so it cannot be implemented outside of this crate.
pub trait OutputChecker: Sealed {
    /// Check if the process exited successfully
    fn is_success(&self) -> bool;

    /// Get the exit code of the process, if it exited normally
    fn exit_code(&self) -> Option<i32>;

    /// Get the signal that terminated the process, if it was terminated by a signal
    fn end_signal(&self) -> Option<i32>;

    /// Get stdout
    fn output(&self) -> String;

    /// Get stderr
    fn error_output(&self) -> String;

    /// Produce a string explaining the exit status of the process
    fn explain_exit(&self) -> String {
        if let Some(code) = self.exit_code() {
            format!("exited with status: {code}")
        } else if let Some(signal) = self.end_signal() {
            format!("terminated by signal: {signal}")
        } else {
            "exited with unknown status".into()
        }
    }
}

impl Sealed for Output {}

impl OutputChecker for Output {
    fn is_success(&self) -> bool {
        self.status.success()
    }

    fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    fn end_signal(&self) -> Option<i32> {
        self.status.signal()
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into()
    }

    fn error_output(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into()
    }
}

impl Sealed for io::Result<Output> {}

impl OutputChecker for io::Result<Output> {
    fn is_success(&self) -> bool {
        self.as_ref()
            .map(|output| output.is_success())
            .unwrap_or(false)
    }

    fn exit_code(&self) -> Option<i32> {
        self.as_ref().ok().and_then(|output| output.exit_code())
    }

    fn end_signal(&self) -> Option<i32> {
        self.as_ref().ok().and_then(|output| output.end_signal())
    }

    fn output(&self) -> String {
        self.as_ref()
            .map(|output| output.output())
            .unwrap_or_default()
    }

    fn error_output(&self) -> String {
        self.as_ref()
            .map(|output| output.error_output())
            .unwrap_or_default()
    }

    fn explain_exit(&self) -> String {
        match self {
            Ok(output) => output.explain_exit(),
            Err(e) => format!("could not be executed: {e}"),
        }
    }
}

/// Runs a command, requiring a successful exit, and captures its stdout.
pub trait RunAndCheck: Sealed {
    fn output_and_check(&mut self) -> Result<String, EvidenceError>;
    fn render_command(&self) -> String;
}

impl Sealed for Command {}

impl RunAndCheck for Command {
    fn output_and_check(&mut self) -> Result<String, EvidenceError> {
        let command = self.render_command();
        trace!("Executing '{command}'");
        let result = self.output();
        trace!(
            "Executed '{command}': {}. stdout: {:?}, stderr: {:?}",
            result.explain_exit(),
            result.output(),
            result.error_output(),
        );

        if !result.is_success() {
            return Err(EvidenceError::Execute {
                command,
                explanation: result.explain_exit(),
            });
        }

        Ok(result.output())
    }

    fn render_command(&self) -> String {
        std::iter::once(self.get_program().to_string_lossy())
            .chain(self.get_args().map(|arg| arg.to_string_lossy()))
            .map(|arg| {
                if arg.contains(' ') {
                    format!("'{arg}'")
                } else {
                    arg.into()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_checker() {
        let output = Command::new("echo").arg("somezone").output().unwrap();
        assert!(output.is_success());
        assert_eq!(output.exit_code(), Some(0));
        assert_eq!(output.end_signal(), None);
        assert_eq!(output.output(), "somezone\n");
        assert_eq!(output.error_output(), "");
        assert_eq!(output.explain_exit(), "exited with status: 0");

        let output = Command::new("false").output().unwrap();
        assert!(!output.is_success());
        assert_eq!(output.exit_code(), Some(1));
        assert_eq!(output.explain_exit(), "exited with status: 1");

        let result = Command::new("/doesnotexist_1234").output();
        assert!(!result.is_success());
        assert_eq!(result.exit_code(), None);
        assert_eq!(result.output(), "");
        assert!(result.explain_exit().starts_with("could not be executed:"));
    }

    #[test]
    fn test_output_and_check() {
        assert_eq!(
            Command::new("echo").arg("global").output_and_check().unwrap(),
            "global\n"
        );

        let err = Command::new("false").output_and_check().unwrap_err();
        assert!(matches!(
            err,
            EvidenceError::Execute { ref command, ref explanation }
                if command == "false" && explanation == "exited with status: 1"
        ));

        Command::new("/sbin/doesnotexist_1234")
            .arg("-n")
            .output_and_check()
            .unwrap_err();
    }

    #[test]
    fn test_render_command() {
        let mut cmd = Command::new("/sbin/sysctl");
        cmd.args(["-n", "security.jail.jailed"]);
        assert_eq!(cmd.render_command(), "/sbin/sysctl -n security.jail.jailed");

        assert_eq!(Command::new("/sbin/zonename").render_command(), "/sbin/zonename");

        let mut cmd = Command::new("echo");
        cmd.arg("Integrity Virtual Machine");
        assert_eq!(cmd.render_command(), "echo 'Integrity Virtual Machine'");
    }
}
