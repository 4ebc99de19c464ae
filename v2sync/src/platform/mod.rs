use std::ffi::OsStr;
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("Failed to run {0}: {1}")]
    Spawn(String, io::Error),
    #[error("{0} exited with {1}")]
    Status(String, ExitStatus),
}

/// Restarts the proxy daemon once its new config is on disk.
pub trait ServiceManager {
    fn restart(&self, service: &str) -> Result<(), ReloadError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl;

impl ServiceManager for Systemctl {
    fn restart(&self, service: &str) -> Result<(), ReloadError> {
        run_command("systemctl", ["restart", service])
    }
}

// stderr stays attached so the service manager's own diagnostic reaches the user
pub fn run_command<I, S>(cmd: &str, args: I) -> Result<(), ReloadError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut handle = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| ReloadError::Spawn(cmd.to_string(), e))?;
    let status = handle
        .wait()
        .map_err(|e| ReloadError::Spawn(cmd.to_string(), e))?;
    if status.success() {
        Ok(())
    } else {
        Err(ReloadError::Status(cmd.to_string(), status))
    }
}
