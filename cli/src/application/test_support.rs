//! Shared test helpers for application-layer tests.
//!
//! Provides cross-platform `exit_status()`, canned outputs, and a remote
//! shell that records every command and upload.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::RemoteShell;

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

/// One upload seen by [`RecordingRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: String,
    pub contents: String,
    pub mode: Option<u32>,
}

/// Remote shell that records commands and uploads.
///
/// Commands succeed with empty output unless a reply was queued with
/// [`RecordingRemote::reply`].
#[derive(Default)]
pub struct RecordingRemote {
    pub commands: RefCell<Vec<String>>,
    pub uploads: RefCell<Vec<Upload>>,
    replies: RefCell<VecDeque<Output>>,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next command.
    pub fn reply(&self, output: Output) {
        self.replies.borrow_mut().push_back(output);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.borrow().clone()
    }
}

#[async_trait(?Send)]
impl RemoteShell for RecordingRemote {
    async fn run(&self, command: &str) -> Result<Output> {
        self.commands.borrow_mut().push(command.to_string());
        Ok(self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| ok_output(b"")))
    }

    async fn put(&self, contents: &[u8], remote_path: &str, mode: Option<u32>) -> Result<()> {
        self.uploads.borrow_mut().push(Upload {
            path: remote_path.to_string(),
            contents: String::from_utf8_lossy(contents).into_owned(),
            mode,
        });
        Ok(())
    }

    async fn open_shell(&self, command: &str) -> Result<ExitStatus> {
        self.commands.borrow_mut().push(command.to_string());
        Ok(exit_status(0))
    }
}
