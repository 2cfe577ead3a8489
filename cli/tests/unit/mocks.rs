//! Shared test doubles for coordinator scenarios.
//!
//! [`FakeSargeHost`] simulates the instance manager on a deployment host: it
//! understands `new`, `start`, `destroy` and `list`, keeps the instance table
//! in memory, and records every command it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};
use std::rc::Rc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

use sarge_deploy::application::{Confirm, Hook, LifecycleHandler, ProgressReporter, RemoteShell};
use sarge_deploy::domain::context::keys;

pub const SARGE_HOME: &str = "/var/local/pubdocs";

// ── Cross-platform ExitStatus construction ───────────────────────────────────

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

fn reply(code: i32, stdout: &str, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ── Fake instance manager host ───────────────────────────────────────────────

#[derive(Default)]
struct HostState {
    /// (id, application, started)
    instances: Vec<(String, String, bool)>,
    next_id: usize,
    commands: Vec<String>,
}

#[derive(Default)]
pub struct FakeSargeHost {
    state: RefCell<HostState>,
}

impl FakeSargeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `id` of `app` was deployed earlier and is running.
    pub fn seed(&self, id: &str, app: &str) {
        self.state
            .borrow_mut()
            .instances
            .push((id.to_string(), app.to_string(), true));
    }

    /// Ids of the live instances of `app`, in creation order.
    pub fn instances_of(&self, app: &str) -> Vec<String> {
        self.state
            .borrow()
            .instances
            .iter()
            .filter(|(_, a, _)| a == app)
            .map(|(id, _, _)| id.clone())
            .collect()
    }

    pub fn is_started(&self, id: &str) -> bool {
        self.state
            .borrow()
            .instances
            .iter()
            .any(|(i, _, started)| i == id && *started)
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    /// Sarge sub-commands received, without the binary path (`"destroy old1"`).
    pub fn sarge_commands(&self) -> Vec<String> {
        let prefix = format!("{SARGE_HOME}/bin/sarge ");
        self.commands()
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.sarge_commands()
            .iter()
            .filter_map(|c| c.strip_prefix("destroy ").map(str::to_string))
            .collect()
    }

    fn sarge(&self, args: &str) -> Output {
        let mut state = self.state.borrow_mut();
        let (verb, rest) = args.split_once(' ').unwrap_or((args, ""));
        match verb {
            "new" => {
                let config: Value =
                    serde_json::from_str(rest.trim_matches('\'')).expect("new payload is JSON");
                let app = config["application_name"]
                    .as_str()
                    .expect("application_name in payload")
                    .to_string();
                state.next_id += 1;
                let id = format!("new{}", state.next_id);
                state.instances.push((id.clone(), app, false));
                reply(0, &format!("{id}\n"), "")
            }
            "start" => match state.instances.iter_mut().find(|(i, _, _)| i == rest) {
                Some(instance) => {
                    instance.2 = true;
                    reply(0, "", "")
                }
                None => reply(1, "", "no such instance"),
            },
            "destroy" => match state.instances.iter().position(|(i, _, _)| i == rest) {
                Some(index) => {
                    state.instances.remove(index);
                    reply(0, "", "")
                }
                None => reply(1, "", "no such instance"),
            },
            "list" => {
                let instances: Vec<Value> = state
                    .instances
                    .iter()
                    .map(|(id, app, _)| json!({"id": id, "meta": {"APPLICATION_NAME": app}}))
                    .collect();
                reply(0, &json!({ "instances": instances }).to_string(), "")
            }
            other => reply(2, "", &format!("unknown command {other}")),
        }
    }
}

#[async_trait(?Send)]
impl RemoteShell for FakeSargeHost {
    async fn run(&self, command: &str) -> Result<Output> {
        self.state.borrow_mut().commands.push(command.to_string());
        let prefix = format!("{SARGE_HOME}/bin/sarge ");
        Ok(match command.strip_prefix(&prefix) {
            Some(args) => self.sarge(args),
            None => reply(0, "", ""),
        })
    }

    async fn put(&self, _: &[u8], remote_path: &str, _: Option<u32>) -> Result<()> {
        self.state
            .borrow_mut()
            .commands
            .push(format!("put {remote_path}"));
        Ok(())
    }

    async fn open_shell(&self, command: &str) -> Result<ExitStatus> {
        self.state.borrow_mut().commands.push(command.to_string());
        Ok(exit_status(0))
    }
}

// ── Operator prompt ──────────────────────────────────────────────────────────

/// Answers prompts from a script, recording each question.
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<bool>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Confirm for ScriptedPrompt {
    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt: {prompt}"))
    }
}

// ── Progress reporter ────────────────────────────────────────────────────────

pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── Lifecycle handler ────────────────────────────────────────────────────────

/// Records `event:app:instance` for every signal it receives.
pub struct RecordingHandler {
    pub log: Rc<RefCell<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl RecordingHandler {
    pub fn new(log: &Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(Self {
            log: Rc::clone(log),
            fail_on: None,
        })
    }

    /// Like [`RecordingHandler::new`], but fails when `event` fires.
    pub fn failing_on(log: &Rc<RefCell<Vec<String>>>, event: &'static str) -> Rc<Self> {
        Rc::new(Self {
            log: Rc::clone(log),
            fail_on: Some(event),
        })
    }
}

#[async_trait(?Send)]
impl LifecycleHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        let instance = hook.ctx.string(keys::INSTANCE)?;
        self.log
            .borrow_mut()
            .push(format!("{}:{}:{instance}", hook.event, hook.app));
        if self.fail_on == Some(hook.event) {
            anyhow::bail!("{} handler exploded", hook.event);
        }
        Ok(())
    }
}

/// On `will_stop`, checks the instance still exists on `host` and leaves a
/// `stopping <id>` marker in the host's command log.
pub struct StopWitness {
    host: Rc<FakeSargeHost>,
    pub alive_at_will_stop: RefCell<Vec<(String, bool)>>,
}

impl StopWitness {
    pub fn new(host: &Rc<FakeSargeHost>) -> Rc<Self> {
        Rc::new(Self {
            host: Rc::clone(host),
            alive_at_will_stop: RefCell::new(Vec::new()),
        })
    }
}

#[async_trait(?Send)]
impl LifecycleHandler for StopWitness {
    fn name(&self) -> &str {
        "stop-witness"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        if hook.event != "will_stop" {
            return Ok(());
        }
        let instance = hook.ctx.string(keys::INSTANCE)?;
        let alive = self.host.instances_of(hook.app).contains(&instance);
        self.alive_at_will_stop
            .borrow_mut()
            .push((instance.clone(), alive));
        hook.remote.check(&format!("stopping {instance}")).await?;
        Ok(())
    }
}
