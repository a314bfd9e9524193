// ABOUTME: Sandboxed execution of the platform CLI as a subprocess.
// ABOUTME: Validates commands, scopes the environment to 4 variables, streams sanitized output, and enforces graduated timeouts.

mod sanitizer;
mod validation;

pub use sanitizer::sanitize_line;
pub use validation::{
    ALLOWED_VERBS, DENIED_VERBS, SHELL_METACHARACTERS, ValidationError, validate_command,
};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// Default budget for deploy-class commands (`up`, `redeploy`).
pub const DEPLOY_TIMEOUT: Duration = Duration::from_millis(600_000);
/// Default budget for everything else.
pub const STANDARD_TIMEOUT: Duration = Duration::from_millis(120_000);
/// How long a process gets between SIGTERM and SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_millis(5_000);

const TOKEN_VAR: &str = "RAILWAY_TOKEN";
const SANDBOX_HOME: &str = "/tmp/railyard-cli-home";
const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
const MODE_VAR: &str = "CI";
const MODE_VALUE: &str = "true";

const DEPLOY_CLASS_VERBS: [&str; 2] = ["up", "redeploy"];

/// Which stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// Per-line output callback, tagged with the stream the line came from.
/// Lines are sanitized before delivery.
pub type OutputCallback = Arc<dyn Fn(OutputStream, &str) + Send + Sync>;

/// One CLI invocation to run inside the sandbox.
#[derive(Clone)]
pub struct CommandRequest {
    /// Verb plus optional subcommand tokens, e.g. `up` or `variable set`.
    pub command: String,
    /// Decrypted platform credential. Only ever exposed as the child's
    /// RAILWAY_TOKEN environment variable.
    pub token: SecretString,
    pub working_dir: Option<PathBuf>,
    pub args: Vec<String>,
    /// Value for the `-s` service selector flag.
    pub service: Option<String>,
    /// Value for the `-e` environment selector flag.
    pub environment: Option<String>,
    /// Extra flags appended verbatim after the selectors.
    pub flags: Vec<String>,
    pub timeout: Option<Duration>,
    pub on_output: Option<OutputCallback>,
}

impl std::fmt::Debug for CommandRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRequest")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("service", &self.service)
            .field("environment", &self.environment)
            .field("flags", &self.flags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, token: SecretString) -> Self {
        Self {
            command: command.into(),
            token,
            working_dir: None,
            args: Vec::new(),
            service: None,
            environment: None,
            flags: Vec::new(),
            timeout: None,
            on_output: None,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_output(mut self, callback: OutputCallback) -> Self {
        self.on_output = Some(callback);
        self
    }

    /// First whitespace-delimited token of the command.
    fn verb(&self) -> &str {
        self.command.split_whitespace().next().unwrap_or("")
    }

    fn effective_timeout(&self) -> Duration {
        if let Some(timeout) = self.timeout {
            return timeout;
        }
        if DEPLOY_CLASS_VERBS.contains(&self.verb()) {
            DEPLOY_TIMEOUT
        } else {
            STANDARD_TIMEOUT
        }
    }

    /// Explicit argument vector; the command line is never built by string
    /// concatenation and never passes through a shell.
    fn argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = self
            .command
            .split_whitespace()
            .map(str::to_string)
            .collect();
        argv.extend(self.args.iter().cloned());
        if let Some(service) = &self.service {
            argv.push("-s".to_string());
            argv.push(service.clone());
        }
        if let Some(environment) = &self.environment {
            argv.push("-e".to_string());
            argv.push(environment.clone());
        }
        argv.extend(self.flags.iter().cloned());
        argv
    }
}

/// Outcome of one sandboxed invocation. Immutable once returned.
#[derive(Debug, Clone)]
pub struct CommandExecutionResult {
    pub exit_code: i32,
    /// Captured stdout, sanitized line by line.
    pub stdout: String,
    /// Captured stderr, sanitized line by line.
    pub stderr: String,
    /// Wall clock from spawn to process exit.
    pub duration: Duration,
    /// Set whenever the timeout fired, even if the process then exited on its
    /// own during the grace window.
    pub timed_out: bool,
}

impl CommandExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Runs the platform CLI as a sandboxed subprocess.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    binary: PathBuf,
}

impl CommandExecutor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Validate and run one CLI invocation.
    ///
    /// Only pre-spawn validation returns `Err`. Everything after a successful
    /// spawn, including non-zero exits, signal deaths, and timeouts, is
    /// reported inside the `CommandExecutionResult`.
    pub async fn execute(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandExecutionResult, ValidationError> {
        validate_command(&request.command)?;
        Ok(self.spawn_and_capture(request).await)
    }

    async fn spawn_and_capture(&self, request: &CommandRequest) -> CommandExecutionResult {
        let started = Instant::now();

        let mut cmd = Command::new(&self.binary);
        cmd.args(request.argv())
            // The child sees exactly these four variables. Host secrets like
            // DATABASE_URL must never reach the CLI process.
            .env_clear()
            .env(TOKEN_VAR, request.token.expose_secret())
            .env("HOME", SANDBOX_HOME)
            .env("PATH", SANDBOX_PATH)
            .env(MODE_VAR, MODE_VALUE)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandExecutionResult {
                    exit_code: 127,
                    stdout: String::new(),
                    stderr: sanitize_line(&format!(
                        "failed to spawn {}: {e}",
                        self.binary.display()
                    )),
                    duration: started.elapsed(),
                    timed_out: false,
                };
            }
        };

        let stdout_task = tokio::spawn(read_lines(
            child.stdout.take(),
            OutputStream::Stdout,
            request.on_output.clone(),
        ));
        let stderr_task = tokio::spawn(read_lines(
            child.stderr.take(),
            OutputStream::Stderr,
            request.on_output.clone(),
        ));

        let (status, timed_out) = wait_with_grace(&mut child, request.effective_timeout()).await;

        // Readers finish at pipe EOF, which the exit (or kill) guarantees.
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        CommandExecutionResult {
            exit_code: synthesize_exit_code(status),
            stdout,
            stderr,
            duration: started.elapsed(),
            timed_out,
        }
    }
}

/// Read a child stream line by line, sanitizing each complete line before it
/// is buffered or delivered to the callback.
async fn read_lines<R>(
    stream: Option<R>,
    tag: OutputStream,
    callback: Option<OutputCallback>,
) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };
    let mut lines = BufReader::new(stream).lines();
    let mut buffer = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let clean = sanitize_line(&line);
        if let Some(callback) = &callback {
            callback(tag, &clean);
        }
        buffer.push_str(&clean);
        buffer.push('\n');
    }
    buffer
}

/// Wait for the child with graduated termination: SIGTERM at timeout expiry,
/// SIGKILL if it is still alive after the grace window.
async fn wait_with_grace(child: &mut Child, timeout: Duration) -> (Option<ExitStatus>, bool) {
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (status.ok(), false),
        Err(_) => {
            send_sigterm(child);
            match tokio::time::timeout(KILL_GRACE, child.wait()).await {
                Ok(status) => (status.ok(), true),
                Err(_) => {
                    let _ = child.kill().await;
                    (child.wait().await.ok(), true)
                }
            }
        }
    }
}

fn send_sigterm(child: &Child) {
    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

/// Map an exit status to a code, synthesizing `128 + signal` for signal
/// deaths so signal termination always reads as non-zero.
fn synthesize_exit_code(status: Option<ExitStatus>) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status {
        Some(status) => status
            .code()
            .or_else(|| status.signal().map(|sig| 128 + sig))
            .unwrap_or(-1),
        None => -1,
    }
}
