//! Per-invocation options for the process runner

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Destination for a child's output stream
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Source for a child's standard input
pub enum Input {
    /// Fixed bytes written to the child, then stdin is closed
    Bytes(Vec<u8>),
    /// Any async reader, copied to the child until EOF
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Bytes(s.as_bytes().to_vec())
    }
}

/// Options for one command invocation
///
/// Every field is optional. Without overrides stdout and stderr are
/// captured, stdin is empty and a failure is reported as fatal.
#[derive(Default)]
pub struct RunOptions {
    /// Do not append `--namespace` for namespaced clients
    pub no_namespace: bool,
    /// Report a failed command as an ordinary error rather than a fatal one
    pub allow_error: bool,
    /// Receives stderr as it arrives; stderr is still captured for errors
    pub stderr: Option<Sink>,
    /// Receives stdout instead of it being captured and returned
    pub stdout: Option<Sink>,
    /// Standard input for the child
    pub stdin: Option<Input>,
    /// Interrupts the child when cancelled
    pub cancel: Option<CancellationToken>,
    /// Keep command output out of the logs
    pub redact: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_error(mut self) -> Self {
        self.allow_error = true;
        self
    }

    pub fn no_namespace(mut self) -> Self {
        self.no_namespace = true;
        self
    }

    pub fn redact(mut self) -> Self {
        self.redact = true;
        self
    }

    pub fn stdout(mut self, sink: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.stdout = Some(Box::new(sink));
        self
    }

    pub fn stderr(mut self, sink: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.stderr = Some(Box::new(sink));
        self
    }

    pub fn stdin(mut self, input: impl Into<Input>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("no_namespace", &self.no_namespace)
            .field("allow_error", &self.allow_error)
            .field("stderr", &self.stderr.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stdin", &self.stdin.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("redact", &self.redact)
            .finish()
    }
}
