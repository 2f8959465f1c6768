//! Thin wrapper over cluster client binaries (`kubectl`, `kn`)

use std::sync::Arc;

use crate::common::Result;
use crate::process::{CommandRunner, RunOptions};

/// A cluster client binary, optionally scoped to a namespace
#[derive(Debug, Clone)]
pub struct ClusterCli {
    binary: String,
    namespace: Option<String>,
    runner: Arc<dyn CommandRunner>,
}

impl ClusterCli {
    pub fn new(binary: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            namespace: None,
            runner,
        }
    }

    /// Scope every invocation to `namespace` unless the call opts out
    pub fn namespaced(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Final argument list for an invocation
    pub fn args_for(&self, args: &[&str], no_namespace: bool) -> Vec<String> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        if let (Some(namespace), false) = (&self.namespace, no_namespace) {
            full.push("--namespace".to_string());
            full.push(namespace.clone());
        }
        full
    }

    pub async fn run(&self, args: &[&str]) -> Result<String> {
        self.run_with_opts(args, RunOptions::new()).await
    }

    pub async fn run_with_opts(&self, args: &[&str], opts: RunOptions) -> Result<String> {
        let full = self.args_for(args, opts.no_namespace);
        self.runner.run(&self.binary, &full, opts).await
    }
}
