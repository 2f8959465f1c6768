//! Namespace lifecycle for end-to-end runs
//!
//! Each run gets its own namespace, named from the configured prefix and
//! the next namespace ordinal. Creation is retried; both creation and
//! deletion are confirmed by polling `kubectl get namespace`.

use std::sync::Arc;

use regex::Regex;

use crate::common::config::{ClusterConfig, Config};
use crate::common::{Error, Result};
use crate::process::{CommandRunner, RunOptions};

use super::client::ClusterCli;
use super::counters::Counters;
use super::poll::{poll_until, retry, Presence, RetryPolicy};

/// Per-run cluster environment
#[derive(Debug)]
pub struct E2eTest {
    cluster: ClusterConfig,
    policy: RetryPolicy,
    counters: Arc<Counters>,
    runner: Arc<dyn CommandRunner>,
    kubectl: ClusterCli,
    kn: ClusterCli,
    namespace: String,
    create_namespace_on_setup: bool,
    namespace_created: bool,
}

impl E2eTest {
    pub fn new(
        cluster: ClusterConfig,
        policy: RetryPolicy,
        runner: Arc<dyn CommandRunner>,
        counters: Arc<Counters>,
    ) -> Self {
        let namespace = cluster.namespace_prefix.clone();
        Self {
            kubectl: ClusterCli::new(cluster.kubectl.clone(), Arc::clone(&runner)),
            kn: ClusterCli::new(cluster.kn.clone(), Arc::clone(&runner)).namespaced(&namespace),
            cluster,
            policy,
            counters,
            runner,
            namespace,
            create_namespace_on_setup: true,
            namespace_created: false,
        }
    }

    pub fn from_config(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        counters: Arc<Counters>,
    ) -> Self {
        Self::new(
            config.cluster.clone(),
            RetryPolicy::from(&config.retry),
            runner,
            counters,
        )
    }

    /// Leave namespace creation to the caller
    pub fn without_namespace_creation(mut self) -> Self {
        self.create_namespace_on_setup = false;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn namespace_created(&self) -> bool {
        self.namespace_created
    }

    /// `kn` scoped to this run's namespace
    pub fn kn(&self) -> &ClusterCli {
        &self.kn
    }

    pub fn kubectl(&self) -> &ClusterCli {
        &self.kubectl
    }

    /// Unique service name for this process
    pub fn service_name(&self, base: &str) -> String {
        self.counters.next_resource_name(base)
    }

    /// Allocate this run's namespace and, unless disabled, create it
    pub async fn setup(&mut self) -> Result<()> {
        self.namespace = self
            .counters
            .next_namespace_name(&self.cluster.namespace_prefix);
        self.kn = ClusterCli::new(self.cluster.kn.clone(), Arc::clone(&self.runner))
            .namespaced(&self.namespace);

        if self.create_namespace_on_setup {
            let namespace = self.namespace.clone();
            self.create_namespace(&namespace).await?;
            self.wait_for_namespace_created(&namespace).await?;
        }
        Ok(())
    }

    /// Delete the namespace if this run created it
    pub async fn teardown(&mut self) -> Result<()> {
        if self.namespace_created {
            let namespace = self.namespace.clone();
            self.delete_namespace(&namespace).await?;
        }
        Ok(())
    }

    /// Create a namespace, retrying failed attempts
    pub async fn create_namespace(&mut self, namespace: &str) -> Result<String> {
        let kubectl = &self.kubectl;
        let args: &[&str] = &["create", "namespace", namespace];
        let out = retry(
            move || kubectl.run_with_opts(args, RunOptions::new().allow_error()),
            &self.policy,
        )
        .await
        .map_err(|e| {
            tracing::error!("Could not create namespace with error {}, giving up", e);
            e
        })?;

        expect_output(
            "kubectl create namespace",
            &format!("namespace?.+{}.+created", regex::escape(namespace)),
            &out,
        )?;
        self.namespace_created = true;
        Ok(out)
    }

    /// Delete a namespace without waiting for it to disappear
    pub async fn delete_namespace(&mut self, namespace: &str) -> Result<String> {
        let out = self
            .kubectl
            .run(&["delete", "namespace", namespace])
            .await?;

        expect_output(
            "kubectl delete namespace",
            &format!("namespace?.+{}.+deleted", regex::escape(namespace)),
            &out,
        )?;
        self.namespace_created = false;
        Ok(out)
    }

    /// Wait until `namespace` shows up in the namespace listing
    pub async fn wait_for_namespace_created(&self, namespace: &str) -> Result<u32> {
        self.wait_for_namespace(namespace, Presence::Present).await
    }

    /// Wait until `namespace` is gone from the namespace listing
    pub async fn wait_for_namespace_deleted(&self, namespace: &str) -> Result<u32> {
        self.wait_for_namespace(namespace, Presence::Absent).await
    }

    async fn wait_for_namespace(&self, namespace: &str, target: Presence) -> Result<u32> {
        let kubectl = &self.kubectl;
        poll_until(
            move || kubectl.run_with_opts(&["get", "namespace"], RunOptions::new().allow_error()),
            namespace,
            target,
            &self.policy,
        )
        .await
        .into_result(namespace, target, self.policy.on_exhausted)
    }
}

/// Check a command's output against a pattern
fn expect_output(command: &str, pattern: &str, output: &str) -> Result<()> {
    let re = Regex::new(pattern)
        .map_err(|e| Error::Internal(format!("Failed to compile regex '{}': {}", pattern, e)))?;
    if re.is_match(output) {
        Ok(())
    } else {
        Err(Error::UnexpectedOutput {
            command: command.to_string(),
            pattern: pattern.to_string(),
            output: output.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::ExhaustionPolicy;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies to each call with the next scripted result
    #[derive(Default)]
    struct ScriptedRunner {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, cli: &str, args: &[String], opts: RunOptions) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push(crate::common::describe(cli, args));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()));
            reply.map_err(|e| match e {
                Error::CommandFailed {
                    command,
                    stderr,
                    detail,
                    ..
                } => Error::CommandFailed {
                    command,
                    stderr,
                    detail,
                    fatal: !opts.allow_error,
                },
                other => other,
            })
        }
    }

    fn failure(stderr: &str) -> Result<String> {
        Err(Error::CommandFailed {
            command: "kubectl".to_string(),
            stderr: stderr.to_string(),
            detail: "exit status: 1".to_string(),
            fatal: true,
        })
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    fn e2e(runner: Arc<ScriptedRunner>, policy: RetryPolicy) -> E2eTest {
        E2eTest::new(
            ClusterConfig::default(),
            policy,
            runner,
            Arc::new(Counters::new()),
        )
    }

    #[tokio::test]
    async fn test_setup_creates_and_waits() {
        let runner = ScriptedRunner::new(vec![
            Ok("namespace/kne2etests0 created\n".to_string()),
            Ok("NAME STATUS\ndefault Active\n".to_string()),
            Ok("NAME STATUS\nkne2etests0 Active\n".to_string()),
        ]);
        let mut test = e2e(Arc::clone(&runner), fast_policy(10));

        test.setup().await.unwrap();

        assert_eq!(test.namespace(), "kne2etests0");
        assert!(test.namespace_created());
        assert_eq!(test.kn().namespace(), Some("kne2etests0"));
        assert_eq!(test.kubectl().namespace(), None);
        assert_eq!(
            runner.calls(),
            vec![
                "kubectl create namespace kne2etests0",
                "kubectl get namespace",
                "kubectl get namespace",
            ]
        );
    }

    #[tokio::test]
    async fn test_setup_without_creation_only_allocates() {
        let runner = ScriptedRunner::new(vec![]);
        let counters = Arc::new(Counters::new());
        let mut first = E2eTest::new(
            ClusterConfig::default(),
            fast_policy(1),
            runner.clone(),
            Arc::clone(&counters),
        )
        .without_namespace_creation();
        let mut second = E2eTest::new(ClusterConfig::default(), fast_policy(1), runner.clone(), counters)
            .without_namespace_creation();

        first.setup().await.unwrap();
        second.setup().await.unwrap();

        assert_eq!(first.namespace(), "kne2etests0");
        assert_eq!(second.namespace(), "kne2etests1");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_namespace_retries() {
        let runner = ScriptedRunner::new(vec![
            failure("connection refused"),
            failure("connection refused"),
            Ok("namespace/demo created\n".to_string()),
        ]);
        let mut test = e2e(Arc::clone(&runner), fast_policy(5));

        let out = test.create_namespace("demo").await.unwrap();

        assert_eq!(out, "namespace/demo created\n");
        assert_eq!(runner.calls().len(), 3);
        assert!(test.namespace_created());
    }

    #[tokio::test]
    async fn test_create_namespace_gives_up_with_last_error() {
        let runner = ScriptedRunner::new(vec![
            failure("first"),
            failure("second"),
            failure("third"),
        ]);
        let mut test = e2e(Arc::clone(&runner), fast_policy(3));

        let err = test.create_namespace("demo").await.unwrap_err();

        assert_eq!(err.stderr(), Some("third"));
        assert!(!err.is_fatal());
        assert!(!test.namespace_created());
    }

    #[tokio::test]
    async fn test_create_namespace_checks_output() {
        let runner = ScriptedRunner::new(vec![Ok("something else\n".to_string())]);
        let mut test = e2e(runner, fast_policy(1));

        let err = test.create_namespace("demo").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedOutput { .. }));
        assert!(!test.namespace_created());
    }

    #[tokio::test]
    async fn test_delete_failure_is_fatal() {
        let runner = ScriptedRunner::new(vec![failure("forbidden")]);
        let mut test = e2e(runner, fast_policy(1));

        let err = test.delete_namespace("demo").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_teardown_deletes_created_namespace() {
        let runner = ScriptedRunner::new(vec![
            Ok("namespace/kne2etests0 created\n".to_string()),
            Ok("kne2etests0 Active\n".to_string()),
            Ok("namespace \"kne2etests0\" deleted\n".to_string()),
        ]);
        let mut test = e2e(Arc::clone(&runner), fast_policy(3));

        test.setup().await.unwrap();
        test.teardown().await.unwrap();
        test.teardown().await.unwrap();

        assert!(!test.namespace_created());
        assert_eq!(
            runner.calls().last().map(String::as_str),
            Some("kubectl delete namespace kne2etests0")
        );
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_deleted_ignores_probe_errors() {
        let runner = ScriptedRunner::new(vec![
            Ok("demo Terminating\n".to_string()),
            failure("etcd timeout"),
            Ok("default Active\n".to_string()),
        ]);
        let test = e2e(Arc::clone(&runner), fast_policy(10));

        let attempts = test.wait_for_namespace_deleted("demo").await.unwrap();
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_wait_exhaustion_follows_policy() {
        let listing = || Ok("default Active\n".to_string());

        let runner = ScriptedRunner::new(vec![listing(), listing()]);
        let test = e2e(runner, fast_policy(2));
        let err = test.wait_for_namespace_created("demo").await.unwrap_err();
        assert!(matches!(err, Error::PollTimeout { attempts: 2, .. }));

        let runner = ScriptedRunner::new(vec![listing(), listing()]);
        let test = e2e(runner, fast_policy(2).on_exhausted(ExhaustionPolicy::Succeed));
        assert_eq!(test.wait_for_namespace_created("demo").await.unwrap(), 2);
    }

    #[test]
    fn test_service_names_are_unique() {
        let test = e2e(ScriptedRunner::new(vec![]), fast_policy(1));
        assert_eq!(test.service_name("hello"), "hello0");
        assert_eq!(test.service_name("hello"), "hello1");
    }
}
