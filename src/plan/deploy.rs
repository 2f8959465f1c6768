//! SDK deploy entry point

use std::io::Write;
use std::path::PathBuf;

use crate::common::{paths, Result};

use super::config::Plan;
use super::interpreter::Interpreter;
use super::template::Context;

/// A function SDK on disk
#[derive(Debug, Clone)]
pub struct Sdk {
    /// Display name
    pub name: String,
    /// Directory holding `deploy.yaml` and its templates
    pub dir: PathBuf,
}

impl Sdk {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    pub fn deploy_plan(&self) -> PathBuf {
        paths::deploy_plan_path(&self.dir)
    }
}

/// Load the SDK's deploy plan and run it with an empty context
pub async fn run_deploy<W>(out: &mut W, sdk: &Sdk) -> Result<()>
where
    W: Write + ?Sized,
{
    let plan = Plan::load(&sdk.deploy_plan())?;

    writeln!(out, "Using SDK: {} deploy plans", sdk.name)?;
    tracing::info!(sdk = %sdk.name, steps = plan.len(), "Running deploy plan");

    let mut context = Context::new();
    Interpreter::new(&sdk.dir)
        .execute(&plan, &mut context, out)
        .await
}
