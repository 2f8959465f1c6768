//! Plan interpreter
//!
//! Runs the steps of a plan strictly in order against the filesystem
//! and the process runner. The first failure stops the plan; steps
//! already applied are left as they are.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::process;

use super::config::{Action, Plan, Step};
use super::template::{Context, Placeholders, TemplateEngine};

/// Executes plans relative to a base directory
#[derive(Debug, Clone)]
pub struct Interpreter<E = Placeholders> {
    /// Directory that `file` step sources are resolved against
    base_dir: PathBuf,
    engine: E,
}

impl Interpreter<Placeholders> {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_engine(base_dir, Placeholders)
    }
}

impl<E: TemplateEngine> Interpreter<E> {
    pub fn with_engine(base_dir: impl Into<PathBuf>, engine: E) -> Self {
        Self {
            base_dir: base_dir.into(),
            engine,
        }
    }

    /// Execute every step of `plan`, writing a progress line per step to `out`
    ///
    /// The context is shared by all steps, so a value written by one step
    /// is visible to the steps after it.
    pub async fn execute<W>(&self, plan: &Plan, context: &mut Context, out: &mut W) -> Result<()>
    where
        W: Write + ?Sized,
    {
        for (i, step) in plan.steps.iter().enumerate() {
            writeln!(out, " ♫ {}", step.name)?;
            out.flush()?;

            tracing::debug!(step = i + 1, total = plan.len(), name = %step.name, "Executing step");
            self.execute_step(step, context).await.map_err(|e| {
                tracing::debug!(name = %step.name, error = %e, "Step failed, aborting plan");
                e
            })?;
        }
        Ok(())
    }

    /// Execute a single step
    pub async fn execute_step(&self, step: &Step, context: &mut Context) -> Result<()> {
        match &step.action {
            Action::Mkdir { path } => {
                let dir = self.engine.render_str(path, context)?;
                std::fs::create_dir_all(&dir)?;
                Ok(())
            }
            Action::Exec { command } => run_command_line(&step.name, command).await,
            Action::FileTemplate {
                source,
                destination,
            } => {
                let destination = self.engine.render_str(destination, context)?;
                let source = self.base_dir.join(source);
                self.engine
                    .render_file(&source, Path::new(&destination), context)
            }
        }
    }
}

/// Split a command line on whitespace and run it with inherited streams
///
/// There is no quoting: an argument cannot contain spaces.
async fn run_command_line(step: &str, command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| Error::invalid_step(step, "exec command is empty"))?;
    let args: Vec<String> = parts.map(str::to_string).collect();

    let path = which::which(program).map_err(|_| Error::ExecutableNotFound(program.to_string()))?;
    process::run_inherited(&path, &args).await
}
