//! Deploy plans
//!
//! A plan is an ordered list of typed steps (create a directory, run a
//! command, render a template file) loaded from an SDK's `deploy.yaml`.

mod config;
mod deploy;
mod interpreter;
mod template;

pub use config::{Action, Plan, RawFile, RawPlan, RawStep, Step};
pub use deploy::{run_deploy, Sdk};
pub use interpreter::Interpreter;
pub use template::{Context, Placeholders, TemplateEngine};
