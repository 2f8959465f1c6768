//! Deploy plan types
//!
//! The YAML document is deserialized into loose `Raw*` structs (every
//! field defaults to empty) and then checked into a [`Plan`] of typed
//! [`Step`]s, so each step carries exactly one action.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// A plan file as written on disk
#[derive(Deserialize, Debug, Default)]
pub struct RawPlan {
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

/// A single step as written on disk
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawStep {
    /// Name shown in progress output
    #[serde(default)]
    pub name: String,
    /// Directory to create (templated)
    #[serde(default)]
    pub mkdir: String,
    /// Command line to run
    #[serde(default)]
    pub exec: String,
    /// Template file to render
    #[serde(default)]
    pub file: RawFile,
}

/// Source and destination of a templated file
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawFile {
    /// Template path, relative to the plan's base directory
    #[serde(default)]
    pub source: String,
    /// Output path (templated)
    #[serde(default)]
    pub destination: String,
}

/// The action performed by a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a directory and any missing parents
    Mkdir { path: String },
    /// Run a whitespace-delimited command line
    Exec { command: String },
    /// Render a template file into a destination
    FileTemplate { source: PathBuf, destination: String },
}

/// A named unit of work within a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub action: Action,
}

impl Step {
    pub fn mkdir(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            action: Action::Mkdir {
                path: path.to_string(),
            },
        }
    }

    pub fn exec(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            action: Action::Exec {
                command: command.to_string(),
            },
        }
    }

    pub fn file(name: &str, source: &str, destination: &str) -> Self {
        Self {
            name: name.to_string(),
            action: Action::FileTemplate {
                source: PathBuf::from(source),
                destination: destination.to_string(),
            },
        }
    }
}

impl TryFrom<RawStep> for Step {
    type Error = Error;

    fn try_from(raw: RawStep) -> Result<Self> {
        let mut actions = Vec::with_capacity(1);
        if !raw.mkdir.is_empty() {
            actions.push(Action::Mkdir { path: raw.mkdir });
        }
        if !raw.exec.is_empty() {
            actions.push(Action::Exec { command: raw.exec });
        }
        if !raw.file.source.is_empty() {
            if raw.file.destination.is_empty() {
                return Err(Error::invalid_step(&raw.name, "file step has no destination"));
            }
            actions.push(Action::FileTemplate {
                source: PathBuf::from(raw.file.source),
                destination: raw.file.destination,
            });
        }

        match actions.len() {
            0 => Err(Error::invalid_step(&raw.name, "no command specified")),
            1 => Ok(Self {
                name: raw.name,
                action: actions.remove(0),
            }),
            _ => Err(Error::invalid_step(
                &raw.name,
                "only one of mkdir, exec or file may be set",
            )),
        }
    }
}

/// An ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Load and check a plan from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::parse(&content).map_err(|e| match e {
            Error::Yaml(e) => Error::Config(format!(
                "Failed to parse deploy plan '{}': {}",
                path.display(),
                e
            )),
            other => other,
        })
    }

    /// Parse and check a plan from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawPlan = serde_yaml::from_str(content)?;
        Self::try_from(raw)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl TryFrom<RawPlan> for Plan {
    type Error = Error;

    fn try_from(raw: RawPlan) -> Result<Self> {
        let steps = raw
            .steps
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_step_kinds() {
        let plan = Plan::parse(
            r#"
steps:
  - name: Create output directory
    mkdir: "{{name}}/config"
  - name: Build
    exec: go build ./...
  - name: Render service
    file:
      source: templates/service.yaml
      destination: "{{name}}/service.yaml"
"#,
        )
        .unwrap();

        assert_eq!(
            plan.steps,
            vec![
                Step::mkdir("Create output directory", "{{name}}/config"),
                Step::exec("Build", "go build ./..."),
                Step::file("Render service", "templates/service.yaml", "{{name}}/service.yaml"),
            ]
        );
    }

    #[test]
    fn test_step_without_action_is_rejected() {
        let err = Plan::parse("steps:\n  - name: nothing\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config step 'nothing' - no command specified"
        );
    }

    #[test]
    fn test_step_with_two_actions_is_rejected() {
        let err = Plan::parse("steps:\n  - name: both\n    mkdir: out\n    exec: ls\n").unwrap_err();
        assert!(matches!(err, Error::InvalidStep { ref name, .. } if name == "both"));
    }

    #[test]
    fn test_file_step_requires_destination() {
        let err = Plan::parse("steps:\n  - name: tpl\n    file:\n      source: a.tpl\n").unwrap_err();
        assert!(err.to_string().contains("no destination"));
    }

    #[test]
    fn test_empty_document_is_empty_plan() {
        let plan = Plan::parse("{}").unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Plan::load(Path::new("/nonexistent/deploy.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
