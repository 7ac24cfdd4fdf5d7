//! Timeline step definitions
//!
//! The ordered list of steps a workflow instance renders. This is the
//! static source of truth for which step ids exist and which one is last.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Id of the sentinel step that shows the overall workflow result
pub const DEFAULT_FINISH_STEP: &str = "workflow_finish";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DefinitionError {
    #[error("Timeline has no steps")]
    NoSteps,

    #[error("Step at position {0} has an empty id")]
    EmptyStepId(usize),

    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    /// Title to display, falling back to the id
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDefinition {
    pub steps: Vec<StepDefinition>,

    /// Step id carrying the "workflow finished" indicator
    #[serde(default = "default_finish_step")]
    pub finish_step: String,
}

fn default_finish_step() -> String {
    DEFAULT_FINISH_STEP.to_string()
}

impl TimelineDefinition {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self {
            steps,
            finish_step: default_finish_step(),
        }
    }

    pub fn with_finish_step(mut self, id: impl Into<String>) -> Self {
        self.finish_step = id.into();
        self
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::NoSteps);
        }

        let mut seen = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(DefinitionError::EmptyStepId(i));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(DefinitionError::DuplicateStep(step.id.clone()));
            }
        }

        Ok(())
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.position(step_id).is_some()
    }

    pub fn has_finish_step(&self) -> bool {
        self.contains(&self.finish_step)
    }

    pub fn is_finish_step(&self, step_id: &str) -> bool {
        self.finish_step == step_id
    }

    /// Last work step in definition order (the finish step excluded)
    pub fn last_step(&self) -> Option<&StepDefinition> {
        self.steps.iter().rev().find(|s| !self.is_finish_step(&s.id))
    }

    /// Work steps, i.e. everything but the finish step
    pub fn work_steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter().filter(move |s| !self.is_finish_step(&s.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimelineDefinition {
        TimelineDefinition::new(vec![
            StepDefinition::new("fetch", "Fetch data"),
            StepDefinition::new("train", "Train model"),
            StepDefinition::new(DEFAULT_FINISH_STEP, "Finished"),
        ])
    }

    #[test]
    fn test_last_step_skips_finish() {
        let def = sample();
        assert_eq!(def.last_step().unwrap().id, "train");
        assert_eq!(def.work_steps().count(), 2);
        assert!(def.has_finish_step());
    }

    #[test]
    fn test_last_step_without_work_steps() {
        let def = TimelineDefinition::new(vec![StepDefinition::new(DEFAULT_FINISH_STEP, "")]);
        assert!(def.last_step().is_none());
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());
        assert_eq!(
            TimelineDefinition::new(vec![]).validate(),
            Err(DefinitionError::NoSteps)
        );

        let dup = TimelineDefinition::new(vec![
            StepDefinition::new("a", ""),
            StepDefinition::new("a", ""),
        ]);
        assert_eq!(
            dup.validate(),
            Err(DefinitionError::DuplicateStep("a".to_string()))
        );

        let empty = TimelineDefinition::new(vec![StepDefinition::new(" ", "")]);
        assert_eq!(empty.validate(), Err(DefinitionError::EmptyStepId(0)));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
steps:
  - id: 4c1f
    title: Extract
  - id: db9c
  - id: done
finish_step: done
"#;
        let def: TimelineDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.finish_step, "done");
        assert_eq!(def.last_step().unwrap().id, "db9c");
        assert_eq!(def.steps[1].display_title(), "db9c");
    }
}
