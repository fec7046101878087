//! Stage templates
//!
//! A sweep declares its pipeline once as a list of stage templates whose
//! arguments may reference per-run values through `{placeholder}` tokens.
//! Resolving a template against one run yields the concrete `StageSpec`
//! list executed for that run.
//!
//! Available placeholders: `{scene}`, `{n_views}`, `{index}`, `{key}`,
//! `{iteration}`, `{source_path}`, `{model_path}`. `{{` and `}}` produce
//! literal braces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::identity::{RunIdentity, RunPaths};
use crate::domain::stage::StageSpec;
use crate::error::{ConfigError, Result};

/// Unresolved stage definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTemplate {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Values substituted into stage templates for one run
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: BTreeMap<&'static str, String>,
}

impl Placeholders {
    pub fn for_run(identity: &RunIdentity, paths: &RunPaths, iteration: u32) -> Self {
        let mut values = BTreeMap::new();
        values.insert("scene", identity.scene.clone());
        values.insert("n_views", identity.n_views.to_string());
        values.insert("index", identity.index.to_string());
        values.insert("key", identity.key());
        values.insert("iteration", iteration.to_string());
        values.insert("source_path", paths.source.to_string_lossy().into_owned());
        values.insert("model_path", paths.model.to_string_lossy().into_owned());
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl StageTemplate {
    pub fn new(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitutes placeholders in the program and every argument
    pub fn resolve(&self, placeholders: &Placeholders) -> Result<StageSpec> {
        let program = substitute(&self.name, &self.program, placeholders)?;
        let args = self
            .args
            .iter()
            .map(|arg| substitute(&self.name, arg, placeholders))
            .collect::<Result<Vec<_>>>()?;

        Ok(StageSpec::new(self.name.clone(), program, args))
    }
}

/// Resolves every template of a pipeline, preserving order
pub fn resolve_all(templates: &[StageTemplate], placeholders: &Placeholders) -> Result<Vec<StageSpec>> {
    templates.iter().map(|t| t.resolve(placeholders)).collect()
}

/// Checks templates for structural problems and unknown placeholders
///
/// Runs against a sample run so typos surface before anything is dispatched.
pub fn validate_templates(templates: &[StageTemplate]) -> Result<()> {
    if templates.is_empty() {
        return Err(ConfigError::EmptyPipeline);
    }

    for (index, template) in templates.iter().enumerate() {
        if template.name.trim().is_empty() {
            return Err(ConfigError::InvalidStage {
                index,
                reason: "name cannot be empty".to_string(),
            });
        }
        if template.program.trim().is_empty() {
            return Err(ConfigError::InvalidStage {
                index,
                reason: format!("stage '{}' has no program", template.name),
            });
        }
    }

    let sample = RunIdentity::new("scene", 1, 0);
    let paths = RunPaths::derive(&sample, Path::new("source"), Path::new("output"));
    resolve_all(templates, &Placeholders::for_run(&sample, &paths, 1))?;

    Ok(())
}

/// Train, render and evaluate stages of a view-synthesis sweep
pub fn default_stages() -> Vec<StageTemplate> {
    vec![
        StageTemplate::new(
            "Train",
            "python",
            &[
                "train.py",
                "--source_path",
                "{source_path}",
                "--model_path",
                "{model_path}",
                "--eval",
                "--n_views",
                "{n_views}",
                "--sample_pseudo_interval",
                "1",
                "--idx",
                "{index}",
            ],
        ),
        StageTemplate::new(
            "Render",
            "python",
            &[
                "render.py",
                "--source_path",
                "{source_path}",
                "--model_path",
                "{model_path}",
                "--iteration",
                "{iteration}",
                "--idx",
                "{index}",
            ],
        ),
        StageTemplate::new(
            "Eval",
            "python",
            &[
                "metrics.py",
                "--source_paths",
                "{source_path}",
                "--model_paths",
                "{model_path}",
                "--iteration",
                "{iteration}",
                "--idx",
                "{index}",
            ],
        ),
    ]
}

fn substitute(stage: &str, input: &str, placeholders: &Placeholders) -> Result<String> {
    let unbalanced = || ConfigError::UnbalancedBrace {
        stage: stage.to_string(),
        arg: input.to_string(),
    };

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(unbalanced()),
                        Some(ch) => name.push(ch),
                    }
                }
                let value = placeholders.get(&name).ok_or_else(|| {
                    ConfigError::UnknownPlaceholder {
                        stage: stage.to_string(),
                        name: name.clone(),
                    }
                })?;
                out.push_str(value);
            }
            '}' => return Err(unbalanced()),
            _ => out.push(c),
        }
    }

    Ok(out)
}
