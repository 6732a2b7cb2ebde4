//! Workspace prompt files.
//!
//! Prompts live as `<id>.yml` under `.liftrag/prompts/`. A file is only
//! accepted when its `id` matches the file name and its template keeps both
//! placeholders the knowledge base fills in, so a broken prompt is reported
//! when it is loaded rather than when the first question is asked.

use crate::types::{PromptDefinition, INPUT_MARKER, SEARCH_RESULTS_MARKER};
use liftrag_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

const PROMPTS_DIR: &str = ".liftrag/prompts";
const PROMPT_EXTENSION: &str = "yml";

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(PROMPTS_DIR)
}

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    prompts_dir(workspace_path).join(format!("{}.{}", prompt_id, PROMPT_EXTENSION))
}

/// Load and check the workspace prompt `prompt_id`.
///
/// # Example
/// ```no_run
/// use liftrag_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "kb.answer.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let path = prompt_path(workspace_path, prompt_id);
    if !path.is_file() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    tracing::debug!("Loading prompt from: {:?}", path);
    let definition = read_definition(&path)?;
    check_definition(&definition, prompt_id).map_err(|problems| {
        AppError::Prompt(format!("Prompt {:?} is invalid: {}", path, problems))
    })?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
    Ok(definition)
}

/// Load a prompt, falling back to the built-in default for its id.
///
/// Only the built-in id may be missing on disk; any other missing id is an error.
pub fn load_prompt_or_default(
    workspace_path: &Path,
    prompt_id: &str,
) -> AppResult<PromptDefinition> {
    let builtin = PromptDefinition::default_answer();

    if prompt_id == builtin.id && !prompt_path(workspace_path, prompt_id).exists() {
        tracing::debug!("Using built-in prompt: {}", builtin.id);
        return Ok(builtin);
    }

    load_prompt(workspace_path, prompt_id)
}

/// Ids of the prompt files in the workspace, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<String> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()) == Some(PROMPT_EXTENSION)
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();

    ids.sort();
    Ok(ids)
}

fn read_definition(path: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))
}

/// Every problem with `def`, joined, or `Ok` when it is usable as `expected_id`.
fn check_definition(def: &PromptDefinition, expected_id: &str) -> Result<(), String> {
    let mut problems = Vec::new();

    if def.id != expected_id {
        problems.push(format!("id '{}' does not match file name '{}'", def.id, expected_id));
    }
    if def.title.trim().is_empty() {
        problems.push("title is empty".to_string());
    }
    if !def.api_version.contains('.') {
        problems.push(format!("apiVersion '{}' is not of the form x.y", def.api_version));
    }
    for marker in [SEARCH_RESULTS_MARKER, INPUT_MARKER] {
        if !def.template.contains(marker) {
            problems.push(format!("template is missing {}", marker));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}
