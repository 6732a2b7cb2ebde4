//! Prompt builder for rendering generation templates.

use crate::types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, INPUT_MARKER, SEARCH_RESULTS_MARKER,
};
use handlebars::Handlebars;
use liftrag_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a generation template from a definition.
///
/// This function:
/// 1. Merges the definition's default variables with `overrides`
/// 2. Renders the template using Handlebars
/// 3. Checks both service placeholders survived rendering
///
/// # Example
/// ```
/// use liftrag_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// let built = build_prompt(&PromptDefinition::default_answer(), HashMap::new()).unwrap();
/// assert!(built.template.contains("$input$"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    overrides: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = definition.variables.clone();
    variables.extend(overrides);

    let rendered = render_template(&definition.template, &variables)?;

    for marker in [SEARCH_RESULTS_MARKER, INPUT_MARKER] {
        if !rendered.contains(marker) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' is missing the {} placeholder",
                definition.id, marker
            )));
        }
    }

    Ok(BuiltPrompt {
        template: rendered,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables: variables,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
