//! Prompt types for liftrag.
//!
//! This module defines the prompt definition loaded from YAML and the
//! rendered template handed to the generation service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder the service replaces with the retrieved chunks.
pub const SEARCH_RESULTS_MARKER: &str = "$search_results$";

/// Placeholder the service replaces with the user query.
pub const INPUT_MARKER: &str = "$input$";

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Default values for template variables
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// Built-in template answering from retrieved elevator specifications.
    pub fn default_answer() -> Self {
        let mut variables = HashMap::new();
        variables.insert("subject".to_string(), "elevator specs".to_string());
        variables.insert("label".to_string(), "Specs".to_string());

        Self {
            id: "kb.answer.default".to_string(),
            title: "Answer from retrieved elevator specs".to_string(),
            api_version: "1.0".to_string(),
            created_by: "liftrag".to_string(),
            variables,
            template: concat!(
                "Use the following retrieved {{subject}} to answer the question. ",
                "You should always answer in the same language as the question.\n",
                "If you do not find the information required ask for clarification of the question. ",
                "Do not give information if you do not have textual information about it. ",
                "If available, give the name of the document from where you get the information.\n",
                "{{label}}:\n",
                "$search_results$\n\n",
                "Question: $input$"
            )
            .to_string(),
        }
    }
}

/// A rendered template ready to send as `textPromptTemplate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Template text still containing the service placeholders
    pub template: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: kb.answer.short
title: Short answers
apiVersion: "1.0"
createdBy: test
variables:
  subject: manuals
template: "Answer from {{subject}}: $search_results$ / $input$"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "kb.answer.short");
        assert_eq!(def.variables.get("subject").map(String::as_str), Some("manuals"));
    }

    #[test]
    fn test_variables_default_to_empty() {
        let yaml = r#"
id: p
title: P
apiVersion: "1.0"
template: "$search_results$ $input$"
"#;
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.variables.is_empty());
        assert!(def.created_by.is_empty());
    }

    #[test]
    fn test_default_answer_has_markers() {
        let def = PromptDefinition::default_answer();
        assert!(def.template.contains(SEARCH_RESULTS_MARKER));
        assert!(def.template.contains(INPUT_MARKER));
    }
}
