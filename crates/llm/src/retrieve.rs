//! RetrieveAndGenerate request/response types and metadata filters.
//!
//! `RetrieveAndGenerateRequest` is the flat, liftrag-facing description of one
//! turn; `to_wire` produces the nested body the agent runtime expects.

use serde::{Deserialize, Serialize};

/// Metadata predicate restricting which documents retrieval may return.
///
/// Serializes to the knowledge-base filter shape:
/// `{"equals": {"key": .., "value": ..}}` or `{"andAll": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataFilter {
    /// A single equality clause
    Equals(FilterClause),
    /// Conjunction of two or more filters
    AndAll(Vec<MetadataFilter>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub key: String,
    pub value: String,
}

impl MetadataFilter {
    /// Single equality clause.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals(FilterClause {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Conjunction of `clauses`, collapsed to its smallest form.
    ///
    /// No clauses yields `None` and a single clause is returned bare, so an
    /// `AndAll` always holds at least two members.
    pub fn all_of(clauses: Vec<FilterClause>) -> Option<Self> {
        let mut filters: Vec<MetadataFilter> = clauses.into_iter().map(Self::Equals).collect();
        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Self::AndAll(filters)),
        }
    }

    /// Every equality clause in this filter, depth first.
    pub fn clauses(&self) -> Vec<&FilterClause> {
        match self {
            Self::Equals(clause) => vec![clause],
            Self::AndAll(filters) => filters.iter().flat_map(|f| f.clauses()).collect(),
        }
    }
}

/// One retrieve-and-generate turn against a knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveAndGenerateRequest {
    /// Query text sent to retrieval and generation
    pub query: String,

    pub knowledge_base_id: String,

    pub model_arn: String,

    /// Number of chunks the vector search returns
    pub top_k: u32,

    /// Omitted from the body when absent
    pub filter: Option<MetadataFilter>,

    /// Custom template; the service default applies when absent
    pub prompt_template: Option<String>,

    /// Session to continue; a new one is started when absent
    pub session_id: Option<String>,
}

impl RetrieveAndGenerateRequest {
    pub fn new(
        query: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        model_arn: impl Into<String>,
        top_k: u32,
    ) -> Self {
        Self {
            query: query.into(),
            knowledge_base_id: knowledge_base_id.into(),
            model_arn: model_arn.into(),
            top_k,
            filter: None,
            prompt_template: None,
            session_id: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<MetadataFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_prompt_template(mut self, template: Option<String>) -> Self {
        self.prompt_template = template;
        self
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Nested request body in the agent runtime wire format.
    pub fn to_wire(&self) -> WireRequest<'_> {
        WireRequest {
            input: WireInput { text: &self.query },
            retrieve_and_generate_configuration: WireConfiguration {
                kind: "KNOWLEDGE_BASE",
                knowledge_base_configuration: WireKnowledgeBaseConfiguration {
                    knowledge_base_id: &self.knowledge_base_id,
                    model_arn: &self.model_arn,
                    retrieval_configuration: WireRetrievalConfiguration {
                        vector_search_configuration: WireVectorSearch {
                            number_of_results: self.top_k,
                            filter: self.filter.as_ref(),
                        },
                    },
                    generation_configuration: self.prompt_template.as_deref().map(|template| {
                        WireGenerationConfiguration {
                            prompt_template: WirePromptTemplate {
                                text_prompt_template: template,
                            },
                        }
                    }),
                },
            },
            session_id: self.session_id.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest<'a> {
    input: WireInput<'a>,
    retrieve_and_generate_configuration: WireConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireConfiguration<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    knowledge_base_configuration: WireKnowledgeBaseConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireKnowledgeBaseConfiguration<'a> {
    knowledge_base_id: &'a str,
    model_arn: &'a str,
    retrieval_configuration: WireRetrievalConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_configuration: Option<WireGenerationConfiguration<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRetrievalConfiguration<'a> {
    vector_search_configuration: WireVectorSearch<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireVectorSearch<'a> {
    number_of_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a MetadataFilter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfiguration<'a> {
    prompt_template: WirePromptTemplate<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptTemplate<'a> {
    text_prompt_template: &'a str,
}

/// Generated answer plus the session it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateResponse {
    pub session_id: String,
    pub output: GenerationOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
}

impl RetrieveAndGenerateResponse {
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            output: GenerationOutput { text: text.into() },
        }
    }

    pub fn text(&self) -> &str {
        &self.output.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clause(value: &str) -> FilterClause {
        FilterClause {
            key: "Elevator".to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_single_clause_is_bare() {
        let filter = MetadataFilter::all_of(vec![clause("Elevador PVE 30")]).unwrap();
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"equals": {"key": "Elevator", "value": "Elevador PVE 30"}})
        );
    }

    #[test]
    fn test_no_clauses_is_absent() {
        assert!(MetadataFilter::all_of(Vec::new()).is_none());
    }

    #[test]
    fn test_two_clauses_and_all() {
        let filter =
            MetadataFilter::all_of(vec![clause("Elevador PVE 30"), clause("Elevador PVE 37")])
                .unwrap();
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"andAll": [
                {"equals": {"key": "Elevator", "value": "Elevador PVE 30"}},
                {"equals": {"key": "Elevator", "value": "Elevador PVE 37"}}
            ]})
        );
        assert_eq!(filter.clauses().len(), 2);
    }

    #[test]
    fn test_minimal_wire_body() {
        let request = RetrieveAndGenerateRequest::new("hola", "KB1", "arn:model", 6);
        assert_eq!(
            serde_json::to_value(request.to_wire()).unwrap(),
            json!({
                "input": {"text": "hola"},
                "retrieveAndGenerateConfiguration": {
                    "type": "KNOWLEDGE_BASE",
                    "knowledgeBaseConfiguration": {
                        "knowledgeBaseId": "KB1",
                        "modelArn": "arn:model",
                        "retrievalConfiguration": {
                            "vectorSearchConfiguration": {"numberOfResults": 6}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_full_wire_body() {
        let request = RetrieveAndGenerateRequest::new("hola", "KB1", "arn:model", 3)
            .with_filter(Some(MetadataFilter::equals("Elevator", "Elevador PVE 52")))
            .with_prompt_template(Some("$search_results$ $input$".to_string()))
            .with_session_id(Some("sess-1".to_string()));

        let body = serde_json::to_value(request.to_wire()).unwrap();
        let kb = &body["retrieveAndGenerateConfiguration"]["knowledgeBaseConfiguration"];
        assert_eq!(
            kb["retrievalConfiguration"]["vectorSearchConfiguration"]["filter"]["equals"]["value"],
            "Elevador PVE 52"
        );
        assert_eq!(
            kb["generationConfiguration"]["promptTemplate"]["textPromptTemplate"],
            "$search_results$ $input$"
        );
        assert_eq!(body["sessionId"], "sess-1");
    }

    #[test]
    fn test_response_deserialization() {
        let response: RetrieveAndGenerateResponse = serde_json::from_value(json!({
            "sessionId": "abc",
            "output": {"text": "El PVE 30 tiene..."},
            "citations": []
        }))
        .unwrap();
        assert_eq!(response.session_id, "abc");
        assert_eq!(response.text(), "El PVE 30 tiene...");
    }
}
