//! Multi-turn behavior of the orchestrator against in-memory clients.

use super::doubles::{text_reply, tool_reply, RecordingGenerate, ScriptedConverse};
use crate::extract::EntityExtractor;
use crate::filter::{FilterBuilder, ELEVATOR_KEY};
use crate::rag::{FilterSource, RagOrchestrator, TurnOptions};
use crate::session::{ChatRole, ConversationContext};
use futures::StreamExt;
use liftrag_core::{AppError, AppResult};
use liftrag_llm::{ConverseResponse, MetadataFilter, RetrieveAndGenerateResponse};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const KNOWN: [&str; 3] = ["Elevador PVE 30", "Elevador PVE 37", "Elevador PVE 52"];

fn elevator(value: &str) -> ConverseResponse {
    tool_reply(json!({"entities": [{"Elevator": value}]}))
}

fn answer(session_id: &str, text: &str) -> AppResult<RetrieveAndGenerateResponse> {
    Ok(RetrieveAndGenerateResponse::new(session_id, text))
}

fn pipeline(
    extractions: Vec<AppResult<ConverseResponse>>,
    answers: Vec<AppResult<RetrieveAndGenerateResponse>>,
    filters: FilterBuilder,
) -> (RagOrchestrator, Arc<ScriptedConverse>, Arc<RecordingGenerate>) {
    let converse = Arc::new(ScriptedConverse::new(extractions));
    let generate = Arc::new(RecordingGenerate::new(answers));
    let orchestrator = RagOrchestrator::new(
        EntityExtractor::new(converse.clone(), "amazon.nova-pro-v1:0"),
        filters,
        generate.clone(),
        "KB123",
    );
    (orchestrator, converse, generate)
}

fn options() -> TurnOptions {
    TurnOptions::new("arn:aws:bedrock:us-east-1::foundation-model/amazon.nova-pro-v1:0")
}

#[tokio::test]
async fn test_first_turn_request() {
    let (rag, converse, generate) = pipeline(
        vec![Ok(elevator("Elevador PVE 30"))],
        vec![answer("s-1", "Carga maxima 250 kg")],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    let reply = rag
        .respond(&mut ctx, "capacidad del pve 30", &options().with_top_k(4))
        .await
        .unwrap();

    assert_eq!(converse.last_text().as_deref(), Some("capacidad del PVE 30"));
    assert_eq!(generate.calls(), 1);

    let request = generate.request(0);
    assert_eq!(request.query, "capacidad del PVE 30");
    assert_eq!(request.knowledge_base_id, "KB123");
    assert_eq!(request.top_k, 4);
    assert_eq!(request.session_id, None);
    assert_eq!(request.prompt_template, None);
    assert_eq!(
        request.filter,
        Some(MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 30"))
    );

    assert_eq!(reply.filter_source, FilterSource::Current);
    assert_eq!(reply.session_id, "s-1");
    assert_eq!(ctx.state().session_id(), Some("s-1"));

    let tokens: Vec<String> = reply.tokens.collect().await;
    assert_eq!(tokens, vec!["Carga ", "maxima ", "250 ", "kg "]);
}

#[tokio::test]
async fn test_follow_up_reuses_filter_and_session() {
    let (rag, _, generate) = pipeline(
        vec![Ok(elevator("Elevador PVE 30")), Ok(text_reply("sin entidades"))],
        vec![answer("s-1", "uno"), answer("s-1", "dos")],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    rag.respond(&mut ctx, "info del PVE 30", &options()).await.unwrap();
    let reply = rag.respond(&mut ctx, "y el precio?", &options()).await.unwrap();

    assert_eq!(generate.calls(), 2);
    let second = generate.request(1);
    assert_eq!(second.session_id.as_deref(), Some("s-1"));
    assert_eq!(
        second.filter,
        Some(MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 30"))
    );
    assert_eq!(reply.filter_source, FilterSource::Remembered);
    assert!(reply.entities.is_none());
}

#[tokio::test]
async fn test_new_entity_replaces_remembered_filter() {
    let (rag, _, generate) = pipeline(
        vec![
            Ok(elevator("Elevador PVE 30")),
            Ok(elevator("Elevador PVE 52")),
            Ok(elevator("unknown")),
        ],
        vec![answer("s-1", "a"), answer("s-1", "b"), answer("s-1", "c")],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    for query in ["PVE 30", "PVE 52", "y ese?"] {
        rag.respond(&mut ctx, query, &options()).await.unwrap();
    }

    let expected = Some(MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 52"));
    assert_eq!(generate.request(1).filter, expected);
    assert_eq!(generate.request(2).filter, expected);
    assert_eq!(ctx.state().last_filter(), expected.as_ref());
}

#[tokio::test]
async fn test_no_filter_without_history() {
    let (rag, _, generate) = pipeline(
        vec![Ok(text_reply("nada"))],
        vec![answer("s-9", "Hola")],
        FilterBuilder::lenient(),
    );
    let mut ctx = ConversationContext::new();

    let reply = rag.respond(&mut ctx, "hola", &options()).await.unwrap();

    assert_eq!(generate.request(0).filter, None);
    assert_eq!(reply.filter_source, FilterSource::None);
    assert!(ctx.state().last_filter().is_none());
}

#[tokio::test]
async fn test_strict_rejection_falls_back_to_remembered() {
    let (rag, _, generate) = pipeline(
        vec![Ok(elevator("Elevador PVE 37")), Ok(elevator("Elevador XYZ 1"))],
        vec![answer("s-1", "a"), answer("s-1", "b")],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    rag.respond(&mut ctx, "PVE 37", &options()).await.unwrap();
    let reply = rag.respond(&mut ctx, "XYZ 1", &options()).await.unwrap();

    assert_eq!(reply.filter_source, FilterSource::Remembered);
    assert_eq!(
        generate.request(1).filter,
        Some(MetadataFilter::equals(ELEVATOR_KEY, "Elevador PVE 37"))
    );
}

#[tokio::test]
async fn test_generation_failure_leaves_state() {
    let (rag, _, generate) = pipeline(
        vec![Ok(elevator("Elevador PVE 30")), Ok(elevator("Elevador PVE 52"))],
        vec![
            answer("s-1", "ok"),
            Err(AppError::ExternalService("503 Service Unavailable".to_string())),
        ],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    rag.respond(&mut ctx, "PVE 30", &options()).await.unwrap();
    let before = ctx.state().clone();

    let err = rag.respond(&mut ctx, "PVE 52", &options()).await.unwrap_err();

    assert!(matches!(err, AppError::ExternalService(_)));
    assert_eq!(generate.calls(), 2);
    assert_eq!(ctx.state(), &before);
}

#[tokio::test]
async fn test_validation_error_skips_generation() {
    let (rag, _, generate) = pipeline(
        vec![Ok(tool_reply(json!({"entities": [{"Elevator": 30}]})))],
        vec![answer("s-1", "never")],
        FilterBuilder::lenient(),
    );
    let mut ctx = ConversationContext::new();

    let err = rag.respond(&mut ctx, "PVE 30", &options()).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(generate.calls(), 0);
}

#[tokio::test]
async fn test_invalid_top_k_rejected() {
    let (rag, converse, generate) =
        pipeline(vec![], vec![], FilterBuilder::lenient());
    let mut ctx = ConversationContext::new();

    let err = rag
        .respond(&mut ctx, "hola", &options().with_top_k(0))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(converse.calls(), 0);
    assert_eq!(generate.calls(), 0);
}

#[tokio::test]
async fn test_prompt_template_forwarded() {
    let (rag, _, generate) = pipeline(
        vec![Ok(text_reply("nada"))],
        vec![answer("s-1", "ok")],
        FilterBuilder::lenient(),
    );
    let mut ctx = ConversationContext::new();
    let options = options().with_prompt_template("$search_results$ $input$");

    rag.respond(&mut ctx, "hola", &options).await.unwrap();

    assert_eq!(
        generate.request(0).prompt_template.as_deref(),
        Some("$search_results$ $input$")
    );
}

#[tokio::test]
async fn test_transcript_records_both_sides() {
    let (rag, _, _) = pipeline(
        vec![Ok(text_reply("nada"))],
        vec![answer("s-1", "Buenas tardes")],
        FilterBuilder::lenient(),
    );
    let mut ctx = ConversationContext::new();

    rag.respond(&mut ctx, "hola", &options()).await.unwrap();

    let transcript = ctx.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, ChatRole::User);
    assert_eq!(transcript[0].content, "hola");
    assert_eq!(transcript[1].content, "Buenas tardes");
}

#[tokio::test]
async fn test_reset_forgets_filter_and_session() {
    let (rag, _, generate) = pipeline(
        vec![Ok(elevator("Elevador PVE 30")), Ok(text_reply("nada"))],
        vec![answer("s-1", "a"), answer("s-2", "b")],
        FilterBuilder::strict(KNOWN),
    );
    let mut ctx = ConversationContext::new();

    rag.respond(&mut ctx, "PVE 30", &options()).await.unwrap();
    ctx.reset();
    rag.respond(&mut ctx, "hola", &options()).await.unwrap();

    let second = generate.request(1);
    assert_eq!(second.filter, None);
    assert_eq!(second.session_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout() {
    struct Stalled;

    #[async_trait::async_trait]
    impl liftrag_llm::RetrieveGenerateClient for Stalled {
        async fn retrieve_and_generate(
            &self,
            _request: &liftrag_llm::RetrieveAndGenerateRequest,
        ) -> AppResult<RetrieveAndGenerateResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            answer("late", "late")
        }
    }

    let converse = Arc::new(ScriptedConverse::new(vec![Ok(text_reply("nada"))]));
    let rag = RagOrchestrator::new(
        EntityExtractor::new(converse, "model"),
        FilterBuilder::lenient(),
        Arc::new(Stalled),
        "KB123",
    )
    .with_timeout(Duration::from_secs(5));
    let mut ctx = ConversationContext::new();

    let err = rag.respond(&mut ctx, "hola", &options()).await.unwrap_err();
    assert!(matches!(err, AppError::Timeout(_)));
    assert!(ctx.state().session_id().is_none());
}
