//! Structured answers and config-built coordinators

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tempfile::tempdir;

use toolrelay_core::providers::{MockProvider, MockStep};
use toolrelay_core::{
    Answer, CancellationToken, ConfigProvider, Coordinator, ErrorKind, Field, FieldType,
    FileConfigProvider, MemorySecretStore, NoOpLogger, ProviderModelConfig, RoundTripError,
    Schema, Session, ToolCall, ToolRegistry,
};

#[derive(Debug, Deserialize, PartialEq)]
struct ContactInfo {
    name: String,
    email: String,
    phone: String,
}

fn contact_schema() -> Schema {
    Schema::new("ContactInfo")
        .with_description("Contact information for a person.")
        .field(Field::string("name", "The name of the person"))
        .field(Field::string("email", "The email address of the person"))
        .field(Field::string("phone", "The phone number of the person"))
}

fn extraction_schema() -> Schema {
    let event = Schema::new("EventDetails")
        .field(Field::string("event_name", "Name of the event"))
        .field(Field::string("date", "Event date"));
    let contact = Schema::new("ContactInfo")
        .field(Field::string("name", "Person's name"))
        .field(Field::string("email", "Email address"));
    Schema::new("ExtractionResult").field(Field::list(
        "items",
        FieldType::OneOf {
            variants: vec![
                FieldType::Object { schema: contact },
                FieldType::Object { schema: event },
            ],
        },
        "Every contact and event found in the text",
    ))
}

fn coordinator(steps: Vec<MockStep>) -> (Coordinator, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::scripted(steps, NoOpLogger::shared()));
    let tools = Arc::new(ToolRegistry::new(NoOpLogger::shared()));
    let coordinator = Coordinator::new(
        provider.clone(),
        tools,
        ProviderModelConfig::new("gpt-4.1-nano"),
        NoOpLogger::shared(),
    );
    (coordinator, provider)
}

const CONTACT_TEXT: &str = "Extract contact info from: John Doe, john@example.com, (555) 123-4567";

#[tokio::test]
async fn contact_info_is_extracted_into_a_typed_value() {
    let (coordinator, provider) = coordinator(vec![MockStep::answer(
        r#"{"name": "John Doe", "email": "john@example.com", "phone": "(555) 123-4567"}"#,
    )]);
    let mut session = Session::new();

    let (contact, round_trip) = coordinator
        .run_structured_as::<ContactInfo>(&mut session, CONTACT_TEXT, &contact_schema(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        contact,
        ContactInfo {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            phone: "(555) 123-4567".into(),
        }
    );
    assert!(round_trip.answer.as_structured().is_some());
    // No tools registered, so none were offered
    assert!(provider.requests()[0].options.tools.is_empty());
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn missing_field_fails_without_partial_result() {
    let (coordinator, _) = coordinator(vec![MockStep::answer(
        r#"{"name": "John Doe", "email": "john@example.com"}"#,
    )]);
    let mut session = Session::new();

    let err = coordinator
        .run_structured(&mut session, CONTACT_TEXT, &contact_schema(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaValidationFailed);
    match err {
        RoundTripError::SchemaValidationFailed { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "$.phone");
            assert_eq!(errors[0].message, "missing required field");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(session.is_empty());
}

#[tokio::test]
async fn payload_that_validates_but_does_not_deserialize_is_rejected() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict {
        name: String,
        age: u32,
    }

    let schema = Schema::new("Person").field(Field::string("name", "Name"));
    let (coordinator, _) = coordinator(vec![MockStep::answer(r#"{"name": "Jane"}"#)]);
    let mut session = Session::new();

    let err = coordinator
        .run_structured_as::<Strict>(&mut session, "who?", &schema, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaValidationFailed);
    assert!(session.is_empty());
}

#[tokio::test]
async fn mixed_union_list_is_validated_per_item() {
    let text = "Contact John Doe at john@email.com about the Tech Conference on March 15th";
    let good = json!({"items": [
        {"name": "John Doe", "email": "john@email.com"},
        {"event_name": "Tech Conference", "date": "March 15th"}
    ]});
    let (coordinator, _) = coordinator(vec![
        MockStep::answer(format!("```json\n{}\n```", good)),
        MockStep::answer(r#"{"items": [{"name": "John Doe"}]}"#),
    ]);
    let mut session = Session::new();

    let round_trip = coordinator
        .run_structured(&mut session, text, &extraction_schema(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(round_trip.answer, Answer::Structured(good));

    let err = coordinator
        .run_structured(&mut session, text, &extraction_schema(), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        RoundTripError::SchemaValidationFailed { errors, .. } => {
            assert_eq!(errors[0].path, "$.items[0]");
        }
        other => panic!("unexpected error: {}", other),
    }
    // The first exchange is untouched by the failed second one
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn structured_answer_after_tool_round() {
    let lookup = toolrelay_core::ToolDescriptor::from_fn(
        "lookupPhone",
        "Find a phone number by name",
        Schema::new("lookupPhone").field(Field::string("name", "Person's name")),
        |_| Ok("(555) 123-4567".to_string()),
    );
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::tool_calls(vec![ToolCall::new("l1", "lookupPhone", json!({"name": "John Doe"}))]),
            MockStep::answer(r#"{"name": "John Doe", "email": "john@example.com", "phone": "(555) 123-4567"}"#),
        ],
        NoOpLogger::shared(),
    ));
    let coordinator = Coordinator::new(
        provider.clone(),
        Arc::new(ToolRegistry::with_tools(vec![lookup], NoOpLogger::shared()).unwrap()),
        ProviderModelConfig::new("gpt-4.1-nano"),
        NoOpLogger::shared(),
    );

    let (contact, round_trip) = coordinator
        .run_structured_as::<ContactInfo>(
            &mut Session::new(),
            "John Doe, john@example.com",
            &contact_schema(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(contact.phone, "(555) 123-4567");
    assert_eq!(round_trip.tool_results.len(), 1);
    for request in provider.requests() {
        assert!(request.options.output_schema.is_some());
        assert_eq!(request.options.tools.len(), 1);
    }
}

#[tokio::test]
async fn coordinator_from_config_file() {
    let dir = tempdir().unwrap();
    let config_provider = FileConfigProvider::workspace(dir.path());
    std::fs::create_dir_all(config_provider.path().parent().unwrap()).unwrap();
    std::fs::write(
        config_provider.path(),
        "provider:\n  name: mock\n  model: mock-echo\n  temperature: 0.0\ncoordinator:\n  max_tool_rounds: 2\n",
    )
    .unwrap();

    let config = config_provider.load().await.unwrap();
    let coordinator = Coordinator::from_config(
        &config,
        ToolRegistry::new(NoOpLogger::shared()),
        Arc::new(MemorySecretStore::new()),
        NoOpLogger::shared(),
    );

    assert_eq!(coordinator.provider().name(), "mock");
    assert_eq!(coordinator.options().max_tool_rounds, 2);
    assert_eq!(coordinator.options().temperature, Some(0.0));

    let round_trip = coordinator.run(&mut Session::new(), "ping").await.unwrap();
    assert_eq!(round_trip.text(), Some("Echo: ping"));
}
