//! Which city is hotter?
//!
//! Runs the weather round trip against a scripted provider, logging every
//! prompt it is sent. Set `TOOLRELAY_LOG_LEVEL=debug` to see state changes.
//!
//! ```sh
//! cargo run -p toolrelay-core --example weather
//! ```

use std::sync::Arc;

use serde_json::json;
use toolrelay_core::providers::{MockProvider, MockStep};
use toolrelay_core::tools::require_str;
use toolrelay_core::{
    Completion, ConsoleLogger, Coordinator, Field, InspectingProvider, Logger, MessageRole,
    ProviderModelConfig, Schema, Session, ToolCall, ToolDescriptor, ToolRegistry,
};

fn temperature(location: &str) -> &'static str {
    match location {
        "Los Angeles, CA" => "28°C",
        "New York, NY" => "22°C",
        _ => "Weather data unavailable",
    }
}

fn population(location: &str) -> &'static str {
    match location {
        "Los Angeles, CA" => "3.9 million",
        "New York, NY" => "8.4 million",
        _ => "Population data unavailable",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new());

    let location = || Schema::new("location").field(Field::string("location", "City and state"));
    let tools = ToolRegistry::with_tools(
        vec![
            ToolDescriptor::from_fn("getWeather", "Get weather for a location", location(), |args| {
                Ok(temperature(require_str(args, "location")?).to_string())
            }),
            ToolDescriptor::from_fn("getPopulation", "Get population for a location", location(), |args| {
                Ok(population(require_str(args, "location")?).to_string())
            }),
        ],
        Arc::clone(&logger),
    )?;

    let script = vec![
        MockStep::tool_calls(vec![
            ToolCall::new("call_la", "getWeather", json!({"location": "Los Angeles, CA"})),
            ToolCall::new("call_ny", "getWeather", json!({"location": "New York, NY"})),
        ]),
        MockStep::respond(|messages| {
            let readings: Vec<String> = messages
                .iter()
                .filter(|m| m.role == MessageRole::Tool)
                .map(|m| m.flattened_text())
                .collect();
            Completion::Answer(format!(
                "Los Angeles ({}) is hotter than New York ({}).",
                readings.first().map(String::as_str).unwrap_or("?"),
                readings.get(1).map(String::as_str).unwrap_or("?"),
            ))
        }),
    ];
    let provider = Arc::new(InspectingProvider::new(
        Arc::new(MockProvider::scripted(script, Arc::clone(&logger))),
        Arc::clone(&logger),
    ));

    let coordinator = Coordinator::new(
        provider,
        Arc::new(tools),
        ProviderModelConfig::new("gpt-4.1-nano"),
        Arc::clone(&logger),
    );
    let mut session = Session::new().with_system_prompt("You are a helpful assistant.");

    let round_trip = coordinator
        .run(&mut session, "Which city is hotter, LA or NY?")
        .await?;

    println!("{}", round_trip.text().unwrap_or_default());
    for result in &round_trip.tool_results {
        println!("  {} -> {}", result.call_id, result.content);
    }
    Ok(())
}
