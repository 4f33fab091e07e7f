//! Interactive assistant shell with session memory and telemetry readout.

use anyhow::Context;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use steward_agent::AssistantPipeline;
use steward_config::RuntimeConfig;
use steward_core::{Document, Intents};
use steward_memory::ConversationMemory;
use uuid::Uuid;

const DEFAULT_PERSONA: &str = "You are a helpful AI copilot named Steward.";

pub async fn run(message: Option<String>, fast: bool, docs: Vec<String>) -> anyhow::Result<()> {
    let config = RuntimeConfig::load().context("loading configuration")?;

    let memory = ConversationMemory::new(&config.memory)
        .await
        .context("opening conversation memory")?;
    let pipeline = AssistantPipeline::new(config)
        .context("building pipeline")?
        .with_memory(Arc::new(memory));

    let documents = load_documents(&docs);
    if !documents.is_empty() {
        println!("Ingested {} document(s).", documents.len());
        pipeline.ingest_documents(documents);
    }

    let session_id = Uuid::new_v4().to_string();

    if let Some(message) = message {
        let intents = build_intents(&message, DEFAULT_PERSONA, &session_id, fast, false, &[]);
        let payload = pipeline.handle(&intents, &json!({"turn": 1})).await?;
        print_reply(&payload);
        return Ok(());
    }

    run_repl(&pipeline, &session_id, fast).await
}

async fn run_repl(pipeline: &AssistantPipeline, session_id: &str, fast: bool) -> anyhow::Result<()> {
    let mut persona = DEFAULT_PERSONA.to_string();
    let mut history: Vec<(String, String)> = Vec::new();
    let mut fast_mode = fast;
    let mut offline_mode = false;

    println!("--- Steward shell ---");
    println!(
        "Commands: /exit, /clear, /persona <text>, /model <default|fast|offline>, /history,"
    );
    println!("          /tools, /grant <tool>, /revoke <tool>, /pause, /resume, /privilege <level>");
    println!("Type your message and press Enter.");

    loop {
        print!("You> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            println!("\nExiting shell.");
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            let (command, argument) = command.split_once(' ').unwrap_or((command, ""));
            let argument = argument.trim();
            match command {
                "exit" => {
                    println!("Goodbye.");
                    break;
                }
                "clear" => {
                    history.clear();
                    println!("History cleared.");
                }
                "persona" => {
                    if !argument.is_empty() {
                        persona = argument.to_string();
                    }
                    println!("Persona set to: {persona}");
                }
                "model" => match argument {
                    "default" => {
                        fast_mode = fast;
                        offline_mode = false;
                        println!("Model routing updated: default");
                    }
                    "fast" => {
                        fast_mode = true;
                        offline_mode = false;
                        println!("Model routing updated: fast");
                    }
                    "offline" => {
                        fast_mode = false;
                        offline_mode = true;
                        println!("Model routing updated: offline");
                    }
                    _ => println!("Valid options: default, fast, offline"),
                },
                "history" => {
                    if history.is_empty() {
                        println!("(history empty)");
                    }
                    for (role, content) in &history {
                        println!("{role}: {content}");
                    }
                }
                "tools" => {
                    for tool in pipeline.tools().list_tools() {
                        let consent = if !tool.requires_consent {
                            "no consent needed"
                        } else if tool.consent_granted {
                            "consent granted"
                        } else {
                            "consent required"
                        };
                        println!("{:<24} [{}] {} — {}", tool.name, tool.category, consent, tool.description);
                    }
                }
                "grant" => {
                    pipeline.tools().grant_consent(argument);
                    println!("Consent granted for '{argument}'.");
                }
                "revoke" => {
                    pipeline.tools().revoke_consent(argument);
                    println!("Consent revoked for '{argument}'.");
                }
                "pause" => {
                    pipeline.safety().pause();
                    println!("Safety paused: privileged tools disabled.");
                }
                "resume" => {
                    pipeline.safety().resume();
                    println!("Safety resumed.");
                }
                "privilege" => match pipeline.safety().set_privilege(argument) {
                    Ok(()) => println!("Privilege set to '{argument}'."),
                    Err(e) => println!("{e}"),
                },
                _ => println!("Unknown command."),
            }
            continue;
        }

        let intents =
            build_intents(input, &persona, session_id, fast_mode, offline_mode, &history);
        let state = json!({"turn": history.len() / 2 + 1});
        match pipeline.handle(&intents, &state).await {
            Ok(payload) => {
                history.push(("user".into(), input.to_string()));
                history.push((
                    "assistant".into(),
                    payload["response"].as_str().unwrap_or("").to_string(),
                ));
                print_reply(&payload);
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}

fn build_intents(
    query: &str,
    persona: &str,
    session_id: &str,
    fast_mode: bool,
    offline_mode: bool,
    history: &[(String, String)],
) -> Intents {
    let window = history.len().saturating_sub(8);
    let history_json: Vec<Value> = history[window..]
        .iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect();

    let mut payload = json!({
        "skill": "assistant",
        "query": query,
        "session_id": session_id,
        "instructions": persona,
        "history": history_json,
    });
    if fast_mode {
        payload["fast_path"] = json!(true);
    }
    if offline_mode {
        payload["offline_only"] = json!(true);
    }
    Intents::from_value(payload)
}

fn load_documents(paths: &[String]) -> Vec<Document> {
    let mut documents = Vec::new();
    for raw_path in paths {
        let path = Path::new(raw_path);
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::warn!("Skipping unreadable document {raw_path}");
            continue;
        };
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        documents.push(
            Document::new(name.unwrap_or_else(|| raw_path.clone()), content)
                .with_metadata("title", stem.unwrap_or_else(|| raw_path.clone()))
                .with_metadata("source_path", raw_path.clone()),
        );
    }
    documents
}

fn print_reply(payload: &Value) {
    let response = payload["response"].as_str().unwrap_or("");
    println!("Assistant> {response}");

    let metadata = &payload["metadata"];
    let mut parts: Vec<String> = Vec::new();
    if let Some(latency) = metadata["latency_ms"].as_object() {
        if !latency.is_empty() {
            let stages: Vec<String> = latency
                .iter()
                .map(|(stage, value)| format!("{stage}={:.1}ms", value.as_f64().unwrap_or(0.0)))
                .collect();
            parts.push(format!("latency: {}", stages.join(", ")));
        }
    }
    if let Some(usage) = metadata["usage"].as_object() {
        let tokens: Vec<String> = ["prompt_tokens", "completion_tokens", "total_tokens"]
            .iter()
            .filter_map(|key| usage.get(*key).map(|v| format!("{key}={v}")))
            .collect();
        parts.push(format!("tokens: {}", tokens.join(", ")));
    }
    if let Some(model) = metadata["model"].as_str() {
        parts.push(format!("model: {model}"));
    }
    if !parts.is_empty() {
        println!("  ▸ {}", parts.join(" | "));
    }
}
