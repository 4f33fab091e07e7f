//! Diagnose system health: configuration, storage, and subsystem wiring.

use steward_agent::AssistantPipeline;
use steward_config::RuntimeConfig;
use steward_memory::ConversationMemory;
use steward_voice::VoiceOrchestrator;

pub async fn run() -> anyhow::Result<()> {
    let mut failures = 0;

    let config = match RuntimeConfig::load() {
        Ok(config) => {
            println!("ok   configuration loads and validates");
            config
        }
        Err(e) => {
            println!("FAIL configuration: {e}");
            return Err(e.into());
        }
    };

    match ConversationMemory::new(&config.memory).await {
        Ok(_) => println!("ok   conversation memory opens at {}", config.memory.db_path),
        Err(e) => {
            println!("FAIL conversation memory: {e}");
            failures += 1;
        }
    }

    match AssistantPipeline::new(config.clone()) {
        Ok(pipeline) => {
            println!("ok   audit log writable at {}", config.safety.audit_log_path);
            let tools = pipeline.tools().list_tools();
            println!("ok   {} tool(s) registered:", tools.len());
            for tool in tools {
                let consent = if tool.requires_consent { " (consent)" } else { "" };
                println!("       {} [{}]{}", tool.name, tool.category, consent);
            }
        }
        Err(e) => {
            println!("FAIL pipeline: {e}");
            failures += 1;
        }
    }

    let voice = VoiceOrchestrator::new(&config.voice);
    println!("ok   speech source: {}", voice.source_name());

    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }
    println!("All checks passed.");
    Ok(())
}
