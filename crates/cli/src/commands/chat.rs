//! `fireside chat` — Interactive or single-message session mode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fireside_config::AppConfig;
use fireside_core::message::Role;
use fireside_memory::MemoryStore;
use fireside_providers::OpenAiChatService;
use fireside_session::{SessionCoordinator, SessionEvent, SessionSettings, TranscriptStore};
use fireside_tools::{ToolRouter, default_registry};
use tokio::sync::mpsc;

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    FIRESIDE_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    };

    let service = Arc::new(
        OpenAiChatService::new("openai", &config.base_url, api_key)
            .context("Failed to build completion service")?,
    );

    let memory = Arc::new(MemoryStore::open(config.data_dir.join("memories.json")));
    let transcript = Arc::new(TranscriptStore::open(config.data_dir.join("chat.json")));
    let tools = ToolRouter::new(default_registry(&config.data_dir));

    let settings = SessionSettings {
        model: config.model.clone(),
        temperature: config.temperature,
        initial_prompt: config.prompts.initial.clone(),
        summary_prompt: config.prompts.summary.clone(),
        location: if config.session.location.is_empty() {
            "unknown".into()
        } else {
            config.session.location.clone()
        },
        inactivity_threshold: Duration::from_secs(config.session.inactivity_threshold_secs),
        poll_interval: Duration::from_secs(config.session.poll_interval_secs),
        max_tool_rounds: config.session.max_tool_rounds,
    };

    let coordinator = Arc::new(SessionCoordinator::new(
        service,
        memory,
        transcript,
        tools,
        settings,
    ));
    coordinator.start_up().await;

    if let Some(msg) = message {
        run_turn(&coordinator, &msg).await;
        coordinator.shutdown().await;
        return Ok(());
    }

    println!();
    println!("  Fireside — Interactive Session");
    println!();
    println!("  Model: {}", config.model);
    println!("  Data:  {}", config.data_dir.display());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    use std::io::{BufRead, Write};
    let stdin = std::io::stdin();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        print!("  Fireside > ");
        std::io::stdout().flush()?;
        run_turn(&coordinator, line).await;
        println!();
    }

    coordinator.shutdown().await;
    println!();
    println!("  Until next time.");
    println!();
    Ok(())
}

/// Drive one turn, printing chunks as they stream in.
async fn run_turn(coordinator: &Arc<SessionCoordinator>, text: &str) {
    let (tx, mut rx) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        use std::io::Write;
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Chunk { content } => {
                    print!("{content}");
                    let _ = std::io::stdout().flush();
                }
                SessionEvent::ToolCall { name, .. } => {
                    eprintln!();
                    eprintln!("  [using {name}...]");
                }
                SessionEvent::Error { message } => {
                    eprintln!();
                    eprintln!("  {message}");
                }
                SessionEvent::ToolResult { .. } | SessionEvent::Done { .. } => {}
            }
        }
    });

    coordinator.process_turn(text, Role::User, &tx).await;
    drop(tx);
    let _ = printer.await;
    println!();
}
