//! `fireside memories` — Show the stored memory records.

use anyhow::Context;
use fireside_config::AppConfig;
use fireside_core::memory::Memory;
use fireside_memory::MemoryStore;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let store = MemoryStore::open(config.data_dir.join("memories.json"));

    let memories = store.recap().await;
    if memories.is_empty() {
        println!("  No memories yet.");
        return Ok(());
    }

    println!("  {} memories stored:", memories.len());
    println!();
    for memory in &memories {
        let line = match memory {
            Memory::Person(p) if p.is_self => format!("myself — {}", p.name),
            Memory::Person(p) => format!("{} ({})", p.name, p.relation),
            Memory::Event(e) => e.note.clone(),
            Memory::Fact(f) => format!("{} (from {})", f.note, f.source),
            Memory::Conversation(c) if !c.summary.is_empty() => c.summary.clone(),
            Memory::Conversation(_) => "a conversation awaiting its summary".into(),
        };
        println!(
            "  [{:<12}] {}  {}",
            memory.kind(),
            memory.created_at().format("%Y-%m-%d"),
            line
        );
    }
    Ok(())
}
