//! Example: Basic BerylDB usage
//!
//! This example walks through the full lifecycle of an embedded vector
//! database: create collections, insert vectors, search, retrieve, delete,
//! and reopen to show that everything survived on disk.

use beryl_db::{Database, Metric};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beryl_db=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 BerylDB Basic Usage Example\n");

    let path = "./data/basic_usage";

    // =====================
    // 1. Create and fill a collection
    // =====================
    println!("📦 Opening database at {path}...");
    let db = Database::open(path)?;

    if db.contains("articles") {
        db.delete_collection("articles")?;
    }
    let articles = db.create_collection("articles", 4, Metric::Cosine, None)?;

    println!("✏️  Inserting vectors...");
    {
        let mut articles = articles.lock();
        articles.insert(1, &[0.9, 0.1, 0.0, 0.0])?;
        articles.insert(2, &[0.8, 0.2, 0.0, 0.1])?;
        articles.insert(3, &[0.0, 0.1, 0.9, 0.3])?;
        articles.insert(4, &[0.1, 0.0, 0.8, 0.4])?;
        println!("   {} vectors stored", articles.count());
    }

    // =====================
    // 2. Search
    // =====================
    println!("🔍 Searching for neighbors of [1.0, 0.0, 0.0, 0.0]...");
    {
        let articles = articles.lock();
        for hit in articles.search(&[1.0, 0.0, 0.0, 0.0], 3, None)? {
            println!("   id: {}, distance: {:.4}", hit.id, hit.distance);
        }
    }

    // =====================
    // 3. Retrieve and delete
    // =====================
    {
        let mut articles = articles.lock();

        println!("📖 Exact retrieval:");
        if let Some(vector) = articles.get(3) {
            println!("   id 3 = {vector:?}");
        }

        println!("🗑️  Deleting id 4...");
        articles.delete(4);
        println!("   {} vectors remain", articles.count());
    }

    // =====================
    // 4. A second collection with a different metric
    // =====================
    if db.contains("signals") {
        db.delete_collection("signals")?;
    }
    let signals = db.create_collection("signals", 2, Metric::L2, None)?;
    {
        let mut signals = signals.lock();
        signals.insert(100, &[0.0, 0.0])?;
        signals.insert(101, &[3.0, 4.0])?;
    }
    println!("📚 Collections: {:?}", db.list_collections());

    // =====================
    // 5. Persist and reopen
    // =====================
    println!("💾 Closing (saves everything)...");
    db.close()?;

    println!("📂 Reopening...");
    let db = Database::open(path)?;
    let articles = db.get_collection("articles")?;
    println!(
        "   'articles' came back with {} vectors",
        articles.lock().count()
    );

    db.close()?;
    println!("\n✅ Done");
    Ok(())
}
