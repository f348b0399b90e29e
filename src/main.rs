use std::path::PathBuf;

use anyhow::Context;
use intent_gate::{IntentGateConfig, IntentPipeline};
use tracing_subscriber::EnvFilter;

/// Classify each argument and print the ranking, nearest exemplars and
/// classification as one JSON document per query.
///
/// `INTENT_GATE_CONFIG` points at a pipeline YAML file; without it the
/// defaults are used (local Ollama, built-in corpus).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var_os("INTENT_GATE_CONFIG").map(PathBuf::from) {
        Some(path) => IntentGateConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => IntentGateConfig::default(),
    };
    let pipeline = IntentPipeline::from_config(&config).context("building pipeline")?;

    let queries: Vec<String> = std::env::args().skip(1).collect();
    if queries.is_empty() {
        anyhow::bail!("usage: intent-gate <query> [<query> ...]");
    }

    for query in &queries {
        let ranking = pipeline.rank(query, None).await;
        let hybrid = pipeline.hybrid(query).await?;
        let report = serde_json::json!({
            "query": query,
            "ranking": ranking,
            "vectorMatches": hybrid.vector_matches,
            "classification": hybrid.classification,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
