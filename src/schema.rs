use schemars::schema_for;

use crate::artifact::ProcessedArtifact;
use crate::config::AnalyticsConfig;
use crate::model::MetricsRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaKind {
    /// Per-asset metrics record handed to renderers
    Metrics,
    /// Analytics config file
    Config,
    /// Processed intermediate artifact
    Artifact,
}

/// Generate and print the JSON Schema for one of the crate's documents.
pub fn run(kind: SchemaKind) -> anyhow::Result<()> {
    let schema = match kind {
        SchemaKind::Metrics => schema_for!(MetricsRecord),
        SchemaKind::Config => schema_for!(AnalyticsConfig),
        SchemaKind::Artifact => schema_for!(ProcessedArtifact),
    };
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(())
}
