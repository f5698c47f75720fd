//! Stickleback demo entrypoint: synthesizes deployments, holds some out, then
//! runs fit → predict → assess and writes the outcome table as ndjson to stdout.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stickleback::{
    assess::OutcomeTable,
    config::PipelineConfig,
    data::{split_deployments, subset, synthetic_deployments, SyntheticConfig},
    logging::{ReportLine, StructuredLogger},
    model::LogisticRegression,
    pipeline::Stickleback,
};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("STICKLEBACK_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("stickleback.json"));
    let config = PipelineConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(path = %config_path.display(), win_size = config.win_size, nth = config.nth, "stickleback starting");

    let sample = SyntheticConfig {
        seed: config.seed,
        ..SyntheticConfig::default()
    };
    let (sensors, events) = synthetic_deployments(&sample)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (test_ids, train_ids) = split_deployments(sensors.keys().cloned(), 2, &mut rng);
    info!(train = ?train_ids, test = ?test_ids, "split deployments");

    let seed = config.seed;
    let mut sb = Stickleback::new(LogisticRegression::default(), config)?;
    sb.fit(&subset(&sensors, &train_ids), &subset(&events, &train_ids))?;
    let predictions = sb.predict(&subset(&sensors, &test_ids))?;
    let outcomes = sb.assess(&predictions, &subset(&events, &test_ids))?;

    let table = OutcomeTable::from_outcomes(&outcomes);
    let ts = Utc::now().to_rfc3339();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in &table.rows {
        StructuredLogger::emit_json(
            &ReportLine {
                ts: ts.clone(),
                kind: "outcome_counts",
                deployment: Some(row.deployment.as_str()),
                seed,
                data: &row.counts,
            },
            &mut out,
        )?;
    }
    StructuredLogger::emit_json(
        &ReportLine {
            ts,
            kind: "outcome_total",
            deployment: None,
            seed,
            data: &table.total,
        },
        &mut out,
    )?;

    info!(
        precision = table.total.precision(),
        recall = table.total.recall(),
        f1 = table.total.f1(),
        "stickleback run complete"
    );
    Ok(())
}
