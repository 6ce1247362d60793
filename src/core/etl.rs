use crate::core::Pipeline;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub total_records: usize,
    pub geocoded: usize,
    pub dropped: usize,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!("🚀 Starting geocoding run at {}", started_at.to_rfc3339());

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded {} items", records.len());

        // Transform
        let result = self.pipeline.transform(records).await?;
        let total_records = result.total_records;
        let geocoded = result.records.len();
        let dropped = result.dropped;
        tracing::info!(
            "🔄 Geocoded {} of {} items ({} dropped)",
            geocoded,
            total_records,
            dropped
        );

        // Load
        let output_path = self.pipeline.load(result).await?;
        let duration = start.elapsed();
        tracing::info!("💾 Generated {} in {:?}", output_path, duration);

        Ok(RunSummary {
            output_path,
            total_records,
            geocoded,
            dropped,
            started_at,
            duration,
        })
    }
}
