use crate::core::sequencer::{RunContext, Sequencer};
use crate::core::{ConfigProvider, EnrichmentResult, Geocoder, Pipeline, Record, Storage};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::Value;

pub struct GeocodePipeline<S: Storage, C: ConfigProvider, G: Geocoder> {
    storage: S,
    config: C,
    geocoder: G,
}

impl<S: Storage, C: ConfigProvider, G: Geocoder> GeocodePipeline<S, C, G> {
    pub fn new(storage: S, config: C, geocoder: G) -> Self {
        Self {
            storage,
            config,
            geocoder,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

/// 輸入必須是物件陣列，且第一筆要有地址欄位
pub fn parse_input(bytes: &[u8], address_field: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(bytes)?;

    let Value::Array(items) = value else {
        return Err(EtlError::InputError {
            message: "input file must contain a JSON array".to_string(),
        });
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(Record::new(map)),
            other => Err(EtlError::InputError {
                message: format!("item {} is not a JSON object: {}", index, other),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    match records.first() {
        None => Err(EtlError::InputError {
            message: "input file contains no items".to_string(),
        }),
        Some(first) if !first.has_field(address_field) => Err(EtlError::InputError {
            message: format!("address property [{}] not found", address_field),
        }),
        Some(_) => Ok(records),
    }
}

/// 與原工具相同，以一個空白縮排輸出
pub fn render_output(records: &[Record]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;
    Ok(buffer)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: Geocoder> Pipeline for GeocodePipeline<S, C, G> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input file: {}", input_path);

        let bytes = self.storage.read_file(input_path).await?;
        let records = parse_input(&bytes, self.config.address_field())?;

        tracing::debug!("Parsed {} items from {}", records.len(), input_path);
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<EnrichmentResult> {
        let mut ctx = RunContext::new(data);
        let mut sequencer = Sequencer::new(&self.geocoder, self.config.address_field())
            .with_pacing(self.config.pacing());

        sequencer.run(&mut ctx).await;
        Ok(ctx.finish())
    }

    async fn load(&self, result: EnrichmentResult) -> Result<String> {
        let output_path = self.config.output_path().to_string();
        let data = render_output(&result.records)?;

        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            result.records.len(),
            data.len(),
            output_path
        );
        self.storage
            .write_file(&output_path, &data)
            .await
            .map_err(|e| EtlError::OutputWriteError {
                path: output_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(output_path)
    }
}
