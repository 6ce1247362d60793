use crate::domain::model::{EnrichmentResult, GeoResponse, Record};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn address_field(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn pacing(&self) -> Duration;
    fn request_timeout(&self) -> Option<Duration>;
}

/// 地址字串 -> 地理編碼結果
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<GeoResponse>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<EnrichmentResult>;
    async fn load(&self, result: EnrichmentResult) -> Result<String>;
}
