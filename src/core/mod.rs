pub mod etl;
pub mod normalizer;
pub mod pipeline;
pub mod sequencer;

pub use crate::domain::model::{EnrichmentResult, Record};
pub use crate::domain::ports::{ConfigProvider, Geocoder, Pipeline, Storage};
pub use crate::utils::error::Result;
