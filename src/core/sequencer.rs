use crate::core::normalizer::normalize;
use crate::domain::model::{EnrichmentResult, GeoCandidate, GeoResponse, Record};
use crate::domain::ports::Geocoder;
use crate::utils::error::{EtlError, Result};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// 單次執行的狀態：待處理佇列與成功結果
#[derive(Debug, Default)]
pub struct RunContext {
    queue: VecDeque<Record>,
    accumulator: Vec<Record>,
    total: usize,
    processed: usize,
    dropped: usize,
}

impl RunContext {
    pub fn new(records: Vec<Record>) -> Self {
        let total = records.len();
        Self {
            queue: records.into(),
            accumulator: Vec::with_capacity(total),
            total,
            processed: 0,
            dropped: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn accumulated(&self) -> &[Record] {
        &self.accumulator
    }

    pub fn finish(self) -> EnrichmentResult {
        EnrichmentResult {
            records: self.accumulator,
            total_records: self.total,
            dropped: self.dropped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    AwaitingResponse,
    Paced,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// Drains a [`RunContext`] one lookup at a time, in input order.
///
/// Each lookup is awaited to completion before the pacing delay starts, and
/// the next record is only popped after the delay has elapsed, so at most
/// one request is ever outstanding.
pub struct Sequencer<'a, G: Geocoder + ?Sized> {
    geocoder: &'a G,
    address_field: String,
    pacing: Duration,
    state: SequencerState,
}

impl<'a, G: Geocoder + ?Sized> Sequencer<'a, G> {
    pub fn new(geocoder: &'a G, address_field: impl Into<String>) -> Self {
        Self {
            geocoder,
            address_field: address_field.into(),
            pacing: DEFAULT_PACING,
            state: SequencerState::Idle,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub async fn process_next(&mut self, ctx: &mut RunContext) -> Step {
        if self.state == SequencerState::Done {
            return Step::Done;
        }

        let Some(record) = ctx.queue.pop_front() else {
            self.state = SequencerState::Done;
            tracing::debug!("Work queue drained after {} items", ctx.processed);
            return Step::Done;
        };

        tracing::info!(
            "🔄 processing item {} ({} remaining)",
            ctx.processed,
            ctx.queue.len()
        );
        ctx.processed += 1;

        let Some(address) = record.address(&self.address_field).map(str::to_owned) else {
            // 沒有發出請求，所以不需要等待
            tracing::warn!(
                "⚠️ Dropping item {}: address property [{}] not found",
                ctx.processed - 1,
                self.address_field
            );
            ctx.dropped += 1;
            return Step::Continue;
        };

        self.state = SequencerState::AwaitingResponse;
        let outcome = self.geocoder.lookup(&address).await;
        self.state = SequencerState::Paced;

        match accept_response(&address, outcome) {
            Ok(candidate) => {
                let geo = normalize(&candidate.address_components);
                tracing::debug!("📍 {} -> {}", address, candidate.formatted_address);
                ctx.accumulator
                    .push(record.into_enriched(&self.address_field, &candidate, &geo));
            }
            Err(e) => {
                tracing::warn!("❌ {}", e);
                ctx.dropped += 1;
            }
        }

        tokio::time::sleep(self.pacing).await;
        self.state = SequencerState::Idle;
        Step::Continue
    }

    pub async fn run(&mut self, ctx: &mut RunContext) {
        while self.process_next(ctx).await == Step::Continue {}
    }
}

/// 非 OK 狀態與傳輸錯誤一律視為查詢失敗
fn accept_response(address: &str, outcome: Result<GeoResponse>) -> Result<GeoCandidate> {
    let response = outcome.map_err(|e| EtlError::LookupError {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if !response.is_ok() {
        let reason = match response.error_message {
            Some(message) => format!("{} ({})", response.status, message),
            None => response.status,
        };
        return Err(EtlError::LookupError {
            address: address.to_string(),
            reason,
        });
    }

    response
        .first_candidate()
        .cloned()
        .ok_or_else(|| EtlError::LookupError {
            address: address.to_string(),
            reason: "status OK without results".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AddressComponent, Geometry, LatLng};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// 依地址回傳預先設定好的結果，並記錄同時進行中的請求數
    struct ScriptedGeocoder {
        responses: HashMap<String, std::result::Result<GeoResponse, String>>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedGeocoder {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn respond(mut self, address: &str, response: GeoResponse) -> Self {
            self.responses.insert(address.to_string(), Ok(response));
            self
        }

        fn fail(mut self, address: &str, reason: &str) -> Self {
            self.responses.insert(address.to_string(), Err(reason.to_string()));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn lookup(&self, address: &str) -> Result<GeoResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(address.to_string());

            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.responses.get(address) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(reason)) => Err(EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    reason.clone(),
                ))),
                None => Ok(status_only("ZERO_RESULTS")),
            }
        }
    }

    fn status_only(status: &str) -> GeoResponse {
        GeoResponse {
            status: status.to_string(),
            results: vec![],
            error_message: None,
        }
    }

    fn ok_response(formatted: &str, city: &str) -> GeoResponse {
        GeoResponse {
            status: "OK".to_string(),
            results: vec![GeoCandidate {
                formatted_address: formatted.to_string(),
                geometry: Geometry {
                    location: LatLng {
                        lat: 43.0100539,
                        lng: -88.23006,
                    },
                },
                address_components: vec![
                    AddressComponent {
                        long_name: Some("220".to_string()),
                        short_name: Some("220".to_string()),
                        types: vec!["street_number".to_string()],
                    },
                    AddressComponent {
                        long_name: Some(city.to_string()),
                        short_name: Some(city.to_string()),
                        types: vec!["locality".to_string(), "political".to_string()],
                    },
                ],
            }],
            error_message: None,
        }
    }

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_successful_lookups_keep_input_order() {
        let geocoder = ScriptedGeocoder::new()
            .respond("a", ok_response("A, USA", "Alpha"))
            .respond("b", ok_response("B, USA", "Beta"))
            .respond("c", ok_response("C, USA", "Gamma"));
        let mut ctx = RunContext::new(records(vec![
            json!({"id": 1, "address": "a"}),
            json!({"id": 2, "address": "b"}),
            json!({"id": 3, "address": "c"}),
        ]));

        let mut sequencer = Sequencer::new(&geocoder, "address").with_pacing(Duration::ZERO);
        sequencer.run(&mut ctx).await;

        assert_eq!(sequencer.state(), SequencerState::Done);
        assert_eq!(geocoder.calls(), vec!["a", "b", "c"]);

        let result = ctx.finish();
        let ids: Vec<i64> = result
            .records
            .iter()
            .map(|r| r.data["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(result.records[1].data["city"], "Beta");
        assert_eq!(result.dropped, 0);
    }

    #[tokio::test]
    async fn test_failed_lookups_are_dropped() {
        let geocoder = ScriptedGeocoder::new()
            .respond("good 1", ok_response("Good 1", "One"))
            .respond("denied", status_only("REQUEST_DENIED"))
            .fail("broken", "connection reset")
            .respond("good 2", ok_response("Good 2", "Two"));
        let mut ctx = RunContext::new(records(vec![
            json!({"address": "good 1"}),
            json!({"address": "nowhere"}),
            json!({"address": "denied"}),
            json!({"address": "broken"}),
            json!({"address": "good 2"}),
        ]));

        Sequencer::new(&geocoder, "address")
            .with_pacing(Duration::ZERO)
            .run(&mut ctx)
            .await;

        // 失敗的紀錄不重試
        assert_eq!(geocoder.calls().len(), 5);
        assert_eq!(ctx.processed(), 5);
        assert_eq!(ctx.dropped(), 3);

        let result = ctx.finish();
        assert_eq!(result.records.len(), result.total_records - result.dropped);
        let originals: Vec<&str> = result
            .records
            .iter()
            .map(|r| r.data["origAddress"].as_str().unwrap())
            .collect();
        assert_eq!(originals, vec!["good 1", "good 2"]);
    }

    #[tokio::test]
    async fn test_first_fails_second_succeeds() {
        let geocoder = ScriptedGeocoder::new()
            .respond("first", status_only("ZERO_RESULTS"))
            .respond("second", ok_response("Second St, USA", "Second"));
        let mut ctx = RunContext::new(records(vec![
            json!({"address": "first"}),
            json!({"address": "second"}),
        ]));

        Sequencer::new(&geocoder, "address")
            .with_pacing(Duration::ZERO)
            .run(&mut ctx)
            .await;

        let result = ctx.finish();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].data["origAddress"], "second");
        assert_eq!(result.records[0].data["fullAddress"], "Second St, USA");
        assert!(!result.records[0].data.contains_key("address"));
    }

    #[tokio::test]
    async fn test_record_without_address_is_dropped_without_lookup() {
        let geocoder = ScriptedGeocoder::new().respond("here", ok_response("Here", "Here"));
        let mut ctx = RunContext::new(records(vec![
            json!({"address": "here"}),
            json!({"name": "no address"}),
            json!({"address": null}),
        ]));

        Sequencer::new(&geocoder, "address")
            .with_pacing(Duration::ZERO)
            .run(&mut ctx)
            .await;

        assert_eq!(geocoder.calls(), vec!["here"]);
        assert_eq!(ctx.dropped(), 2);
        assert_eq!(ctx.accumulated().len(), 1);
    }

    #[tokio::test]
    async fn test_component_missing_label_keeps_record() {
        let response: GeoResponse = serde_json::from_value(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Waukesha, WI, USA",
                "geometry": {"location": {"lat": 43.0, "lng": -88.2}},
                "address_components": [
                    {"long_name": "Waukesha", "short_name": "Waukesha", "types": ["locality", "political"]},
                    {"long_name": "53186", "types": ["postal_code"]}
                ]
            }]
        }))
        .unwrap();
        let geocoder = ScriptedGeocoder::new().respond("waukesha", response);
        let mut ctx = RunContext::new(records(vec![json!({"address": "waukesha"})]));

        Sequencer::new(&geocoder, "address")
            .with_pacing(Duration::ZERO)
            .run(&mut ctx)
            .await;

        assert_eq!(ctx.dropped(), 0);
        let result = ctx.finish();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].data["city"], "Waukesha");
        assert!(!result.records[0].data.contains_key("zip"));
    }

    #[tokio::test]
    async fn test_done_is_terminal() {
        let geocoder = ScriptedGeocoder::new();
        let mut ctx = RunContext::new(vec![]);
        let mut sequencer = Sequencer::new(&geocoder, "address");

        assert_eq!(sequencer.state(), SequencerState::Idle);
        assert_eq!(sequencer.process_next(&mut ctx).await, Step::Done);
        assert_eq!(sequencer.state(), SequencerState::Done);

        // 即使之後佇列又有資料也不會再處理
        ctx.queue.push_back(records(vec![json!({"address": "late"})]).remove(0));
        assert_eq!(sequencer.process_next(&mut ctx).await, Step::Done);
        assert!(geocoder.calls().is_empty());
        assert_eq!(ctx.remaining(), 1);
    }

    #[tokio::test]
    async fn test_queue_shrinks_by_one_per_step() {
        let geocoder = ScriptedGeocoder::new().respond("x", ok_response("X", "X"));
        let mut ctx = RunContext::new(records(vec![
            json!({"address": "x"}),
            json!({"address": "y"}),
        ]));
        let mut sequencer = Sequencer::new(&geocoder, "address").with_pacing(Duration::ZERO);

        assert_eq!(sequencer.process_next(&mut ctx).await, Step::Continue);
        assert_eq!(ctx.remaining(), 1);
        assert_eq!(sequencer.state(), SequencerState::Idle);
        assert_eq!(sequencer.process_next(&mut ctx).await, Step::Continue);
        assert_eq!(ctx.remaining(), 0);
        assert_eq!(sequencer.process_next(&mut ctx).await, Step::Done);
    }

    #[tokio::test]
    async fn test_pacing_and_single_request_in_flight() {
        let geocoder = ScriptedGeocoder::new()
            .respond("1", ok_response("1", "One"))
            .respond("2", ok_response("2", "Two"))
            .respond("3", ok_response("3", "Three"));
        let mut ctx = RunContext::new(records(vec![
            json!({"address": "1"}),
            json!({"address": "2"}),
            json!({"address": "3"}),
        ]));
        let pacing = Duration::from_millis(20);

        let started = Instant::now();
        Sequencer::new(&geocoder, "address")
            .with_pacing(pacing)
            .run(&mut ctx)
            .await;

        assert!(started.elapsed() >= pacing * 3);
        assert_eq!(geocoder.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.accumulated().len(), 3);
    }

    #[test]
    fn test_accept_response_requires_candidate() {
        let error = accept_response("x", Ok(status_only("OK"))).unwrap_err();
        assert!(matches!(error, EtlError::LookupError { .. }));

        let error = accept_response(
            "x",
            Ok(GeoResponse {
                status: "OVER_QUERY_LIMIT".to_string(),
                results: vec![],
                error_message: Some("You have exceeded your rate-limit".to_string()),
            }),
        )
        .unwrap_err();
        assert!(error.to_string().contains("OVER_QUERY_LIMIT"));
        assert!(error.to_string().contains("rate-limit"));
    }
}
