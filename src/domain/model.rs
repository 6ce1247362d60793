use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ORIG_ADDRESS_KEY: &str = "origAddress";
pub const FULL_ADDRESS_KEY: &str = "fullAddress";
pub const LAT_KEY: &str = "lat";
pub const LNG_KEY: &str = "lng";

/// 一筆輸入或輸出資料，序列化時就是一個扁平的 JSON 物件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// 取得地址欄位的文字；欄位不存在、為 null 或不是字串時回傳 None
    pub fn address(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.data.get(field).is_some_and(|v| !v.is_null())
    }

    /// Builds the output record for a successful lookup.
    ///
    /// The address field is moved to `origAddress` untouched, then the
    /// provider's formatted address, coordinates and the present canonical
    /// fields are merged in.
    pub fn into_enriched(
        mut self,
        address_field: &str,
        candidate: &GeoCandidate,
        geo: &CanonicalGeoFields,
    ) -> Record {
        if let Some(original) = self.data.shift_remove(address_field) {
            self.data.insert(ORIG_ADDRESS_KEY.to_string(), original);
        }
        self.data.insert(
            FULL_ADDRESS_KEY.to_string(),
            Value::String(candidate.formatted_address.clone()),
        );
        self.data
            .insert(LAT_KEY.to_string(), Value::from(candidate.geometry.location.lat));
        self.data
            .insert(LNG_KEY.to_string(), Value::from(candidate.geometry.location.lng));

        for (key, value) in geo.present_fields() {
            self.data.insert(key.to_string(), Value::String(value.to_string()));
        }
        self
    }
}

/// 地理編碼服務的回應
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeoCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GeoResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// 只採用第一個候選結果
    pub fn first_candidate(&self) -> Option<&GeoCandidate> {
        self.results.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    pub formatted_address: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalGeoFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl CanonicalGeoFields {
    /// 依輸出順序列出有值的欄位
    pub fn present_fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("streetNumber", &self.street_number),
            ("street", &self.street),
            ("city", &self.city),
            ("county", &self.county),
            ("country", &self.country),
            ("state", &self.state),
            ("zip", &self.zip),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().next().is_none()
    }
}

/// Sequencer 跑完之後的結果
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub records: Vec<Record>,
    pub total_records: usize,
    pub dropped: usize,
}
