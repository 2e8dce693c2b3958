//! Wire types for the Open-Meteo air-quality API.
//!
//! Series are kept as raw JSON values so that nulls and non-numeric entries
//! can be coerced per reading instead of failing the whole payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of the hourly forecast request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AirQualityResponse {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

/// Parallel arrays, one per requested field, all indexed by `time`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Option<Vec<Value>>,
    #[serde(default)]
    pub european_aqi: Option<Vec<Value>>,
    #[serde(default)]
    pub pm2_5: Option<Vec<Value>>,
    #[serde(default)]
    pub pm10: Option<Vec<Value>>,
    #[serde(default)]
    pub nitrogen_dioxide: Option<Vec<Value>>,
    #[serde(default)]
    pub ozone: Option<Vec<Value>>,
    #[serde(default)]
    pub sulphur_dioxide: Option<Vec<Value>>,
    #[serde(default)]
    pub carbon_monoxide: Option<Vec<Value>>,
}

impl HourlySeries {
    /// Raw series for a pollutant by its API field name.
    pub fn field(&self, name: &str) -> Option<&[Value]> {
        let series = match name {
            "pm2_5" => &self.pm2_5,
            "pm10" => &self.pm10,
            "nitrogen_dioxide" => &self.nitrogen_dioxide,
            "ozone" => &self.ozone,
            "sulphur_dioxide" => &self.sulphur_dioxide,
            "carbon_monoxide" => &self.carbon_monoxide,
            "european_aqi" => &self.european_aqi,
            _ => return None,
        };
        series.as_deref()
    }
}

/// Response of the per-city "current index only" request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentAqiResponse {
    #[serde(default)]
    pub current: Option<CurrentAqi>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentAqi {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub european_aqi: Option<Value>,
}

/// Coerces a JSON reading to a number. Numeric strings are accepted;
/// null, booleans and anything unparsable yield `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
