use serde::{Deserialize, Serialize};

/// Body of `POST /data`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CountryQuery {
    /// Country name as the upstream API spells it
    pub country: String,
    /// Day in `YYYY-MM-DD` form, passed through as-is
    pub date: String,
}

/// Success envelope shared by every data endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    /// `false` only for the "no data" sentinel.
    pub success: bool,
    /// Payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// A well-formed body that signals "no data" rather than a failure
    pub fn missing(data: T) -> Self {
        Self {
            success: false,
            data,
        }
    }
}

/// Liveness response for `GET /`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StatusResponse {
    /// Always `true`.
    pub success: bool,
    /// Fixed readiness message.
    pub status: String,
}

/// Per-country snapshot returned by `POST /data`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CountryData {
    /// Country population.
    pub population: i64,
    /// Recovered cases.
    pub recovered: i64,
    /// Total deaths.
    pub deaths: i64,
    /// Active cases.
    pub active: i64,
}

impl CountryData {
    /// Returned when the upstream has no record for the country/day pair.
    pub const NOT_FOUND: CountryData = CountryData {
        population: -1,
        recovered: -1,
        deaths: -1,
        active: -1,
    };
}

/// One row of `GET /all`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CountryStat {
    /// Country name, empty when the upstream omits it.
    pub country: String,
    /// Total deaths.
    pub deaths: i64,
    /// Active cases.
    pub active: i64,
}

/// Upstream envelope; every covid-193 endpoint nests its payload under
/// `response`. Sibling keys (`get`, `parameters`, `errors`, `results`)
/// are ignored.
#[derive(Debug, Deserialize)]
pub struct UpstreamEnvelope<T> {
    /// Records, possibly empty.
    pub response: Vec<T>,
}

/// `cases` object of an upstream record
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpstreamCases {
    /// Recovered cases.
    pub recovered: Option<i64>,
    /// Active cases.
    pub active: Option<i64>,
}

/// `deaths` object of an upstream record
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpstreamDeaths {
    /// Total deaths.
    pub total: Option<i64>,
}

/// Element of the `/history` response
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamCountryRecord {
    /// Country population.
    pub population: Option<i64>,
    /// Case counts.
    pub cases: Option<UpstreamCases>,
    /// Death counts.
    pub deaths: Option<UpstreamDeaths>,
}

/// Element of the `/statistics` response
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamStatRecord {
    /// Country name.
    pub country: Option<String>,
    /// Case counts.
    pub cases: Option<UpstreamCases>,
    /// Death counts.
    pub deaths: Option<UpstreamDeaths>,
}

// Null, absent and zero all collapse to 0.
impl From<UpstreamCountryRecord> for CountryData {
    fn from(record: UpstreamCountryRecord) -> Self {
        let cases = record.cases.unwrap_or_default();
        let deaths = record.deaths.unwrap_or_default();
        CountryData {
            population: record.population.unwrap_or(0),
            recovered: cases.recovered.unwrap_or(0),
            deaths: deaths.total.unwrap_or(0),
            active: cases.active.unwrap_or(0),
        }
    }
}

impl From<UpstreamStatRecord> for CountryStat {
    fn from(record: UpstreamStatRecord) -> Self {
        CountryStat {
            country: record.country.unwrap_or_default(),
            deaths: record.deaths.unwrap_or_default().total.unwrap_or(0),
            active: record.cases.unwrap_or_default().active.unwrap_or(0),
        }
    }
}
