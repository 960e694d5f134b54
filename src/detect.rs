// "Detect my district": coordinates -> reverse geocode -> district name ->
// entry in the known district set.
use crate::error::{AppError, GeoError, Result};
use crate::source::HttpGet;
use crate::types::{Address, DistrictSet, ReverseGeocodeResponse};
use serde::Serialize;
use tracing::{info, warn};

pub const UNKNOWN_DISTRICT: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One-shot read of the current position.
pub trait Locator {
    fn locate(&self) -> Result<Coordinates, GeoError>;
}

/// Position supplied up front (arguments or environment). `None` behaves like
/// a host without geolocation support.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocator(pub Option<Coordinates>);

impl Locator for FixedLocator {
    fn locate(&self) -> Result<Coordinates, GeoError> {
        self.0.ok_or(GeoError::Unsupported)
    }
}

pub trait Geocoder {
    fn reverse(&self, at: Coordinates) -> Result<Address>;
}

/// Nominatim `reverse` endpoint over any `HttpGet`.
pub struct Nominatim<'h, H: HttpGet + ?Sized> {
    http: &'h H,
    base_url: String,
}

impl<'h, H: HttpGet + ?Sized> Nominatim<'h, H> {
    pub fn new(http: &'h H, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }

    pub fn url_for(&self, at: Coordinates) -> String {
        format!("{}?format=json&lat={}&lon={}", self.base_url, at.lat, at.lon)
    }
}

impl<'h, H: HttpGet + ?Sized> Geocoder for Nominatim<'h, H> {
    fn reverse(&self, at: Coordinates) -> Result<Address> {
        let body = self.http.get_text(&self.url_for(at))?;
        let parsed: ReverseGeocodeResponse = serde_json::from_str(&body)?;
        // An address object with every field empty still resolves to "Unknown";
        // no address at all means the lookup itself failed.
        parsed.address.ok_or_else(|| {
            AppError::Geocode(parsed.error.unwrap_or_else(|| "address missing".to_string()))
        })
    }
}

/// First non-empty of district, city_district, state_district, city.
pub fn district_name_from_address(address: &Address) -> String {
    [
        &address.district,
        &address.city_district,
        &address.state_district,
        &address.city,
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
    .cloned()
    .unwrap_or_else(|| UNKNOWN_DISTRICT.to_string())
}

/// First entry (in set order) that contains `detected`, ignoring case.
pub fn match_district<'a>(detected: &str, districts: &'a DistrictSet) -> Option<&'a str> {
    let needle = detected.to_lowercase();
    districts.iter().find(|d| d.to_lowercase().contains(&needle))
}

#[derive(Debug)]
pub enum DetectOutcome {
    Matched { detected: String, district: String },
    Unmatched { detected: String },
    Failed(AppError),
}

/// Run one detection attempt. No retries: any failure ends this attempt.
pub fn detect<L, G>(locator: &L, geocoder: &G, districts: &DistrictSet) -> DetectOutcome
where
    L: Locator + ?Sized,
    G: Geocoder + ?Sized,
{
    let at = match locator.locate() {
        Ok(at) => at,
        Err(e) => {
            warn!("location unavailable: {}", e);
            return DetectOutcome::Failed(e.into());
        }
    };
    let address = match geocoder.reverse(at) {
        Ok(a) => a,
        Err(e) => {
            warn!("reverse geocode failed: {}", e);
            return DetectOutcome::Failed(e);
        }
    };
    let detected = district_name_from_address(&address);
    info!("detected district name: {}", detected);
    match match_district(&detected, districts) {
        Some(d) => DetectOutcome::Matched { district: d.to_string(), detected },
        None => DetectOutcome::Unmatched { detected },
    }
}
