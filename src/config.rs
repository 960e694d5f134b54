// Run configuration: built-in endpoints, overridable from the environment,
// plus a handful of command-line flags.
use crate::detect::Coordinates;
use crate::error::{AppError, Result};
use std::path::PathBuf;

/// District-wise MGNREGA data on data.gov.in (public sample key).
pub const DEFAULT_API_URL: &str = "https://api.data.gov.in/resource/ee03643a-ee4c-48c2-ac30-9f2ff26ab722?format=json&limit=1000&api-key=579b464db66ec23bdd00000110cd7c16ae4546e57d2d90a9be399b9c";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

pub const ENV_API_URL: &str = "MGNREGA_API_URL";
pub const ENV_GEOCODE_URL: &str = "MGNREGA_GEOCODE_URL";
pub const ENV_LAT: &str = "MGNREGA_LAT";
pub const ENV_LON: &str = "MGNREGA_LON";

pub const HELP: &str = "\
mgnrega_report: district-wise MGNREGA charts in the terminal

USAGE:
    mgnrega_report [OPTIONS]

OPTIONS:
    --file <path>        Load a saved API response instead of fetching
    --lat <deg>          Latitude used by \"detect my district\"
    --lon <deg>          Longitude used by \"detect my district\"
    --chart-json <path>  Write the live chart as a Chart.js config file
    --out <dir>          Directory for exported CSV/JSON (default: .)
    -h, --help           Show this help

ENVIRONMENT:
    MGNREGA_API_URL, MGNREGA_GEOCODE_URL, MGNREGA_LAT, MGNREGA_LON
    RUST_LOG             Log filter (default: info)";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub geocode_url: String,
    pub file: Option<PathBuf>,
    pub coords: Option<Coordinates>,
    pub chart_json: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub show_help: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            file: None,
            coords: None,
            chart_json: None,
            export_dir: PathBuf::from("."),
            show_help: false,
        }
    }
}

fn parse_degrees(name: &str, raw: &str, limit: f64) -> Result<f64> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} is not a number: {}", name, raw)))?;
    if !(-limit..=limit).contains(&v) {
        return Err(AppError::Config(format!("{} out of range: {}", name, v)));
    }
    Ok(v)
}

impl Config {
    pub fn from_env_and_args<I>(args: I) -> Result<Config>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    /// Environment first, then flags on top.
    pub fn from_sources<I, F>(args: I, env: F) -> Result<Config>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        if let Some(url) = env(ENV_API_URL) {
            cfg.api_url = url;
        }
        if let Some(url) = env(ENV_GEOCODE_URL) {
            cfg.geocode_url = url;
        }
        let mut lat = env(ENV_LAT);
        let mut lon = env(ENV_LON);

        let mut args = args.into_iter();
        while let Some(a) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| AppError::Config(format!("Missing value for {}", flag)))
            };
            match a.as_str() {
                "--file" => cfg.file = Some(PathBuf::from(value("--file")?)),
                "--lat" => lat = Some(value("--lat")?),
                "--lon" => lon = Some(value("--lon")?),
                "--chart-json" => cfg.chart_json = Some(PathBuf::from(value("--chart-json")?)),
                "--out" => cfg.export_dir = PathBuf::from(value("--out")?),
                "-h" | "--help" => cfg.show_help = true,
                _ => return Err(AppError::Config(format!("Unknown arg: {}", a))),
            }
        }

        cfg.coords = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinates {
                lat: parse_degrees("latitude", &lat, 90.0)?,
                lon: parse_degrees("longitude", &lon, 180.0)?,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "latitude and longitude must be given together".into(),
                ))
            }
        };
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_input() {
        let cfg = Config::from_sources(Vec::new(), no_env).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.api_url.starts_with("https://api.data.gov.in/resource/"));
    }

    #[test]
    fn flags_override_environment() {
        let env = |k: &str| match k {
            ENV_API_URL => Some("http://localhost/records".to_string()),
            ENV_LAT => Some("10".to_string()),
            ENV_LON => Some("20".to_string()),
            _ => None,
        };
        let cfg = Config::from_sources(args(&["--lat", "18.5", "--out", "exports"]), env).unwrap();
        assert_eq!(cfg.api_url, "http://localhost/records");
        assert_eq!(cfg.coords, Some(Coordinates { lat: 18.5, lon: 20.0 }));
        assert_eq!(cfg.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Config::from_sources(args(&["--bogus"]), no_env).is_err());
        assert!(Config::from_sources(args(&["--file"]), no_env).is_err());
        assert!(Config::from_sources(args(&["--lat", "10"]), no_env).is_err());
        assert!(Config::from_sources(args(&["--lat", "95", "--lon", "10"]), no_env).is_err());
        assert!(Config::from_sources(args(&["--lat", "north", "--lon", "10"]), no_env).is_err());
    }
}
