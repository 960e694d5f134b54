use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One flat record from the API. Field order is the order of the JSON body.
pub type Record = Map<String, Value>;

#[derive(Debug, Deserialize, Default)]
pub struct ApiResponse {
    #[serde(default)]
    pub records: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReverseGeocodeResponse {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Address {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city_district: Option<String>,
    #[serde(default)]
    pub state_district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Which concrete field names play which part in a record.
///
/// Computed once per fetch. A role that could not be resolved is `None`, and
/// whatever depends on it is left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMapping {
    pub district: Option<String>,
    pub year: Option<String>,
    pub persondays: Option<String>,
    pub households: Option<String>,
    pub avg_days: Option<String>,
}

impl RoleMapping {
    pub fn count_field(&self, role: CountRole) -> Option<&str> {
        match role {
            CountRole::Persondays => self.persondays.as_deref(),
            CountRole::Households => self.households.as_deref(),
            CountRole::AvgDays => self.avg_days.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Primary,
    Secondary,
}

impl Axis {
    pub fn id(self) -> &'static str {
        match self {
            Axis::Primary => "yLeft",
            Axis::Secondary => "yRight",
        }
    }
}

/// The three numeric indicators charted per district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountRole {
    Persondays,
    Households,
    AvgDays,
}

impl CountRole {
    pub const ALL: [CountRole; 3] = [CountRole::Persondays, CountRole::Households, CountRole::AvgDays];

    pub fn label(self) -> &'static str {
        match self {
            CountRole::Persondays => "Persondays Generated",
            CountRole::Households => "Households Worked",
            CountRole::AvgDays => "Avg. Days of Employment",
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            CountRole::Persondays => Axis::Primary,
            CountRole::Households | CountRole::AvgDays => Axis::Secondary,
        }
    }

    /// RGB triple used for the fill and border of this series.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            CountRole::Persondays => (54, 162, 235),
            CountRole::Households => (255, 99, 132),
            CountRole::AvgDays => (75, 192, 75),
        }
    }
}

/// Distinct district names in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistrictSet(Vec<String>);

impl DistrictSet {
    pub fn from_ordered(names: Vec<String>) -> Self {
        DistrictSet(names)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|d| d == name)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub role: CountRole,
    pub axis: Axis,
    pub values: Vec<f64>,
}

/// Labels plus the series aligned to them, one value per label.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn series_for(&self, role: CountRole) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.role == role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    PolarArea,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Doughnut,
        ChartType::Radar,
        ChartType::PolarArea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Doughnut => "doughnut",
            ChartType::Radar => "radar",
            ChartType::PolarArea => "polarArea",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown chart type: {}", wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_type_parses_case_insensitively() {
        assert_eq!("LINE".parse::<ChartType>(), Ok(ChartType::Line));
        assert_eq!("polararea".parse::<ChartType>(), Ok(ChartType::PolarArea));
        assert!("scatter".parse::<ChartType>().is_err());
        assert_eq!(ChartType::default(), ChartType::Bar);
    }

    #[test]
    fn count_roles_pick_their_axes() {
        assert_eq!(CountRole::Persondays.axis(), Axis::Primary);
        assert_eq!(CountRole::Households.axis(), Axis::Secondary);
        assert_eq!(CountRole::AvgDays.axis().id(), "yRight");
    }
}
