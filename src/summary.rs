use crate::types::{Record, RoleMapping};
use crate::util::{format_int, truthy_text, value_as_int};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub const FALLBACK_PERIOD: &str = "recent period";

/// Short explanations printed under the chart, one per indicator.
pub const INSIGHTS: [(&str, &str); 3] = [
    (
        "Persondays Generated",
        "Total number of workdays created; higher values mean more people got employment.",
    ),
    (
        "Households Worked",
        "Families that actually received employment under the scheme.",
    ),
    (
        "Avg. Days of Employment",
        "Average number of workdays per household; indicates job stability.",
    ),
];

/// Headline numbers for the latest record of a district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub district: String,
    pub period: String,
    pub persondays: i64,
    pub households: i64,
    pub avg_days: i64,
}

impl Summary {
    pub fn sentence(&self) -> String {
        format!(
            "In {}, during {}, approximately {} persondays were generated, \
             with around {} households working, and an average of {} days of \
             employment per household.",
            self.district,
            self.period,
            format_int(self.persondays),
            format_int(self.households),
            self.avg_days
        )
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sentence())
    }
}

fn field<'r>(record: &'r Record, name: &Option<String>) -> Option<&'r Value> {
    record.get(name.as_deref()?)
}

pub fn summarize(district: &str, latest: &Record, mapping: &RoleMapping) -> Summary {
    Summary {
        district: district.to_string(),
        period: truthy_text(field(latest, &mapping.year))
            .unwrap_or_else(|| FALLBACK_PERIOD.to_string()),
        persondays: value_as_int(field(latest, &mapping.persondays)),
        households: value_as_int(field(latest, &mapping.households)),
        avg_days: value_as_int(field(latest, &mapping.avg_days)),
    }
}

/// Multi-line insights block for the selected district.
pub fn insights_text(district: &str) -> String {
    let mut out = format!(
        "Insights for {}:\nThis overview shows how employment generation and work \
         participation have evolved under the MGNREGA scheme in {}.\n",
        district, district
    );
    for (name, blurb) in INSIGHTS {
        out.push_str(&format!("  * {}: {}\n", name, blurb));
    }
    out.push_str(
        "Together, these indicators show how effectively the scheme provides jobs \
         and sustains rural livelihoods across different time periods.",
    );
    out
}
