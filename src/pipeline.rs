use crate::types::{ChartData, ChartSeries, CountRole, DistrictSet, Record, RoleMapping};
use crate::util::{truthy_text, value_or_zero};
use std::collections::HashSet;

/// Outcome of shaping one district's records for the chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeOutcome<'a> {
    /// Nothing matched the selection; the caller shows a message and must not
    /// call the renderer.
    NoData,
    Chart(DistrictView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictView<'a> {
    pub subset: Vec<&'a Record>,
    pub data: ChartData,
}

impl<'a> DistrictView<'a> {
    /// The record the summary is written from.
    pub fn latest(&self) -> Option<&'a Record> {
        self.subset.last().copied()
    }
}

fn district_of(record: &Record, mapping: &RoleMapping) -> Option<String> {
    let field = mapping.district.as_deref()?;
    truthy_text(record.get(field))
}

/// Distinct, non-empty district values in order of first appearance.
pub fn district_set(records: &[Record], mapping: &RoleMapping) -> DistrictSet {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ordered = Vec::new();
    for r in records {
        if let Some(d) = district_of(r, mapping) {
            if seen.insert(d.clone()) {
                ordered.push(d);
            }
        }
    }
    DistrictSet::from_ordered(ordered)
}

/// Records whose district equals `district`, in source order.
pub fn filter_district<'a>(
    records: &'a [Record],
    mapping: &RoleMapping,
    district: &str,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| district_of(r, mapping).as_deref() == Some(district))
        .collect()
}

/// `"<year> - Q<k>"` with a synthetic quarter cycling 1..=4 by position.
pub fn quarter_label(year: Option<String>, index: usize) -> String {
    let base = year.unwrap_or_else(|| "N/A".to_string());
    format!("{} - Q{}", base, (index % 4) + 1)
}

pub fn build_labels(subset: &[&Record], mapping: &RoleMapping) -> Vec<String> {
    subset
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let year = mapping.year.as_deref().and_then(|f| truthy_text(r.get(f)));
            quarter_label(year, i)
        })
        .collect()
}

/// One series per resolved count role; unreadable values become `0.0` so the
/// series stays aligned with the labels.
pub fn build_series(subset: &[&Record], mapping: &RoleMapping) -> Vec<ChartSeries> {
    CountRole::ALL
        .into_iter()
        .filter_map(|role| {
            let field = mapping.count_field(role)?;
            Some(ChartSeries {
                name: role.label().to_string(),
                role,
                axis: role.axis(),
                values: subset.iter().map(|r| value_or_zero(r.get(field))).collect(),
            })
        })
        .collect()
}

pub fn shape<'a>(subset: Vec<&'a Record>, mapping: &RoleMapping) -> ShapeOutcome<'a> {
    if subset.is_empty() {
        return ShapeOutcome::NoData;
    }
    let data = ChartData {
        labels: build_labels(&subset, mapping),
        series: build_series(&subset, mapping),
    };
    ShapeOutcome::Chart(DistrictView { subset, data })
}

/// Filter then shape.
pub fn shape_district<'a>(
    records: &'a [Record],
    mapping: &RoleMapping,
    district: &str,
) -> ShapeOutcome<'a> {
    shape(filter_district(records, mapping, district), mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer_roles;
    use crate::types::Axis;
    use serde_json::json;

    fn records(v: serde_json::Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn sample() -> Vec<Record> {
        records(json!([
            {"district_name": "Pune", "financial_year": "2021-22", "Persondays_Generated": "100", "Households_Worked": "10"},
            {"district_name": "Nashik", "financial_year": "2021-22", "Persondays_Generated": "200", "Households_Worked": "20"},
            {"district_name": "", "financial_year": "2021-22", "Persondays_Generated": "0", "Households_Worked": "0"},
            {"district_name": "Pune", "financial_year": "2022-23", "Persondays_Generated": "n/a", "Households_Worked": 30},
            {"district_name": "Satara", "financial_year": "2022-23"},
            {"district_name": "Pune", "financial_year": "", "Persondays_Generated": "300"},
            {"district_name": "Nashik", "financial_year": "2022-23", "Persondays_Generated": "250"},
            {"district_name": "Pune", "financial_year": "2023-24", "Persondays_Generated": "400"},
            {"district_name": "Pune", "financial_year": "2023-24", "Persondays_Generated": "500"}
        ]))
    }

    #[test]
    fn district_set_dedupes_in_first_seen_order() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        let set = district_set(&recs, &m);
        assert_eq!(set.as_slice(), &["Pune", "Nashik", "Satara"]);
    }

    #[test]
    fn district_set_is_empty_without_district_role() {
        let recs = sample();
        assert!(district_set(&recs, &RoleMapping::default()).is_empty());
    }

    #[test]
    fn filter_keeps_source_order() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        let subset = filter_district(&recs, &m, "Pune");
        let years: Vec<_> = subset.iter().map(|r| r["financial_year"].clone()).collect();
        assert_eq!(
            years,
            vec![json!("2021-22"), json!("2022-23"), json!(""), json!("2023-24"), json!("2023-24")]
        );
    }

    #[test]
    fn labels_cycle_quarters_and_default_year() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        let ShapeOutcome::Chart(view) = shape_district(&recs, &m, "Pune") else {
            panic!("expected chart");
        };
        assert_eq!(
            view.data.labels,
            vec![
                "2021-22 - Q1",
                "2022-23 - Q2",
                "N/A - Q3",
                "2023-24 - Q4",
                "2023-24 - Q1"
            ]
        );
    }

    #[test]
    fn unreadable_counts_keep_a_zero_placeholder() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        let ShapeOutcome::Chart(view) = shape_district(&recs, &m, "Pune") else {
            panic!("expected chart");
        };
        let pd = view.data.series_for(CountRole::Persondays).unwrap();
        assert_eq!(pd.values, vec![100.0, 0.0, 300.0, 400.0, 500.0]);
        assert_eq!(pd.axis, Axis::Primary);
        let hh = view.data.series_for(CountRole::Households).unwrap();
        assert_eq!(hh.values, vec![10.0, 30.0, 0.0, 0.0, 0.0]);
        assert_eq!(hh.axis, Axis::Secondary);
        assert!(view.data.series_for(CountRole::AvgDays).is_none());
        for s in &view.data.series {
            assert_eq!(s.values.len(), view.data.labels.len());
        }
    }

    #[test]
    fn latest_is_last_in_source_order() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        let ShapeOutcome::Chart(view) = shape_district(&recs, &m, "Pune") else {
            panic!("expected chart");
        };
        assert_eq!(view.latest().unwrap()["Persondays_Generated"], json!("500"));
    }

    #[test]
    fn unknown_district_is_no_data() {
        let recs = sample();
        let m = infer_roles(&recs[0]);
        assert_eq!(shape_district(&recs, &m, "Mumbai"), ShapeOutcome::NoData);
        assert_eq!(shape_district(&recs, &m, ""), ShapeOutcome::NoData);
    }

    #[test]
    fn quarter_label_for_any_length() {
        for i in 0..17 {
            let label = quarter_label(Some("2020-21".into()), i);
            assert_eq!(label, format!("2020-21 - Q{}", i % 4 + 1));
        }
    }
}
