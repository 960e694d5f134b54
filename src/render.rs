// Presentation side: turning shaped chart data into something visible.
use crate::error::{AppError, Result};
use crate::types::{ChartData, ChartType};
use crate::util::format_value;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, info};

pub const X_AXIS_TITLE: &str = "Financial Year & Quarter";
pub const PRIMARY_AXIS_TITLE: &str = "Persondays Generated";
pub const SECONDARY_AXIS_TITLE: &str = "Households / Avg. Days";

/// Everything a renderer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn for_district(district: &str, chart_type: ChartType, data: ChartData) -> Self {
        Self {
            chart_type,
            title: format!("{} - MGNREGA Performance Overview", district),
            data,
        }
    }

    /// Chart.js configuration object: two independent linear axes, legend at
    /// the bottom. Tooltips keep Chart.js's default number formatting, which
    /// already groups digits by locale.
    pub fn to_chartjs(&self) -> Value {
        let datasets: Vec<Value> = self
            .data
            .series
            .iter()
            .map(|s| {
                let (r, g, b) = s.role.rgb();
                json!({
                    "label": s.name,
                    "data": s.values,
                    "yAxisID": s.axis.id(),
                    "backgroundColor": format!("rgba({}, {}, {}, 0.7)", r, g, b),
                    "borderColor": format!("rgba({}, {}, {}, 1)", r, g, b),
                    "borderWidth": 1,
                    "hoverBackgroundColor": format!("rgba({}, {}, {}, 1)", r, g, b),
                })
            })
            .collect();

        json!({
            "type": self.chart_type.as_str(),
            "data": { "labels": self.data.labels, "datasets": datasets },
            "options": {
                "responsive": true,
                "interaction": { "mode": "nearest", "intersect": true },
                "plugins": {
                    "title": {
                        "display": true,
                        "text": self.title,
                        "font": { "size": 18, "weight": "bold" },
                    },
                    "legend": { "position": "bottom", "labels": { "font": { "size": 13 } } },
                    "tooltip": { "usePointStyle": true },
                },
                "scales": {
                    "x": { "title": { "display": true, "text": X_AXIS_TITLE }, "stacked": false },
                    "yLeft": {
                        "type": "linear",
                        "position": "left",
                        "title": { "display": true, "text": PRIMARY_AXIS_TITLE },
                        "beginAtZero": true,
                        "grid": { "drawOnChartArea": true },
                    },
                    "yRight": {
                        "type": "linear",
                        "position": "right",
                        "title": { "display": true, "text": SECONDARY_AXIS_TITLE },
                        "beginAtZero": true,
                        "grid": { "drawOnChartArea": false },
                    },
                },
                "animation": { "duration": 300, "easing": "easeOutQuart" },
                "elements": {
                    "bar": {
                        "borderRadius": 5,
                        "hoverBorderWidth": 2,
                        "hoverBorderColor": "rgba(0, 0, 0, 0.6)",
                    },
                    "point": {
                        "radius": 5,
                        "hoverRadius": 8,
                        "hoverBorderWidth": 2,
                    },
                    "arc": { "hoverOffset": 12 },
                },
            },
        })
    }
}

/// Opaque id of a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// Something that can show a chart and later tear it down.
pub trait ChartRenderer {
    fn render(&mut self, spec: &ChartSpec) -> Result<ChartHandle>;
    fn destroy(&mut self, handle: ChartHandle);
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for Box<R> {
    fn render(&mut self, spec: &ChartSpec) -> Result<ChartHandle> {
        (**self).render(spec)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        (**self).destroy(handle)
    }
}

/// Markdown table of labels against series values.
pub fn chart_table(data: &ChartData) -> String {
    let mut builder = Builder::default();
    let mut header = vec![X_AXIS_TITLE.to_string()];
    header.extend(data.series.iter().map(|s| format!("{} [{}]", s.name, s.axis.id())));
    builder.push_record(header);
    for (i, label) in data.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(
            data.series
                .iter()
                .map(|s| s.values.get(i).map(|v| format_value(*v)).unwrap_or_default()),
        );
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// Prints each chart as a table to a writer (stdout in the binary).
pub struct TableRenderer<W: Write> {
    out: W,
    next_id: u64,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, next_id: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for TableRenderer<W> {
    fn render(&mut self, spec: &ChartSpec) -> Result<ChartHandle> {
        self.next_id += 1;
        writeln!(self.out, "\n{} ({} chart)\n", spec.title, spec.chart_type)?;
        if spec.data.series.is_empty() {
            writeln!(self.out, "(no numeric fields found to chart)")?;
        } else {
            writeln!(self.out, "{}\n", chart_table(&spec.data))?;
        }
        Ok(ChartHandle(self.next_id))
    }

    fn destroy(&mut self, handle: ChartHandle) {
        debug!("table chart {} released", handle.0);
    }
}

/// Keeps one Chart.js config file on disk for the live chart. Destroying the
/// chart removes the file.
pub struct JsonChartWriter {
    path: PathBuf,
    next_id: u64,
    live: Option<ChartHandle>,
}

impl JsonChartWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), next_id: 0, live: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartRenderer for JsonChartWriter {
    fn render(&mut self, spec: &ChartSpec) -> Result<ChartHandle> {
        if self.live.is_some() {
            return Err(AppError::Render(
                "previous chart was not destroyed before rendering".into(),
            ));
        }
        write_json(&self.path, &spec.to_chartjs())?;
        self.next_id += 1;
        let handle = ChartHandle(self.next_id);
        self.live = Some(handle);
        info!("chart config written to {}", self.path.display());
        Ok(handle)
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live == Some(handle) {
            self.live = None;
            if let Err(e) = std::fs::remove_file(&self.path) {
                debug!("could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// One row per label, one column per series.
pub fn export_csv(path: &Path, data: &ChartData) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["Label".to_string()];
    header.extend(data.series.iter().map(|s| s.name.clone()));
    wtr.write_record(&header)?;
    for (i, label) in data.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(
            data.series
                .iter()
                .map(|s| s.values.get(i).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Axis, ChartSeries, CountRole};

    fn data() -> ChartData {
        ChartData {
            labels: vec!["2022-23 - Q1".into(), "2022-23 - Q2".into()],
            series: vec![
                ChartSeries {
                    name: CountRole::Persondays.label().into(),
                    role: CountRole::Persondays,
                    axis: Axis::Primary,
                    values: vec![1500.0, 250000.0],
                },
                ChartSeries {
                    name: CountRole::Households.label().into(),
                    role: CountRole::Households,
                    axis: Axis::Secondary,
                    values: vec![300.0, 12.5],
                },
            ],
        }
    }

    #[test]
    fn chartjs_config_has_two_axes_and_datasets() {
        let spec = ChartSpec::for_district("Pune", ChartType::Line, data());
        let cfg = spec.to_chartjs();
        assert_eq!(cfg["type"], "line");
        assert_eq!(cfg["options"]["plugins"]["title"]["text"], "Pune - MGNREGA Performance Overview");
        assert_eq!(cfg["options"]["scales"]["yLeft"]["position"], "left");
        assert_eq!(cfg["options"]["scales"]["yRight"]["grid"]["drawOnChartArea"], false);
        assert_eq!(cfg["data"]["datasets"][0]["yAxisID"], "yLeft");
        assert_eq!(cfg["data"]["datasets"][1]["yAxisID"], "yRight");
        assert_eq!(cfg["data"]["datasets"][1]["backgroundColor"], "rgba(255, 99, 132, 0.7)");
        assert_eq!(cfg["data"]["labels"][1], "2022-23 - Q2");
    }

    #[test]
    fn chartjs_config_carries_element_styling() {
        let cfg = ChartSpec::for_district("Pune", ChartType::Bar, data()).to_chartjs();
        let elements = &cfg["options"]["elements"];
        assert_eq!(elements["bar"]["borderRadius"], 5);
        assert_eq!(elements["point"]["radius"], 5);
        assert_eq!(elements["point"]["hoverRadius"], 8);
        assert_eq!(elements["arc"]["hoverOffset"], 12);
        let tooltip = &cfg["options"]["plugins"]["tooltip"];
        assert_eq!(tooltip["usePointStyle"], true);
        assert!(tooltip.get("valueFormat").is_none());
    }

    #[test]
    fn table_renderer_prints_grouped_values() {
        let mut r = TableRenderer::new(Vec::new());
        let h1 = r.render(&ChartSpec::for_district("Pune", ChartType::Bar, data())).unwrap();
        r.destroy(h1);
        let h2 = r.render(&ChartSpec::for_district("Pune", ChartType::Bar, data())).unwrap();
        assert_ne!(h1, h2);
        let out = String::from_utf8(r.into_inner()).unwrap();
        assert!(out.contains("Pune - MGNREGA Performance Overview (bar chart)"));
        assert!(out.contains("250,000"));
        assert!(out.contains("12.5"));
        assert!(out.contains("Households Worked [yRight]"));
    }

    #[test]
    fn json_writer_refuses_second_live_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = JsonChartWriter::new(dir.path().join("chart.json"));
        let spec = ChartSpec::for_district("Pune", ChartType::Bar, data());
        let h = w.render(&spec).unwrap();
        assert!(w.path().exists());
        assert!(matches!(w.render(&spec), Err(AppError::Render(_))));
        w.destroy(h);
        assert!(!w.path().exists());
        w.render(&spec).unwrap();
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(w.path()).unwrap()).unwrap();
        assert_eq!(written["data"]["datasets"][0]["data"][0], 1500.0);
    }

    #[test]
    fn csv_export_aligns_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pune.csv");
        export_csv(&path, &data()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Label,Persondays Generated,Households Worked");
        assert_eq!(lines[1], "2022-23 - Q1,1500,300");
        assert_eq!(lines[2], "2022-23 - Q2,250000,12.5");
    }
}
