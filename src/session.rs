// Selection state for one run of the program.
//
// Holds the fetched records and everything derived from them once, plus the
// user's current choices and the single live chart. Every render tears the
// previous chart down first, so at most one chart handle is ever alive.
use crate::detect::DetectOutcome;
use crate::error::{AppError, Result};
use crate::inference::infer_roles;
use crate::pipeline::{self, district_set, ShapeOutcome};
use crate::render::{ChartHandle, ChartRenderer, ChartSpec};
use crate::summary::{summarize, Summary};
use crate::types::{ChartData, ChartType, DistrictSet, Record, RoleMapping};
use tracing::{debug, info};

/// What the screen should show after a selection or chart-type change.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Empty selection: chart hidden, placeholder shown.
    Hidden,
    /// The district has no records; show a message, nothing was rendered.
    NoData { district: String },
    Rendered {
        district: String,
        data: ChartData,
        summary: Summary,
    },
}

/// Ticket for an in-flight request. Results carrying an outdated ticket are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// State of the "detect my district" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectStatus {
    #[default]
    Idle,
    Detecting,
    Detected,
}

#[derive(Debug)]
pub enum DetectionReport {
    /// Superseded by a newer request or a manual selection.
    Stale,
    Selected {
        detected: String,
        district: String,
        view: ViewUpdate,
    },
    NotListed { detected: String },
    Failed(AppError),
}

pub struct Session<R: ChartRenderer> {
    records: Vec<Record>,
    mapping: RoleMapping,
    districts: DistrictSet,
    selected: Option<String>,
    chart_type: ChartType,
    live: Option<ChartHandle>,
    renderer: R,
    seq: u64,
    pending_detection: Option<RequestToken>,
    detect_status: DetectStatus,
}

impl<R: ChartRenderer> Session<R> {
    /// Roles are inferred from the first record; the district list from all.
    pub fn new(records: Vec<Record>, renderer: R) -> Self {
        let mapping = records.first().map(infer_roles).unwrap_or_default();
        let districts = district_set(&records, &mapping);
        info!(
            "session ready: {} records, {} districts",
            records.len(),
            districts.len()
        );
        Self {
            records,
            mapping,
            districts,
            selected: None,
            chart_type: ChartType::default(),
            live: None,
            renderer,
            seq: 0,
            pending_detection: None,
            detect_status: DetectStatus::Idle,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn districts(&self) -> &DistrictSet {
        &self.districts
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn has_live_chart(&self) -> bool {
        self.live.is_some()
    }

    pub fn detect_status(&self) -> DetectStatus {
        self.detect_status
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// User picked a district (empty string means "none").
    ///
    /// Any detection still in flight is superseded.
    pub fn select_district(&mut self, district: &str) -> Result<ViewUpdate> {
        self.seq += 1;
        self.show(district)
    }

    /// Re-renders the current district, if any, with the new chart type.
    pub fn set_chart_type(&mut self, chart_type: ChartType) -> Result<Option<ViewUpdate>> {
        self.chart_type = chart_type;
        match self.selected.clone() {
            Some(district) => self.show(&district).map(Some),
            None => Ok(None),
        }
    }

    /// Freshly shaped data for the current selection.
    pub fn current_chart(&self) -> Option<ChartData> {
        let district = self.selected.as_deref()?;
        match pipeline::shape_district(&self.records, &self.mapping, district) {
            ShapeOutcome::Chart(view) => Some(view.data),
            ShapeOutcome::NoData => None,
        }
    }

    pub fn begin_detection(&mut self) -> RequestToken {
        self.seq += 1;
        let token = RequestToken(self.seq);
        self.pending_detection = Some(token);
        self.detect_status = DetectStatus::Detecting;
        token
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.seq
    }

    /// Apply a finished detection. A match drives the same path as a manual
    /// selection; failures leave the current chart alone.
    pub fn apply_detection(
        &mut self,
        token: RequestToken,
        outcome: DetectOutcome,
    ) -> Result<DetectionReport> {
        if !self.is_current(token) {
            debug!("dropping stale detection result {:?}", token);
            if self.pending_detection == Some(token) {
                self.pending_detection = None;
                self.detect_status = DetectStatus::Idle;
            }
            return Ok(DetectionReport::Stale);
        }
        self.pending_detection = None;
        match outcome {
            DetectOutcome::Matched { detected, district } => {
                self.detect_status = DetectStatus::Detected;
                let view = self.show(&district)?;
                Ok(DetectionReport::Selected { detected, district, view })
            }
            DetectOutcome::Unmatched { detected } => {
                self.detect_status = DetectStatus::Detected;
                Ok(DetectionReport::NotListed { detected })
            }
            DetectOutcome::Failed(e) => {
                self.detect_status = DetectStatus::Idle;
                Ok(DetectionReport::Failed(e))
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.live.take() {
            self.renderer.destroy(handle);
        }
    }

    fn show(&mut self, district: &str) -> Result<ViewUpdate> {
        if district.is_empty() {
            self.selected = None;
            self.teardown();
            return Ok(ViewUpdate::Hidden);
        }
        self.selected = Some(district.to_string());

        let shaped = match pipeline::shape_district(&self.records, &self.mapping, district) {
            ShapeOutcome::NoData => None,
            ShapeOutcome::Chart(view) => view
                .latest()
                .map(|latest| (summarize(district, latest, &self.mapping), view.data)),
        };

        self.teardown();
        let Some((summary, data)) = shaped else {
            info!("no records for district {}", district);
            return Ok(ViewUpdate::NoData { district: district.to_string() });
        };

        let spec = ChartSpec::for_district(district, self.chart_type, data);
        let handle = self.renderer.render(&spec)?;
        self.live = Some(handle);
        Ok(ViewUpdate::Rendered {
            district: district.to_string(),
            data: spec.data,
            summary,
        })
    }
}
