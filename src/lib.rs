//! District-wise MGNREGA statistics: fetch the public records, work out which
//! fields mean what, shape one district's rows into chart series and a short
//! summary, and optionally find the user's district from coordinates.
pub mod config;
pub mod detect;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod source;
pub mod summary;
pub mod types;
pub mod util;

pub use error::{AppError, GeoError, Result};
pub use session::{DetectStatus, DetectionReport, Session, ViewUpdate};
