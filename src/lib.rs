// Daily case-count aggregation and choropleth data preparation.
//
// Rows of a daily report are aggregated per state and country-wide
// (`aggregate`), joined by name onto boundary features (`boundary`),
// and colored with a per-statistic scale and legend (`scale`).
// `session` ties the steps to region and statistic selection.
pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod scale;
pub mod session;
pub mod source;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, AggregationStore, ALL_STATES};
pub use boundary::{join, BoundaryDocument, BoundaryFeature, JoinReport};
pub use error::{MapError, Result};
pub use scale::{ColorScale, Legend, Rgb};
pub use session::{MapSession, MapView, Outcome, Selection, SessionOptions};
pub use types::{AggregationBucket, CaseStats, RawRow, RegionSummary, StatKind};
pub use util::normalize;
