// Selection state and the region/statistic queries that drive the map.
//
// A `MapSession` owns the aggregated store and the last published
// `MapView`. Builds that fail leave both untouched. When region requests
// overlap, the newest one wins: `MapSession::request_region` aborts the
// previous in-flight task, and every build carries a generation ticket so a
// request that already got past its fetches cannot publish over a newer one.

use chrono::Local;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::aggregate::{aggregate, AggregationStore, ALL_STATES};
use crate::boundary::{join_with_report, BoundaryDocument, BoundaryFeature, JoinReport};
use crate::error::Result;
use crate::loader::load_rows_from_str;
use crate::output::{info_panel, tooltip_lines};
use crate::scale::{ColorScale, Legend, Rgb};
use crate::source::{daily_report_name, DataSource};
use crate::types::{AggregationBucket, RegionSummary, StatKind};
use crate::util::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub region: String,
    pub stat: StatKind,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub country: String,
    pub join_property: String,
    pub legend_cells: usize,
    /// Fixed report name; `None` derives it from today's date.
    pub report_name: Option<String>,
    pub initial: Selection,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            join_property: crate::boundary::DEFAULT_JOIN_PROPERTY.to_string(),
            legend_cells: crate::scale::DEFAULT_LEGEND_CELLS,
            report_name: None,
            initial: Selection {
                region: "texas".to_string(),
                stat: StatKind::Confirmed,
            },
        }
    }
}

/// Everything the renderer needs for one region and statistic.
#[derive(Debug, Clone)]
pub struct MapView {
    pub region: String,
    pub stat: StatKind,
    pub info: RegionSummary,
    pub features: Vec<BoundaryFeature>,
    pub join_report: JoinReport,
    pub scale: ColorScale,
    pub legend: Legend,
    pub fills: Vec<Rgb>,
}

impl MapView {
    pub fn build(
        region: &str,
        bucket: &AggregationBucket,
        features: &[BoundaryFeature],
        stat: StatKind,
        legend_cells: usize,
    ) -> Result<MapView> {
        let (features, join_report) = join_with_report(bucket, features);
        let scale = ColorScale::build(&bucket.values(stat), stat)?;
        let fills = fills(&scale, &features, stat);
        Ok(MapView {
            region: region.to_string(),
            stat,
            info: bucket.info.clone(),
            features,
            join_report,
            legend: Legend::from_scale(&scale, legend_cells),
            scale,
            fills,
        })
    }

    /// Same features, colored by another statistic.
    pub fn recolor(&self, bucket: &AggregationBucket, stat: StatKind) -> Result<MapView> {
        let scale = ColorScale::build(&bucket.values(stat), stat)?;
        Ok(MapView {
            stat,
            fills: fills(&scale, &self.features, stat),
            legend: Legend::from_scale(&scale, self.legend.cells.len()),
            scale,
            ..self.clone()
        })
    }

    pub fn is_country_wide(&self) -> bool {
        self.region == ALL_STATES
    }

    pub fn info_panel(&self) -> Vec<String> {
        info_panel(&self.info, self.is_country_wide())
    }

    pub fn feature(&self, name: &str) -> Option<&BoundaryFeature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn tooltip(&self, name: &str) -> Option<Vec<String>> {
        self.feature(name).map(tooltip_lines)
    }
}

fn fills(scale: &ColorScale, features: &[BoundaryFeature], stat: StatKind) -> Vec<Rgb> {
    features
        .iter()
        .map(|f| scale.fill(f.stats.map(|s| s.get(stat))))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer region request was issued before this one finished.
    Superseded,
}

struct SessionState {
    selection: Selection,
    store: Option<Arc<AggregationStore>>,
    view: Option<Arc<MapView>>,
}

pub struct MapSession<S> {
    source: Arc<S>,
    options: SessionOptions,
    state: Mutex<SessionState>,
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<S: DataSource> MapSession<S> {
    pub fn new(source: S, options: SessionOptions) -> Self {
        let selection = Selection {
            region: normalize(&options.initial.region),
            stat: options.initial.stat,
        };
        Self {
            source: Arc::new(source),
            options,
            state: Mutex::new(SessionState {
                selection,
                store: None,
                view: None,
            }),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn selection(&self) -> Selection {
        self.state.lock().selection.clone()
    }

    pub fn store(&self) -> Option<Arc<AggregationStore>> {
        self.state.lock().store.clone()
    }

    pub fn view(&self) -> Option<Arc<MapView>> {
        self.state.lock().view.clone()
    }

    /// Fetch and aggregate the daily report, replacing the current store.
    pub async fn load_store(&self) -> Result<Arc<AggregationStore>> {
        let result = self.fetch_store().await;
        match result {
            Ok(store) => {
                self.state.lock().store = Some(store.clone());
                Ok(store)
            }
            Err(e) => {
                warn!(error = %e, "daily report not loaded; keeping previous data");
                Err(e)
            }
        }
    }

    async fn fetch_store(&self) -> Result<Arc<AggregationStore>> {
        let name = self
            .options
            .report_name
            .clone()
            .unwrap_or_else(|| daily_report_name(Local::now()));
        let text = self.source.fetch_daily_report(&name).await?;
        let (rows, report) = load_rows_from_str(&name, &text)?;
        info!(
            report = %name,
            total = report.total_rows,
            loaded = report.loaded_rows,
            parse_errors = report.parse_errors,
            "loaded daily report"
        );
        let store = aggregate(&rows, &self.options.country)?;
        Ok(Arc::new(store))
    }

    /// Build and publish the map for `region`.
    ///
    /// On error the previous selection and view stay in place.
    pub async fn select_region(&self, region: &str) -> Result<Outcome> {
        let key = normalize(region);
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.build_region(&key, ticket).await {
            Ok(outcome) => {
                if outcome == Outcome::Superseded {
                    info!(region = %key, "region request superseded");
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(region = %key, error = %e, "map not rebuilt; keeping previous view");
                Err(e)
            }
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    async fn build_region(&self, key: &str, ticket: u64) -> Result<Outcome> {
        let store = match self.store() {
            Some(store) => store,
            None => self.load_store().await?,
        };
        if !self.is_current(ticket) {
            return Ok(Outcome::Superseded);
        }
        let bucket = store.bucket(key)?;

        let text = self.source.fetch_boundaries(key).await?;
        if !self.is_current(ticket) {
            return Ok(Outcome::Superseded);
        }
        let document = BoundaryDocument::parse(
            &format!("{}.json", key),
            &text,
            &self.options.join_property,
        )?;
        let features = document.features_for(key)?;

        let stat = self.selection().stat;
        let mut view = MapView::build(key, bucket, features, stat, self.options.legend_cells)?;

        let mut state = self.state.lock();
        if !self.is_current(ticket) {
            return Ok(Outcome::Superseded);
        }
        // The statistic may have changed while the fetches were pending.
        if state.selection.stat != view.stat {
            view = view.recolor(bucket, state.selection.stat)?;
        }
        info!(
            region = %key,
            matched = view.join_report.matched_features,
            unmatched = view.join_report.unmatched_features.len(),
            "map built"
        );
        state.selection.region = key.to_string();
        state.view = Some(Arc::new(view));
        Ok(Outcome::Applied)
    }

    /// Recolor the current view; no fetch and no re-aggregation.
    pub fn select_stat(&self, stat: StatKind) -> Result<()> {
        let mut state = self.state.lock();
        let recolored = match (&state.view, &state.store) {
            (Some(view), Some(store)) => {
                let bucket = store.bucket(&view.region)?;
                Some(Arc::new(view.recolor(bucket, stat)?))
            }
            _ => None,
        };
        state.selection.stat = stat;
        if recolored.is_some() {
            state.view = recolored;
        }
        Ok(())
    }
}

impl<S: DataSource + 'static> MapSession<S> {
    /// Start building `region` in the background, aborting any region
    /// request still in flight.
    pub fn request_region(self: &Arc<Self>, region: &str) -> JoinHandle<Result<Outcome>> {
        let session = Arc::clone(self);
        let region = region.to_string();
        let mut in_flight = self.in_flight.lock();
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        let handle = tokio::spawn(async move { session.select_region(&region).await });
        *in_flight = Some(handle.abort_handle());
        handle
    }
}
