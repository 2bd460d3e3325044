use crate::error::{MapError, Result};
use crate::types::{LegendRow, StatKind};
use crate::util::{capitalize, format_number};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Fill for features that have no counts.
pub const NO_DATA_COLOR: Rgb = Rgb(0xcc, 0xcc, 0xcc);

pub const LABEL_DELIMITER: &str = "–";
pub const DEFAULT_LEGEND_CELLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }

    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let channel = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub low: Rgb,
    pub high: Rgb,
}

static PALETTES: Lazy<HashMap<StatKind, Palette>> = Lazy::new(|| {
    let parse = |low: &str, high: &str| Palette {
        low: Rgb::from_hex(low).unwrap_or(NO_DATA_COLOR),
        high: Rgb::from_hex(high).unwrap_or(NO_DATA_COLOR),
    };
    HashMap::from([
        (StatKind::Confirmed, parse("#d4ddfa", "#002aff")),
        (StatKind::Deaths, parse("#fcd9d9", "#bd0202")),
        (StatKind::Recovered, parse("#d9f2dc", "#0a7d1e")),
    ])
});

pub fn palette(kind: StatKind) -> Palette {
    PALETTES.get(&kind).copied().unwrap_or(Palette {
        low: NO_DATA_COLOR,
        high: NO_DATA_COLOR,
    })
}

/// Continuous value→color mapping over the `(min, max)` of a bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub kind: StatKind,
    pub min: f64,
    pub max: f64,
    pub palette: Palette,
}

impl ColorScale {
    /// Build a scale whose domain spans `values`.
    ///
    /// Fails with `EmptyDomain` when there is nothing to span; non-finite
    /// values are ignored.
    pub fn build(values: &[f64], kind: StatKind) -> Result<ColorScale> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next().ok_or(MapError::EmptyDomain)?;
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Ok(ColorScale {
            kind,
            min,
            max,
            palette: palette(kind),
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Color for `value`, clamped to the domain.
    ///
    /// A single-point domain maps everything to the high endpoint.
    pub fn color_at(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        if span <= 0.0 {
            return self.palette.high;
        }
        let t = (value - self.min) / span;
        if t.is_nan() {
            return self.palette.low;
        }
        Rgb::lerp(self.palette.low, self.palette.high, t.clamp(0.0, 1.0))
    }

    /// Fill for an optional value; `None` is the "no data" color.
    pub fn fill(&self, value: Option<u64>) -> Rgb {
        match value {
            Some(v) => self.color_at(v as f64),
            None => NO_DATA_COLOR,
        }
    }
}

/// Rewrite generated range labels for display.
///
/// The first cell reads "Less than <upper bound>", the last
/// "<lower bound> or more"; interior labels are kept as generated.
pub fn threshold_labels(generated: &[String], delimiter: &str) -> Vec<String> {
    let separator = format!(" {} ", delimiter);
    let last = generated.len().saturating_sub(1);
    generated
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let values: Vec<&str> = label.split(separator.as_str()).collect();
            if i == 0 {
                format!("Less than {}", values.last().copied().unwrap_or(label.as_str()))
            } else if i == last {
                format!("{} or more", values[0])
            } else {
                label.clone()
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendCell {
    pub low: f64,
    pub high: f64,
    pub color: Rgb,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub cells: Vec<LegendCell>,
}

impl Legend {
    /// Split the scale's domain into `cells` equal-width cells.
    pub fn from_scale(scale: &ColorScale, cells: usize) -> Legend {
        let n = cells.max(1);
        let width = (scale.max - scale.min) / n as f64;
        let bounds: Vec<f64> = (0..=n).map(|i| scale.min + width * i as f64).collect();

        let generated: Vec<String> = bounds
            .windows(2)
            .map(|w| {
                format!(
                    "{} {} {}",
                    format_number(w[0], 0),
                    LABEL_DELIMITER,
                    format_number(w[1], 0)
                )
            })
            .collect();
        let labels = threshold_labels(&generated, LABEL_DELIMITER);

        let cells = bounds
            .windows(2)
            .zip(labels)
            .map(|(w, label)| LegendCell {
                low: w[0],
                high: w[1],
                color: scale.color_at((w[0] + w[1]) / 2.0),
                label,
            })
            .collect();

        Legend {
            title: capitalize(scale.kind.as_str()),
            cells,
        }
    }

    /// Interior cell boundaries, ascending.
    pub fn thresholds(&self) -> Vec<f64> {
        self.cells.iter().skip(1).map(|c| c.low).collect()
    }

    pub fn rows(&self) -> Vec<LegendRow> {
        self.cells
            .iter()
            .map(|c| LegendRow {
                color: c.color.to_string(),
                label: c.label.clone(),
            })
            .collect()
    }
}
