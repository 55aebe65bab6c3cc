// Chart composition: maps a metric matrix onto a styled, not yet rendered chart
use super::error::PlotError;
use super::legend::extract_label;
use super::metrics::Matrix;
use super::palette::{color, Rgb};
use chrono::DateTime;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub family: &'static str,
    pub size_mm: f64,
    pub bold: bool,
}

/// Fixed styling shared by every chart. Lengths are physical millimetres and
/// are converted to device units by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSpec {
    pub title_font: FontSpec,
    pub title_padding_mm: f64,
    pub text_font: FontSpec,
    /// strftime pattern for X tick labels, one line per `\n`
    pub time_tick_format: &'static str,
    pub max_time_ticks: usize,
    pub legend_offset_mm: f64,
    pub line_width_pt: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

pub const CHART_SPEC: ChartSpec = ChartSpec {
    title_font: FontSpec {
        family: "sans-serif",
        size_mm: 10.0,
        bold: true,
    },
    title_padding_mm: 20.0,
    text_font: FontSpec {
        family: "sans-serif",
        size_mm: 3.0,
        bold: false,
    },
    time_tick_format: "%Y-%m-%d\n%H:%M",
    max_time_ticks: 6,
    legend_offset_mm: 15.0,
    line_width_pt: 1.0,
    width_mm: 240.0,
    height_mm: 200.0,
    margin_mm: 6.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb,
    pub width_pt: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    /// Index into `Chart::lines`
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeTick {
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub spec: ChartSpec,
    pub lines: Vec<Line>,
    pub legend: Vec<LegendEntry>,
}

/// Builds one line per series, in matrix order. A single unparseable or
/// non-finite sample value fails the whole composition.
pub fn compose(matrix: &Matrix, title: &str) -> Result<Chart, PlotError> {
    let spec = CHART_SPEC;
    let with_legend = matrix.len() > 1;

    let mut lines = Vec::with_capacity(matrix.len());
    let mut legend = Vec::new();

    for (s, series) in matrix.iter().enumerate() {
        let points = series
            .samples
            .iter()
            .map(|sample| {
                let y = sample
                    .value
                    .parse::<f64>()
                    .map_err(|source| PlotError::ValueParse {
                        value: sample.value.clone(),
                        source,
                    })?;
                if !y.is_finite() {
                    return Err(PlotError::NonFiniteValue {
                        value: sample.value.clone(),
                        timestamp: sample.timestamp,
                    });
                }
                Ok((sample.timestamp as f64, y))
            })
            .collect::<Result<Vec<_>, PlotError>>()?;

        lines.push(Line {
            points,
            color: color(s),
            width_pt: spec.line_width_pt,
        });

        if with_legend {
            if let Some(label) = extract_label(&series.label) {
                legend.push(LegendEntry {
                    label: label.to_string(),
                    line: s,
                });
            }
        }
    }

    tracing::debug!(
        "Composed chart {:?}: {} lines, {} legend entries",
        title,
        lines.len(),
        legend.len()
    );

    Ok(Chart {
        title: title.to_string(),
        spec,
        lines,
        legend,
    })
}

impl Chart {
    fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lines.iter().flat_map(|line| line.points.iter().copied())
    }

    /// Time span covered by the data, widened when degenerate
    pub fn x_range(&self) -> Range<f64> {
        bounds(self.points().map(|(x, _)| x), 60.0)
    }

    pub fn y_range(&self) -> Range<f64> {
        bounds(self.points().map(|(_, y)| y), 1.0)
    }

    pub fn time_ticks(&self) -> Vec<TimeTick> {
        time_ticks(
            &self.x_range(),
            self.spec.max_time_ticks,
            self.spec.time_tick_format,
        )
    }
}

fn bounds(values: impl Iterator<Item = f64>, pad: f64) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        0.0..1.0
    } else if min == max {
        min - pad..max + pad
    } else {
        min..max
    }
}

const TICK_STEPS_SECS: [i64; 16] = [
    1,
    5,
    15,
    30,
    60,
    5 * 60,
    15 * 60,
    30 * 60,
    60 * 60,
    3 * 60 * 60,
    6 * 60 * 60,
    12 * 60 * 60,
    24 * 60 * 60,
    2 * 24 * 60 * 60,
    7 * 24 * 60 * 60,
    30 * 24 * 60 * 60,
];

/// Tick marks at multiples of the smallest step that yields at most
/// `max_ticks` marks within `range`.
pub fn time_ticks(range: &Range<f64>, max_ticks: usize, format: &str) -> Vec<TimeTick> {
    if max_ticks == 0 || !(range.start.is_finite() && range.end.is_finite()) {
        return Vec::new();
    }

    let span = (range.end - range.start).max(0.0);
    let largest = TICK_STEPS_SECS[TICK_STEPS_SECS.len() - 1];
    let step = TICK_STEPS_SECS
        .iter()
        .copied()
        .find(|step| (span / *step as f64).floor() as usize + 1 <= max_ticks)
        .unwrap_or_else(|| {
            let multiple = (span / (largest as f64 * max_ticks as f64)).ceil() as i64;
            largest * multiple.max(1)
        });

    let first = (range.start / step as f64).ceil() as i64 * step;
    let mut ticks = Vec::new();
    let mut t = first;
    while (t as f64) <= range.end && ticks.len() < max_ticks {
        if let Some(time) = DateTime::from_timestamp(t, 0) {
            ticks.push(TimeTick {
                x: t as f64,
                label: time.format(format).to_string(),
            });
        }
        t += step;
    }
    ticks
}
