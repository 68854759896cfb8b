//! Chart rendering
//!
//! Draws a bundle as a fixed 3x2 grid of charts: reward, success rate,
//! cumulative goals, loss, episode length and the per-episode goal indicator.
//! When the run has a first success, every chart gets a dashed marker at that
//! episode. Missing samples break lines instead of being bridged.
//!
//! SVG output is always available. PNG output needs the `png` feature, which
//! pulls in system font rendering.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::config::{ImageFormat, RenderConfig};
use crate::error::MetricsError;
use crate::types::{MetricsBundle, Sample};

const REWARD_BLUE: RGBColor = RGBColor(31, 119, 180);
const SUCCESS_GREEN: RGBColor = RGBColor(44, 160, 44);
const GOALS_ORANGE: RGBColor = RGBColor(255, 127, 14);
const LOSS_PURPLE: RGBColor = RGBColor(148, 103, 189);
const STEPS_CYAN: RGBColor = RGBColor(23, 190, 207);
const GOAL_RED: RGBColor = RGBColor(214, 39, 40);

/// One line on a chart
struct Line<'a> {
    label: Option<&'a str>,
    values: &'a [Sample],
    color: RGBColor,
    alpha: f64,
    width: u32,
    steps: bool,
}

impl<'a> Line<'a> {
    fn new(label: &'a str, values: &'a [Sample], color: RGBColor) -> Self {
        Self {
            label: Some(label),
            values,
            color,
            alpha: 1.0,
            width: 2,
            steps: false,
        }
    }

    /// Faint unlabelled backdrop line
    fn backdrop(values: &'a [Sample], color: RGBColor) -> Self {
        Self {
            label: None,
            values,
            color,
            alpha: 0.15,
            width: 1,
            steps: false,
        }
    }
}

/// One chart of the grid
struct Panel<'a> {
    title: &'a str,
    y_desc: &'a str,
    lines: Vec<Line<'a>>,
    y_range: Option<Range<f64>>,
    log_y: bool,
}

/// Renderer for the 3x2 metrics chart grid
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    config: RenderConfig,
}

impl ChartRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Path the chart for `base_name` is written to
    pub fn output_path(&self, base_name: &str) -> PathBuf {
        self.config.output_dir.join(format!(
            "{}_metrics_plot.{}",
            base_name,
            self.config.format.extension()
        ))
    }

    /// Render `bundle` and return the written file path
    pub fn render(&self, bundle: &MetricsBundle, base_name: &str) -> Result<PathBuf, MetricsError> {
        fs::create_dir_all(&self.config.output_dir)?;
        let path = self.output_path(base_name);
        let size = (self.config.width, self.config.height);

        if bundle.is_empty() {
            warn!("rendering chart for a run with no episodes");
        }

        match self.config.format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                draw_grid(&root, bundle)?;
                root.present().map_err(render_error)?;
            }
            ImageFormat::Png => render_png(&path, size, bundle)?,
        }

        info!(path = %path.display(), "saved chart");
        Ok(path)
    }
}

/// Base name for chart files: the input file stem
pub fn base_name_for(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("metrics")
        .to_string()
}

#[cfg(feature = "png")]
fn render_png(path: &Path, size: (u32, u32), bundle: &MetricsBundle) -> Result<(), MetricsError> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_grid(&root, bundle)?;
    root.present().map_err(render_error)
}

#[cfg(not(feature = "png"))]
fn render_png(_path: &Path, _size: (u32, u32), _bundle: &MetricsBundle) -> Result<(), MetricsError> {
    Err(MetricsError::RenderError(
        "PNG output requires the `png` feature; use SVG instead".to_string(),
    ))
}

fn render_error(e: impl std::fmt::Display) -> MetricsError {
    MetricsError::RenderError(e.to_string())
}

fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bundle: &MetricsBundle,
) -> Result<(), MetricsError> {
    root.fill(&WHITE).map_err(render_error)?;

    let panels = [
        Panel {
            title: "(a) Cumulative Reward per Episode",
            y_desc: "Cumulative Reward",
            lines: vec![
                Line::backdrop(&bundle.reward.aligned, REWARD_BLUE),
                Line::new("Reward (MA)", bundle.reward.display(), REWARD_BLUE),
            ],
            y_range: None,
            log_y: false,
        },
        Panel {
            title: "(b) Success Rate (rolling window)",
            y_desc: "Success Rate (%)",
            lines: vec![Line::new(
                "Success Rate (MA)",
                bundle.success_rate.display(),
                SUCCESS_GREEN,
            )],
            y_range: Some(0.0..105.0),
            log_y: false,
        },
        Panel {
            title: "(c) Cumulative Goals Reached",
            y_desc: "Cumulative Goals",
            lines: vec![Line::new(
                "Cumulative Goals",
                bundle.cumulative_goals.display(),
                GOALS_ORANGE,
            )],
            y_range: None,
            log_y: false,
        },
        Panel {
            title: "(d) Training Loss",
            y_desc: "TD Loss",
            lines: vec![Line::new(
                "Loss (MA)",
                bundle.training_loss.display(),
                LOSS_PURPLE,
            )],
            y_range: None,
            log_y: all_positive(bundle.training_loss.display()),
        },
        Panel {
            title: "(e) Episode Length (efficiency)",
            y_desc: "Steps per Episode",
            lines: vec![Line::new("Steps (MA)", bundle.steps.display(), STEPS_CYAN)],
            y_range: None,
            log_y: false,
        },
        Panel {
            title: "(f) Goal per Episode and First Success",
            y_desc: "Goal Reached (0/1)",
            lines: vec![Line {
                steps: true,
                width: 1,
                ..Line::new("Goal (binary)", &bundle.goal_indicator, GOAL_RED)
            }],
            y_range: Some(-0.1..1.1),
            log_y: false,
        },
    ];

    let areas = root.split_evenly((3, 2));
    let last = panels.len() - 1;
    for (i, (panel, area)) in panels.iter().zip(areas.iter()).enumerate() {
        let annotate = i == last;
        draw_panel(area, panel, bundle, annotate)?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    bundle: &MetricsBundle,
    annotate: bool,
) -> Result<(), MetricsError> {
    let transform = |v: f64| if panel.log_y { v.log10() } else { v };
    let x_range = 0.0..(bundle.len().max(1) as f64 + 1.0);
    let y_range = panel
        .y_range
        .clone()
        .unwrap_or_else(|| data_range(panel.lines.iter().flat_map(|l| l.values), transform));

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range.clone())
        .map_err(render_error)?;

    let log_y = panel.log_y;
    let y_formatter = |v: &f64| {
        if log_y {
            format!("{:.0e}", 10f64.powf(*v))
        } else {
            format!("{v:.1}")
        }
    };
    chart
        .configure_mesh()
        .x_desc("Episode")
        .y_desc(panel.y_desc)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&y_formatter)
        .draw()
        .map_err(render_error)?;

    let mut has_legend = false;
    for line in &panel.lines {
        let style = line.color.mix(line.alpha).stroke_width(line.width);
        for (n, segment) in segments(line.values, line.steps, transform)
            .into_iter()
            .enumerate()
        {
            let anno = chart
                .draw_series(LineSeries::new(segment, style))
                .map_err(render_error)?;
            if let (0, Some(label)) = (n, line.label) {
                anno.label(label).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], style)
                });
                has_legend = true;
            }
        }
    }

    if let Some(first) = bundle.first_success_index {
        let x = first as f64;
        let dash = (y_range.end - y_range.start) / 40.0;
        let marker = BLACK.mix(0.6).stroke_width(1);
        chart
            .draw_series((0..20).map(|k| {
                let y0 = y_range.start + 2.0 * k as f64 * dash;
                PathElement::new(vec![(x, y0), (x, y0 + dash)], marker)
            }))
            .map_err(render_error)?;

        if annotate {
            let offset = (bundle.len() / 50).max(1) as f64;
            let y = y_range.start + 0.65 * (y_range.end - y_range.start);
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("First success (ep {first})"),
                    (x + offset, y),
                    ("sans-serif", 14).into_font().color(&BLACK),
                )))
                .map_err(render_error)?;
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .draw()
            .map_err(render_error)?;
    }
    Ok(())
}

/// Runs of consecutive present samples as chart points (episode is 1-based).
///
/// Step lines hold each value over `[x - 0.5, x + 0.5]`.
fn segments(values: &[Sample], steps: bool, transform: impl Fn(f64) -> f64) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (i, sample) in values.iter().enumerate() {
        let x = (i + 1) as f64;
        match sample.map(&transform).filter(|v| v.is_finite()) {
            Some(y) if steps => {
                current.push((x - 0.5, y));
                current.push((x + 0.5, y));
            }
            Some(y) => current.push((x, y)),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Padded y range over the finite present samples, `0..1` when there are none.
/// Near the ends of `f64` the padding is dropped so both ends stay finite.
fn data_range<'a>(values: impl Iterator<Item = &'a Sample>, transform: impl Fn(f64) -> f64) -> Range<f64> {
    let (min, max) = values
        .flatten()
        .map(|v| transform(*v))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max > min {
        (max - min) * 0.05
    } else {
        min.abs().max(1.0) * 0.5
    };
    let (lo, hi) = (min - pad, max + pad);
    if lo.is_finite() && hi.is_finite() {
        lo..hi
    } else if max > min && (max - min).is_finite() {
        min..max
    } else {
        0.0..1.0
    }
}

fn all_positive(values: &[Sample]) -> bool {
    let mut present = values.iter().flatten().peekable();
    present.peek().is_some() && present.all(|v| *v > 0.0)
}
