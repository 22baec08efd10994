//! SVG Chart Generator for Run Results
//!
//! Renders the training loss curve and the confusion-matrix heatmap as
//! standalone SVG files that open in any browser.

use std::fs;
use std::path::Path;

use crate::utils::metrics::ConfusionMatrix;

/// Chart styling constants
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;

pub const COLOR_PRIMARY: &str = "#3498db";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// Heatmap cell size bounds (px)
const HEATMAP_CELL_MAX: f64 = 60.0;
const HEATMAP_CELL_MIN: f64 = 14.0;
const HEATMAP_LABEL_SPACE: f64 = 170.0;

/// "Blues" ramp endpoints: white-ish to dark navy
const BLUES_LOW: (f64, f64, f64) = (247.0, 251.0, 255.0);
const BLUES_HIGH: (f64, f64, f64) = (8.0, 48.0, 107.0);

/// A data point for a line chart
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub label: Option<String>,
}

/// A data series for charts
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<DataPoint>,
    pub color: String,
}

impl DataSeries {
    /// Build a series from consecutive y-values, x starting at 1
    pub fn from_values(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &y)| DataPoint {
                    x: (i + 1) as f64,
                    y,
                    label: Some(format!("{:.3}", y)),
                })
                .collect(),
            color: color.to_string(),
        }
    }
}

fn svg_open(width: f64, height: f64, title: &str) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        width, height, width, height
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        width, height
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        width / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));

    svg
}

/// Render a line chart as an SVG document
///
/// The y-axis spans `0..max(y)` with a little headroom, so it suits losses as
/// well as other non-negative quantities.
pub fn render_line_chart(title: &str, x_label: &str, y_label: &str, series: &[DataSeries]) -> String {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let (x_min, x_max, _, y_max) = find_ranges(series);
    let (x_min, x_max) = if x_min.is_finite() && x_max > x_min {
        (x_min, x_max)
    } else if x_min.is_finite() {
        (x_min - 1.0, x_min + 1.0)
    } else {
        (0.0, 1.0)
    };
    let y_min = 0.0;
    let y_max = if y_max.is_finite() && y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let to_x = |x: f64| MARGIN_LEFT + ((x - x_min) / (x_max - x_min)) * plot_width;
    let to_y = |y: f64| MARGIN_TOP + plot_height - ((y - y_min) / (y_max - y_min)) * plot_height;

    let mut svg = svg_open(CHART_WIDTH, CHART_HEIGHT, title);

    // Grid lines
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * (y_max - y_min);

        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT, y, MARGIN_LEFT + plot_width, y, COLOR_GRID
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.2}</text>"#,
            MARGIN_LEFT - 10.0, y + 4.0, COLOR_TEXT, value
        ));
    }

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT, MARGIN_TOP + plot_height, MARGIN_LEFT + plot_width, MARGIN_TOP + plot_height, COLOR_AXIS
    ));
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, MARGIN_TOP + plot_height, COLOR_AXIS
    ));

    // Axis labels
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0, CHART_HEIGHT - 20.0, COLOR_TEXT, escape_xml(x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {})">{}</text>"#,
        CHART_HEIGHT / 2.0, COLOR_TEXT, CHART_HEIGHT / 2.0, escape_xml(y_label)
    ));

    for series_data in series {
        if series_data.points.is_empty() {
            continue;
        }

        let path: Vec<String> = series_data
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { "M" } else { "L" };
                format!("{} {:.2} {:.2}", cmd, to_x(p.x), to_y(p.y))
            })
            .collect();

        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path.join(" "),
            series_data.color
        ));

        for point in &series_data.points {
            let (x, y) = (to_x(point.x), to_y(point.y));

            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="5" fill="{}" stroke="white" stroke-width="2"/>"#,
                x, y, series_data.color
            ));

            if let Some(label) = &point.label {
                svg.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="Arial, sans-serif" font-size="10" fill="{}">{}</text>"#,
                    x, y - 12.0, COLOR_TEXT, escape_xml(label)
                ));
            }
        }
    }

    // X-axis tick labels from the first series
    if let Some(first) = series.first() {
        for point in &first.points {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{:.0}</text>"#,
                to_x(point.x), MARGIN_TOP + plot_height + 20.0, COLOR_TEXT, point.x
            ));
        }
    }

    // Legend
    let mut legend_y = MARGIN_TOP + 10.0;
    for series_data in series {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            CHART_WIDTH - MARGIN_RIGHT - 100.0, legend_y, series_data.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            CHART_WIDTH - MARGIN_RIGHT - 80.0, legend_y + 12.0, COLOR_TEXT, escape_xml(&series_data.name)
        ));
        legend_y += 25.0;
    }

    svg.push_str("</svg>");
    svg
}

/// Generate a line chart SVG file
pub fn generate_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    output_path: &Path,
) -> std::io::Result<()> {
    fs::write(output_path, render_line_chart(title, x_label, y_label, series))
}

/// Write the per-epoch training loss curve
pub fn generate_loss_chart(losses: &[f64], output_path: &Path) -> std::io::Result<()> {
    let series = DataSeries::from_values("Training Loss", losses, COLOR_PRIMARY);
    generate_line_chart("Training Loss per Epoch", "Epoch", "Loss", &[series], output_path)
}

/// Map a count onto the "Blues" ramp, `t` in [0, 1]
fn blues(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(BLUES_LOW.0, BLUES_HIGH.0),
        lerp(BLUES_LOW.1, BLUES_HIGH.1),
        lerp(BLUES_LOW.2, BLUES_HIGH.2)
    )
}

/// Render the confusion matrix as an annotated heatmap
///
/// Rows are true labels, columns predicted labels; each cell shows its count.
pub fn render_confusion_heatmap(cm: &ConfusionMatrix, class_names: &[String]) -> String {
    let n = cm.num_classes.max(1);
    let cell = (560.0 / n as f64).clamp(HEATMAP_CELL_MIN, HEATMAP_CELL_MAX);
    let grid = cell * n as f64;

    let left = HEATMAP_LABEL_SPACE + 40.0;
    let top = MARGIN_TOP + 20.0;
    let width = left + grid + MARGIN_RIGHT;
    let height = top + grid + HEATMAP_LABEL_SPACE + 30.0;

    let max_count = cm.max_count().max(1) as f64;
    let font_size = (cell * 0.3).clamp(7.0, 14.0);

    let name = |idx: usize| -> String {
        class_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string())
    };

    let mut svg = svg_open(width, height, "Confusion Matrix");

    for row in 0..cm.num_classes {
        for col in 0..cm.num_classes {
            let count = cm.get(row, col);
            let t = count as f64 / max_count;
            let x = left + col as f64 * cell;
            let y = top + row as f64 * cell;

            svg.push_str(&format!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="white" stroke-width="1"/>"#,
                x, y, cell, cell, blues(t)
            ));

            // Light text on dark cells
            let text_color = if t > 0.5 { "white" } else { COLOR_TEXT };
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" dominant-baseline="central" font-family="Arial, sans-serif" font-size="{:.1}" fill="{}">{}</text>"#,
                x + cell / 2.0, y + cell / 2.0, font_size, text_color, count
            ));
        }
    }

    // Tick labels
    for idx in 0..cm.num_classes {
        let label = escape_xml(&name(idx));
        let center = idx as f64 * cell + cell / 2.0;

        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end" dominant-baseline="central" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
            left - 6.0, top + center, COLOR_TEXT, label
        ));

        let tx = left + center;
        let ty = top + grid + 8.0;
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end" font-family="Arial, sans-serif" font-size="11" fill="{}" transform="rotate(-45 {:.2} {:.2})">{}</text>"#,
            tx, ty, COLOR_TEXT, tx, ty, label
        ));
    }

    // Axis titles
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">Predicted Labels</text>"#,
        left + grid / 2.0, height - 15.0, COLOR_TEXT
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{:.2}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {:.2})">True Labels</text>"#,
        top + grid / 2.0, COLOR_TEXT, top + grid / 2.0
    ));

    svg.push_str("</svg>");
    svg
}

/// Write the confusion-matrix heatmap
pub fn generate_confusion_heatmap(
    cm: &ConfusionMatrix,
    class_names: &[String],
    output_path: &Path,
) -> std::io::Result<()> {
    fs::write(output_path, render_confusion_heatmap(cm, class_names))
}

fn find_ranges(series: &[DataSeries]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for p in &s.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }

    (x_min, x_max, y_min, y_max)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_chart_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loss_curve.svg");

        generate_loss_chart(&[1.2, 0.8, 0.55, 0.41, 0.37], &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Training Loss per Epoch"));
        assert_eq!(svg.matches("<circle").count(), 5);
    }

    #[test]
    fn test_single_point_chart_has_finite_coordinates() {
        let series = DataSeries::from_values("Loss", &[0.7], COLOR_PRIMARY);
        let svg = render_line_chart("Loss", "Epoch", "Loss", &[series]);
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_heatmap_has_one_cell_per_entry() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 2, 1], &[0, 1, 2, 2], 3);
        let names = vec!["Apple_scab".to_string(), "healthy".to_string(), "Rust & Rot".to_string()];

        let svg = render_confusion_heatmap(&cm, &names);

        // background + 9 cells
        assert_eq!(svg.matches("<rect").count(), 10);
        assert!(svg.contains("Predicted Labels"));
        assert!(svg.contains("True Labels"));
        assert!(svg.contains("Rust &amp; Rot"));
    }

    #[test]
    fn test_blues_ramp_endpoints() {
        assert_eq!(blues(0.0), "#f7fbff");
        assert_eq!(blues(1.0), "#08306b");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }
}
