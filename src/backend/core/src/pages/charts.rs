//! Server-rendered SVG charts.

use std::fmt::Write;

use super::escape;

const BAR_HEIGHT: u32 = 22;
const BAR_GAP: u32 = 10;
const LABEL_WIDTH: u32 = 160;
const CHART_WIDTH: u32 = 560;
const VALUE_WIDTH: u32 = 60;

/// One bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

impl BarDatum {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Horizontal bar chart. Bars scale to the largest value; negative and
/// non-finite values are drawn as zero.
pub fn bar_chart(title: &str, data: &[BarDatum]) -> String {
    if data.is_empty() {
        return format!(
            r#"<figure class="chart chart-empty"><figcaption>{}</figcaption><p>No data yet.</p></figure>"#,
            escape(title)
        );
    }

    let max = data
        .iter()
        .map(|d| clamp(d.value))
        .fold(0.0_f64, f64::max);
    let plot = f64::from(CHART_WIDTH - LABEL_WIDTH - VALUE_WIDTH);
    let height = data.len() as u32 * (BAR_HEIGHT + BAR_GAP) + BAR_GAP;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<figure class="chart"><figcaption>{title}</figcaption><svg role="img" aria-label="{title}" viewBox="0 0 {w} {h}" width="100%" xmlns="http://www.w3.org/2000/svg">"#,
        title = escape(title),
        w = CHART_WIDTH,
        h = height,
    );

    for (i, datum) in data.iter().enumerate() {
        let value = clamp(datum.value);
        let width = if max > 0.0 { value / max * plot } else { 0.0 };
        let y = BAR_GAP + i as u32 * (BAR_HEIGHT + BAR_GAP);
        let text_y = y + BAR_HEIGHT / 2 + 5;
        let _ = write!(
            svg,
            r#"<g class="bar"><text x="0" y="{ty}" class="bar-label">{label}</text><rect x="{x}" y="{y}" width="{width:.1}" height="{bh}" rx="3"/><text x="{vx:.1}" y="{ty}" class="bar-value">{value}</text></g>"#,
            ty = text_y,
            label = escape(&datum.label),
            x = LABEL_WIDTH,
            y = y,
            width = width,
            bh = BAR_HEIGHT,
            vx = f64::from(LABEL_WIDTH) + width + 6.0,
            value = format_value(value),
        );
    }

    svg.push_str("</svg></figure>");
    svg
}

fn clamp(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}
