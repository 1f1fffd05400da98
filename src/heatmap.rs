use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::similarity::SimilarityMatrix;
use crate::util::{content_hash, ensure_directory};

const CELL_SIZE: usize = 56;
const LEFT_MARGIN: usize = 96;
const TOP_MARGIN: usize = 64;
const BOTTOM_MARGIN: usize = 72;
const RIGHT_MARGIN: usize = 24;

const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HeatmapMetric {
    Cosine,
    Jaccard,
}

impl HeatmapMetric {
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Jaccard => "jaccard",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Cosine => "Cosine Similarity Heatmap",
            Self::Jaccard => "Jaccard Similarity Heatmap",
        }
    }
}

/// `<metric>_heatmap_<first 16 hex chars of the input hash>.svg`
pub fn heatmap_file_name(metric: HeatmapMetric, input_text: &str) -> String {
    let hash = content_hash(input_text);
    format!("{}_heatmap_{}.svg", metric.file_prefix(), &hash[..16])
}

pub fn write_heatmap(
    matrix: &SimilarityMatrix,
    metric: HeatmapMetric,
    output_folder: &Path,
    input_text: &str,
) -> Result<PathBuf> {
    ensure_directory(output_folder)?;
    let path = output_folder.join(heatmap_file_name(metric, input_text));
    let svg = render_svg(matrix, metric.title());
    fs::write(&path, svg)
        .with_context(|| format!("failed to write heatmap: {}", path.display()))?;
    debug!(path = %path.display(), metric = metric.file_prefix(), "wrote heatmap");
    Ok(path)
}

/// Rows are generated CQs, columns are manual (gold) CQs.
pub fn render_svg(matrix: &SimilarityMatrix, title: &str) -> String {
    let width = LEFT_MARGIN + matrix.cols() * CELL_SIZE + RIGHT_MARGIN;
    let height = TOP_MARGIN + matrix.rows() * CELL_SIZE + BOTTOM_MARGIN;
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="32" font-size="18" text-anchor="middle">{}</text>"#,
        width / 2,
        escape_xml(title)
    ));
    svg.push('\n');

    for row in 0..matrix.rows() {
        for col in 0..matrix.cols() {
            let value = matrix.get(row, col);
            let x = LEFT_MARGIN + col * CELL_SIZE;
            let y = TOP_MARGIN + row * CELL_SIZE;
            let (r, g, b) = diverging_color(value);
            let text_fill = if (0.25..=0.75).contains(&value) { "#000000" } else { "#ffffff" };
            svg.push_str(&format!(
                r#"<rect x="{x}" y="{y}" width="{CELL_SIZE}" height="{CELL_SIZE}" fill="rgb({r},{g},{b})"/>"#
            ));
            svg.push('\n');
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="12" text-anchor="middle" fill="{text_fill}">{value:.2}</text>"#,
                x + CELL_SIZE / 2,
                y + CELL_SIZE / 2 + 4
            ));
            svg.push('\n');
        }
    }

    for col in 0..matrix.cols() {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="11" text-anchor="middle">CQ{}</text>"#,
            LEFT_MARGIN + col * CELL_SIZE + CELL_SIZE / 2,
            TOP_MARGIN + matrix.rows() * CELL_SIZE + 18,
            col + 1
        ));
        svg.push('\n');
    }
    for row in 0..matrix.rows() {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="11" text-anchor="end">CQ{}</text>"#,
            LEFT_MARGIN - 8,
            TOP_MARGIN + row * CELL_SIZE + CELL_SIZE / 2 + 4,
            row + 1
        ));
        svg.push('\n');
    }

    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="13" text-anchor="middle">Manual CQs</text>"#,
        LEFT_MARGIN + matrix.cols() * CELL_SIZE / 2,
        height - 20
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="20" y="{}" font-size="13" text-anchor="middle" transform="rotate(-90 20 {})">Generated CQs</text>"#,
        TOP_MARGIN + matrix.rows() * CELL_SIZE / 2,
        TOP_MARGIN + matrix.rows() * CELL_SIZE / 2
    ));
    svg.push('\n');
    svg.push_str("</svg>\n");
    svg
}

fn diverging_color(value: f64) -> (u8, u8, u8) {
    let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    let (from, to, t) = if value < 0.5 {
        (COLD, NEUTRAL, value / 0.5)
    } else {
        (NEUTRAL, WARM, (value - 0.5) / 0.5)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    (lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
