use crate::stats::Summary;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

const CHART_JS_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/1.0.2/Chart.min.js";

/// Where a rendered report goes. File targets are truncated on every
/// write so an interactive session always leaves one whole document.
#[derive(Debug, Clone)]
pub enum ReportTarget {
    Stdout,
    File(PathBuf),
}

impl ReportTarget {
    pub fn new(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => ReportTarget::File(path),
            None => ReportTarget::Stdout,
        }
    }

    pub fn write(&self, html: &str) -> Result<()> {
        match self {
            ReportTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(html.as_bytes())
                    .context("Failed to write report to standard output")?;
                stdout.flush().context("Failed to flush standard output")
            }
            ReportTarget::File(path) => fs::write(path, html)
                .with_context(|| format!("Failed to write report to {}", path.display())),
        }
    }
}

fn labels_json(scale: &[(DateTime<Utc>, u64)], format: &str) -> String {
    let labels: Vec<String> = scale
        .iter()
        .map(|(ts, _)| ts.format(format).to_string())
        .collect();
    serde_json::to_string(&labels).unwrap_or_default()
}

fn values_json(scale: &[(DateTime<Utc>, u64)]) -> String {
    let values: Vec<u64> = scale.iter().map(|(_, count)| *count).collect();
    serde_json::to_string(&values).unwrap_or_default()
}

fn line_chart(name: &str, scale: &[(DateTime<Utc>, u64)], label_format: &str) -> String {
    format!(
        r#"        var ctx = document.getElementById("chart-{name}").getContext("2d");
        var {name}_data = {{
          labels: {labels},
          datasets: [{{
            fillColor: "rgba(20, 100, 250, 0.2)",
            strokeColor: "rgba(20, 100, 250, 1)",
            data: {values}
          }}]
        }};
        var {name}_chart = new Chart(ctx).Line({name}_data, {{}});
"#,
        name = name,
        labels = labels_json(scale, label_format),
        values = values_json(scale),
    )
}

fn doughnut_chart(name: &str, scale: &[(DateTime<Utc>, u64)]) -> String {
    let segments: Vec<serde_json::Value> = scale
        .iter()
        .map(|(ts, count)| json!({"value": count, "label": ts.format("%Y").to_string()}))
        .collect();

    format!(
        r#"        var ctx = document.getElementById("chart-{name}").getContext("2d");
        var {name}_data = {data};
        var {name}_chart = new Chart(ctx).Doughnut({name}_data, {{}});
"#,
        name = name,
        data = serde_json::to_string(&segments).unwrap_or_default(),
    )
}

/// Render the four-chart HTML document for one focus date.
///
/// `day_name` is the focus day the way it should appear in headings,
/// e.g. "14 July 2016".
pub fn render_report(summary: &Summary, day_name: &str) -> String {
    let mut html = String::new();

    html.push_str("<!doctype html>\n");
    html.push_str("<html lang=\"en\">\n");
    html.push_str("  <head>\n");
    html.push_str("    <title>Comments for Facebook object</title>\n");
    html.push_str("    <style>\n");
    html.push_str(
        "      html, body {background: white; color: black; width: 100%; height: 100%; \
         padding: 0px; margin: 0px;}\n",
    );
    html.push_str("      .wrapper {width: 80%; height: 80%; padding: 0px; margin: 0px auto;}\n");
    html.push_str("      canvas {width: 100%; height: 100%;}\n");
    html.push_str("      h1 {text-align: center; padding: 0px; margin: 50px 0px;}\n");
    html.push_str("    </style>\n");
    html.push_str(&format!(
        "    <script type=\"text/javascript\" src=\"{}\"></script>\n",
        CHART_JS_CDN
    ));

    html.push_str("    <script type=\"text/javascript\">\n");
    html.push_str("      function load() {\n");
    html.push_str("        Chart.defaults.global[\"responsive\"] = true;\n");
    html.push_str(&line_chart("hours", &summary.focus_day, "%H:%M"));
    html.push_str(&line_chart("days", &summary.surrounding_days, "%d %b"));
    html.push_str(&line_chart("months", &summary.monthly, "%b %Y"));
    html.push_str(&doughnut_chart("years", &summary.yearly));
    html.push_str("      }\n");
    html.push_str("    </script>\n");
    html.push_str("  </head>\n");

    html.push_str("  <body onload=\"load();\">\n");

    let sections = [
        (day_name.to_string(), "hours"),
        (format!("Month before {}", day_name), "days"),
        ("By month".to_string(), "months"),
        ("By year".to_string(), "years"),
    ];

    for (title, name) in sections {
        html.push_str(&format!("    <h1>{}</h1>\n", title));
        html.push_str("    <div class=\"wrapper\">\n");
        html.push_str(&format!("      <canvas id=\"chart-{}\"></canvas>\n", name));
        html.push_str("    </div>\n");
    }

    html.push_str("  </body>\n");
    html.push_str("</html>\n");

    html
}
