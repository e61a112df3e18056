//! Prometheus text exposition format.
//!
//! Renders a controller snapshot for scraping by a Prometheus server or
//! compatible agent.

use crate::gauges::MetricsSnapshot;

/// Content type for text exposition format 0.0.4.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a snapshot into Prometheus text format.
///
/// Produces GAUGE and COUNTER metrics with a `deployment` label.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let labels = format!("deployment=\"{}\"", escape_label(&snapshot.deployment));

    metric(
        &mut out,
        "carb_scale_events_total",
        "Scale events emitted.",
        "counter",
        &labels,
        &snapshot.scale_events.to_string(),
    );
    metric(
        &mut out,
        "carb_current_score",
        "Last computed objective score.",
        "gauge",
        &labels,
        &format_float(snapshot.current_score),
    );
    metric(
        &mut out,
        "carb_p95_latency_ms",
        "P95 latency (ms) seen.",
        "gauge",
        &labels,
        &format_float(snapshot.p95_latency_ms),
    );
    metric(
        &mut out,
        "carb_current_gco2_per_kwh",
        "Current carbon intensity (gCO2/kWh).",
        "gauge",
        &labels,
        &format_float(snapshot.carbon_intensity),
    );
    metric(
        &mut out,
        "carb_control_cycles_total",
        "Control cycles completed.",
        "counter",
        &labels,
        &snapshot.cycles.to_string(),
    );

    out
}

fn metric(out: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} {kind}\n"));
    out.push_str(&format!("{name}{{{labels}}} {value}\n"));
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        format!("{v}")
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
