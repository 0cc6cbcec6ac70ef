/// HTML for the page shell and the htmx sensor partial
use crate::error::DashboardError;
use crate::models::Reading;

/// Escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Page shell; the sensor cards are swapped in by htmx from `/load_data`
pub fn page(refresh_interval_secs: u64) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Sensors</title>
    <link rel="stylesheet" href="/static/style.css">
    <link rel="stylesheet" href="/static/fontawesome/css/all.min.css">
    <script src="/static/htmx.min.js"></script>
</head>
<body>
    <main id="sensors" hx-get="/load_data" hx-trigger="load, every {}s" hx-swap="innerHTML">
        <p class="loading">Loading…</p>
    </main>
</body>
</html>"#,
        refresh_interval_secs
    )
}

fn sensor_card(reading: &Reading) -> String {
    format!(
        r#"<section class="sensor" id="sensor-{id}">
    <header>
        <h2>{label}</h2>
        <span class="battery" title="{battery_mv} mV"><i class="fa-solid {battery_icon}"></i> {battery_percent}%</span>
    </header>
    <dl>
        <dt>Temperature</dt><dd>{temperature:.2} °C</dd>
        <dt>Humidity</dt><dd>{humidity:.2} %</dd>
        <dt>{dew_point_label}</dt><dd>{dew_point:.1} °C</dd>
        <dt>Absolute humidity</dt><dd>{absolute_humidity:.0} g/m³</dd>
    </dl>
    <footer><small>{mac}</small> <time datetime="{observed_at}">{freshness}</time></footer>
</section>
"#,
        id = html_escape(&reading.device_id.replace(':', "")),
        label = html_escape(&reading.label),
        battery_mv = reading.battery_millivolts,
        battery_icon = reading.battery_class.icon(),
        battery_percent = reading.battery_percent,
        temperature = reading.temperature_c,
        humidity = reading.humidity_pct,
        dew_point_label = reading.dew_point_label,
        dew_point = reading.dew_point_c,
        absolute_humidity = reading.absolute_humidity,
        mac = html_escape(&reading.device_id),
        observed_at = html_escape(&reading.observed_at),
        freshness = html_escape(&reading.freshness_label),
    )
}

/// One card per reading, in result set order
pub fn sensor_cards(readings: &[Reading]) -> String {
    if readings.is_empty() {
        return r#"<p class="empty">No sensors configured</p>"#.to_string();
    }
    readings.iter().map(sensor_card).collect()
}

/// Shown in place of the cards when a run fails; never mixed with data
pub fn error_partial(error: &DashboardError) -> String {
    format!(
        r#"<section class="sensor error">
    <h2><i class="fa-solid fa-triangle-exclamation"></i> Data could not be loaded</h2>
    <p>{}</p>
</section>
"#,
        html_escape(&error.to_string())
    )
}
