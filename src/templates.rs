use crate::store::FlightRecord;

fn format_duration(seconds: Option<i64>) -> String {
    match seconds {
        Some(total) => {
            let total = total.max(0) as u64;
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let seconds = total % 60;

            if hours > 0 {
                format!("{}h {:02}m {:02}s", hours, minutes, seconds)
            } else {
                format!("{}m {:02}s", minutes, seconds)
            }
        }
        None => "—".to_string(),
    }
}

fn format_distance(meters: Option<i64>) -> String {
    match meters {
        Some(distance) if distance >= 1000 => format!("{:.2} km", distance as f64 / 1000.0),
        Some(distance) => format!("{} m", distance),
        None => "—".to_string(),
    }
}

fn format_altitude(meters: Option<i64>) -> String {
    match meters {
        Some(altitude) => format!("{} m", altitude),
        None => "—".to_string(),
    }
}

fn format_speed(kmh: Option<f64>) -> String {
    match kmh {
        Some(value) if value.is_finite() => format!("{:.2} km/h", value),
        _ => "—".to_string(),
    }
}

fn format_vario(ms: Option<f64>) -> String {
    match ms {
        Some(value) if value.is_finite() => format!("{:+.2} m/s", value),
        _ => "—".to_string(),
    }
}

pub fn render_landing_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Flightlog</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; padding: 0; background: #f7f7f7; }
    header { background: #20232a; color: white; padding: 1rem 2rem; }
    main { padding: 2rem; max-width: 960px; margin: 0 auto; }
    form { border: 2px dashed #888; padding: 2rem; background: white; text-align: center; }
    button { background: #2563eb; color: white; border: none; padding: 0.75rem 1.5rem; border-radius: 4px; cursor: pointer; }
    button:hover { background: #1d4ed8; }
    nav a { margin-right: 1rem; }
  </style>
</head>
<body>
  <header><h1>Flightlog</h1></header>
  <main>
    <p>Upload IGC track logs from your flight recorder.</p>
    <form action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="file" accept=".igc" multiple />
      <button type="submit">Upload</button>
    </form>
    <nav>
      <a href="/flights">Flights</a>
      <a href="/flights/status">Status</a>
    </nav>
  </main>
</body>
</html>"#
        .to_string()
}

pub fn render_flight_list(flights: &[FlightRecord]) -> String {
    let mut body = String::new();
    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Flights</p><h2>{} stored track(s)</h2></div></div>",
        flights.len()
    ));
    body.push_str(
        "<div class=\"table-wrapper\"><table><thead><tr><th>File</th><th>Location</th><th>Duration</th><th>Distance</th><th>Status</th><th></th></tr></thead><tbody>",
    );

    for flight in flights {
        let status = if flight.processed { "processed" } else { "pending" };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/flights/{}\">details</a></td></tr>",
            flight.filename,
            flight.metrics.location.as_deref().unwrap_or("—"),
            format_duration(flight.metrics.duration_seconds),
            format_distance(flight.metrics.distance_meters),
            status,
            flight.id,
        ));
    }

    body.push_str("</tbody></table></div></section>");
    body
}

pub fn render_flight_detail(flight: &FlightRecord) -> String {
    let metrics = &flight.metrics;
    let mut body = String::new();

    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Flight Overview</p><h2>{}</h2></div>",
        flight.filename
    ));
    body.push_str(&format!(
        "<a class=\"cta\" download=\"{}\" href=\"/flights/{}/download\">Download IGC</a>",
        flight.filename, flight.id
    ));
    body.push_str("</div>");

    body.push_str("<div class=\"summary-grid\">");
    for (label, value) in [
        (
            "Location",
            metrics.location.clone().unwrap_or_else(|| "—".into()),
        ),
        ("Duration", format_duration(metrics.duration_seconds)),
        ("Distance", format_distance(metrics.distance_meters)),
        ("Track Length", format_distance(metrics.track_length_meters)),
        ("Max Altitude", format_altitude(metrics.altitude_max_meters)),
        ("Max Alt Gain", format_altitude(metrics.max_alt_gain_meters)),
        ("Avg Speed", format_speed(metrics.avg_speed_kmh)),
        ("Max Climb", format_vario(metrics.max_climb_ms)),
        ("Max Sink", format_vario(metrics.max_sink_ms)),
    ] {
        body.push_str(&format!(
            "<div class=\"summary-card\"><p class=\"label\">{}</p><p class=\"value\">{}</p></div>",
            label, value
        ));
    }
    body.push_str("</div>");
    body.push_str("</section>");
    body
}
