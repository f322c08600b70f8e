use crate::models::{FeedStatus, Summary, Violation};

const RECENT_ROWS: usize = 10;

pub fn render_dashboard(identifier: &str, summary: &Summary, feed: &FeedStatus, violations: &[Violation]) -> String {
    let banner = match &feed.last_error {
        Some(message) => format!(r#"<div class="banner">Failed to load violations: {}</div>"#, escape(message)),
        None => String::new(),
    };

    let rows: String = violations
        .iter()
        .rev()
        .take(RECENT_ROWS)
        .map(render_row)
        .collect();

    DASHBOARD_HTML
        .replace("{{USER}}", &escape(identifier))
        .replace("{{BANNER}}", &banner)
        .replace("{{TOTAL}}", &summary.total_violations.to_string())
        .replace("{{PENDING}}", &summary.pending_count.to_string())
        .replace("{{PAID}}", &format_amount(summary.paid_sum))
        .replace("{{DUE}}", &format_amount(summary.due_sum))
        .replace("{{RATE}}", &format!("{:.0}%", summary.collection_rate * 100.0))
        .replace("{{UPDATED}}", feed.last_updated.as_deref().unwrap_or("never"))
        .replace("{{ROWS}}", &rows)
}

pub fn render_login(error: Option<&str>) -> String {
    let message = error
        .map(|text| format!(r#"<p class="error">{}</p>"#, escape(text)))
        .unwrap_or_default();
    LOGIN_HTML.replace("{{ERROR}}", &message)
}

fn render_row(violation: &Violation) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&violation.id.to_string()),
        escape(&violation.name),
        escape(&violation.vehicle),
        violation.kind,
        escape(&violation.area),
        format_amount(violation.fine),
        violation.status,
    )
}

fn format_amount(amount: u64) -> String {
    format!("\u{20B9}{amount}")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta http-equiv="refresh" content="5" />
  <title>AI Traffic Eye</title>
  <style>
    body { margin: 0; padding: 24px; background: #0d0b1a; color: #e2e8f0; font-family: "Inter", sans-serif; }
    header { display: flex; justify-content: space-between; align-items: center; }
    .stats { display: grid; grid-template-columns: repeat(5, 1fr); gap: 16px; margin: 24px 0; }
    .card { background: #14122b; border: 1px solid #2b2750; border-radius: 12px; padding: 16px; }
    .card span { display: block; font-size: 28px; font-weight: 600; margin-top: 8px; }
    .banner { background: #7f1d1d; padding: 12px; border-radius: 8px; }
    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid #2b2750; }
    a { color: #22d3ee; margin-right: 12px; }
  </style>
</head>
<body>
  <header>
    <h1>AI Traffic Eye</h1>
    <form method="post" action="/logout">{{USER}} <button type="submit">Logout</button></form>
  </header>
  {{BANNER}}
  <section class="stats">
    <div class="card">Total Violations<span>{{TOTAL}}</span></div>
    <div class="card">Pending<span>{{PENDING}}</span></div>
    <div class="card">Collected<span>{{PAID}}</span></div>
    <div class="card">Due<span>{{DUE}}</span></div>
    <div class="card">Collection Rate<span>{{RATE}}</span></div>
  </section>
  <p>Last updated: {{UPDATED}}</p>
  <nav>
    <a href="/api/export/violations.csv">Export All Violations</a>
    <a href="/api/export/areas.csv">Export Area Summary</a>
    <a href="/api/export/types.csv">Export Type Summary</a>
    <a href="/api/export/violations.json">Export JSON</a>
  </nav>
  <h2>Recent Violations</h2>
  <table>
    <thead><tr><th>ID</th><th>Name</th><th>Vehicle</th><th>Type</th><th>Area</th><th>Fine</th><th>Status</th></tr></thead>
    <tbody>{{ROWS}}</tbody>
  </table>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>AI Traffic Eye - Login</title>
  <style>
    body { margin: 0; min-height: 100vh; display: grid; place-items: center; background: #0d0b1a; color: #e2e8f0; font-family: "Inter", sans-serif; }
    form { background: #14122b; padding: 32px; border-radius: 16px; display: grid; gap: 12px; min-width: 320px; }
    .error { color: #f472b6; margin: 0; }
  </style>
</head>
<body>
  <form method="post" action="/login">
    <h1>AI Traffic Eye</h1>
    {{ERROR}}
    <input name="identifier" type="email" placeholder="Email" required />
    <input name="secret" type="password" placeholder="Password" required />
    <button type="submit">Login</button>
  </form>
</body>
</html>
"#;
