//! Dashboard page handler.
//!
//! Serves `/`: a self-contained page with the "now", "today" and "yesterday"
//! charts fed by the session WebSocket, plus a "some day" chart loaded on
//! demand from `/api/day/{date}`.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::handlers::health::{format_uptime, FOOTER_TEXT};
use crate::state::SharedState;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PV Dashboard</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }
        .container {
            max-width: 1100px;
            margin: 0 auto;
            background: white;
            padding: 30px 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            border-bottom: 3px solid #f0a500;
            padding-bottom: 10px;
            margin-bottom: 10px;
        }
        h2 {
            color: #555;
            margin: 25px 0 8px;
            font-size: 1.15em;
        }
        .info {
            background: #e9ecef;
            padding: 10px 15px;
            border-radius: 4px;
            display: flex;
            justify-content: space-between;
            flex-wrap: wrap;
            font-size: 0.95em;
        }
        .info-value { color: #b07400; font-weight: 600; }
        canvas {
            width: 100%;
            height: 220px;
            background: #fcfcfc;
            border: 1px solid #ddd;
            border-radius: 4px;
        }
        .footer {
            margin-top: 30px;
            padding-top: 15px;
            border-top: 1px solid #ddd;
            color: #666;
            font-size: 0.9em;
        }
    </style>
</head>
<body>
<div class="container">
    <h1>PV Dashboard</h1>
    <div class="info">
        <span>Current: <span class="info-value" id="current">-</span></span>
        <span>Source: <span class="info-value">{{SOURCE}}</span></span>
        <span>Interval: <span class="info-value">{{INTERVAL}} s</span></span>
        <span>Uptime: <span class="info-value">{{UPTIME}}</span></span>
        <span>Connection: <span class="info-value" id="status">connecting</span></span>
    </div>

    <h2>Now (last {{ROLLOVER}} samples)</h2>
    <canvas id="now"></canvas>
    <h2>Today</h2>
    <canvas id="today"></canvas>
    <h2>Yesterday</h2>
    <canvas id="yesterday"></canvas>
    <h2>Some day <input type="date" id="day-picker"></h2>
    <canvas id="some_day"></canvas>

    <div class="footer">{{FOOTER}} - <a href="/health">health</a> - <a href="/config">config</a></div>
</div>
<script>
const series = { now: [], today: [], yesterday: [], some_day: [] };

function draw(name) {
    const canvas = document.getElementById(name);
    const points = series[name];
    const ratio = window.devicePixelRatio || 1;
    canvas.width = canvas.clientWidth * ratio;
    canvas.height = canvas.clientHeight * ratio;
    const ctx = canvas.getContext('2d');
    ctx.scale(ratio, ratio);
    const w = canvas.clientWidth, h = canvas.clientHeight, pad = 40;
    ctx.clearRect(0, 0, w, h);

    const values = points.filter(p => p.y !== null);
    if (values.length === 0) {
        ctx.fillStyle = '#999';
        ctx.fillText('no data', w / 2 - 20, h / 2);
        return;
    }
    const xmin = points[0].x, xmax = points[points.length - 1].x;
    const ymax = values.reduce((m, p) => Math.max(m, p.y), 1);
    const sx = x => pad + (xmax === xmin ? 0 : (x - xmin) / (xmax - xmin)) * (w - 2 * pad);
    const sy = y => h - pad / 2 - (y / ymax) * (h - pad);

    ctx.strokeStyle = '#ccc';
    ctx.beginPath();
    ctx.moveTo(pad, sy(0));
    ctx.lineTo(w - pad, sy(0));
    ctx.stroke();
    ctx.fillStyle = '#666';
    ctx.fillText(ymax.toFixed(0), 4, sy(ymax) + 4);
    ctx.fillText('0', 4, sy(0));
    const fmt = x => new Date(x).toISOString().substring(11, 19);
    ctx.fillText(fmt(xmin), pad, h - 4);
    ctx.fillText(fmt(xmax), w - pad - 45, h - 4);

    ctx.strokeStyle = '#f0a500';
    ctx.lineWidth = 1.5;
    ctx.beginPath();
    let pen = false;
    for (const p of points) {
        if (p.y === null) { pen = false; continue; }
        if (pen) ctx.lineTo(sx(p.x), sy(p.y)); else ctx.moveTo(sx(p.x), sy(p.y));
        pen = true;
    }
    ctx.stroke();
}

function apply(cmd) {
    if (cmd.type === 'replace') {
        series[cmd.chart] = cmd.points;
    } else {
        const data = series[cmd.chart];
        for (const p of cmd.points) data.push(p);
        if (cmd.rollover && data.length > cmd.rollover) data.splice(0, data.length - cmd.rollover);
    }
    if (cmd.chart === 'now' && series.now.length > 0) {
        const last = series.now[series.now.length - 1];
        document.getElementById('current').textContent = last.y === null ? 'n/a' : last.y.toFixed(1);
    }
    draw(cmd.chart);
}

function connect() {
    const proto = location.protocol === 'https:' ? 'wss:' : 'ws:';
    const ws = new WebSocket(proto + '//' + location.host + '/ws');
    const status = document.getElementById('status');
    ws.onopen = () => { status.textContent = 'live'; };
    ws.onmessage = ev => apply(JSON.parse(ev.data));
    ws.onclose = () => {
        status.textContent = 'reconnecting';
        series.now = [];
        setTimeout(connect, 2000);
    };
}

document.getElementById('day-picker').addEventListener('change', async ev => {
    const resp = await fetch('/api/day/' + ev.target.value);
    series.some_day = resp.ok ? (await resp.json()).points : [];
    draw('some_day');
});

window.addEventListener('resize', () => Object.keys(series).forEach(draw));
Object.keys(series).forEach(draw);
connect();
</script>
</body>
</html>
"#;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn dashboard_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let source = format!("{:?}", state.config.viewer.source).to_lowercase();
    let html = PAGE
        .replace("{{SOURCE}}", &source)
        .replace("{{INTERVAL}}", &state.config.ahoy.interval.to_string())
        .replace("{{ROLLOVER}}", &state.config.viewer.rollover_limit.to_string())
        .replace("{{UPTIME}}", &format_uptime(state.start_time.elapsed().as_secs()))
        .replace("{{FOOTER}}", FOOTER_TEXT);

    Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_all_charts() {
        for id in ["now", "today", "yesterday", "some_day"] {
            assert!(PAGE.contains(&format!("id=\"{id}\"")), "missing canvas {id}");
        }
    }

    #[test]
    fn test_page_scales_long_days_without_spreading() {
        // A full day at 1 s cadence exceeds the argument limit of some engines.
        assert!(!PAGE.contains("..."));
        assert!(PAGE.contains("values.reduce((m, p) => Math.max(m, p.y), 1)"));
    }

    #[test]
    fn test_page_streams_in_place() {
        assert!(!PAGE.contains(".concat("));
        assert!(PAGE.contains("data.splice(0, data.length - cmd.rollover)"));
    }
}
