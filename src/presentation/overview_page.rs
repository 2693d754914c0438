// HTML overview page listing every sensor with its chart
use crate::application::station_service::SensorSummary;
use chrono::FixedOffset;

const STYLE: &str = "body { background-color: #cccccc; font-family: Arial, Helvetica, Sans-Serif; color: #000088; }\n\
                     embed { width: 98%; height: auto; }";

pub fn render_overview(title: &str, sensors: &[SensorSummary], zone: &FixedOffset) -> String {
    let mut html = String::with_capacity(2048);
    let title = html_escape(title);

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n", title, STYLE));
    html.push_str(&format!("<h1>{}</h1>\n", title));

    for sensor in sensors {
        html.push_str(&format!("<h2>{}</h2>\n", html_escape(&sensor.title)));
        html.push_str(&format!("<p>{}</p>\n", latest_line(sensor, zone)));
        html.push_str(&format!(
            "<embed src=\"graph?sensor={}\" type=\"image/svg+xml\" width=\"98%\" height=\"500\">\n",
            urlencoding::encode(&sensor.id)
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn latest_line(sensor: &SensorSummary, zone: &FixedOffset) -> String {
    let Some(sample) = &sensor.latest else {
        return "No readings yet".to_string();
    };

    let when = sample.timestamp.with_timezone(zone).format("%Y-%m-%d %H:%M:%S");
    if sample.has_humidity() {
        format!(
            "Latest reading {} temperature {:.1} °C humidity {:.1} %",
            when, sample.temperature, sample.humidity
        )
    } else {
        format!("Latest reading {} temperature {:.1} °C", when, sample.temperature)
    }
}
