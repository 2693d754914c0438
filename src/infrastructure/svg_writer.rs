// SVG rendering of chart drawings through the plotters SVG backend
use crate::domain::drawing::{Drawing, HUMIDITY_COLOR, Label, TEMPERATURE_COLOR};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

const FONT_FAMILY: &str = "sans-serif";
const LABEL_OFFSET: i64 = 5;

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("drawing size {0}x{1} cannot be rendered")]
    InvalidSize(i64, i64),
    #[error("failed to render chart: {0}")]
    Render(String),
}

/// Render a drawing as an SVG document.
pub fn write_svg(drawing: &Drawing) -> Result<String, SvgError> {
    let invalid_size = || SvgError::InvalidSize(drawing.width, drawing.height);
    let size = (
        u32::try_from(drawing.width).map_err(|_| invalid_size())?,
        u32::try_from(drawing.height).map_err(|_| invalid_size())?,
    );

    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
        draw_chart(&root, drawing)?;
        root.present().map_err(render_error)?;
    }

    Ok(buffer)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    drawing: &Drawing,
) -> Result<(), SvgError> {
    draw_grid(root, drawing)?;

    for polyline in &drawing.polylines {
        let style = named_color(polyline.color)
            .stroke_width(u32::try_from(polyline.stroke_width).unwrap_or(1));
        let points: Vec<_> = polyline.points.iter().map(|p| coord(p.x, p.y)).collect();
        root.draw(&PathElement::new(points, style))
            .map_err(render_error)?;
    }

    let plot = &drawing.plot_area;
    let temperature_color = named_color(TEMPERATURE_COLOR);
    let humidity_color = named_color(HUMIDITY_COLOR);
    let temperature_style = text_style(&temperature_color, HPos::Left, VPos::Center);
    let humidity_style = text_style(&humidity_color, HPos::Left, VPos::Center);
    for tick in &drawing.value_ticks {
        root.draw(&Text::new(
            format!("{}°C", tick.temperature_label),
            coord(plot.x + plot.width + LABEL_OFFSET, tick.y),
            temperature_style.clone(),
        ))
        .map_err(render_error)?;
        root.draw(&Text::new(
            format!("{}%", tick.humidity_label),
            coord(LABEL_OFFSET, tick.y),
            humidity_style.clone(),
        ))
        .map_err(render_error)?;
    }

    let hour_style = text_style(&BLACK, HPos::Center, VPos::Top);
    let hour_labels_y = plot.y + plot.height + LABEL_OFFSET;
    for tick in &drawing.hour_ticks {
        root.draw(&Text::new(
            tick.hour.to_string(),
            coord(tick.x, hour_labels_y),
            hour_style.clone(),
        ))
        .map_err(render_error)?;
    }

    for caption in &drawing.captions {
        draw_label(root, caption)?;
    }

    Ok(())
}

/// Plot background: filled rectangle, grey grid lines on tile borders and a black frame
fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    drawing: &Drawing,
) -> Result<(), SvgError> {
    let grid = &drawing.grid;
    let plot = &drawing.plot_area;
    let (left, top) = (plot.x, plot.y);
    let (right, bottom) = (plot.x + plot.width, plot.y + plot.height);

    root.draw(&Rectangle::new(
        [coord(left, top), coord(right, bottom)],
        named_color(grid.fill).filled(),
    ))
    .map_err(render_error)?;

    let line_style = named_color(grid.stroke).stroke_width(1);
    if grid.tile_width > 0 {
        let mut x = left + grid.tile_width;
        while x < right {
            root.draw(&PathElement::new(vec![coord(x, top), coord(x, bottom)], line_style))
                .map_err(render_error)?;
            x += grid.tile_width;
        }
    }
    if grid.tile_height > 0 {
        let mut y = top + grid.tile_height;
        while y < bottom {
            root.draw(&PathElement::new(vec![coord(left, y), coord(right, y)], line_style))
                .map_err(render_error)?;
            y += grid.tile_height;
        }
    }

    root.draw(&Rectangle::new(
        [coord(left, top), coord(right, bottom)],
        BLACK.stroke_width(1),
    ))
    .map_err(render_error)?;

    Ok(())
}

fn draw_label<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    label: &Label,
) -> Result<(), SvgError> {
    let color = named_color(label.color);
    root.draw(&Text::new(
        label.text.clone(),
        coord(label.x, label.y),
        text_style(&color, HPos::Left, VPos::Bottom),
    ))
    .map_err(render_error)?;
    Ok(())
}

fn text_style(color: &RGBColor, h_pos: HPos, v_pos: VPos) -> TextStyle<'_> {
    TextStyle::from((FONT_FAMILY, 14).into_font())
        .color(color)
        .pos(Pos::new(h_pos, v_pos))
}

/// The CSS colour names used by drawings
fn named_color(name: &str) -> RGBColor {
    match name {
        "MediumBlue" => RGBColor(0, 0, 205),
        "DarkGreen" => RGBColor(0, 100, 0),
        "NavajoWhite" => RGBColor(255, 222, 173),
        "grey" | "gray" => RGBColor(128, 128, 128),
        _ => BLACK,
    }
}

fn coord(x: i64, y: i64) -> (i32, i32) {
    let clamp = |v: i64| v.clamp(i32::MIN.into(), i32::MAX.into()) as i32;
    (clamp(x), clamp(y))
}

fn render_error(err: impl std::fmt::Display) -> SvgError {
    SvgError::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::ChartProjector;
    use crate::domain::reading::{Sample, Window};
    use chrono::{Duration, TimeZone, Utc};

    fn drawing() -> Drawing {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let samples = vec![
            Sample::new(t0, 10.0, 50.0),
            Sample::new(t0 + Duration::minutes(1), 10.0, 50.0),
            Sample::new(t0 + Duration::minutes(10), 12.0, 55.0),
        ];
        let window = Window::last_day((t0 + Duration::minutes(10)).fixed_offset());
        ChartProjector::default().project(&samples, &window).unwrap()
    }

    #[test]
    fn test_svg_document() {
        let svg = write_svg(&drawing()).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains(r#"width="1560""#));
        assert!(svg.contains(r#"height="250""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_svg_polylines() {
        let svg = write_svg(&drawing()).unwrap();
        let lower = svg.to_lowercase();

        // 23 vertical and 2 horizontal grid lines, then one line per segment
        assert_eq!(svg.matches("<polyline").count(), 25 + 4);
        assert_eq!(lower.matches(r##"stroke="#0000cd""##).count(), 2);
        assert_eq!(lower.matches(r##"stroke="#006400""##).count(), 2);
    }

    #[test]
    fn test_svg_labels() {
        let svg = write_svg(&drawing()).unwrap();

        // 25 hour ticks, 4 rows of two value labels, 2 captions
        assert_eq!(svg.matches("</text>").count(), 25 + 8 + 2);
        assert!(svg.contains(">15°C</text>"));
        assert!(svg.contains(">66%</text>"));
        assert!(svg.contains("10.0 to 12.0 °C"));
    }

    #[test]
    fn test_svg_escapes_text() {
        let mut drawing = drawing();
        drawing.captions = vec![Label {
            x: 10,
            y: 10,
            color: TEMPERATURE_COLOR,
            text: "min < max & done".to_string(),
        }];

        let svg = write_svg(&drawing).unwrap();
        assert!(svg.contains("min &lt; max &amp; done"));
        assert!(!svg.contains("min < max"));
    }

    #[test]
    fn test_svg_rejects_negative_size() {
        let mut drawing = drawing();
        drawing.width = -1;
        assert!(matches!(write_svg(&drawing), Err(SvgError::InvalidSize(-1, 250))));
    }

    #[test]
    fn test_svg_is_deterministic() {
        assert_eq!(write_svg(&drawing()).unwrap(), write_svg(&drawing()).unwrap());
    }

    #[test]
    fn test_named_color() {
        let RGBColor(r, g, b) = named_color("MediumBlue");
        assert_eq!((r, g, b), (0, 0, 205));
        let RGBColor(r, g, b) = named_color("unknown");
        assert_eq!((r, g, b), (0, 0, 0));
    }
}
