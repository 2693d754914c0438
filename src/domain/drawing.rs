// Structured chart description, independent of any output format
use super::reading::Point;

pub const TEMPERATURE_COLOR: &str = "MediumBlue";
pub const HUMIDITY_COLOR: &str = "DarkGreen";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Temperature,
    Humidity,
}

impl SeriesKind {
    pub fn color(&self) -> &'static str {
        match self {
            SeriesKind::Temperature => TEMPERATURE_COLOR,
            SeriesKind::Humidity => HUMIDITY_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Background tile repeated over the plot area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPattern {
    pub tile_width: i64,
    pub tile_height: i64,
    pub fill: &'static str,
    pub stroke: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polyline {
    pub kind: SeriesKind,
    pub color: &'static str,
    pub stroke_width: i64,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourTick {
    pub x: i64,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTick {
    pub y: i64,
    pub temperature_label: i64,
    pub humidity_label: i64,
}

/// A piece of text anchored at viewport coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub x: i64,
    pub y: i64,
    pub color: &'static str,
    pub text: String,
}

/// Everything a renderer needs to draw one chart.
/// All coordinates are viewport pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub width: i64,
    pub height: i64,
    pub grid: GridPattern,
    pub plot_area: Rect,
    pub polylines: Vec<Polyline>,
    pub hour_ticks: Vec<HourTick>,
    pub value_ticks: Vec<ValueTick>,
    pub captions: Vec<Label>,
}

impl Drawing {
    pub fn polylines_of(&self, kind: SeriesKind) -> impl Iterator<Item = &Polyline> {
        self.polylines.iter().filter(move |p| p.kind == kind)
    }
}
