// Projection of sensor readings onto the chart's pixel grid
use super::drawing::{Drawing, GridPattern, HourTick, Label, Polyline, Rect, SeriesKind, ValueTick};
use super::reading::{AxisRange, DEFAULT_GRID_STEP, Point, Sample, Segment, Window};
use chrono::{DateTime, Timelike, Utc};
use thiserror::Error;

/// Consecutive points further apart than this many minutes start a new segment
const GAP_TOLERANCE_MINUTES: i64 = 5;

/// Largest axis bound in tenths of a degree (±1000 °C)
const MAX_AXIS_TENTHS: i64 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("no data for window")]
    NoData,
    #[error("readings outside the chartable temperature range")]
    OutOfRange,
}

/// Pixel layout constants shared by every chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub horizontal_pixels_per_minute: i64,
    pub value_axis_width: i64,
    pub row_height_per_grid_step: i64,
    pub grid_step: i64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            horizontal_pixels_per_minute: 1,
            value_axis_width: 60,
            row_height_per_grid_step: 50,
            grid_step: DEFAULT_GRID_STEP,
        }
    }
}

impl Geometry {
    pub fn plot_width(&self, window: &Window) -> i64 {
        window.total_minutes() * self.horizontal_pixels_per_minute
    }

    fn gap_tolerance(&self) -> i64 {
        GAP_TOLERANCE_MINUTES * self.horizontal_pixels_per_minute
    }
}

/// Turns an ordered list of readings into a [`Drawing`].
///
/// The projector is stateless apart from its geometry; the same samples
/// and window always produce the same drawing.
#[derive(Debug, Clone, Default)]
pub struct ChartProjector {
    geometry: Geometry,
}

impl ChartProjector {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Temperature axis range. Zero is always inside the range, and both
    /// bounds are pushed outward to the next full grid step.
    ///
    /// Readings that are all exactly 0.0 °C give `{min: 0, max: step}`
    /// rather than the symmetric `{-step, step}`: the outward push only
    /// applies to non-zero bounds, and one row is added so the axis keeps
    /// a height. Bounds beyond ±1000 °C fail with [`ChartError::OutOfRange`].
    pub fn compute_range(&self, samples: &[Sample]) -> Result<AxisRange, ChartError> {
        let step = self.geometry.grid_step;
        let mut observed = samples.iter().filter_map(Sample::tenths).peekable();
        if observed.peek().is_none() {
            return Err(ChartError::NoData);
        }

        let (low, high) = observed.fold((0, 0), |(low, high), t| (low.min(t), high.max(t)));

        let min = low
            .checked_rem(step)
            .and_then(|r| low.checked_sub(r))
            .and_then(|m| if low < 0 { m.checked_sub(step) } else { Some(m) });
        let max = high
            .checked_rem(step)
            .and_then(|r| high.checked_sub(r))
            .and_then(|m| if high > 0 { m.checked_add(step) } else { Some(m) });
        let (Some(min), Some(mut max)) = (min, max) else {
            return Err(ChartError::OutOfRange);
        };
        if min < -MAX_AXIS_TENTHS || max > MAX_AXIS_TENTHS {
            return Err(ChartError::OutOfRange);
        }
        if max == min {
            // every reading was 0.0; keep one row so the chart has height
            max += step;
        }

        Ok(AxisRange { min, max, step })
    }

    /// Horizontal pixel for a timestamp; the window end maps to the plot width.
    /// Values outside `0..=plot_width` are outside the window.
    pub fn project_x(&self, timestamp: DateTime<Utc>, window: &Window) -> i64 {
        let minutes_from_end = (window.end.timestamp() - timestamp.timestamp()) / 60;
        (window.total_minutes() - minutes_from_end) * self.geometry.horizontal_pixels_per_minute
    }

    pub fn project_y_temperature(&self, temperature: f64, range: &AxisRange) -> i64 {
        range.max - (temperature * 10.0).round() as i64 + self.geometry.row_height_per_grid_step
    }

    pub fn project_y_humidity(&self, humidity: f64, span: i64) -> i64 {
        ((100.0 - humidity) * span as f64 / 100.0).round() as i64
            + self.geometry.row_height_per_grid_step
    }

    pub fn temperature_series(
        &self,
        samples: &[Sample],
        window: &Window,
        range: &AxisRange,
    ) -> Vec<Point> {
        samples
            .iter()
            .filter(|s| s.temperature.is_finite())
            .filter_map(|s| {
                self.plotted_x(s.timestamp, window)
                    .map(|x| Point::new(x, self.project_y_temperature(s.temperature, range)))
            })
            .collect()
    }

    pub fn humidity_series(
        &self,
        samples: &[Sample],
        window: &Window,
        range: &AxisRange,
    ) -> Vec<Point> {
        let span = range.span();
        samples
            .iter()
            .filter(|s| s.has_humidity())
            .filter_map(|s| {
                self.plotted_x(s.timestamp, window)
                    .map(|x| Point::new(x, self.project_y_humidity(s.humidity, span)))
            })
            .collect()
    }

    fn plotted_x(&self, timestamp: DateTime<Utc>, window: &Window) -> Option<i64> {
        let x = self.project_x(timestamp, window);
        (0..=self.geometry.plot_width(window)).contains(&x).then_some(x)
    }

    /// Split a series into runs wherever two neighbours are more than
    /// five minutes apart.
    pub fn segment(&self, series: &[Point]) -> Vec<Segment> {
        let tolerance = self.geometry.gap_tolerance();
        let mut segments: Vec<Segment> = Vec::new();

        for point in series {
            match segments.last_mut() {
                Some(current)
                    if current
                        .points
                        .last()
                        .is_some_and(|prev| point.x - prev.x <= tolerance) =>
                {
                    current.points.push(*point);
                }
                _ => segments.push(Segment::new(vec![*point])),
            }
        }

        segments
    }

    /// One tick per hour column; x is relative to the plot's left edge.
    pub fn build_hour_ticks(&self, window: &Window) -> Vec<HourTick> {
        let end_hour = window.end.hour() as i64;
        let column_width = 60 * self.geometry.horizontal_pixels_per_minute;

        (0..=window.lookback_hours)
            .map(|column| HourTick {
                x: column * column_width,
                hour: (end_hour - (window.lookback_hours - column)).rem_euclid(24) as u32,
            })
            .collect()
    }

    pub fn build_value_ticks(&self, range: &AxisRange) -> Vec<ValueTick> {
        let span = range.span();
        let step = range.step;

        (0..=span / step)
            .map(|row| ValueTick {
                y: self.geometry.row_height_per_grid_step + row * step,
                temperature_label: (range.max - row * step) / 10,
                humidity_label: (100.0 - (row * 100 * step) as f64 / span as f64) as i64,
            })
            .collect()
    }

    /// Full projection: range, both series, segmentation and axis ticks.
    pub fn project(&self, samples: &[Sample], window: &Window) -> Result<Drawing, ChartError> {
        let geometry = &self.geometry;
        let range = self.compute_range(samples)?;
        let span = range.span();
        let plot_width = geometry.plot_width(window);
        let left = geometry.value_axis_width;

        let mut polylines = Vec::new();
        let series = [
            (SeriesKind::Temperature, self.temperature_series(samples, window, &range)),
            (SeriesKind::Humidity, self.humidity_series(samples, window, &range)),
        ];
        for (kind, points) in series {
            for segment in self.segment(&points) {
                polylines.push(Polyline {
                    kind,
                    color: kind.color(),
                    stroke_width: 2,
                    points: segment
                        .points
                        .into_iter()
                        .map(|p| Point::new(p.x + left, p.y))
                        .collect(),
                });
            }
        }

        let hour_ticks = self
            .build_hour_ticks(window)
            .into_iter()
            .map(|tick| HourTick {
                x: tick.x + left,
                ..tick
            })
            .collect();

        let plot_area = Rect {
            x: left,
            y: geometry.row_height_per_grid_step,
            width: plot_width,
            height: span,
        };

        Ok(Drawing {
            width: plot_width + 2 * left,
            height: span + 2 * geometry.row_height_per_grid_step,
            grid: GridPattern {
                tile_width: left,
                tile_height: geometry.row_height_per_grid_step,
                fill: "NavajoWhite",
                stroke: "grey",
            },
            plot_area,
            polylines,
            hour_ticks,
            value_ticks: self.build_value_ticks(&range),
            captions: self.captions(samples, window, &plot_area),
        })
    }

    fn captions(&self, samples: &[Sample], window: &Window, plot_area: &Rect) -> Vec<Label> {
        let (low, high) = samples
            .iter()
            .map(|s| s.temperature)
            .filter(|t| t.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), t| {
                (low.min(t), high.max(t))
            });

        let start_date = window.start().date_naive();
        let end_date = window.end.date_naive();
        let covered = if start_date == end_date {
            end_date.format("%Y-%m-%d").to_string()
        } else {
            format!("{} to {}", start_date.format("%Y-%m-%d"), end_date.format("%Y-%m-%d"))
        };

        let y = plot_area.y + plot_area.height + 40;
        vec![
            Label {
                x: plot_area.x + 40,
                y,
                color: SeriesKind::Humidity.color(),
                text: format!("{}h humidity 0-100%", window.lookback_hours),
            },
            Label {
                x: plot_area.x + plot_area.width / 2,
                y,
                color: SeriesKind::Temperature.color(),
                text: format!(
                    "{}h temperature {:.1} to {:.1} °C, {}",
                    window.lookback_hours, low, high, covered
                ),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn window_ending(end: DateTime<Utc>) -> Window {
        Window::last_day(end.fixed_offset())
    }

    fn sample(minutes: i64, temperature: f64, humidity: f64) -> Sample {
        Sample::new(t0() + Duration::minutes(minutes), temperature, humidity)
    }

    fn gap_scenario() -> Vec<Sample> {
        vec![
            sample(0, 10.0, 50.0),
            sample(1, 10.0, 50.0),
            sample(10, 12.0, 55.0),
        ]
    }

    #[test]
    fn test_range_empty_is_no_data() {
        let projector = ChartProjector::default();
        assert_eq!(projector.compute_range(&[]), Err(ChartError::NoData));
    }

    #[test]
    fn test_range_only_nan_is_no_data() {
        let projector = ChartProjector::default();
        let samples = vec![sample(0, f64::NAN, 40.0)];
        assert_eq!(projector.compute_range(&samples), Err(ChartError::NoData));
    }

    #[test]
    fn test_range_single_zero_reading() {
        // widen-then-snap leaves 0..0; one step is added so the chart has height
        let projector = ChartProjector::default();
        let range = projector.compute_range(&[sample(0, 0.0, 0.0)]).unwrap();
        assert_eq!(range, AxisRange { min: 0, max: 50, step: 50 });
    }

    #[test]
    fn test_range_positive_only_includes_zero() {
        let projector = ChartProjector::default();
        let range = projector
            .compute_range(&[sample(0, 12.3, 40.0), sample(1, 14.9, 40.0)])
            .unwrap();
        assert_eq!(range.min, 0);
        assert_eq!(range.max, 150);
    }

    #[test]
    fn test_range_snaps_outward() {
        let projector = ChartProjector::default();
        let range = projector
            .compute_range(&[sample(0, -3.7, 40.0), sample(1, 12.3, 40.0)])
            .unwrap();
        assert_eq!(range, AxisRange { min: -50, max: 150, step: 50 });

        // exact multiples still move one step outward
        let range = projector
            .compute_range(&[sample(0, -5.0, 40.0), sample(1, 5.0, 40.0)])
            .unwrap();
        assert_eq!(range, AxisRange { min: -100, max: 100, step: 50 });
    }

    #[test]
    fn test_range_rejects_unchartable_readings() {
        let projector = ChartProjector::default();
        for t in [1e300, -1e300, 1e9, 1000.1, -1000.1] {
            assert_eq!(
                projector.compute_range(&[sample(0, t, 50.0)]),
                Err(ChartError::OutOfRange),
                "temperature {}",
                t
            );
        }
        assert_eq!(
            projector.project(&[sample(0, 1e300, 50.0)], &window_ending(t0())),
            Err(ChartError::OutOfRange)
        );

        let range = projector.compute_range(&[sample(0, 995.0, 50.0)]).unwrap();
        assert_eq!(range.max, MAX_AXIS_TENTHS);
    }

    #[test]
    fn test_project_x() {
        let projector = ChartProjector::default();
        let window = window_ending(t0() + Duration::minutes(10));
        assert_eq!(projector.project_x(t0() + Duration::minutes(10), &window), 1440);
        assert_eq!(projector.project_x(t0(), &window), 1430);
        // partial minutes truncate toward zero
        assert_eq!(projector.project_x(t0() + Duration::seconds(59), &window), 1431);
        assert_eq!(projector.project_x(t0() - Duration::seconds(59), &window), 1430);
        assert_eq!(projector.project_x(t0() - Duration::hours(30), &window), -370);
    }

    #[test]
    fn test_out_of_window_samples_are_dropped() {
        let projector = ChartProjector::default();
        let window = window_ending(t0());
        let samples = vec![
            sample(-25 * 60, 5.0, 50.0),
            sample(-60, 6.0, 50.0),
            sample(3, 7.0, 50.0),
        ];
        let range = projector.compute_range(&samples).unwrap();
        let series = projector.temperature_series(&samples, &window, &range);
        assert_eq!(series, vec![Point::new(1380, range.max - 60 + 50)]);
    }

    #[test]
    fn test_project_y() {
        let projector = ChartProjector::default();
        let range = AxisRange { min: 0, max: 150, step: 50 };
        assert_eq!(projector.project_y_temperature(10.0, &range), 100);
        assert_eq!(projector.project_y_temperature(15.0, &range), 50);
        assert_eq!(projector.project_y_temperature(0.0, &range), 200);
        assert_eq!(projector.project_y_humidity(50.0, range.span()), 125);
        assert_eq!(projector.project_y_humidity(100.0, range.span()), 50);
        assert_eq!(projector.project_y_humidity(0.0, range.span()), 200);
    }

    #[test]
    fn test_gap_splits_both_series() {
        let projector = ChartProjector::default();
        let samples = gap_scenario();
        let window = window_ending(t0() + Duration::minutes(10));
        let range = projector.compute_range(&samples).unwrap();

        let temperature = projector.segment(&projector.temperature_series(&samples, &window, &range));
        let humidity = projector.segment(&projector.humidity_series(&samples, &window, &range));

        assert_eq!(temperature.len(), 2);
        assert_eq!(humidity.len(), 2);
        assert_eq!(temperature[0].points.len(), 2);
        assert_eq!(temperature[1].points, vec![Point::new(1440, 150 - 120 + 50)]);
    }

    #[test]
    fn test_gap_of_exactly_tolerance_stays_joined() {
        let projector = ChartProjector::default();
        let series = vec![Point::new(0, 1), Point::new(5, 1), Point::new(11, 1)];
        let segments = projector.segment(&series);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].points.len(), 2);
    }

    #[test]
    fn test_segment_empty() {
        let projector = ChartProjector::default();
        assert!(projector.segment(&[]).is_empty());
    }

    #[test]
    fn test_missing_humidity_only_affects_humidity() {
        let projector = ChartProjector::default();
        let samples = vec![sample(0, 10.0, -1.0), sample(1, 11.0, -999.0)];
        let drawing = projector.project(&samples, &window_ending(t0() + Duration::minutes(1))).unwrap();

        assert_eq!(drawing.polylines_of(SeriesKind::Humidity).count(), 0);
        let temperature: Vec<_> = drawing.polylines_of(SeriesKind::Temperature).collect();
        assert_eq!(temperature.len(), 1);
        assert_eq!(temperature[0].points.len(), 2);
    }

    #[test]
    fn test_hour_ticks() {
        let projector = ChartProjector::default();
        let end = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, 14, 30, 0)
            .unwrap();
        let ticks = projector.build_hour_ticks(&Window::last_day(end));

        assert_eq!(ticks.len(), 25);
        assert_eq!(ticks[0], HourTick { x: 0, hour: 14 });
        assert_eq!(ticks[10], HourTick { x: 600, hour: 0 });
        assert_eq!(ticks[9].hour, 23);
        assert_eq!(ticks[24], HourTick { x: 1440, hour: 14 });
    }

    #[test]
    fn test_value_ticks() {
        let projector = ChartProjector::default();
        let ticks = projector.build_value_ticks(&AxisRange { min: 0, max: 150, step: 50 });
        let labels: Vec<_> = ticks
            .iter()
            .map(|t| (t.y, t.temperature_label, t.humidity_label))
            .collect();
        assert_eq!(labels, vec![(50, 15, 100), (100, 10, 66), (150, 5, 33), (200, 0, 0)]);
    }

    #[test]
    fn test_value_ticks_below_zero() {
        let projector = ChartProjector::default();
        let ticks = projector.build_value_ticks(&AxisRange { min: -100, max: 50, step: 50 });
        let temperatures: Vec<_> = ticks.iter().map(|t| t.temperature_label).collect();
        assert_eq!(temperatures, vec![5, 0, -5, -10]);
    }

    #[test]
    fn test_project_layout() {
        let projector = ChartProjector::default();
        let samples = gap_scenario();
        let drawing = projector
            .project(&samples, &window_ending(t0() + Duration::minutes(10)))
            .unwrap();

        assert_eq!(drawing.width, 1440 + 120);
        assert_eq!(drawing.height, 150 + 100);
        assert_eq!(drawing.plot_area, Rect { x: 60, y: 50, width: 1440, height: 150 });
        assert_eq!((drawing.grid.tile_width, drawing.grid.tile_height), (60, 50));
        assert_eq!(drawing.polylines.len(), 4);
        assert_eq!(drawing.polylines[0].points[0], Point::new(1430 + 60, 100));
        assert_eq!(drawing.polylines[0].color, "MediumBlue");
        assert_eq!(drawing.polylines[3].color, "DarkGreen");
        assert_eq!(drawing.hour_ticks[0].x, 60);
        assert!(drawing.captions[1].text.contains("10.0 to 12.0 °C"));
    }

    #[test]
    fn test_project_is_deterministic() {
        let projector = ChartProjector::default();
        let window = window_ending(t0() + Duration::minutes(10));
        let samples = gap_scenario();
        assert_eq!(
            projector.project(&samples, &window),
            projector.project(&samples, &window)
        );
    }

    #[test]
    fn test_project_empty_is_no_data() {
        let projector = ChartProjector::default();
        assert_eq!(projector.project(&[], &window_ending(t0())), Err(ChartError::NoData));
    }

    proptest! {
        #[test]
        fn prop_range_straddles_zero_on_step(
            temperatures in prop::collection::vec(-60.0f64..60.0, 1..50)
        ) {
            let projector = ChartProjector::default();
            let samples: Vec<_> = temperatures
                .iter()
                .enumerate()
                .map(|(i, t)| sample(i as i64, *t, 50.0))
                .collect();
            let range = projector.compute_range(&samples).unwrap();

            prop_assert!(range.min <= 0 && 0 <= range.max);
            prop_assert_eq!(range.min % range.step, 0);
            prop_assert_eq!(range.max % range.step, 0);
            prop_assert!(range.span() > 0);
            for s in &samples {
                let t = s.tenths().unwrap();
                prop_assert!(range.min <= t && t <= range.max);
            }
        }

        #[test]
        fn prop_project_x_monotonic(mut offsets in prop::collection::vec(0i64..86_400, 2..50)) {
            offsets.sort_unstable();
            let projector = ChartProjector::default();
            let window = window_ending(t0() + Duration::seconds(86_400));
            let xs: Vec<_> = offsets
                .iter()
                .map(|s| projector.project_x(t0() + Duration::seconds(*s), &window))
                .collect();
            prop_assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn prop_segmentation_is_idempotent(mut xs in prop::collection::vec(0i64..1440, 0..60)) {
            xs.sort_unstable();
            let projector = ChartProjector::default();
            let series: Vec<_> = xs.iter().map(|x| Point::new(*x, 0)).collect();
            let segments = projector.segment(&series);

            let flattened: Vec<_> = segments.iter().flat_map(|s| s.points.clone()).collect();
            prop_assert_eq!(&projector.segment(&flattened), &segments);
            for s in &segments {
                prop_assert_eq!(&projector.segment(&s.points), &vec![s.clone()]);
            }
        }

        #[test]
        fn prop_temperature_round_trip(t in -60.0f64..60.0) {
            let projector = ChartProjector::default();
            let range = projector.compute_range(&[sample(0, t, 50.0)]).unwrap();
            let y = projector.project_y_temperature(t, &range);
            let recovered = (range.max + projector.geometry().row_height_per_grid_step - y) as f64 / 10.0;
            prop_assert!((recovered - t).abs() <= 0.05 + 1e-9);
        }
    }
}
