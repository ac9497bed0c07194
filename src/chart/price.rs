//! Plotters-backed price line chart rendered into a Ratatui buffer.
//!
//! Dates are plotted as day numbers (days from CE) so the x axis stays a plain
//! `f64` range; tick labels convert back to calendar months.

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::Widget,
};

use super::{ChartRenderer, RendererFactory, Surface};
use crate::domain::PricePoint;
use crate::theme::Palette;

/// Smallest area Plotters can lay out axes in.
const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;

#[derive(Debug, Clone)]
pub struct PriceChart {
    palette: Palette,
    width: u16,
    height: u16,
    points: Vec<(f64, f64)>,
    x_bounds: Option<[f64; 2]>,
    y_bounds: Option<[f64; 2]>,
}

impl PriceChart {
    pub fn new(surface: Surface) -> Self {
        Self {
            palette: surface.theme.palette(),
            width: surface.width,
            height: surface.height,
            points: Vec::new(),
            x_bounds: None,
            y_bounds: None,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Visible x range after the last fit (day numbers).
    pub fn x_bounds(&self) -> Option<[f64; 2]> {
        self.x_bounds
    }

    /// Visible y range after the last fit, padded by 5%.
    pub fn y_bounds(&self) -> Option<[f64; 2]> {
        self.y_bounds
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }
}

impl ChartRenderer for PriceChart {
    fn set_data(&mut self, prices: &[PricePoint]) {
        self.points = prices
            .iter()
            .filter(|p| p.value.is_finite())
            .map(|p| (day_number(p.time), p.value))
            .collect();
    }

    fn fit_content(&mut self) {
        let Some(&(first, _)) = self.points.first() else {
            self.x_bounds = None;
            self.y_bounds = None;
            return;
        };
        let last = self.points.last().map(|&(x, _)| x).unwrap_or(first);
        // A single point still needs a non-empty range.
        self.x_bounds = Some(if last > first {
            [first, last]
        } else {
            [first - 1.0, first + 1.0]
        });

        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(_, y) in &self.points {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        let pad = ((y_max - y_min).abs() * 0.05).max(1e-6 * y_max.abs().max(1.0));
        self.y_bounds = Some([y_min - pad, y_max + pad]);
    }

    fn resize_width(&mut self, width: u16) {
        self.width = width;
    }
}

impl Widget for &PriceChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(self.palette.warn),
            );
            return;
        }

        let (Some([x0, x1]), Some([y0, y1])) = (self.x_bounds, self.y_bounds) else {
            return;
        };

        let (lr, lg, lb) = self.palette.series;
        let (ar, ag, ab) = self.palette.axis;
        let line_color = RGBColor(lr, lg, lb);
        let axis_color = RGBColor(ar, ag, ab);
        let points = &self.points;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| format_day_number(*v))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&axis_color))
                .axis_style(&axis_color)
                .draw()?;

            chart.draw_series(LineSeries::new(points.iter().copied(), &line_color))?;
            Ok(())
        });

        widget.render(area, buf);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PriceChartFactory;

impl RendererFactory for PriceChartFactory {
    type Renderer = PriceChart;

    fn create(&mut self, surface: Surface) -> PriceChart {
        PriceChart::new(surface)
    }
}

pub(crate) fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// `YYYY-MM` label for an x position.
pub(crate) fn format_day_number(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chart() -> PriceChart {
        PriceChart::new(Surface::new(60, 20, Theme::Light))
    }

    #[test]
    fn fit_covers_first_to_last_date() {
        let mut c = chart();
        c.set_data(&[
            PricePoint { time: day(2024, 1, 1), value: 50.0 },
            PricePoint { time: day(2024, 2, 1), value: 60.0 },
        ]);
        c.fit_content();

        let [x0, x1] = c.x_bounds().unwrap();
        assert_eq!(x1 - x0, 31.0);
        let [y0, y1] = c.y_bounds().unwrap();
        assert!((y0 - 49.5).abs() < 1e-9);
        assert!((y1 - 60.5).abs() < 1e-9);
    }

    #[test]
    fn single_point_gets_non_empty_bounds() {
        let mut c = chart();
        c.set_data(&[PricePoint { time: day(2024, 1, 1), value: 50.0 }]);
        c.fit_content();
        let [x0, x1] = c.x_bounds().unwrap();
        let [y0, y1] = c.y_bounds().unwrap();
        assert!(x1 > x0);
        assert!(y1 > y0);
    }

    #[test]
    fn empty_data_clears_bounds() {
        let mut c = chart();
        c.set_data(&[PricePoint { time: day(2024, 1, 1), value: 50.0 }]);
        c.fit_content();
        c.set_data(&[]);
        c.fit_content();
        assert!(c.x_bounds().is_none());
        assert!(c.points().is_empty());
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let mut c = chart();
        c.set_data(&[
            PricePoint { time: day(2024, 1, 1), value: f64::NAN },
            PricePoint { time: day(2024, 1, 2), value: 10.0 },
        ]);
        assert_eq!(c.points().len(), 1);
    }

    #[test]
    fn resize_changes_width_only() {
        let mut c = PriceChart::new(Surface::new(60, 20, Theme::Light));
        c.resize_width(90);
        assert_eq!(c.width(), 90);
        assert_eq!(c.height(), 20);
    }

    #[test]
    fn palette_follows_theme() {
        let dark = PriceChart::new(Surface::new(60, 20, Theme::Dark));
        assert_eq!(dark.palette(), Theme::Dark.palette());
    }

    #[test]
    fn day_number_labels_round_trip() {
        assert_eq!(format_day_number(day_number(day(2023, 7, 15))), "2023-07");
        assert_eq!(format_day_number(f64::NAN), "");
    }

    #[test]
    fn too_small_area_renders_hint() {
        let c = chart();
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        (&c).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "C");
    }
}
