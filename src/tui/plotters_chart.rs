//! Decline-curve chart widget, drawn with Plotters into the Ratatui buffer.
//!
//! Ratatui's own `Chart` widget would work, but Plotters handles the axis
//! and tick plumbing for us and leaves room to grow (legends, file-backend
//! exports). `plotters-ratatui-backend` bridges the two.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Plotters needs at least this much room to lay out axes sensibly.
const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;

/// Render-only description of one observed/fitted overlay.
///
/// Series and bounds are computed by the caller; this type only draws. That
/// keeps the data prep testable without a terminal.
pub struct DcaPlottersChart<'a> {
    /// The fitted decline curve, as a line.
    pub curve: &'a [(f64, f64)],
    /// Observed production, as a scatter.
    pub points: &'a [(f64, f64)],
    /// Time bounds.
    pub x_bounds: [f64; 2],
    /// Production-rate bounds.
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> DcaPlottersChart<'a> {
    fn bounds_are_drawable(&self) -> bool {
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite() && x1 > x0 && y1 > y0
    }
}

impl<'a> Widget for DcaPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }
        if !self.bounds_are_drawable() {
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are coarse; tight label areas read better.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines off: at terminal resolution they drown the curve.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let curve_color = RGBColor(0, 255, 255);
            chart.draw_series(LineSeries::new(self.curve.iter().copied(), &curve_color))?;

            // Observed points as `Pixel`, not `Circle`: the ratatui backend
            // maps circle radii into normalized canvas units, which blows a
            // 2-pixel marker up to a blob several cells wide.
            chart.draw_series(self.points.iter().map(|&(t, q)| Pixel::new((t, q), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
