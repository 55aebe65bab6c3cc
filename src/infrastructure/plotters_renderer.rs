// Canvas renderer backed by plotters (SVG and bitmap backends)
use crate::application::chart_renderer::ChartRenderer;
use crate::domain::chart::{Chart, FontSpec};
use crate::domain::error::PlotError;
use crate::domain::image::{OutputFormat, RenderedImage};
use crate::domain::palette::Rgb;
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::io::Cursor;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;
const GRID: RGBColor = RGBColor(220, 220, 220);

#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    dpi: f64,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

impl PlottersRenderer {
    pub fn with_dpi(dpi: f64) -> Self {
        Self { dpi }
    }

    fn px(&self, mm: f64) -> f64 {
        mm / MM_PER_INCH * self.dpi
    }

    fn canvas_size(&self, chart: &Chart) -> (u32, u32) {
        (
            self.px(chart.spec.width_mm).round() as u32,
            self.px(chart.spec.height_mm).round() as u32,
        )
    }

    fn text_style(&self, font: FontSpec) -> TextStyle<'static> {
        let style = if font.bold {
            FontStyle::Bold
        } else {
            FontStyle::Normal
        };
        FontDesc::new(FontFamily::from(font.family), self.px(font.size_mm), style).into()
    }

    fn render_svg(&self, chart: &Chart) -> Result<Vec<u8>, PlotError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.canvas_size(chart)).into_drawing_area();
            self.draw(&root, chart)?;
            root.present().map_err(render_error)?;
        }
        Ok(svg.into_bytes())
    }

    fn render_bitmap(&self, chart: &Chart, format: ImageFormat) -> Result<Vec<u8>, PlotError> {
        let (width, height) = self.canvas_size(chart);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw(&root, chart)?;
            root.present().map_err(render_error)?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| PlotError::Render("image buffer conversion failed".to_string()))?;
        let mut output = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut output, format)
            .map_err(render_error)?;
        Ok(output.into_inner())
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
    ) -> Result<(), PlotError> {
        let spec = &chart.spec;
        let text_style = self.text_style(spec.text_font);
        let text_px = self.px(spec.text_font.size_mm);

        root.fill(&WHITE).map_err(render_error)?;

        let margin = self.px(spec.margin_mm).round() as i32;
        let mut area = root.margin(margin, margin, margin, margin);
        if !chart.title.is_empty() {
            let padding = self.px(spec.title_padding_mm).round() as i32;
            area = area
                .margin(padding, 0, 0, 0)
                .titled(&chart.title, self.text_style(spec.title_font))
                .map_err(render_error)?;
        }

        let x_range = chart.x_range();
        let y_range = chart.y_range();

        // two lines of tick text plus the tick gap
        let x_label_area = (text_px * 3.0).ceil() as u32;
        let y_label_area = (text_px * 6.0).ceil() as u32;
        let mut context = ChartBuilder::on(&area)
            .x_label_area_size(x_label_area)
            .y_label_area_size(y_label_area)
            .margin_right((text_px * 3.0).ceil() as u32)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(render_error)?;

        context
            .configure_mesh()
            .x_labels(0)
            .disable_x_mesh()
            .y_labels(8)
            .y_label_style(text_style.clone())
            .light_line_style(&GRID.mix(0.4))
            .bold_line_style(&GRID)
            .draw()
            .map_err(render_error)?;

        let ticks = chart.time_ticks();
        context
            .draw_series(ticks.iter().map(|tick| {
                PathElement::new(vec![(tick.x, y_range.start), (tick.x, y_range.end)], GRID)
            }))
            .map_err(render_error)?;

        let tick_gap = (text_px / 2.0).round() as i32;
        for tick in &ticks {
            let (x, y) = context.backend_coord(&(tick.x, y_range.start));
            let widest = tick.label.lines().max_by_key(|line| line.len()).unwrap_or("");
            let (width, _) = root
                .estimate_text_size(widest, &text_style)
                .map_err(render_error)?;
            let label = MultiLineText::<_, String>::from_string(
                tick.label.clone(),
                (x - width as i32 / 2, y + tick_gap),
                text_style.clone(),
                0,
            );
            root.draw(&label).map_err(render_error)?;
        }

        let stroke = |width_pt: f64| (width_pt / POINTS_PER_INCH * self.dpi).round().max(1.0) as u32;
        for (index, line) in chart.lines.iter().enumerate() {
            let style = ShapeStyle::from(&to_rgb(line.color)).stroke_width(stroke(line.width_pt));
            let series = context
                .draw_series(LineSeries::new(line.points.iter().copied(), style))
                .map_err(render_error)?;

            if let Some(entry) = chart.legend.iter().find(|entry| entry.line == index) {
                series
                    .label(entry.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }

        if !chart.legend.is_empty() {
            context
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .margin(self.px(spec.legend_offset_mm).round() as u32)
                .label_font(text_style.clone())
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_error)?;
        }

        Ok(())
    }
}

fn to_rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn render_error(e: impl Display) -> PlotError {
    PlotError::Render(e.to_string())
}

// Gaps cannot be drawn, a line through them would invent data
fn check_points(chart: &Chart) -> Result<(), PlotError> {
    for (index, line) in chart.lines.iter().enumerate() {
        if let Some((x, y)) = line
            .points
            .iter()
            .find(|(x, y)| !(x.is_finite() && y.is_finite()))
        {
            return Err(PlotError::Render(format!(
                "line {} has a non-finite point ({}, {})",
                index, x, y
            )));
        }
    }
    Ok(())
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, chart: &Chart, format: OutputFormat) -> Result<RenderedImage, PlotError> {
        check_points(chart)?;

        let bytes = match format {
            OutputFormat::Svg => self.render_svg(chart)?,
            OutputFormat::Png => self.render_bitmap(chart, ImageFormat::Png)?,
            OutputFormat::Jpeg => self.render_bitmap(chart, ImageFormat::Jpeg)?,
            OutputFormat::Tiff => self.render_bitmap(chart, ImageFormat::Tiff)?,
            OutputFormat::Bmp => self.render_bitmap(chart, ImageFormat::Bmp)?,
        };

        tracing::debug!("Rendered {} bytes of {}", bytes.len(), format);
        Ok(RenderedImage::new(format, bytes))
    }
}
