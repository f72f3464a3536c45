// src/ui.rs - Theme, video panel widget and joint angle plots
use eframe::egui::{self, Color32, Pos2, Rect, Vec2};
use egui_plot::{Line, LineStyle, Plot, Points};

use crate::insights::InsightStatus;
use crate::signals::{Channel, Sample, SignalTable};
use crate::video::Frame;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub background: Color32,
    pub surface: Color32,
    pub text_secondary: Color32,
    pub reference_line: Color32,
    pub progress_line: Color32,
    pub marker: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            background: Color32::from_rgb(20, 20, 25),
            surface: Color32::from_rgb(30, 30, 35),
            text_secondary: Color32::from_rgb(200, 200, 200),
            reference_line: Color32::from_gray(128).gamma_multiply(0.5),
            progress_line: Color32::from_rgb(30, 144, 255),
            marker: Color32::from_rgb(244, 67, 54),
        }
    }
}

impl Theme {
    pub fn status_color(&self, status: InsightStatus) -> Color32 {
        match status {
            InsightStatus::Normal => Color32::from_rgb(66, 133, 244),
            InsightStatus::Good | InsightStatus::Symmetrical => Color32::from_rgb(76, 175, 80),
            InsightStatus::Stable => Color32::from_rgb(156, 39, 176),
            InsightStatus::Unknown => Color32::GRAY,
        }
    }

    pub fn visuals(&self) -> egui::Visuals {
        let mut visuals = egui::Visuals::dark();

        visuals.panel_fill = self.background;
        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(45, 45, 52);
        visuals.widgets.hovered.bg_fill = Color32::from_rgb(55, 55, 65);
        visuals.widgets.active.bg_fill = self.primary;

        visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
        visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
        visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
        visuals.widgets.active.rounding = egui::Rounding::same(8.0);
        visuals.window_rounding = egui::Rounding::same(12.0);

        visuals
    }
}

/// Displays one video stream as a texture, or a placeholder when the
/// current cycle has no frame.
pub struct VideoWidget {
    name: String,
    texture: Option<egui::TextureHandle>,
    has_frame: bool,
    aspect_ratio: f32,
}

impl VideoWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
            has_frame: false,
            aspect_ratio: 4.0 / 3.0,
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: Option<&Frame>) {
        let Some(frame) = frame else {
            self.has_frame = false;
            return;
        };

        let size = [frame.width() as usize, frame.height() as usize];
        let image = egui::ColorImage::from_rgb(size, frame.as_raw());
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture(&self.name, image, egui::TextureOptions::LINEAR));
            }
        }
        if frame.height() > 0 {
            self.aspect_ratio = frame.width() as f32 / frame.height() as f32;
        }
        self.has_frame = true;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let width = ui.available_width();
        let size = Vec2::new(width, width / self.aspect_ratio);
        let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());

        match self.texture.as_ref().filter(|_| self.has_frame) {
            Some(texture) => {
                ui.painter().image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
            None => {
                ui.painter()
                    .rect_filled(rect, egui::Rounding::same(4.0), Color32::from_rgb(50, 50, 55));
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No Video Signal",
                    egui::FontId::proportional(16.0),
                    Color32::from_rgb(150, 150, 155),
                );
            }
        }
    }
}

/// Full curve as a faint reference, the part up to the cursor on top, and a
/// marker on the latest sample.
pub fn joint_plot(
    ui: &mut egui::Ui,
    theme: &Theme,
    table: &SignalTable,
    history: &[Sample],
    channel: Channel,
    height: f32,
) {
    let (lo, hi) = table.range(channel);
    let reference: Vec<[f64; 2]> = table.series(channel).collect();
    let progress: Vec<[f64; 2]> = history.iter().map(|s| [s.time, channel.value(s)]).collect();

    ui.label(egui::RichText::new(channel.name()).strong());
    Plot::new(channel.name())
        .height(height)
        .include_x(0.0)
        .include_x(table.duration())
        .include_y(lo)
        .include_y(hi)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .x_axis_label("Time (s)")
        .y_axis_label("Angle (°)")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(reference)
                    .color(theme.reference_line)
                    .style(LineStyle::dashed_loose()),
            );
            if let Some(&last) = progress.last() {
                plot_ui.line(Line::new(progress).color(theme.progress_line).width(2.0));
                plot_ui.points(Points::new(vec![last]).radius(4.0).color(theme.marker));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_colors_follow_dashboard_legend() {
        let theme = Theme::default();
        assert_eq!(
            theme.status_color(InsightStatus::Good),
            theme.status_color(InsightStatus::Symmetrical)
        );
        assert_ne!(
            theme.status_color(InsightStatus::Normal),
            theme.status_color(InsightStatus::Stable)
        );
        assert_eq!(theme.status_color(InsightStatus::Unknown), Color32::GRAY);
    }

    #[test]
    fn video_widget_without_frame_shows_placeholder() {
        let ctx = egui::Context::default();
        let mut widget = VideoWidget::new("primary");
        widget.update_frame(&ctx, None);
        assert!(!widget.has_frame);

        let frame = Frame::from_pixel(8, 4, image::Rgb([1, 2, 3]));
        widget.update_frame(&ctx, Some(&frame));
        assert!(widget.has_frame);
        assert_eq!(widget.aspect_ratio, 2.0);

        widget.update_frame(&ctx, None);
        assert!(!widget.has_frame);
        assert!(widget.texture.is_some());
    }
}
