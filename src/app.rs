// src/app.rs
use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::playback::{EndBehavior, PlaybackMode};
use crate::session::{Control, Session, Snapshot};
use crate::signals::{self, Channel};
use crate::ui::{self, Theme, VideoWidget};

const PLOT_HEIGHT: f32 = 160.0;

/// The dashboard window: draws the current session snapshot and turns
/// widget interaction into [`Control`]s for the next cycle.
pub struct GaitDashboardApp {
    session: Session,
    theme: Theme,
    primary_view: VideoWidget,
    overlay_view: VideoWidget,
    repaint_interval: Duration,
    output_directory: PathBuf,
    status_message: Option<String>,
}

impl GaitDashboardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        repaint_interval: Duration,
        output_directory: PathBuf,
    ) -> Self {
        let theme = Theme::default();
        cc.egui_ctx.set_visuals(theme.visuals());

        Self {
            session,
            theme,
            primary_view: VideoWidget::new("primary_video"),
            overlay_view: VideoWidget::new("overlay_video"),
            repaint_interval,
            output_directory,
            status_message: None,
        }
    }

    fn render_controls(
        &self,
        ctx: &egui::Context,
        snapshot: &Snapshot<'_>,
        controls: &mut Vec<Control>,
        export_requested: &mut bool,
    ) {
        let clock = self.session.clock();
        let duration = clock.duration();
        let end_behavior = clock.end_behavior();

        egui::SidePanel::left("controls").min_width(220.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Controls");
            ui.add_space(10.0);

            let play_label = match snapshot.mode {
                PlaybackMode::Paused => "▶ Play",
                PlaybackMode::Running => "⏸ Pause",
            };
            if ui.add_sized([120.0, 32.0], egui::Button::new(play_label)).clicked() {
                controls.push(Control::TogglePlay);
            }
            if ui.add_sized([120.0, 32.0], egui::Button::new("🔄 Reset")).clicked() {
                controls.push(Control::Reset);
            }

            ui.add_space(10.0);
            ui.label("Timeline (seconds)");
            let mut scrub = snapshot.cursor;
            let slider = ui.add(
                egui::Slider::new(&mut scrub, 0.0..=duration)
                    .step_by(0.01)
                    .max_decimals(2),
            );
            if slider.changed() {
                controls.push(Control::Seek(scrub));
            }

            let mut looping = end_behavior == EndBehavior::Loop;
            if ui.checkbox(&mut looping, "Loop playback").changed() {
                let end_behavior = if looping {
                    EndBehavior::Loop
                } else {
                    EndBehavior::Stop
                };
                controls.push(Control::SetEndBehavior(end_behavior));
            }

            ui.separator();

            ui.heading("Export Data");
            if ui.button("Export to CSV").clicked() {
                *export_requested = true;
            }
            if let Some(message) = &self.status_message {
                ui.label(egui::RichText::new(message).color(self.theme.text_secondary));
            }
        });
    }

    fn render_insights(&self, ctx: &egui::Context, snapshot: &Snapshot<'_>) {
        egui::SidePanel::right("insights").min_width(300.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Gait Insights");

            let insight = snapshot.insight;
            ui.group(|ui| {
                ui.label(egui::RichText::new(format!("Phase: {}", insight.title)).strong());
                ui.add_space(4.0);
                ui.label(format!("Finding: {}", insight.finding));
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.label("Status:");
                    ui.colored_label(self.theme.status_color(insight.status), insight.status.to_string());
                });
            });

            ui.separator();
            ui.heading("Current Data Points");
            ui.label(
                egui::RichText::new(format!("t = {:.2} s", snapshot.sample.time))
                    .color(self.theme.text_secondary),
            );

            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto().at_least(180.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Joint");
                    });
                    header.col(|ui| {
                        ui.strong("Angle");
                    });
                })
                .body(|mut body| {
                    for channel in Channel::ALL {
                        body.row(20.0, |mut row| {
                            row.col(|ui| {
                                ui.label(channel.name());
                            });
                            row.col(|ui| {
                                ui.label(format!("{:.1}°", channel.value(snapshot.sample)));
                            });
                        });
                    }
                });
        });
    }

    fn render_main_content(&self, ctx: &egui::Context, snapshot: &Snapshot<'_>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Gait Analysis Dashboard");
                ui.add_space(10.0);

                ui.columns(2, |columns| {
                    columns[0].group(|ui| {
                        ui.heading("Original Video");
                        self.primary_view.show(ui);
                    });
                    columns[1].group(|ui| {
                        ui.heading("3D Motion Overlay");
                        self.overlay_view.show(ui);
                    });
                });

                ui.separator();
                ui.heading("Joint Angle Plots");

                let table = self.session.table();
                for row in Channel::ALL.chunks(3) {
                    ui.columns(3, |columns| {
                        for (column, &channel) in columns.iter_mut().zip(row) {
                            ui::joint_plot(column, &self.theme, table, snapshot.history, channel, PLOT_HEIGHT);
                        }
                    });
                }
            });
        });
    }

    fn export_csv(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_directory(&self.output_directory)
            .set_file_name(signals::default_export_name())
            .add_filter("CSV", &["csv"])
            .save_file();

        let Some(path) = picked else {
            return;
        };

        self.status_message = Some(match signals::export_csv(self.session.table(), &path) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "CSV export failed");
                format!("Export failed: {e}")
            }
        });
    }
}

impl eframe::App for GaitDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut controls = Vec::new();
        let mut export_requested = false;

        {
            let snapshot = self.session.snapshot();

            self.primary_view.update_frame(ctx, snapshot.primary_frame.as_ref());
            self.overlay_view.update_frame(ctx, snapshot.overlay_frame.as_ref());

            self.render_controls(ctx, &snapshot, &mut controls, &mut export_requested);
            self.render_insights(ctx, &snapshot);
            self.render_main_content(ctx, &snapshot);
        }

        if export_requested {
            self.export_csv();
        }

        // Input collected while drawing takes effect before the next cycle.
        let had_input = !controls.is_empty();
        for control in controls {
            self.session.apply(control);
        }

        if self.session.finish_cycle() {
            ctx.request_repaint_after(self.repaint_interval);
        } else if had_input {
            ctx.request_repaint();
        }
    }
}
