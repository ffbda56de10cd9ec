use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::engine::{Highlight, MAX_DEPTH_LEVEL, SuggestedView};
use crate::util::format_date;

use super::super::ViewModel;

const DEPTH_LABELS: [&str; 4] = ["Subject", "Positions", "Arguments", "Everything"];
const VIEW_CHOICES: [(SuggestedView, &str); 3] = [
    (SuggestedView::Contested, "Most contested"),
    (SuggestedView::LoneVoices, "Lone voices"),
    (SuggestedView::SharedIdeas, "Shared ideas"),
];

impl ViewModel {
    pub(in crate::app) fn show_top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("agora");
                    ui.separator();

                    ui.label("Depth:");
                    for level in 0..=MAX_DEPTH_LEVEL {
                        let active = self.engine.depth_level() == level;
                        if ui
                            .selectable_label(active, DEPTH_LABELS[level as usize])
                            .clicked()
                            && !active
                        {
                            self.engine.set_depth_level(level);
                        }
                    }
                    ui.separator();

                    let search_response = ui.add(
                        egui::TextEdit::singleline(&mut self.search)
                            .hint_text("Search the debate")
                            .desired_width(180.0),
                    );
                    if search_response.changed() {
                        if self.search.trim().is_empty() {
                            self.engine.set_highlight(None);
                        } else {
                            self.engine
                                .set_highlight(Some(Highlight::Search(self.search.clone())));
                        }
                    }
                    ui.separator();

                    for (view, label) in VIEW_CHOICES {
                        let active = matches!(
                            self.engine.active_highlight(),
                            Some(Highlight::View(current)) if *current == view
                        );
                        if ui.selectable_label(active, label).clicked() {
                            if active {
                                self.engine.set_highlight(None);
                            } else {
                                self.search.clear();
                                self.engine.set_highlight(Some(Highlight::View(view)));
                            }
                        }
                    }
                    ui.separator();

                    if ui.button("Recenter").clicked() {
                        self.pan = Vec2::ZERO;
                        self.zoom = 1.0;
                        self.engine.set_center(Vec2::ZERO);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if !self.tutorial.is_empty()
                            && self.tutorial_step.is_none()
                            && ui.button("Tutorial").clicked()
                        {
                            self.start_tutorial();
                        }
                        ui.label(format!("nodes: {}", self.engine.graph().node_count()));
                    });
                });
            });
    }

    pub(in crate::app) fn show_timeline_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::bottom("timeline_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (min_ts, max_ts) = self.engine.time_domain();
                    if max_ts <= min_ts {
                        ui.label("All contributions share a single moment.");
                        return;
                    }

                    let playing = self.engine.is_playing();
                    let play_label = if playing { "Pause" } else { "Play" };
                    if ui.button(play_label).clicked() {
                        if !playing && self.engine.current_time() >= max_ts {
                            // Replay from the start once the cursor sits at the end.
                            self.engine.set_current_time(min_ts);
                        }
                        self.set_playing(!playing);
                    }

                    let mut time = self.engine.current_time();
                    let slider = ui.add(
                        egui::Slider::new(&mut time, min_ts..=max_ts)
                            .show_value(false)
                            .trailing_fill(true),
                    );
                    if slider.changed() {
                        self.set_playing(false);
                        self.engine.set_current_time(time);
                    }

                    ui.label(format_date(self.engine.current_time()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "{} to {}",
                            format_date(min_ts),
                            format_date(max_ts)
                        ));
                    });
                });
            });
    }
}
