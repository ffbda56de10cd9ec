use eframe::egui::{self, Context, RichText};

use crate::engine::{Highlight, MAX_DEPTH_LEVEL, TutorialFocus};

use super::super::ViewModel;

/// Disclosure depth shown at each tutorial step: the walkthrough opens
/// on the full graph, collapses to the subject, then widens tier by
/// tier.
fn step_depth(step: usize) -> u8 {
    match step {
        0 => 3,
        1 => 0,
        2 => 1,
        3 | 4 => 2,
        _ => MAX_DEPTH_LEVEL,
    }
}

impl ViewModel {
    pub(in crate::app) fn start_tutorial(&mut self) {
        if self.tutorial.is_empty() {
            return;
        }
        self.tutorial_step = Some(0);
        self.apply_tutorial_step(0);
    }

    fn apply_tutorial_step(&mut self, step: usize) {
        self.search.clear();
        self.engine.set_depth_level(step_depth(step));

        let focus = self
            .tutorial
            .get(step)
            .map(|entry| TutorialFocus::parse(&entry.focus_type))
            .unwrap_or(TutorialFocus::All);
        self.engine.set_highlight(Some(Highlight::Focus(focus)));
    }

    fn finish_tutorial(&mut self) {
        self.tutorial_step = None;
        self.engine.set_highlight(None);
        self.engine.set_depth_level(MAX_DEPTH_LEVEL);
    }

    pub(in crate::app) fn show_tutorial_sidebar(&mut self, ctx: &Context) {
        let Some(step) = self.tutorial_step else {
            return;
        };
        let total = self.tutorial.len();

        let mut next_step = Some(step);
        egui::SidePanel::left("tutorial")
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.label(format!("Step {} of {}", step + 1, total));
                ui.add_space(4.0);
                if let Some(entry) = self.tutorial.get(step) {
                    ui.label(RichText::new(entry.title.as_str()).heading());
                    ui.add_space(8.0);
                    ui.label(entry.text.as_str());
                }
                ui.add_space(12.0);

                ui.horizontal(|ui| {
                    if step > 0 && ui.button("Back").clicked() {
                        next_step = Some(step - 1);
                    }
                    if step + 1 < total {
                        if ui.button("Next").clicked() {
                            next_step = Some(step + 1);
                        }
                    } else if ui.button("Finish").clicked() {
                        next_step = None;
                    }
                    if ui.button("Skip").clicked() {
                        next_step = None;
                    }
                });
            });

        match next_step {
            None => self.finish_tutorial(),
            Some(new_step) if new_step != step => {
                self.tutorial_step = Some(new_step);
                self.apply_tutorial_step(new_step);
            }
            Some(_) => {}
        }
    }
}
