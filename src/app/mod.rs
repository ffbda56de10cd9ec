use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::debate::{AuthorDirectory, DebateData, TutorialStep, load_debate, playback_duration_ms};
use crate::engine::DebateEngine;

mod render_utils;
mod ui;
mod view;

const PLAYBACK_STEP_SECS: f64 = 0.05;

pub struct DebateApp {
    data_dir: String,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<DebateData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: DebateEngine,
    authors: AuthorDirectory,
    tutorial: Vec<TutorialStep>,
    tutorial_step: Option<usize>,
    search: String,
    playback_accumulator_secs: f64,
    playback_last_secs: Option<f64>,
    pan: Vec2,
    zoom: f32,
    dragging: Option<usize>,
    details_cache: Option<DetailsPanelCache>,
}

/// Detail rows captured for one selected node. The cache key is the
/// selection itself: rows computed for a node the user has since moved
/// away from are discarded, never shown.
struct DetailsPanelCache {
    selected: usize,
    rows: Vec<(String, String)>,
    body: String,
}

impl ViewModel {
    fn new(data: DebateData) -> Self {
        Self {
            engine: DebateEngine::new(data.graph),
            authors: data.authors,
            tutorial: data.tutorial,
            tutorial_step: None,
            search: String::new(),
            playback_accumulator_secs: 0.0,
            playback_last_secs: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            dragging: None,
            details_cache: None,
        }
    }

    fn show(&mut self, ctx: &Context) {
        self.advance_playback(ctx);

        self.show_top_bar(ctx);
        self.show_timeline_bar(ctx);
        self.show_details_panel(ctx);
        if self.tutorial_step.is_some() {
            self.show_tutorial_sidebar(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_graph(ui);
        });
    }

    /// Fixed-interval playback: every 50 ms of wall clock advances the
    /// timeline cursor by a step sized so the whole domain takes the
    /// clamped duration.
    fn advance_playback(&mut self, ctx: &Context) {
        if !self.engine.is_playing() {
            self.playback_last_secs = None;
            return;
        }

        let now = ctx.input(|input| input.time);
        let elapsed = self
            .playback_last_secs
            .map(|last| now - last)
            .unwrap_or(0.0);
        self.playback_last_secs = Some(now);
        self.playback_accumulator_secs += elapsed;

        let (min_ts, max_ts) = self.engine.time_domain();
        let span = (max_ts - min_ts) as f64;
        if span <= 0.0 {
            self.set_playing(false);
            return;
        }

        let duration_secs = playback_duration_ms((min_ts, max_ts)) / 1000.0;
        let step = span * PLAYBACK_STEP_SECS / duration_secs;

        let mut time = self.engine.current_time();
        while self.playback_accumulator_secs >= PLAYBACK_STEP_SECS {
            self.playback_accumulator_secs -= PLAYBACK_STEP_SECS;
            time += step.max(1.0) as i64;
        }

        if time >= max_ts {
            time = max_ts;
            self.set_playing(false);
        }
        self.engine.set_current_time(time);

        ctx.request_repaint();
    }

    fn set_playing(&mut self, playing: bool) {
        self.playback_last_secs = None;
        self.playback_accumulator_secs = 0.0;
        self.engine.set_playing(playing);
    }
}

impl DebateApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, data_dir: String) -> Self {
        let state = Self::start_load(data_dir.clone());
        Self { data_dir, state }
    }

    fn start_load(data_dir: String) -> AppState {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_debate(&data_dir).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }
}

impl eframe::App for DebateApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(data) => AppState::Ready(Box::new(ViewModel::new(data))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading debate graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load debate data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.data_dir.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx);
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
