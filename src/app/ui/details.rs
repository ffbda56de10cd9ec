use eframe::egui::{self, Context, RichText};

use crate::debate::NodeKind;
use crate::util::{format_date, truncate};

use super::super::{DetailsPanelCache, ViewModel};

const BODY_MAX_CHARS: usize = 900;

impl ViewModel {
    pub(in crate::app) fn show_details_panel(&mut self, ctx: &Context) {
        self.refresh_details_cache();

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Selection");
                ui.add_space(6.0);

                let Some(cache) = &self.details_cache else {
                    ui.label("Click a node or a cluster outline to inspect it.");
                    return;
                };

                let graph = self.engine.graph();
                ui.label(RichText::new(graph.display_title(cache.selected)).strong());
                ui.small(graph.nodes[cache.selected].id.as_str());
                ui.add_space(6.0);

                for (name, value) in &cache.rows {
                    ui.label(format!("{name}: {value}"));
                }

                if !cache.body.is_empty() {
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .id_salt("details_body_scroll")
                        .auto_shrink([false, true])
                        .show(ui, |ui| {
                            ui.label(cache.body.as_str());
                        });
                }
            });
    }

    /// Rows are rebuilt only when the selection moves; a stale cache for
    /// a deselected node is dropped rather than shown.
    fn refresh_details_cache(&mut self) {
        let Some(selected) = self.engine.selected() else {
            self.details_cache = None;
            return;
        };

        if self
            .details_cache
            .as_ref()
            .is_some_and(|cache| cache.selected == selected)
        {
            return;
        }

        let graph = self.engine.graph();
        let node = &graph.nodes[selected];
        let mut rows = Vec::new();

        rows.push(("Kind".to_string(), node.kind.label().to_string()));
        if let Some(author_id) = &node.author_id {
            rows.push((
                "Author".to_string(),
                self.authors.display_name(author_id).to_string(),
            ));
        }
        if let Some(timestamp) = node.timestamp {
            rows.push(("Posted".to_string(), format_date(timestamp)));
        }

        match node.kind {
            NodeKind::Position => {
                let (pro, con) = graph.argument_balance(selected);
                rows.push((
                    "Arguments".to_string(),
                    format!("{pro} in favor, {con} against"),
                ));
            }
            NodeKind::Cluster => {
                let members = graph.members_of(selected);
                let (pro, con) = graph.cluster_balance(selected);
                rows.push(("Members".to_string(), members.len().to_string()));
                rows.push((
                    "Balance".to_string(),
                    format!("{pro} in favor, {con} against"),
                ));
            }
            NodeKind::Entity => {
                rows.push(("Mentions".to_string(), node.degree.to_string()));
            }
            _ => {}
        }

        let body = if !node.summary.is_empty() {
            truncate(&node.summary, BODY_MAX_CHARS)
        } else {
            truncate(&node.text, BODY_MAX_CHARS)
        };

        self.details_cache = Some(DetailsPanelCache {
            selected,
            rows,
            body,
        });
    }
}
