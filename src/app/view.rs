use eframe::egui::{
    self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, epaint::PathShape, vec2,
};

use crate::debate::{NodeKind, RelationKind};
use crate::engine::OPEN_LABEL_MAX_CHARS;
use crate::util::truncate;

use super::ViewModel;
use super::render_utils::{
    circle_visible, cluster_palette, draw_background, node_color, screen_to_world, with_opacity,
    world_to_screen,
};

const NODE_LABEL_MAX_CHARS: usize = 42;
const HULL_LABEL_MAX_CHARS: usize = 60;

enum CanvasClick {
    Node(usize),
    Cluster(usize),
    Background,
}

fn point_in_convex_polygon(polygon: &[Pos2], point: Pos2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    polygon.iter().enumerate().all(|(index, &start)| {
        let end = polygon[(index + 1) % polygon.len()];
        let edge = end - start;
        let offset = point - start;
        edge.x * offset.y - edge.y * offset.x >= -1e-3
    })
}

fn entity_diamond(center: Pos2, radius: f32) -> Vec<Pos2> {
    let reach = radius * 1.4;
    vec![
        center + vec2(0.0, -reach),
        center + vec2(reach, 0.0),
        center + vec2(0.0, reach),
        center + vec2(-reach, 0.0),
    ]
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        let node_dragging = self.dragging.is_some();
        if !node_dragging {
            self.handle_graph_pan(&response);
        }

        let layout_moving = self.engine.tick();
        if layout_moving || response.dragged() {
            ui.ctx().request_repaint();
        }

        let pan = self.pan;
        let zoom = self.zoom;

        let visible = self.engine.visible_nodes().to_vec();
        let screen_positions: Vec<Pos2> = visible
            .iter()
            .map(|&index| world_to_screen(rect, pan, zoom, self.engine.node_position(index)))
            .collect();
        let screen_radii: Vec<f32> = visible
            .iter()
            .map(|&index| (self.engine.node_radius(index) * zoom).max(1.5))
            .collect();

        let hovered = Self::hovered_slot(ui, &visible, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        self.handle_node_drag(rect, &response, hovered);

        // Hulls first, so nodes and edges draw over them.
        let hull_polygons = self.draw_hulls(&painter, rect);
        self.draw_edges(&painter, rect);
        self.draw_nodes(&painter, &visible, &screen_positions, &screen_radii, hovered);

        if response.double_clicked_by(egui::PointerButton::Primary)
            && let Some((index, _)) = hovered
        {
            if self.engine.is_pinned(index) {
                self.engine.unpin_node(index);
            } else {
                let position = self.engine.node_position(index);
                self.engine.pin_node(index, position);
            }
        }

        if let Some(click) = self.resolve_click(&response, hovered, &hull_polygons) {
            match click {
                CanvasClick::Node(index) => self.engine.click_node(index),
                CanvasClick::Cluster(cluster) => self.engine.click_cluster(cluster),
                CanvasClick::Background => {
                    self.engine.click_background();
                    self.search.clear();
                }
            }
        }
    }

    fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<(usize, f32)>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some((index, _)) = hovered
        {
            self.dragging = Some(index);
            self.engine.begin_drag(index);
        }

        if let Some(index) = self.dragging {
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pointer) = response.interact_pointer_pos() {
                    let world = screen_to_world(rect, self.pan, self.zoom, pointer);
                    self.engine.drag_to(index, world);
                }
            } else if response.drag_stopped() || !response.dragged() {
                self.engine.end_drag(index);
                self.dragging = None;
            }
        }
    }

    fn hovered_slot(
        ui: &Ui,
        visible: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible
            .iter()
            .zip(screen_positions.iter().zip(screen_radii.iter()))
            .filter_map(|(&index, (&position, &radius))| {
                let distance = position.distance(pointer);
                if distance <= radius.max(4.0) {
                    Some((index, distance))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn resolve_click(
        &self,
        response: &egui::Response,
        hovered: Option<(usize, f32)>,
        hull_polygons: &[(usize, Vec<Pos2>)],
    ) -> Option<CanvasClick> {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return None;
        }

        if let Some((index, _)) = hovered {
            return Some(CanvasClick::Node(index));
        }

        if let Some(pointer) = response.interact_pointer_pos() {
            for (cluster, polygon) in hull_polygons {
                if point_in_convex_polygon(polygon, pointer) {
                    return Some(CanvasClick::Cluster(*cluster));
                }
            }
        }

        Some(CanvasClick::Background)
    }

    /// Fills and strokes each cluster hull, then places its tagline on
    /// the top edge of the outline. Returns the screen-space polygons
    /// for hit testing.
    fn draw_hulls(&self, painter: &egui::Painter, rect: Rect) -> Vec<(usize, Vec<Pos2>)> {
        let graph = self.engine.graph();
        let projection = self.engine.projection();
        let mut polygons = Vec::with_capacity(self.engine.hulls().len());

        for (cluster, hull) in self.engine.hulls() {
            let polygon: Vec<Pos2> = hull
                .iter()
                .map(|&point| world_to_screen(rect, self.pan, self.zoom, point))
                .collect();
            if polygon.len() < 3 {
                continue;
            }

            let (pro, con) = graph.cluster_balance(*cluster);
            let (fill, stroke) = cluster_palette(pro, con);
            let (fill_opacity, stroke_opacity) = projection.hull_opacity(*cluster);

            painter.add(PathShape {
                points: polygon.clone(),
                closed: true,
                fill: with_opacity(fill, fill_opacity),
                stroke: Stroke::new(1.5, with_opacity(stroke, stroke_opacity)).into(),
            });

            let center = self.engine.node_position(*cluster);
            let above = center - vec2(0.0, 1.0e5);
            let label_world = self.engine.hull_anchor_point(*cluster, above);
            let label_pos = world_to_screen(rect, self.pan, self.zoom, label_world);
            painter.text(
                label_pos + vec2(0.0, -6.0),
                Align2::CENTER_BOTTOM,
                truncate(graph.display_title(*cluster), HULL_LABEL_MAX_CHARS),
                FontId::proportional(12.0),
                with_opacity(Color32::from_gray(225), projection.label_opacity(*cluster)),
            );

            polygons.push((*cluster, polygon));
        }

        polygons
    }

    fn draw_edges(&self, painter: &egui::Painter, rect: Rect) {
        let graph = self.engine.graph();
        let projection = self.engine.projection();
        let zoom_sqrt = self.zoom.sqrt();

        for edge in self.engine.render_edges() {
            let start = world_to_screen(
                rect,
                self.pan,
                self.zoom,
                self.engine.node_position(edge.source),
            );
            let end = world_to_screen(
                rect,
                self.pan,
                self.zoom,
                self.engine.node_position(edge.target),
            );

            let opacity = projection.edge_opacity(graph, edge.source, edge.target);
            let width = match edge.relation {
                RelationKind::Mention => (0.8 * zoom_sqrt).clamp(0.4, 1.6),
                _ => (1.4 * zoom_sqrt).clamp(0.6, 3.0),
            };
            painter.line_segment(
                [start, end],
                Stroke::new(width, with_opacity(Color32::from_gray(153), opacity)),
            );
        }
    }

    fn draw_nodes(
        &self,
        painter: &egui::Painter,
        visible: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        hovered: Option<(usize, f32)>,
    ) {
        let graph = self.engine.graph();
        let projection = self.engine.projection();
        let rect = painter.clip_rect();
        let hovered_index = hovered.map(|(index, _)| index);

        // Big shapes first so small ones stay clickable on top.
        let mut draw_order: Vec<usize> = (0..visible.len()).collect();
        draw_order.sort_by(|a, b| screen_radii[*b].total_cmp(&screen_radii[*a]));

        for slot in draw_order {
            let index = visible[slot];
            let kind = graph.kind(index);
            if kind == NodeKind::Cluster {
                continue;
            }

            let position = screen_positions[slot];
            let radius = screen_radii[slot];
            if !circle_visible(rect, position, radius + 4.0) {
                continue;
            }

            let (fill_opacity, stroke_opacity) = projection.node_opacity(index);
            let color = with_opacity(node_color(kind), fill_opacity);
            let outline = Stroke::new(
                1.0,
                with_opacity(
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                    stroke_opacity,
                ),
            );

            if kind == NodeKind::Entity && self.engine.is_entity_open(index) {
                // Open keywords render as their text instead of a shape.
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    truncate(graph.display_title(index), OPEN_LABEL_MAX_CHARS),
                    FontId::proportional(11.0),
                    with_opacity(Color32::from_gray(235), fill_opacity),
                );
                continue;
            }

            if kind == NodeKind::Entity {
                painter.add(PathShape {
                    points: entity_diamond(position, radius),
                    closed: true,
                    fill: color,
                    stroke: outline.into(),
                });
            } else {
                painter.circle_filled(position, radius, color);
                painter.circle_stroke(position, radius, outline);
            }

            if self.engine.selected() == Some(index) {
                painter.circle_stroke(
                    position,
                    radius + 6.0,
                    Stroke::new(2.0, Color32::from_rgb(245, 206, 93)),
                );
            }
            if self.engine.is_pinned(index) {
                painter.circle_filled(position, 2.0, Color32::from_gray(235));
            }

            let label_opacity = projection.label_opacity(index);
            let emphasized = projection.is_active() && projection.node_matches(index);
            let should_draw_label = self.engine.selected() == Some(index)
                || hovered_index == Some(index)
                || emphasized
                || radius > 17.0
                || self.zoom > 1.35;
            if should_draw_label && kind != NodeKind::Entity {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate(graph.display_title(index), NODE_LABEL_MAX_CHARS),
                    FontId::proportional(12.0),
                    with_opacity(Color32::from_gray(238), label_opacity),
                );
            }
        }
    }
}
