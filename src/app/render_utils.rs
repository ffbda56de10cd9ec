use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::debate::NodeKind;

pub(super) fn node_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Subject => Color32::from_rgb(63, 136, 197),
        NodeKind::Position => Color32::from_rgb(244, 157, 55),
        NodeKind::InFavor => Color32::from_rgb(0, 204, 102),
        NodeKind::Against => Color32::from_rgb(219, 58, 52),
        NodeKind::Entity => Color32::from_rgb(50, 19, 37),
        NodeKind::Cluster => Color32::from_rgb(127, 127, 127),
    }
}

/// (fill, stroke) palette for a cluster hull, tinted toward whichever
/// side holds the majority of its arguments.
pub(super) fn cluster_palette(pro: usize, con: usize) -> (Color32, Color32) {
    if pro > con {
        (
            Color32::from_rgb(200, 247, 216),
            Color32::from_rgb(110, 231, 183),
        )
    } else if con > pro {
        (
            Color32::from_rgb(254, 202, 202),
            Color32::from_rgb(251, 113, 133),
        )
    } else {
        (
            Color32::from_rgb(208, 224, 245),
            Color32::from_rgb(123, 145, 179),
        )
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
