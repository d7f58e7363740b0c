use eframe::egui;

use crate::annotation::AnnotationSet;

pub const HANDLE_HALF_SIZE: f32 = 6.0;
pub const LABEL_FONT_SIZE: f32 = 18.0;

const SELECTED_COLOR: egui::Color32 = egui::Color32::BLUE;
const DEFAULT_COLOR: egui::Color32 = egui::Color32::RED;
const LABEL_COLOR: egui::Color32 = egui::Color32::RED;

/// One drawing step, in image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Outline {
        rect: egui::Rect,
        stroke: egui::Stroke,
    },
    /// `anchor` is the bottom-left of the text.
    Label {
        anchor: egui::Pos2,
        text: String,
        color: egui::Color32,
    },
    Handle {
        rect: egui::Rect,
        color: egui::Color32,
    },
}

/// Lays out every box in storage order, so later boxes end up on top.
pub fn plan(set: &AnnotationSet, selected: Option<usize>) -> Vec<Primitive> {
    let mut out = Vec::with_capacity(set.len() * 2 + 2);

    for (i, (b, label)) in set.iter().enumerate() {
        let is_selected = selected == Some(i);
        let stroke = if is_selected {
            egui::Stroke::new(3.0, SELECTED_COLOR)
        } else {
            egui::Stroke::new(2.0, DEFAULT_COLOR)
        };
        out.push(Primitive::Outline {
            rect: b.to_rect(),
            stroke,
        });

        // Above the box when there is room, otherwise just inside it.
        let label_y = if b.y1 > 20.0 { b.y1 - 5.0 } else { b.y1 + 20.0 };
        out.push(Primitive::Label {
            anchor: egui::pos2(b.x1, label_y),
            text: label.to_owned(),
            color: LABEL_COLOR,
        });

        if is_selected {
            for corner in [b.top_left(), b.bottom_right()] {
                out.push(Primitive::Handle {
                    rect: egui::Rect::from_center_size(
                        corner,
                        egui::Vec2::splat(HANDLE_HALF_SIZE * 2.0),
                    ),
                    color: SELECTED_COLOR,
                });
            }
        }
    }
    out
}

/// Clears the canvas and draws the image plus `primitives` on top.
///
/// `canvas` is the screen rect of the image; one image pixel maps to one point.
pub fn paint(
    painter: &egui::Painter,
    canvas: egui::Rect,
    texture: Option<&egui::TextureHandle>,
    primitives: &[Primitive],
) {
    painter.rect_filled(canvas, 0.0, egui::Color32::from_gray(40));

    if let Some(tex) = texture {
        painter.image(
            tex.id(),
            canvas,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    let offset = canvas.min.to_vec2();
    for p in primitives {
        match p {
            Primitive::Outline { rect, stroke } => {
                painter.rect_stroke(
                    rect.translate(offset),
                    0.0,
                    *stroke,
                    egui::StrokeKind::Middle,
                );
            }
            Primitive::Label {
                anchor,
                text,
                color,
            } => {
                painter.text(
                    *anchor + offset,
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(LABEL_FONT_SIZE),
                    *color,
                );
            }
            Primitive::Handle { rect, color } => {
                painter.rect_filled(rect.translate(offset), 0.0, *color);
            }
        }
    }
}
