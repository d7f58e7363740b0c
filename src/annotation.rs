use eframe::egui;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Data Model ──────────────────────────────────────────────────────────────

/// Axis-aligned box in image pixel coordinates.
///
/// The two corners are stored as given; nothing keeps `x1 <= x2` or
/// `y1 <= y2` once a corner has been dragged past its opposite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One of the two resizable corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    BottomRight,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn top_left(&self) -> egui::Pos2 {
        egui::pos2(self.x1, self.y1)
    }

    pub fn bottom_right(&self) -> egui::Pos2 {
        egui::pos2(self.x2, self.y2)
    }

    pub fn corner(&self, corner: Corner) -> egui::Pos2 {
        match corner {
            Corner::TopLeft => self.top_left(),
            Corner::BottomRight => self.bottom_right(),
        }
    }

    /// Strict interior test: points on an edge are outside, and an inverted
    /// box contains nothing.
    pub fn contains(&self, p: egui::Pos2) -> bool {
        p.x > self.x1 && p.x < self.x2 && p.y > self.y1 && p.y < self.y2
    }

    pub fn translate(&mut self, delta: egui::Vec2) {
        self.x1 += delta.x;
        self.y1 += delta.y;
        self.x2 += delta.x;
        self.y2 += delta.y;
    }

    /// Moves one corner, leaving the opposite one untouched.
    pub fn move_corner(&mut self, corner: Corner, delta: egui::Vec2) {
        match corner {
            Corner::TopLeft => {
                self.x1 += delta.x;
                self.y1 += delta.y;
            }
            Corner::BottomRight => {
                self.x2 += delta.x;
                self.y2 += delta.y;
            }
        }
    }

    /// Screen rectangle regardless of corner order.
    pub fn to_rect(&self) -> egui::Rect {
        egui::Rect::from_two_pos(self.top_left(), self.bottom_right())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("prediction has {boxes} boxes but {labels} labels")]
pub struct LengthMismatch {
    pub boxes: usize,
    pub labels: usize,
}

/// Boxes and their labels, paired by index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationSet {
    boxes: Vec<BoundingBox>,
    labels: Vec<String>,
}

impl AnnotationSet {
    pub fn new(boxes: Vec<BoundingBox>, labels: Vec<String>) -> Result<Self, LengthMismatch> {
        if boxes.len() != labels.len() {
            return Err(LengthMismatch {
                boxes: boxes.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { boxes, labels })
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<(&BoundingBox, &str)> {
        let b = self.boxes.get(index)?;
        let l = self.labels.get(index)?;
        Some((b, l.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BoundingBox, &str)> {
        self.boxes
            .iter()
            .zip(self.labels.iter().map(String::as_str))
    }

    pub(crate) fn box_mut(&mut self, index: usize) -> Option<&mut BoundingBox> {
        self.boxes.get_mut(index)
    }

    /// Removes the box and its label together.
    pub(crate) fn remove(&mut self, index: usize) -> Option<(BoundingBox, String)> {
        if index >= self.boxes.len() {
            return None;
        }
        Some((self.boxes.remove(index), self.labels.remove(index)))
    }
}

// ── Service response ────────────────────────────────────────────────────────

/// Body returned by the detection service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<String>,
    #[serde(default)]
    pub image_id: Option<String>,
}

impl Prediction {
    pub fn into_annotations(self) -> Result<(AnnotationSet, Option<String>), LengthMismatch> {
        let set = AnnotationSet::new(self.boxes, self.labels)?;
        Ok((set, self.image_id))
    }
}
