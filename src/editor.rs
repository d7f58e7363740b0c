use eframe::egui;

use crate::annotation::{AnnotationSet, BoundingBox, Corner};

/// How close, per axis, the pointer must be to a corner to grab it.
pub const HANDLE_TOLERANCE: f32 = 6.0;

// ── Tool / Interaction State ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Moving,
    Resizing(Corner),
}

/// Returns the resizable corner of `b` under `p`, checking top-left first.
pub fn corner_near(p: egui::Pos2, b: &BoundingBox) -> Option<Corner> {
    let near = |c: egui::Pos2| {
        (p.x - c.x).abs() <= HANDLE_TOLERANCE && (p.y - c.y).abs() <= HANDLE_TOLERANCE
    };
    if near(b.top_left()) {
        Some(Corner::TopLeft)
    } else if near(b.bottom_right()) {
        Some(Corner::BottomRight)
    } else {
        None
    }
}

/// Selection, drag and resize over the boxes of one image.
///
/// Every mutation of the boxes or the selection bumps [`BoxEditor::revision`]
/// so the view knows a redraw is due.
#[derive(Debug)]
pub struct BoxEditor {
    annotations: Option<AnnotationSet>,
    selected: Option<usize>,
    drag: DragState,
    last_pointer: egui::Pos2,
    revision: u64,
}

impl Default for BoxEditor {
    fn default() -> Self {
        Self {
            annotations: None,
            selected: None,
            drag: DragState::Idle,
            last_pointer: egui::Pos2::ZERO,
            revision: 0,
        }
    }
}

impl BoxEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotations(&self) -> Option<&AnnotationSet> {
        self.annotations.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_interacting(&self) -> bool {
        self.drag != DragState::Idle
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swaps in a whole new set of boxes (or none) and drops the selection.
    pub fn replace(&mut self, annotations: Option<AnnotationSet>) {
        self.annotations = annotations;
        self.selected = None;
        self.drag = DragState::Idle;
        self.touch();
    }

    pub fn pointer_down(&mut self, pos: egui::Pos2) {
        let Some(set) = self.annotations.as_ref() else {
            return;
        };

        if let Some(corner) = self
            .selected
            .and_then(|i| set.boxes().get(i))
            .and_then(|b| corner_near(pos, b))
        {
            log::debug!("resize {:?} of box {:?}", corner, self.selected);
            self.drag = DragState::Resizing(corner);
            self.last_pointer = pos;
            return;
        }

        // Later boxes are drawn on top, so the last hit wins.
        if let Some(index) = set.boxes().iter().rposition(|b| b.contains(pos)) {
            log::debug!("select box {index}");
            if self.selected != Some(index) {
                self.selected = Some(index);
                self.touch();
            }
            self.drag = DragState::Moving;
            self.last_pointer = pos;
        }
    }

    pub fn pointer_move(&mut self, pos: egui::Pos2) {
        let delta = pos - self.last_pointer;
        self.last_pointer = pos;

        if delta == egui::Vec2::ZERO {
            return;
        }
        let Some(index) = self.selected else {
            return;
        };
        let Some(b) = self.annotations.as_mut().and_then(|s| s.box_mut(index)) else {
            return;
        };
        match self.drag {
            DragState::Idle => return,
            DragState::Moving => b.translate(delta),
            DragState::Resizing(corner) => b.move_corner(corner, delta),
        }
        self.touch();
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Removes the selected box and its label. Does nothing without a selection.
    pub fn delete_selected(&mut self) -> Option<(BoundingBox, String)> {
        let index = self.selected?;
        let removed = self.annotations.as_mut()?.remove(index);
        self.selected = None;
        self.drag = DragState::Idle;
        self.touch();
        if let Some((_, label)) = &removed {
            log::debug!("deleted box {index} ({label})");
        }
        removed
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn editor_with(boxes: &[[f32; 4]]) -> BoxEditor {
        let labels = (0..boxes.len()).map(|i| format!("obj{i}")).collect();
        let set = AnnotationSet::new(boxes.iter().map(|&b| b.into()).collect(), labels).unwrap();
        let mut ed = BoxEditor::new();
        ed.replace(Some(set));
        ed
    }

    fn box_at(ed: &BoxEditor, i: usize) -> BoundingBox {
        ed.annotations().unwrap().boxes()[i]
    }

    #[test]
    fn corner_near_checks_top_left_first() {
        let b = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(corner_near(pos2(16.0, 4.0), &b), Some(Corner::TopLeft));
        assert_eq!(corner_near(pos2(44.0, 56.0), &b), Some(Corner::BottomRight));
        assert_eq!(corner_near(pos2(16.1, 10.0), &b), None);
        assert_eq!(corner_near(pos2(50.0, 10.0), &b), None);

        let tiny = BoundingBox::new(10.0, 10.0, 12.0, 12.0);
        assert_eq!(corner_near(pos2(11.0, 11.0), &tiny), Some(Corner::TopLeft));
    }

    #[test]
    fn press_inside_selects_and_starts_moving() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0], [100.0, 100.0, 150.0, 150.0]]);
        ed.pointer_down(pos2(120.0, 120.0));
        assert_eq!(ed.selected(), Some(1));
        assert_eq!(ed.drag_state(), DragState::Moving);
    }

    #[test]
    fn overlap_picks_last_in_storage_order() {
        let mut ed = editor_with(&[[0.0, 0.0, 100.0, 100.0], [50.0, 50.0, 150.0, 150.0]]);
        ed.pointer_down(pos2(75.0, 75.0));
        assert_eq!(ed.selected(), Some(1));
    }

    #[test]
    fn press_on_nothing_keeps_state() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_up();
        let rev = ed.revision();

        ed.pointer_down(pos2(200.0, 200.0));
        assert_eq!(ed.selected(), Some(0));
        assert_eq!(ed.drag_state(), DragState::Idle);
        assert_eq!(ed.revision(), rev);
    }

    #[test]
    fn drag_translates_both_corners() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_move(pos2(33.0, 28.0));
        ed.pointer_move(pos2(35.0, 30.0));
        ed.pointer_up();

        assert_eq!(box_at(&ed, 0), BoundingBox::new(15.0, 10.0, 55.0, 50.0));
        assert_eq!(ed.drag_state(), DragState::Idle);
    }

    #[test]
    fn resize_top_left_leaves_bottom_right() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_up();

        ed.pointer_down(pos2(12.0, 8.0));
        assert_eq!(ed.drag_state(), DragState::Resizing(Corner::TopLeft));
        ed.pointer_move(pos2(2.0, 3.0));
        ed.pointer_up();

        assert_eq!(box_at(&ed, 0), BoundingBox::new(0.0, 5.0, 50.0, 50.0));
    }

    #[test]
    fn resize_can_invert_without_reordering() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_up();

        ed.pointer_down(pos2(50.0, 50.0));
        assert_eq!(ed.drag_state(), DragState::Resizing(Corner::BottomRight));
        ed.pointer_move(pos2(0.0, 20.0));

        let b = box_at(&ed, 0);
        assert_eq!((b.x1, b.y1), (10.0, 10.0));
        assert_eq!((b.x2, b.y2), (0.0, 20.0));
    }

    #[test]
    fn corner_beats_hit_test() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0], [40.0, 40.0, 80.0, 80.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_up();
        assert_eq!(ed.selected(), Some(0));

        // Inside box 1, which would win the hit test, but on box 0's handle.
        ed.pointer_down(pos2(48.0, 48.0));
        assert_eq!(ed.selected(), Some(0));
        assert_eq!(ed.drag_state(), DragState::Resizing(Corner::BottomRight));

        ed.pointer_move(pos2(52.0, 50.0));
        assert_eq!(box_at(&ed, 0), BoundingBox::new(10.0, 10.0, 54.0, 52.0));
        assert_eq!(box_at(&ed, 1), BoundingBox::new(40.0, 40.0, 80.0, 80.0));
    }

    #[test]
    fn corner_only_counts_for_selected_box() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0], [60.0, 60.0, 90.0, 90.0]]);
        ed.pointer_down(pos2(70.0, 70.0));
        ed.pointer_up();

        // Near box 0's top-left but box 1 is selected and not near.
        ed.pointer_down(pos2(11.0, 11.0));
        assert_eq!(ed.selected(), Some(0));
        assert_eq!(ed.drag_state(), DragState::Moving);
    }

    #[test]
    fn move_while_idle_only_tracks_pointer() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        ed.pointer_up();
        ed.pointer_move(pos2(80.0, 80.0));
        assert_eq!(box_at(&ed, 0), BoundingBox::new(10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn delete_selected_shrinks_both_sequences() {
        let mut ed = editor_with(&[
            [0.0, 0.0, 10.0, 10.0],
            [20.0, 20.0, 30.0, 30.0],
            [40.0, 40.0, 50.0, 50.0],
        ]);
        ed.pointer_down(pos2(25.0, 25.0));
        ed.pointer_up();

        let (_, label) = ed.delete_selected().unwrap();
        assert_eq!(label, "obj1");
        let set = ed.annotations().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.labels().len(), 2);
        assert_eq!(set.get(1).map(|(b, l)| (b.x1, l)), Some((40.0, "obj2")));
        assert_eq!(ed.selected(), None);
        assert!(ed.delete_selected().is_none());
    }

    #[test]
    fn replace_clears_selection_and_bumps_revision() {
        let mut ed = editor_with(&[[10.0, 10.0, 50.0, 50.0]]);
        ed.pointer_down(pos2(30.0, 30.0));
        let rev = ed.revision();
        ed.replace(None);
        assert_eq!(ed.selected(), None);
        assert_eq!(ed.drag_state(), DragState::Idle);
        assert!(ed.revision() > rev);

        ed.pointer_down(pos2(30.0, 30.0));
        assert_eq!(ed.selected(), None);
    }
}
