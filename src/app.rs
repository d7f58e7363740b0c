use eframe::egui;

use crate::editor::BoxEditor;
use crate::render;
use crate::session::Session;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

// ── App ─────────────────────────────────────────────────────────────────────

pub struct BoxAnnotateApp {
    session: Session,
    texture: Option<egui::TextureHandle>,
    texture_serial: u64,
    last_revision: u64,
}

impl BoxAnnotateApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            texture: None,
            texture_serial: 0,
            last_revision: 0,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let Some(img) = self.session.image() else {
            self.texture = None;
            return;
        };
        if self.texture.is_some() && self.texture_serial == img.serial {
            return;
        }
        self.texture = Some(ctx.load_texture(
            "image",
            img.color.clone(),
            egui::TextureOptions::LINEAR,
        ));
        self.texture_serial = img.serial;
    }

    fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file()
        {
            // A bad file is already logged and shown as a notice.
            let _ = self.session.choose_file(&path);
        }
    }

    fn upload(&mut self) {
        if let Err(e) = self.session.request_upload() {
            log::warn!("upload not sent: {e}");
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let frame = ctx.input(|i| PointerFrame {
            pressed: i.pointer.primary_pressed(),
            released: i.pointer.primary_released(),
            press_origin: i.pointer.press_origin(),
            latest: i.pointer.latest_pos(),
            hovered: response.hovered(),
        });
        route_pointer(self.session.editor_mut(), response.rect, &frame);
    }

    fn predictions_panel(&self, ctx: &egui::Context) {
        let Some(set) = self.session.editor().annotations() else {
            return;
        };
        egui::SidePanel::right("predictions")
            .min_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Predictions:");
                if let Some(id) = self.session.image_id() {
                    ui.weak(format!("record {id}"));
                }
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (b, label) in set.iter() {
                        ui.horizontal(|ui| {
                            ui.strong(label);
                            ui.label(format!(": ({}, {}, {}, {})", b.x1, b.y1, b.x2, b.y2));
                        });
                    }
                });
            });
    }
}

fn screen_to_image(canvas: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
    (screen_pos - canvas.min).to_pos2()
}

/// Primary-button state for one frame, in screen coordinates.
struct PointerFrame {
    pressed: bool,
    released: bool,
    press_origin: Option<egui::Pos2>,
    latest: Option<egui::Pos2>,
    hovered: bool,
}

/// Feeds press/move/release on the canvas to the editor, in image coordinates.
///
/// A press lands where the button went down, which can differ from where the
/// pointer is by the end of the frame; the difference is then applied as a move.
fn route_pointer(editor: &mut BoxEditor, canvas: egui::Rect, frame: &PointerFrame) {
    if frame.pressed {
        if let Some(origin) = frame.press_origin.filter(|p| canvas.contains(*p)) {
            editor.pointer_down(screen_to_image(canvas, origin));
        }
    }
    if let Some(pos) = frame.latest {
        if frame.hovered || editor.is_interacting() {
            editor.pointer_move(screen_to_image(canvas, pos));
        }
    }
    if frame.released {
        editor.pointer_up();
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for BoxAnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.poll();
        self.ensure_texture(ctx);

        let notice_open = self.session.notice().is_some();

        if !notice_open {
            ctx.input(|i| {
                if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                    self.session.editor_mut().delete_selected();
                }
            });
        }

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Choose Image…").clicked() {
                    self.pick_file();
                }
                match self.session.image() {
                    Some(img) => ui.label(img.file_name()),
                    None => ui.weak("No file chosen"),
                };
                ui.separator();
                if ui.button("Upload").clicked() {
                    self.upload();
                }
                if self.session.in_flight() > 0 {
                    ui.spinner();
                }
                if self.session.editor().selected().is_some() {
                    ui.separator();
                    if ui.button("Delete Selected Box").clicked() {
                        self.session.editor_mut().delete_selected();
                    }
                }
            });
        });

        self.predictions_panel(ctx);

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(size) = self.session.image().map(|img| img.size()) else {
                ui.centered_and_justified(|ui| ui.weak("Choose an image to begin."));
                return;
            };
            egui::ScrollArea::both().show(ui, |ui| {
                let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
                if !notice_open {
                    self.handle_pointer(ctx, &response);
                }

                let editor = self.session.editor();
                let primitives = editor
                    .annotations()
                    .map(|set| render::plan(set, editor.selected()))
                    .unwrap_or_default();
                render::paint(&painter, response.rect, self.texture.as_ref(), &primitives);
            });
        });

        if let Some(message) = self.session.notice().map(str::to_owned) {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.session.dismiss_notice();
                    }
                });
        }

        let revision = self.session.editor().revision();
        if revision != self.last_revision {
            self.last_revision = revision;
            ctx.request_repaint();
        }
    }
}
