mod world;

use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use eframe::{App, Frame, NativeOptions, egui, run_native};
use egui::{ColorImage, Event, Key, Sense, TextureHandle, TextureOptions};
use image::{ImageFormat, ImageResult, RgbImage};
use log::{debug, info, warn};
use worldgen::input::MAX_ZOOM;
use worldgen::{
    BlockRegistry, BlockTable, ChunkKey, InputAction, InputHandler, KeyBindings, PlayerSession,
    SurfaceMap, SurfaceRegion, TargetedBlock, WorldConfig, WorldDataHandler, scan_surface,
};

use crate::world::ChunkWorld;

struct HelloWorldApp {
    config: WorldConfig,
    seed: i64, // edited in the side panel, applied on regenerate
    registry: Arc<BlockRegistry>,
    blocks: BlockTable,
    input: InputHandler,
    bindings: KeyBindings,
    session: PlayerSession,
    world: ChunkWorld,
    focus: [i32; 3],

    // preview of the loaded surface
    surface: Option<SurfaceMap>,
    texture: Option<TextureHandle>,
    rescan_all: bool,
    stale: Vec<(i32, i32, u32, u32)>, // column rectangles: x, z, width, depth

    status_message: String,
}

impl HelloWorldApp {
    fn new(config: WorldConfig) -> Result<Self, Box<dyn Error>> {
        // Block types go in before any terrain is requested
        let mut registry = BlockRegistry::new();
        let blocks = BlockTable::register(&mut registry)?;
        let registry = Arc::new(registry);

        let focus = [0, 0, 0];
        let world = spawn_world(&config, blocks, focus)?;

        Ok(Self {
            seed: config.seed,
            config,
            input: InputHandler::new(blocks, Arc::clone(&registry)),
            registry,
            blocks,
            bindings: KeyBindings::default(),
            session: PlayerSession::new(blocks.grass),
            world,
            focus,
            surface: None,
            texture: None,
            rescan_all: true,
            stale: Vec::new(),
            status_message: String::new(),
        })
    }

    fn regenerate(&mut self) {
        self.config.seed = self.seed;
        match spawn_world(&self.config, self.blocks, self.focus) {
            Ok(world) => {
                self.world = world;
                self.rescan_all = true;
                self.status_message = format!("Generating seed {}", self.seed);
            }
            Err(e) => self.status_message = format!("Runtime error: {}", e),
        }
    }

    fn pan(&mut self, delta: [i32; 3]) {
        for (axis, d) in self.focus.iter_mut().zip(delta) {
            *axis += d;
        }
        self.world.update_focus(self.focus);
        self.rescan_all = true;
    }

    fn needs_refresh(&self) -> bool {
        self.rescan_all || !self.stale.is_empty()
    }

    // Columns of the chunks around the focus, full loaded height
    fn region(&self) -> SurfaceRegion {
        let chunk_size = self.world.chunk_size();
        let size = chunk_size as i32;
        let reach = self.config.chunk_add_distance.floor() as i32;
        let center = ChunkKey::containing(self.focus, chunk_size);
        let span = ((2 * reach + 1) * size) as u32;
        SurfaceRegion {
            origin_x: (center.x - reach) * size,
            origin_z: (center.z - reach) * size,
            width: span,
            depth: span,
            y_min: (center.y - reach) * size,
            y_max: (center.y + reach + 1) * size - 1,
        }
    }

    // Rescan stale columns, or everything when the region moved
    fn refresh_surface(&mut self, ctx: &egui::Context) {
        let start = Instant::now();
        let region = self.region();
        let reuse = !self.rescan_all;
        let mut scanned = 0;
        let surface = match self.surface.take() {
            Some(mut surface) if reuse && surface.region() == region => {
                for &(x, z, width, depth) in &self.stale {
                    scanned += surface.rescan(&self.world, x, z, width, depth);
                }
                surface
            }
            _ => {
                scanned = (region.width * region.depth) as usize;
                scan_surface(&self.world, region)
            }
        };
        let img = surface.to_image(&self.registry);
        let color_image = ColorImage::from_rgb(
            [img.width() as usize, img.height() as usize],
            img.as_raw(),
        );
        self.texture = Some(ctx.load_texture("surface", color_image, TextureOptions::NEAREST));
        self.surface = Some(surface);
        self.rescan_all = false;
        self.stale.clear();
        debug!(
            "surface refreshed ({} columns) in {:.2} ms",
            scanned,
            start.elapsed().as_secs_f32() * 1000.0
        );
    }

    // The top block of the hovered column, and the cell above it
    fn target_at(&self, column: Option<(i32, i32)>) -> Option<TargetedBlock> {
        let (x, z) = column?;
        let top = self.surface.as_ref()?.column(x, z)?;
        Some(TargetedBlock {
            position: [x, top.y, z],
            adjacent: [x, top.y + 1, z],
        })
    }

    fn save_png(&mut self) {
        let Some(surface) = &self.surface else {
            self.status_message = "Nothing to save yet".into();
            return;
        };
        let img = surface.to_image(&self.registry);
        let picked = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(format!("surface_{}.png", self.config.seed))
            .save_file();
        if let Some(path) = picked {
            self.status_message = match export_png(&img, &path) {
                Ok(()) => format!("Saved {}", path.display()),
                Err(e) => format!("Save failed: {}", e),
            };
        }
    }

    fn apply(&mut self, actions: Vec<InputAction>, target: Option<TargetedBlock>) {
        for action in actions {
            match self
                .input
                .handle(action, &mut self.session, target.as_ref(), &mut self.world)
            {
                Ok(Some(edit)) => {
                    info!("{} -> block {} at {:?}", action.name(), edit.id, edit.position);
                    let [x, _, z] = edit.position;
                    self.stale.push((x, z, 1, 1));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{}", e);
                    self.status_message = e.to_string();
                }
            }
        }
    }
}

impl App for HelloWorldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let size = self.world.chunk_size();
        for key in self.world.poll() {
            let [x, _, z] = key.origin(size);
            self.stale.push((x, z, size as u32, size as u32));
        }
        if self.world.pending() > 0 {
            ctx.request_repaint();
        }

        // Keyboard and scroll
        let mut actions = Vec::new();
        let (events, scroll) = ctx.input(|i| (i.events.clone(), i.raw_scroll_delta.y));
        self.session.apply_scroll(scroll);
        let step = (self.world.chunk_size() / 2).max(1) as i32;
        for event in &events {
            if let Event::Key {
                key,
                pressed: true,
                repeat: false,
                ..
            } = event
            {
                if let Some(delta) = pan_delta(*key, step) {
                    self.pan(delta);
                } else if let Some(action) =
                    key_code(*key).and_then(|code| self.bindings.action_for(&code))
                {
                    actions.push(action);
                }
            }
        }

        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Voxel Hello World");
            ui.separator();

            ui.label("Seed");
            ui.add(egui::DragValue::new(&mut self.seed).speed(1.0));
            if ui.button("Regenerate").clicked() {
                self.regenerate();
            }

            ui.separator();
            let selected = self.registry.name(self.session.selected).unwrap_or("none");
            ui.label(format!("Selected block: {}", selected));
            ui.label("1 dirt, 2 stone, 3 grass");
            ui.label("Left click: remove");
            ui.label("Right click or E: place");
            ui.label("Arrows, PgUp, PgDn: move");
            ui.label(format!("Zoom distance: {:.0}", self.session.zoom_distance));
            ui.label(format!("Focus: {:?}", self.focus));
            ui.label(format!(
                "Chunks: {} loaded, {} pending",
                self.world.loaded(),
                self.world.pending()
            ));

            ui.separator();
            if ui.button("Save PNG…").clicked() {
                self.save_png();
            }

            ui.separator();
            ui.label(&self.status_message);
        });

        let mut hovered = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.needs_refresh() {
                self.refresh_surface(ctx);
            }
            let Some(tex) = &self.texture else {
                ui.centered_and_justified(|ui| {
                    ui.label("Generating terrain…");
                });
                return;
            };

            let scale = pixels_per_block(self.session.zoom_distance);
            let region = self.region();
            let response =
                ui.add(egui::Image::new((tex.id(), tex.size_vec2() * scale)).sense(Sense::click()));

            hovered = response.hover_pos().map(|pos| {
                let local = (pos - response.rect.min) / scale;
                (
                    region.origin_x + local.x.floor() as i32,
                    region.origin_z + local.y.floor() as i32,
                )
            });
            if response.clicked() {
                actions.extend(self.bindings.action_for("Mouse1"));
            }
            if response.secondary_clicked() {
                actions.extend(self.bindings.action_for("Mouse3"));
            }
        });

        let target = self.target_at(hovered);
        self.apply(actions, target);
        if self.needs_refresh() {
            ctx.request_repaint();
        }
    }
}

fn spawn_world(config: &WorldConfig, blocks: BlockTable, focus: [i32; 3]) -> io::Result<ChunkWorld> {
    let handler = WorldDataHandler::new(Arc::new(config.classifier(blocks)));
    let mut world = ChunkWorld::new(config, Arc::new(handler))?;
    world.update_focus(focus);
    Ok(world)
}

// Always PNG, whatever extension the chosen path has
fn export_png(img: &RgbImage, path: &Path) -> ImageResult<()> {
    img.save_with_format(path, ImageFormat::Png)
}

// Farther camera, smaller blocks
fn pixels_per_block(zoom_distance: f32) -> f32 {
    1.0 + (MAX_ZOOM - zoom_distance) * 0.5
}

// DOM-style code of a key, as used by the bindings ("KeyE", "Digit1")
fn key_code(key: Key) -> Option<String> {
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(format!("Key{}", c)),
        (Some(c), None) if c.is_ascii_digit() => Some(format!("Digit{}", c)),
        _ => None,
    }
}

fn pan_delta(key: Key, step: i32) -> Option<[i32; 3]> {
    match key {
        Key::ArrowLeft => Some([-step, 0, 0]),
        Key::ArrowRight => Some([step, 0, 0]),
        Key::ArrowUp => Some([0, 0, -step]),
        Key::ArrowDown => Some([0, 0, step]),
        Key::PageUp => Some([0, step, 0]),
        Key::PageDown => Some([0, -step, 0]),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(&path)?,
        None => WorldConfig::default(),
    };
    info!("seed {}, chunk size {}", config.seed, config.chunk_size);
    let app = HelloWorldApp::new(config)?;

    let opts = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    run_native(
        "Voxel Hello World",
        opts,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use egui::Key;
    use image::{Rgb, RgbImage};

    use super::{export_png, key_code, pan_delta, pixels_per_block};

    #[test]
    fn key_codes_follow_dom_names() {
        assert_eq!(key_code(Key::E).as_deref(), Some("KeyE"));
        assert_eq!(key_code(Key::Num1).as_deref(), Some("Digit1"));
        assert_eq!(key_code(Key::Num3).as_deref(), Some("Digit3"));
        assert_eq!(key_code(Key::Escape), None);
    }

    #[test]
    fn arrows_pan_horizontally() {
        assert_eq!(pan_delta(Key::ArrowLeft, 16), Some([-16, 0, 0]));
        assert_eq!(pan_delta(Key::PageDown, 16), Some([0, -16, 0]));
        assert_eq!(pan_delta(Key::E, 16), None);
    }

    #[test]
    fn zoom_scales_blocks() {
        assert_eq!(pixels_per_block(10.0), 1.0);
        assert!(pixels_per_block(0.0) > pixels_per_block(5.0));
    }

    #[test]
    fn export_is_png_regardless_of_extension() {
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 80, y as u8 * 120, 30]));
        let path = env::temp_dir().join(format!("surface_export_{}.jpg", process::id()));
        export_png(&img, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back, img);
    }
}
