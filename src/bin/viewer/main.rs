//! Softpipe viewer: a spinning textured cube drawn by the software pipeline
//!
//! Keys:
//! - 1 / 2 / 3: span, block, adaptive rasterization
//! - C: cycle cull mode
//! - P: save the current frame as `frame.png`
//!
//! Pipeline settings load from `viewer.ron` when present. An optional
//! first argument names an image to use as the cube texture.

mod framebuffer;
mod math;
mod scene;
mod texture;

use macroquad::prelude::*;
use softpipe::{load_config, ConfigError, PipelineConfig, RasterMode, ScissorRect, Viewport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use framebuffer::Framebuffer;
use math::{Mat4, Vec3};
use scene::Mesh;
use texture::Texture;

const WIDTH: usize = 320;
const HEIGHT: usize = 240;
const CONFIG_PATH: &str = "viewer.ron";
const SCREENSHOT_PATH: &str = "frame.png";

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Softpipe Viewer v{}", env!("CARGO_PKG_VERSION")),
        window_width: WIDTH as i32 * 3,
        window_height: HEIGHT as i32 * 3,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_pipeline_config() -> PipelineConfig {
    let mut config = match load_config(CONFIG_PATH) {
        Ok(config) => config,
        Err(ConfigError::Io(_)) => PipelineConfig::default(),
        Err(e) => {
            warn!(path = CONFIG_PATH, error = %e, "ignoring pipeline config");
            PipelineConfig::default()
        }
    };
    // The framebuffer size is fixed; only the modes come from the file
    config.viewport = Viewport::new(0, 0, WIDTH as i32, HEIGHT as i32);
    config.scissor = ScissorRect::new(0, 0, WIDTH as i32, HEIGHT as i32);
    config
}

fn load_texture() -> Texture {
    let fallback = || {
        Texture::checkerboard(
            64,
            64,
            framebuffer::Color::WHITE,
            framebuffer::Color::new(96, 96, 110),
        )
    };
    match std::env::args().nth(1) {
        Some(path) => Texture::from_file(&path).unwrap_or_else(|e| {
            warn!(%path, error = %e, "failed to load texture, using checkerboard");
            fallback()
        }),
        None => fallback(),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let mut config = load_pipeline_config();
    let texture = load_texture();
    let cube = Mesh::cube();

    let view_proj = Mat4::perspective(1.0, WIDTH as f32 / HEIGHT as f32, 0.5, 50.0)
        * Mat4::translation(Vec3::new(0.0, 0.0, -4.5));
    let mut angle = 0.0f32;

    info!(mode = ?config.raster_mode, cull = ?config.cull_mode, texture = %texture.name, "viewer started");

    loop {
        if is_key_pressed(KeyCode::Key1) {
            config.raster_mode = RasterMode::Span;
        }
        if is_key_pressed(KeyCode::Key2) {
            config.raster_mode = RasterMode::Block;
        }
        if is_key_pressed(KeyCode::Key3) {
            config.raster_mode = RasterMode::Adaptive;
        }
        if is_key_pressed(KeyCode::C) {
            config.cull_mode = config.cull_mode.next();
            info!(cull = ?config.cull_mode, "cull mode changed");
        }
        if is_key_pressed(KeyCode::P) {
            match fb.save_png(SCREENSHOT_PATH) {
                Ok(()) => info!(path = SCREENSHOT_PATH, "saved frame"),
                Err(e) => warn!(path = SCREENSHOT_PATH, error = %e, "failed to save frame"),
            }
        }

        angle += get_frame_time() * 0.8;
        let model = Mat4::rotation_y(angle) * Mat4::rotation_x(angle * 0.6);

        let start = get_time();
        fb.clear(framebuffer::Color::new(24, 24, 32));
        scene::render_mesh(&mut fb, &cube, &texture, &config, model, view_proj);
        let render_ms = (get_time() - start) * 1000.0;

        clear_background(BLACK);

        // Scale the framebuffer to fit the window, keeping its aspect
        let scale = (screen_width() / WIDTH as f32).min(screen_height() / HEIGHT as f32);
        let draw_w = WIDTH as f32 * scale;
        let draw_h = HEIGHT as f32 * scale;
        let draw_x = (screen_width() - draw_w) / 2.0;
        let draw_y = (screen_height() - draw_h) / 2.0;

        let frame = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        frame.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &frame,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        let status = format!(
            "{:?} | cull {:?} | {:.2} ms",
            config.raster_mode, config.cull_mode, render_ms
        );
        draw_text(&status, 10.0, 24.0, 20.0, WHITE);

        next_frame().await
    }
}
