use crate::config::{ColorScheme, RunConfig};
use dotmatrix_core::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{Texture, TextureCreator, WindowCanvas};
use sdl2::video::{FullscreenType, Window, WindowContext};
use sdl2::IntegerOrSdlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("error setting fullscreen mode: {msg}")]
    Fullscreen { msg: String },
    #[error("error creating renderer: {source}")]
    CreateRenderer {
        #[from]
        source: IntegerOrSdlError,
    },
    #[error("error creating frame texture: {source}")]
    CreateTexture {
        #[from]
        source: sdl2::render::TextureValueError,
    },
    #[error("error updating frame texture: {msg}")]
    Texture { msg: String },
    #[error("error copying frame texture to renderer: {msg}")]
    CopyToCanvas { msg: String },
}

// Shades range from 0-3 with 0 being "white" and 3 being "black"

const SHADE_TO_RGB_BW: [[u8; 3]; 4] = [[255, 255, 255], [170, 170, 170], [85, 85, 85], [0, 0, 0]];

// A lime-green tint that mimics the original Game Boy LCD
const SHADE_TO_RGB_GREEN: [[u8; 3]; 4] = [
    [0x80, 0xA6, 0x08],
    [0x5D, 0x7F, 0x07],
    [0x25, 0x5C, 0x1A],
    [0x00, 0x32, 0x00],
];

fn palette_for(color_scheme: ColorScheme) -> [[u8; 3]; 4] {
    match color_scheme {
        ColorScheme::BlackAndWhite => SHADE_TO_RGB_BW,
        ColorScheme::GreenTint => SHADE_TO_RGB_GREEN,
    }
}

/// Create an SDL2 renderer from the given window, with the display area
/// initialized to the palette's lightest shade.
pub fn create_renderer(
    mut window: Window,
    run_config: &RunConfig,
) -> Result<WindowCanvas, GraphicsError> {
    if run_config.launch_fullscreen {
        window
            .set_fullscreen(FullscreenType::Desktop)
            .map_err(|msg| GraphicsError::Fullscreen { msg })?;
    }

    let mut canvas_builder = window.into_canvas();
    if run_config.vsync_enabled {
        canvas_builder = canvas_builder.present_vsync();
    }

    let mut canvas = canvas_builder.build()?;

    let [r, g, b] = palette_for(run_config.color_scheme)[0];
    canvas.set_draw_color(Color::RGB(r, g, b));
    canvas.clear();
    canvas.present();

    Ok(canvas)
}

pub fn create_frame_texture(
    texture_creator: &TextureCreator<WindowContext>,
) -> Result<Texture<'_>, GraphicsError> {
    Ok(texture_creator.create_texture_streaming(
        PixelFormatEnum::RGB24,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    )?)
}

/// Render the current frame to the window, overwriting all previously
/// displayed data.
///
/// With VSync enabled this function will block until the next screen refresh.
pub fn render_frame(
    frame_buffer: &FrameBuffer,
    canvas: &mut WindowCanvas,
    texture: &mut Texture<'_>,
    run_config: &RunConfig,
) -> Result<(), GraphicsError> {
    let palette = palette_for(run_config.color_scheme);

    texture
        .with_lock(None, |pixels: &mut [u8], pitch: usize| {
            for (i, scanline) in frame_buffer.iter().enumerate() {
                for (j, shade) in scanline.iter().copied().enumerate() {
                    let start = i * pitch + 3 * j;
                    pixels[start..start + 3].copy_from_slice(&palette[usize::from(shade)]);
                }
            }
        })
        .map_err(|msg| GraphicsError::Texture { msg })?;

    let dst_rect = if run_config.force_integer_scaling {
        let (w, h) = canvas.window().size();
        determine_integer_scale_rect(w, h)
    } else {
        None
    };

    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.copy(texture, None, dst_rect).map_err(|msg| GraphicsError::CopyToCanvas { msg })?;
    canvas.present();

    Ok(())
}

fn determine_integer_scale_rect(w: u32, h: u32) -> Option<Rect> {
    let screen_width = SCREEN_WIDTH as u32;
    let screen_height = SCREEN_HEIGHT as u32;

    let Some(scale) = (1..)
        .take_while(|&scale| scale * screen_width <= w && scale * screen_height <= h)
        .last()
    else {
        // Display area is too small for even 1x scale
        return None;
    };

    let scaled_width = scale * screen_width;
    let scaled_height = scale * screen_height;
    Some(Rect::new(
        ((w - scaled_width) / 2) as i32,
        ((h - scaled_height) / 2) as i32,
        scaled_width,
        scaled_height,
    ))
}

pub fn toggle_fullscreen(canvas: &mut WindowCanvas) -> Result<(), GraphicsError> {
    let new_fullscreen = match canvas.window().fullscreen_state() {
        FullscreenType::Off => FullscreenType::Desktop,
        FullscreenType::True | FullscreenType::Desktop => FullscreenType::Off,
    };
    canvas
        .window_mut()
        .set_fullscreen(new_fullscreen)
        .map_err(|msg| GraphicsError::Fullscreen { msg })
}
