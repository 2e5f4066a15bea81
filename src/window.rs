extern crate sdl2;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sdl2::event::{Event, WindowEvent};
use sdl2::mouse::MouseButton;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::{BlendMode, Canvas, Texture};
use sdl2::sys::SDL_WindowFlags;
use sdl2::video::{Window, WindowPos};
use sdl2::{EventPump, Sdl, VideoSubsystem};

use crate::bulb::PixelBuffer;
use crate::intervaltimer::IntervalTimer;
use crate::strip::{Control, LightStrip, PointerButton, StripEvents};

/// Upper bound for a single wait, so a Ctrl-C is noticed without input.
const MAX_WAIT: Duration = Duration::from_millis(250);

pub struct WindowOptions {
    pub opacity: f32,
    pub position: Option<(i32, i32)>,
    pub advance_every: Option<Duration>,
}

/// SDL's Wayland backend ignores always-on-top and window positioning, so
/// prefer XWayland when a Wayland session is detected. Must run before
/// `sdl2::init`.
pub fn prefer_x11_on_wayland() {
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        log::info!("Wayland session detected, using the X11 video driver");
        if !sdl2::hint::set("SDL_VIDEODRIVER", "x11") {
            log::warn!("Cannot set SDL_VIDEODRIVER hint");
        }
    }
}

/// Pointer position on screen. Event coordinates are relative to where the
/// window was when the event was queued, which goes stale while dragging.
fn global_pointer() -> (i32, i32) {
    let (mut x, mut y) = (0, 0);
    unsafe {
        sdl2::sys::SDL_GetGlobalMouseState(&mut x, &mut y);
    }
    (x, y)
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Right => PointerButton::Right,
        _ => PointerButton::Other,
    }
}

pub struct StripWindow {
    _sdl_context: Sdl,
    _sdl_video: VideoSubsystem,
    canvas: Canvas<Window>,
    event_pump: EventPump,
    advance_every: Option<Duration>,
}

impl StripWindow {
    fn default_position(video: &VideoSubsystem, width: u32) -> (i32, i32) {
        match video.display_usable_bounds(0) {
            Ok(bounds) => (
                bounds.x() + (bounds.width() as i32 - width as i32) / 2,
                bounds.y(),
            ),
            Err(err) => {
                log::warn!("Cannot query display bounds: {err}");
                (0, 0)
            }
        }
    }

    pub fn new(size: (u32, u32), options: &WindowOptions) -> Result<StripWindow, String> {
        let sdl_context = sdl2::init()?;
        let sdl_video = sdl_context.video()?;
        log::debug!("SDL video driver: {}", sdl_video.current_video_driver());

        let (width, height) = size;
        let (x, y) = match options.position {
            Some(position) => position,
            None => StripWindow::default_position(&sdl_video, width),
        };

        let mut builder = sdl_video.window("lichterkette", width, height);
        builder
            .set_window_flags(
                SDL_WindowFlags::SDL_WINDOW_ALWAYS_ON_TOP as u32
                    | SDL_WindowFlags::SDL_WINDOW_SKIP_TASKBAR as u32
                    | SDL_WindowFlags::SDL_WINDOW_UTILITY as u32,
            )
            .borderless()
            .position(x, y);
        let mut window = builder
            .build()
            .map_err(|err| format!("Cannot create window: {err}"))?;

        let opacity = options.opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            if let Err(err) = window.set_opacity(opacity) {
                log::warn!("Window opacity is not supported here: {err}");
            }
        }

        let mut canvas = window
            .into_canvas()
            .build()
            .map_err(|err| format!("Cannot create renderer: {err}"))?;
        canvas.set_blend_mode(BlendMode::Blend);

        let event_pump = sdl_context.event_pump()?;
        log::info!("Opened {width}x{height} window at {x},{y}");

        Ok(StripWindow {
            _sdl_context: sdl_context,
            _sdl_video: sdl_video,
            canvas,
            event_pump,
            advance_every: options.advance_every,
        })
    }

    fn present(
        canvas: &mut Canvas<Window>,
        texture: &mut Texture,
        buffer: &mut PixelBuffer,
        strip: &LightStrip,
    ) -> Result<(), String> {
        strip.render(buffer);
        texture
            .update(None, buffer.as_bytes(), buffer.pitch())
            .map_err(|err| err.to_string())?;

        canvas.set_draw_color(Color::RGBA(0, 0, 0, 0));
        canvas.clear();
        canvas.copy(texture, None, None)?;
        canvas.present();
        Ok(())
    }

    fn dispatch(&mut self, event: Event, strip: &mut LightStrip) -> Control {
        match event {
            Event::Quit { .. } => Control::Quit,
            Event::MouseButtonDown { mouse_btn, .. } => {
                let window_pos = self.canvas.window().position();
                strip.on_pointer_down(global_pointer(), window_pos, map_button(mouse_btn))
            }
            Event::MouseMotion { .. } => strip.on_pointer_move(global_pointer()),
            Event::MouseButtonUp { mouse_btn, .. } => {
                strip.on_pointer_up(global_pointer(), map_button(mouse_btn))
            }
            Event::Window {
                win_event: WindowEvent::Exposed,
                ..
            } => Control::Redraw,
            _ => Control::Continue,
        }
    }

    /// Applies `control` and returns false once the loop should stop.
    fn apply(&mut self, control: Control, needs_redraw: &mut bool) -> bool {
        match control {
            Control::Continue => true,
            Control::Redraw => {
                *needs_redraw = true;
                true
            }
            Control::MoveWindow(x, y) => {
                self.canvas
                    .window_mut()
                    .set_position(WindowPos::Positioned(x), WindowPos::Positioned(y));
                true
            }
            Control::Quit => false,
        }
    }

    /// Runs the event loop until the strip asks to quit, the window is
    /// closed or `running` is cleared.
    pub fn run(&mut self, strip: &mut LightStrip, running: Arc<AtomicBool>) -> Result<(), String> {
        let (width, height) = strip.size();
        let texture_creator = self.canvas.texture_creator();
        // ABGR8888 is R, G, B, A in memory on little-endian hosts
        let mut texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, width, height)
            .map_err(|err| err.to_string())?;
        texture.set_blend_mode(BlendMode::Blend);
        let mut buffer = PixelBuffer::new(width, height);

        let now = Instant::now();
        let mut tick_timer = IntervalTimer::new("tick", strip.tick_interval(), now);
        let mut advance_timer = self
            .advance_every
            .map(|interval| IntervalTimer::new("advance", interval, now));
        let mut needs_redraw = true;

        while running.load(Ordering::SeqCst) {
            if needs_redraw {
                needs_redraw = false;
                let res =
                    StripWindow::present(&mut self.canvas, &mut texture, &mut buffer, strip);
                if let Err(err) = res {
                    log::warn!("Failed to present frame: {err}");
                }
            }

            let now = Instant::now();
            let mut wait = tick_timer.time_until_next(now).min(MAX_WAIT);
            if let Some(advance_timer) = &advance_timer {
                wait = wait.min(advance_timer.time_until_next(now));
            }

            if let Some(event) = self.event_pump.wait_event_timeout(wait.as_millis() as u32) {
                let control = self.dispatch(event, strip);
                if !self.apply(control, &mut needs_redraw) {
                    return Ok(());
                }
                while let Some(event) = self.event_pump.poll_event() {
                    let control = self.dispatch(event, strip);
                    if !self.apply(control, &mut needs_redraw) {
                        return Ok(());
                    }
                }
            }

            let now = Instant::now();
            if let Some(advance_timer) = &mut advance_timer {
                if advance_timer.poll(now) {
                    let control = strip.on_pattern_advance();
                    if !self.apply(control, &mut needs_redraw) {
                        return Ok(());
                    }
                    tick_timer.set_interval(strip.tick_interval());
                    tick_timer.reset(now);
                }
            }

            if tick_timer.poll(now) {
                let control = strip.on_tick();
                if !self.apply(control, &mut needs_redraw) {
                    return Ok(());
                }
                tick_timer.set_interval(strip.tick_interval());
            }
        }

        log::info!("Interrupted after {} ticks, shutting down", tick_timer.ticks());
        Ok(())
    }
}
