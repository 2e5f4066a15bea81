use std::time::Duration;

use crate::bulb::{Bulb, BulbStyle, PixelBuffer};
use crate::colors::Palette;
use crate::engine::PatternEngine;

/// Horizontal distance between neighbouring bulbs.
pub const BULB_SPACING: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Other,
}

/// What the window shell should do after an event was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Redraw,
    /// Move the window's top-left corner to the given screen position.
    MoveWindow(i32, i32),
    Quit,
}

/// Callbacks a window shell delivers to the strip, all on one thread.
/// Pointer positions are screen coordinates; `window_pos` is the window's
/// position on screen when the button went down.
pub trait StripEvents {
    fn on_tick(&mut self) -> Control;
    fn on_pattern_advance(&mut self) -> Control;
    fn on_pointer_down(
        &mut self,
        screen_pos: (i32, i32),
        window_pos: (i32, i32),
        button: PointerButton,
    ) -> Control;
    fn on_pointer_move(&mut self, screen_pos: (i32, i32)) -> Control;
    fn on_pointer_up(&mut self, screen_pos: (i32, i32), button: PointerButton) -> Control;
}

pub struct LightStrip {
    engine: PatternEngine,
    palette: Palette,
    bulbs: Vec<Bulb>,
    style: BulbStyle,
    glow: bool,
    /// Pointer offset from the window's top-left corner while dragging.
    drag_anchor: Option<(i32, i32)>,
    quitting: bool,
}

impl LightStrip {
    pub fn new(
        engine: PatternEngine,
        palette: Palette,
        bulb_count: usize,
        style: BulbStyle,
        glow: bool,
    ) -> LightStrip {
        log::info!(
            "Starting with pattern '{}' ({} patterns, {:?} rotation)",
            engine.current_pattern().name(),
            engine.pattern_count(),
            engine.mode()
        );

        LightStrip {
            engine,
            palette,
            bulbs: (0..bulb_count).map(|_| Bulb::new()).collect(),
            style,
            glow,
            drag_anchor: None,
            quitting: false,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (
            self.bulbs.len() as u32 * BULB_SPACING,
            self.style.strip_height(self.glow),
        )
    }

    /// Interval of the fast tick, taken from the current pattern.
    pub fn tick_interval(&self) -> Duration {
        self.engine.current_pattern().interval()
    }

    #[cfg(test)]
    pub fn bulbs(&self) -> &[Bulb] {
        &self.bulbs
    }

    #[cfg(test)]
    pub fn engine(&self) -> &PatternEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Top-left corner of bulb `index`, centered in its slot.
    pub fn bulb_origin(&self, index: usize) -> (i32, i32) {
        let (width, height) = self.style.size();
        let x = index as u32 * BULB_SPACING + (BULB_SPACING - width) / 2;
        let y = (self.style.strip_height(self.glow) - height) / 2;
        (x as i32, y as i32)
    }

    pub fn render(&self, buffer: &mut PixelBuffer) {
        buffer.clear();
        for (i, bulb) in self.bulbs.iter().enumerate() {
            let (x, y) = self.bulb_origin(i);
            bulb.render(buffer, x, y, self.style, self.glow);
        }
    }
}

impl StripEvents for LightStrip {
    fn on_tick(&mut self) -> Control {
        if self.quitting {
            return Control::Quit;
        }

        let frame = self.engine.tick();
        log::trace!(
            "Frame of {} bulbs: {:?}, next shift {}",
            frame.len(),
            frame.indices(),
            self.engine.state().shift
        );

        for (bulb, &index) in self.bulbs.iter_mut().zip(frame.indices()) {
            match self.palette.get(index) {
                Some(color) => bulb.set_color(color),
                None => log::warn!("Color index {index} is not in the palette"),
            }
        }

        Control::Redraw
    }

    fn on_pattern_advance(&mut self) -> Control {
        if self.quitting {
            return Control::Quit;
        }

        self.engine.advance_pattern();
        let pattern = self.engine.current_pattern();
        log::info!(
            "Switched to pattern '{}' ({} steps)",
            pattern.name(),
            pattern.len()
        );

        Control::Continue
    }

    fn on_pointer_down(
        &mut self,
        screen_pos: (i32, i32),
        window_pos: (i32, i32),
        button: PointerButton,
    ) -> Control {
        match button {
            PointerButton::Right => {
                log::info!("Dismissed by right click");
                self.quitting = true;
                Control::Quit
            }
            PointerButton::Left => {
                self.drag_anchor = Some((
                    screen_pos.0 - window_pos.0,
                    screen_pos.1 - window_pos.1,
                ));
                Control::Continue
            }
            PointerButton::Other => Control::Continue,
        }
    }

    fn on_pointer_move(&mut self, screen_pos: (i32, i32)) -> Control {
        match self.drag_anchor {
            Some((anchor_x, anchor_y)) => {
                Control::MoveWindow(screen_pos.0 - anchor_x, screen_pos.1 - anchor_y)
            }
            None => Control::Continue,
        }
    }

    fn on_pointer_up(&mut self, _screen_pos: (i32, i32), button: PointerButton) -> Control {
        if button == PointerButton::Left {
            self.drag_anchor = None;
        }
        Control::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RotationMode, BULB_COUNT};
    use crate::pattern;
    use palette::Srgba;

    fn make_strip(source: &str, mode: RotationMode, style: BulbStyle) -> LightStrip {
        let palette = Palette::christmas();
        let patterns = pattern::parse_json(source, &palette).unwrap();
        let engine = PatternEngine::new(patterns, mode, 0, BULB_COUNT).unwrap();
        LightStrip::new(engine, palette, BULB_COUNT, style, false)
    }

    fn scenario_strip() -> LightStrip {
        make_strip(
            r#"[{"pattern": [0, 1]}, {"pattern": [0, 1, 2, 3, 4, 3, 2, 1]}]"#,
            RotationMode::Wrap,
            BulbStyle::Round,
        )
    }

    #[test]
    fn tick_colors_every_bulb_in_wrap_mode() {
        let mut strip = scenario_strip();
        let palette = Palette::christmas();

        assert_eq!(strip.on_tick(), Control::Redraw);
        for (i, bulb) in strip.bulbs().iter().enumerate() {
            assert_eq!(Some(bulb.color()), palette.get((i % 2) as u8));
        }

        strip.on_tick();
        assert_eq!(strip.engine().state().shift, 0);
        assert_eq!(Some(strip.bulbs()[0].color()), palette.get(1));
    }

    #[test]
    fn slice_mode_leaves_trailing_bulbs_alone() {
        let mut strip = make_strip(
            r#"[{"pattern": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]},
                {"pattern": [2, 3, 4]}]"#,
            RotationMode::Slice,
            BulbStyle::Round,
        );
        let palette = Palette::christmas();

        strip.on_tick();
        assert!(strip
            .bulbs()
            .iter()
            .all(|bulb| Some(bulb.color()) == palette.get(0)));

        strip.on_pattern_advance();
        strip.on_tick();
        assert_eq!(Some(strip.bulbs()[0].color()), palette.get(2));
        assert_eq!(Some(strip.bulbs()[2].color()), palette.get(4));
        assert!(strip.bulbs()[3..]
            .iter()
            .all(|bulb| Some(bulb.color()) == palette.get(0)));
    }

    #[test]
    fn pattern_advance_restarts_rotation() {
        let mut strip = scenario_strip();
        strip.on_tick();
        assert_eq!(strip.engine().state().shift, 1);

        assert_eq!(strip.on_pattern_advance(), Control::Continue);
        assert_eq!(strip.engine().state().pattern_index, 1);
        assert_eq!(strip.engine().state().shift, 0);

        strip.on_pattern_advance();
        assert_eq!(strip.engine().state().pattern_index, 0);
    }

    #[test]
    fn right_click_quits_and_stops_ticking() {
        let mut strip = scenario_strip();
        strip.on_tick();
        let state = strip.engine().state();
        let colors: Vec<Srgba<u8>> = strip.bulbs().iter().map(|bulb| bulb.color()).collect();

        assert_eq!(
            strip.on_pointer_down((300, 10), (100, 0), PointerButton::Right),
            Control::Quit
        );
        assert_eq!(strip.on_tick(), Control::Quit);
        assert_eq!(strip.on_pattern_advance(), Control::Quit);

        assert_eq!(strip.engine().state(), state);
        let after: Vec<Srgba<u8>> = strip.bulbs().iter().map(|bulb| bulb.color()).collect();
        assert_eq!(after, colors);
    }

    #[test]
    fn left_drag_follows_the_pointer() {
        let mut strip = scenario_strip();
        assert_eq!(strip.on_pointer_move((105, 5)), Control::Continue);

        // Grabbed 50 px right of the window's left edge
        assert_eq!(
            strip.on_pointer_down((150, 10), (100, 0), PointerButton::Left),
            Control::Continue
        );
        assert!(strip.is_dragging());

        // Pointer moved 30 px right and 20 px down on screen
        assert_eq!(
            strip.on_pointer_move((180, 30)),
            Control::MoveWindow(130, 20)
        );
        // Another 5 px right
        assert_eq!(
            strip.on_pointer_move((185, 30)),
            Control::MoveWindow(135, 20)
        );

        strip.on_pointer_up((185, 30), PointerButton::Right);
        assert!(strip.is_dragging());
        strip.on_pointer_up((185, 30), PointerButton::Left);
        assert!(!strip.is_dragging());
        assert_eq!(strip.on_pointer_move((190, 30)), Control::Continue);
    }

    #[test]
    fn queued_motions_do_not_accumulate_window_moves() {
        let mut strip = scenario_strip();
        strip.on_pointer_down((150, 10), (100, 0), PointerButton::Left);

        // Several motions handled back to back, each after the previous
        // move was already applied to the window
        let targets: Vec<Control> = [(180, 30), (180, 30), (190, 30)]
            .iter()
            .map(|&pos| strip.on_pointer_move(pos))
            .collect();
        assert_eq!(
            targets,
            vec![
                Control::MoveWindow(130, 20),
                Control::MoveWindow(130, 20),
                Control::MoveWindow(140, 20),
            ]
        );
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut strip = scenario_strip();
        assert_eq!(
            strip.on_pointer_down((5, 5), (0, 0), PointerButton::Other),
            Control::Continue
        );
        assert!(!strip.is_dragging());
    }

    #[test]
    fn layout_spaces_bulbs_forty_pixels_apart() {
        let strip = scenario_strip();
        assert_eq!(strip.size(), (800, 24));
        assert_eq!(strip.bulb_origin(0), (11, 3));
        assert_eq!(strip.bulb_origin(1), (51, 3));
        assert_eq!(strip.bulb_origin(19), (771, 3));

        let oval = make_strip(r#"[{"pattern": [1]}]"#, RotationMode::Wrap, BulbStyle::Oval);
        assert_eq!(oval.size(), (800, 32));
        assert_eq!(oval.bulb_origin(2), (91, 4));
    }

    #[test]
    fn glow_strip_is_tall_enough_for_the_halo() {
        let palette = Palette::christmas();
        let patterns = pattern::parse_json(r#"[{"pattern": [0]}]"#, &palette).unwrap();
        let engine = PatternEngine::new(patterns, RotationMode::Wrap, 0, BULB_COUNT).unwrap();
        let mut strip = LightStrip::new(engine, palette, BULB_COUNT, BulbStyle::Round, true);
        strip.on_tick();

        let (width, height) = strip.size();
        assert_eq!(height, 32);
        assert_eq!(strip.bulb_origin(0), (11, 7));

        let mut buffer = PixelBuffer::new(width, height);
        strip.render(&mut buffer);

        // The halo fades out inside the strip instead of being cut off
        assert!(buffer.pixel(20, 2).unwrap().alpha > 0);
        assert!(buffer.pixel(20, 29).unwrap().alpha > 0);
        for x in 0..width as i32 {
            assert_eq!(buffer.pixel(x, 0).unwrap().alpha, 0);
            assert_eq!(buffer.pixel(x, height as i32 - 1).unwrap().alpha, 0);
        }
    }

    #[test]
    fn render_paints_each_bulb_in_its_slot() {
        let mut strip = scenario_strip();
        strip.on_tick();

        let (width, height) = strip.size();
        let mut buffer = PixelBuffer::new(width, height);
        strip.render(&mut buffer);

        // Bulb centers are opaque, the gaps between bulbs stay transparent
        assert_eq!(buffer.pixel(20, 12).unwrap().alpha, 255);
        assert_eq!(buffer.pixel(60, 12).unwrap().alpha, 255);
        assert_eq!(buffer.pixel(40, 12).unwrap().alpha, 0);
        assert_eq!(buffer.pixel(20, 12).unwrap().red, 255);
        assert_eq!(buffer.pixel(60, 12).unwrap().green, 255);
    }

    #[test]
    fn tick_interval_follows_current_pattern() {
        let mut strip = make_strip(
            r#"[{"pattern": [0], "interval": 500}, {"pattern": [1], "interval": 250}]"#,
            RotationMode::Wrap,
            BulbStyle::Round,
        );
        assert_eq!(strip.tick_interval(), Duration::from_millis(500));
        strip.on_pattern_advance();
        assert_eq!(strip.tick_interval(), Duration::from_millis(250));
    }
}
