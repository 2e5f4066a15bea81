use crate::pattern::{Pattern, PatternError};

/// Number of bulbs on the strip, independent of any pattern length.
pub const BULB_COUNT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RotationMode {
    /// Every bulb gets a color; short patterns repeat along the strip.
    Wrap,
    /// Left-rotate the sequence and color only as many bulbs as it is long.
    Slice,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineState {
    pub pattern_index: usize,
    pub shift: usize,
}

/// Palette indices for the bulbs, starting at the leftmost one. May be
/// shorter than the strip, in which case the remaining bulbs are untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    pub fn indices(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub fn frame_for(sequence: &[u8], shift: usize, mode: RotationMode, bulb_count: usize) -> Frame {
    let len = sequence.len();
    let indices = match mode {
        RotationMode::Wrap => (0..bulb_count).map(|i| sequence[(i + shift) % len]).collect(),
        RotationMode::Slice => sequence[shift..]
            .iter()
            .chain(&sequence[..shift])
            .take(bulb_count)
            .copied()
            .collect(),
    };
    Frame(indices)
}

/// Renders the frame for `state` and returns the state of the next tick.
///
/// `patterns` must be non-empty and `state` within bounds, which
/// `PatternEngine` guarantees.
pub fn tick(
    state: EngineState,
    patterns: &[Pattern],
    mode: RotationMode,
    bulb_count: usize,
) -> (EngineState, Frame) {
    let sequence = patterns[state.pattern_index].sequence();
    let frame = frame_for(sequence, state.shift, mode, bulb_count);
    let next = EngineState {
        pattern_index: state.pattern_index,
        shift: (state.shift + 1) % sequence.len(),
    };
    (next, frame)
}

pub fn advance_pattern(state: EngineState, patterns: &[Pattern]) -> EngineState {
    EngineState {
        pattern_index: (state.pattern_index + 1) % patterns.len(),
        shift: 0,
    }
}

pub struct PatternEngine {
    patterns: Vec<Pattern>,
    mode: RotationMode,
    bulb_count: usize,
    state: EngineState,
}

impl PatternEngine {
    pub fn new(
        patterns: Vec<Pattern>,
        mode: RotationMode,
        start_index: usize,
        bulb_count: usize,
    ) -> Result<PatternEngine, PatternError> {
        if patterns.is_empty() {
            return Err(PatternError::NoPatterns);
        }

        let state = EngineState {
            pattern_index: start_index % patterns.len(),
            shift: 0,
        };

        Ok(PatternEngine {
            patterns,
            mode,
            bulb_count,
            state,
        })
    }

    pub fn tick(&mut self) -> Frame {
        let (next, frame) = tick(self.state, &self.patterns, self.mode, self.bulb_count);
        self.state = next;
        frame
    }

    pub fn advance_pattern(&mut self) {
        self.state = advance_pattern(self.state, &self.patterns);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn current_pattern(&self) -> &Pattern {
        &self.patterns[self.state.pattern_index]
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
