//! Character-by-character heading reveal.
//!
//! The reveal is one-shot: it arms the first time the page becomes visible,
//! plays through once, and from then on the heading is simply shown.

use std::time::Duration;

/// Text of the page heading.
pub const HEADING_TEXT: &str = "Kaonewz";

/// Stagger between consecutive characters.
pub const CHAR_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct TextReveal {
    chars: Vec<char>,
    revealed: usize,
    triggered: bool,
}

impl TextReveal {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            revealed: 0,
            triggered: false,
        }
    }

    /// Arm the reveal. Returns `true` only on the first call.
    pub fn trigger(&mut self) -> bool {
        if self.triggered {
            return false;
        }
        self.triggered = true;
        true
    }

    #[cfg(test)]
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_complete(&self) -> bool {
        self.revealed == self.chars.len()
    }

    /// Reveal the next character. Returns `false` once nothing is left or
    /// while the reveal has not been triggered.
    pub fn advance(&mut self) -> bool {
        if !self.triggered || self.is_complete() {
            return false;
        }
        self.revealed += 1;
        true
    }

    /// Jump to the fully revealed state.
    pub fn finish(&mut self) {
        self.triggered = true;
        self.revealed = self.chars.len();
    }

    /// The heading as currently visible. Hidden characters are blanks so the
    /// layout does not shift while revealing.
    pub fn frame(&self) -> String {
        self.chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < self.revealed { *c } else { ' ' })
            .collect()
    }
}

impl Default for TextReveal {
    fn default() -> Self {
        Self::new(HEADING_TEXT)
    }
}
