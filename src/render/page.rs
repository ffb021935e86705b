//! Page composition: heading, backdrop, and the search view.
//!
//! # Layout
//!
//! ```text
//!                     Kaonewz
//!
//!  Search News by Country
//!  > japan_                                      [Search]
//!
//!  Fetching latest news...      | error line | list | empty message
//! ```
//!
//! The backdrop fills every cell not taken by content.

use super::article_list::ArticleList;
use super::backdrop::Backdrop;
use super::heading::TextReveal;
use super::{Line, LineStyle, compose};
use crate::controller::SearchState;
use std::time::{Duration, Instant};

pub const SEARCH_TITLE: &str = "Search News by Country";
pub const INPUT_PLACEHOLDER: &str = "Enter a country name (e.g. Japan, Korea, Indonesia)";
pub const LOADING_MESSAGE: &str = "Fetching latest news...";
pub const EMPTY_MESSAGE: &str = "No articles yet - try searching for a country.";

const SUBMIT_LABEL: &str = "[Search]";
const MARGIN: usize = 1;

#[derive(Debug)]
pub struct Page {
    width: usize,
    heading: TextReveal,
    backdrop: Option<Backdrop>,
    list: ArticleList,
    started: Instant,
}

impl Page {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            heading: TextReveal::default(),
            backdrop: None,
            list: ArticleList::new(true),
            started: Instant::now(),
        }
    }

    /// Draw the generative backdrop behind the content.
    pub fn with_backdrop(mut self, seed: u64) -> Self {
        self.backdrop = Some(Backdrop::new(self.width, seed));
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn heading_mut(&mut self) -> &mut TextReveal {
        &mut self.heading
    }

    pub fn list(&self) -> &ArticleList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ArticleList {
        &mut self.list
    }

    /// Called whenever the search state changes; refreshes list contents.
    pub fn sync(&mut self, state: &SearchState) {
        match state {
            SearchState::Success(items) => self.list.set_items(items.clone()),
            _ => self.list.set_items(Vec::new()),
        }
    }

    /// Heading rows. Showing the page for the first time arms the reveal.
    pub fn heading_lines(&mut self) -> Vec<Line> {
        self.heading.trigger();
        vec![
            Line::blank(),
            Line::centered(self.width, self.heading.frame(), LineStyle::Heading),
            Line::blank(),
        ]
    }

    /// The search form: title, input line, submit control.
    pub fn form_lines(&self, query: &str) -> Vec<Line> {
        let inner = self
            .width
            .saturating_sub(2 * MARGIN + SUBMIT_LABEL.len() + 3);
        let (text, style) = if query.is_empty() {
            (INPUT_PLACEHOLDER, LineStyle::Placeholder)
        } else {
            (query, LineStyle::Input)
        };
        let shown = crate::utils::ellipsize(text, inner);
        let pad = inner.saturating_sub(shown.chars().count());

        vec![
            Line::new(MARGIN, SEARCH_TITLE, LineStyle::Title),
            Line::new(
                MARGIN,
                format!("> {shown}{} {SUBMIT_LABEL}", " ".repeat(pad)),
                style,
            ),
            Line::blank(),
        ]
    }

    /// Everything below the form, driven by the search state.
    pub fn status_lines(&self, state: &SearchState) -> Vec<Line> {
        match state {
            SearchState::Loading => vec![Line::new(MARGIN, LOADING_MESSAGE, LineStyle::Status)],
            SearchState::Failed(message) => {
                vec![Line::new(MARGIN, message.clone(), LineStyle::Error)]
            }
            SearchState::Success(_) if !self.list.is_empty() => self.list.lines(self.width),
            SearchState::Success(_) | SearchState::Idle => {
                vec![Line::centered(self.width, EMPTY_MESSAGE, LineStyle::Status)]
            }
        }
    }

    /// Render the whole page for `query` and `state`.
    pub fn render(&mut self, query: &str, state: &SearchState) -> String {
        let mut lines = self.heading_lines();
        lines.extend(self.form_lines(query));
        lines.extend(self.status_lines(state));
        compose(&lines, self.backdrop.as_ref(), self.elapsed(), 0)
    }

    /// Render a run of content rows starting at page row `first_row`, used
    /// to animate one region at a time.
    pub fn render_lines(&self, lines: &[Line], first_row: usize) -> String {
        compose(lines, self.backdrop.as_ref(), self.elapsed(), first_row)
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
