//! Results list with keyboard-style navigation.
//!
//! [`ArticleList`] holds the items of the latest successful search and an
//! optional cursor. Moving the cursor clamps at both ends. Activating the
//! cursor emits a [`Selection`], which is also logged.

use super::{Line, LineStyle};
use crate::models::DisplayItem;
use crate::utils::{ellipsize, plain_text};
use itertools::Itertools;
use std::time::Duration;
use tracing::info;

/// Delay between successive items during the entrance animation.
pub const ENTRANCE_STAGGER: Duration = Duration::from_millis(50);

/// Columns reserved left of item details (marker plus number).
const DETAIL_INDENT: usize = 6;

/// Emitted when the user activates an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub index: usize,
    pub item: &'a DisplayItem,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleList {
    items: Vec<DisplayItem>,
    selected: Option<usize>,
    arrow_navigation: bool,
}

impl ArticleList {
    pub fn new(arrow_navigation: bool) -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            arrow_navigation,
        }
    }

    /// Replace the items. The cursor resets.
    pub fn set_items(&mut self, items: Vec<DisplayItem>) {
        self.items = items;
        self.selected = None;
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Move the cursor down one item; the first move lands on the first item.
    pub fn move_down(&mut self) {
        if !self.arrow_navigation || self.items.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1).min(self.items.len() - 1),
        });
    }

    /// Move the cursor up one item, stopping at the first.
    pub fn move_up(&mut self) {
        if !self.arrow_navigation || self.items.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
    }

    /// Put the cursor on `index` if it exists.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Activate the item under the cursor.
    pub fn activate(&self) -> Option<Selection<'_>> {
        let index = self.selected?;
        let item = self.items.get(index)?;
        info!(index, title = %item.title, url = %item.url, "Article selected");
        Some(Selection { index, item })
    }

    /// Per-item delay for the staggered entrance.
    pub fn entrance_delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.items.len()).map(|i| ENTRANCE_STAGGER * i as u32)
    }

    /// Lines for every item, each item followed by a blank separator.
    pub fn lines(&self, width: usize) -> Vec<Line> {
        self.items
            .iter()
            .enumerate()
            .flat_map(|(index, item)| self.item_lines(index, item, width))
            .collect()
    }

    /// Lines for item `index`; the entrance animation reveals these in turn.
    pub fn item_lines(&self, index: usize, item: &DisplayItem, width: usize) -> Vec<Line> {
        let detail_width = width.saturating_sub(DETAIL_INDENT + 1);
        let is_selected = self.selected == Some(index);
        let marker = if is_selected { '›' } else { ' ' };
        let title = if item.title.is_empty() {
            "(untitled)"
        } else {
            item.title.as_str()
        };

        let mut lines = vec![Line::new(
            1,
            ellipsize(
                &format!("{marker} {:>2}. {title}", index + 1),
                width.saturating_sub(2),
            ),
            if is_selected {
                LineStyle::ItemSelected
            } else {
                LineStyle::ItemTitle
            },
        )];

        let meta = [
            item.source_name.clone(),
            item.published_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]
        .into_iter()
        .flatten()
        .join(" · ");
        if !meta.is_empty() {
            lines.push(Line::new(DETAIL_INDENT, ellipsize(&meta, detail_width), LineStyle::Meta));
        }

        if let Some(description) = item.description.as_deref() {
            let text = plain_text(description);
            if !text.is_empty() {
                lines.push(Line::new(
                    DETAIL_INDENT,
                    ellipsize(&text, detail_width),
                    LineStyle::Body,
                ));
            }
        }

        lines.push(Line::new(
            DETAIL_INDENT,
            ellipsize(&item.url, detail_width),
            LineStyle::Link,
        ));
        lines.push(Line::new(
            DETAIL_INDENT,
            ellipsize(&format!("image: {}", item.image), detail_width),
            LineStyle::Meta,
        ));
        lines.push(Line::blank());
        lines
    }
}
