//! Terminal rendering of the news page.
//!
//! This module contains the presentational layer. Nothing here performs I/O;
//! every component produces plain [`Line`]s which [`compose`] styles with
//! `console` and lays over the decorative backdrop.
//!
//! # Submodules
//!
//! - [`heading`]: One-shot character-by-character reveal of the page heading
//! - [`backdrop`]: Generative, time-driven background field
//! - [`article_list`]: The results list with selection and navigation
//! - [`page`]: Composition of heading, backdrop, and search view
//!
//! # Layering
//!
//! ```text
//! ::-==+**##  Kaonewz  ##**+==-::.      <- backdrop shows around content
//! .::-=  Search News by Country  =-::.
//! ```

pub mod article_list;
pub mod backdrop;
pub mod heading;
pub mod page;

use backdrop::Backdrop;
use console::{measure_text_width, style};
use std::time::Duration;

/// Visual role of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Heading,
    Title,
    Input,
    Placeholder,
    Status,
    Error,
    ItemTitle,
    ItemSelected,
    Meta,
    Body,
    Link,
}

/// One row of page content before styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub indent: usize,
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    pub fn new(indent: usize, text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            indent,
            text: text.into(),
            style,
        }
    }

    /// A line horizontally centered in `width` columns.
    pub fn centered(width: usize, text: impl Into<String>, style: LineStyle) -> Self {
        let text = text.into();
        let indent = width.saturating_sub(measure_text_width(&text)) / 2;
        Self::new(indent, text, style)
    }

    pub fn blank() -> Self {
        Self::new(0, "", LineStyle::Body)
    }

    fn styled(&self) -> String {
        let text = self.text.as_str();
        match self.style {
            LineStyle::Heading => style(text).bold().white().to_string(),
            LineStyle::Title => style(text).bold().to_string(),
            LineStyle::Input => style(text).white().to_string(),
            LineStyle::Placeholder => style(text).dim().italic().to_string(),
            LineStyle::Status => style(text).dim().to_string(),
            LineStyle::Error => style(text).red().to_string(),
            LineStyle::ItemTitle => style(text).bold().to_string(),
            LineStyle::ItemSelected => style(text).cyan().bold().to_string(),
            LineStyle::Meta => style(text).dim().to_string(),
            LineStyle::Body => text.to_string(),
            LineStyle::Link => style(text).blue().underlined().to_string(),
        }
    }
}

/// Style `lines` and lay them over `backdrop` sampled at `elapsed`, with the
/// first line placed on backdrop row `first_row`.
///
/// Content always wins: backdrop cells are only drawn where a row has no
/// text, with a one-column gutter kept clear on each side of the text.
/// Without a backdrop, rows are just indented text.
pub fn compose(
    lines: &[Line],
    backdrop: Option<&Backdrop>,
    elapsed: Duration,
    first_row: usize,
) -> String {
    let mut out = String::new();
    for (row, line) in lines.iter().enumerate() {
        match backdrop {
            Some(backdrop) => {
                let field: Vec<char> = backdrop.row(first_row + row, elapsed).chars().collect();
                let text_width = measure_text_width(&line.text);
                let (left_end, right_start) = if text_width == 0 {
                    (field.len(), field.len())
                } else {
                    (
                        line.indent.saturating_sub(1).min(field.len()),
                        (line.indent + text_width + 1).min(field.len()),
                    )
                };

                let left: String = field[..left_end].iter().collect();
                let right: String = field[right_start..].iter().collect();
                let gap = line.indent.saturating_sub(left_end);
                out.push_str(&style(left).dim().to_string());
                out.push_str(&" ".repeat(gap));
                out.push_str(&line.styled());
                if text_width > 0 && right_start > line.indent + text_width {
                    out.push(' ');
                }
                out.push_str(&style(right).dim().to_string());
            }
            None => {
                out.push_str(&" ".repeat(line.indent));
                out.push_str(&line.styled());
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;

    #[test]
    fn test_centered_line() {
        let line = Line::centered(20, "Kaonewz", LineStyle::Heading);
        assert_eq!(line.indent, 6);
    }

    #[test]
    fn test_compose_without_backdrop() {
        let lines = vec![
            Line::new(2, "hello", LineStyle::Title),
            Line::blank(),
            Line::new(0, "world", LineStyle::Error),
        ];
        let out = compose(&lines, None, Duration::ZERO, 0);
        assert_eq!(strip_ansi_codes(&out), "  hello\n\nworld\n");
    }

    #[test]
    fn test_compose_keeps_content_over_backdrop() {
        let backdrop = Backdrop::new(30, 7);
        let lines = vec![Line::new(10, "news", LineStyle::Title), Line::blank()];
        let out = compose(&lines, Some(&backdrop), Duration::from_secs(1), 0);
        let plain = strip_ansi_codes(&out).into_owned();
        let rows: Vec<&str> = plain.lines().collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chars().count(), 30);
        assert_eq!(rows[0].chars().skip(9).take(6).collect::<String>(), " news ");
        assert_eq!(rows[1].chars().count(), 30);
    }
}
