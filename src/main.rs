//! # Kaonewz
//!
//! A terminal front end for a news search API. Type a country or keyword,
//! the matching articles are fetched from `GET <base>/news/search` and shown
//! as a list, under an animated heading and over a generative backdrop.
//!
//! ## Usage
//!
//! ```sh
//! # Interactive: one query per line, :next/:prev/:N/:open to browse, :quit to exit
//! kaonewz
//!
//! # One-shot
//! kaonewz --query Indonesia --no-animation
//! ```
//!
//! ## Architecture
//!
//! 1. **Controller**: `SearchController` owns the query and `SearchState`
//! 2. **Session**: runs the controller's requests against a `NewsApi` under
//!    the configured overlap policy
//! 3. **API**: `HttpNewsApi` fetches and normalizes articles
//! 4. **Render**: `Page` turns the current state into terminal output

use clap::Parser;
use console::{Term, style};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod controller;
mod error;
mod models;
mod render;
mod session;
mod utils;

use api::{HttpNewsApi, NewsApi};
use cli::Cli;
use config::Settings;
use controller::SearchState;
use error::SearchFailed;
use render::heading::CHAR_DELAY;
use render::page::Page;
use render::Line;
use session::Session;

const FALLBACK_WIDTH: usize = 80;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("kaonewz starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match Settings::from_cli(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return Err(e.into());
        }
    };
    info!(
        base_url = %settings.base_url,
        policy = ?settings.overlap_policy,
        "Configuration resolved"
    );

    let api = HttpNewsApi::new(&settings)?;
    let term = Term::stdout();
    let is_term = term.is_term();
    let width = args.width.unwrap_or_else(|| {
        if is_term {
            term.size().1 as usize
        } else {
            FALLBACK_WIDTH
        }
    });

    let page = if is_term {
        Page::new(width).with_backdrop(rand::random())
    } else {
        Page::new(width)
    };
    let mut view = View {
        term,
        page,
        animate: settings.animate && is_term,
        clear: is_term,
    };
    let mut session = Session::new(api, settings.overlap_policy);

    view.intro().await?;

    let result = match args.query {
        Some(query) => run_once(&mut view, &mut session, query).await,
        None => run_interactive(&mut view, &mut session).await,
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    result
}

/// Run a single search and print the page. A failed search is returned as
/// an error so `main` exits non-zero.
#[instrument(level = "info", skip(view, session))]
async fn run_once<A: NewsApi>(
    view: &mut View,
    session: &mut Session<A>,
    query: String,
) -> Result<(), Box<dyn Error>> {
    let state = session.search(query).await.clone();
    view.page.sync(&state);
    view.draw(session.controller().query(), &state, true).await?;

    check_outcome(&state)?;
    Ok(())
}

/// `Err` when a search ended in `Failed`.
fn check_outcome(state: &SearchState) -> Result<(), SearchFailed> {
    if let SearchState::Failed(message) = state {
        error!(%message, "Search failed");
        return Err(SearchFailed(message.clone()));
    }
    Ok(())
}

/// Read queries and commands from stdin while requests complete in the
/// background.
#[instrument(level = "info", skip_all)]
async fn run_interactive<A: NewsApi>(
    view: &mut View,
    session: &mut Session<A>,
) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    view.draw("", session.state(), false).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Next => view.page.list_mut().move_down(),
                    Command::Prev => view.page.list_mut().move_up(),
                    Command::Pick(number) => {
                        if !view.page.list_mut().select(number - 1) {
                            continue;
                        }
                    }
                    Command::Open => {
                        if let Some(selection) = view.page.list().activate() {
                            println!("{} {}", style("→").cyan().bold(), selection.item.url);
                            continue;
                        }
                    }
                    Command::Search(query) => {
                        session.set_query(query);
                        let _ = session.submit();
                        view.page.sync(session.state());
                    }
                }
                view.draw(session.controller().query(), session.state(), false).await?;
            }
            applied = session.next_completion() => {
                if applied {
                    view.page.sync(session.state());
                    view.draw(session.controller().query(), session.state(), true).await?;
                }
            }
        }
    }
    Ok(())
}

/// A line of interactive input.
#[derive(Debug, PartialEq)]
enum Command {
    Quit,
    Next,
    Prev,
    Open,
    /// Move the cursor to the 1-based item number. Never zero.
    Pick(usize),
    Search(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":q" | ":quit" => Command::Quit,
            ":n" | ":next" => Command::Next,
            ":p" | ":prev" => Command::Prev,
            ":o" | ":open" => Command::Open,
            other => match other
                .strip_prefix(':')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n > 0)
            {
                Some(number) => Command::Pick(number),
                None => Command::Search(line.to_string()),
            },
        }
    }
}

/// Terminal output for the page.
struct View {
    term: Term,
    page: Page,
    animate: bool,
    clear: bool,
}

impl View {
    /// Play the heading reveal once, or mark it finished when not animating.
    async fn intro(&mut self) -> std::io::Result<()> {
        if !self.animate {
            self.page.heading_mut().finish();
            return Ok(());
        }

        self.term.clear_screen()?;
        let heading = self.page.heading_lines();
        self.term.write_str(&self.page.render_lines(&heading, 0))?;
        while self.page.heading_mut().advance() {
            sleep(CHAR_DELAY).await;
            let heading = self.page.heading_lines();
            self.term.move_cursor_up(heading.len())?;
            self.term.write_str(&self.page.render_lines(&heading, 0))?;
        }
        Ok(())
    }

    /// Redraw the page. With `entrance`, list items appear one by one.
    async fn draw(&mut self, query: &str, state: &SearchState, entrance: bool) -> std::io::Result<()> {
        if self.clear {
            self.term.clear_screen()?;
        }

        let staggered = entrance && self.animate && !self.page.list().is_empty();
        if !staggered {
            let page = self.page.render(query, state);
            return self.term.write_str(&page);
        }

        let mut head = self.page.heading_lines();
        head.extend(self.page.form_lines(query));
        self.term.write_str(&self.page.render_lines(&head, 0))?;

        let mut row = head.len();
        let width = self.page.width();
        let items: Vec<Vec<Line>> = self
            .page
            .list()
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| self.page.list().item_lines(i, item, width))
            .collect();
        let delays: Vec<_> = self.page.list().entrance_delays().collect();
        let start = Instant::now();
        for (lines, delay) in items.iter().zip(delays) {
            sleep_until(start + delay).await;
            self.term.write_str(&self.page.render_lines(lines, row))?;
            row += lines.len();
        }
        Ok(())
    }
}
