//! Two-panel quote chart using ratatui.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use quotes_core::types::{ResultRow, ResultTable};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tracing::debug;

const BAR_WIDTH: u16 = 10;
const BAR_GAP: u16 = 2;

/// Price and short-fee bar chart for one result table.
pub struct QuoteChart<'a> {
    table: &'a ResultTable,
}

impl<'a> QuoteChart<'a> {
    pub fn new(table: &'a ResultTable) -> Self {
        Self { table }
    }

    /// The chart has nothing to show when every price is missing.
    pub fn is_drawable(&self) -> bool {
        !self.table.is_empty() && !self.table.all_prices_missing()
    }

    /// Show the chart until the user presses `q` or `Esc`.
    pub fn run(&self) -> io::Result<()> {
        debug!("Charting {} rows", self.table.len());
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    fn run_loop<B: Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.code == KeyCode::Char('q') || key.code == KeyCode::Esc {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Draw the header, price panel and fee panel into a frame.
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),      // Header
                Constraint::Percentage(50), // Prices
                Constraint::Min(6),         // Fees
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_panel(frame, chunks[1], "Price ($)", Color::Cyan, |r| r.price);
        self.render_panel(frame, chunks[2], "Short Fee (%)", Color::Yellow, |r| {
            r.short_fee
        });
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(
                    "Delayed quotes at {}",
                    self.table.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | Press 'q' to quit"),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Quotes"));
        frame.render_widget(header, area);
    }

    fn render_panel<F>(&self, frame: &mut Frame, area: Rect, title: &str, color: Color, value: F)
    where
        F: Fn(&ResultRow) -> Option<f64>,
    {
        let bars: Vec<Bar> = self
            .table
            .iter()
            .map(|row| match value(row) {
                Some(v) => Bar::default()
                    .value(scaled(v))
                    .text_value(format!("{:.2}", v))
                    .label(Line::from(row.symbol.clone()))
                    .style(Style::default().fg(color)),
                None => Bar::default()
                    .value(0)
                    .label(Line::from(format!("{} NaN", row.symbol))),
            })
            .collect();

        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .data(BarGroup::default().bars(&bars))
            .bar_width(BAR_WIDTH)
            .bar_gap(BAR_GAP)
            .value_style(Style::default().fg(Color::Black).bg(color));
        frame.render_widget(chart, area);
    }
}

/// Bar heights are integers; keep two decimals of resolution.
fn scaled(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value * 100.0).round() as u64
    } else {
        0
    }
}
