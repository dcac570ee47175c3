use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

use crate::report::UnitReport;

const TITLE: &str = "Transaction Overview";
const X_LABEL: &str = "Time Window";
const Y_LABEL: &str = "Number of Transactions";

fn bar_width(available: u16, bars: usize) -> u16 {
    if bars == 0 {
        return 1;
    }
    let per_bar = (available as usize / bars).saturating_sub(1);
    per_bar.clamp(1, 9) as u16
}

/// Draw one time unit as a bar chart filling the frame. The peak bar is
/// highlighted.
pub fn draw_chart(frame: &mut Frame, unit: &UnitReport) {
    let area = frame.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(format!("{TITLE} ({})", unit.unit.title())).centered())
        .title_bottom(Line::from(X_LABEL).centered());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [label_area, chart_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
    frame.render_widget(
        Paragraph::new(Y_LABEL).style(Style::default().add_modifier(Modifier::DIM)),
        label_area,
    );

    let bars: Vec<Bar> = unit
        .rows
        .iter()
        .map(|(key, count)| {
            let bar = Bar::default().value(*count).label(Line::from(key.as_str()));
            if unit.peak.as_deref() == Some(key.as_str()) {
                bar.style(Style::default().fg(Color::Red))
            } else {
                bar.style(Style::default().fg(Color::Cyan))
            }
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(chart_area.width, bars.len()))
        .bar_gap(1);
    frame.render_widget(chart, chart_area);
}

/// Show the chart full screen until any key is pressed.
pub fn show_chart(unit: &UnitReport) -> Result<()> {
    let mut terminal = ratatui::init();

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|frame| draw_chart(frame, unit))?;
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                return Ok(());
            }
        }
    })();

    ratatui::restore();
    result
}
