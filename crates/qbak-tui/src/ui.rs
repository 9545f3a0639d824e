use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, Focus, Input};

pub fn draw(f: &mut Frame, app: &App) {
    let outer = Block::default()
        .title(Span::styled(
            " qbak configuration ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = outer.inner(f.area());
    f.render_widget(outer, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // key
            Constraint::Length(3), // paths
            Constraint::Length(3), // retention
            Constraint::Length(3), // destination
            Constraint::Length(1), // buttons
            Constraint::Length(1), // error
            Constraint::Min(0),
            Constraint::Length(1), // footer
        ])
        .split(inner);

    for (i, field) in Focus::FIELDS.iter().enumerate() {
        if let Some(input) = app.input(*field) {
            draw_input(f, app, *field, input, chunks[i]);
        }
    }

    draw_buttons(f, app, chunks[4]);

    if let Some(err) = &app.error {
        f.render_widget(
            Paragraph::new(Span::styled(err.as_str(), Style::default().fg(Color::Red))),
            chunks[5],
        );
    }

    draw_footer(f, chunks[7]);
}

fn draw_input(f: &mut Frame, app: &App, field: Focus, input: &Input, area: Rect) {
    let focused = app.focus == field;
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" {} ", field.title()))
        .borders(Borders::ALL)
        .border_style(border);

    // keep the cursor inside the visible window
    let width = area.width.saturating_sub(2).max(1) as usize;
    let start = input.cursor().saturating_sub(width - 1);
    let visible: String = input.text().chars().skip(start).take(width).collect();

    f.render_widget(Paragraph::new(visible).block(block), area);

    if focused {
        let x = area.x + 1 + (input.cursor() - start) as u16;
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_buttons(f: &mut Frame, app: &App, area: Rect) {
    let button = |which: Focus| {
        let style = if app.focus == which {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Span::styled(format!(" {} ", which.title()), style)
    };

    let line = Line::from(
        Focus::ALL
            .iter()
            .filter(|f| f.is_button())
            .flat_map(|b| [button(*b), Span::raw("  ")])
            .collect::<Vec<_>>(),
    );
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("[Tab]", Style::default().fg(Color::Yellow)),
        Span::raw(" Next  "),
        Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
        Span::raw(" Press  "),
        Span::styled("[Ctrl-S]", Style::default().fg(Color::Yellow)),
        Span::raw(" Save  "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" Cancel  "),
    ]);
    f.render_widget(Paragraph::new(hints), area);
}
