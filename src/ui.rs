use crate::app::{App, DiffPage, TreeView};
use crate::diff::{DiffBody, EQUAL_MESSAGE, LineKind};
use crate::pages::Page;
use crate::selection::{PaneState, Side};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

const HELP_LINES: &[(&str, &str)] = &[
    ("r", "reload secrets metadata from Vault"),
    ("d", "show diff between selected secrets"),
    ("s", "single mode: compare versions of the same secret"),
    ("m", "multiple mode: compare versions of different secrets"),
    ("Ctrl+Left", "select previous secret version"),
    ("Ctrl+Right", "select next secret version"),
    ("Tab", "switch between left and right tree"),
    ("Up/Down", "move in tree / scroll diff"),
    ("Click", "select secret in tree"),
    ("Wheel", "scroll diff"),
    ("Esc", "close diff or help"),
    ("? / h", "show this help"),
    ("q / Ctrl+C", "quit"),
];

pub fn draw(frame: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    if app.pages.contains(Page::Diff)
        && let Some(diff) = app.diff.as_mut()
    {
        draw_diff(frame, diff, outer[0]);
    } else {
        draw_browse(frame, app, outer[0]);
    }
    draw_status_bar(frame, app, outer[1]);

    if app.pages.top() == Page::Help {
        draw_help(frame);
    }
}

fn draw_browse(frame: &mut Frame, app: &mut App, area: Rect) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (side, rect) in [(Side::Left, panes[0]), (Side::Right, panes[1])] {
        let focused = app.selection.focused_pane() == side;
        app.tree_views[side.index()] =
            draw_tree(frame, app.selection.pane(side), side, focused, rect);
    }
}

fn draw_tree(
    frame: &mut Frame,
    pane: &PaneState,
    side: Side,
    focused: bool,
    area: Rect,
) -> TreeView {
    let rows = pane.tree.rows();
    let selected = pane
        .current
        .and_then(|current| rows.iter().position(|row| row.id == current));

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let text = format!("{}{}", "  ".repeat(row.depth), row.text);
            if row.selectable {
                ListItem::new(text)
            } else {
                ListItem::new(text).style(Style::default().fg(Color::Gray))
            }
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default()
        .title(format!(" Select {} secret to compare ", side.label()))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);

    TreeView {
        area: inner,
        offset: state.offset(),
    }
}

fn draw_diff(frame: &mut Frame, diff: &mut DiffPage, area: Rect) {
    let mut lines: Vec<Line> = diff
        .report
        .failures
        .iter()
        .map(|failure| {
            Line::from(Span::styled(
                failure.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    lines.extend(diff_lines(&diff.report.body));

    let block = Block::default()
        .title(format!(" {} ", diff.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    // Scrolling counts wrapped rows, so the range comes from the inner width.
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    diff.sync_viewport(paragraph.line_count(inner.width), usize::from(inner.height));

    let paragraph = paragraph
        .block(block)
        .scroll((diff.scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

fn diff_lines(body: &DiffBody) -> Vec<Line<'static>> {
    match body {
        DiffBody::Equal => vec![Line::from(Span::styled(
            EQUAL_MESSAGE,
            Style::default().fg(Color::Green),
        ))],
        DiffBody::Lines(lines) => lines
            .iter()
            .map(|line| Line::from(Span::styled(line.text.clone(), line_style(line.kind))))
            .collect(),
    }
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Addition => Style::default().fg(Color::Green),
        LineKind::Deletion => Style::default().fg(Color::Red),
        LineKind::HunkHeader => Style::default().fg(Color::Cyan),
        LineKind::Context => Style::default(),
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let text = Line::from(vec![
        Span::styled(
            format!(" {} ", app.pages.top().title().to_uppercase()),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "mode:{}  focus:{}",
                app.selection.mode().label(),
                app.selection.focused_pane().label()
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(app.status.clone(), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled("? help", Style::default().fg(Color::Gray)),
    ]);

    let paragraph = Paragraph::new(text).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(
                    format!("{keys:<12}"),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*description),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightBlue)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
