use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(theme.border_style());

    let mut lines = vec![state_line(app)];

    // Running tasks
    let task_count = app.debug.running_tasks.len();
    lines.push(Line::from(vec![
        Span::styled("Tasks: ", theme.dim_style()),
        Span::styled(
            task_count.to_string(),
            Style::default().fg(if task_count > 0 {
                theme.post_score
            } else {
                theme.foreground
            }),
        ),
    ]));

    for task in &app.debug.running_tasks {
        let elapsed = task.started_at.elapsed();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}] ", task.id), theme.dim_style()),
            Span::styled(&task.description, Style::default().fg(theme.foreground)),
            Span::styled(
                format!(" ({:.1?})", elapsed),
                Style::default().fg(theme.post_time),
            ),
        ]));
    }

    // Recent log entries, newest first. 4 rows go to the border, state and tasks header.
    let available_lines = area.height.saturating_sub(4) as usize;
    let log_lines = available_lines.saturating_sub(app.debug.running_tasks.len());

    for entry in app.debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(Span::styled(
            format!("  {}", entry.message),
            theme.dim_style(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

/// One-line summary of the list engine.
fn state_line(app: &App) -> Line<'static> {
    let theme = &app.theme;
    let list = &app.list;
    let pagination = list.pagination();
    let flags = match (pagination.is_loading, pagination.exhausted, list.error()) {
        (_, true, _) => "exhausted",
        (true, _, _) => "loading",
        (_, _, Some(_)) => "errored",
        _ => "idle",
    };
    let layout = if list.layout().is_settled() {
        "settled"
    } else {
        "measuring"
    };
    Line::from(vec![
        Span::styled("List: ", theme.dim_style()),
        Span::styled(
            format!(
                "page {} {flags} · trigger {:?} · {} items, {} mounted · {layout} · top {} / {} rows · sentinel {}",
                pagination.current_page,
                list.trigger_state(),
                list.items().len(),
                list.mounted_count(),
                app.scroll_top,
                list.content_height(),
                list.sentinel().top,
            ),
            Style::default().fg(theme.foreground),
        ),
    ])
}
