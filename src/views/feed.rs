use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::help::feed_help;
use crate::keys::full_keymap;
use crate::list::{PLACEHOLDER_ROWS, TaggedItem};
use crate::source::Post;
use crate::theme::ResolvedTheme;
use crate::time::format_relative;
use crate::views::spinner::spinner_frame;
use crate::views::status_bar::StatusBar;
use crate::widgets::positioned_list::{PositionedItem, PositionedList, PositionedListState};

/// Everything an item renderer may depend on besides the item.
pub struct ItemContext<'a> {
    pub theme: &'a ResolvedTheme,
    pub now: DateTime<Utc>,
    pub width: u16,
}

/// Turns an item into terminal lines. The line count is the item's height,
/// so a renderer must give the same count for the same item and width.
pub type ItemRenderer = fn(&TaggedItem<Post>, &ItemContext<'_>) -> Vec<Line<'static>>;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(0),    // Items
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    render_items(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

/// Default renderer: title, byline, then the wrapped body if there is one.
pub fn post_lines(item: &TaggedItem<Post>, ctx: &ItemContext<'_>) -> Vec<Line<'static>> {
    let post = &item.data;
    let theme = ctx.theme;
    let wrap_width = usize::from(ctx.width.saturating_sub(2)).max(1);

    let mut lines: Vec<Line<'static>> = textwrap::wrap(&post.title, wrap_width)
        .into_iter()
        .map(|part| Line::from(Span::styled(format!(" {part}"), theme.title_style())))
        .collect();

    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("▲ {}", post.score),
            Style::default().fg(theme.post_score),
        ),
        Span::styled(" · ", theme.dim_style()),
        Span::styled(post.author.clone(), Style::default().fg(theme.post_author)),
        Span::styled(" · ", theme.dim_style()),
        Span::styled(
            format_relative(post.time, ctx.now),
            Style::default().fg(theme.post_time),
        ),
        Span::styled(format!(" · #{}", post.id), theme.dim_style()),
    ]));

    if let Some(body) = &post.body {
        let body_style = Style::default().fg(theme.post_body);
        for paragraph in body.lines() {
            lines.extend(
                textwrap::wrap(paragraph, wrap_width)
                    .into_iter()
                    .map(|part| Line::from(Span::styled(format!(" {part}"), body_style))),
            );
        }
    }
    lines
}

pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let pagination = app.list.pagination();
    let mut spans = vec![
        Span::styled(
            format!(" {} items", app.list.items().len()),
            Style::default().fg(theme.foreground),
        ),
        Span::styled(
            format!(" · {} mounted", app.list.mounted_count()),
            theme.dim_style(),
        ),
        Span::styled(
            format!(" · page {}", pagination.current_page),
            theme.dim_style(),
        ),
    ];
    if app.should_show_spinner() {
        spans.push(Span::raw(" · "));
        spans.push(Span::styled(
            format!("{} loading...", spinner_frame(app.loading_start)),
            theme.spinner_style(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_items(frame: &mut Frame, app: &App, area: Rect) {
    let ctx = app.item_context(area.width);
    let layout = app.list.layout();

    let mut items: Vec<PositionedItem> = app
        .list
        .mounted()
        .filter_map(|item| {
            let top = layout.get(item.slot)?.top?;
            Some(PositionedItem::new(top, (app.render_item)(item, &ctx)))
        })
        .collect();
    items.push(PositionedItem::new(
        app.list.sentinel().top,
        sentinel_lines(app, area.width),
    ));

    let mut state = PositionedListState::new(app.scroll_top);
    frame.render_stateful_widget(PositionedList::new(items), area, &mut state);
}

/// What sits at the sentinel: the end label, the last error, or the
/// loading placeholder. Always `app.list.sentinel_rows()` lines.
pub fn sentinel_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let theme = &app.theme;
    let config = app.list.config();

    if app.list.pagination().exhausted {
        let label = &config.end_of_list_label;
        let pad = usize::from(width).saturating_sub(label.width()) / 2;
        return vec![Line::from(Span::styled(
            format!("{}{label}", " ".repeat(pad)),
            theme.dim_style(),
        ))];
    }
    if let Some(err) = app.list.error() {
        return vec![
            Line::from(Span::styled(format!(" {err}"), theme.error_style())),
            Line::from(Span::styled(" press r to retry", theme.dim_style())),
        ];
    }
    if config.show_loading_placeholder {
        let usable = usize::from(width.saturating_sub(2));
        return [60, 90, 40]
            .into_iter()
            .take(PLACEHOLDER_ROWS as usize)
            .map(|percent| {
                let bar = "░".repeat(usable * percent / 100);
                Line::from(Span::styled(format!(" {bar}"), theme.skeleton_style()))
            })
            .collect();
    }
    vec![Line::from(Span::styled(" …", theme.dim_style()))]
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = feed_help().format(&full_keymap(), app.show_help);
    let spinner = format!("{} Loading...", spinner_frame(app.loading_start));

    let mut bar = StatusBar::new(&app.theme)
        .label(&app.title)
        .position(
            app.scroll_top as usize + 1,
            app.list.content_height() as usize,
        )
        .help(&help_text);
    if app.should_show_spinner() {
        bar = bar.loading(&spinner);
    }
    bar.render(frame, area);
}
