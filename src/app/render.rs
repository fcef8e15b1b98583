//! 终端渲染：侧边栏 + 编辑器分栏 + 聊天/终端占位 + 状态栏

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use super::workbench::Workbench;
use crate::kernel::{EditorLayoutStore, EditorPane, SplitDirection};

const STATUS_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;
const CHAT_WIDTH: u16 = 32;
const PANEL_PERCENT: u16 = 30;

pub fn render(frame: &mut Frame, workbench: &Workbench) {
    let [body, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)]).areas(frame.area());

    let ui = workbench.ui();
    let (main, panel) = if ui.terminal_visible() {
        let [main, panel] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Percentage(PANEL_PERCENT),
        ])
        .areas(body);
        (main, Some(panel))
    } else {
        (body, None)
    };

    let mut constraints = Vec::with_capacity(3);
    if ui.sidebar_visible() {
        constraints.push(Constraint::Length(SIDEBAR_WIDTH));
    }
    constraints.push(Constraint::Min(0));
    if ui.chat_visible() {
        constraints.push(Constraint::Length(CHAT_WIDTH));
    }
    let columns = Layout::horizontal(constraints).split(main);

    let store = workbench.store();
    let mut column = columns.iter().copied();
    if ui.sidebar_visible() {
        if let Some(area) = column.next() {
            render_sidebar(frame, area, &store);
        }
    }
    if let Some(area) = column.next() {
        render_editor_panes(frame, area, &store);
    }
    if let Some(area) = column.next() {
        let block = Block::bordered().title(" Chat ");
        frame.render_widget(Paragraph::new("No conversation yet.").block(block), area);
    }

    if let Some(area) = panel {
        let border = if ui.terminal_focused() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered().title(" Terminal ").border_style(border);
        frame.render_widget(Paragraph::new("$").block(block), area);
    }

    render_status(frame, status, workbench, &store);
}

fn render_sidebar(frame: &mut Frame, area: Rect, store: &EditorLayoutStore) {
    let mut lines = Vec::new();
    for pane in store.panes() {
        lines.push(Line::from(Span::styled(
            pane.id.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
        for tab in &pane.tabs {
            let style = if pane.active_tab == Some(tab.id) {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!("  {}", tab.title()), style)));
        }
    }

    let block = Block::bordered().title(" Open Editors ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// `Vertical` 分屏让窗格左右并排，对应 ratatui 的水平布局
fn render_editor_panes(frame: &mut Frame, area: Rect, store: &EditorLayoutStore) {
    let direction = match store.direction() {
        SplitDirection::Vertical => Direction::Horizontal,
        SplitDirection::Horizontal => Direction::Vertical,
    };
    let constraints = store.sizes().iter().map(|size| Constraint::Fill(weight(*size)));
    let areas = Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(area);

    let active = store.active_pane_id();
    for (pane, area) in store.panes().zip(areas.iter()) {
        render_pane(frame, *area, pane, pane.id == active);
    }
}

fn weight(size: f32) -> u16 {
    (size * 100.0).round().clamp(1.0, f32::from(u16::MAX)) as u16
}

fn render_pane(frame: &mut Frame, area: Rect, pane: &EditorPane, is_active: bool) {
    let mut title = Vec::with_capacity(pane.tabs.len());
    for tab in &pane.tabs {
        let style = if pane.active_tab == Some(tab.id) {
            Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default()
        };
        title.push(Span::styled(format!(" {} ", tab.title()), style));
    }

    let border = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::bordered().title(Line::from(title)).border_style(border);

    let body = match pane.active_tab() {
        Some(tab) => Paragraph::new(tab.content.as_str()),
        None => Paragraph::new("Open a file to start editing")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(body.block(block), area);
}

fn render_status(frame: &mut Frame, area: Rect, workbench: &Workbench, store: &EditorLayoutStore) {
    let file = store
        .active_tab()
        .map(|tab| tab.title())
        .unwrap_or_else(|| "No file".to_string());
    let mut text = format!(
        "{} | {} | {} pane(s)",
        file,
        store.active_pane_id(),
        store.pane_count()
    );
    if let Some(first) = workbench.pending_chord() {
        text.push_str(&format!(" | ({}) was pressed. Waiting for second key...", first));
    }
    frame.render_widget(Paragraph::new(text), area);
}
