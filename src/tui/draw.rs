//! Rendering for the three views.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::chart::{Surface, format_day_number};
use crate::domain::{Horizon, INSTRUMENTS, Instrument, Mode};
use crate::report::{self, amount_label, proceeds_preview, year_span};
use crate::session::bonds::ListState as BondListState;
use crate::theme::Palette;

use super::{App, Field, Input, View};

impl App {
    pub(super) fn draw(&mut self, frame: &mut Frame<'_>) {
        let p = self.theme.palette();
        let size = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().fg(p.text).bg(p.background)),
            size,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0], p);
        match self.view {
            View::Bonds => self.draw_bonds(frame, chunks[1], p),
            View::Analyzer => self.draw_analyzer(frame, chunks[1], p),
            View::Market => self.draw_market(frame, chunks[1], p),
        }
        self.draw_footer(frame, chunks[2], p);

        if self.view == View::Analyzer {
            if let Some(message) = self.analysis.failure() {
                draw_notice(frame, size, message, p);
            }
        }
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect, p: Palette) {
        let mut spans = vec![
            Span::styled("prism", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::styled("  green bond client  ", Style::default().fg(p.muted)),
        ];
        for (i, view) in View::ALL.into_iter().enumerate() {
            let label = format!(" {} {} ", i + 1, view.title());
            let style = if view == self.view {
                Style::default().fg(p.accent).bg(p.highlight).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.muted)
            };
            spans.push(Span::styled(label, style));
        }
        spans.push(Span::styled(
            format!("  theme: {}", self.theme.theme()),
            Style::default().fg(p.muted),
        ));

        let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(p.border));
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn draw_bonds(&self, frame: &mut Frame<'_>, area: Rect, p: Palette) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)])
            .split(cols[0]);

        let editing = self.input == Input::Editing(Field::Search);
        let query = self.bonds.query();
        let search = if query.is_empty() && !editing {
            Paragraph::new("/ to search issuer, bond id, ISIN").style(Style::default().fg(p.muted))
        } else {
            Paragraph::new(edit_line(query, editing))
        };
        frame.render_widget(search.block(titled("Search", editing, p)), left[0]);

        let visible = self.bonds.visible();
        let summary = match self.bonds.list_state() {
            BondListState::Idle | BondListState::Loading => "Loading bonds...".to_string(),
            BondListState::Unavailable(reason) => format!("Bonds unavailable: {reason}"),
            BondListState::Ready => visible.summary(),
        };
        frame.render_widget(
            Paragraph::new(summary).style(Style::default().fg(p.muted)),
            left[1],
        );

        let selected = self.bonds.selected();
        let items: Vec<ListItem> = visible
            .shown
            .iter()
            .map(|b| {
                let marker = if selected == Some(b.id.as_str()) { "● " } else { "  " };
                let head = Line::from(vec![
                    Span::styled(format!("{marker}{}", b.issuer_name), Style::default().fg(p.text)),
                    Span::styled(
                        format!("  {}  {}  {}", b.currency, year_span(b), amount_label(b)),
                        Style::default().fg(p.muted),
                    ),
                ]);
                let preview = Line::styled(
                    format!("  {}", proceeds_preview(&b.use_of_proceeds)),
                    Style::default().fg(p.muted),
                );
                ListItem::new(Text::from(vec![head, preview]))
            })
            .collect();

        let list = List::new(items)
            .block(titled("Bonds", false, p))
            .highlight_style(Style::default().bg(p.highlight).add_modifier(Modifier::BOLD))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if !visible.shown.is_empty() {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, left[2], &mut state);

        let title = format!("Detail | impact mode: {}", self.bonds.impact_mode().display_name());
        let body = if self.bonds.selected().is_none() {
            Text::styled("Select a bond with Enter.", Style::default().fg(p.muted))
        } else if let Some(err) = self.bonds.detail_error() {
            Text::styled(format!("Bond detail not available: {err}"), Style::default().fg(p.warn))
        } else if let Some(detail) = self.bonds.detail() {
            let impact = self.bonds.impact();
            Text::from(report::format_bond_detail(
                detail,
                self.bonds.impact_mode(),
                impact.as_ref(),
            ))
        } else {
            Text::styled("Loading bond detail...", Style::default().fg(p.warn))
        };
        frame.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(Block::default().title(title).borders(Borders::ALL).border_style(Style::default().fg(p.border))),
            cols[1],
        );
    }

    fn draw_analyzer(&self, frame: &mut Frame<'_>, area: Rect, p: Palette) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let editing_text = self.input == Input::Editing(Field::Text);
        let text = if self.analysis.text().is_empty() && !editing_text {
            Paragraph::new("Paste disclosure text here... (i to edit)").style(Style::default().fg(p.muted))
        } else {
            Paragraph::new(edit_line(self.analysis.text(), editing_text)).wrap(Wrap { trim: false })
        };
        frame.render_widget(text.block(titled("Disclosure text", editing_text, p)), rows[0]);

        let controls = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);

        let editing_claimed = self.input == Input::Editing(Field::Claimed);
        frame.render_widget(
            Paragraph::new(edit_line(self.analysis.claimed_input(), editing_claimed))
                .block(titled("Claimed tons CO₂ (c)", editing_claimed, p)),
            controls[0],
        );

        frame.render_widget(
            Paragraph::new(mode_chips(self.analysis.mode(), p)).block(titled("Mode (m)", false, p)),
            controls[1],
        );

        let (label, style) = if self.analysis.is_loading() {
            ("Analyzing...", Style::default().fg(p.warn))
        } else if self.analysis.can_submit() {
            ("Run Analysis (Enter)", Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
        } else {
            ("Run Analysis", Style::default().fg(p.muted))
        };
        frame.render_widget(
            Paragraph::new(label).style(style).alignment(Alignment::Center).block(titled("", false, p)),
            controls[2],
        );

        let body = match self.analysis.result() {
            Some(result) => Text::from(report::format_analysis(result)),
            None if self.analysis.is_loading() => Text::styled("Analyzing...", Style::default().fg(p.warn)),
            None => Text::styled("No analysis yet.", Style::default().fg(p.muted)),
        };
        frame.render_widget(
            Paragraph::new(body).wrap(Wrap { trim: false }).block(titled("Analysis Results", false, p)),
            rows[2],
        );
    }

    fn draw_market(&mut self, frame: &mut Frame<'_>, area: Rect, p: Palette) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(6), Constraint::Min(0)])
            .split(area);

        let key = self.market_key.clone();
        let mut chips = Vec::new();
        for inst in INSTRUMENTS {
            chips.push(chip(inst.id.to_uppercase(), inst.id == key.instrument, p));
            chips.push(Span::raw(" "));
        }
        chips.push(Span::styled("  |  ", Style::default().fg(p.muted)));
        for h in Horizon::ALL {
            chips.push(chip(h.label().to_string(), h == key.horizon, p));
            chips.push(Span::raw(" "));
        }
        frame.render_widget(
            Paragraph::new(Line::from(chips)).block(titled("Instrument (i) | Range (←/→)", false, p)),
            rows[0],
        );

        let mut lines: Vec<Line> = Vec::new();
        if !self.market.is_series_loading() {
            for line in report::returns_lines(key.horizon, &self.market.returns()) {
                lines.push(Line::raw(line));
            }
        }
        for line in report::summary_lines(self.market.summary()) {
            lines.push(Line::raw(line));
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(titled("Returns", false, p)),
            rows[1],
        );

        let label = Instrument::find(&key.instrument)
            .map(|i| i.label)
            .unwrap_or(key.instrument.as_str());
        let block = titled(&format!("{label} | {}", key.horizon.label()), false, p);
        let inner = block.inner(rows[2]);
        frame.render_widget(block, rows[2]);
        frame.render_widget(Clear, inner);

        let (chart_rect, insets) = chart_layout(inner);
        self.chart.mount(Surface::new(chart_rect.width, chart_rect.height, self.theme.theme()));
        self.chart_margin = Some(frame.area().width.saturating_sub(chart_rect.width));

        let placeholder = if self.market.is_series_loading() {
            Some("Loading market data...")
        } else if self.market.prices().is_empty() {
            Some("Market data not available yet.")
        } else {
            None
        };
        if let Some(msg) = placeholder {
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(p.warn)), inner);
            return;
        }

        let Some(renderer) = self.chart.renderer() else {
            return;
        };
        frame.render_widget(renderer, chart_rect);
        if let (Some(insets), Some(xb), Some(yb)) = (insets, renderer.x_bounds(), renderer.y_bounds()) {
            draw_axis_ticks(frame, inner, chart_rect, insets, xb, yb, p);
        }
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect, p: Palette) {
        let help = match (self.input, self.view) {
            (Input::Editing(_), _) => "type to edit  Backspace delete  Enter/Esc done",
            (_, View::Bonds) => "↑/↓ move  Enter select  Esc clear  / search  m mode  r reload  Tab view  t theme  q quit",
            (_, View::Analyzer) => "i edit text  c claimed  m mode  Enter run  Tab view  t theme  q quit",
            (_, View::Market) => "i instrument  ←/→ range  Tab view  t theme  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(p.muted)),
            Span::raw(" | "),
            Span::styled(self.status.as_str(), Style::default().fg(p.warn)),
        ]);
        let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(p.border));
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

fn titled(title: &str, active: bool, p: Palette) -> Block<'static> {
    let border = if active { p.accent } else { p.border };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn edit_line(value: &str, editing: bool) -> String {
    if editing { format!("{value}▏") } else { value.to_string() }
}

fn chip(label: String, active: bool, p: Palette) -> Span<'static> {
    let style = if active {
        Style::default().fg(p.accent).bg(p.highlight).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(p.muted)
    };
    Span::styled(format!(" {label} "), style)
}

fn mode_chips(current: Mode, p: Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for mode in Mode::ALL {
        spans.push(chip(mode.display_name().to_string(), mode == current, p));
    }
    Line::from(spans)
}

fn draw_notice(frame: &mut Frame<'_>, area: Rect, message: &str, p: Palette) {
    let width = (area.width * 3 / 5).max(30).min(area.width);
    let height = 5.min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, rect);
    let text = Text::from(vec![
        Line::raw(message.to_string()),
        Line::styled("Press x to dismiss.", Style::default().fg(p.muted)),
    ]);
    let block = Block::default()
        .title("Analysis failed")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.warn))
        .style(Style::default().bg(p.background));
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), rect);
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Date ticks under the chart and price ticks to its left.
fn draw_axis_ticks(
    frame: &mut Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    p: Palette,
) {
    let ticks = 4usize;
    let style = Style::default().fg(p.muted);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format_day_number(x_val);
        let label_len = label.chars().count() as u16;
        let start = x.saturating_sub(label_len / 2).max(inner.x);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height || start + label_len > inner.x + inner.width {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..5usize {
        let u = i as f64 / 4.0;
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.2}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }
}
