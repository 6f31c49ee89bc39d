use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::links::LinkSpan;
use crate::reader::PageLines;
use crate::session::NavigationContext;
use crate::theme::Base16Palette;

/// The reading panel: consumes a rendered page into scrollable lines and
/// turns the navigation marker spans into styled, clickable regions.
pub struct TextReader {
    lines: Vec<String>,
    /// `(line index, span)` pairs found by the active registration.
    link_spans: Vec<(usize, LinkSpan)>,
    scroll_offset: usize,
    visible_height: usize,
    last_inner_area: Option<Rect>,
    title: String,
    content_margin: u16,
}

impl Default for TextReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextReader {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            link_spans: Vec::new(),
            scroll_offset: 0,
            visible_height: 0,
            last_inner_area: None,
            title: String::new(),
            content_margin: 0,
        }
    }

    /// Consume a page into the panel. Consuming the iterator to completion is
    /// what fires the page's render signals; the caller handles those.
    pub fn set_page(&mut self, page: PageLines, context: &NavigationContext) {
        self.lines = page.collect();
        self.link_spans = self
            .lines
            .iter()
            .enumerate()
            .flat_map(|(index, line)| {
                context
                    .scan(line)
                    .into_iter()
                    .map(move |span| (index, span))
            })
            .collect();
        self.title = context.entry.name.clone();
        self.scroll_offset = 0;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.link_spans.clear();
        self.scroll_offset = 0;
        self.title.clear();
    }

    pub fn has_content(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn link_spans(&self) -> &[(usize, LinkSpan)] {
        &self.link_spans
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn half_page(&self) -> usize {
        (self.visible_height / 2).max(1)
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_height.max(1))
    }

    pub fn set_margin(&mut self, margin: u16) {
        self.content_margin = margin.min(20);
    }

    /// Map a terminal click to the link span under it, if any.
    pub fn span_at(&self, column: u16, row: u16) -> Option<LinkSpan> {
        let inner = self.last_inner_area?;
        if column < inner.x
            || column >= inner.x + inner.width
            || row < inner.y
            || row >= inner.y + inner.height
        {
            return None;
        }
        let line_index = self.scroll_offset + (row - inner.y) as usize;
        // Markers are ASCII, so byte offsets equal display columns.
        let text_column = (column - inner.x) as usize;
        self.link_spans
            .iter()
            .find(|(index, span)| {
                *index == line_index
                    && text_column >= span.start
                    && text_column < span.start + span.len
            })
            .map(|(_, span)| *span)
    }

    fn progress(&self) -> u32 {
        if self.lines.is_empty() {
            return 0;
        }
        let visible_end = (self.scroll_offset + self.visible_height).min(self.lines.len());
        ((visible_end as f32 / self.lines.len() as f32) * 100.0) as u32
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        palette: &Base16Palette,
        is_focused: bool,
    ) {
        let (border_fg, title_fg, _bg) = palette.get_panel_colors(is_focused);

        let title = if self.title.is_empty() {
            " Reader ".to_string()
        } else {
            format!(" {} ", self.title)
        };
        let progress = self.progress();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(Line::from(format!(" {progress}% ")).right_aligned())
            .border_style(Style::default().fg(border_fg))
            .title_style(Style::default().fg(title_fg));

        let mut inner_area = block.inner(area);
        let margin = self.content_margin * 2;
        inner_area.x = inner_area.x.saturating_add(margin);
        inner_area.width = inner_area.width.saturating_sub(margin * 2);
        self.visible_height = inner_area.height as usize;
        self.last_inner_area = Some(inner_area);

        frame.render_widget(&block, area);

        let end = (self.scroll_offset + self.visible_height).min(self.lines.len());
        let visible: Vec<Line> = (self.scroll_offset..end)
            .map(|index| self.styled_line(index, palette))
            .collect();

        let paragraph = Paragraph::new(visible).block(Block::default().borders(Borders::NONE));
        frame.render_widget(paragraph, inner_area);
    }

    /// Style one rendered line, splitting out marker spans as link-styled
    /// segments.
    fn styled_line(&self, index: usize, palette: &Base16Palette) -> Line<'static> {
        let text = &self.lines[index];
        let spans_here: Vec<LinkSpan> = self
            .link_spans
            .iter()
            .filter(|(line_index, _)| *line_index == index)
            .map(|(_, span)| *span)
            .collect();

        if spans_here.is_empty() {
            return Line::from(Span::styled(
                text.clone(),
                Style::default().fg(palette.base_05),
            ));
        }

        let text_style = Style::default().fg(palette.base_05);
        let link_style = Style::default()
            .fg(palette.base_0d)
            .add_modifier(Modifier::UNDERLINED);

        let mut segments = Vec::new();
        let mut cursor = 0;
        for span in spans_here {
            if span.start > cursor {
                segments.push(Span::styled(text[cursor..span.start].to_string(), text_style));
            }
            segments.push(Span::styled(
                text[span.start..span.start + span.len].to_string(),
                link_style,
            ));
            cursor = span.start + span.len;
        }
        if cursor < text.len() {
            segments.push(Span::styled(text[cursor..].to_string(), text_style));
        }
        Line::from(segments)
    }
}
