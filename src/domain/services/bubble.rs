#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use super::markup_lines;
use super::text_lines;
use super::MarkupLine;
use crate::domain::models::Bubble;

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

/// Draws a single chat bubble as bordered terminal lines.
pub struct BubbleFrame<'a> {
    alignment: BubbleAlignment,
    bubble: &'a Bubble,
    label: &'a str,
    window_max_width: usize,
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
}

fn text_width(text: &str) -> usize {
    return Span::raw(text).width();
}

fn fill(text: &str, total: usize, used: &[usize]) -> String {
    let used: usize = used.iter().sum();
    return text.repeat(total.saturating_sub(used));
}

/// Greedy word wrap that keeps each word's style. Words longer than a full
/// row are split wherever they overflow.
fn wrap_spans(line: MarkupLine, max_width: usize) -> Vec<MarkupLine> {
    let mut rows = vec![];
    let mut row: MarkupLine = vec![];
    let mut row_width = 0;

    for span in line {
        let style = span.style;
        for (idx, word) in span.content.split(' ').enumerate() {
            let mut piece = word.to_string();
            if idx > 0 {
                piece = format!(" {word}");
            }

            let mut width = text_width(&piece);
            if row_width > 0 && row_width + width > max_width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
                piece = piece.trim_start().to_string();
                width = text_width(&piece);
            }

            if width <= max_width {
                row_width += width;
                row.push(Span::styled(piece, style));
                continue;
            }

            let mut chunk = String::new();
            for ch in piece.chars() {
                let ch_width = text_width(&ch.to_string());
                if row_width + ch_width > max_width && row_width > 0 {
                    row.push(Span::styled(std::mem::take(&mut chunk), style));
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                chunk.push(ch);
                row_width += ch_width;
            }
            row.push(Span::styled(chunk, style));
        }
    }

    rows.push(row);
    return rows;
}

impl<'a> BubbleFrame<'a> {
    pub fn new(
        bubble: &'a Bubble,
        alignment: BubbleAlignment,
        label: &'a str,
        window_max_width: usize,
    ) -> BubbleFrame<'a> {
        return BubbleFrame {
            alignment,
            bubble,
            label,
            window_max_width,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // Unicode character border + padding.
            bubble_padding: 8,
            // left border + left padding + (text, not counted) + right padding + right border +
            // scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
        };
    }

    fn content(&self) -> Vec<MarkupLine> {
        match self.bubble {
            Bubble::User(text) => return text_lines(text, Style::default()),
            Bubble::Assistant { markup, .. } => return markup_lines(markup),
            Bubble::Notice(text) => {
                return text_lines(text, Style::default().add_modifier(Modifier::ITALIC));
            }
            Bubble::Error(text) => return text_lines(text, Style::default().fg(Color::Red)),
        }
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let content = self.content();
        let max_line_length = self.get_max_line_length(&content);

        let mut lines = vec![];
        for line in content {
            for row in wrap_spans(line, max_line_length) {
                lines.push(self.spans_to_line(row, max_line_length));
            }
        }

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn spans_to_line(&self, mut spans: MarkupLine, max_line_length: usize) -> Line<'static> {
        let line_width: usize = spans.iter().map(|e| return e.width()).sum();
        let fill_text = fill(" ", max_line_length, &[line_width]);
        let formatted_line_length =
            line_width + fill_text.len() + BubbleFrame::style_config().bubble_padding;

        let mut wrapped_spans = vec![self.highlight_span("│ ".to_string())];
        wrapped_spans.append(&mut spans);
        wrapped_spans.push(self.highlight_span(format!("{fill_text} │")));

        let outer_bubble_padding = fill(" ", self.window_max_width, &[formatted_line_length]);

        if self.alignment == BubbleAlignment::Left {
            wrapped_spans.push(Span::from(outer_bubble_padding));
            return Line::from(wrapped_spans);
        }

        let mut line_spans = vec![Span::from(outer_bubble_padding)];
        line_spans.extend(wrapped_spans);

        return Line::from(line_spans);
    }

    fn get_max_line_length(&self, content: &[MarkupLine]) -> usize {
        let style_config = BubbleFrame::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil()) as usize;

        // Border elements + minimum bubble padding.
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;

        let mut max_line_length = content
            .iter()
            .map(|line| return line.iter().map(|e| return e.width()).sum::<usize>())
            .max()
            .unwrap_or(0);

        let available = self.window_max_width.saturating_sub(line_border_width);
        if max_line_length > available {
            max_line_length = available;
        }

        let label_width = text_width(self.label);
        if max_line_length < label_width {
            max_line_length = label_width;
        }

        return max_line_length.max(1);
    }

    fn wrap_lines_in_bubble(
        &self,
        lines: Vec<Line<'static>>,
        max_line_length: usize,
    ) -> Vec<Line<'static>> {
        // Add 2 for the vertical bars.
        let inner_bar = "─".repeat(max_line_length + 2);
        let label_bar = fill("─", max_line_length + 2, &[text_width(self.label)]);
        let top_bar = format!("╭{}{label_bar}╮", self.label);
        let bottom_bar = format!("╰{inner_bar}╯");
        let bar_bubble_padding = fill(
            " ",
            self.window_max_width,
            &[max_line_length, BubbleFrame::style_config().bubble_padding],
        );

        if self.alignment == BubbleAlignment::Left {
            let mut res = vec![self.highlight_line(format!("{top_bar}{bar_bubble_padding}"))];
            res.extend(lines);
            res.push(self.highlight_line(format!("{bottom_bar}{bar_bubble_padding}")));
            return res;
        }

        let mut res = vec![self.highlight_line(format!("{bar_bubble_padding}{top_bar}"))];
        res.extend(lines);
        res.push(self.highlight_line(format!("{bar_bubble_padding}{bottom_bar}")));
        return res;
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        match self.bubble {
            Bubble::Error(_) => return Span::styled(text, Style::default().fg(Color::Red)),
            Bubble::Assistant { .. } | Bubble::Notice(_) => {
                // Film reel gold.
                return Span::styled(text, Style::default().fg(Color::Rgb(212, 160, 23)));
            }
            Bubble::User(_) => return Span::from(text),
        }
    }

    fn highlight_line(&self, text: String) -> Line<'static> {
        return Line::from(self.highlight_span(text));
    }
}
