use std::collections::HashMap;

use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::chat_markup::thinking_text;
use super::BubbleAlignment;
use super::BubbleFrame;
use super::ChatScreen;
use crate::domain::models::Bubble;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

pub const ASSISTANT_LABEL: &str = "FilmSage";

pub struct BubbleList {
    cache: HashMap<usize, Vec<Line<'static>>>,
    indicator: Vec<Line<'static>>,
    revision: u64,
    line_width: usize,
    lines_len: usize,
    username: String,
}

impl BubbleList {
    pub fn new(username: &str) -> BubbleList {
        return BubbleList {
            cache: HashMap::new(),
            indicator: vec![],
            revision: 0,
            line_width: 0,
            lines_len: 0,
            username: username.to_string(),
        };
    }

    fn bubble_lines(&self, bubble: &Bubble, line_width: usize) -> Vec<Line<'static>> {
        if let Bubble::User(_) = bubble {
            return BubbleFrame::new(bubble, BubbleAlignment::Right, &self.username, line_width)
                .as_lines();
        }

        return BubbleFrame::new(bubble, BubbleAlignment::Left, ASSISTANT_LABEL, line_width)
            .as_lines();
    }

    /// Bubbles only ever get appended until the transcript is cleared, so
    /// rendered lines are cached per index for the current revision.
    pub fn set_screen(&mut self, screen: &ChatScreen, line_width: usize) {
        if self.line_width != line_width || self.revision != screen.revision() {
            self.cache.clear();
            self.line_width = line_width;
            self.revision = screen.revision();
        }

        for (idx, bubble) in screen.bubbles().iter().enumerate() {
            if self.cache.contains_key(&idx) {
                continue;
            }
            let lines = self.bubble_lines(bubble, line_width);
            self.cache.insert(idx, lines);
        }

        let notice = if screen.is_loading() {
            Some(Bubble::Notice("Loading conversation...".to_string()))
        } else {
            screen
                .typing()
                .map(|secs| return Bubble::Notice(thinking_text(secs)))
        };
        self.indicator = notice
            .map(|bubble| return self.bubble_lines(&bubble, line_width))
            .unwrap_or_default();

        self.lines_len = self.cache.values().map(|e| return e.len()).sum::<usize>()
            + self.indicator.len();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render(&self, frame: &mut Frame, rect: Rect, scroll: usize) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'static>> = indexes
            .iter()
            .filter_map(|idx| return self.cache.get(idx))
            .flatten()
            .chain(self.indicator.iter())
            .cloned()
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
            rect,
        );
    }
}
