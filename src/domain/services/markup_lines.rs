#[cfg(test)]
#[path = "markup_lines_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"<(/?)([a-zA-Z]+)([^>]*)>").expect("Invalid tag regex");
});

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r#"class=["']([^"']*)["']"#).expect("Invalid class regex");
});

static START_ATTR: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r#"start=["']?(\d+)"#).expect("Invalid start regex");
});

enum ListKind {
    Bullet,
    Ordered(u64),
}

/// One logical line of styled text, before any wrapping.
pub type MarkupLine = Vec<Span<'static>>;

pub fn movie_style() -> Style {
    return Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
}

pub fn director_style() -> Style {
    return Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::ITALIC);
}

pub fn prompt_style() -> Style {
    return Style::default().fg(Color::Magenta);
}

fn unescape(text: &str) -> String {
    return text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");
}

struct LineBuilder {
    lines: Vec<MarkupLine>,
    current: MarkupLine,
    styles: Vec<Style>,
    lists: Vec<ListKind>,
}

impl LineBuilder {
    fn style(&self) -> Style {
        return self.styles.last().copied().unwrap_or_default();
    }

    fn push_text(&mut self, text: &str) {
        let text = unescape(text);
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), self.style()));
            }
            if parts.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push(line);
    }

    /// Ends the current line only if something was written to it.
    fn end_line(&mut self) {
        if !self.current.is_empty() {
            self.break_line();
        }
    }

    fn blank_line(&mut self) {
        self.end_line();
        if matches!(self.lines.last(), Some(line) if !line.is_empty()) {
            self.lines.push(vec![]);
        }
    }

    fn push_style(&mut self, style: Style) {
        let patched = self.style().patch(style);
        self.styles.push(patched);
    }

    fn list_item(&mut self) {
        self.end_line();
        let prefix = match self.lists.last_mut() {
            Some(ListKind::Ordered(next)) => {
                let prefix = format!("{next}. ");
                *next += 1;
                prefix
            }
            _ => "• ".to_string(),
        };
        self.current.push(Span::styled(prefix, self.style()));
    }

    fn open_tag(&mut self, name: &str, attrs: &str) {
        let class = CLASS_ATTR
            .captures(attrs)
            .map(|caps| return caps[1].to_string())
            .unwrap_or_default();

        match name {
            "br" => self.break_line(),
            "p" => self.blank_line(),
            "ul" => {
                self.end_line();
                self.lists.push(ListKind::Bullet);
            }
            "ol" => {
                self.end_line();
                let start = START_ATTR
                    .captures(attrs)
                    .and_then(|caps| return caps[1].parse::<u64>().ok())
                    .unwrap_or(1);
                self.lists.push(ListKind::Ordered(start));
            }
            "li" => self.list_item(),
            "span" => {
                let style = match class.as_str() {
                    "movie-mention" => movie_style(),
                    "director-mention" => director_style(),
                    _ => Style::default(),
                };
                self.push_style(style);
            }
            "div" => {
                self.end_line();
                if class.starts_with("movie-action") {
                    self.push_style(prompt_style());
                } else {
                    self.push_style(Style::default());
                }
            }
            "button" => {
                self.push_style(prompt_style().add_modifier(Modifier::REVERSED));
                self.current.push(Span::styled("[ ".to_string(), self.style()));
            }
            _ => {}
        }
    }

    fn close_tag(&mut self, name: &str) {
        match name {
            "p" => self.blank_line(),
            "ul" | "ol" => {
                self.end_line();
                self.lists.pop();
            }
            "li" => self.end_line(),
            "span" => {
                self.styles.pop();
            }
            "div" => {
                self.end_line();
                self.styles.pop();
            }
            "button" => {
                self.current.push(Span::styled(" ]".to_string(), self.style()));
                self.styles.pop();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<MarkupLine> {
        self.end_line();
        while matches!(self.lines.last(), Some(line) if line.is_empty()) {
            self.lines.pop();
        }
        return self.lines;
    }
}

/// Converts enriched reply markup into styled terminal lines. Mentions keep
/// their highlight, list items get their bullet or number back, and tags
/// the terminal has no use for are dropped.
pub fn markup_lines(markup: &str) -> Vec<MarkupLine> {
    let mut builder = LineBuilder {
        lines: vec![],
        current: vec![],
        styles: vec![],
        lists: vec![],
    };

    let mut last = 0;
    for caps in TAG.captures_iter(markup) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        builder.push_text(&markup[last..tag.start()]);
        last = tag.end();

        let name = caps[2].to_lowercase();
        if &caps[1] == "/" {
            builder.close_tag(&name);
        } else {
            builder.open_tag(&name, &caps[3]);
        }
    }
    builder.push_text(&markup[last..]);

    return builder.finish();
}

/// Plain text split into unstyled lines.
pub fn text_lines(text: &str, style: Style) -> Vec<MarkupLine> {
    return text
        .lines()
        .map(|line| return vec![Span::styled(line.to_string(), style)])
        .collect();
}
