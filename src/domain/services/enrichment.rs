#[cfg(test)]
#[path = "enrichment_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Captures;
use regex::Regex;

use crate::domain::models::MovieId;

static TRAILER_MARKER: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"\[SHOW_TRAILER:[A-Za-z]?(\d+)\]").expect("Invalid trailer marker regex");
});

static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"^(\d+)\.\s(.+)$").expect("Invalid ordered item regex");
});

static TAG: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

static CONTRACTION: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"['’](?:s|t|re|ve|ll|d)\b|n['’]t\b").expect("Invalid contraction regex");
});

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"[\x{1F300}-\x{1F6FF}\x{1F900}-\x{1F9FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]")
        .expect("Invalid emoji regex");
});

/// Quoted phrases, capitalised titles followed by a year, or multi word
/// capitalised titles after a film emoji. Lowercase connectives are allowed
/// between capitalised words so "The Lord of the Rings" stays whole.
static MOVIE_MENTION: Lazy<Regex> = Lazy::new(|| {
    let connective = r"(?:of|the|a|an|and|in|on|at|to|for|with|from|or)";
    let first = r"[A-Z][A-Za-z0-9&:\-]*";
    let next = format!(r"[ \t]+(?:{connective}[ \t]+)*[A-Z0-9][A-Za-z0-9&:\-]*");
    let pattern = format!(
        r#""(?P<quoted>[^"\n]+)"|(?:🎬[ \t]+)?\b(?P<titled>{first}(?:{next})*)[ \t]+\((?P<year>\d{{4}})\)|🎬[ \t]+(?P<emoji>{first}(?:{next})+)"#
    );
    return Regex::new(&pattern).expect("Invalid movie mention regex");
});

const DISAMBIGUATION_MARKER: &str = "<div class='disambiguation-request'>";
const FILM_EMOJI: &str = "🎬";
const DIRECTOR_EMOJI: &str = "🎮";

/// Lookup data used while enriching replies. Loaded from the enrichment file
/// when one is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichmentTables {
    /// Lowercase title to id, checked in order.
    pub movies: Vec<(String, MovieId)>,
    pub directors: Vec<String>,
    pub featured_movie: MovieId,
    pub featured_phrases: Vec<String>,
    /// Replies containing this text are the backend echoing its own
    /// instructions and are never persisted.
    pub system_preamble: String,
}

impl Default for EnrichmentTables {
    fn default() -> EnrichmentTables {
        let movies = [
            ("barbie", "346698"),
            ("oppenheimer", "872585"),
            ("dune", "438631"),
            ("dune part two", "693134"),
            ("the batman", "414906"),
            ("inception", "27205"),
            ("interstellar", "157336"),
            ("the dark knight", "155"),
        ]
        .iter()
        .map(|(title, id)| return (title.to_string(), MovieId::new(id)))
        .collect();

        let directors = [
            "Christopher Nolan",
            "Steven Spielberg",
            "Quentin Tarantino",
            "Martin Scorsese",
            "Francis Ford Coppola",
            "Stanley Kubrick",
            "James Cameron",
            "Ridley Scott",
            "Tim Burton",
            "David Fincher",
        ]
        .iter()
        .map(|e| return e.to_string())
        .collect();

        return EnrichmentTables {
            movies,
            directors,
            featured_movie: MovieId::new("346698"),
            featured_phrases: vec!["Barbie (2023)".to_string(), "barbie movie".to_string()],
            system_preamble: "You are FilmSage, an intelligent movie recommendation assistant"
                .to_string(),
        };
    }
}

fn toml_id(item: &toml_edit::Item) -> Option<MovieId> {
    if let Some(num) = item.as_integer() {
        return Some(MovieId::new(&num.to_string()));
    }

    return item.as_str().map(MovieId::new);
}

fn toml_strings(item: &toml_edit::Item) -> Option<Vec<String>> {
    let array = item.as_array()?;
    return Some(
        array
            .iter()
            .filter_map(|e| return e.as_str().map(|s| return s.to_string()))
            .collect(),
    );
}

impl EnrichmentTables {
    /// Keys missing from the document keep their built in values.
    pub fn from_toml(toml_str: &str) -> Result<EnrichmentTables> {
        let doc = toml_str.parse::<toml_edit::Document>()?;
        let mut tables = EnrichmentTables::default();

        if let Some(movies) = doc.get("movies") {
            let Some(table) = movies.as_table_like() else {
                bail!("Enrichment file key 'movies' must be a table of title = id");
            };

            let mut parsed = vec![];
            for (title, id) in table.iter() {
                let Some(movie_id) = toml_id(id) else {
                    bail!(format!("Enrichment file has an invalid id for movie '{title}'"));
                };
                parsed.push((title.to_lowercase(), movie_id));
            }
            tables.movies = parsed;
        }

        if let Some(directors) = doc.get("directors") {
            let Some(names) = toml_strings(directors) else {
                bail!("Enrichment file key 'directors' must be an array of names");
            };
            tables.directors = names;
        }

        if let Some(featured) = doc.get("featured-movie") {
            let Some(movie_id) = toml_id(featured) else {
                bail!("Enrichment file key 'featured-movie' must be a movie id");
            };
            tables.featured_movie = movie_id;
        }

        if let Some(phrases) = doc.get("featured-phrases") {
            let Some(parsed) = toml_strings(phrases) else {
                bail!("Enrichment file key 'featured-phrases' must be an array of phrases");
            };
            tables.featured_phrases = parsed;
        }

        if let Some(preamble) = doc.get("system-preamble") {
            let Some(text) = preamble.as_str() else {
                bail!("Enrichment file key 'system-preamble' must be a string");
            };
            tables.system_preamble = text.to_string();
        }

        return Ok(tables);
    }
}

/// Result of enriching one reply. The caller owns the conversation state and
/// applies `movie_id` and `featured_mentioned` to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enrichment {
    pub html: String,
    pub movie_id: Option<MovieId>,
    pub featured_mentioned: bool,
}

pub struct Enricher {
    tables: EnrichmentTables,
    directors: Vec<(String, Regex)>,
    direct_buttons: bool,
}

impl Default for Enricher {
    fn default() -> Enricher {
        return Enricher::new(EnrichmentTables::default(), false)
            .expect("Built in enrichment tables are valid");
    }
}

impl Enricher {
    pub fn new(tables: EnrichmentTables, direct_buttons: bool) -> Result<Enricher> {
        let mut directors = vec![];
        for name in tables.directors.iter() {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(name)))?;
            directors.push((name.to_string(), re));
        }

        return Ok(Enricher {
            tables,
            directors,
            direct_buttons,
        });
    }

    pub fn tables(&self) -> &EnrichmentTables {
        return &self.tables;
    }

    /// Turns raw assistant text into display markup. `featured_mentioned` is
    /// whether an earlier reply in the conversation mentioned the featured
    /// movie.
    pub fn enrich(&self, raw: &str, featured_mentioned: bool) -> Enrichment {
        let mut res = Enrichment {
            html: raw.to_string(),
            movie_id: None,
            featured_mentioned,
        };

        if raw.is_empty() {
            return res;
        }

        if let Some(caps) = TRAILER_MARKER.captures(raw) {
            let movie_id = self.resolve_trailer_id(raw, &caps[1], featured_mentioned);
            let marker = caps[0].to_string();
            res.html = raw.replacen(&marker, &self.trailer_prompt(&movie_id), 1);
            res.movie_id = Some(movie_id);
            return res;
        }

        if self.mentions_featured(raw) {
            tracing::debug!(movie_id = %self.tables.featured_movie, "Featured movie mentioned");
            res.featured_mentioned = true;
            res.movie_id = Some(self.tables.featured_movie.clone());
        }

        if raw.contains(DISAMBIGUATION_MARKER) {
            return res;
        }

        let mut text = raw.to_string();
        if text.contains("• ") && !text.contains("<ul>") {
            text = bullet_lists(&text);
        }
        if !text.contains("<ol") {
            text = ordered_lists(&text);
        }
        if !text.contains("movie-mention") {
            text = map_text_segments(&text, highlight_movies);
        }
        if !text.contains("director-mention") {
            text = map_text_segments(&text, |segment| return self.highlight_directors(segment));
        }
        if !text.contains("<p>") {
            text = paragraphs(&text);
        }
        text = text.replace('\n', "<br>");
        res.html = wrap_emoji(&text);

        return res;
    }

    fn resolve_trailer_id(&self, raw: &str, marker_id: &str, featured_mentioned: bool) -> MovieId {
        let lowered = raw.to_lowercase();
        let mut movie_id = MovieId::new(marker_id);

        if let Some((title, known_id)) = self
            .tables
            .movies
            .iter()
            .find(|(title, _)| return lowered.contains(title.as_str()))
        {
            tracing::debug!(
                title = title.as_str(),
                marker_id,
                known_id = %known_id,
                "Overriding trailer id with known title"
            );
            movie_id = known_id.clone();
        }

        if featured_mentioned && movie_id != self.tables.featured_movie {
            tracing::debug!(movie_id = %movie_id, "Featured movie flag overrides trailer id");
            movie_id = self.tables.featured_movie.clone();
        }

        return movie_id;
    }

    fn trailer_prompt(&self, movie_id: &MovieId) -> String {
        if self.direct_buttons {
            return format!(
                r#"<div class="movie-action-container"><button class="view-details-btn" data-movie-id="{movie_id}">VIEW DETAILS</button></div>"#
            );
        }

        return r#"<div class="movie-action-prompt">A trailer is available for this movie. You can say "show me the trailer" or "show details" to view it.</div>"#.to_string();
    }

    fn mentions_featured(&self, raw: &str) -> bool {
        let lowered = raw.to_lowercase();
        return self
            .tables
            .featured_phrases
            .iter()
            .any(|phrase| return lowered.contains(&phrase.to_lowercase()));
    }

    fn highlight_directors(&self, segment: &str) -> String {
        let mut text = segment.to_string();
        for (name, re) in self.directors.iter() {
            let replacement =
                format!(r#"{DIRECTOR_EMOJI} <span class="director-mention">{name}</span>"#);
            text = re
                .replace_all(&text, regex::NoExpand(&replacement))
                .to_string();
        }

        return text;
    }
}

fn bullet_lists(text: &str) -> String {
    let mut lines: Vec<String> = vec![];
    let mut open: Option<String> = None;

    for line in text.split('\n') {
        if let Some(item) = line.trim().strip_prefix("• ") {
            open.get_or_insert_with(|| return "<ul>".to_string())
                .push_str(&format!("<li>{item}</li>"));
            continue;
        }

        if let Some(list) = open.take() {
            lines.push(format!("{list}</ul>"));
        }
        lines.push(line.to_string());
    }

    if let Some(list) = open.take() {
        lines.push(format!("{list}</ul>"));
    }

    return lines.join("\n");
}

/// Consecutive numbers continue a list, any other number starts a new list
/// at that offset.
fn ordered_lists(text: &str) -> String {
    let mut lines: Vec<String> = vec![];
    let mut open: Option<(String, u64)> = None;

    for line in text.split('\n') {
        let item = ORDERED_ITEM.captures(line.trim()).and_then(|caps| {
            let number = caps[1].parse::<u64>().ok()?;
            return Some((number, caps[2].to_string()));
        });

        let Some((number, content)) = item else {
            if let Some((list, _)) = open.take() {
                lines.push(format!("{list}</ol>"));
            }
            lines.push(line.to_string());
            continue;
        };

        match open.take() {
            Some((mut list, last)) if last.checked_add(1) == Some(number) => {
                list.push_str(&format!("<li>{content}</li>"));
                open = Some((list, number));
            }
            previous => {
                if let Some((list, _)) = previous {
                    lines.push(format!("{list}</ol>"));
                }
                open = Some((format!(r#"<ol start="{number}"><li>{content}</li>"#), number));
            }
        }
    }

    if let Some((list, _)) = open.take() {
        lines.push(format!("{list}</ol>"));
    }

    return lines.join("\n");
}

/// Applies `f` to the text between tags, leaving the tags themselves alone.
fn map_text_segments<F: Fn(&str) -> String>(html: &str, f: F) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for tag in TAG.find_iter(html) {
        out.push_str(&f(&html[last..tag.start()]));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&f(&html[last..]));

    return out;
}

fn highlight_movies(segment: &str) -> String {
    return MOVIE_MENTION
        .replace_all(segment, |caps: &Captures| {
            let full = caps[0].to_string();
            if CONTRACTION.is_match(&full) {
                return full;
            }

            if let Some(title) = caps.name("quoted") {
                return format!(
                    r#"{FILM_EMOJI} <span class="movie-mention">{}</span>"#,
                    title.as_str()
                );
            }

            if let (Some(title), Some(year)) = (caps.name("titled"), caps.name("year")) {
                if title.as_str().chars().count() < 3 {
                    return full;
                }
                return format!(
                    r#"{FILM_EMOJI} <span class="movie-mention">{} ({})</span>"#,
                    title.as_str(),
                    year.as_str()
                );
            }

            if let Some(title) = caps.name("emoji") {
                return format!(
                    r#"{FILM_EMOJI} <span class="movie-mention">{}</span>"#,
                    title.as_str()
                );
            }

            return full;
        })
        .to_string();
}

fn paragraphs(text: &str) -> String {
    let blocks = text.split("\n\n").collect::<Vec<&str>>();
    if blocks.len() < 2 {
        return text.to_string();
    }

    return blocks
        .iter()
        .map(|block| {
            if block.trim().is_empty() {
                return "".to_string();
            }
            return format!("<p>{block}</p>");
        })
        .collect::<Vec<String>>()
        .join("");
}

fn wrap_emoji(text: &str) -> String {
    return EMOJI
        .replace_all(text, r#"<span class="emoji">$0</span>"#)
        .to_string();
}
