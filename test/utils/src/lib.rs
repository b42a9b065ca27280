/// An assistant reply exercising most of the enrichment rules: a paragraph
/// break, a bullet list, a titled year mention and a director name.
pub fn assistant_reply_fixture() -> &'static str {
    return r#"
Here are a few picks for tonight.

• Inception (2010) bends dreams into a heist.
• Interstellar (2014) goes further out.

Both were directed by Christopher Nolan.
"#
    .trim();
}

/// Same reply shape the backend uses when it can offer a trailer.
pub fn trailer_reply_fixture() -> &'static str {
    return "Oppenheimer is a great pick! [SHOW_TRAILER:t872585] Enjoy the film.";
}

/// JSON payload returned by `GET /api/chat/conversations`, unsorted on
/// purpose so callers have to order it themselves.
pub fn conversation_list_fixture() -> &'static str {
    return r#"[
  {
    "id": 3,
    "title": "Space movies",
    "preview": "Something like Interstellar?",
    "createdAt": "2024-03-01T10:00:00",
    "updatedAt": "2024-03-01T10:05:00"
  },
  {
    "id": 7,
    "title": null,
    "preview": null,
    "createdAt": "2024-03-02T09:00:00",
    "updatedAt": "2024-03-04T18:30:00"
  },
  {
    "id": 5,
    "title": "Nolan marathon",
    "preview": "Rank the Nolan films",
    "createdAt": "2024-03-02T08:00:00",
    "updatedAt": "2024-03-03T12:00:00"
  }
]"#;
}
