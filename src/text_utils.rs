use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::escape::escape;
use regex::RegexBuilder;

use crate::content::ContentBlock;

const ELLIPSIS: char = '…';

/// Parses a publication timestamp. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// (optionally with fraction) and plain `YYYY-MM-DD` dates, all taken as UTC.
pub fn parse_timestamp(buf: &str) -> Option<DateTime<Utc>> {
    let buf = buf.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(buf) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(buf, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(buf, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// `January 5, 2024`
pub fn format_long_date(date_time: &DateTime<Utc>) -> String {
    date_time.format("%B %-d, %Y").to_string()
}

pub fn format_optional_date(date_time: Option<&DateTime<Utc>>) -> String {
    date_time.map(format_long_date).unwrap_or_default()
}

/// Shortens `text` to at most `max_len` characters plus an ellipsis,
/// cutting at the last whitespace so no word is split. Without whitespace
/// the text is cut hard at `max_len`.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_len).collect();
    let mut res = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    };
    res.push(ELLIPSIS);
    res
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub is_match: bool,
}

/// Splits `text` around every case-insensitive occurrence of `query`.
/// Concatenating the segments gives back `text`.
pub fn highlight(text: &str, query: &str) -> Vec<Segment> {
    let whole = || vec![Segment { text: text.to_string(), is_match: false }];
    if query.is_empty() || text.is_empty() {
        return whole();
    }

    let Ok(re) = RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build() else {
        return whole();
    };

    let mut segments = vec![];
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            segments.push(Segment { text: text[last..m.start()].to_string(), is_match: false });
        }
        segments.push(Segment { text: m.as_str().to_string(), is_match: true });
        last = m.end();
    }
    if last < text.len() || segments.is_empty() {
        segments.push(Segment { text: text[last..].to_string(), is_match: false });
    }
    segments
}

/// Escaped HTML for highlighted segments, matches wrapped in `<mark>`.
pub fn segments_to_html(segments: &[Segment]) -> String {
    let mut res = String::new();
    for segment in segments {
        if segment.is_match {
            res.push_str("<mark class=\"highlight\">");
            res.push_str(&escape(segment.text.as_str()));
            res.push_str("</mark>");
        } else {
            res.push_str(&escape(segment.text.as_str()));
        }
    }
    res
}

/// Short description taken from the first text block of a body.
pub fn excerpt_from_body(body: &[ContentBlock], length: usize, fallback: &str) -> String {
    let text: String = body.iter()
        .find_map(ContentBlock::as_text)
        .and_then(|block| block.spans.first())
        .map(|span| span.text.chars().take(length).collect())
        .unwrap_or_default();

    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
