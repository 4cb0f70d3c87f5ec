//! RSS 2.0 feeds: publisher feeds and Google-News style aggregator feeds.
//!
//! Each `<item>` becomes one [`RawRecord`]. Items without a title or link are
//! skipped. The outlet comes from `<source>`, then `<author>`/`<dc:creator>`,
//! then the channel title. Aggregators append `" - {outlet}"` to headlines;
//! that suffix is removed when it matches the outlet.

use crate::error::{DigestError, Result};
use crate::models::{PublishedRaw, RawRecord};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use scraper::Html;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Description,
    Source,
    Author,
    Content,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"title" => Field::Title,
            b"link" => Field::Link,
            b"pubDate" | b"dc:date" | b"updated" | b"published" => Field::Published,
            b"description" | b"summary" => Field::Description,
            b"source" => Field::Source,
            b"author" | b"dc:creator" => Field::Author,
            b"content:encoded" => Field::Content,
            _ => return None,
        })
    }
}

#[derive(Debug, Default)]
struct FeedItem {
    title: String,
    link: String,
    published: String,
    description: String,
    source: String,
    author: String,
    content: String,
}

impl FeedItem {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Published => &mut self.published,
            Field::Description => &mut self.description,
            Field::Source => &mut self.source,
            Field::Author => &mut self.author,
            Field::Content => &mut self.content,
        };
        if slot.is_empty() {
            *slot = value;
        }
    }

    fn into_record(self, channel_title: &str) -> Option<RawRecord> {
        let title = collapse_whitespace(&self.title);
        let link = self.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        let source = [&self.source, &self.author]
            .into_iter()
            .map(|s| collapse_whitespace(s))
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| collapse_whitespace(channel_title));
        let title = strip_source_suffix(&title, &source);

        let mut record = RawRecord::new(title, link)
            .with_source(source)
            .with_snippet(plain_text(&self.description));
        if !self.published.trim().is_empty() {
            record = record.with_published(PublishedRaw::Text(self.published.trim().to_string()));
        }
        if !self.content.trim().is_empty() {
            record = record.with_body(self.content);
        }
        Some(record)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `"렌즈 행사 개최 - 연합뉴스"` with outlet `연합뉴스` becomes `"렌즈 행사 개최"`.
pub fn strip_source_suffix(title: &str, source: &str) -> String {
    if source.is_empty() {
        return title.to_string();
    }
    title
        .strip_suffix(source)
        .and_then(|rest| rest.strip_suffix(" - ").or_else(|| rest.strip_suffix(" | ")))
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(title)
        .to_string()
}

/// Text content of an HTML fragment, whitespace collapsed.
pub fn plain_text(fragment: &str) -> String {
    if !fragment.contains('<') {
        return collapse_whitespace(fragment);
    }
    let html = Html::parse_fragment(fragment);
    collapse_whitespace(&html.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Parse one RSS document. `origin` only labels errors and logs.
pub fn parse_feed(xml: &str, origin: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut channel_title = String::new();
    let mut item: Option<FeedItem> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();
    let mut skipped = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    item = Some(FeedItem::default());
                    field = None;
                }
                name => {
                    field = Field::from_tag(name);
                    text.clear();
                }
            },
            Ok(Event::Text(t)) if field.is_some() => {
                let decoded = t.decode().map_err(|e| DigestError::feed(origin, e.to_string()))?;
                text.push_str(&decoded);
            }
            Ok(Event::CData(c)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::GeneralRef(r)) if field.is_some() => match r.resolve_char_ref() {
                Ok(Some(ch)) => text.push(ch),
                _ => {
                    let name = r.decode().map_err(|e| DigestError::feed(origin, e.to_string()))?;
                    match resolve_predefined_entity(&name) {
                        Some(value) => text.push_str(value),
                        None => {
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    }
                }
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => {
                    if let Some(done) = item.take() {
                        match done.into_record(&channel_title) {
                            Some(record) => records.push(record),
                            None => skipped += 1,
                        }
                    }
                    field = None;
                }
                name => {
                    if let Some(current) = field.filter(|f| Field::from_tag(name) == Some(*f)) {
                        let value = std::mem::take(&mut text);
                        match item.as_mut() {
                            Some(open) => open.set(current, value),
                            None if current == Field::Title && channel_title.is_empty() => {
                                channel_title = value.trim().to_string();
                            }
                            None => {}
                        }
                    }
                    field = None;
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DigestError::feed(
                    origin,
                    format!("malformed XML at byte {}: {e}", reader.buffer_position()),
                ));
            }
            _ => {}
        }
    }

    debug!(
        origin,
        channel = %channel_title,
        items = records.len(),
        skipped,
        "Parsed RSS feed"
    );
    Ok(records)
}
