//! Channel Atom feed client.
//!
//! `GET {base}/feeds/videos.xml?channel_id=<id>` returns the latest uploads
//! and scheduled broadcasts of a channel as an Atom document with `yt:` and
//! `media:` extensions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::{debug, warn};

use super::FeedSource;
use crate::database::time::parse_rfc3339;
use crate::domain::FeedAnnouncement;
use crate::{Error, Result};

pub const DEFAULT_FEED_BASE_URL: &str = "https://www.youtube.com";

/// Fields of one `<entry>` as they appear in the document.
#[derive(Debug, Default)]
struct RawEntry {
    video_id: String,
    channel_id: String,
    title: String,
    description: String,
    published: String,
    updated: String,
}

impl RawEntry {
    fn field_mut(&mut self, tag: &str) -> Option<&mut String> {
        match tag {
            "yt:videoId" => Some(&mut self.video_id),
            "yt:channelId" => Some(&mut self.channel_id),
            "title" => Some(&mut self.title),
            "media:description" => Some(&mut self.description),
            "published" => Some(&mut self.published),
            "updated" => Some(&mut self.updated),
            _ => None,
        }
    }

    fn into_announcement(self, fallback_channel_id: &str) -> Result<FeedAnnouncement> {
        if self.video_id.is_empty() {
            return Err(Error::item_parse("feed entry without yt:videoId"));
        }
        let channel_id = if self.channel_id.is_empty() {
            fallback_channel_id.to_string()
        } else {
            self.channel_id
        };

        Ok(FeedAnnouncement {
            published_at: parse_rfc3339(&self.published)?,
            updated_at: parse_rfc3339(&self.updated)?,
            channel_id,
            source_id: self.video_id,
            title: self.title,
            description: self.description,
        })
    }
}

/// Parse a channel feed, keeping entries updated strictly after `watermark`.
///
/// Malformed entries are skipped; a malformed document is an upstream error.
pub fn parse_feed(
    xml: &str,
    channel_id: &str,
    watermark: DateTime<Utc>,
) -> Result<Vec<FeedAnnouncement>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut announcements = Vec::new();
    let mut entry: Option<RawEntry> = None;
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" {
                    entry = Some(RawEntry::default());
                } else if entry.is_some() {
                    current_tag = Some(tag);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(raw), Some(tag)) = (entry.as_mut(), current_tag.as_deref())
                    && let Some(field) = raw.field_mut(tag)
                {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::upstream("feed", format!("bad text: {}", err)))?;
                    field.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" {
                    if let Some(raw) = entry.take() {
                        match raw.into_announcement(channel_id) {
                            Ok(announcement) if announcement.updated_at > watermark => {
                                announcements.push(announcement)
                            }
                            Ok(announcement) => debug!(
                                source_id = %announcement.source_id,
                                "Feed entry not newer than watermark"
                            ),
                            Err(e) => warn!(channel_id, "Skipping feed entry: {}", e),
                        }
                    }
                    current_tag = None;
                } else if current_tag.as_deref() == Some(tag.as_str()) {
                    current_tag = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::upstream(
                    "feed",
                    format!(
                        "malformed feed for {} at position {}: {}",
                        channel_id,
                        reader.error_position(),
                        e
                    ),
                ));
            }
            _ => {}
        }
    }

    Ok(announcements)
}

/// Atom feed client.
#[derive(Debug, Clone)]
pub struct YouTubeFeedClient {
    client: Client,
    base_url: String,
}

impl YouTubeFeedClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for YouTubeFeedClient {
    async fn fetch_announcements(
        &self,
        channel_id: &str,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FeedAnnouncement>> {
        let url = format!("{}/feeds/videos.xml", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("channel_id", channel_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                "feed",
                format!("GET {} for {} returned {}", url, channel_id, status),
            ));
        }

        let body = response.text().await?;
        let announcements = parse_feed(&body, channel_id, watermark)?;
        debug!(
            channel_id,
            count = announcements.len(),
            "Fetched feed announcements"
        );
        Ok(announcements)
    }
}
