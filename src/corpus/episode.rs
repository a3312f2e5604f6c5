//! Podcast episodes as they come from the feed, and their display form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::corpus::Candidate;

/// Host that relative episode URLs are served from.
pub const PODCAST_HOST: &str = "https://podcasts.muslimcentral.com/";

const UNKNOWN: &str = "Unknown";
const UNKNOWN_DURATION: &str = "Unknown Duration";
const UNKNOWN_SIZE: &str = "Unknown Size";

/// An episode record in the feed's own field names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEpisode {
    pub episode_title: Option<String>,
    #[serde(rename = "episodeURL")]
    pub episode_url: Option<String>,
    pub episode_date: Option<String>,
    pub episode_duration: Option<String>,
    pub episode_size: Option<String>,
    pub post_link: Option<String>,
}

impl RawEpisode {
    /// Does this JSON record use the feed's field names?
    #[must_use]
    pub fn looks_like(record: &Value) -> bool {
        record
            .as_object()
            .is_some_and(|fields| fields.contains_key("episodeTitle") || fields.contains_key("episodeURL"))
    }
}

/// An episode ready to be searched and displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub title: String,
    pub duration: String,
    pub size: String,
    pub date: String,
    pub url: Option<String>,
    pub post_link: Option<String>,
    pub formatted_title: String,
    pub download_link: Option<String>,
}

impl Episode {
    /// Fill in fallbacks for missing fields and resolve the download URL.
    #[must_use]
    pub fn prepare(raw: RawEpisode) -> Self {
        let title = required(raw.episode_title, "episodeTitle");
        let date = required(raw.episode_date, "episodeDate");
        let url = present(raw.episode_url).map(|path| format!("{PODCAST_HOST}{path}"));
        if url.is_none() {
            warn!(property = "episodeURL", "Missing episode property, no download link");
        }

        let duration = present(raw.episode_duration).unwrap_or_else(|| UNKNOWN_DURATION.to_string());
        let size = present(raw.episode_size).unwrap_or_else(|| UNKNOWN_SIZE.to_string());
        let formatted_title = format!("{title} ({duration})");

        Self {
            formatted_title,
            title,
            duration,
            size,
            date,
            download_link: url.clone(),
            url,
            post_link: present(raw.post_link),
        }
    }

    #[must_use]
    pub fn into_candidate(self) -> Candidate {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(self.title));
        fields.insert("duration".into(), Value::String(self.duration));
        fields.insert("size".into(), Value::String(self.size));
        fields.insert("date".into(), Value::String(self.date));
        fields.insert("url".into(), optional(self.url));
        fields.insert("postLink".into(), optional(self.post_link));
        fields.insert("formattedTitle".into(), Value::String(self.formatted_title));
        fields.insert("downloadLink".into(), optional(self.download_link));
        Candidate::new(fields)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn required(value: Option<String>, property: &str) -> String {
    present(value).unwrap_or_else(|| {
        warn!(property, "Missing episode property, using fallback");
        UNKNOWN.to_string()
    })
}

fn optional(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}
