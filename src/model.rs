use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel an occurrence airs on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Channel {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Facebook {
    pub og_image_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TwitterImages {
    pub mini_avatar_url: String,
    pub normal_avatar_url: String,
    pub bigger_avatar_url: String,
    pub original_avatar_url: String,
    pub image_url: String,
}

/// Display images for a work. `recommended_url` is the one shown in
/// notifications; the rest are platform-specific variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Images {
    pub recommended_url: String,
    pub facebook: Facebook,
    pub twitter: TwitterImages,
}

/// The parent creative work an occurrence belongs to.
///
/// Most of the external-link fields can be null in the live API, so they are
/// `Option<String>` here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Work {
    pub id: u64,
    pub title: String,
    pub title_kana: String,
    pub media: String,
    pub media_text: String,
    pub season_name: Option<String>,
    pub season_name_text: Option<String>,
    pub released_on: Option<String>,
    pub released_on_about: Option<String>,
    pub official_site_url: Option<String>,
    pub wikipedia_url: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_hashtag: Option<String>,
    pub syobocal_tid: Option<String>,
    pub mal_anime_id: Option<String>,
    pub images: Images,
    pub episodes_count: u32,
    pub watchers_count: u32,
}

/// Episode data attached to an occurrence. An occurrence without an episode
/// is never notifiable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Episode {
    pub id: u64,
    pub number: Option<i64>,
    pub number_text: String,
    pub sort_number: i64,
    pub title: Option<String>,
    pub records_count: u32,
    pub record_comments_count: u32,
}

/// One scheduled broadcast occurrence, as returned by the schedule API.
/// Constructed fresh each run and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Program {
    pub id: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub is_rebroadcast: bool,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub work: Work,
    #[serde(default)]
    pub episode: Option<Episode>,
}

/// Paged envelope around `/v1/me/programs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgramsResponse {
    pub programs: Vec<Program>,
    pub total_count: u64,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}
