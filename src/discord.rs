use crate::model::Program;
use async_trait::async_trait;
use chrono::FixedOffset;
use futures::future::join_all;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("discord error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to reach discord: {0}")]
    Http(#[from] reqwest::Error),
}

/// Destination endpoint for one notification per matched occurrence.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, program: &Program) -> Result<(), DispatchError>;
}

/// Discord webhook sink. The work's title and display image ride along as a
/// per-message sender identity override.
#[derive(Clone)]
pub struct WebhookClient {
    http: Client,
    url: Url,
    offset: FixedOffset,
}

impl fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Webhook URLs embed a secret token; never print them.
        f.debug_struct("WebhookClient")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl WebhookClient {
    pub fn new(url: Url, offset: FixedOffset) -> Self {
        let http = Client::builder()
            .user_agent("annict-notify/0.1")
            .build()
            .expect("reqwest client");
        Self { http, url, offset }
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn notify(&self, program: &Program) -> Result<(), DispatchError> {
        let payload = build_webhook_payload(program, self.offset);
        debug!(program_id = program.id, "sending webhook notification");
        let res = self.http.post(self.url.clone()).json(&payload).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DispatchError::Status { status, body });
        }
        Ok(())
    }
}

/// Send one notification per item. Sends are issued concurrently and each
/// failure is logged and dropped, so no single item can abort its siblings.
/// Returns how many notifications were delivered.
pub async fn dispatch_all(notifier: &dyn Notifier, programs: &[Program]) -> usize {
    let sends = programs.iter().map(|program| async move {
        match notifier.notify(program).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, program_id = program.id, "failed to deliver notification");
                false
            }
        }
    });
    join_all(sends)
        .await
        .into_iter()
        .filter(|delivered| *delivered)
        .count()
}

fn field(name: &str, value: String) -> Value {
    json!({ "name": name, "value": value, "inline": false })
}

// Discord rejects embed fields with empty values.
fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn or_dash_fmt(value: Option<&str>, render: impl FnOnce(&str) -> String) -> String {
    match value {
        Some(v) if !v.is_empty() => render(v),
        _ => "-".to_string(),
    }
}

/// Render the webhook message for one occurrence.
///
/// The field order and labels are the observable message contract and are
/// kept byte-for-byte, doubled-t Twitter labels included.
pub fn build_webhook_payload(program: &Program, offset: FixedOffset) -> Value {
    let work = &program.work;
    let title = match &program.episode {
        Some(episode) => format!(
            "{} {} {}",
            work.title,
            episode.number_text,
            or_dash(episode.title.as_deref())
        ),
        None => work.title.clone(),
    };
    let started = program
        .started_at
        .with_timezone(&offset)
        .format("%Y/%m/%d %H:%M")
        .to_string();

    let fields = vec![
        field("チャンネル", program.channel.name.clone()),
        field("放送開始時間", started),
        field("時期", or_dash(work.season_name_text.as_deref())),
        field(
            "Twittter ハッシュタグ",
            or_dash_fmt(work.twitter_hashtag.as_deref(), |tag| format!("#{tag}")),
        ),
        field(
            "Twittter",
            or_dash_fmt(work.twitter_username.as_deref(), |name| {
                format!("https://twitter.com/{name}")
            }),
        ),
        field("公式サイト", or_dash(work.official_site_url.as_deref())),
        field(
            "しょぼいカレンダー",
            or_dash_fmt(work.syobocal_tid.as_deref(), |tid| {
                format!("http://cal.syoboi.jp/tid/{tid}")
            }),
        ),
        field(
            "MyAnimeList",
            or_dash_fmt(work.mal_anime_id.as_deref(), |id| {
                format!("https://myanimelist.net/anime/{id}")
            }),
        ),
        field(
            "再放送",
            if program.is_rebroadcast { "はい" } else { "いいえ" }.to_string(),
        ),
    ];

    json!({
        "username": work.title,
        "avatar_url": work.images.recommended_url,
        "embeds": [{
            "title": title,
            "image": { "url": work.images.recommended_url },
            "fields": fields,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Channel, Episode, Images, Work};
    use chrono::{TimeZone, Utc};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn sample_program() -> Program {
        Program {
            id: 1,
            // 15:00 UTC is 翌日 00:00 JST.
            started_at: Utc.with_ymd_and_hms(2024, 1, 4, 15, 0, 0).unwrap(),
            is_rebroadcast: false,
            channel: Channel {
                id: 2,
                name: "TOKYO MX".into(),
            },
            work: Work {
                id: 4168,
                title: "ゆるキャン△".into(),
                season_name_text: Some("2018年冬".into()),
                official_site_url: Some("https://yurucamp.jp/".into()),
                twitter_username: Some("yurucamp_anime".into()),
                twitter_hashtag: Some("yurucamp".into()),
                syobocal_tid: Some("4727".into()),
                mal_anime_id: Some("34798".into()),
                images: Images {
                    recommended_url: "https://example.com/rec.jpg".into(),
                    ..Default::default()
                },
                ..Default::default()
            },
            episode: Some(Episode {
                id: 75_451,
                number: Some(1),
                number_text: "第1話".into(),
                sort_number: 10,
                title: Some("ふじさんとカレーめん".into()),
                records_count: 0,
                record_comments_count: 0,
            }),
        }
    }

    #[test]
    fn payload_has_identity_override_and_title() {
        let payload = build_webhook_payload(&sample_program(), jst());
        assert_eq!(payload["username"], "ゆるキャン△");
        assert_eq!(payload["avatar_url"], "https://example.com/rec.jpg");
        assert_eq!(
            payload["embeds"][0]["title"],
            "ゆるキャン△ 第1話 ふじさんとカレーめん"
        );
        assert_eq!(
            payload["embeds"][0]["image"]["url"],
            "https://example.com/rec.jpg"
        );
    }

    #[test]
    fn payload_fields_keep_documented_order_and_labels() {
        let payload = build_webhook_payload(&sample_program(), jst());
        let fields = payload["embeds"][0]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 9);

        let labels: Vec<&str> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert_eq!(
            labels,
            vec![
                "チャンネル",
                "放送開始時間",
                "時期",
                "Twittter ハッシュタグ",
                "Twittter",
                "公式サイト",
                "しょぼいカレンダー",
                "MyAnimeList",
                "再放送",
            ]
        );

        assert_eq!(fields[0]["value"], "TOKYO MX");
        // Start instant rendered in the configured offset, not UTC.
        assert_eq!(fields[1]["value"], "2024/01/05 00:00");
        assert_eq!(fields[2]["value"], "2018年冬");
        assert_eq!(fields[3]["value"], "#yurucamp");
        assert_eq!(fields[4]["value"], "https://twitter.com/yurucamp_anime");
        assert_eq!(fields[5]["value"], "https://yurucamp.jp/");
        assert_eq!(fields[6]["value"], "http://cal.syoboi.jp/tid/4727");
        assert_eq!(fields[7]["value"], "https://myanimelist.net/anime/34798");
        assert_eq!(fields[8]["value"], "いいえ");
        assert!(fields.iter().all(|f| f["inline"] == false));
    }

    #[test]
    fn rebroadcast_renders_yes() {
        let mut program = sample_program();
        program.is_rebroadcast = true;
        let payload = build_webhook_payload(&program, jst());
        assert_eq!(payload["embeds"][0]["fields"][8]["value"], "はい");
    }

    #[test]
    fn missing_links_render_placeholder() {
        let mut program = sample_program();
        program.work.twitter_hashtag = None;
        program.work.twitter_username = Some(String::new());
        program.work.official_site_url = None;
        program.work.syobocal_tid = None;
        program.work.mal_anime_id = None;

        let payload = build_webhook_payload(&program, jst());
        let fields = payload["embeds"][0]["fields"].as_array().unwrap();
        for idx in [3, 4, 5, 6, 7] {
            assert_eq!(fields[idx]["value"], "-", "field {idx}");
        }
    }

    #[test]
    fn episode_title_placeholder_when_untitled() {
        let mut program = sample_program();
        if let Some(episode) = program.episode.as_mut() {
            episode.title = None;
        }
        let payload = build_webhook_payload(&program, jst());
        assert_eq!(payload["embeds"][0]["title"], "ゆるキャン△ 第1話 -");
    }
}
