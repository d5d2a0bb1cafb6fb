use serde::Deserialize;
use url::Url;

use super::offset::{deserialize_clock, deserialize_optional_clock};

/// A resolved VAST document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VastDocument {
    #[serde(default)]
    pub ads: Vec<Ad>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    #[serde(default)]
    pub id: Option<String>,
    /// Position inside an ad pod. Ads without a sequence form the ad buffet.
    #[serde(default)]
    pub sequence: Option<u32>,
    pub kind: AdKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdKind {
    InLine(InLine),
    Wrapper(Wrapper),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InLine {
    pub ad_system: String,
    pub ad_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error: Option<Url>,
    #[serde(default)]
    pub impressions: Vec<Url>,
    #[serde(default)]
    pub creatives: Vec<Creative>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrapper {
    pub ad_system: String,
    pub ad_tag_uri: Url,
    #[serde(default)]
    pub impressions: Vec<Url>,
    #[serde(default)]
    pub creatives: Vec<Creative>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ad_id: Option<String>,
    #[serde(default)]
    pub sequence: Option<u32>,
    pub kind: CreativeKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CreativeKind {
    Linear(Linear),
    Companion { companions: Vec<CompanionAd> },
    NonLinear { ads: Vec<NonLinearAd> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linear {
    #[serde(deserialize_with = "deserialize_clock")]
    pub duration: f64,
    #[serde(default, deserialize_with = "deserialize_optional_clock")]
    pub skip_offset: Option<f64>,
    #[serde(default)]
    pub media_files: Vec<MediaFile>,
    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,
    #[serde(default)]
    pub video_clicks: Vec<VideoClick>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Delivery {
    #[default]
    Progressive,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub uri: Url,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub delivery: Delivery,
    pub mime_type: String,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub api_framework: Option<String>,
    /// Offset into the media resource where the creative starts.
    #[serde(default)]
    pub media_time_offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub event: String,
    pub uri: Url,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VideoClick {
    ClickThrough { uri: Url },
    ClickTracking { uri: Url },
    CustomClick { uri: Url },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionAd {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub resource: Option<Url>,
    #[serde(default)]
    pub ad_slot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonLinearAd {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub resource: Option<Url>,
    #[serde(default, deserialize_with = "deserialize_optional_clock")]
    pub min_suggested_duration: Option<f64>,
}

impl VastDocument {
    /// Inline ads in pod order.
    ///
    /// Sequenced ads come first, ordered by sequence. Buffet ads (no sequence) are only used when
    /// there is no sequenced ad, and then only the first of them.
    pub fn pod(&self) -> Vec<&InLine> {
        let mut sequenced: Vec<(u32, &InLine)> = Vec::new();
        let mut buffet = None;

        for ad in &self.ads {
            match &ad.kind {
                AdKind::InLine(inline) => match ad.sequence {
                    Some(sequence) => sequenced.push((sequence, inline)),
                    None => {
                        if buffet.is_none() {
                            buffet = Some(inline);
                        }
                    }
                },
                AdKind::Wrapper(wrapper) => {
                    tracing::warn!(
                        ad_tag_uri = %wrapper.ad_tag_uri,
                        "VAST wrapper ads are not followed, skipping"
                    );
                }
            }
        }

        if sequenced.is_empty() {
            return buffet.into_iter().collect();
        }
        sequenced.sort_by_key(|(sequence, _)| *sequence);
        sequenced.into_iter().map(|(_, inline)| inline).collect()
    }
}

impl InLine {
    /// Linear creatives with a usable duration, in document order.
    pub fn linear_creatives(&self) -> impl Iterator<Item = &Linear> {
        self.creatives.iter().filter_map(|c| match &c.kind {
            CreativeKind::Linear(linear) if linear.duration > 0. => Some(linear),
            _ => None,
        })
    }
}
