use serde::Deserialize;
use url::Url;

use super::{offset::TimeOffset, vast::VastDocument};

/// A resolved VMAP document: the ad breaks of one presentation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VmapDocument {
    #[serde(default)]
    pub breaks: Vec<AdBreak>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBreak {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub break_type: BreakType,
    pub time_offset: TimeOffset,
    #[serde(default)]
    pub source: Option<AdSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakType {
    #[default]
    Linear,
    NonLinear,
    Display,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_true")]
    pub allow_multiple_ads: bool,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    pub kind: AdSourceKind,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdSourceKind {
    VastData { vast: VastDocument },
    AdTagUri { uri: Url },
    CustomAdData {
        #[serde(rename = "templateType")]
        template_type: String,
        data: String,
    },
}

impl AdBreak {
    /// Inline VAST data of this break, if it has been resolved.
    pub fn vast(&self) -> Option<&VastDocument> {
        match self.source.as_ref().map(|s| &s.kind) {
            Some(AdSourceKind::VastData { vast }) => Some(vast),
            _ => None,
        }
    }

    pub fn allows_multiple_ads(&self) -> bool {
        self.source.as_ref().map_or(true, |s| s.allow_multiple_ads)
    }
}
