use std::future::Future;

use url::Url;

use crate::{
    manifest::{AdSourceKind, MediaFile, VastDocument, VmapDocument},
    TsumugiError, TsumugiResult,
};

/// Turns an ad tag URL into a resolved manifest tree.
///
/// Network round trips happen here, before the scheduler ever sees the manifest.
pub trait ManifestResolver {
    fn resolve(&self, url: &Url) -> impl Future<Output = TsumugiResult<VastDocument>> + Send;
}

/// Fetches manifests rendered as JSON over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpManifestResolver {
    client: reqwest::Client,
}

impl HttpManifestResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ManifestResolver for HttpManifestResolver {
    async fn resolve(&self, url: &Url) -> TsumugiResult<VastDocument> {
        tracing::debug!(%url, "Resolving ad manifest");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TsumugiError::NetworkError(format!(
                "HTTP {status} while fetching {url}"
            )));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Resolves every ad tag source of a VMAP document into inline VAST data.
///
/// A break whose tag fails to resolve is dropped and its error returned; the rest of the document
/// stays schedulable.
pub async fn resolve_ad_tags<R>(resolver: &R, vmap: &mut VmapDocument) -> Vec<TsumugiError>
where
    R: ManifestResolver,
{
    let mut errors = Vec::new();
    let mut breaks = Vec::with_capacity(vmap.breaks.len());

    for mut ad_break in vmap.breaks.drain(..) {
        let tag = match ad_break.source.as_ref().map(|s| &s.kind) {
            Some(AdSourceKind::AdTagUri { uri }) => Some(uri.clone()),
            _ => None,
        };

        if let Some(uri) = tag {
            match resolver.resolve(&uri).await {
                Ok(vast) => {
                    if let Some(source) = ad_break.source.as_mut() {
                        source.kind = AdSourceKind::VastData { vast };
                    }
                }
                Err(e) => {
                    tracing::warn!(%uri, break_id = ?ad_break.id, error = %e, "Failed to resolve ad tag, dropping ad break");
                    errors.push(e);
                    continue;
                }
            }
        }
        breaks.push(ad_break);
    }

    vmap.breaks = breaks;
    errors
}

/// Picks the media file to play out of a creative's candidates.
pub trait CreativeSelector: Send + Sync {
    fn select<'a>(&self, candidates: &'a [MediaFile]) -> Option<&'a MediaFile>;
}

/// Picks the first media file with a supported MIME type within the bitrate ceiling.
#[derive(Debug, Clone)]
pub struct PlayableMediaSelector {
    pub mime_types: Vec<String>,
    pub max_bitrate: Option<u32>,
}

impl PlayableMediaSelector {
    pub fn new(mime_types: Vec<String>, max_bitrate: Option<u32>) -> Self {
        Self {
            mime_types,
            max_bitrate,
        }
    }

    pub fn is_playable(&self, file: &MediaFile) -> bool {
        let supported = self
            .mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&file.mime_type));
        let within_bitrate = match (self.max_bitrate, file.bitrate) {
            (Some(max), Some(bitrate)) => bitrate <= max,
            _ => true,
        };
        supported && within_bitrate
    }
}

impl Default for PlayableMediaSelector {
    fn default() -> Self {
        Self::new(
            vec![
                "video/mp4".to_string(),
                "application/x-mpegURL".to_string(),
                "application/vnd.apple.mpegurl".to_string(),
                "application/dash+xml".to_string(),
            ],
            None,
        )
    }
}

impl CreativeSelector for PlayableMediaSelector {
    fn select<'a>(&self, candidates: &'a [MediaFile]) -> Option<&'a MediaFile> {
        candidates.iter().find(|file| self.is_playable(file))
    }
}
