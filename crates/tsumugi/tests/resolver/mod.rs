use serde_json::json;
use tsumugi::{
    resolver::{resolve_ad_tags, HttpManifestResolver, ManifestResolver},
    TsumugiError,
};
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{init_test_tracing, inline_ad, vmap, with_content, AssertWrapper};

async fn setup_mock_server() -> (Url, MockServer) {
    let mock_server = MockServer::start().await;

    let body = json!({ "ads": [inline_ad("tagged", Some(1), vec![(10., vec!["tagged.mp4"])])] });
    Mock::given(method("GET"))
        .and(path("/vast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<VAST version=\"4.0\"/>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let base = Url::parse(&mock_server.uri()).unwrap();
    (base, mock_server)
}

#[tokio::test]
async fn test_http_resolver() -> anyhow::Result<()> {
    init_test_tracing();
    let (base, _server) = setup_mock_server().await;
    let resolver = HttpManifestResolver::default();

    let document = resolver.resolve(&base.join("vast.json")?).await?;
    let pod = document.pod();
    assert_eq!(pod.len(), 1);
    assert_eq!(pod[0].ad_title, "tagged");

    let missing = resolver.resolve(&base.join("missing.json")?).await;
    assert!(matches!(missing, Err(TsumugiError::NetworkError(_))));

    let broken = resolver.resolve(&base.join("broken.json")?).await;
    assert!(matches!(broken, Err(TsumugiError::ParseError(_))));
    Ok(())
}

#[tokio::test]
async fn test_resolve_ad_tags_drops_failed_breaks() -> anyhow::Result<()> {
    init_test_tracing();
    let (base, _server) = setup_mock_server().await;
    let mut manifest = vmap(json!([
        { "id": "good", "timeOffset": "start", "source": { "kind": {
            "type": "adTagUri", "uri": base.join("vast.json")?.to_string()
        } } },
        { "id": "bad", "timeOffset": "50%", "source": { "kind": {
            "type": "adTagUri", "uri": base.join("missing.json")?.to_string()
        } } },
        { "id": "inline", "timeOffset": "end", "source": { "kind": { "type": "vastData", "vast": {
            "ads": [inline_ad("post", None, vec![(5., vec!["post.mp4"])])]
        } } } }
    ]));

    let errors = resolve_ad_tags(&HttpManifestResolver::default(), &mut manifest).await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], TsumugiError::NetworkError(_)));
    assert_eq!(manifest.breaks.len(), 2);
    assert!(manifest.breaks.iter().all(|b| b.vast().is_some()));

    // the session goes on with what could be resolved
    let (mut sequencer, _) = with_content(100.);
    let breaks = sequencer.schedule_vmap(&manifest).assert_success();
    assert_eq!(breaks.len(), 2);
    assert_eq!(sequencer.playlist().len(), 3);
    assert_eq!(sequencer.playlist().timeline_end(), Some(115.));
    Ok(())
}
