use serde_json::json;
use tsumugi::{
    manifest::VastDocument,
    playlist::{AdInfo, AdType, EntryType, MediaWindow, PlaybackPolicy},
    sequencer::{Action, SeekTarget},
    time::{linear_to_media, linear_to_seekbar, DvrWindow},
    EngineCommand, EntryId, Notification, Phase, TsumugiError,
};

use crate::{init_test_tracing, inline_ad, start, uri, vast, vmap, with_content, AssertWrapper};

fn ad(name: &str, duration: f64, ad_type: AdType) -> AdInfo {
    AdInfo::new(uri(name), MediaWindow::new(0., duration), ad_type)
}

#[test]
fn test_pod_plays_after_content() {
    init_test_tracing();
    let (mut sequencer, content) = with_content(100.);
    let first = sequencer
        .schedule_clip(
            AdInfo::pod(uri("ad1.mp4"), MediaWindow::new(0., 10.), content),
            0.,
            EntryType::Media,
        )
        .assert_success();
    let second = sequencer
        .schedule_clip(
            AdInfo::pod(uri("ad2.mp4"), MediaWindow::new(0., 10.), first),
            0.,
            EntryType::Media,
        )
        .assert_success();
    let sequencer = start(sequencer).assert_success();
    assert_eq!(sequencer.current(), Some(content));

    let transition = sequencer.get_segment_on_end_of_media(content, 100., 1., false, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), first);
    assert_eq!(segment.linear_time(), 100.);

    let transition = transition
        .state
        .get_segment_on_end_of_media(first, 10., 1., false, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), second);
    assert_eq!(segment.linear_time(), 110.);

    let transition = transition
        .state
        .get_segment_on_end_of_media(second, 10., 1., false, true);
    assert_eq!(transition.output, Ok(None));
    assert_eq!(transition.state.phase(), Phase::Ended);
    assert_eq!(transition.state.playlist().timeline_end(), Some(120.));
    assert!(transition
        .actions
        .contains(&Action::Engine(EngineCommand::Pause)));
}

#[test]
fn test_pod_requires_existing_anchor() {
    let (mut sequencer, _) = with_content(100.);
    let result = sequencer.schedule_clip(
        AdInfo::pod(uri("ad.mp4"), MediaWindow::new(0., 10.), EntryId(99)),
        0.,
        EntryType::Media,
    );
    assert_eq!(result, Err(TsumugiError::InvalidReference(Some(EntryId(99)))));

    let result = sequencer.schedule_clip(ad("ad.mp4", 10., AdType::Pod), 0., EntryType::Media);
    assert_eq!(result, Err(TsumugiError::InvalidReference(None)));
    assert_eq!(sequencer.playlist().len(), 1);
}

#[test]
fn test_pod_only_follows_content_or_pod_members() {
    let (mut sequencer, content) = with_content(100.);
    let midroll = sequencer
        .schedule_clip(ad("mid.mp4", 10., AdType::Midroll), 50., EntryType::Media)
        .assert_success();
    let result = sequencer.schedule_clip(
        AdInfo::pod(uri("pod.mp4"), MediaWindow::new(0., 10.), midroll),
        0.,
        EntryType::Media,
    );
    assert_eq!(result, Err(TsumugiError::InvalidReference(Some(midroll))));
    assert_eq!(sequencer.playlist().len(), 3);

    let first = sequencer
        .schedule_clip(
            AdInfo::pod(uri("pod1.mp4"), MediaWindow::new(0., 10.), content),
            0.,
            EntryType::Media,
        )
        .assert_success();
    let second = sequencer
        .schedule_clip(
            AdInfo::pod(uri("pod2.mp4"), MediaWindow::new(0., 10.), first),
            0.,
            EntryType::Media,
        )
        .assert_success();
    assert_eq!(
        sequencer.playlist().next_after(first).map(|e| e.entry_id),
        Some(second)
    );
}

#[test]
fn test_vmap_preroll_and_percentage_midroll() {
    init_test_tracing();
    let (mut sequencer, content) = with_content(100.);
    let manifest = vmap(json!([
        {
            "id": "pre",
            "timeOffset": "start",
            "source": { "kind": { "type": "vastData", "vast": {
                "ads": [inline_ad("pre", None, vec![(10., vec!["pre.mp4"])])]
            } } }
        },
        {
            "id": "mid",
            "timeOffset": "50%",
            "source": { "kind": { "type": "vastData", "vast": {
                "ads": [inline_ad("mid", None, vec![(10., vec!["mid.mp4"])])]
            } } }
        }
    ]));

    let breaks = sequencer.schedule_vmap(&manifest).assert_success();
    assert_eq!(breaks.len(), 2);
    assert_eq!(breaks[0].anchor, 0.);
    assert_eq!(breaks[1].anchor, 50.);

    let playlist = sequencer.playlist();
    let pre = playlist.find(breaks[0].entries[0]).assert_success();
    assert_eq!(pre.linear.start, 0.);
    // the offset lands on the merged timeline, the preroll does not push it back
    let mid = playlist.find(breaks[1].entries[0]).assert_success();
    assert_eq!(mid.linear.start, 50.);
    assert_eq!(
        linear_to_seekbar(mid.linear.start, playlist, &DvrWindow::default()).position,
        40.
    );

    let tail = playlist.next_after(mid.entry_id).assert_success();
    assert_eq!(tail.original_id, content);
    assert_eq!(tail.media_time.clip_begin, 40.);
    assert_eq!(playlist.timeline_end(), Some(120.));
}

#[test]
fn test_vmap_break_schedules_pod() {
    let (mut sequencer, content) = with_content(100.);
    let manifest = vmap(json!([
        {
            "id": "post",
            "timeOffset": "end",
            "source": { "kind": { "type": "vastData", "vast": { "ads": [
                inline_ad("second", Some(2), vec![(15., vec!["b.mp4"])]),
                inline_ad("first", Some(1), vec![(10., vec!["a.mp4"])])
            ] } } }
        },
        {
            "id": "single",
            "timeOffset": "00:00:30",
            "source": { "allowMultipleAds": false, "kind": { "type": "vastData", "vast": { "ads": [
                inline_ad("one", Some(1), vec![(5., vec!["c.mp4"])]),
                inline_ad("two", Some(2), vec![(5., vec!["d.mp4"])])
            ] } } }
        },
        { "id": "overlay", "breakType": "nonLinear", "timeOffset": "start" },
        { "id": "unresolved", "timeOffset": "start", "source": { "kind": {
            "type": "adTagUri", "uri": "https://ads.example.com/tag"
        } } }
    ]));

    let breaks = sequencer.schedule_vmap(&manifest).assert_success();
    assert_eq!(breaks.len(), 2);
    assert_eq!(breaks[0].entries.len(), 2);
    assert_eq!(breaks[1].entries.len(), 1);

    let playlist = sequencer.playlist();
    let first = playlist.find(breaks[0].entries[0]).assert_success();
    let second = playlist.find(breaks[0].entries[1]).assert_success();
    assert_eq!(first.clip_uri.as_str(), "https://ads.example.com/a.mp4");
    assert_eq!(playlist.next_after(first.entry_id), Some(second));
    // the mid-roll at 30s moved the post-roll back by its duration
    assert_eq!(first.linear.start, 105.);
    assert_eq!(second.linear.start, 115.);
    assert_eq!(playlist.find(content).assert_success().linear.duration, Some(30.));
}

#[test]
fn test_vmap_entry_offset_follows_named_entry() {
    let (mut sequencer, content) = with_content(100.);
    let postroll = sequencer
        .schedule_clip(ad("post.mp4", 10., AdType::Postroll), 0., EntryType::Media)
        .assert_success();
    let manifest = vmap(json!([
        {
            "id": "after-content",
            "timeOffset": format!("#{}", content.0),
            "source": { "kind": { "type": "vastData", "vast": {
                "ads": [inline_ad("extra", None, vec![(5., vec!["e.mp4"])])]
            } } }
        },
        {
            "id": "after-postroll",
            "timeOffset": format!("#{}", postroll.0),
            "source": { "kind": { "type": "vastData", "vast": {
                "ads": [inline_ad("late", None, vec![(5., vec!["l.mp4"])])]
            } } }
        }
    ]));

    let breaks = sequencer.schedule_vmap(&manifest).assert_success();
    assert_eq!(breaks.len(), 2);
    let extra = breaks[0].entries[0];
    let playlist = sequencer.playlist();
    assert_eq!(playlist.next_after(content).map(|e| e.entry_id), Some(extra));
    assert_eq!(playlist.find(extra).assert_success().linear.start, 100.);
    // a plain post-roll is not part of a pod
    assert!(breaks[1].entries.is_empty());
    assert_eq!(playlist.len(), 3);
}

#[test]
fn test_seek_into_locked_ad_is_redirected() {
    let (mut sequencer, _) = with_content(100.);
    let visible = PlaybackPolicy::advertisement().with_seekbar_visible(true);
    let locked = sequencer
        .schedule_clip(
            ad("ad.mp4", 10., AdType::Midroll).with_policy(visible),
            50.,
            EntryType::Media,
        )
        .assert_success();
    let sequencer = start(sequencer).assert_success();

    let transition = sequencer.get_segment_after_seek(SeekTarget::Seekbar(55.));
    let outcome = transition.output.assert_success();
    assert_eq!(outcome.segment.entry_id(), locked);
    assert!(outcome.redirected);
    assert!(!outcome.range_exceeded);
    assert_eq!(outcome.segment.linear_time(), 50.);
    assert_eq!(outcome.segment.media_time.current_playback_position, 0.);
    assert_eq!(transition.state.phase(), Phase::Seeking);

    let transition = transition.state.on_seek_completed();
    assert_eq!(transition.state.phase(), Phase::Playing);
}

#[test]
fn test_seek_past_concealed_ad() {
    let (mut sequencer, content) = with_content(100.);
    sequencer
        .schedule_clip(ad("ad.mp4", 10., AdType::Midroll), 50., EntryType::Media)
        .assert_success();
    let sequencer = start(sequencer).assert_success();

    let transition = sequencer.get_segment_after_seek(SeekTarget::Seekbar(70.));
    let outcome = transition.output.assert_success();
    assert_eq!(outcome.segment.entry.original_id, content);
    assert_eq!(outcome.segment.linear_time(), 80.);
    assert_eq!(outcome.segment.media_time.current_playback_position, 70.);
    assert!(!outcome.redirected);
}

#[test]
fn test_played_ad_is_skipped_on_seek_back() {
    let (mut sequencer, _) = with_content(100.);
    let midroll = sequencer
        .schedule_clip(ad("ad.mp4", 10., AdType::Midroll), 50., EntryType::Media)
        .assert_success();
    let sequencer = start(sequencer).assert_success();

    let transition = sequencer.get_segment_after_seek(SeekTarget::Linear(50.));
    assert_eq!(transition.output.assert_success().segment.entry_id(), midroll);
    let transition = transition
        .state
        .get_segment_on_end_of_media(midroll, 10., 1., false, false);
    let tail = transition.output.assert_success().assert_success();

    let transition = transition
        .state
        .get_segment_after_seek(SeekTarget::Linear(55.));
    let outcome = transition.output.assert_success();
    assert_eq!(outcome.segment.entry_id(), tail.entry_id());
    assert_eq!(outcome.segment.linear_time(), 60.);
}

#[test]
fn test_delete_after_played() {
    let (mut sequencer, content) = with_content(100.);
    let preroll = sequencer
        .schedule_clip(
            ad("pre.mp4", 15., AdType::Preroll).delete_after_played(true),
            0.,
            EntryType::Media,
        )
        .assert_success();
    let sequencer = start(sequencer).assert_success();
    assert_eq!(sequencer.current(), Some(preroll));

    let transition = sequencer.get_segment_on_end_of_media(preroll, 15., 1., false, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), content);
    assert_eq!(segment.linear_time(), 0.);
    assert!(transition.state.playlist().find(preroll).is_none());

    let transition = transition
        .state
        .get_segment_after_seek(SeekTarget::Linear(0.));
    assert_eq!(transition.output.assert_success().segment.entry_id(), content);
}

#[test]
fn test_cancelled_entry_is_never_sought() {
    let (mut sequencer, _) = with_content(100.);
    let midroll = sequencer
        .schedule_clip(ad("ad.mp4", 10., AdType::Midroll), 50., EntryType::Media)
        .assert_success();
    let transition = start(sequencer).assert_success().cancel_clip(midroll);
    assert_eq!(transition.output, Ok(None));
    let mut sequencer = transition.state;
    assert_eq!(sequencer.playlist().timeline_end(), Some(100.));

    for target in [45., 50., 55., 59.9, 65.] {
        for target in [SeekTarget::Linear(target), SeekTarget::Seekbar(target)] {
            let transition = sequencer.get_segment_after_seek(target);
            let outcome = transition.output.assert_success();
            assert_ne!(outcome.segment.entry_id(), midroll);
            sequencer = transition.state;
        }
    }

    let transition = sequencer.cancel_clip(midroll);
    assert_eq!(transition.output, Err(TsumugiError::NotFound(midroll)));
}

#[test]
fn test_cancel_rules_while_playing() {
    let (mut sequencer, content) = with_content(100.);
    let next = sequencer
        .append_content_clip(uri("next.mp4"), MediaWindow::new(0., 50.))
        .assert_success();
    let preroll = sequencer
        .schedule_clip(ad("pre.mp4", 10., AdType::Preroll), 0., EntryType::Media)
        .assert_success();
    let sequencer = start(sequencer).assert_success();

    let transition = sequencer.cancel_clip(preroll);
    assert!(matches!(transition.output, Err(TsumugiError::InvalidState(_))));
    assert_eq!(transition.state.current(), Some(preroll));

    let transition = transition
        .state
        .get_segment_on_end_of_media(preroll, 10., 1., false, false);
    assert_eq!(transition.state.current(), Some(content));

    // content may be cancelled while playing, playback moves on right away
    let transition = transition.state.cancel_clip(content);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), next);
    assert!(transition.actions.iter().any(|a| matches!(
        a,
        Action::Engine(EngineCommand::LoadSegment { entry_id, .. }) if *entry_id == next
    )));
}

#[test]
fn test_entry_ids_increase_across_cancel_cycles() {
    let (mut sequencer, content) = with_content(100.);
    let mut seen = vec![content];
    for round in 0..5 {
        let at = 10. + round as f64 * 15.;
        let id = sequencer
            .schedule_clip(ad("ad.mp4", 5., AdType::Midroll), at, EntryType::Media)
            .assert_success();
        assert!(seen.iter().all(|previous| *previous < id));
        seen.extend(sequencer.playlist().iter().map(|e| e.entry_id));

        let transition = sequencer.cancel_clip(id);
        transition.output.assert_success();
        sequencer = transition.state;
        assert!(sequencer.playlist().find(id).is_none());
    }

    let last = sequencer
        .append_content_clip(uri("more.mp4"), MediaWindow::new(0., 10.))
        .assert_success();
    assert!(seen.iter().all(|id| *id < last));
}

#[test]
fn test_failed_ad_falls_back_then_drops() {
    init_test_tracing();
    let (mut sequencer, content) = with_content(100.);
    let manifest = vast(vec![inline_ad(
        "ad",
        None,
        vec![(10., vec!["a.webm", "a.mp4"]), (15., vec!["b.mp4"])],
    )]);
    let preroll = sequencer
        .schedule_vast_clip(ad("placeholder", 0., AdType::Preroll), &manifest, 0.)
        .assert_success();
    let entry = sequencer.playlist().find(preroll).assert_success();
    assert_eq!(entry.clip_uri.as_str(), "https://ads.example.com/a.mp4");
    assert_eq!(entry.linear.duration, Some(10.));
    let sequencer = start(sequencer).assert_success();

    let transition = sequencer.get_segment_on_error(preroll, 0., 1., "decode", true, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), preroll);
    assert_eq!(segment.entry.clip_uri.as_str(), "https://ads.example.com/b.mp4");
    assert_eq!(segment.entry.linear.duration, Some(15.));
    assert_eq!(
        transition.state.playlist().find(content).assert_success().linear.start,
        15.
    );

    let transition = transition
        .state
        .get_segment_on_error(preroll, 0., 1., "decode", true, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), content);
    assert_eq!(segment.linear_time(), 0.);
    assert_eq!(transition.state.playlist().len(), 1);
    assert_eq!(transition.state.phase(), Phase::Playing);
}

#[test]
fn test_failed_last_ad_stays_current_until_playback_moves_on() {
    let (mut sequencer, content) = with_content(100.);
    let postroll = sequencer
        .schedule_clip(ad("post.mp4", 10., AdType::Postroll), 0., EntryType::Media)
        .assert_success();
    let sequencer = start(sequencer).assert_success();
    let transition = sequencer.get_segment_on_end_of_media(content, 100., 1., false, false);
    assert_eq!(transition.output.assert_success().assert_success().entry_id(), postroll);

    let transition = transition
        .state
        .get_segment_on_error(postroll, 2., 1., "decode", false, false);
    assert_eq!(transition.output, Ok(None));
    let mut sequencer = transition.state;
    assert_eq!(sequencer.current(), Some(postroll));
    assert!(sequencer.playlist().find(postroll).is_some());
    let media_time = sequencer
        .playlist()
        .find(postroll)
        .map(|e| linear_to_media(e, 102.))
        .assert_success();
    sequencer
        .get_seekbar_time(&media_time, 1., postroll)
        .assert_success();

    let more = sequencer
        .append_content_clip(uri("more.mp4"), MediaWindow::new(0., 20.))
        .assert_success();
    let transition = sequencer.get_segment_on_end_of_media(postroll, 2., 1., true, false);
    let segment = transition.output.assert_success().assert_success();
    assert_eq!(segment.entry_id(), more);
    assert!(transition.state.playlist().find(postroll).is_none());
    assert_eq!(segment.linear_time(), 100.);
}

#[test]
fn test_delete_after_played_last_entry_is_kept_while_current() {
    let (mut sequencer, content) = with_content(100.);
    let postroll = sequencer
        .schedule_clip(
            ad("post.mp4", 10., AdType::Postroll).delete_after_played(true),
            0.,
            EntryType::Media,
        )
        .assert_success();
    let sequencer = start(sequencer).assert_success();
    let transition = sequencer.get_segment_on_end_of_media(content, 100., 1., false, false);
    let transition = transition
        .state
        .get_segment_on_end_of_media(postroll, 10., 1., false, false);
    assert_eq!(transition.output, Ok(None));
    assert_eq!(transition.state.current(), Some(postroll));
    assert!(transition.state.playlist().find(postroll).is_some());
}

#[test]
fn test_cancelling_next_entry_announces_replacement() {
    let (mut sequencer, content) = with_content(100.);
    let postroll = sequencer
        .schedule_clip(ad("post.mp4", 10., AdType::Postroll), 0., EntryType::Media)
        .assert_success();
    let mut sequencer = start(sequencer).assert_success();
    sequencer.track_position(content, 42.);

    let transition = sequencer.cancel_clip(postroll);
    assert_eq!(transition.output, Ok(None));
    assert_eq!(
        transition.actions,
        vec![Action::Notify(Notification::PlaylistEntryChanged {
            current_entry: content,
            next_entry: None,
            current_playback_time: 42.,
        })]
    );

    // entries further ahead were never announced
    let mut sequencer = transition.state;
    let later = sequencer
        .append_content_clip(uri("later.mp4"), MediaWindow::new(0., 10.))
        .assert_success();
    let last = sequencer
        .append_content_clip(uri("last.mp4"), MediaWindow::new(0., 10.))
        .assert_success();
    let transition = sequencer.cancel_clip(last);
    assert_eq!(transition.output, Ok(None));
    assert!(transition.actions.is_empty());
    assert_eq!(
        transition.state.playlist().next_after(content).map(|e| e.entry_id),
        Some(later)
    );
}

#[test]
fn test_vast_creative_selection() {
    let (mut sequencer, _) = with_content(100.);
    let unplayable = vast(vec![inline_ad("ad", None, vec![(10., vec!["a.webm"])])]);
    let result = sequencer.schedule_vast_clip(ad("x", 0., AdType::Midroll), &unplayable, 20.);
    assert_eq!(result, Err(TsumugiError::NoPlayableCreative));
    assert_eq!(sequencer.playlist().len(), 1);

    let skippable: VastDocument = serde_json::from_value(json!({ "ads": [ { "kind": {
        "type": "inLine", "adSystem": "test", "adTitle": "skip",
        "creatives": [ { "kind": { "type": "linear", "duration": "00:00:20", "skipOffset": "00:00:05",
            "mediaFiles": [ { "uri": "https://ads.example.com/s.mp4", "mimeType": "video/mp4",
                "mediaTimeOffset": 3.0 } ] } } ]
    } } ] }))
    .unwrap();
    let id = sequencer
        .schedule_vast_clip(ad("x", 0., AdType::Midroll), &skippable, 20.)
        .assert_success();
    let entry = sequencer.playlist().find(id).assert_success();
    assert!(entry.playback_policy.skippable);
    assert_eq!(entry.media_time, MediaWindow::new(3., 23.));
    assert_eq!(entry.linear.start, 20.);
}
