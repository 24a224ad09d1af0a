//! Tests for event rendering.

use crate::cli::printer::render;
use seqdl_core::events::DownloadEvent;
use seqdl_core::Outcome;

#[test]
fn human_lines() {
    let started = DownloadEvent::started("a.toml").unwrap();
    assert_eq!(render(&started, false).unwrap(), "started   a.toml");
    let progress = DownloadEvent::progress("a.toml", 7).unwrap();
    assert_eq!(render(&progress, false).unwrap(), "  7%      a.toml");
    let done = DownloadEvent::end("a.toml", Outcome::Completed).unwrap();
    assert_eq!(render(&done, false).unwrap(), "done      a.toml");
    let timed_out = DownloadEvent::end("a.toml", Outcome::TimedOut).unwrap();
    assert_eq!(
        render(&timed_out, false).unwrap(),
        "stopped   a.toml: timed_out"
    );
    let failed = DownloadEvent::end("a.toml", Outcome::DestinationNotWritable).unwrap();
    assert_eq!(
        render(&failed, false).unwrap(),
        "failed    a.toml: destination_not_writable"
    );
}

#[test]
fn json_lines() {
    let started = DownloadEvent::started("a.toml").unwrap();
    assert_eq!(
        render(&started, true).unwrap(),
        r#"{"event":"progress","source":"a.toml","progress":0}"#
    );
    let aborted = DownloadEvent::end("a.toml", Outcome::Aborted).unwrap();
    assert_eq!(
        render(&aborted, true).unwrap(),
        r#"{"event":"end","source":"a.toml","outcome":"aborted","code":1}"#
    );
}
