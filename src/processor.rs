use crate::parser::parse_timestamp;
use crate::serialiser;
use crate::srt::Subtitle;
use crate::timing::Window;

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace};

fn block_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\r?\n){2,}").unwrap())
}

fn timing_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3})\s-->\s(\d{2}:\d{2}:\d{2},\d{3})").unwrap()
    })
}

/// Cuts a subtitle track down to the entries that overlap `window`.
///
/// Every timestamp is moved `shift_secs` earlier and floored at zero before the
/// overlap test. The kept entries are then moved again so the earliest one
/// starts at `00:00:00,000`, and renumbered from 1. Blocks that are too short
/// or lack a valid timing line are skipped. Returns "" when nothing overlaps.
pub fn rereference(track: &str, shift_secs: i64, window: &Window) -> String {
    retime(read_blocks(track), shift_secs, window)
}

/// Re-times a full-length track for the clip cut at `window`.
///
/// Entries are first matched against the window on the source timeline, so
/// captions that end before the window never reach the clip. The survivors
/// are then shifted by the window start and re-referenced against the window
/// as seen from the clip.
pub fn rereference_clip(track: &str, window: &Window) -> String {
    let inside = read_blocks(track).filter(|sub| window.contains_overlap(sub.show_at, sub.hide_at));
    retime(inside, window.shift(), &window.rebased())
}

fn retime<I: Iterator<Item = Subtitle>>(subs: I, shift_secs: i64, window: &Window) -> String {
    let kept: Vec<Subtitle> = subs
        .map(|sub| shift_left(sub, shift_secs))
        .filter(|sub| window.contains_overlap(sub.show_at, sub.hide_at))
        .collect();

    let Some(origin) = kept.iter().map(|sub| sub.show_at).min() else {
        debug!(%window, "no subtitles overlap the window");
        return String::new();
    };

    let subs = generate_seqnum(rebase(kept, origin));
    debug!(%window, count = subs.len(), "re-referenced subtitles");
    serialiser::render(&subs)
}

fn read_blocks(track: &str) -> impl Iterator<Item = Subtitle> + '_ {
    block_separator()
        .split(track.trim())
        .filter_map(read_block)
}

fn read_block(block: &str) -> Option<Subtitle> {
    let lines: Vec<&str> = block.trim().lines().collect();
    if lines.len() < 2 {
        trace!(block, "skipping short block");
        return None;
    }

    let Some(caps) = timing_line().captures(lines[1]) else {
        trace!(line = lines[1], "skipping block without timing line");
        return None;
    };
    let show_at = parse_timestamp(&caps[1]).ok()?;
    let hide_at = parse_timestamp(&caps[2]).ok()?;

    Some(Subtitle {
        sequence_number: 0,
        show_at,
        hide_at,
        text: lines[2..].iter().map(|line| line.to_string()).collect(),
    })
}

fn shift_left(mut sub: Subtitle, shift_secs: i64) -> Subtitle {
    sub.show_at = clamped_shift(sub.show_at, shift_secs);
    sub.hide_at = clamped_shift(sub.hide_at, shift_secs);
    sub
}

fn clamped_shift(ts: Duration, shift_secs: i64) -> Duration {
    let millis = (ts.as_millis() as i64).saturating_sub(shift_secs.saturating_mul(1000));
    Duration::from_millis(millis.max(0) as u64)
}

fn rebase(subs: Vec<Subtitle>, origin: Duration) -> Vec<Subtitle> {
    subs.into_iter()
        .map(|mut s| {
            s.show_at -= origin;
            s.hide_at = s.hide_at.saturating_sub(origin);
            s
        })
        .collect()
}

fn generate_seqnum(subs: Vec<Subtitle>) -> Vec<Subtitle> {
    let mut seqnum = 0;
    subs.into_iter()
        .map(|mut s| {
            seqnum += 1;
            s.sequence_number = seqnum;
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = "\
1
00:05:00,000 --> 00:05:11,000
primero

2
00:05:12,000 --> 00:05:15,000
segundo
con dos lineas

3
00:05:25,000 --> 00:05:30,000
tercero
";

    fn window(start: &str, end: &str) -> Window {
        Window::parse(start, end).unwrap()
    }

    #[test]
    fn keeps_overlapping_entries_and_rebases() {
        let window = window("00:05:10", "00:05:20");
        let out = rereference(TRACK, window.shift(), &window.rebased());

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:01,000\nprimero\n\n\
             2\n00:00:02,000 --> 00:00:05,000\nsegundo\ncon dos lineas"
        );
    }

    #[test]
    fn unshifted_window_rebases_to_first_kept_entry() {
        let out = rereference(TRACK, 0, &window("00:05:10", "00:05:20"));

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:11,000\nprimero\n\n\
             2\n00:00:12,000 --> 00:00:15,000\nsegundo\ncon dos lineas"
        );
    }

    #[test]
    fn earliest_kept_entry_starts_at_zero() {
        // The second block starts first; order still follows the input.
        let track = "7\n00:00:08,000 --> 00:00:09,000\nlate\n\n\
                     9\n00:00:03,250 --> 00:00:04,000\nearly";
        let out = rereference(track, 0, &window("00:00:00", "00:00:10"));

        assert_eq!(
            out,
            "1\n00:00:04,750 --> 00:00:05,750\nlate\n\n\
             2\n00:00:00,000 --> 00:00:00,750\nearly"
        );
    }

    #[test]
    fn renumbers_without_gaps() {
        let track = "10\n00:00:01,000 --> 00:00:02,000\na\n\n\
                     20\n00:00:50,000 --> 00:00:51,000\nout\n\n\
                     30\n00:00:03,000 --> 00:00:04,000\nb\n\n\
                     40\n00:00:05,000 --> 00:00:06,000\nc";
        let out = rereference(track, 0, &window("00:00:00", "00:00:10"));
        let indices: Vec<&str> = out.split("\n\n").map(|b| b.lines().next().unwrap()).collect();

        assert_eq!(indices, vec!["1", "2", "3"]);
    }

    #[test]
    fn no_overlap_is_empty() {
        assert_eq!(rereference(TRACK, 0, &window("01:00:00", "01:00:10")), "");
        assert_eq!(rereference("", 0, &window("00:00:00", "00:00:10")), "");
    }

    #[test]
    fn shift_beyond_start_is_floored_at_zero() {
        let track = "1\n00:00:02,000 --> 00:00:04,000\nclamped\n\n\
                     2\n00:00:06,000 --> 00:00:08,000\nkept";
        let out = rereference(track, 5, &window("00:00:00", "00:00:10"));

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:00,000\nclamped\n\n\
             2\n00:00:01,000 --> 00:00:03,000\nkept"
        );
    }

    #[test]
    fn entry_before_window_survives_when_floored_onto_its_start() {
        // 00:05:00-00:05:09 shifted by 310s floors to zero, which touches the
        // rebased window start, so the inclusive test keeps it.
        let track = "1\n00:05:00,000 --> 00:05:09,000\nbefore\n\n\
                     2\n00:05:12,000 --> 00:05:15,000\ninside";
        let window = window("00:05:10", "00:05:20");
        let out = rereference(track, window.shift(), &window.rebased());

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:00,000\nbefore\n\n\
             2\n00:00:02,000 --> 00:00:05,000\ninside"
        );
    }

    #[test]
    fn extreme_shifts_saturate() {
        let track = "1\n00:00:02,000 --> 00:00:04,000\nuno";

        assert_eq!(
            rereference(track, i64::MAX, &window("00:00:00", "00:00:10")),
            "1\n00:00:00,000 --> 00:00:00,000\nuno"
        );
        assert_eq!(
            rereference(track, i64::MIN, &window("00:00:00", "23:59:59")),
            "1\n00:00:00,000 --> 00:00:00,000\nuno"
        );
    }

    #[test]
    fn clip_drops_captions_before_the_window() {
        let track = "1\n00:00:01,000 --> 00:00:03,000\nintro\n\n\
                     2\n00:02:00,000 --> 00:02:04,000\nmiddle\n\n\
                     3\n00:05:12,000 --> 00:05:15,000\ninside\n\n\
                     4\n00:05:25,000 --> 00:05:30,000\nafter";

        assert_eq!(
            rereference_clip(track, &window("00:05:10", "00:05:20")),
            "1\n00:00:00,000 --> 00:00:03,000\ninside"
        );
    }

    #[test]
    fn clip_keeps_exactly_the_overlapping_entries() {
        assert_eq!(
            rereference_clip(TRACK, &window("00:05:10", "00:05:20")),
            "1\n00:00:00,000 --> 00:00:01,000\nprimero\n\n\
             2\n00:00:02,000 --> 00:00:05,000\nsegundo\ncon dos lineas"
        );
        assert_eq!(rereference_clip(TRACK, &window("01:00:00", "01:00:10")), "");
    }

    #[test]
    fn overlap_bounds_are_inclusive() {
        let track = "1\n00:00:05,000 --> 00:00:10,000\nends on start\n\n\
                     2\n00:00:20,000 --> 00:00:25,000\nstarts on end\n\n\
                     3\n00:00:05,000 --> 00:00:09,999\njust before\n\n\
                     4\n00:00:20,001 --> 00:00:25,000\njust after";
        let out = rereference(track, 0, &window("00:00:10", "00:00:20"));

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:05,000\nends on start\n\n\
             2\n00:00:15,000 --> 00:00:20,000\nstarts on end"
        );
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let track = "1\n\n\
                     2\n00:00:01 --> 00:00:02\nno millis\n\n\
                     3\nnot timing\ntext\n\n\
                     4\n00:00:03,000 --> 00:00:04,000\ngood";
        let out = rereference(track, 0, &window("00:00:00", "00:00:10"));

        assert_eq!(out, "1\n00:00:00,000 --> 00:00:01,000\ngood");
    }

    #[test]
    fn handles_crlf_and_extra_blank_lines() {
        let track = "1\r\n00:00:01,000 --> 00:00:02,000\r\nuno\r\n\r\n\r\n\
                     2\r\n00:00:03,000 --> 00:00:04,000\r\ndos\r\n";
        let out = rereference(track, 0, &window("00:00:00", "00:00:10"));

        assert_eq!(
            out,
            "1\n00:00:00,000 --> 00:00:01,000\nuno\n\n\
             2\n00:00:02,000 --> 00:00:03,000\ndos"
        );
    }

    #[test]
    fn block_without_text_keeps_timing() {
        let track = "1\n00:00:01,000 --> 00:00:02,000";
        let out = rereference(track, 0, &window("00:00:00", "00:00:10"));

        assert_eq!(out, "1\n00:00:00,000 --> 00:00:01,000");
    }

    #[test]
    fn output_is_deterministic_and_rereadable() {
        let window = window("00:05:10", "00:05:20");
        let first = rereference(TRACK, window.shift(), &window.rebased());
        let second = rereference(TRACK, window.shift(), &window.rebased());
        assert_eq!(first, second);

        let subs = crate::parser::Parser::new().parse(&first).unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].show_at, Duration::ZERO);
    }
}
