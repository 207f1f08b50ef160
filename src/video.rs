use crate::error::ShortError;
use crate::parser::Parser;
use crate::processor;
use crate::serialiser;
use crate::session::Session;
use crate::srt::Subtitle;
use crate::timing::Window;
use crate::tools::ToolRunner;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

const TEXT_COLOR: &str = "yellow";
const BOX_COLOR: &str = "black";

/// Cuts `window` out of the session's video into its own clip.
pub fn slice<R: ToolRunner>(session: &Session, runner: &R, window: &Window) -> Result<PathBuf> {
    window.ensure_ordered()?;
    let video = session.video_path();
    let clip = session.clip_path(window);
    info!(%window, clip = %clip.display(), "slicing video");

    let args = vec![
        "-y".to_string(),
        "-ss".to_string(),
        window.start_secs().to_string(),
        "-to".to_string(),
        window.end_secs().to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        clip.display().to_string(),
    ];
    runner
        .run(&session.tools().ffmpeg, &args, session.working_dir())
        .with_context(|| format!("Failed to slice '{}'", video.display()))?;
    Ok(clip)
}

/// Concatenates `clips` in order into `output`, or the session's default
/// concatenation path.
pub fn join<R: ToolRunner>(
    session: &Session,
    runner: &R,
    clips: &[PathBuf],
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    if clips.is_empty() {
        return Err(ShortError::NothingToJoin.into());
    }
    let clips = clips
        .iter()
        .map(|clip| absolute(clip))
        .collect::<Result<Vec<_>>>()?;
    let output = match output {
        Some(output) => absolute(&output)?,
        None => session.joined_path(),
    };
    let list = session.working_dir().join("concat_list.txt");
    std::fs::write(&list, concat_list(&clips))
        .with_context(|| format!("Failed to write '{}'", list.display()))?;
    info!(count = clips.len(), output = %output.display(), "joining clips");

    let args = vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        output.display().to_string(),
    ];
    runner
        .run(&session.tools().ffmpeg, &args, session.working_dir())
        .context("Failed to join clips")?;
    Ok(output)
}

/// Re-times the session's captions to `window` and burns them onto the clip
/// cut for that window.
pub fn add_captions<R: ToolRunner>(
    session: &Session,
    runner: &R,
    window: &Window,
) -> Result<PathBuf> {
    let srt_path = session.srt_path();
    let track = std::fs::read_to_string(&srt_path)
        .with_context(|| format!("Failed to open captions: '{}'", srt_path.display()))?;

    let retimed = processor::rereference_clip(&track, window);
    let retimed_path = session.retimed_srt_path();
    serialiser::serialise(&retimed, &retimed_path)?;

    let subs = Parser::new()
        .parse(&retimed)
        .with_context(|| format!("Failed to load '{}'", retimed_path.display()))?;

    let clip = session.clip_path(window);
    let output = session.subtitled_clip_path(window);
    let mut args = vec!["-y".to_string(), "-i".to_string(), clip.display().to_string()];

    if subs.is_empty() {
        warn!(%window, "no captions fall inside the window, copying clip as is");
        args.extend(["-c".to_string(), "copy".to_string()]);
    } else {
        let text_dir = session.caption_text_dir(window);
        let filter = overlay_filter(session, &subs, &text_dir)?;
        let script = session.working_dir().join(format!("overlay_{}.txt", window.file_tag()));
        std::fs::write(&script, filter)
            .with_context(|| format!("Failed to write '{}'", script.display()))?;
        info!(count = subs.len(), "burning captions");
        args.extend([
            "-filter_script:v".to_string(),
            script.display().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
        ]);
    }
    args.push(output.display().to_string());

    runner
        .run(&session.tools().ffmpeg, &args, session.working_dir())
        .with_context(|| format!("Failed to caption '{}'", clip.display()))?;
    Ok(output)
}

/// Builds one `drawtext` per subtitle, each shown only while its subtitle is
/// due. Caption texts are written to `text_dir` and read back by ffmpeg with
/// expansion off, so `%` and `\` in captions are drawn literally.
fn overlay_filter(session: &Session, subs: &[Subtitle], text_dir: &Path) -> Result<String> {
    std::fs::create_dir_all(text_dir)
        .with_context(|| format!("Failed to create '{}'", text_dir.display()))?;

    let mut filters = Vec::with_capacity(subs.len());
    for sub in subs {
        let text_file = text_dir.join(format!("{}.txt", sub.sequence_number));
        std::fs::write(&text_file, sub.text.join("\n"))
            .with_context(|| format!("Failed to write '{}'", text_file.display()))?;
        filters.push(drawtext(session, sub, &text_file));
    }
    Ok(filters.join(",\n"))
}

fn drawtext(session: &Session, sub: &Subtitle, text_file: &Path) -> String {
    let mut filter = format!(
        "drawtext=textfile={}:fontsize={}:fontcolor={}:box=1:boxcolor={}:x=(w-text_w)/2:y=h*4/5:expansion=none",
        quote(&text_file.display().to_string()),
        session.font_size(),
        TEXT_COLOR,
        BOX_COLOR,
    );
    if let Some(font) = session.font() {
        let _ = write!(filter, ":fontfile={}", quote(&font.display().to_string()));
    }
    let _ = write!(
        filter,
        ":enable='between(t,{:.3},{:.3})'",
        sub.show_at.as_secs_f64(),
        sub.hide_at.as_secs_f64()
    );
    filter
}

/// Paths handed to ffmpeg are resolved against our own working directory,
/// not the one ffmpeg runs in.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path: '{}'", path.display()))
}

fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file {}\n", quote(&clip.display().to_string())))
        .collect()
}

/// Single-quotes a value for an ffmpeg filter or concat list.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
