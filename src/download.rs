use crate::error::ShortError;
use crate::session::Session;
use crate::tools::ToolRunner;

use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Fetches the source video and, when `captions` is set, its auto-generated
/// captions converted to SRT. Files already on disk are not fetched again.
pub fn video_and_captions<R: ToolRunner>(
    session: &Session,
    runner: &R,
    captions: bool,
) -> Result<()> {
    let video = session.video_path();
    let srt = session.srt_path();
    if video.exists() && srt.exists() {
        info!(video = %video.display(), "video and captions already downloaded");
        return Ok(());
    }

    let url = session
        .url()
        .ok_or_else(|| anyhow!("A video URL is required to download '{}'", session.name()))?;
    let cwd = session.working_dir();
    let yt_dlp = &session.tools().yt_dlp;

    if !video.exists() {
        info!(url, "downloading video");
        let args = vec![
            "--remux-video".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            format!("{}.%(ext)s", session.name()),
            url.to_string(),
        ];
        runner
            .run(yt_dlp, &args, cwd)
            .context("Failed to download video")?;
        ensure_exists(&video)?;
    }

    if captions && !srt.exists() {
        info!(url, language = session.language(), "downloading captions");
        let args = vec![
            "--write-auto-sub".to_string(),
            "--sub-lang".to_string(),
            session.language().to_string(),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--skip-download".to_string(),
            "-o".to_string(),
            session.name().to_string(),
            url.to_string(),
        ];
        runner
            .run(yt_dlp, &args, cwd)
            .context("Failed to download captions")?;
        let vtt = session.vtt_path();
        ensure_exists(&vtt)?;

        info!(srt = %srt.display(), "converting captions to SRT");
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            vtt.display().to_string(),
            "-c:s".to_string(),
            "subrip".to_string(),
            srt.display().to_string(),
        ];
        runner
            .run(&session.tools().ffmpeg, &args, cwd)
            .context("Failed to convert captions")?;
        ensure_exists(&srt)?;
    }

    Ok(())
}

fn ensure_exists(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ShortError::NoOutput(path.to_path_buf()).into())
    }
}
