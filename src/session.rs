use crate::timing::Window;
use crate::tools::Tools;

use std::path::{Path, PathBuf};

pub const DEFAULT_LANGUAGE: &str = "es";
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Everything one run needs to know about where its files live.
/// Built once from the command line and only read afterwards.
#[derive(Debug, Clone)]
pub struct Session {
    working_dir: PathBuf,
    name: String,
    url: Option<String>,
    language: String,
    font: Option<PathBuf>,
    font_size: u32,
    tools: Tools,
}

impl Session {
    /// A relative `working_dir` is made absolute, since tools run inside it.
    pub fn new<P: Into<PathBuf>>(working_dir: P, name: &str) -> Self {
        let working_dir = working_dir.into();
        Self {
            working_dir: std::path::absolute(&working_dir).unwrap_or(working_dir),
            name: name.to_string(),
            url: None,
            language: DEFAULT_LANGUAGE.to_string(),
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            tools: Tools::default(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_font(mut self, font: Option<PathBuf>, font_size: u32) -> Self {
        self.font = font;
        self.font_size = font_size;
        self
    }

    pub fn with_tools(mut self, tools: Tools) -> Self {
        self.tools = tools;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    pub fn video_path(&self) -> PathBuf {
        self.file(&format!("{}.mp4", self.name))
    }

    /// Where yt-dlp leaves the auto-generated captions.
    pub fn vtt_path(&self) -> PathBuf {
        self.file(&format!("{}.{}.vtt", self.name, self.language))
    }

    pub fn srt_path(&self) -> PathBuf {
        self.file(&format!("{}.srt", self.name))
    }

    pub fn retimed_srt_path(&self) -> PathBuf {
        self.file(&format!("{}.4clip.srt", self.name))
    }

    pub fn clip_path(&self, window: &Window) -> PathBuf {
        self.file(&format!("clipped_video_{}.mp4", window.file_tag()))
    }

    pub fn subtitled_clip_path(&self, window: &Window) -> PathBuf {
        self.file(&format!("clipped_video_{}_subtitled.mp4", window.file_tag()))
    }

    /// Directory holding one text file per caption for the overlay.
    pub fn caption_text_dir(&self, window: &Window) -> PathBuf {
        self.file(&format!("captions_{}", window.file_tag()))
    }

    pub fn joined_path(&self) -> PathBuf {
        self.file("video_concatenado.mp4")
    }

    fn file(&self, name: &str) -> PathBuf {
        self.working_dir.join(name)
    }
}
