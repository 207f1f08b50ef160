mod download;
mod error;
mod parser;
mod processor;
mod serialiser;
mod session;
mod srt;
mod timing;
mod tools;
mod video;

use crate::session::{Session, DEFAULT_FONT_SIZE, DEFAULT_LANGUAGE};
use crate::timing::{clock_arg, shift_arg, Window};
use crate::tools::{SystemRunner, Tools};

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::{Args, Parser as ClapParser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Cut a captioned short out of a downloaded video", version)]
struct Cli {
    #[arg(short, long, global = true, help = "Log debug output.")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-time an SRT track to a window of its video.
    Retime(RetimeArgs),
    /// Download a video and its auto-generated captions.
    Fetch(FetchArgs),
    /// Cut a window out of a downloaded video and burn its captions in.
    Clip(ClipArgs),
    /// Concatenate clips into one video.
    Join(JoinArgs),
    /// Fetch, then clip.
    Run(RunArgs),
}

#[derive(Args)]
struct RetimeArgs {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to read from. If not supplied, the subtitles will be read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. If not supplied, the subtitles will be written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[command(flatten)]
    window: WindowArgs,
    #[arg(
        long,
        value_name = "SECS|HH:MM:SS",
        help = "Move every timestamp this much earlier before matching the window.",
        value_parser = shift_arg,
        default_value = "0",
        allow_hyphen_values = true
    )]
    shift: i64,
}

#[derive(Args)]
struct WindowArgs {
    #[arg(long, value_name = "HH:MM:SS", value_parser = clock_arg, help = "Start of the window.")]
    start: NaiveTime,
    #[arg(long, value_name = "HH:MM:SS", value_parser = clock_arg, help = "End of the window.")]
    end: NaiveTime,
}

impl WindowArgs {
    fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }
}

#[derive(Args)]
struct SessionArgs {
    #[arg(short, long, value_name = "DIR", default_value = ".", help = "Where videos and captions live.")]
    workdir: PathBuf,
    #[arg(short, long, help = "Base name of the downloaded video.")]
    name: String,
    #[arg(long, value_name = "PROGRAM", env = "SHORTCUT_YT_DLP", default_value = "yt-dlp")]
    yt_dlp: String,
    #[arg(long, value_name = "PROGRAM", env = "SHORTCUT_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: String,
}

impl SessionArgs {
    fn session(&self) -> Session {
        Session::new(&self.workdir, &self.name).with_tools(Tools {
            yt_dlp: self.yt_dlp.clone(),
            ffmpeg: self.ffmpeg.clone(),
        })
    }
}

#[derive(Args)]
struct DownloadArgs {
    #[arg(short, long, help = "The video to download.")]
    url: String,
    #[arg(short, long, default_value = DEFAULT_LANGUAGE, help = "Caption language.")]
    lang: String,
    #[arg(long, help = "Download the video only.")]
    no_captions: bool,
}

#[derive(Args)]
struct CaptionArgs {
    #[arg(long, value_name = "FILE", help = "Font file for the captions.")]
    font: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE, help = "Caption font size.")]
    font_size: u32,
}

#[derive(Args)]
struct FetchArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[command(flatten)]
    download: DownloadArgs,
}

#[derive(Args)]
struct ClipArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[command(flatten)]
    window: WindowArgs,
    #[command(flatten)]
    captions: CaptionArgs,
}

#[derive(Args)]
struct JoinArgs {
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    workdir: PathBuf,
    #[arg(long, value_name = "PROGRAM", env = "SHORTCUT_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: String,
    #[arg(short, long, value_name = "FILE", help = "Where to write the joined video.")]
    output: Option<PathBuf>,
    #[arg(required = true, value_name = "CLIP")]
    clips: Vec<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[command(flatten)]
    download: DownloadArgs,
    #[command(flatten)]
    window: WindowArgs,
    #[command(flatten)]
    captions: CaptionArgs,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "shortcut=debug" } else { "shortcut=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Retime(args) => retime(args),
        Command::Fetch(args) => {
            let session = args
                .session
                .session()
                .with_url(&args.download.url)
                .with_language(&args.download.lang);
            download::video_and_captions(&session, &SystemRunner, !args.download.no_captions)
        }
        Command::Clip(args) => {
            let session = args
                .session
                .session()
                .with_font(args.captions.font, args.captions.font_size);
            clip(&session, &args.window.window())
        }
        Command::Join(args) => {
            let tools = Tools {
                ffmpeg: args.ffmpeg,
                ..Tools::default()
            };
            let session = Session::new(&args.workdir, "").with_tools(tools);
            let output = video::join(&session, &SystemRunner, &args.clips, args.output)?;
            info!(output = %output.display(), "done");
            Ok(())
        }
        Command::Run(args) => {
            let session = args
                .session
                .session()
                .with_url(&args.download.url)
                .with_language(&args.download.lang)
                .with_font(args.captions.font, args.captions.font_size);
            let captions = !args.download.no_captions;
            download::video_and_captions(&session, &SystemRunner, captions)?;
            let window = args.window.window();
            if captions {
                clip(&session, &window)
            } else {
                video::slice(&session, &SystemRunner, &window).map(|_| ())
            }
        }
    }
}

fn clip(session: &Session, window: &Window) -> Result<()> {
    video::slice(session, &SystemRunner, window)?;
    let output = video::add_captions(session, &SystemRunner, window)?;
    info!(output = %output.display(), "done");
    Ok(())
}

fn retime(args: RetimeArgs) -> Result<()> {
    let data = if args.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("Failed to open input file: '{}'", args.input))?
    };

    let track = processor::rereference(&data, args.shift, &args.window.window());
    if track.is_empty() {
        info!("no subtitles overlap the window");
    }

    if args.output == "-" {
        let mut dst = io::stdout();
        dst.write_all(track.as_bytes())?;
        dst.flush()?;
    } else {
        serialiser::serialise(&track, &args.output)?;
    }

    Ok(())
}
