use crate::srt::Subtitle;

use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

/// Writes an already rendered track to `output`, byte for byte.
pub fn serialise<P: AsRef<Path>>(track: &str, output: P) -> Result<()> {
    let output = output.as_ref();
    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create file: '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(track.as_bytes())
        .context("Failed to write to output file.")?;
    writer.flush().context("Failed to write to output file.")?;
    Ok(())
}

/// Renders subtitles as SRT blocks separated by a single blank line.
/// The last block carries no trailing newline; no subtitles render as "".
pub fn render(subs: &[Subtitle]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_subs(&mut buf, subs);
    String::from_utf8_lossy(&buf).into_owned()
}

/// `HH:MM:SS,mmm`. Hours widen past two digits from 100h on.
pub fn format_ts(timestamp: Duration) -> String {
    let mut buf = Vec::with_capacity(12);
    let _ = write_ts(&mut buf, timestamp);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_subs<W: Write>(buf: &mut W, subs: &[Subtitle]) -> Result<()> {
    for (i, sub) in subs.iter().enumerate() {
        if i > 0 {
            writeln!(buf)?;
            writeln!(buf)?;
        }
        write_sub(buf, sub)?;
    }
    Ok(())
}

fn write_sub<W: Write>(buf: &mut W, sub: &Subtitle) -> Result<()> {
    writeln!(buf, "{}", sub.sequence_number)?;
    write!(buf, "{} --> {}", format_ts(sub.show_at), format_ts(sub.hide_at))?;
    for line in &sub.text {
        writeln!(buf)?;
        write!(buf, "{}", line)?;
    }
    Ok(())
}

fn write_ts<W: Write>(buf: &mut W, timestamp: Duration) -> Result<()> {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.subsec_millis();
    write!(
        buf,
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, seconds, millis
    )?;
    Ok(())
}
