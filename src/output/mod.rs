use crate::api::models::CaptionEntry;
use crate::cli::OutputFormat;
use crate::utils::format_srt_timestamp;

/// Render caption entries in source order
pub fn render(entries: &[CaptionEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_as_text(entries),
        OutputFormat::Srt => format_as_srt(entries),
    }
}

/// One caption per line, nothing else
pub fn format_as_text(entries: &[CaptionEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.content);
        out.push('\n');
    }
    out
}

pub fn format_as_srt(entries: &[CaptionEntry]) -> String {
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_timestamp(entry.from),
            format_srt_timestamp(entry.to),
            entry.content
        ));
    }
    out
}
