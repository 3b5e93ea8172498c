/// Characters that are not allowed in file names on at least one supported platform
pub const RESERVED_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Sanitize a title for use as a file name.
///
/// Every reserved character is replaced 1:1 with an underscore. Nothing else
/// is touched: an empty title stays empty and the result is idempotent.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if RESERVED_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Format a caption offset as an SRT timestamp (`HH:MM:SS,mmm`)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Extract host from URL for display purposes
pub fn extract_host(url: &url::Url) -> String {
    url.host_str().unwrap_or("<no host>").to_string()
}
