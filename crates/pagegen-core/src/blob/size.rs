//! Advisory publish size ceiling

/// 1.8 MiB; checked before publishing, never enforced by the store
pub const MAX_CONTENT_SIZE: usize = 1_887_436;

/// Result of measuring content against [`MAX_CONTENT_SIZE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCheck {
    /// UTF-8 byte length of the content
    pub size: usize,
    pub max_size: usize,
    pub within_limit: bool,
}

pub fn check_size(content: &str) -> SizeCheck {
    let size = content.len();
    SizeCheck {
        size,
        max_size: MAX_CONTENT_SIZE,
        within_limit: size <= MAX_CONTENT_SIZE,
    }
}

/// Human-readable size such as `"12.5 KB"`
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
