//! Palette wire format.
//!
//! A palette of K colors travels as 3·K decimal channel values (r, g, b per
//! color, in palette order) joined by a separator and terminated by `\n`.

use rgb_everywhere_core::Palette;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ",";

/// Format one update line, newline included.
pub fn format_line(palette: &Palette, separator: &str) -> String {
    let mut line = palette
        .channels()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(separator);
    line.push('\n');
    line
}

/// Channel values as individual command-line arguments.
pub fn launch_args(palette: &Palette) -> Vec<String> {
    palette.channels().map(|c| c.to_string()).collect()
}
