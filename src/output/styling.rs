use console::{style, StyledObject};
use std::fmt::Display;

/// Terminal styling for the dashboard and progress output.
fn styled(text: impl Display) -> StyledObject<String> {
    style(text.to_string())
}

pub fn bright(text: impl Display) -> StyledObject<String> {
    styled(text).bright()
}

/// Underlined section title, preceded by its emoji marker.
pub fn section_title(marker: &str, title: &str) -> String {
    format!("{} {}", bright(marker), bright(title).underlined())
}

pub fn bright_yellow(text: impl Display) -> StyledObject<String> {
    bright(text).yellow()
}

pub fn bright_green(text: impl Display) -> StyledObject<String> {
    bright(text).green()
}

pub fn bright_red(text: impl Display) -> StyledObject<String> {
    bright(text).red()
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    styled(text).cyan()
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    styled(text).dim()
}

pub fn magenta_bold(text: impl Display) -> StyledObject<String> {
    styled(text).magenta().bold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_title_keeps_marker_and_text() {
        let title = section_title("📊", "Overview");
        assert_eq!(console::strip_ansi_codes(&title), "📊 Overview");
    }
}
