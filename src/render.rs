//! Console rendering for envelopes

use colored::*;
use terminal_size::{Width, terminal_size};

use crate::module::{Envelope, Status};

/// Get terminal width, defaulting to 80 if not available
fn get_terminal_width() -> usize {
    terminal_size().map(|(Width(w), _)| w as usize).unwrap_or(80)
}

/// Wrap text to max_width, keeping explicit line breaks
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in s.lines() {
        let mut current_line = String::new();
        let mut current_len = 0;

        // words longer than a line are broken into line-sized pieces
        let pieces = paragraph.split_whitespace().flat_map(|word| {
            let chars: Vec<char> = word.chars().collect();
            chars
                .chunks(max_width.max(1))
                .map(|chunk| chunk.iter().collect::<String>())
                .collect::<Vec<_>>()
        });

        for word in pieces {
            let word_len = word.chars().count();

            if current_len == 0 {
                current_line = word;
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(&word);
                current_len += 1 + word_len;
            } else {
                lines.push(current_line);
                current_line = word;
                current_len = word_len;
            }
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Box `body` under `title`, uncolored
pub fn panel(title: &str, body: &str, width: usize) -> String {
    let inner = width.saturating_sub(4).max(title.chars().count() + 2).max(10);
    let lines = wrap_text(body, inner);

    let title_part = format!(" {} ", title);
    let fill = (inner + 2).saturating_sub(title_part.chars().count());
    let left = fill / 2;
    let right = fill - left;

    let mut out = String::new();
    out.push_str(&format!("╭{}{}{}╮\n", "─".repeat(left), title_part, "─".repeat(right)));
    for line in lines {
        let pad = inner.saturating_sub(line.chars().count());
        out.push_str(&format!("│ {}{} │\n", line, " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(inner + 2)));
    out
}

/// Render an envelope as a green success or red error panel
pub fn display_response(envelope: &Envelope) {
    let width = get_terminal_width().min(100);
    let body = envelope.display_text();

    match envelope.status {
        Status::Success => println!("{}", panel("Success", &body, width).green()),
        Status::Error => println!("{}", panel("Error", &body, width).red()),
    }
}
