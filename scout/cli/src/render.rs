//! Plain-text rendering of the gallery and map for the terminal.

use std::fmt::Write;

use textwrap::{wrap, Options};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use scout_core::gallery::{GalleryView, ListingCard, StatusLine, StatusPanel};
use scout_core::HeadlessMap;

const MIN_WIDTH: usize = 40;

/// Cut `text` to at most `width` columns, marking the cut with `…`
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// `left` and `right` on one line, `right` flush with column `width`
pub fn justify(left: &str, right: &str, width: usize) -> String {
    let right_w = right.width();
    let left = truncate_to_width(left, width.saturating_sub(right_w + 1));
    let gap = width.saturating_sub(left.width() + right_w).max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

fn status_line(line: &StatusLine) -> String {
    let marker = if line.in_progress { "…" } else { "✓" };
    match line.url_count {
        Some(count) => format!("{marker} {} ({count})", line.text),
        None => format!("{marker} {}", line.text),
    }
}

/// Status log, discovered URLs and error
pub fn render_status(panel: &StatusPanel, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let mut out = String::new();
    if !panel.visible {
        return out;
    }

    for line in &panel.lines {
        let _ = writeln!(out, "{}", truncate_to_width(&status_line(line), width));
    }
    if let Some(urls) = &panel.urls {
        let _ = writeln!(out, "  found {} listings:", urls.len());
        for entry in urls {
            let _ = writeln!(out, "    {}", truncate_to_width(&entry.display, width - 4));
        }
    }
    if let Some(error) = &panel.error {
        let options = Options::new(width).initial_indent("Error: ").subsequent_indent("       ");
        for line in wrap(error, options) {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

fn render_card(card: &ListingCard, width: usize, out: &mut String) {
    let pointer = if card.selected { '▶' } else { ' ' };
    let heading = format!("{pointer} {}. {}", card.index + 1, card.title);
    let _ = writeln!(out, "{}", justify(&heading, &card.price, width));

    let detail = if card.location.is_empty() {
        card.specs.clone()
    } else {
        format!("{} · {}", card.location, card.specs)
    };
    let _ = writeln!(out, "   {}", truncate_to_width(&detail, width - 3));
    let _ = writeln!(out, "   {}", truncate_to_width(&card.url, width - 3));

    if card.expanded {
        let options = Options::new(width).initial_indent("   ").subsequent_indent("   ");
        match card.description.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(description) => {
                for line in wrap(description, options) {
                    let _ = writeln!(out, "{line}");
                }
            }
            None => {
                let _ = writeln!(out, "   (no description)");
            }
        }
        if card.images.is_empty() {
            let _ = writeln!(out, "   no additional images available");
        }
        for image in &card.images {
            let _ = writeln!(out, "   🖼 {}", truncate_to_width(image, width - 6));
        }
    }
}

/// Listing cards, one block per listing
pub fn render_cards(view: &GalleryView, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let mut out = String::new();
    if view.cards.is_empty() {
        return out;
    }
    let _ = writeln!(out, "{}", "─".repeat(width));
    for card in &view.cards {
        render_card(card, width, &mut out);
    }
    out
}

/// Camera, markers and highlight of the headless map
pub fn render_map(map: &HeadlessMap, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let camera = map.camera();
    let mut out = String::new();
    let _ = writeln!(out, "{}", "─".repeat(width));
    let _ = writeln!(
        out,
        "Map: {} marker(s), center {:.4}, {:.4} @ zoom {:.1}",
        map.markers().len(),
        camera.center.lng,
        camera.center.lat,
        camera.zoom
    );
    for (id, marker) in map.markers() {
        let highlight = if map.highlighted() == Some(*id) { '*' } else { ' ' };
        let coords = format!("({:.4}, {:.4})", marker.position.lng, marker.position.lat);
        let left = format!("{highlight} {:>7}  {}", marker.label, marker.popup.title);
        let _ = writeln!(out, "{}", justify(&left, &coords, width));
    }
    out
}
