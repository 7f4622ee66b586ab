//! FFmpeg filter fragments used by the timeline.

use std::path::Path;

/// Title lines are wrapped at roughly this many characters.
pub const TITLE_WRAP_CHARS: usize = 22;

/// Scale into a `width`x`height` frame without distortion, padding the rest.
pub fn filter_portrait_fit(width: u32, height: u32, fps: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
        w = width,
        h = height,
        fps = fps,
    )
}

/// Crossfade `[a]` into `[b]`, starting `offset` seconds into `[a]`.
pub fn filter_xfade(a: &str, b: &str, duration: f64, offset: f64, out: &str) -> String {
    format!(
        "[{}][{}]xfade=transition=fade:duration={:.3}:offset={:.3}[{}]",
        a, b, duration, offset, out
    )
}

pub fn filter_fade_in(duration: f64) -> String {
    format!("fade=t=in:st=0:d={:.3}", duration)
}

pub fn filter_fade_out(start: f64, duration: f64) -> String {
    format!("fade=t=out:st={:.3}:d={:.3}", start.max(0.0), duration)
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escape text for use inside a quoted drawtext `text='...'` value.
///
/// The graph parser strips the quotes and the option parser consumes one
/// level of backslashes. Drawtext itself must run with `expansion=none`,
/// otherwise `%` and `\\` would be interpreted a third time.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            // A quote cannot be escaped inside a quoted filter value.
            '\'' => out.push('\u{2019}'),
            ':' => out.push_str("\\:"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Stroked title text centered in the upper third.
///
/// `lead` limits the overlay to the first `lead` seconds; `None` keeps it for
/// the whole video. The font file is only referenced when it exists.
pub fn filter_drawtext_title(
    text: &str,
    font_size: u32,
    border_width: u32,
    lead: Option<f64>,
    font_file: Option<&Path>,
) -> String {
    let wrapped = wrap_text(text, TITLE_WRAP_CHARS).join("\n");
    let mut filter = format!(
        "drawtext=text='{}':expansion=none:fontsize={}:fontcolor=white:borderw={}:bordercolor=black:\
         line_spacing=12:x=(w-text_w)/2:y=h/6",
        escape_drawtext(&wrapped),
        font_size,
        border_width,
    );

    if let Some(font) = font_file.filter(|f| f.exists()) {
        filter.push_str(&format!(
            ":fontfile='{}'",
            escape_filter_path(&font.to_string_lossy())
        ));
    }
    if let Some(lead) = lead {
        filter.push_str(&format!(":enable='between(t,0,{:.3})'", lead));
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portrait_fit() {
        let filter = filter_portrait_fit(1080, 1920, 30);
        assert!(filter.starts_with("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(filter.contains("pad=1080:1920"));
        assert!(filter.contains("fps=30"));
    }

    #[test]
    fn test_xfade() {
        assert_eq!(
            filter_xfade("v0", "v1", 0.5, 4.0, "x1"),
            "[v0][v1]xfade=transition=fade:duration=0.500:offset=4.000[x1]"
        );
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("The Hidden Truth About Deep Ocean Creatures", 22);
        assert_eq!(lines, vec!["The Hidden Truth About", "Deep Ocean Creatures"]);
        assert!(wrap_text("   ", 22).is_empty());
        assert_eq!(wrap_text("Supercalifragilisticexpialidocious ok", 10).len(), 2);
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("Why 100%: it's"), "Why 100%\\: it\u{2019}s");
        assert_eq!(escape_drawtext(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_drawtext_title_keeps_percent_literal() {
        let filter = filter_drawtext_title("Only 5% of the ocean is mapped", 72, 5, None, None);
        assert!(filter.starts_with("drawtext=text='Only 5% of the ocean\nis mapped':expansion=none:"));
        assert!(!filter.contains("\\%"));
    }

    #[test]
    fn test_drawtext_title() {
        let filter = filter_drawtext_title("Short title", 72, 5, Some(3.0), None);
        assert!(filter.contains("text='Short title':expansion=none"));
        assert!(filter.contains("borderw=5"));
        assert!(filter.contains("enable='between(t,0,3.000)'"));
        assert!(!filter.contains("fontfile"));

        let filter = filter_drawtext_title("Short title", 72, 5, None, Some(Path::new("/no/font.ttf")));
        assert!(!filter.contains("enable"));
        assert!(!filter.contains("fontfile"));
    }
}
