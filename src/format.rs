//! Log-friendly rendering of captured output

/// Longest output preview written to the log
pub const PREVIEW_LEN: usize = 100;

/// Rewrite control characters (below 0x20, and 0x7F) as `\xHH`
pub fn escape_control(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c < ' ' || c == '\x7f' {
            out.push_str(&format!("\\x{:02x}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// At most `max` bytes of `s`, cut back to a character boundary
pub fn clip(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Clipped, escaped preview of raw output bytes
pub fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    escape_control(clip(&text, PREVIEW_LEN))
}
