//! HTML to plain text
//!
//! Produces the `text/plain` alternative of templated emails. Output is a
//! pure function of the input: tags and comments are removed, `<script>`
//! and `<style>` bodies are dropped, entities are decoded, and whitespace is
//! tidied line by line.

/// Tags that end a visual line in rendered HTML
const LINE_BREAKING_TAGS: &[&str] = &[
    "br", "p", "div", "li", "tr", "table", "ul", "ol", "hr", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Tags whose content is never text
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Strip all markup from `html` and decode entities
///
/// ```
/// use platform::html::strip_tags;
///
/// let text = strip_tags("<p>Hello <b>Ada</b> &amp; welcome!</p>");
/// assert_eq!(text, "Hello Ada & welcome!");
/// ```
pub fn strip_tags(html: &str) -> String {
    let text = remove_markup(html);
    let text = decode_entities(&text);
    tidy_whitespace(&text)
}

fn remove_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];

        if let Some(comment) = after.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        // A lone `<` (e.g. "a < b") is text, not markup
        let opens_tag = after[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            out.push('<');
            rest = &after[1..];
            continue;
        }

        let Some(end) = find_tag_end(after) else {
            // Unterminated tag: nothing after it can be trusted as text
            rest = "";
            break;
        };

        let tag = &after[..=end];
        let name = tag_name(tag);
        rest = &after[end + 1..];

        if RAW_TEXT_TAGS.contains(&name.as_str()) && !tag.starts_with("</") {
            rest = skip_past_closing_tag(rest, &name);
            continue;
        }

        if LINE_BREAKING_TAGS.contains(&name.as_str()) {
            out.push('\n');
        }
    }

    out.push_str(rest);
    out
}

/// Index of the `>` closing the tag that starts at `s[0]`, ignoring quoted `>`
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in s.as_bytes().iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Lowercased element name of `<name ...>` or `</name>`
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn skip_past_closing_tag<'a>(s: &'a str, name: &str) -> &'a str {
    let needle = format!("</{}", name);
    // ASCII lowercasing keeps byte offsets intact
    match s.to_ascii_lowercase().find(&needle) {
        Some(start) => match find_tag_end(&s[start..]) {
            Some(end) => &s[start + end + 1..],
            None => "",
        },
        None => "",
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];
        match decode_entity(after) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &after[len..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode the entity at the start of `s`; returns the char and bytes consumed
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let (end, _) = s.char_indices().take(12).find(|&(_, c)| c == ';')?;
    let body = &s[1..end];

    let ch = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code).filter(|&c| c != '\0')?
    } else {
        match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => ' ',
            "copy" => '©',
            "reg" => '®',
            "hellip" => '…',
            "mdash" => '—',
            "ndash" => '–',
            "laquo" => '«',
            "raquo" => '»',
            _ => return None,
        }
    };

    Some((ch, end + 1))
}

/// Trim every line and keep at most one blank line between paragraphs
fn tidy_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_nested_tags() {
        assert_eq!(
            strip_tags("<div><a href=\"https://x.test/?a=1&amp;b=2\">Activate</a></div>"),
            "Activate"
        );
    }

    #[test]
    fn test_decodes_entities_after_stripping() {
        // An encoded tag is text and must survive as text, not be stripped
        assert_eq!(strip_tags("<p>&lt;b&gt; is bold</p>"), "<b> is bold");
        assert_eq!(strip_tags("caf&#233; &#x2603; &copy;"), "café ☃ ©");
        assert_eq!(strip_tags("AT&T &bogus; &"), "AT&T &bogus; &");
    }

    #[test]
    fn test_drops_script_style_and_comments() {
        let html = "<style>p { color: red; }</style><!-- hidden --><p>Shown</p>\
                    <SCRIPT type=\"text/javascript\">alert('<b>')</SCRIPT>";
        assert_eq!(strip_tags(html), "Shown");
    }

    #[test]
    fn test_quoted_angle_bracket_in_attribute() {
        assert_eq!(strip_tags("<img alt=\"a > b\">after"), "after");
    }

    #[test]
    fn test_lone_less_than_is_text() {
        assert_eq!(strip_tags("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        assert_eq!(strip_tags("text<a href=\"x"), "text");
    }

    #[test]
    fn test_line_structure() {
        let html = "<html>\n  <body>\n    <h1>Welcome</h1>\n\n\n    <p>Line one<br>Line two</p>\n  </body>\n</html>";
        assert_eq!(strip_tags(html), "Welcome\n\nLine one\nLine two");
    }

    #[test]
    fn test_no_markup_survives() {
        let html = "<table><tr><td class='x'>Cell</td></tr></table><p style=\"a:b\">Para</p>";
        let text = strip_tags(html);
        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert!(text.contains("Cell"));
        assert!(text.contains("Para"));
    }
}
