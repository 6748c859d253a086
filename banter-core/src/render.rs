// ABOUTME: Converts raw response text into a display-safe structure.
// ABOUTME: Extracts fenced code blocks with escaped bodies; plain text passes through.

const FENCE: &str = "```";

/// Default language tag for fences that carry none.
const DEFAULT_LANGUAGE: &str = "text";

/// One piece of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text outside any fence, untouched. Callers render this through their
    /// plain-text path, not as markup.
    Text(String),
    /// An extracted fenced code block.
    Code(CodeBlock),
}

/// A fenced code block ready for display in a container with a copy
/// affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag, `text` when the fence carried none.
    pub language: String,
    /// Block body with the five HTML-significant characters escaped.
    pub body: String,
    /// Raw trimmed body, the clipboard content for the copy affordance.
    pub copy_payload: String,
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Scan raw response text for fenced code regions.
///
/// A fence opens with three backticks, an optional alphanumeric language
/// tag, and a newline; it closes at the next three backticks (non-greedy,
/// multiple blocks per message). An opening fence with no closing marker is
/// left unmatched and the remainder is returned as plain text.
pub fn render(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut search = 0;

    while let Some(found) = raw[search..].find(FENCE) {
        let open = search + found;
        let head = &raw[open + FENCE.len()..];
        let Some((language, body_offset)) = fence_head(head) else {
            // Not a fence opening (e.g. inline backticks); keep scanning.
            search = open + FENCE.len();
            continue;
        };

        let body_start = open + FENCE.len() + body_offset;
        let Some(close) = raw[body_start..].find(FENCE) else {
            // Unterminated fence: the rest renders as plain text.
            break;
        };

        if cursor < open {
            segments.push(Segment::Text(raw[cursor..open].to_string()));
        }

        let code = raw[body_start..body_start + close].trim();
        segments.push(Segment::Code(CodeBlock {
            language,
            body: escape_html(code),
            copy_payload: code.to_string(),
        }));

        cursor = body_start + close + FENCE.len();
        search = cursor;
    }

    if cursor < raw.len() {
        segments.push(Segment::Text(raw[cursor..].to_string()));
    }

    segments
}

/// Match the optional language tag and mandatory newline after an opening
/// fence. Returns the tag and the byte offset of the body start.
fn fence_head(head: &str) -> Option<(String, usize)> {
    let tag_end = head
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(head.len());
    if !head[tag_end..].starts_with('\n') {
        return None;
    }
    let tag = &head[..tag_end];
    let language = if tag.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        tag.to_string()
    };
    Some((language, tag_end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_extracts_tagged_block_and_escapes_body() {
        let raw = "before\n```js\nalert('<x>')\n```\nafter";
        let segments = render(raw);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Text("before\n".to_string()));
        match &segments[1] {
            Segment::Code(block) => {
                assert_eq!(block.language, "js");
                assert_eq!(block.body, "alert(&#039;&lt;x&gt;&#039;)");
                assert_eq!(block.copy_payload, "alert('<x>')");
            }
            other => panic!("Expected code block, got {:?}", other),
        }
        assert_eq!(segments[2], Segment::Text("\nafter".to_string()));
    }

    #[test]
    fn test_render_defaults_language_to_text() {
        let segments = render("```\nlet x = 1;\n```");
        match &segments[0] {
            Segment::Code(block) => assert_eq!(block.language, "text"),
            other => panic!("Expected code block, got {:?}", other),
        }
    }

    #[test]
    fn test_render_multiple_blocks_non_greedy() {
        let raw = "```py\na\n```\nmiddle\n```py\nb\n```";
        let segments = render(raw);
        let codes: Vec<_> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Code(block) => Some(block.copy_payload.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(codes, vec!["a", "b"]);
    }

    #[test]
    fn test_render_unterminated_fence_stays_plain() {
        let raw = "text\n```js\nno closing marker";
        let segments = render(raw);
        assert_eq!(segments, vec![Segment::Text(raw.to_string())]);
    }

    #[test]
    fn test_render_plain_text_only() {
        let segments = render("just words");
        assert_eq!(segments, vec![Segment::Text("just words".to_string())]);
    }

    #[test]
    fn test_render_fence_without_newline_is_literal() {
        let raw = "inline ``` marks ``` here";
        let segments = render(raw);
        assert_eq!(segments, vec![Segment::Text(raw.to_string())]);
    }

    #[test]
    fn test_render_outside_text_is_untouched() {
        let raw = "<b>bold</b>\n```js\nx\n```";
        let segments = render(raw);
        assert_eq!(segments[0], Segment::Text("<b>bold</b>\n".to_string()));
    }

    #[test]
    fn test_escape_html_all_five() {
        assert_eq!(
            escape_html(r#"&<>"'"#),
            "&amp;&lt;&gt;&quot;&#039;"
        );
    }

    #[test]
    fn test_render_empty_input() {
        assert!(render("").is_empty());
    }
}
