//! Markup reduction passes.
//!
//! This is not an HTML parser: no DOM is built. Non-content regions are cut
//! out by delimiter scans, then entities, tags and punctuation are removed.
//! Matching is case-sensitive, so `<SCRIPT>` survives the script passes and
//! only loses its tags.

use std::sync::LazyLock;

use regex::Regex;

static AMPERSAND_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(\w+|#\w+);").expect("AMPERSAND_ENTITY regex should compile"));

/// An opening/closing delimiter pair bounding a region to discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub open: &'static str,
    pub close: &'static str,
}

impl Span {
    pub const fn new(open: &'static str, close: &'static str) -> Self {
        Self { open, close }
    }

    pub fn strip(&self, text: &str) -> String {
        strip_between(text, self.open, self.close)
    }
}

pub const HEAD: Span = Span::new("<head>", "</head>");
pub const COMMENT: Span = Span::new("<!--", "-->");
pub const SCRIPT: Span = Span::new("<script>", "</script>");
/// Opening tag without `>` so attributed scripts (`<script src=…>`) match.
pub const SCRIPT_ATTRIBUTED: Span = Span::new("<script", "</script>");
pub const STYLE: Span = Span::new("<style", "</style>");

/// Remove every chunk exactly bounded by `left … right`.
///
/// The text is cut immediately before each occurrence of `left` and
/// immediately after each occurrence of `right`. A resulting chunk is
/// dropped when it starts with `left` and ends with `right`; every other
/// chunk is kept verbatim. Unmatched or reordered delimiters therefore
/// survive, only closed spans go.
///
/// ```
/// use tally_web::extract::strip_between;
///
/// assert_eq!(strip_between("a<!-- x -->b", "<!--", "-->"), "ab");
/// assert_eq!(strip_between("a --> b <!-- c", "<!--", "-->"), "a --> b <!-- c");
/// ```
pub fn strip_between(text: &str, left: &str, right: &str) -> String {
    if left.is_empty() || right.is_empty() {
        return text.to_string();
    }

    let mut cuts: Vec<usize> = text
        .match_indices(left)
        .map(|(at, _)| at)
        .chain(text.match_indices(right).map(|(at, m)| at + m.len()))
        .collect();
    if cuts.is_empty() {
        return text.to_string();
    }
    cuts.push(0);
    cuts.push(text.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut out = String::with_capacity(text.len());
    for pair in cuts.windows(2) {
        let chunk = &text[pair[0]..pair[1]];
        if !(chunk.starts_with(left) && chunk.ends_with(right)) {
            out.push_str(chunk);
        }
    }
    out
}

/// Drop everything between `<` and `>` and put a single space where each
/// tag closed.
///
/// A `<` with no later `>` swallows the rest of the input. A stray `>`
/// outside a tag also becomes a space.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Remove the 32 ASCII punctuation characters, keep everything else.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Replace `&name;` and `&#code;` with a single space. Entities missing the
/// trailing `;` are left alone.
pub fn strip_ampersand_entities(text: &str) -> String {
    AMPERSAND_ENTITY.replace_all(text, " ").into_owned()
}

/// Run the full reduction: optional head scrub, comments, scripts, styles,
/// then entities, tags and punctuation. Span passes always run before tag
/// removal.
pub fn clean_all(text: &str, count_head: bool) -> String {
    let mut out = if count_head {
        HEAD.strip(text)
    } else {
        text.to_string()
    };
    out = COMMENT.strip(&out);
    out = SCRIPT.strip(&out);
    out = SCRIPT_ATTRIBUTED.strip(&out);
    out = STYLE.strip(&out);
    out = strip_ampersand_entities(&out);
    out = strip_tags(&out);
    strip_punctuation(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

    #[test]
    fn strip_between_removes_delimited_region() {
        let content = "\n    example left_d text_to_remove right_d\n    rest\n    ";
        assert_eq!(
            strip_between(content, "left_d", "right_d"),
            "\n    example \n    rest\n    "
        );
    }

    #[test]
    fn strip_between_without_delimiters_is_identity() {
        let text = "plain text with <b>tags</b> & no markers";
        assert_eq!(strip_between(text, "<!--", "-->"), text);
        assert_eq!(strip_between("", "<!--", "-->"), "");
    }

    #[test]
    fn strip_between_well_formed_leaves_surroundings() {
        let (a, x, b) = ("before ", " hidden ", " after");
        let text = format!("{a}<script>{x}</script>{b}");
        assert_eq!(SCRIPT.strip(&text), format!("{a}{b}"));
    }

    #[test]
    fn strip_between_removes_every_span() {
        let text = "a<!--1-->b<!--2-->c<!---->d";
        assert_eq!(COMMENT.strip(text), "abcd");
    }

    #[test]
    fn strip_between_keeps_unmatched_delimiters() {
        assert_eq!(COMMENT.strip("x --> y"), "x --> y");
        assert_eq!(COMMENT.strip("x <!-- y"), "x <!-- y");
        // close before open: neither chunk is bounded by both
        assert_eq!(COMMENT.strip("a-->b<!--c"), "a-->b<!--c");
    }

    #[test]
    fn strip_between_nested_open_keeps_outer_prefix() {
        // only the innermost closed chunk is bounded by both delimiters
        assert_eq!(COMMENT.strip("a<!--x<!--y-->b"), "a<!--xb");
    }

    #[test]
    fn strip_between_handles_overlapping_delimiters() {
        assert_eq!(COMMENT.strip("a<!-->b"), "ab");
    }

    #[test]
    fn strip_between_ignores_empty_delimiters() {
        assert_eq!(strip_between("abc", "", "c"), "abc");
        assert_eq!(strip_between("abc", "a", ""), "abc");
    }

    #[test]
    fn strip_between_preserves_multibyte_text() {
        assert_eq!(COMMENT.strip("żółw<!--ß-->café"), "żółwcafé");
    }

    #[test]
    fn script_passes_cover_plain_and_attributed_tags() {
        let content = r#"
    <script>
        document.getElementById("demo").innerHTML = "Hello JavaScript!";
    </script>
    "#;
        let once = SCRIPT_ATTRIBUTED.strip(&SCRIPT.strip(content));
        assert_eq!(once, "\n    \n    ");

        let attributed = r#"keep<script type="text/javascript">var x = 1;</script>this"#;
        assert_eq!(SCRIPT.strip(attributed), attributed);
        assert_eq!(SCRIPT_ATTRIBUTED.strip(attributed), "keepthis");
    }

    #[test]
    fn style_pass_matches_open_prefix() {
        let content = "\n    <head>\n    <style>\n    body {background-color: powderblue;}\n    \
                       h1   {color: blue;}\n    p    {color: red;}\n    </style>\n    </head>";
        let expected = "\n    <head>\n    \n    </head>";
        assert_eq!(STYLE.strip(content), expected);
        assert_eq!(STYLE.strip(r#"a<style media="print">p{}</style>b"#), "ab");
    }

    #[test]
    fn comment_pass_joins_neighbours() {
        assert_eq!(
            COMMENT.strip("example<!-- This is a single line HTML comment. -->example"),
            "exampleexample"
        );
    }

    #[test]
    fn strip_tags_replaces_each_tag_with_space() {
        assert_eq!(strip_tags("<title>New Tab</title>"), " New Tab ");
        assert_eq!(strip_tags("a<br/>b"), "a b");
    }

    #[test]
    fn strip_tags_unterminated_swallows_rest() {
        assert_eq!(strip_tags("visible <a href='x' never closed"), "visible ");
    }

    #[test]
    fn strip_tags_stray_close_becomes_space() {
        assert_eq!(strip_tags("1 > 0"), "1   0");
    }

    #[test]
    fn strip_tags_is_idempotent() {
        for sample in [
            "<title>New Tab</title>",
            "a > b < c",
            "<<nested>> text",
            "no tags at all",
            "<unterminated",
        ] {
            let once = strip_tags(sample);
            assert_eq!(strip_tags(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn strip_punctuation_removes_every_mark() {
        let stripped = strip_punctuation(PUNCTUATION);
        assert!(stripped.is_empty());
        for mark in PUNCTUATION.chars() {
            assert!(!strip_punctuation(&format!("a{mark}b")).contains(mark));
        }
    }

    #[test]
    fn strip_punctuation_keeps_whitespace_and_letters() {
        assert_eq!(strip_punctuation("Don't stop,\tnow!\n"), "Dont stop\tnow\n");
        assert_eq!(strip_punctuation("naïve «quotes»"), "naïve «quotes»");
    }

    #[test]
    fn strip_ampersand_entities_requires_semicolon() {
        assert_eq!(
            strip_ampersand_entities("&#160;&amp;&not_remove&remove;"),
            "  &not_remove "
        );
        assert_eq!(strip_ampersand_entities("fish & chips"), "fish & chips");
    }

    #[test]
    fn clean_all_scrubs_head_only_when_requested() {
        let html = "<head><title>Title</title></head><body>Body</body>";
        let kept = clean_all(html, false);
        let scrubbed = clean_all(html, true);
        assert_eq!(kept.split_whitespace().collect::<Vec<_>>(), ["Title", "Body"]);
        assert_eq!(scrubbed.split_whitespace().collect::<Vec<_>>(), ["Body"]);
    }

    #[test]
    fn clean_all_reduces_mixed_markup() {
        let html = concat!(
            "<html><head><style>body{color:red}</style></head>",
            "<body><!-- nav --><h1>Rust &amp; HTML</h1>",
            "<script src=\"app.js\"></script><p>It's fast, it's safe.</p></body></html>"
        );
        let words: Vec<String> = clean_all(html, false)
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        assert_eq!(words, ["Rust", "HTML", "Its", "fast", "its", "safe"]);
    }
}
