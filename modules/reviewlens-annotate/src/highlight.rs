use reviewlens_common::Fragment;

use crate::sentiment::Sentiment;

/// Minimum fragment text length (in characters) for a fragment to be wrapped.
const MIN_FRAGMENT_CHARS: usize = 2;

/// One occurrence of a fragment's text in the source, as byte offsets.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    fragment_idx: usize,
}

/// Overlay sentiment spans onto a review's text.
///
/// Runs in three steps over the raw (unescaped) text:
/// 1. collect every occurrence of every fragment text of at least two
///    characters (case-sensitive, all occurrences);
/// 2. resolve overlaps longest-match-wins: candidates ordered by
///    (length desc, start asc, fragment position asc) are accepted greedily
///    when they do not overlap an already-accepted span — touching spans
///    do not overlap, and duplicate ranges collapse to the first fragment;
/// 3. render a single left-to-right pass, HTML-escaping every segment.
///
/// Accepted spans render as
/// `<span class="highlight-{sentiment}" title="{category}">...</span>`,
/// the `title` omitted when the fragment's category is empty.
pub fn highlight_fragments(text: &str, fragments: &[Fragment]) -> String {
    let mut candidates: Vec<Candidate> = Vec::new();
    for (fragment_idx, frag) in fragments.iter().enumerate() {
        if frag.text.chars().count() < MIN_FRAGMENT_CHARS {
            continue;
        }
        for (start, matched) in text.match_indices(frag.text.as_str()) {
            candidates.push(Candidate {
                start,
                end: start + matched.len(),
                fragment_idx,
            });
        }
    }

    if candidates.is_empty() {
        return html_escape(text);
    }

    candidates.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
            .then(a.fragment_idx.cmp(&b.fragment_idx))
    });

    let mut accepted: Vec<Candidate> = Vec::new();
    for cand in candidates {
        let overlaps = accepted
            .iter()
            .any(|a| cand.start < a.end && a.start < cand.end);
        if !overlaps {
            accepted.push(cand);
        }
    }
    accepted.sort_by_key(|c| c.start);

    let mut out = String::with_capacity(text.len() + accepted.len() * 48);
    let mut cursor = 0;
    for span in &accepted {
        out.push_str(&html_escape(&text[cursor..span.start]));
        let frag = &fragments[span.fragment_idx];
        let class = Sentiment::from_raw(&frag.sentiment).highlight_class();
        if frag.category.is_empty() {
            out.push_str(&format!(r#"<span class="{class}">"#));
        } else {
            out.push_str(&format!(
                r#"<span class="{class}" title="{}">"#,
                html_escape(&frag.category)
            ));
        }
        out.push_str(&html_escape(&text[span.start..span.end]));
        out.push_str("</span>");
        cursor = span.end;
    }
    out.push_str(&html_escape(&text[cursor..]));

    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
