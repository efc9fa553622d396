use reviewlens_annotate::AnalysisSummary;

use crate::{AnalysisState, CardView, HighlightState};

/// Render the review list page.
pub fn render_cards(cards: &[CardView]) -> String {
    if cards.is_empty() {
        return build_page(
            "Reviews",
            r#"<div class="container"><div class="loading">No reviews found.</div></div>"#,
        );
    }

    let mut rendered = String::new();
    for card in cards {
        rendered.push_str(&render_card(card));
    }

    let content = format!(r#"<div class="container">{rendered}</div>"#);
    build_page("Reviews", &content)
}

/// Render the page shown when the startup load failed.
pub fn render_load_error() -> String {
    build_page(
        "Reviews",
        r#"<div class="container"><div class="loading">Error loading reviews. Is the backend running?</div></div>"#,
    )
}

fn render_card(card: &CardView) -> String {
    // The stretched link sits under the action row (z-index), so the buttons
    // never navigate to the original review.
    let (title_attr, card_link) = if card.review_url.is_empty() {
        (String::new(), String::new())
    } else {
        (
            r#" title="View original review""#.to_string(),
            format!(
                r#"<a class="card-link" href="{}" target="_blank" rel="noopener" aria-label="View original review"></a>"#,
                html_escape(&card.review_url)
            ),
        )
    };

    let avatar = if card.avatar_image.is_empty() {
        format!(
            r#"<div class="avatar-circle"><span class="avatar-initials">{}</span></div>"#,
            card.initial
        )
    } else {
        format!(
            r#"<div class="avatar-circle" style="background-image:url('{}');background-size:cover;background-position:center;"></div>"#,
            html_escape(&card.avatar_image)
        )
    };

    let url_line = if card.review_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="review-url-tiny">{}</div>"#,
            html_escape(&card.review_url)
        )
    };

    let apply_btn = match card.state.highlight {
        HighlightState::Plain => format!(
            r#"<a class="btn btn-primary btn-apply-ai" href="{}">Apply AI</a>"#,
            html_escape(&card.apply_href)
        ),
        HighlightState::HighlightsApplied => {
            r#"<span class="btn btn-primary btn-apply-ai applied">&#10003; AI Applied</span>"#
                .to_string()
        }
    };
    let analysis_btn = format!(
        r#"<a class="btn btn-secondary btn-analysis" href="{}">Analysis</a>"#,
        html_escape(&card.analysis_href)
    );

    let panel = match card.state.analysis {
        AnalysisState::AnalysisHidden => String::new(),
        AnalysisState::AnalysisShown => format!(
            r#"<div class="ai-analysis-panel">{}</div>"#,
            render_analysis(&card.analysis)
        ),
    };

    format!(
        r#"<div class="review-card" id="review-{id}"{title_attr}>
    {card_link}
    <div class="review-card-title">{title}</div>
    <div class="review-user-row">
        {avatar}
        <div class="user-info-text">
            <div class="user-name">{name}</div>
            <div class="user-meta-sub">{meta}</div>
        </div>
    </div>
    {url_line}
    <div class="review-body"><div class="review-text">{body}</div></div>
    <div class="review-actions">{apply_btn}{analysis_btn}</div>
    {panel}
</div>"#,
        id = card.id,
        title = html_escape(&card.title),
        name = html_escape(&card.name),
        meta = html_escape(&card.meta_line),
        body = card.body_html,
    )
}

fn render_analysis(summary: &AnalysisSummary) -> String {
    if summary.is_empty() {
        return "No analysis data available.".to_string();
    }

    let categories = summary
        .categories
        .iter()
        .map(|c| html_escape(c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"<div class="analysis-row">
        <div><strong>Categories:</strong> {categories}</div>
        <div><strong>Metrics:</strong>
            <span class="metric-positive">{pos} Positive</span>,
            <span class="metric-negative">{neg} Negative</span>,
            <span class="metric-neutral">{neu} Neutral</span>
        </div>
    </div>"#,
        pos = summary.positive,
        neg = summary.negative,
        neu = summary.neutral,
    )
}

// --- Helpers ---

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} — ReviewLens</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;display:flex;align-items:center;justify-content:space-between;}}
.header h1{{font-size:18px;font-weight:600;}}
.container{{max-width:720px;margin:0 auto;padding:24px;}}
.loading{{color:#888;text-align:center;padding:40px;}}
.review-card{{position:relative;background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.review-card:hover{{border-color:#999;}}
.card-link{{position:absolute;inset:0;border-radius:8px;}}
.review-card-title{{font-size:16px;font-weight:600;margin-bottom:8px;}}
.review-user-row{{display:flex;align-items:center;gap:10px;margin-bottom:8px;}}
.avatar-circle{{width:36px;height:36px;border-radius:50%;background:#e3f2fd;display:flex;align-items:center;justify-content:center;flex-shrink:0;}}
.avatar-initials{{font-size:15px;font-weight:600;color:#1565c0;}}
.user-name{{font-size:14px;font-weight:500;}}
.user-meta-sub{{font-size:12px;color:#888;}}
.review-url-tiny{{font-size:11px;color:#0066cc;margin-bottom:8px;word-break:break-all;}}
.review-body{{margin-bottom:12px;}}
.review-text{{font-size:14px;color:#333;line-height:1.5;}}
.highlight-positive{{background:rgba(46,125,50,0.18);border-radius:2px;}}
.highlight-negative{{background:rgba(198,40,40,0.18);border-radius:2px;}}
.highlight-neutral{{background:rgba(230,81,0,0.18);border-radius:2px;}}
.review-actions{{position:relative;z-index:1;display:flex;gap:8px;}}
.btn{{display:inline-block;padding:6px 14px;border-radius:4px;font-size:13px;font-weight:500;text-decoration:none;}}
.btn-primary{{background:#0066cc;color:#fff;}}
.btn-primary:hover{{background:#004499;}}
.btn-primary.applied{{background:#2e7d32;cursor:default;}}
.btn-secondary{{background:#f0f0f0;color:#333;}}
.btn-secondary:hover{{background:#ddd;}}
.ai-analysis-panel{{margin-top:12px;padding:10px 12px;background:#f5f5f5;border-radius:4px;font-size:13px;}}
.analysis-row{{display:flex;gap:15px;flex-wrap:wrap;}}
.metric-positive{{color:#2e7d32;}}
.metric-negative{{color:#c62828;}}
.metric-neutral{{color:#e65100;}}
</style>
</head>
<body>
<div class="header">
    <h1>ReviewLens</h1>
</div>
{content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
