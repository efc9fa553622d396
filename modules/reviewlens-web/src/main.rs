use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use reviewlens_annotate::{highlight_fragments, AnalysisSummary};
use reviewlens_common::{Config, Review};
use reviewlens_store::ReviewStore;

mod templates;
use templates::*;

// --- App State ---

struct AppState {
    store: ReviewStore,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reviewlens=info".parse()?))
        .init();

    let config = Config::from_env();

    let store = ReviewStore::load(Path::new(&config.reviews_csv));
    if let Some(message) = store.startup_error() {
        warn!(error = message, "Serving without review data");
    }

    let state = Arc::new(AppState { store });
    let app = app(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("ReviewLens web server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(reviews_page))
        .route("/api/reviews", get(api_reviews))
        .route("/health", get(health))
        .with_state(state)
        // No caching: per-card state travels in the query string
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Logging layer: method + path only (query strings carry view state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Handlers ---

#[derive(Deserialize)]
struct PageQuery {
    ai: Option<String>,
    panel: Option<String>,
}

async fn reviews_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> impl IntoResponse {
    match state.store.reviews() {
        Ok(reviews) => {
            let ai = parse_ids(params.ai.as_deref());
            let panel = parse_ids(params.panel.as_deref());
            let cards = build_cards(reviews, &ai, &panel);
            Html(render_cards(&cards))
        }
        Err(message) => {
            warn!(error = message, "Serving error page");
            Html(render_load_error())
        }
    }
}

async fn api_reviews(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.reviews() {
        Ok(reviews) => Json(reviews).into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": message,
                "details": "Check server logs for more info",
            })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": if state.store.startup_error().is_none() { "ok" } else { "error" },
        "reviews_count": state.store.count(),
        "startup_error": state.store.startup_error(),
        "loaded_at": state.store.loaded_at(),
    }))
}

// --- View Models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    Plain,
    HighlightsApplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    AnalysisHidden,
    AnalysisShown,
}

/// Per-card view state, owned here and encoded in the query string —
/// never read back from markup.
#[derive(Debug, Clone, Copy)]
pub struct CardState {
    pub highlight: HighlightState,
    pub analysis: AnalysisState,
}

pub struct CardView {
    pub id: String,
    pub title: String,
    pub name: String,
    pub initial: char,
    pub avatar_image: String,
    pub meta_line: String,
    pub review_url: String,
    pub body_html: String,
    pub apply_href: String,
    pub analysis_href: String,
    pub state: CardState,
    pub analysis: AnalysisSummary,
}

fn parse_ids(raw: Option<&str>) -> HashSet<Uuid> {
    raw.map(|s| {
        s.split(',')
            .filter_map(|part| Uuid::parse_str(part.trim()).ok())
            .collect()
    })
    .unwrap_or_default()
}

fn build_cards(reviews: &[Review], ai: &HashSet<Uuid>, panel: &HashSet<Uuid>) -> Vec<CardView> {
    // Store-order id lists keep the generated hrefs deterministic.
    let ai_ids: Vec<Uuid> = reviews.iter().map(|r| r.id).filter(|id| ai.contains(id)).collect();
    let panel_ids: Vec<Uuid> =
        reviews.iter().map(|r| r.id).filter(|id| panel.contains(id)).collect();

    reviews
        .iter()
        .map(|review| card_view(review, &ai_ids, &panel_ids))
        .collect()
}

fn card_view(review: &Review, ai_ids: &[Uuid], panel_ids: &[Uuid]) -> CardView {
    let state = CardState {
        highlight: if ai_ids.contains(&review.id) {
            HighlightState::HighlightsApplied
        } else {
            HighlightState::Plain
        },
        analysis: if panel_ids.contains(&review.id) {
            AnalysisState::AnalysisShown
        } else {
            AnalysisState::AnalysisHidden
        },
    };

    // "Apply AI" is one-way; the analysis link toggles.
    let apply_href = match state.highlight {
        HighlightState::Plain => {
            let mut with_this = ai_ids.to_vec();
            with_this.push(review.id);
            page_href(&with_this, panel_ids)
        }
        HighlightState::HighlightsApplied => page_href(ai_ids, panel_ids),
    };
    let analysis_href = match state.analysis {
        AnalysisState::AnalysisHidden => {
            let mut with_this = panel_ids.to_vec();
            with_this.push(review.id);
            page_href(ai_ids, &with_this)
        }
        AnalysisState::AnalysisShown => {
            let without: Vec<Uuid> =
                panel_ids.iter().copied().filter(|id| *id != review.id).collect();
            page_href(ai_ids, &without)
        }
    };

    // The plain card shows the untranslated review; applying AI swaps in the
    // translation (when present) underneath the highlights.
    let body_html = match state.highlight {
        HighlightState::HighlightsApplied => {
            highlight_fragments(review.display_text(), &review.fragments)
        }
        HighlightState::Plain => highlight_fragments(&review.review, &[]),
    };

    let title = if review.review_title.is_empty() {
        "Review".to_string()
    } else {
        review.review_title.clone()
    };
    let name = if review.name.is_empty() {
        "Anonymous".to_string()
    } else {
        review.name.clone()
    };
    let initial = review
        .name
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('A');
    let avatar_image = if review.image.starts_with("http") {
        review.image.clone()
    } else {
        String::new()
    };

    let sex_display = match review.sex.as_str() {
        "F" => "♀",
        "M" => "♂",
        "" => "?",
        other => other,
    };
    let lang = if review.idiom.is_empty() {
        "EN".to_string()
    } else {
        review.idiom.to_uppercase()
    };

    CardView {
        id: review.id.to_string(),
        title,
        name,
        initial,
        avatar_image,
        meta_line: format!("{sex_display} • {lang}"),
        review_url: review.review_url.clone(),
        body_html,
        apply_href,
        analysis_href,
        state,
        analysis: AnalysisSummary::from_fragments(&review.fragments),
    }
}

fn page_href(ai_ids: &[Uuid], panel_ids: &[Uuid]) -> String {
    let mut params = Vec::new();
    if !ai_ids.is_empty() {
        params.push(format!("ai={}", join_ids(ai_ids)));
    }
    if !panel_ids.is_empty() {
        params.push(format!("panel={}", join_ids(panel_ids)));
    }
    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use reviewlens_common::Fragment;
    use tower::ServiceExt;

    fn make_review(name: &str, text: &str, fragments: Vec<Fragment>) -> Review {
        Review {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sex: "F".to_string(),
            idiom: "es".to_string(),
            image: String::new(),
            review_title: String::new(),
            review: text.to_string(),
            translated_review: String::new(),
            review_url: String::new(),
            rate: "4.0".to_string(),
            date: "2024-05-01".to_string(),
            num_reviews_usuario: "3".to_string(),
            fragments,
        }
    }

    fn frag(text: &str, sentiment: &str) -> Fragment {
        Fragment {
            text: text.to_string(),
            sentiment: sentiment.to_string(),
            category: "Service".to_string(),
            subcategory: String::new(),
        }
    }

    fn loaded_app(reviews: Vec<Review>) -> Router {
        app(Arc::new(AppState {
            store: ReviewStore::from_reviews(reviews),
        }))
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn page_with_no_reviews_shows_empty_message() {
        let (status, body) = get_body(loaded_app(vec![]), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No reviews found."));
    }

    #[tokio::test]
    async fn failed_store_shows_error_page_and_api_500() {
        let router = app(Arc::new(AppState {
            store: ReviewStore::failed("Error loading data: data file not found at /tmp/x.csv"),
        }));

        let (status, body) = get_body(router.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error loading reviews. Is the backend running?"));

        let (status, body) = get_body(router, "/api/reviews").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("not found"));
        assert_eq!(payload["details"], "Check server logs for more info");
    }

    #[tokio::test]
    async fn api_returns_reviews_in_store_order() {
        let reviews = vec![
            make_review("Ana", "First text", vec![]),
            make_review("Bo", "Second text", vec![]),
        ];
        let (status, body) = get_body(loaded_app(reviews), "/api/reviews").await;
        assert_eq!(status, StatusCode::OK);
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        let arr = payload.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["name"], "Ana");
        assert_eq!(arr[1]["review"], "Second text");
    }

    #[tokio::test]
    async fn health_reports_ok_and_error_states() {
        let (_, body) = get_body(loaded_app(vec![make_review("Ana", "x", vec![])]), "/health").await;
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["reviews_count"], 1);
        assert!(payload["startup_error"].is_null());
        assert!(payload["loaded_at"].is_string());

        let router = app(Arc::new(AppState {
            store: ReviewStore::failed("boom"),
        }));
        let (_, body) = get_body(router, "/health").await;
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["reviews_count"], 0);
        assert_eq!(payload["startup_error"], "boom");
        assert!(payload["loaded_at"].is_null());
    }

    #[tokio::test]
    async fn applying_ai_highlights_the_card() {
        let review = make_review(
            "Ana",
            "great service today",
            vec![frag("great service", "positive"), frag("service", "negative")],
        );
        let id = review.id;
        let router = loaded_app(vec![review]);

        let (_, plain) = get_body(router.clone(), "/").await;
        assert!(!plain.contains(r#"<span class="highlight-"#));
        assert!(plain.contains("Apply AI"));

        let (_, applied) = get_body(router, &format!("/?ai={id}")).await;
        assert!(applied.contains(
            r#"<span class="highlight-positive" title="Service">great service</span> today"#
        ));
        assert!(applied.contains("AI Applied"));
    }

    #[tokio::test]
    async fn analysis_panel_toggles_through_the_query_string() {
        let review = make_review(
            "Ana",
            "great service today",
            vec![frag("great service", "positive"), frag("slow", "negative")],
        );
        let id = review.id;
        let router = loaded_app(vec![review]);

        let (_, shown) = get_body(router.clone(), &format!("/?panel={id}")).await;
        assert!(shown.contains("1 Positive"));
        assert!(shown.contains("1 Negative"));
        // The toggle link drops the id again
        assert!(shown.contains(r#"href="/">Analysis</a>"#));

        let (_, hidden) = get_body(router, "/").await;
        assert!(!hidden.contains(r#"<div class="ai-analysis-panel">"#));
        assert!(hidden.contains(&format!(r#"href="/?panel={id}">Analysis</a>"#)));
    }

    #[tokio::test]
    async fn malformed_state_ids_are_ignored() {
        let review = make_review("Ana", "fine", vec![]);
        let router = loaded_app(vec![review]);
        let (status, body) = get_body(router, "/?ai=not-a-uuid,,42&panel=zzz").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Apply AI"));
        assert!(!body.contains(r#"<div class="ai-analysis-panel">"#));
    }

    #[tokio::test]
    async fn end_to_end_serves_a_loaded_csv() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "review,name,subcategory_fragment,subcategory_sentiment,category\n\
             Loved the stay,Ana,loved the stay,positive,Stay\n"
        )
        .unwrap();

        let store = ReviewStore::load(file.path());
        let router = app(Arc::new(AppState { store }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let base = format!("http://{addr}");
        let reviews: serde_json::Value = reqwest::get(format!("{base}/api/reviews"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reviews.as_array().unwrap().len(), 1);
        assert_eq!(reviews[0]["fragments"][0]["sentiment"], "positive");

        let health: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["reviews_count"], 1);

        let page = reqwest::get(base).await.unwrap().text().await.unwrap();
        assert!(page.contains("Loved the stay"));
    }

    #[tokio::test]
    async fn responses_carry_no_store_headers() {
        let response = loaded_app(vec![])
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");
    }

    #[test]
    fn card_defaults_mask_missing_fields() {
        let mut review = make_review("", "body", vec![]);
        review.sex = String::new();
        review.idiom = String::new();
        let card = card_view(&review, &[], &[]);
        assert_eq!(card.title, "Review");
        assert_eq!(card.name, "Anonymous");
        assert_eq!(card.initial, 'A');
        assert_eq!(card.meta_line, "? • EN");
        assert!(card.avatar_image.is_empty());
    }

    #[test]
    fn avatar_uses_image_only_when_http() {
        let mut review = make_review("ana", "body", vec![]);
        review.image = "not-a-url.png".to_string();
        let card = card_view(&review, &[], &[]);
        assert!(card.avatar_image.is_empty());
        assert_eq!(card.initial, 'A');

        review.image = "https://cdn.example.com/a.png".to_string();
        let card = card_view(&review, &[], &[]);
        assert_eq!(card.avatar_image, "https://cdn.example.com/a.png");
    }

    #[test]
    fn plain_body_shows_the_untranslated_review() {
        let mut review = make_review("Ana", "La habitación estaba limpia", vec![]);
        review.translated_review = "The room was clean".to_string();
        let card = card_view(&review, &[], &[]);
        assert_eq!(card.body_html, "La habitación estaba limpia");
    }

    #[test]
    fn applied_body_uses_the_translation_when_present() {
        let mut review = make_review(
            "Ana",
            "La habitación estaba limpia",
            vec![frag("room was clean", "positive")],
        );
        review.translated_review = "The room was clean".to_string();
        let card = card_view(&review, &[review.id], &[]);
        assert_eq!(
            card.body_html,
            r#"The <span class="highlight-positive" title="Service">room was clean</span>"#
        );
    }

    #[test]
    fn applied_body_falls_back_to_the_review_without_translation() {
        let review = make_review("Ana", "fine stay", vec![frag("fine stay", "pos")]);
        let card = card_view(&review, &[review.id], &[]);
        assert_eq!(
            card.body_html,
            r#"<span class="highlight-positive" title="Service">fine stay</span>"#
        );
    }

    #[test]
    fn hrefs_preserve_other_cards_state() {
        let a = make_review("Ana", "a", vec![]);
        let b = make_review("Bo", "b", vec![]);
        let apply = &card_view(&b, &[a.id], &[a.id]).apply_href;
        assert_eq!(apply, &format!("/?ai={},{}&panel={}", a.id, b.id, a.id));
    }
}
