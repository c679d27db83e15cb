use std::{sync::Arc, time::Duration};

use askama::Template;
use axum::{
    error_handling::HandleErrorLayer,
    extract::{Extension, Form},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    BoxError, Json, Router, Server,
};
use fabler_backend::StoryBackend;
use fabler_common::{
    download,
    models::{GeneratedStory, Length, StoryRequest, Style},
    Conf, Report,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub async fn run(conf: &Conf) -> Result<(), Report> {
    let backend = fabler_backend::from_conf(conf)?;

    let app: _ = Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_html))
        .route("/download", post(download_file))
        .route("/api", post(generate_api))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|error: BoxError| async move {
                    if error.is::<tower::timeout::error::Elapsed>() {
                        (StatusCode::REQUEST_TIMEOUT, String::new())
                    } else {
                        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                    }
                }))
                .load_shed()
                .concurrency_limit(1024)
                .timeout(Duration::from_secs(120))
                .layer(Extension(backend))
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        );

    tracing::info!("starting on `0.0.0.0:8080`");

    Server::bind(&"0.0.0.0:8080".parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

static STYLE: &str = include_str!("../assets/style.css");

#[derive(askama::Template)]
#[template(path = "index.html")]
struct IndexPage {
    css: &'static str,
    styles: Vec<&'static str>,
    lengths: Vec<&'static str>,
    examples: &'static [(&'static str, &'static str)],
}

async fn index() -> Result<impl IntoResponse, Error> {
    Ok(Html(
        IndexPage {
            css: STYLE,
            styles: Style::ALL.iter().map(Style::as_str).collect(),
            lengths: Length::ALL.iter().map(Length::as_str).collect(),
            examples: &fabler_prompt::EXAMPLE_PREMISES,
        }
        .render()
        .map_err(Error::from_any)?,
    ))
}

#[derive(Debug, serde::Deserialize)]
struct GenerateRequest {
    premise: String,
    style: String,
    length: String,
}

impl GenerateRequest {
    fn into_story_request(self) -> Result<StoryRequest, String> {
        if self.premise.trim().is_empty() {
            return Err("Error: the premise must not be empty".to_string());
        }

        Ok(StoryRequest {
            premise: self.premise.trim().to_string(),
            style: self.style,
            length: self.length,
        })
    }
}

#[derive(askama::Template)]
#[template(path = "story.html")]
struct StoryPage {
    css: &'static str,
    premise: String,
    style: String,
    length: String,
    story: String,
    word_count: usize,
    char_count: usize,
}

#[derive(askama::Template)]
#[template(path = "error.html")]
struct ErrorPage {
    css: &'static str,
    message: String,
}

async fn generate_html(
    Extension(backend): Extension<Arc<dyn StoryBackend>>,
    Form(form): Form<GenerateRequest>,
) -> Result<impl IntoResponse, Error> {
    let page = match form.into_story_request() {
        Ok(request) => match generate(backend.as_ref(), &request).await {
            Ok(story) => StoryPage {
                css: STYLE,
                premise: request.premise,
                style: request.style,
                length: request.length,
                story: story.text,
                word_count: story.word_count,
                char_count: story.char_count,
            }
            .render()
            .map_err(Error::from_any)?,
            Err(message) => ErrorPage {
                css: STYLE,
                message,
            }
            .render()
            .map_err(Error::from_any)?,
        },
        Err(message) => ErrorPage {
            css: STYLE,
            message,
        }
        .render()
        .map_err(Error::from_any)?,
    };

    Ok(Html(page))
}

#[derive(Debug, serde::Deserialize)]
struct DownloadRequest {
    premise: String,
    style: String,
    length: String,
    story: String,
}

async fn download_file(Form(form): Form<DownloadRequest>) -> Result<impl IntoResponse, Error> {
    let request = StoryRequest {
        premise: form.premise,
        style: form.style,
        length: form.length,
    };
    let story = GeneratedStory::new(form.story);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            download::file_name(&request)
        ))
        .map_err(Error::from_any)?,
    );

    Ok((headers, download::document(&request, &story)))
}

async fn generate_api(
    Extension(backend): Extension<Arc<dyn StoryBackend>>,
    Json(body): Json<GenerateRequest>,
) -> Result<impl IntoResponse, Error> {
    let request = match body.into_story_request() {
        Ok(request) => request,
        Err(message) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            ));
        }
    };

    match generate(backend.as_ref(), &request).await {
        Ok(story) => Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "story": story.text,
                "word_count": story.word_count,
                "char_count": story.char_count,
            })),
        )),
        Err(message) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        )),
    }
}

/// Runs one generation and flattens every failure into the `Error:` prefixed
/// string the page and the API both show.
async fn generate(
    backend: &dyn StoryBackend,
    request: &StoryRequest,
) -> Result<GeneratedStory, String> {
    let prompt = fabler_prompt::build_prompt(&request.premise, &request.style, &request.length);

    let raw = match backend.generate(&prompt).await {
        Ok(raw) => raw,
        Err(report) => return Err(format!("Error: {}", report)),
    };

    match fabler_sanitize::sanitize(&raw) {
        Ok(text) => Ok(GeneratedStory::new(text)),
        Err(rejection) => Err(format!("Error: {}", rejection)),
    }
}

#[derive(Debug)]
pub struct Error(Report);

impl Error {
    pub fn from_any<A>(err: A) -> Self
    where
        A: Into<Report>,
    {
        Self(err.into())
    }
}

impl From<Report> for Error {
    fn from(err: Report) -> Self {
        Self(err)
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum_core::response::Response {
        #[derive(serde::Serialize)]
        struct Res {
            error: ResErr,
        }

        #[derive(serde::Serialize)]
        struct ResErr {
            code: u16,
            status: &'static str,
        }

        let err = self.0;

        tracing::error!(error = ?err, "error handling request");

        let (status, message) = (StatusCode::INTERNAL_SERVER_ERROR, "internal server error");

        let body = Res {
            error: ResErr {
                code: status.as_u16(),
                status: message,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_premises_are_refused_before_the_backend_runs() {
        let form = GenerateRequest {
            premise: "   ".to_string(),
            style: "drama".to_string(),
            length: "short".to_string(),
        };

        let error = form.into_story_request().unwrap_err();

        assert!(error.starts_with("Error:"));
    }

    #[test]
    fn premises_are_trimmed_on_the_way_in() {
        let form = GenerateRequest {
            premise: "  a door to yesterday  ".to_string(),
            style: "mysterious".to_string(),
            length: "short".to_string(),
        };

        let request = form.into_story_request().unwrap();

        assert_eq!(request.premise, "a door to yesterday");
    }
}
