//! # Preview Server Routes
//!
//! Actix handlers for the preview server. `/` serves the start-up visualization
//! as a standalone page; `/render` turns a posted `{component, props}` JSON body
//! into an HTML fragment (or page).

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::Value;

use crate::render::{RenderedHtml, Renderer};

pub const DEFAULT_TITLE: &str = "CircuitsVis";

/// Largest accepted `/render` body. Attention props for a few dozen heads over
/// a few hundred tokens run to tens of megabytes of JSON.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared, read-only state of the preview server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub renderer: Renderer,
    /// Visualization shown on `/`, if one was given at start-up.
    pub initial: Option<RenderedHtml>,
    pub title: String,
}

impl AppState {
    pub fn new(renderer: Renderer, initial: Option<RenderedHtml>) -> Self {
        AppState {
            renderer,
            initial,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Body of a `POST /render` request.
#[derive(Deserialize, Debug)]
pub struct RenderRequest {
    pub component: String,
    #[serde(default)]
    pub props: Value,
    #[serde(default)]
    pub standalone: bool,
    pub title: Option<String>,
}

/// Serves the start-up visualization, or a short usage note without one.
pub async fn index(state: web::Data<AppState>) -> impl Responder {
    let body = match &state.initial {
        Some(html) => html.to_document(&state.title),
        None => format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<p>No visualization loaded. POST <code>{{\"component\": ..., \"props\": ...}}</code> to <code>/render</code>.</p>\n</body>\n</html>\n",
            html_escape::encode_text(&state.title)
        ),
    };
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

/// Renders the posted component and props.
///
/// # Returns
/// - **200 OK** with the HTML fragment, or a full page when `standalone` is set.
/// - **400 Bad Request** with an HTML error message when the body is not a valid
///   request or the component name is rejected.
pub async fn render_props(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: RenderRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected render request with invalid JSON: {}", e);
            return error_response(&format!("Invalid request body: {}", e));
        }
    };

    match state.renderer.render(&request.component, &request.props) {
        Ok(html) => {
            let body = if request.standalone {
                let title = request.title.as_deref().unwrap_or(&state.title);
                html.to_document(title)
            } else {
                html.notebook_html().to_string()
            };
            HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
        }
        Err(e) => {
            log::warn!("Rejected render request for {:?}: {}", request.component, e);
            error_response(&e.to_string())
        }
    }
}

fn error_response(message: &str) -> HttpResponse {
    let body = format!(
        "<div class=\"error-message\"><h2>Render Failed:</h2><p>{}</p></div>",
        html_escape::encode_text(message)
    );
    HttpResponse::BadRequest().content_type("text/html; charset=utf-8").body(body)
}

/// Registers the preview routes on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .route("/", web::get().to(index))
        .route("/render", web::post().to(render_props));
}

/// Runs the preview server until it is stopped.
pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    log::info!("Starting preview server at http://{}:{}/", host, port);
    let data = web::Data::new(state);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}
