use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::session::read_selection;
use crate::models::{SessionSnapshot, UploadStatus};
use crate::services::notifier::Celebration;
use crate::services::storage::ObjectStore;
use crate::utils::html::escape_html;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f3f4f6; display: flex; min-height: 100vh; align-items: center; justify-content: center; margin: 0; }
.card { background: #fff; border: 1px solid #9ca3af; border-radius: 0.5rem; padding: 1.5rem; width: 100%; max-width: 32rem; box-shadow: 0 4px 12px rgba(0,0,0,.15); text-align: center; }
.actions { display: flex; gap: 1rem; justify-content: center; flex-wrap: wrap; }
button { padding: 0.75rem 1.5rem; border: 0; border-radius: 0.5rem; color: #fff; background: #16a34a; cursor: pointer; }
button:disabled { cursor: not-allowed; opacity: .8; }
.preview { max-width: 20rem; border-radius: 0.5rem; margin-top: 1.5rem; }
.error { color: #ef4444; margin-top: 1rem; }
.confetti { position: fixed; inset: 0; pointer-events: none; overflow: hidden; }
.confetti span { position: absolute; width: 8px; height: 8px; border-radius: 2px; animation: burst 1.6s ease-out forwards; }
@keyframes burst { from { transform: translate(0, 0) rotate(0); opacity: 1; } to { transform: translate(var(--dx), var(--dy)) rotate(540deg); opacity: 0; } }
"#;

const COLORS: [&str; 5] = ["#26ccff", "#a25afd", "#ff5e7e", "#88ff5a", "#fcff42"];

/// Confetti burst markup. Particles fan out over `spread` degrees from a
/// point `origin_y` down the viewport.
pub fn render_celebration(celebration: &Celebration) -> String {
    let mut out = String::from(r#"<div class="confetti" aria-hidden="true">"#);
    let count = celebration.particle_count.max(1);
    let spread = celebration.spread as f32;

    for i in 0..count {
        let fraction = i as f32 / count as f32;
        let angle = (-90.0 - spread / 2.0 + spread * fraction).to_radians();
        let distance = 120.0 + ((i * 53) % 200) as f32;
        let dx = angle.cos() * distance;
        let dy = angle.sin() * distance;
        let _ = write!(
            out,
            r#"<span style="left:50%;top:{:.0}%;background:{};--dx:{:.0}px;--dy:{:.0}px"></span>"#,
            celebration.origin_y * 100.0,
            COLORS[i as usize % COLORS.len()],
            dx,
            dy
        );
    }

    out.push_str("</div>");
    out
}

pub fn render_page(snapshot: &SessionSnapshot, celebration: Option<&Celebration>) -> String {
    let uploading = snapshot.status == UploadStatus::Uploading;
    let mut body = String::new();

    body.push_str(r#"<div class="card"><h1>Upload Your File</h1><div class="actions">"#);
    body.push_str(
        r#"<form method="post" action="/select" enctype="multipart/form-data">"#,
    );
    body.push_str(r#"<input type="file" name="file" onchange="this.form.submit()"> "#);
    body.push_str(r#"<noscript><button type="submit">Choose File</button></noscript></form>"#);
    let _ = write!(
        body,
        r#"<form method="post" action="/upload"><button type="submit"{}>{}</button></form>"#,
        if uploading { " disabled" } else { "" },
        if uploading { "Uploading..." } else { "Upload" }
    );
    body.push_str("</div>");

    if let Some(name) = &snapshot.file_name {
        let _ = write!(body, "<p>{}</p>", escape_html(name));
    }

    if let (Some(url), true) = (&snapshot.preview_url, snapshot.is_image) {
        let _ = write!(
            body,
            r#"<img class="preview" src="{}" alt="Selected file">"#,
            escape_html(url)
        );
    }

    if let Some(error) = &snapshot.error_message {
        let _ = write!(body, r#"<p class="error">{}</p>"#, escape_html(error));
    }

    if let (UploadStatus::Succeeded, Some(url)) = (snapshot.status, &snapshot.preview_url) {
        let _ = write!(
            body,
            r#"<p>Access your file <a href="{}" target="_blank" rel="noopener noreferrer">here</a>.</p>"#,
            escape_html(url)
        );
    }

    body.push_str("</div>");

    if let Some(celebration) = celebration {
        body.push_str(&render_celebration(celebration));
    }

    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>Upload Your File</title><style>{}</style></head><body>{}</body></html>",
        STYLE, body
    )
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.widget.snapshot().await;
    let celebration = state.celebration.as_ref().and_then(|hook| hook.take());
    Html(render_page(&snapshot, celebration.as_ref()))
}

pub async fn select_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    if let Some(file) = read_selection(&mut multipart, state.config.max_file_size).await? {
        state.widget.select_file(file).await;
    }
    Ok(Redirect::to("/"))
}

pub async fn upload_form(State(state): State<AppState>) -> Redirect {
    state.widget.upload().await;
    Redirect::to("/")
}

/// Serves objects held by the in-memory store.
pub async fn serve_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let objects = state
        .objects
        .as_ref()
        .filter(|store| store.bucket() == bucket)
        .ok_or_else(|| AppError::NotFound(format!("Bucket '{}' is not served here", bucket)))?;

    let object = objects
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", key)))?;

    Ok(([(header::CONTENT_TYPE, object.content_type)], object.data).into_response())
}
