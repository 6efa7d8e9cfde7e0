use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, Responder, Result, web};
use log::{error, info};
use validator::Validate;

use super::{json_error, store_error};
use crate::encoder::QrContent;
use crate::middlewares::authmw::Session;
use crate::models::plan::Plan;
use crate::models::qr_record::QrRecord;
use crate::state::app_state::AppState;
use crate::structs::qr_request::{CreateQrRequest, EncodeResponse, PreviewRequest};
use crate::style::render::DocumentInfo;
use crate::style::{Export, ExportFormat, RenderOptions, StyleConfig, export};

/// Free plans render with the default look whatever the request asks for.
fn style_for(plan: Plan, style: StyleConfig) -> StyleConfig {
    if plan.capabilities().custom_style {
        style
    } else {
        StyleConfig::default()
    }
}

fn checked_style(plan: Plan, style: StyleConfig) -> Result<StyleConfig> {
    let style = style_for(plan, style);
    style
        .check_colors()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, &e.to_string()))?;
    Ok(style)
}

fn parse_format(plan: Plan, format: &str) -> Result<ExportFormat> {
    let format = format
        .parse::<ExportFormat>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, &e))?;
    if format == ExportFormat::Svg && !plan.capabilities().svg_export {
        return Err(json_error(
            StatusCode::FORBIDDEN,
            "SVG export requires the Pro plan",
        ));
    }
    Ok(format)
}

/// Run the renderer off the async workers.
async fn render(
    app_state: &AppState,
    options: RenderOptions,
    format: ExportFormat,
    info: DocumentInfo,
) -> Result<Export> {
    let renderer = app_state.renderer.clone();
    let rendered = web::block(move || export(renderer.as_ref(), &options, format, &info))
        .await
        .map_err(|e| {
            error!("Render task failed: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate QR code")
        })?;
    rendered.map_err(|e| {
        error!("Rendering {} failed: {}", format, e);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate QR code")
    })
}

fn attachment(file: Export) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((header::CONTENT_DISPOSITION, file.content_disposition()))
        .body(file.bytes)
}

fn plan_of(session: &Option<Session>) -> Plan {
    session.as_ref().map(|s| s.plan).unwrap_or_default()
}

/// Encode a form into its payload string.
pub async fn encode_content(web::Json(content): web::Json<QrContent>) -> impl Responder {
    let payload = content.encode();
    HttpResponse::Ok().json(EncodeResponse {
        kind: content.kind(),
        payload: payload.value,
        placeholder: payload.placeholder,
    })
}

/// Render an unsaved design as a download. Anonymous callers get the free plan.
pub async fn export_design(
    app_state: web::Data<AppState>,
    session: Option<Session>,
    path: web::Path<String>,
    web::Json(req): web::Json<PreviewRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }
    let plan = plan_of(&session);
    let format = parse_format(plan, &path.into_inner())?;

    let payload = req.content.encode();
    let options = checked_style(plan, req.style)?.render_options(&payload.value);
    let info = DocumentInfo {
        title: req.title,
        kind: req.content.kind(),
    };
    let file = render(&app_state, options, format, info).await?;
    Ok(attachment(file))
}

/// Save a QR code for the caller.
pub async fn create_qr(
    app_state: web::Data<AppState>,
    session: Session,
    web::Json(req): web::Json<CreateQrRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }
    let backend = app_state.backend()?;

    let payload = req.content.encode();
    if payload.placeholder {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Please enter some content for your QR code"
        })));
    }

    let style = checked_style(session.plan, req.style)?;
    let record = QrRecord::new(
        session.user_id,
        req.title,
        req.content.kind(),
        payload.value,
        style.meta(),
    );
    backend.qr.insert_qr(&record).await.map_err(store_error)?;
    info!("Saved {} QR code {} for {}", record.kind, record.id, session.username);

    Ok(HttpResponse::Created().json(record))
}

pub async fn list_qr(app_state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    let backend = app_state.backend()?;
    let records = backend
        .qr
        .list_qr(&session.user_id)
        .await
        .map_err(store_error)?;
    Ok(HttpResponse::Ok().json(records))
}

async fn owned_record(
    app_state: &AppState,
    session: &Session,
    id: &str,
) -> Result<Option<QrRecord>> {
    let backend = app_state.backend()?;
    let record = backend.qr.find_qr(id).await.map_err(store_error)?;
    Ok(record.filter(|r| r.user_id == session.user_id))
}

pub async fn get_qr(
    app_state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match owned_record(&app_state, &session, &path.into_inner()).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        }))),
    }
}

pub async fn delete_qr(
    app_state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let backend = app_state.backend()?;
    let id = path.into_inner();
    let deleted = backend
        .qr
        .delete_qr(&id, &session.user_id)
        .await
        .map_err(store_error)?;
    if !deleted {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        })));
    }
    info!("Deleted QR code {}", id);
    Ok(HttpResponse::NoContent().finish())
}

/// Download a saved code, styled from its stored `meta`.
pub async fn export_qr(
    app_state: web::Data<AppState>,
    session: Session,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (id, format) = path.into_inner();
    let format = parse_format(session.plan, &format)?;
    let record = owned_record(&app_state, &session, &id)
        .await?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "QR code not found"))?;

    let style = style_for(session.plan, StyleConfig::from_meta(&record.meta));
    let options = style.render_options(&record.content);
    let info = DocumentInfo {
        title: record.title,
        kind: record.kind,
    };
    let file = render(&app_state, options, format, info).await?;
    Ok(attachment(file))
}
