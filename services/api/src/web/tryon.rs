//! services/api/src/web/tryon.rs
//!
//! The multipart try-on upload. The pipeline runs inside the request and the
//! terminal job is returned; it stays readable under its id for an hour.

use crate::web::protocol::JobResponse;
use crate::web::rest::port_error_response;
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use fit_advisor_core::domain::{Category, ImageInput, ProductInfo};
use std::sync::Arc;
use tracing::info;

/// The form fields of `POST /ai/try-on`, as received.
#[derive(Debug, Default)]
struct TryOnForm {
    user_image: Option<ImageInput>,
    garment_image: Option<ImageInput>,
    product_id: Option<String>,
    product_name: Option<String>,
    product_type: Option<String>,
    product_sizes: Option<String>,
    product_material: Option<String>,
}

impl TryOnForm {
    fn into_parts(self) -> Result<(ProductInfo, ImageInput, ImageInput), (StatusCode, String)> {
        let user_image = self.user_image.ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include user_image".to_string(),
            )
        })?;
        let product_id = self.product_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include product_id".to_string(),
            )
        })?;
        let category = match self.product_type.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                name.trim().parse::<Category>().map_err(port_error_response)?
            }
            _ => Category::UpperBody,
        };

        let mut product = ProductInfo::new(product_id, category);
        if let Some(name) = self.product_name.filter(|n| !n.trim().is_empty()) {
            product.name = name;
        }
        if let Some(sizes) = self.product_sizes {
            let sizes: Vec<String> = sizes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !sizes.is_empty() {
                product.sizes = sizes;
            }
        }
        if let Some(material) = self.product_material.filter(|m| !m.trim().is_empty()) {
            product.material = material;
        }

        let garment_image = self
            .garment_image
            .unwrap_or_else(|| ImageInput::new("application/octet-stream", Bytes::new()));
        Ok((product, user_image, garment_image))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<TryOnForm, (StatusCode, String)> {
    let mut form = TryOnForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_image" | "garment_image" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                let image = ImageInput::new(mime_type, data);
                if name == "user_image" {
                    form.user_image = Some(image);
                } else {
                    form.garment_image = Some(image);
                }
            }
            "product_id" | "product_name" | "product_type" | "product_sizes"
            | "product_material" => {
                let value = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read field {}: {}", name, e),
                    )
                })?;
                let slot = match name.as_str() {
                    "product_id" => &mut form.product_id,
                    "product_name" => &mut form.product_name,
                    "product_type" => &mut form.product_type,
                    "product_sizes" => &mut form.product_sizes,
                    _ => &mut form.product_material,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Run a virtual try-on for a shopper photo.
///
/// Accepts a multipart/form-data request. `user_image` is required (JPEG,
/// PNG or WebP, at most 5 MB); `garment_image` is optional.
#[utoipa::path(
    post,
    path = "/ai/try-on",
    request_body(content_type = "multipart/form-data", description = "user_image, garment_image, product_id, product_name, product_type, product_sizes (comma separated), product_material."),
    responses(
        (status = 200, description = "The finished job; `success` is false when it failed", body = JobResponse),
        (status = 400, description = "Missing field or invalid image"),
        (status = 404, description = "Unknown product type"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn try_on_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (product, user_image, garment_image) = read_form(multipart).await?.into_parts()?;
    info!(
        "Received try-on for product {} ({} bytes)",
        product.id,
        user_image.data.len()
    );

    let job = app_state
        .tryon
        .submit(&product, &user_image, &garment_image)
        .await
        .map_err(port_error_response)?;

    Ok(Json(JobResponse::from(job)))
}
