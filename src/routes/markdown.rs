use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::extract::ApiJson;
use crate::markdown;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
}

pub async fn render_markdown(
    _auth: AuthUser,
    ApiJson(request): ApiJson<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    Ok(Json(RenderResponse {
        html: markdown::render(&request.content),
    }))
}
