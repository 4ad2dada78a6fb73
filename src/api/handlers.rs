// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::discovery::DiscoveryService;
use crate::registry::{DiscoveryError, Filter, Record, Status};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Registry errors as HTTP responses
#[derive(Debug)]
pub struct ApiError(pub DiscoveryError);

impl From<DiscoveryError> for ApiError {
    fn from(err: DiscoveryError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DiscoveryError::InvalidRecord(_) | DiscoveryError::IdMismatch { .. } => StatusCode::BAD_REQUEST,
            DiscoveryError::NotFound(_) => StatusCode::NOT_FOUND,
            DiscoveryError::AlreadyPublished(_) => StatusCode::CONFLICT,
            DiscoveryError::StoreUnavailable(_) | DiscoveryError::ServiceClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.0, "Registry request failed");
        } else {
            warn!(error = %self.0, "Registry request rejected");
        }
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub struct ApiHandlers {
    service: Arc<DiscoveryService>,
}

impl ApiHandlers {
    pub fn new(service: Arc<DiscoveryService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<DiscoveryService> {
        &self.service
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<ApiResponse<&'static str>> {
        Json(ApiResponse::success("ok"))
    }

    pub async fn publish(&self, Json(record): Json<Record>) -> ApiResult<Record> {
        let published = self.service.publish(record).await?;
        info!(registration_id = ?published.id(), "Publish request completed");
        Ok(Json(ApiResponse::success(published)))
    }

    pub async fn list_records(
        &self,
        Query(params): Query<HashMap<String, String>>,
    ) -> ApiResult<Vec<Record>> {
        let filter: Filter = params.into_iter().collect();
        let records = self.service.get_records(&filter).await?;
        Ok(Json(ApiResponse::success(records)))
    }

    /// First match, `data: null` when nothing matches
    pub async fn first_record(
        &self,
        Query(params): Query<HashMap<String, String>>,
    ) -> ApiResult<Option<Record>> {
        let filter: Filter = params.into_iter().collect();
        let record = self.service.get_record(&filter).await?;
        Ok(Json(ApiResponse::success(record)))
    }

    pub async fn get_record(&self, Path(id): Path<String>) -> ApiResult<Record> {
        match self.service.get_record(&Filter::by_registration_id(&id)).await? {
            Some(record) => Ok(Json(ApiResponse::success(record))),
            None => Err(DiscoveryError::NotFound(id).into()),
        }
    }

    pub async fn update_record(
        &self,
        Path(id): Path<String>,
        Json(record): Json<Record>,
    ) -> ApiResult<Record> {
        let updated = self.service.update_at(&id, record).await?;
        Ok(Json(ApiResponse::success(updated)))
    }

    pub async fn set_status(
        &self,
        Path(id): Path<String>,
        Json(request): Json<StatusRequest>,
    ) -> ApiResult<Record> {
        let updated = self.service.set_status(&id, request.status).await?;
        Ok(Json(ApiResponse::success(updated)))
    }

    pub async fn unpublish(&self, Path(id): Path<String>) -> ApiResult<()> {
        self.service.unpublish(&id).await?;
        Ok(Json(ApiResponse::success(())))
    }
}
