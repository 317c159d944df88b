//! `GET /v0/?<openurl>` resolution endpoint

use std::any::Any;
use std::future::Future;

use ariadne_common::api::ResolverResponse;
use axum::extract::{RawQuery, State};
use axum::Json;
use tokio::task::{AbortHandle, JoinError};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::normalize::to_response;
use crate::AppState;

/// Aborts the wrapped task when dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `future` as its own task so a panic inside it becomes
/// [`ApiError::Internal`] instead of tearing down the connection.
///
/// Dropping the returned future (client went away) aborts the task.
pub async fn run_isolated<F, T>(future: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(future);
    let _guard = AbortOnDrop(handle.abort_handle());

    match handle.await {
        Ok(result) => result,
        Err(e) => Err(ApiError::Internal(join_error_message(e))),
    }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "resolution was cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => panic_message(payload),
        Err(error) => error.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "resolution panicked".to_string()
    }
}

/// GET /v0/
///
/// The whole query string is the OpenURL; a missing query string is an
/// empty citation, which the coverage service rejects.
pub async fn resolve(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> ApiResult<Json<ResolverResponse>> {
    let raw_query = raw_query.unwrap_or_default();
    let span = info_span!("resolve", request_id = %Uuid::new_v4(), query = %raw_query);

    let resolver = state.resolver.clone();
    let resolution = async move {
        let result = resolver.resolve(&raw_query).await?;
        let source = result.source;
        let response = to_response(result);

        let response_json = serde_json::to_string(&response).unwrap_or_default();
        info!(source = source.as_str(), response = %response_json, "Resolved");
        Ok::<_, ApiError>(response)
    }
    .instrument(span.clone());

    let response = run_isolated(resolution).instrument(span).await?;
    Ok(Json(response))
}
