use axum::{body::Body, extract::{Query, State}, response::{IntoResponse, Response}, routing::get, Router};
use http::{header::{CONTENT_DISPOSITION, CONTENT_TYPE}, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{model::SwapController, tools::http_tools::guess_filename, Error, Result};


#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadQuery {
	pub url: String,
}

pub fn routes(mc: SwapController) -> Router {
	Router::new()
		.route("/download-image", get(handler_download))
		.with_state(mc)
}

/// Proxies a remote image back to the caller with its upstream content-type,
/// so the browser can save it without tripping over CORS.
async fn handler_download(State(mc): State<SwapController>, Query(query): Query<DownloadQuery>) -> Result<Response> {
	let (bytes, content_type) = mc.fetch_image(&query.url).await?;

	let mut headers = HeaderMap::new();
	if let Some(content_type) = &content_type {
		let value = HeaderValue::from_str(content_type).map_err(|_| Error::Error { message: format!("Invalid upstream content type: {}", content_type) })?;
		headers.insert(CONTENT_TYPE, value);
	}
	let filename = guess_filename(&query.url, &content_type);
	if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
		headers.insert(CONTENT_DISPOSITION, value);
	}

	Ok((headers, Body::from(bytes)).into_response())
}
