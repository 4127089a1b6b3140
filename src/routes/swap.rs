use axum::{extract::{FromRequest, Multipart, Request, State}, routing::post, Json, Router};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde_json::{json, Value};

use crate::{domain::swap::{ImageReference, SwapMode, SwapPayload, SwapRequest}, model::SwapController, tools::{http_tools::extract_header, log::{log_info, LogServiceType}}, Error, Result};


pub fn routes(mc: SwapController) -> Router {
	Router::new()
		.route("/face-swap", post(handler_swap))
		.with_state(mc)
}

async fn handler_swap(State(mc): State<SwapController>, request: Request) -> Result<Json<Value>> {
	let content_type = extract_header(request.headers(), CONTENT_TYPE).unwrap_or_default().to_string();

	let swap_request = if content_type.starts_with("multipart/form-data") {
		let multipart = Multipart::from_request(request, &()).await.map_err(|e| Error::Error { message: format!("Invalid multipart body: {}", e) })?;
		parse_multipart(multipart).await?
	} else {
		let Json(payload) = Json::<SwapPayload>::from_request(request, &()).await.map_err(|e| Error::Error { message: format!("Invalid request body: {}", e) })?;
		SwapRequest::try_from(payload)?
	};
	log_info(LogServiceType::Swap, format!("Received {} request", swap_request.mode));

	// Both slots are checked before any upload or external call happens.
	if swap_request.target.is_empty() {
		return Err(Error::MissingImageSlot("target".to_string()));
	}
	if swap_request.swap.is_empty() {
		return Err(Error::MissingImageSlot("swap".to_string()));
	}

	let target_url = mc.resolve_image(swap_request.target, "target").await?;
	let swap_url = mc.resolve_image(swap_request.swap, "swap").await?;

	match swap_request.mode {
		SwapMode::Align => {
			let result_url = mc.align(&target_url, &swap_url).await?;
			Ok(Json(json!({
				"image_process_response": {
					"result_url": result_url
				}
			})))
		},
		SwapMode::Merge => {
			let result = mc.merge(&target_url, &swap_url).await?;
			Ok(Json(result))
		},
	}
}

async fn parse_multipart(mut multipart: Multipart) -> Result<SwapRequest> {
	let mut target_bytes: Option<(Bytes, Option<String>)> = None;
	let mut swap_bytes: Option<(Bytes, Option<String>)> = None;
	let mut target_url: Option<String> = None;
	let mut swap_url: Option<String> = None;
	let mut mode: Option<String> = None;

	while let Some(field) = multipart.next_field().await.map_err(|e| Error::Error { message: format!("Invalid multipart field: {}", e) })? {
		let Some(name) = field.name().map(|n| n.to_string()) else { continue };
		match name.as_str() {
			"target_image" => {
				let filename = field.file_name().map(|f| f.to_string());
				let data = field.bytes().await.map_err(|e| Error::Error { message: format!("Unable to read target_image: {}", e) })?;
				target_bytes = Some((data, filename));
			},
			"swap_image" => {
				let filename = field.file_name().map(|f| f.to_string());
				let data = field.bytes().await.map_err(|e| Error::Error { message: format!("Unable to read swap_image: {}", e) })?;
				swap_bytes = Some((data, filename));
			},
			"target_url" => {
				let text = field.text().await.map_err(|e| Error::Error { message: format!("Unable to read target_url: {}", e) })?;
				if !text.is_empty() { target_url = Some(text); }
			},
			"swap_url" => {
				let text = field.text().await.map_err(|e| Error::Error { message: format!("Unable to read swap_url: {}", e) })?;
				if !text.is_empty() { swap_url = Some(text); }
			},
			"mode" => {
				let text = field.text().await.map_err(|e| Error::Error { message: format!("Unable to read mode: {}", e) })?;
				if !text.is_empty() { mode = Some(text); }
			},
			_ => {},
		}
	}

	// An uploaded file wins over a URL for the same slot.
	let target = match target_bytes {
		Some((data, filename)) => ImageReference::from_bytes(data, filename),
		None => target_url.map(ImageReference::from_url).unwrap_or_default(),
	};
	let swap = match swap_bytes {
		Some((data, filename)) => ImageReference::from_bytes(data, filename),
		None => swap_url.map(ImageReference::from_url).unwrap_or_default(),
	};

	Ok(SwapRequest {
		target,
		swap,
		mode: SwapMode::parse(mode.as_deref())?,
	})
}
