use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use derive_more::From;
use serde_json::json;
use serde_with::{serde_as, DisplayFromStr};
use nanoid::nanoid;

use crate::tools::log::{log_error, LogServiceType};

pub type Result<T> = core::result::Result<T, Error>;

#[serde_as]
#[derive(Debug, Serialize, From, strum_macros::AsRefStr)]
#[serde(tag = "type", content = "data")]
pub enum Error {
	Error { message: String},
	NotFound,

	// -- Request errors.

	InvalidMode(String),
	MissingImageSlot(String),

	// -- Alignment errors.

	NoFaceDetected(String),
	NoModelFound,

	// -- Upstream errors.

	MissingRequestId,
	SwapJobTimeout,
	HostingNoSecureUrl,
	UpstreamStatus(u16),

	// -- Server errors.

	ServerMalformatedConfigFile,
	ServerUnableToAccessServerLocalFolder,

	// -- Externals

	#[from]
	Io(#[serde_as(as = "DisplayFromStr")] std::io::Error),

	#[from]
	Serde(#[serde_as(as = "DisplayFromStr")] serde_json::Error),

	#[from]
	Reqwest(#[serde_as(as = "DisplayFromStr")] reqwest::Error),

	#[from]
	Image(#[serde_as(as = "DisplayFromStr")] image::ImageError),
}

// region:    --- Error Boilerplate
impl core::fmt::Display for Error {
	fn fmt(
		&self,
		fmt: &mut core::fmt::Formatter,
	) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}
// endregion: --- Error Boilerplate

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let nanoid = nanoid!();
		log_error(LogServiceType::Other, format!("req {} - {:?}", nanoid, self));
		let (status_code, message) = self.client_status_and_message();

		// One-line error body, no structured codes exposed.
		let error_json = json!({
						"error": message
					});

		(status_code, Json(error_json)).into_response()
	}
}

impl Error {
	pub fn client_status_and_message(&self) -> (StatusCode, String) {
		#[allow(unreachable_patterns)]
		match self {
			Self::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),

			Self::InvalidMode(mode) => (StatusCode::BAD_REQUEST, format!("Invalid mode specified: {}", mode)),
			Self::MissingImageSlot(slot) => (StatusCode::BAD_REQUEST, format!("Missing both file and url for {}", slot)),
			Self::NoFaceDetected(slot) => (StatusCode::BAD_REQUEST, format!("No face detected in {} image", slot)),

			Self::MissingRequestId => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve request ID".to_string()),
			Self::SwapJobTimeout => (StatusCode::INTERNAL_SERVER_ERROR, "Timed out waiting for the swap result".to_string()),

			// -- Fallback.
			_ => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"An error occurred while processing the images".to_string(),
			),
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn statuses() {
		assert_eq!(Error::InvalidMode("blend".to_string()).client_status_and_message().0, StatusCode::BAD_REQUEST);
		assert_eq!(Error::MissingImageSlot("target".to_string()).client_status_and_message().0, StatusCode::BAD_REQUEST);
		assert_eq!(Error::NoFaceDetected("swap".to_string()).client_status_and_message().0, StatusCode::BAD_REQUEST);
		assert_eq!(Error::MissingRequestId.client_status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(Error::SwapJobTimeout.client_status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(Error::NoModelFound.client_status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);
	}
}
