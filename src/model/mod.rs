use std::{path::Path, sync::Arc};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use nanoid::nanoid;
use reqwest::Client;
use serde_json::Value;

use crate::{domain::swap::ImageReference, plugins::{faceswap::FaceSwapContext, hosting::HostingContext}, server::ServerConfig, tools::{detection::{detect_single_face, FaceDetector, RustfaceDetector}, http_tools::extract_header, image_tools, log::{log_info, LogServiceType}}, Error, Result};


/// Request-scoped orchestration: image ingestion, the align pipeline and the
/// merge dispatch. Built once from config at startup and cloned into every
/// handler through axum state; holds no mutable state.
#[derive(Clone)]
pub struct SwapController {
	pub faceswap: Arc<FaceSwapContext>,
	pub hosting: Option<Arc<HostingContext>>,
	detector: Option<Arc<dyn FaceDetector>>,
	client: Client,
}


// Constructor
impl SwapController {
	pub fn new(config: &ServerConfig) -> Result<Self> {
		let faceswap = FaceSwapContext::new(
			config.swap_key.clone().unwrap_or_default(),
			config.swap_host.clone(),
			config.poll_delay_ms,
			config.poll_attempts,
		);

		let hosting = config.hosting_cloud.as_ref().map(|cloud| {
			Arc::new(HostingContext::new(cloud, config.hosting_preset.as_deref().unwrap_or_default()))
		});

		let detector: Option<Arc<dyn FaceDetector>> = match &config.detection_model {
			Some(path) => {
				let loaded = RustfaceDetector::from_path(Path::new(path))?;
				log_info(LogServiceType::Align, format!("Loaded detection model from {}", path));
				Some(Arc::new(loaded))
			},
			None => None,
		};

		Ok(Self {
			faceswap: Arc::new(faceswap),
			hosting,
			detector,
			client: reqwest::Client::new(),
		})
	}
}

impl SwapController {
	fn hosting(&self) -> Result<&Arc<HostingContext>> {
		self.hosting.as_ref().ok_or(Error::Error { message: "No hosting service configured".to_string() })
	}

	/// Ingestion: uploaded bytes go to the hosting service, a URL is taken
	/// as-is without validation. An invalid URL surfaces later as a fetch
	/// failure.
	pub async fn resolve_image(&self, reference: ImageReference, slot: &str) -> Result<String> {
		if let Some(bytes) = reference.bytes {
			let filename = reference.filename.unwrap_or_else(|| nanoid!());
			let url = self.hosting()?.upload(bytes.to_vec(), filename).await?;
			Ok(url)
		} else if let Some(url) = reference.url {
			Ok(url)
		} else {
			Err(Error::MissingImageSlot(slot.to_string()))
		}
	}

	pub async fn fetch_image(&self, url: &str) -> Result<(Bytes, Option<String>)> {
		let response = self.client.get(url).send().await?;
		if !response.status().is_success() {
			return Err(Error::UpstreamStatus(response.status().as_u16()));
		}
		let content_type = extract_header(response.headers(), CONTENT_TYPE).map(|c| c.to_string());
		let bytes = response.bytes().await?;
		Ok((bytes, content_type))
	}

	/// Align mode: detect one face per image, composite the target-left and
	/// swap-right halves, store the PNG and hand back its URL. Any failing
	/// step aborts the request; nothing is retried.
	pub async fn align(&self, target_url: &str, swap_url: &str) -> Result<String> {
		let detector = self.detector.as_ref().ok_or(Error::NoModelFound)?;

		let (target_bytes, _) = self.fetch_image(target_url).await?;
		let (swap_bytes, _) = self.fetch_image(swap_url).await?;
		let target = image_tools::load_image(&target_bytes)?;
		let swap = image_tools::load_image(&swap_bytes)?;

		let target_face = detect_single_face(detector.as_ref(), &target).ok_or(Error::NoFaceDetected("target".to_string()))?;
		let swap_face = detect_single_face(detector.as_ref(), &swap).ok_or(Error::NoFaceDetected("swap".to_string()))?;
		log_info(LogServiceType::Align, format!("Faces: target {:?} swap {:?}", target_face, swap_face));

		let composite = image_tools::align_faces(&target, &target_face, &swap, &swap_face)?;
		let url = self.hosting()?.upload(composite, format!("{}.png", nanoid!())).await?;
		Ok(url)
	}

	/// Merge mode: relay to the external face-swap service and pass its
	/// result JSON through untouched.
	pub async fn merge(&self, target_url: &str, swap_url: &str) -> Result<Value> {
		self.faceswap.swap(target_url, swap_url).await
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn controller() -> SwapController {
		SwapController::new(&ServerConfig::empty()).unwrap()
	}

	#[tokio::test]
	async fn resolve_url_passthrough() {
		let reference = ImageReference::from_url("https://example.com/face.jpg".to_string());
		let url = controller().resolve_image(reference, "target").await.unwrap();
		assert_eq!(url, "https://example.com/face.jpg");
	}

	#[tokio::test]
	async fn resolve_empty_slot_fails() {
		let result = controller().resolve_image(ImageReference::default(), "swap").await;
		assert!(matches!(result, Err(Error::MissingImageSlot(slot)) if slot == "swap"));
	}

	#[tokio::test]
	async fn resolve_bytes_without_hosting_fails() {
		let reference = ImageReference::from_bytes(Bytes::from_static(b"not an image"), Some("face.jpg".to_string()));
		let result = controller().resolve_image(reference, "target").await;
		assert!(matches!(result, Err(Error::Error { .. })));
	}

	#[tokio::test]
	async fn align_without_model_fails() {
		let result = controller().align("https://example.com/a.jpg", "https://example.com/b.jpg").await;
		assert!(matches!(result, Err(Error::NoModelFound)));
	}
}
