use reqwest::{multipart::{Form, Part}, Client, Url};
use serde::Deserialize;

use crate::{tools::log::{log_info, LogServiceType}, Error, Result};

/// Client for the image hosting/CDN service. Uploads are unsigned (account
/// name + upload preset); whatever gets uploaded stays there, nothing is ever
/// deleted from here.
#[derive(Debug, Clone)]
pub struct HostingContext {
    base_url: Url,
    upload_preset: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct HostingUploadResponse {
    secure_url: Option<String>,
}

impl HostingContext {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        let base_url = reqwest::Url::parse(&format!("https://api.cloudinary.com/v1_1/{}/", cloud_name)).unwrap();
        HostingContext {
            base_url,
            upload_preset: upload_preset.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Upload raw image bytes, unmodified, and return the stored URL.
    pub async fn upload(&self, data: Vec<u8>, filename: String) -> Result<String> {
        let upload_url = self.base_url.join("image/upload").unwrap();
        let part = Part::bytes(data).file_name(filename.clone());
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self.client.post(upload_url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamStatus(response.status().as_u16()));
        }
        let parsed = response.json::<HostingUploadResponse>().await?;
        let url = parsed.secure_url.ok_or(Error::HostingNoSecureUrl)?;
        log_info(LogServiceType::Hosting, format!("Uploaded {} -> {}", filename, url));
        Ok(url)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_url_from_cloud_name() {
        let context = HostingContext::new("demo", "unsigned");
        assert_eq!(context.base_url.join("image/upload").unwrap().as_str(), "https://api.cloudinary.com/v1_1/demo/image/upload");
    }
}
