// Slack file upload delivery
use crate::application::delivery::ImageSink;
use crate::domain::image::RenderedImage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct SlackUploader {
    api_url: String,
    token: String,
    channel: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
}

impl SlackResponse {
    fn into_result(self, method: &str) -> Result<Self> {
        if !self.ok {
            anyhow::bail!(
                "Slack {} failed: {}",
                method,
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(self)
    }
}

impl SlackUploader {
    pub fn new(api_url: String, token: String, channel: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Slack HTTP client")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            channel,
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }

    async fn read_response(response: reqwest::Response, method: &str) -> Result<SlackResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Slack {} failed with status {}: {}", method, status, body);
        }

        response
            .json::<SlackResponse>()
            .await
            .with_context(|| format!("Failed to parse Slack {} response", method))?
            .into_result(method)
    }

    /// Reserves an upload slot, returning (upload_url, file_id)
    async fn get_upload_url(&self, filename: &str, length: usize) -> Result<(String, String)> {
        let method = "files.getUploadURLExternal";
        let length = length.to_string();
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .form(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let reply = Self::read_response(response, method).await?;
        match (reply.upload_url, reply.file_id) {
            (Some(url), Some(id)) => Ok((url, id)),
            _ => anyhow::bail!("Slack {} returned no upload URL", method),
        }
    }

    async fn upload_bytes(&self, upload_url: &str, filename: &str, image: &RenderedImage) -> Result<()> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(image.format.mime_type())
            .context("Invalid image MIME type")?;

        let response = self
            .client
            .post(upload_url)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context("Failed to send file contents to Slack")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Slack file upload failed with status {}: {}", status, body);
        }
        Ok(())
    }

    async fn complete_upload(&self, file_id: &str, title: &str) -> Result<()> {
        let method = "files.completeUploadExternal";
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .json(&json!({
                "files": [{"id": file_id, "title": title}],
                "channel_id": self.channel,
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        Self::read_response(response, method).await?;
        Ok(())
    }
}

#[async_trait]
impl ImageSink for SlackUploader {
    fn name(&self) -> String {
        format!("Slack channel {:?}", self.channel)
    }

    async fn deliver(&self, image: &RenderedImage, title: &str) -> Result<()> {
        let filename = format!("plot.{}", image.format.extension());

        let (upload_url, file_id) = self.get_upload_url(&filename, image.len()).await?;
        tracing::debug!("Uploading {} bytes as Slack file {}", image.len(), file_id);
        self.upload_bytes(&upload_url, &filename, image).await?;
        self.complete_upload(&file_id, title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::OutputFormat;
    use httpmock::{Method::POST, MockServer};

    fn uploader(server: &MockServer) -> SlackUploader {
        SlackUploader::new(
            server.url("/api"),
            "xoxb-test".to_string(),
            "C0123456".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_flow() {
        let server = MockServer::start_async().await;
        let reserve = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/files.getUploadURLExternal")
                    .header("authorization", "Bearer xoxb-test")
                    .x_www_form_urlencoded_tuple("filename", "plot.png")
                    .x_www_form_urlencoded_tuple("length", "4");
                then.status(200).json_body(serde_json::json!({
                    "ok": true,
                    "upload_url": server.url("/upload/F42"),
                    "file_id": "F42"
                }));
            })
            .await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/upload/F42").body_contains("PNG!");
                then.status(200).body("OK - 4");
            })
            .await;
        let complete = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/files.completeUploadExternal")
                    .header("authorization", "Bearer xoxb-test")
                    .json_body(serde_json::json!({
                        "files": [{"id": "F42", "title": "CPU"}],
                        "channel_id": "C0123456"
                    }));
                then.status(200).json_body(serde_json::json!({"ok": true}));
            })
            .await;

        let image = RenderedImage::new(OutputFormat::Png, b"PNG!".to_vec());
        uploader(&server).deliver(&image, "CPU").await.unwrap();

        reserve.assert_async().await;
        upload.assert_async().await;
        complete.assert_async().await;
    }

    #[tokio::test]
    async fn test_slack_error_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/files.getUploadURLExternal");
                then.status(200)
                    .json_body(serde_json::json!({"ok": false, "error": "invalid_auth"}));
            })
            .await;

        let image = RenderedImage::new(OutputFormat::Svg, b"<svg/>".to_vec());
        let err = uploader(&server).deliver(&image, "CPU").await.unwrap_err();

        assert!(format!("{err:#}").contains("invalid_auth"));
    }
}
