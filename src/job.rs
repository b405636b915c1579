//! Generation jobs
//!
//! A job wraps one `GenerationRequest` and runs the (blocking) client call
//! on tokio's blocking pool. It reports exactly one `GenerationResult` and
//! never touches the image library; saving is up to whoever receives the
//! result on the UI thread.

use std::io::Cursor;
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::ImageFormat;
use tokio::task;

use crate::client::GenerationClient;
use crate::error::{AppError, AppResult};
use crate::state::data::{GenerationRequest, GenerationResult};

/// Format of automatically chosen image names, e.g. `06.14.25_09:41`
pub const TIMESTAMP_NAME_FORMAT: &str = "%m.%d.%y_%H:%M";

pub struct GenerationJob {
    request: GenerationRequest,
    client: Arc<dyn GenerationClient>,
}

impl GenerationJob {
    pub fn new(request: GenerationRequest, client: Arc<dyn GenerationClient>) -> Self {
        Self { request, client }
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Run the job to completion.
    pub async fn run(self) -> GenerationResult {
        let GenerationJob { request, client } = self;
        let edit = request.is_edit();

        let outcome = task::spawn_blocking(move || client.generate(&request))
            .await
            .map_err(|e| AppError::service(format!("generation worker failed: {e}")))
            .and_then(|result| result)
            .and_then(|bytes| normalize_to_png(&bytes));

        match outcome {
            Ok(image_bytes) => {
                let suggested_name = timestamp_name(Local::now());
                log::info!(
                    "✅ {} finished: {} ({} bytes)",
                    if edit { "Edit" } else { "Generation" },
                    suggested_name,
                    image_bytes.len()
                );
                GenerationResult::Success {
                    image_bytes,
                    suggested_name,
                }
            }
            Err(error) => {
                log::warn!("There was an error generating the image: {error}");
                GenerationResult::failure(&error)
            }
        }
    }
}

/// Name for a result generated at `now`
pub fn timestamp_name(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_NAME_FORMAT).to_string()
}

/// The library only stores PNG. Pass PNG bytes through untouched and
/// re-encode anything else the service might send back.
fn normalize_to_png(bytes: &[u8]) -> AppResult<Vec<u8>> {
    let format = image::guess_format(bytes)
        .map_err(|_| AppError::service("the service returned data that is not an image"))?;
    if format == ImageFormat::Png {
        return Ok(bytes.to_vec());
    }

    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::state::data::GenerationMode;
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// A client that answers with canned bytes or a canned error and
    /// remembers what it was asked.
    pub(crate) struct FakeClient {
        pub answer: Result<Vec<u8>, String>,
        pub seen: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeClient {
        pub(crate) fn ok(bytes: Vec<u8>) -> Self {
            Self {
                answer: Ok(bytes),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(reason: &str) -> Self {
            Self {
                answer: Err(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerationClient for FakeClient {
        fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<u8>> {
            self.seen.lock().unwrap().push(request.clone());
            self.answer.clone().map_err(AppError::service)
        }
    }

    pub(crate) fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(2, 2, Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn timestamp_name_uses_month_day_year_hour_minute() {
        let when = Local.with_ymd_and_hms(2025, 6, 14, 9, 41, 7).unwrap();
        assert_eq!(timestamp_name(when), "06.14.25_09:41");
    }

    #[tokio::test]
    async fn successful_create_uses_timestamp_name() {
        let client = Arc::new(FakeClient::ok(png_bytes()));
        let request = GenerationRequest::new("a red balloon", None).unwrap();

        let result = GenerationJob::new(request, client.clone()).run().await;

        match result {
            GenerationResult::Success {
                image_bytes,
                suggested_name,
            } => {
                assert_eq!(image_bytes, png_bytes());
                assert_eq!(suggested_name.len(), "06.14.25_09:41".len());
                assert!(suggested_name.contains('_'));
            }
            other => panic!("expected success, got {other:?}"),
        }

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].mode, GenerationMode::Create);
    }

    #[tokio::test]
    async fn edit_passes_source_to_the_client() {
        let client = Arc::new(FakeClient::ok(png_bytes()));
        let source = PathBuf::from("images/cat.png");
        let request = GenerationRequest::new("add a hat", Some(source.clone())).unwrap();

        let result = GenerationJob::new(request, client.clone()).run().await;

        assert!(matches!(result, GenerationResult::Success { .. }));
        assert_eq!(
            client.seen.lock().unwrap()[0].mode,
            GenerationMode::Edit { source }
        );
    }

    #[tokio::test]
    async fn service_error_becomes_failure() {
        let client = Arc::new(FakeClient::failing("rate limited"));
        let request = GenerationRequest::new("a red balloon", None).unwrap();

        let result = GenerationJob::new(request, client).run().await;

        assert_eq!(
            result,
            GenerationResult::Failure {
                reason: "rate limited".into(),
                kind: ErrorKind::Service,
            }
        );
    }

    #[tokio::test]
    async fn non_image_bytes_are_rejected() {
        let client = Arc::new(FakeClient::ok(b"definitely not an image".to_vec()));
        let request = GenerationRequest::new("noise", None).unwrap();

        let result = GenerationJob::new(request, client).run().await;

        assert!(matches!(
            result,
            GenerationResult::Failure { kind: ErrorKind::Service, .. }
        ));
    }

    #[test]
    fn non_png_images_are_reencoded() {
        let image = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 255, 255]));
        let mut bmp = Cursor::new(Vec::new());
        image.write_to(&mut bmp, ImageFormat::Bmp).unwrap();

        let png = normalize_to_png(bmp.get_ref()).unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 1));
    }
}
