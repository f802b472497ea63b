use crate::error::{AppError, AppResult};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const REPORT_MEDIA_DIR: &str = "reports";

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        }
    }
}

/// Media types accepted on a report, detected from the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Mp4,
    QuickTime,
    Webm,
}

impl MediaType {
    pub const ALL: [MediaType; 7] = [
        MediaType::Jpeg,
        MediaType::Png,
        MediaType::Gif,
        MediaType::Webp,
        MediaType::Mp4,
        MediaType::QuickTime,
        MediaType::Webm,
    ];

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Mp4 => "video/mp4",
            MediaType::QuickTime => "video/quicktime",
            MediaType::Webm => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::Gif => "gif",
            MediaType::Webp => "webp",
            MediaType::Mp4 => "mp4",
            MediaType::QuickTime => "mov",
            MediaType::Webm => "webm",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.mime() == mime)
    }

    /// Identify the file by its magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(MediaType::Jpeg);
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(MediaType::Png);
        }
        if data.starts_with(b"GIF8") {
            return Some(MediaType::Gif);
        }
        if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(MediaType::Webp);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(MediaType::Webm);
        }
        if data.len() >= 12 && &data[4..8] == b"ftyp" {
            return Some(if &data[8..12] == b"qt  " {
                MediaType::QuickTime
            } else {
                MediaType::Mp4
            });
        }
        if data.len() >= 8 && matches!(&data[4..8], b"moov" | b"mdat" | b"wide" | b"free") {
            return Some(MediaType::QuickTime);
        }
        None
    }
}

/// One file received with a submission, not yet on disk.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl PendingUpload {
    /// Check size and content, returning the detected type.
    pub fn validate(&self) -> AppResult<MediaType> {
        if self.data.len() > MAX_FILE_SIZE {
            return Err(AppError::PayloadTooLarge);
        }
        if self.data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let detected = MediaType::sniff(&self.data).ok_or_else(|| {
            AppError::Validation(
                "Unsupported file type. Allowed: jpeg, png, gif, webp, mp4, mov, webm".to_string(),
            )
        })?;

        // Generic declarations (octet-stream, missing) defer to sniffing.
        if let Some(declared) = self.content_type.as_deref().and_then(MediaType::from_mime) {
            if declared != detected {
                return Err(AppError::Validation(
                    "File content does not match declared content type".to_string(),
                ));
            }
        }

        Ok(detected)
    }
}

/// Files written for a submission that is not yet persisted.
#[derive(Debug, Default)]
pub struct StagedMedia {
    pub urls: Vec<String>,
    paths: Vec<PathBuf>,
}

impl StagedMedia {
    /// Remove every staged file. Used when the report insert fails.
    pub async fn discard(self) {
        remove_all(&self.paths).await;
    }
}

pub struct UploadService;

impl UploadService {
    /// Validate every file, then write them all under `reports/`.
    /// Nothing is left on disk unless every write succeeds.
    pub async fn stage_all(
        config: &UploadConfig,
        uploads: Vec<PendingUpload>,
    ) -> AppResult<StagedMedia> {
        let typed = uploads
            .into_iter()
            .map(|upload| upload.validate().map(|kind| (kind, upload)))
            .collect::<AppResult<Vec<_>>>()?;

        if typed.is_empty() {
            return Ok(StagedMedia::default());
        }

        let dir = Path::new(&config.upload_dir).join(REPORT_MEDIA_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;

        let mut staged = StagedMedia::default();
        for (kind, upload) in typed {
            let filename = format!("{}.{}", Uuid::new_v4(), kind.extension());
            let path = dir.join(&filename);
            if let Err(e) = fs::write(&path, &upload.data).await {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                remove_all(&staged.paths).await;
                // A partial write may have created the file.
                remove_all(std::slice::from_ref(&path)).await;
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to store uploaded file: {}",
                    e
                )));
            }
            staged
                .urls
                .push(format!("/uploads/{}/{}", REPORT_MEDIA_DIR, filename));
            staged.paths.push(path);
        }

        Ok(staged)
    }

    /// Map a request path below `/uploads/` to its public URL, refusing
    /// anything that could escape the upload directory.
    pub fn media_url(relative: &str) -> Option<String> {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        let safe = Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| format!("/uploads/{}", relative))
    }
}

async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove staged file {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn pending(data: &[u8], content_type: Option<&str>) -> PendingUpload {
        PendingUpload {
            file_name: Some("photo".to_string()),
            content_type: content_type.map(str::to_string),
            data: data.to_vec(),
        }
    }

    fn temp_config() -> UploadConfig {
        let dir = std::env::temp_dir().join(format!("civic-upload-{}", Uuid::new_v4()));
        UploadConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn sniffs_images() {
        assert_eq!(MediaType::sniff(JPEG), Some(MediaType::Jpeg));
        assert_eq!(MediaType::sniff(PNG), Some(MediaType::Png));
        assert_eq!(MediaType::sniff(b"GIF89a"), Some(MediaType::Gif));
        assert_eq!(
            MediaType::sniff(b"RIFF\0\0\0\0WEBPVP8 "),
            Some(MediaType::Webp)
        );
    }

    #[test]
    fn sniffs_video() {
        assert_eq!(
            MediaType::sniff(b"\0\0\0\x18ftypisom\0\0\0\0"),
            Some(MediaType::Mp4)
        );
        assert_eq!(
            MediaType::sniff(b"\0\0\0\x14ftypqt  \0\0\0\0"),
            Some(MediaType::QuickTime)
        );
        assert_eq!(
            MediaType::sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F]),
            Some(MediaType::Webm)
        );
    }

    #[test]
    fn rejects_unknown_and_truncated() {
        assert_eq!(MediaType::sniff(b"%PDF-1.7"), None);
        assert_eq!(MediaType::sniff(&[0xFF, 0xD8]), None);
        assert_eq!(MediaType::sniff(&[]), None);
    }

    #[test]
    fn declared_type_must_match_content() {
        assert!(pending(JPEG, Some("image/jpeg")).validate().is_ok());
        assert!(pending(JPEG, Some("application/octet-stream"))
            .validate()
            .is_ok());
        assert!(matches!(
            pending(PNG, Some("image/jpeg")).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn oversized_file_is_too_large() {
        let mut data = JPEG.to_vec();
        data.resize(MAX_FILE_SIZE + 1, 0);
        assert!(matches!(
            pending(&data, None).validate(),
            Err(AppError::PayloadTooLarge)
        ));
    }

    #[test]
    fn media_url_refuses_traversal() {
        assert_eq!(
            UploadService::media_url("reports/a.jpg").as_deref(),
            Some("/uploads/reports/a.jpg")
        );
        assert_eq!(UploadService::media_url("../etc/passwd"), None);
        assert_eq!(UploadService::media_url("/reports/../../secret"), None);
        assert_eq!(UploadService::media_url(""), None);
    }

    #[tokio::test]
    async fn one_bad_file_writes_nothing() {
        let config = temp_config();
        let result = UploadService::stage_all(
            &config,
            vec![pending(JPEG, None), pending(b"not media", None)],
        )
        .await;
        assert!(result.is_err());
        assert!(!Path::new(&config.upload_dir).exists());
    }

    #[tokio::test]
    async fn staged_files_can_be_discarded() {
        let config = temp_config();
        let staged = UploadService::stage_all(&config, vec![pending(JPEG, None), pending(PNG, None)])
            .await
            .unwrap();
        assert_eq!(staged.urls.len(), 2);
        assert!(staged.urls[0].starts_with("/uploads/reports/"));
        assert!(staged.urls[0].ends_with(".jpg"));

        let paths = staged.paths.clone();
        assert!(paths.iter().all(|p| p.exists()));
        staged.discard().await;
        assert!(paths.iter().all(|p| !p.exists()));

        let _ = std::fs::remove_dir_all(&config.upload_dir);
    }
}
