use std::path::{Component, Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::media::Media;

const MEDIA_COLS: &str = "id, uploader_id, original_filename, storage_path, content_type, size_bytes, width, height, created_at";

pub struct MediaService;

impl MediaService {
    /// Store one uploaded menu image under media_dir/YYYY/MM/ and record
    /// it. Anything the image decoder refuses is rejected.
    pub async fn upload(
        pool: &PgPool,
        uploader_id: Uuid,
        media_dir: &str,
        mut multipart: Multipart,
    ) -> anyhow::Result<Media> {
        let now = Utc::now();
        let year = now.format("%Y").to_string();
        let month = now.format("%m").to_string();

        let dir = PathBuf::from(media_dir).join(&year).join(&month);
        tokio::fs::create_dir_all(&dir).await?;

        let mut file_data: Option<(Vec<u8>, String, String)> = None;

        while let Some(field) = multipart.next_field().await? {
            if field.name().unwrap_or("") == "file" {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?.to_vec();
                file_data = Some((bytes, filename, content_type));
            }
        }

        let (bytes, original_filename, content_type) =
            file_data.ok_or_else(|| anyhow::anyhow!("No file field in upload"))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|_| anyhow::anyhow!("Only image uploads are accepted"))?;
        let (width, height) = (decoded.width() as i32, decoded.height() as i32);

        let ext = Path::new(&original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let file_id = Uuid::new_v4();
        let storage_filename = format!("{file_id}.{ext}");
        let storage_path_full = dir.join(&storage_filename);
        let storage_path_rel = format!("{year}/{month}/{storage_filename}");

        tokio::fs::write(&storage_path_full, &bytes).await?;

        let media: Media = sqlx::query_as(&format!(
            "INSERT INTO media
                 (uploader_id, original_filename, storage_path, content_type, size_bytes, width, height)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MEDIA_COLS}"
        ))
        .bind(uploader_id)
        .bind(&original_filename)
        .bind(&storage_path_rel)
        .bind(&content_type)
        .bind(bytes.len() as i64)
        .bind(width)
        .bind(height)
        .fetch_one(pool)
        .await?;

        Ok(media)
    }

    /// Read a stored file back for serving. The relative path must stay
    /// inside the media directory.
    pub async fn read_file(media_dir: &str, rel_path: &str) -> anyhow::Result<(String, Bytes)> {
        let rel = Path::new(rel_path);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Invalid media path");
        }

        let full = PathBuf::from(media_dir).join(rel);
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|_| anyhow::anyhow!("Media not found"))?;

        let content_type = mime_guess::from_path(&full)
            .first_or(mime::APPLICATION_OCTET_STREAM)
            .to_string();

        Ok((content_type, Bytes::from(bytes)))
    }
}
