/// Image Repository
///
/// CRUD and identifier renumbering over the `image` table, coordinating
/// blob writes with row changes so that a failed operation leaves both
/// stores as they were.
use crate::{
    blob_store::BlobBackend,
    error::{GalleryError, GalleryResult},
    gallery::{
        models::PendingBlob, naming, Image, ImageAssets, ImageType, PreviewGenerator,
    },
};
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

/// Fresh names tried before giving up on a contended create or update
const MAX_NAME_ATTEMPTS: usize = 8;

const SELECT_COLUMNS: &str =
    "SELECT id, type, image_path, preview_path, created_at, updated_at FROM image";
const SELECT_ALL_ORDERED: &str =
    "SELECT id, type, image_path, preview_path, created_at, updated_at FROM image ORDER BY id ASC";

/// Repository over persisted images
#[derive(Clone)]
pub struct ImageRepository {
    db: SqlitePool,
    blobs: Arc<dyn BlobBackend>,
    previews: PreviewGenerator,
}

impl ImageRepository {
    pub fn new(db: SqlitePool, blobs: Arc<dyn BlobBackend>, previews: PreviewGenerator) -> Self {
        Self { db, blobs, previews }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobBackend> {
        &self.blobs
    }

    /// Fetch an image by id, optionally requiring a specific type
    pub async fn get_by_id(&self, id: i64, image_type: Option<ImageType>) -> GalleryResult<Image> {
        let sql = match image_type {
            Some(_) => format!("{} WHERE id = ? AND type = ?", SELECT_COLUMNS),
            None => format!("{} WHERE id = ?", SELECT_COLUMNS),
        };

        let mut query = sqlx::query(&sql).bind(id);
        if let Some(image_type) = image_type {
            query = query.bind(image_type.as_str());
        }

        let row = query
            .fetch_one(&self.db)
            .await
            .map_err(|e| GalleryError::from_store(e, id, image_type))?;

        parse_image(&row)
    }

    /// All images in id order. Nothing is queried until the set is consumed.
    pub fn get_all(&self) -> ImageSet<'_> {
        ImageSet { db: &self.db }
    }

    /// Create a new image, letting the store pick the id when `id` is `None`
    pub async fn create(
        &self,
        data: Vec<u8>,
        image_type: ImageType,
        id: Option<i64>,
    ) -> GalleryResult<Image> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.derive_name(image_type).await?;
            let mut assets = ImageAssets::new(image_type, &name, data.clone());
            assets.materialize(image_type, &self.previews)?;

            let now = Utc::now();
            let mut tx = self.db.begin().await?;

            let result = sqlx::query(
                r#"
                INSERT INTO image (id, type, image_path, preview_path, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(image_type.as_str())
            .bind(assets.primary().path())
            .bind(assets.preview().map(|p| p.path()))
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await;

            let result = match result {
                Ok(result) => result,
                Err(e) if is_path_conflict(&e) => {
                    tracing::debug!("Name {} was taken concurrently, deriving another", name);
                    continue;
                }
                Err(e) => {
                    return Err(match id {
                        Some(id) => GalleryError::from_store(e, id, None),
                        None => GalleryError::Database(e),
                    })
                }
            };

            let pending = assets.take_pending()?;
            self.commit_with_blobs(tx, pending).await?;

            let image = Image {
                id: result.last_insert_rowid(),
                image_type,
                assets,
                created_at: now,
                updated_at: now,
            };

            tracing::info!("Created {}", image);

            return Ok(image);
        }

        Err(name_exhausted())
    }

    /// Replace the primary asset (and type) of an existing image
    pub async fn update_primary_asset(
        &self,
        id: i64,
        data: Vec<u8>,
        image_type: ImageType,
    ) -> GalleryResult<Image> {
        let mut image = self.get_by_id(id, None).await?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.derive_name(image_type).await?;
            image.image_type = image_type;
            image.assign_primary_asset(&name, data.clone());
            image.materialize(&self.previews)?;
            image.updated_at = Utc::now();

            let mut tx = self.db.begin().await?;

            // Writing first takes the database lock, so the paths read next
            // are the ones this update actually replaces
            let touched = sqlx::query("UPDATE image SET updated_at = ? WHERE id = ?")
                .bind(image.updated_at.to_rfc3339())
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if touched.rows_affected() == 0 {
                return Err(GalleryError::not_found(id));
            }

            let row = sqlx::query("SELECT image_path, preview_path FROM image WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            let mut previous_paths: Vec<String> = vec![row.try_get("image_path")?];
            if let Some(preview) = row.try_get::<Option<String>, _>("preview_path")? {
                previous_paths.push(preview);
            }

            let result = sqlx::query(
                r#"
                UPDATE image
                SET type = ?,
                    image_path = ?,
                    preview_path = ?
                WHERE id = ?
                "#,
            )
            .bind(image.image_type.as_str())
            .bind(image.primary_path())
            .bind(image.preview_path())
            .bind(id)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(e) if is_path_conflict(&e) => {
                    tracing::debug!("Name {} was taken concurrently, deriving another", name);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            let pending = image.assets.take_pending()?;
            self.commit_with_blobs(tx, pending).await?;

            let current_paths = image.assets.paths();
            let stale = previous_paths
                .into_iter()
                .filter(|p| !current_paths.contains(p))
                .collect::<Vec<_>>();
            self.remove_blobs(&stale).await;

            tracing::info!("Replaced primary asset of {}", image);

            return Ok(image);
        }

        Err(name_exhausted())
    }

    /// Replace the image with `id` if it exists, otherwise create it with that id
    pub async fn upload(&self, id: i64, data: Vec<u8>, image_type: ImageType) -> GalleryResult<Image> {
        match self.get_by_id(id, None).await {
            Ok(_) => self.update_primary_asset(id, data, image_type).await,
            Err(GalleryError::NotFound { .. }) => self.create(data, image_type, Some(id)).await,
            Err(e) => Err(e),
        }
    }

    /// Change an image's id in place, keeping every other column as is.
    ///
    /// Runs as a single UPDATE inside a transaction: either the row carries
    /// `new_id` afterwards or nothing changed.
    pub async fn renumber(&self, current_id: i64, new_id: i64) -> GalleryResult<()> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query("UPDATE image SET id = ? WHERE id = ?")
            .bind(new_id)
            .bind(current_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| GalleryError::from_store(e, new_id, None))?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::not_found(current_id));
        }

        tx.commit().await?;

        tracing::info!("Renumbered image {} to {}", current_id, new_id);

        Ok(())
    }

    /// Random name whose primary path is not on disk yet.
    ///
    /// Only a hint: the unique index on `image_path` is what reserves it.
    async fn derive_name(&self, image_type: ImageType) -> GalleryResult<String> {
        let base = naming::random_human_name(&mut rand::thread_rng());

        let mut candidate = base.clone();
        let mut suffix = 1;
        while self
            .blobs
            .exists(&naming::primary_path(image_type, &candidate))
            .await?
        {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }

        Ok(candidate)
    }

    /// Write blobs, then commit. Either both land or neither does.
    async fn commit_with_blobs(
        &self,
        tx: Transaction<'_, Sqlite>,
        pending: Vec<PendingBlob>,
    ) -> GalleryResult<()> {
        let mut written = Vec::with_capacity(pending.len());
        for blob in pending {
            if let Err(e) = self.blobs.put(&blob.path, blob.bytes).await {
                // Dropping `tx` rolls the row back
                self.remove_blobs(&written).await;
                return Err(e);
            }
            written.push(blob.path);
        }

        if let Err(e) = tx.commit().await {
            self.remove_blobs(&written).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Best-effort blob removal
    async fn remove_blobs(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.blobs.delete(path).await {
                tracing::warn!("Failed to remove blob {}: {}", path, e);
            }
        }
    }
}

/// Lazily evaluated, id-ordered view over every image
pub struct ImageSet<'a> {
    db: &'a SqlitePool,
}

impl<'a> ImageSet<'a> {
    /// Total number of images
    pub async fn count(&self) -> GalleryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM image")
            .fetch_one(self.db)
            .await?;
        Ok(count)
    }

    /// `[offset, offset + limit)` of the ordered set; empty past the end
    pub async fn slice(&self, offset: i64, limit: i64) -> GalleryResult<Vec<Image>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let sql = format!("{} ORDER BY id ASC LIMIT ? OFFSET ?", SELECT_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset.max(0))
            .fetch_all(self.db)
            .await?;

        rows.iter().map(parse_image).collect()
    }

    /// Stream every image in order
    pub fn stream(&self) -> BoxStream<'a, GalleryResult<Image>> {
        sqlx::query(SELECT_ALL_ORDERED)
            .fetch(self.db)
            .map(|row| parse_image(&row?))
            .boxed()
    }
}

/// Another row already holds the derived primary path
fn is_path_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("image.image_path"),
        _ => false,
    }
}

fn name_exhausted() -> GalleryError {
    GalleryError::Internal(format!(
        "No free image name after {} attempts",
        MAX_NAME_ATTEMPTS
    ))
}

fn parse_timestamp(value: &str) -> GalleryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GalleryError::Internal(format!("Invalid timestamp: {}", e)))
}

fn parse_image(row: &sqlx::sqlite::SqliteRow) -> GalleryResult<Image> {
    let type_str: String = row.try_get("type")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Image {
        id: row.try_get("id")?,
        image_type: type_str.parse()?,
        assets: ImageAssets::stored(row.try_get("image_path")?, row.try_get("preview_path")?),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::DiskBlobBackend;
    use crate::db;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    /// Disk backend that refuses to store previews
    struct PreviewRejectingBackend {
        inner: DiskBlobBackend,
    }

    #[async_trait]
    impl BlobBackend for PreviewRejectingBackend {
        async fn put(&self, path: &str, data: Vec<u8>) -> GalleryResult<()> {
            if path.ends_with("_preview.jpg") {
                return Err(GalleryError::BlobStorage("disk full".to_string()));
            }
            self.inner.put(path, data).await
        }

        async fn get(&self, path: &str) -> GalleryResult<Option<Vec<u8>>> {
            self.inner.get(path).await
        }

        async fn delete(&self, path: &str) -> GalleryResult<()> {
            self.inner.delete(path).await
        }

        async fn exists(&self, path: &str) -> GalleryResult<bool> {
            self.inner.exists(path).await
        }
    }

    fn files_under(root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let Ok(entries) = std::fs::read_dir(root) else {
            return files;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(files_under(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn setup() -> (TempDir, ImageRepository) {
        let dir = tempdir().unwrap();
        let pool = db::create_pool(&dir.path().join("gallery.sqlite"), db::DatabaseOptions::default())
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();

        let blobs = Arc::new(DiskBlobBackend::new(dir.path().join("media")));
        let repo = ImageRepository::new(pool, blobs, PreviewGenerator::default());
        (dir, repo)
    }

    #[tokio::test]
    async fn test_create_persists_row_and_blobs() {
        let (_dir, repo) = setup().await;

        let image = repo.create(png(600, 300), ImageType::Human, Some(5)).await.unwrap();
        assert_eq!(image.id, 5);
        assert!(!image.assets.is_dirty_for_preview());

        let loaded = repo.get_by_id(5, None).await.unwrap();
        assert_eq!(loaded.primary_path(), image.primary_path());
        assert_eq!(loaded.title(), image.title());
        assert!(loaded.primary_path().ends_with("_fullsize.jpg"));

        let preview_path = loaded.preview_path().unwrap();
        assert_eq!(
            preview_path,
            naming::preview_path(ImageType::Human, &loaded.title())
        );

        let preview = repo.blobs().get(preview_path).await.unwrap().unwrap();
        let preview = image::load_from_memory(&preview).unwrap();
        assert_eq!((preview.width(), preview.height()), (200, 100));
        assert_eq!(
            repo.blobs().get(loaded.primary_path()).await.unwrap(),
            Some(png(600, 300))
        );
    }

    #[tokio::test]
    async fn test_create_assigns_id_when_absent() {
        let (_dir, repo) = setup().await;

        let first = repo.create(png(20, 20), ImageType::Human, None).await.unwrap();
        let second = repo.create(png(20, 20), ImageType::Human, None).await.unwrap();
        assert!(second.id > first.id);
        assert_ne!(first.primary_path(), second.primary_path());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_fails() {
        let (_dir, repo) = setup().await;

        repo.create(png(20, 20), ImageType::Human, Some(1)).await.unwrap();
        let result = repo.create(png(20, 20), ImageType::Human, Some(1)).await;
        assert!(matches!(result, Err(GalleryError::AlreadyExists(1))));
        assert_eq!(repo.get_all().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_with_garbage_leaves_store_untouched() {
        let (dir, repo) = setup().await;

        let result = repo.create(b"garbage".to_vec(), ImageType::Human, Some(1)).await;
        assert!(matches!(result, Err(GalleryError::Decode(_))));
        assert_eq!(repo.get_all().count().await.unwrap(), 0);
        assert!(!dir.path().join("media").join("images").exists());
    }

    #[tokio::test]
    async fn test_get_by_id_with_type() {
        let (_dir, repo) = setup().await;
        repo.create(png(20, 20), ImageType::Human, Some(3)).await.unwrap();

        assert!(repo.get_by_id(3, Some(ImageType::Human)).await.is_ok());

        // Row exists but carries another type
        sqlx::query("UPDATE image SET type = 'robot' WHERE id = 3")
            .execute(&repo.db)
            .await
            .unwrap();
        let result = repo.get_by_id(3, Some(ImageType::Human)).await;
        assert!(matches!(
            result,
            Err(GalleryError::NotFound {
                id: 3,
                image_type: Some(ImageType::Human)
            })
        ));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_dir, repo) = setup().await;
        let result = repo.get_by_id(42, None).await;
        assert!(matches!(
            result,
            Err(GalleryError::NotFound {
                id: 42,
                image_type: None
            })
        ));
    }

    #[tokio::test]
    async fn test_update_regenerates_preview_and_cleans_up() {
        let (_dir, repo) = setup().await;

        let original = repo.create(png(400, 400), ImageType::Human, Some(1)).await.unwrap();
        let old_paths = original.assets.paths();

        let updated = repo
            .update_primary_asset(1, png(100, 400), ImageType::Human)
            .await
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);

        let loaded = repo.get_by_id(1, None).await.unwrap();
        assert_eq!(loaded.primary_path(), updated.primary_path());

        let preview = repo
            .blobs()
            .get(loaded.preview_path().unwrap())
            .await
            .unwrap()
            .unwrap();
        let preview = image::load_from_memory(&preview).unwrap();
        assert_eq!((preview.width(), preview.height()), (50, 200));

        for path in old_paths {
            if !updated.assets.paths().contains(&path) {
                assert!(!repo.blobs().exists(&path).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn test_update_with_garbage_keeps_row() {
        let (_dir, repo) = setup().await;
        let original = repo.create(png(50, 50), ImageType::Human, Some(1)).await.unwrap();

        let result = repo
            .update_primary_asset(1, b"garbage".to_vec(), ImageType::Human)
            .await;
        assert!(matches!(result, Err(GalleryError::Decode(_))));

        let loaded = repo.get_by_id(1, None).await.unwrap();
        assert_eq!(loaded.primary_path(), original.primary_path());
        assert_eq!(loaded.preview_path(), original.preview_path());
        assert_eq!(loaded.updated_at, original.updated_at);
        assert!(repo.blobs().exists(original.primary_path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing() {
        let (_dir, repo) = setup().await;
        let result = repo.update_primary_asset(9, png(10, 10), ImageType::Human).await;
        assert!(matches!(result, Err(GalleryError::NotFound { id: 9, .. })));
    }

    #[tokio::test]
    async fn test_upload_creates_then_replaces() {
        let (_dir, repo) = setup().await;

        let created = repo.upload(7, png(30, 30), ImageType::Human).await.unwrap();
        assert_eq!(created.id, 7);

        let replaced = repo.upload(7, png(30, 30), ImageType::Human).await.unwrap();
        assert_eq!(replaced.id, 7);
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(repo.get_all().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_renumber_to_free_id() {
        let (_dir, repo) = setup().await;
        let original = repo.create(png(20, 20), ImageType::Human, Some(1)).await.unwrap();

        repo.renumber(1, 10).await.unwrap();

        assert!(matches!(
            repo.get_by_id(1, None).await,
            Err(GalleryError::NotFound { id: 1, .. })
        ));
        let moved = repo.get_by_id(10, None).await.unwrap();
        assert_eq!(moved.primary_path(), original.primary_path());
        assert_eq!(moved.preview_path(), original.preview_path());
        assert_eq!(moved.created_at, original.created_at);
        assert_eq!(moved.updated_at, original.updated_at);
    }

    #[tokio::test]
    async fn test_renumber_collision_is_atomic() {
        let (_dir, repo) = setup().await;
        let a = repo.create(png(20, 20), ImageType::Human, Some(1)).await.unwrap();
        repo.create(png(20, 20), ImageType::Human, Some(2)).await.unwrap();

        let result = repo.renumber(1, 2).await;
        assert!(matches!(result, Err(GalleryError::AlreadyExists(2))));

        let still_there = repo.get_by_id(1, None).await.unwrap();
        assert_eq!(still_there.primary_path(), a.primary_path());
        assert_eq!(still_there.updated_at, a.updated_at);
        assert_eq!(repo.get_all().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_renumber_missing_source() {
        let (_dir, repo) = setup().await;
        let result = repo.renumber(1, 2).await;
        assert!(matches!(result, Err(GalleryError::NotFound { id: 1, .. })));
    }

    #[tokio::test]
    async fn test_slices_follow_store_order() {
        let (_dir, repo) = setup().await;
        for id in [4, 1, 3, 2, 5] {
            repo.create(png(8, 8), ImageType::Human, Some(id)).await.unwrap();
        }

        let all = repo.get_all();
        let count = all.count().await.unwrap();
        assert_eq!(count, 5);

        for offset in 0..7i64 {
            for limit in 1..7i64 {
                let ids: Vec<i64> = all
                    .slice(offset, limit)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|i| i.id)
                    .collect();
                let expected_len = limit.min((count - offset).max(0)) as usize;
                let expected: Vec<i64> = (1..=5).skip(offset as usize).take(expected_len).collect();
                assert_eq!(ids, expected, "offset={} limit={}", offset, limit);
            }
        }
    }

    #[tokio::test]
    async fn test_stream_all() {
        let (_dir, repo) = setup().await;
        for id in [2, 1] {
            repo.create(png(8, 8), ImageType::Human, Some(id)).await.unwrap();
        }

        let ids: Vec<i64> = repo
            .get_all()
            .stream()
            .map_ok(|image| image.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_blob_write_rolls_back_create() {
        let (dir, repo) = setup().await;
        let failing = ImageRepository::new(
            repo.db.clone(),
            Arc::new(PreviewRejectingBackend {
                inner: DiskBlobBackend::new(dir.path().join("media")),
            }),
            PreviewGenerator::default(),
        );

        let result = failing.create(png(120, 80), ImageType::Human, Some(1)).await;
        assert!(matches!(result, Err(GalleryError::BlobStorage(_))));

        assert_eq!(repo.get_all().count().await.unwrap(), 0);
        // The primary blob written before the failure is removed again
        assert!(files_under(&dir.path().join("media")).is_empty());
    }

    #[tokio::test]
    async fn test_failed_blob_write_keeps_previous_version() {
        let (dir, repo) = setup().await;
        let original = repo.create(png(120, 80), ImageType::Human, Some(1)).await.unwrap();

        let failing = ImageRepository::new(
            repo.db.clone(),
            Arc::new(PreviewRejectingBackend {
                inner: DiskBlobBackend::new(dir.path().join("media")),
            }),
            PreviewGenerator::default(),
        );
        let result = failing
            .update_primary_asset(1, png(60, 90), ImageType::Human)
            .await;
        assert!(matches!(result, Err(GalleryError::BlobStorage(_))));

        let loaded = repo.get_by_id(1, None).await.unwrap();
        assert_eq!(loaded.primary_path(), original.primary_path());
        assert_eq!(loaded.preview_path(), original.preview_path());
        assert_eq!(loaded.updated_at, original.updated_at);

        let files = files_under(&dir.path().join("media"));
        assert_eq!(files.len(), 2);
        assert!(repo.blobs().exists(original.primary_path()).await.unwrap());
        assert!(repo
            .blobs()
            .exists(original.preview_path().unwrap())
            .await
            .unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_creates_keep_their_own_blobs() {
        let (_dir, repo) = setup().await;
        let uploads: Vec<Vec<u8>> = (0..48u32).map(|i| png(300 + i, 300)).collect();

        let handles: Vec<_> = uploads
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, data)| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(data, ImageType::Human, Some(i as i64 + 1)).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut primary_paths = HashSet::new();
        for (i, data) in uploads.iter().enumerate() {
            let stored = repo.get_by_id(i as i64 + 1, None).await.unwrap();
            assert!(primary_paths.insert(stored.primary_path().to_string()));

            assert_eq!(
                repo.blobs().get(stored.primary_path()).await.unwrap().as_ref(),
                Some(data)
            );

            // The preview is the thumbnail of this row's own upload
            let preview = repo
                .blobs()
                .get(stored.preview_path().unwrap())
                .await
                .unwrap()
                .unwrap();
            let preview = image::load_from_memory(&preview).unwrap();
            let expected_height = 300.0 * 200.0 / (300.0 + i as f64);
            assert_eq!(preview.width(), 200);
            assert!((preview.height() as f64 - expected_height).abs() <= 1.0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_updates_leave_only_current_blobs() {
        let (dir, repo) = setup().await;
        repo.create(png(40, 40), ImageType::Human, Some(1)).await.unwrap();

        let handles: Vec<_> = (0..6u32)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.update_primary_asset(1, png(41 + i, 40), ImageType::Human)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let current = repo.get_by_id(1, None).await.unwrap();
        let mut remaining: Vec<PathBuf> = files_under(&dir.path().join("media"));
        remaining.sort();
        let mut expected: Vec<PathBuf> = current
            .assets
            .paths()
            .iter()
            .map(|p| dir.path().join("media").join(p))
            .collect();
        expected.sort();
        assert_eq!(remaining, expected);
    }
}
