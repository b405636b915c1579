use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::data::StoredImage;
use crate::error::{AppError, AppResult};

const IMAGE_EXTENSION: &str = "png";

/// The Library manages the flat directory of generated images.
///
/// Every image is a single PNG file and its file stem is the name shown to
/// the user. There is no index or database: the directory listing is the
/// source of truth. Callers are expected to serialize mutations themselves
/// (the UI only mutates from its event loop).
pub struct Library {
    dir: PathBuf,
}

impl Library {
    /// Open the library at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        log::info!("📁 Image library at: {}", dir.display());

        Ok(Library { dir })
    }

    /// Get the path to the image directory
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// All images, sorted by name ascending.
    /// Hidden entries (`.gitkeep`, in-flight temp files) and non-PNG files are skipped.
    pub fn list(&self) -> AppResult<Vec<StoredImage>> {
        let mut images = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if let Some(image) = stored_image_from_path(&path) {
                images.push(image);
            }
        }

        images.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(images)
    }

    /// Look up an image by its display name
    pub fn get(&self, name: &str) -> Option<StoredImage> {
        let path = self.image_path(name);
        path.is_file().then(|| StoredImage {
            name: name.to_string(),
            path,
        })
    }

    /// Persist new image bytes under `name`.
    ///
    /// Never overwrites an existing image. The bytes go to a hidden temp file
    /// first and are renamed into place, so a half-written file is never
    /// visible under its final name.
    pub fn save(&self, bytes: &[u8], name: &str) -> AppResult<StoredImage> {
        let name = validate_name(name)?;
        let path = self.image_path(name);
        if path.exists() {
            return Err(already_exists(name));
        }

        let temp_path = self.dir.join(format!(".{name}.{IMAGE_EXTENSION}.partial"));
        if let Err(error) = fs::write(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(error.into());
        }
        if let Err(error) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(error.into());
        }

        log::info!("💾 Saved {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredImage {
            name: name.to_string(),
            path,
        })
    }

    /// Read an image's bytes back from disk
    pub fn read(&self, image: &StoredImage) -> AppResult<Vec<u8>> {
        Ok(fs::read(&image.path)?)
    }

    /// Rename an image. The old `StoredImage` is stale afterwards.
    pub fn rename(&self, image: &StoredImage, new_name: &str) -> AppResult<StoredImage> {
        let new_name = validate_name(new_name)?;
        let new_path = self.image_path(new_name);
        if new_path.exists() {
            return Err(already_exists(new_name));
        }

        fs::rename(&image.path, &new_path)?;

        log::info!("✏️  Renamed '{}' to '{}'", image.name, new_name);

        Ok(StoredImage {
            name: new_name.to_string(),
            path: new_path,
        })
    }

    /// Remove an image from disk
    pub fn delete(&self, image: &StoredImage) -> AppResult<()> {
        fs::remove_file(&image.path)?;

        log::info!("🗑️  Deleted '{}'", image.name);

        Ok(())
    }

    /// Export a copy of `image` to `destination`.
    /// A destination without an extension gets `.png` appended. Exporting an
    /// image onto its own file is refused, since the copy would truncate it.
    pub fn copy_to(&self, image: &StoredImage, destination: &Path) -> AppResult<PathBuf> {
        if !image.path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source image not found: {}", image.path.display()),
            )
            .into());
        }

        let mut output_path = destination.to_path_buf();
        if output_path.extension().is_none() {
            output_path.set_extension(IMAGE_EXTENSION);
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if output_path.exists() && is_same_file(&image.path, &output_path)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is the image itself", output_path.display()),
            )
            .into());
        }

        fs::copy(&image.path, &output_path)?;

        log::info!("📤 Exported '{}' to {}", image.name, output_path.display());

        Ok(output_path)
    }

    /// `base` if no image has that name yet, otherwise the first free
    /// `base (2)`, `base (3)`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if !self.image_path(base).exists() {
            return base.to_string();
        }

        let mut counter = 2;
        loop {
            let candidate = format!("{base} ({counter})");
            if !self.image_path(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{IMAGE_EXTENSION}"))
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("dir", &self.dir).finish()
    }
}

fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

/// Only `{name}.png` is picked up, matching what `image_path` builds, so
/// every listed image can be looked up again by its name.
fn stored_image_from_path(path: &Path) -> Option<StoredImage> {
    if path.extension()?.to_str()? != IMAGE_EXTENSION {
        return None;
    }

    let name = path.file_stem()?.to_str()?;
    if name.is_empty() || name.starts_with('.') {
        return None;
    }

    Some(StoredImage {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Names must stay inside the library directory and must not be hidden.
fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Please enter a file name"));
    }
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(AppError::validation(format!("'{name}' is not a valid file name")));
    }
    Ok(name)
}

fn already_exists(name: &str) -> AppError {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("an image named '{name}' already exists"),
    )
    .into()
}
