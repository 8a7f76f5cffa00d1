//! Code for the image gallery: uploads are stored in one directory
//! and described by entries in a JSON sidecar file.

use crate::AdminError;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use common::{move_file, FileStore, Store};
use jiff::{civil::DateTime, tz::TimeZone, Timestamp};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs::remove_file,
    sync::{
        atomic::{AtomicU32, Ordering},
        LazyLock,
    },
};

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9.-]").expect("file name pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub id: String,
    // Name of the stored file inside the gallery directory
    pub filename: String,
    // Sanitized name of the file as it was uploaded
    pub original_name: String,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "upload_date")]
    pub upload_date: DateTime,
}

impl GalleryEntry {
    /// The custom name if one was given, otherwise the original file name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.custom_name.is_empty() {
            &self.original_name
        } else {
            &self.custom_name
        }
    }
}

/// A file waiting to be added to the gallery.
pub struct Upload {
    pub source: Utf8PathBuf,
    // File name reported by the uploader
    pub name: String,
    pub custom_name: String,
    pub description: String,
}

impl Upload {
    /// Describes an upload named after its source file, without custom name or description.
    pub fn from_path(source: impl Into<Utf8PathBuf>) -> Self {
        let source = source.into();
        let name = source.file_name().unwrap_or_default().to_owned();

        Self {
            source,
            name,
            custom_name: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub stored: Vec<GalleryEntry>,
    pub errors: Vec<String>,
}

impl UploadReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.stored.is_empty()
    }

    #[must_use]
    pub fn message(&self) -> String {
        if self.stored.is_empty() {
            return self.errors.join(" ");
        }

        let mut message = format!("{} file(s) uploaded successfully.", self.stored.len());
        if !self.errors.is_empty() {
            message.push_str(" Errors: ");
            message.push_str(&self.errors.join(" "));
        }
        message
    }
}

pub struct Gallery {
    dir: Utf8PathBuf,
    sidecar: FileStore,
}

impl Gallery {
    /// Creates a gallery storing images in `dir` and their entries in the JSON file at `sidecar`.
    pub fn new(dir: impl Into<Utf8PathBuf>, sidecar: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sidecar: FileStore::new(sidecar),
        }
    }

    /// Returns the entries in upload order. A missing sidecar file means an empty gallery.
    ///
    /// # Errors
    /// This function returns an error if the sidecar file exists but cannot be read or parsed.
    pub fn entries(&self) -> Result<Vec<GalleryEntry>> {
        if !self.sidecar.exists() {
            return Ok(Vec::new());
        }

        let json = self
            .sidecar
            .read()
            .context("failed to read gallery data")?;

        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse gallery data in {}", self.sidecar.path()))
    }

    fn save(&self, entries: &[GalleryEntry]) -> Result<()> {
        let json =
            serde_json::to_string_pretty(entries).context("failed to serialize gallery data")?;

        self.sidecar
            .write(&json)
            .context("failed to save gallery data")
    }

    /// Moves each upload into the gallery directory and records it.
    /// Uploads with a disallowed file type or that cannot be moved are reported in
    /// [`UploadReport::errors`] without affecting the others.
    ///
    /// # Errors
    /// This function returns an error if the gallery data cannot be read or saved.
    pub fn upload(&self, uploads: impl IntoIterator<Item = Upload>) -> Result<UploadReport> {
        let uploads: Vec<_> = uploads.into_iter().collect();
        let total = uploads.len();

        let mut entries = self.entries()?;
        let mut report = UploadReport::default();

        for upload in uploads {
            let name = sanitize_file_name(&upload.name);
            let custom_name = sanitize_file_name(&upload.custom_name);

            let extension = Utf8Path::new(&name)
                .extension()
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();

            if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
                log::warn!("rejected upload {name}: file type not allowed");
                report.errors.push(format!("File type not allowed for {name}."));
                continue;
            }

            let mut filename = String::new();
            if !custom_name.is_empty() {
                filename.push_str(&custom_name);
                filename.push('_');
            }
            filename.push_str(&unique_id("img_"));
            filename.push('.');
            filename.push_str(&extension);

            if let Err(err) = move_file(&upload.source, &self.dir.join(&filename)) {
                log::warn!("failed to store upload {name}: {err:#}");
                report.errors.push(format!("Failed to upload {name}."));
                continue;
            }

            let entry = GalleryEntry {
                id: unique_id(""),
                filename,
                original_name: name,
                custom_name,
                description: upload.description,
                upload_date: upload_time()?,
            };

            entries.push(entry.clone());
            self.save(&entries)?;
            report.stored.push(entry);

            log::info!("Uploaded {} of {total} files.", report.stored.len());
        }

        Ok(report)
    }

    /// Removes the entry with the given id along with its image file.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - no entry has the given id
    /// - the gallery data cannot be read or saved
    /// - the image file exists but cannot be removed
    pub fn delete(&self, id: &str) -> Result<GalleryEntry> {
        let mut entries = self.entries()?;

        let position = entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| AdminError::not_found(format!("No gallery image with id {id}")))?;

        let entry = entries.remove(position);
        self.remove_image(&entry)?;
        self.save(&entries)?;

        log::info!("deleted gallery image {id} ({})", entry.filename);

        Ok(entry)
    }

    /// Removes every entry and every image file that still exists.
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// This function returns an error if the gallery data cannot be read or saved,
    /// or if an existing image file cannot be removed.
    pub fn delete_all(&self) -> Result<usize> {
        let entries = self.entries()?;

        for entry in &entries {
            self.remove_image(entry)?;
        }
        self.save(&[])?;

        log::info!("deleted all {} gallery images", entries.len());

        Ok(entries.len())
    }

    fn remove_image(&self, entry: &GalleryEntry) -> Result<()> {
        let path = self.dir.join(&entry.filename);

        if path.is_file() {
            remove_file(&path).with_context(|| format!("failed to delete {path}"))?;
        }

        Ok(())
    }
}

/// Replaces every character other than ASCII letters, digits, `.`, and `-` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// Builds an identifier from the current time and a process-wide counter.
fn unique_id(prefix: &str) -> String {
    static SEQUENCE: AtomicU32 = AtomicU32::new(0);

    let now = Timestamp::now();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xffff;

    format!(
        "{prefix}{:08x}{:05x}{sequence:04x}",
        now.as_second(),
        now.subsec_microsecond()
    )
}

/// The current UTC time, truncated to whole seconds as stored in the sidecar file.
fn upload_time() -> Result<DateTime> {
    let now = Timestamp::from_second(Timestamp::now().as_second())
        .context("current time is out of range")?;

    Ok(now.to_zoned(TimeZone::UTC).datetime())
}

mod upload_date {
    use jiff::civil::DateTime;
    use serde::{
        de::{Error as DeError, Unexpected},
        Deserialize, Deserializer, Serializer,
    };

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(super) fn serialize<S: Serializer>(
        date: &DateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.strftime(FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: String = Deserialize::deserialize(deserializer)?;

        DateTime::strptime(FORMAT, &raw).map_err(|_| {
            DeError::invalid_value(
                Unexpected::Str(&raw),
                &"Expected a date in \"YYYY-MM-DD HH:MM:SS\" form",
            )
        })
    }
}
