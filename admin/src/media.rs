//! Code for replacing and deleting the fixed set of images used by the site's pages.

use crate::AdminError;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use common::move_file;
use indexmap::IndexMap;
use phf::{phf_ordered_map, OrderedMap};
use same_file::is_same_file;
use std::fs::remove_file;

/// Media slots of the site, used when the configuration does not list its own.
pub static DEFAULT_SLOTS: OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "hero" => "assets/img/hero-bg.jpg",
    "about" => "assets/img/about.jpg",
    "about1" => "assets/img/about-1.jpg",
    "about2" => "assets/img/about-2.jpg",
    "about3" => "assets/img/about-3.jpg",
    "features1" => "assets/img/features-1.svg",
    "features2" => "assets/img/features-2.svg",
    "features3" => "assets/img/features-3.svg",
    "features4" => "assets/img/features-4.svg",
    "campaignGoalsBg" => "assets/img/campaign-goals-bg.jpg",
    "campaignBackground" => "assets/img/campaign-background.jpg",
    "logo" => "assets/img/logo.png",
    "icon" => "assets/img/favicon.png",
    "mobilizingYouth" => "assets/img/mobilizing-youth.jpg",
    "keyMilestones" => "assets/img/key-milestones.jpg",
    "campusOutreach" => "assets/img/campus-outreach.jpg",
    "globalYouthImpact" => "assets/img/global-youth-impact.jpg",
};

// Slots whose key starts with this prefix only take raster photos
const PHOTO_SLOT_PREFIX: &str = "about";
const PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct MediaLibrary {
    root: Utf8PathBuf,
    slots: IndexMap<String, Utf8PathBuf>,
}

impl MediaLibrary {
    /// Creates a library of `slots`, whose paths are relative to `root`.
    pub fn new(root: impl Into<Utf8PathBuf>, slots: IndexMap<String, Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots,
        }
    }

    #[must_use]
    pub fn slots(&self) -> &IndexMap<String, Utf8PathBuf> {
        &self.slots
    }

    /// Returns the path of a slot, relative to the site root.
    ///
    /// # Errors
    /// This function returns an error if `key` does not name a slot.
    pub fn path(&self, key: &str) -> Result<&Utf8Path> {
        self.slots
            .get(key)
            .map(Utf8PathBuf::as_path)
            .ok_or_else(|| AdminError::invalid_input(format!("Invalid media key: {key}")))
    }

    /// Moves `upload` into the slot named `key`, replacing the current file.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - `key` does not name a slot
    /// - `upload` does not point to a file
    /// - the slot only accepts photos and `upload` is not a PNG or JPEG file
    /// - `upload` already is the slot's file
    /// - the file cannot be moved
    pub fn replace(&self, key: &str, upload: &Utf8Path) -> Result<()> {
        let target = self.root.join(self.path(key)?);

        if !upload.is_file() {
            return Err(AdminError::not_found(format!(
                "New media file does not exist: {upload}"
            )));
        }

        if key.starts_with(PHOTO_SLOT_PREFIX)
            && !upload.extension().is_some_and(|ext| {
                PHOTO_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
        {
            return Err(AdminError::invalid_input(format!(
                "Invalid file type for about section. Allowed types: {}",
                PHOTO_EXTENSIONS.join(", ")
            )));
        }

        if target.is_file()
            && is_same_file(upload, &target)
                .with_context(|| format!("failed to compare {upload} with {target}"))?
        {
            return Err(AdminError::invalid_input(format!(
                "{upload} is already the media file for \"{key}\""
            )));
        }

        move_file(upload, &target).with_context(|| format!("Failed to replace media: {target}"))?;

        log::info!("replaced media \"{key}\" at {target}");

        Ok(())
    }

    /// Deletes the file of the slot named `key`. The slot itself stays in the table.
    ///
    /// # Errors
    /// This function returns an error if `key` does not name a slot,
    /// or if the slot's file does not exist or cannot be removed.
    pub fn delete(&self, key: &str) -> Result<()> {
        let target = self.root.join(self.path(key)?);

        if !target.is_file() {
            return Err(AdminError::not_found(format!(
                "Failed to delete media: {target} does not exist"
            )));
        }

        remove_file(&target).with_context(|| format!("Failed to delete media: {target}"))?;

        log::info!("deleted media \"{key}\" at {target}");

        Ok(())
    }
}

/// Returns [`DEFAULT_SLOTS`] as an owned table.
#[must_use]
pub fn default_slots() -> IndexMap<String, Utf8PathBuf> {
    DEFAULT_SLOTS
        .entries()
        .map(|(key, path)| ((*key).to_owned(), Utf8PathBuf::from(*path)))
        .collect()
}
