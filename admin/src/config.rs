//! Code for reading app configuration from a TOML file.
//! The configuration file path is supplied via the command line.

use crate::{media::default_slots, Gallery, MediaLibrary};
use anyhow::{anyhow, Context, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use common::FileStore;
use foldhash::{HashMap, HashMapExt};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::read_to_string;
use toml_edit::de::from_str as toml_from_str;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Path to the root directory of the site; every other path is relative to it
    pub root: Utf8PathBuf,
    // Page whose text is edited
    #[serde(default = "default_html_file")]
    pub html_file: Utf8PathBuf,
    // Site-wide stylesheet
    #[serde(default = "default_css_file")]
    pub css_file: Utf8PathBuf,
    // Site-wide script
    #[serde(default = "default_js_file")]
    pub js_file: Utf8PathBuf,
    // Directory receiving gallery uploads
    #[serde(default = "default_gallery_dir")]
    pub gallery_dir: Utf8PathBuf,
    // JSON file listing gallery images
    #[serde(default = "default_gallery_data")]
    pub gallery_data: Utf8PathBuf,
    // Media slot names and the image paths they control
    #[serde(default)]
    pub media: Option<IndexMap<String, Utf8PathBuf>>,
}

fn default_html_file() -> Utf8PathBuf {
    "index.html".into()
}

fn default_css_file() -> Utf8PathBuf {
    "assets/css/main.css".into()
}

fn default_js_file() -> Utf8PathBuf {
    "assets/js/main.js".into()
}

fn default_gallery_dir() -> Utf8PathBuf {
    "assets/img/gallery/".into()
}

fn default_gallery_data() -> Utf8PathBuf {
    "gallery_data.json".into()
}

impl Config {
    /// Reads a config file from `path`.
    ///
    /// # Errors
    /// This function returns an error if:
    /// - the file cannot be read or parsed
    /// - `root` does not point to a directory
    /// - a configured path is absolute or leaves the site root
    /// - two media slots point to the same file
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let config = Self::from_toml(
            &read_to_string(path)
                .with_context(|| format!("failed to read configuration from {path}"))?,
        )?;

        if !config.root.is_dir() {
            return Err(anyhow!(
                "`root`: {:?} does not point to a directory",
                config.root
            ));
        }

        Ok(config)
    }

    /// Parses configuration text without touching the file system.
    ///
    /// # Errors
    /// This function returns an error if the text is not a valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml_from_str(text).context("failed to parse configuration file")?;

        config
            .check_paths()
            .context("configuration file is invalid")?;

        Ok(config)
    }

    fn check_paths(&self) -> Result<()> {
        for (field, path) in [
            ("html_file", &self.html_file),
            ("css_file", &self.css_file),
            ("js_file", &self.js_file),
            ("gallery_dir", &self.gallery_dir),
            ("gallery_data", &self.gallery_data),
        ] {
            check_relative(path).with_context(|| format!("`{field}` is invalid"))?;
        }

        if let Some(media) = &self.media {
            let mut slot_paths = HashMap::with_capacity(media.len());

            for (key, path) in media {
                check_relative(path).with_context(|| format!("`media.{key}` is invalid"))?;

                if let Some(other) = slot_paths.insert(path, key) {
                    return Err(anyhow!(
                        "`media`: \"{other}\" and \"{key}\" point to the same file"
                    ));
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.root.join(path)
    }

    #[must_use]
    pub fn html_store(&self) -> FileStore {
        FileStore::new(self.resolve(&self.html_file))
    }

    #[must_use]
    pub fn css_store(&self) -> FileStore {
        FileStore::new(self.resolve(&self.css_file))
    }

    #[must_use]
    pub fn js_store(&self) -> FileStore {
        FileStore::new(self.resolve(&self.js_file))
    }

    #[must_use]
    pub fn gallery(&self) -> Gallery {
        Gallery::new(
            self.resolve(&self.gallery_dir),
            self.resolve(&self.gallery_data),
        )
    }

    #[must_use]
    pub fn media_library(&self) -> MediaLibrary {
        MediaLibrary::new(
            self.root.clone(),
            self.media.clone().unwrap_or_else(default_slots),
        )
    }
}

fn check_relative(path: &Utf8Path) -> Result<()> {
    if path.as_str().is_empty() {
        Err(anyhow!("path is empty"))
    } else if !path.is_relative() {
        Err(anyhow!("{path:?} is not relative to the site root"))
    } else if path
        .components()
        .any(|part| matches!(part, Utf8Component::ParentDir))
    {
        Err(anyhow!("{path:?} leaves the site root"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = Config::from_toml("root = \"site\"").expect("parsing should succeed");

        assert_eq!(config.root, "site");
        assert_eq!(config.html_store().path(), "site/index.html");
        assert_eq!(config.css_store().path(), "site/assets/css/main.css");
        assert_eq!(config.js_store().path(), "site/assets/js/main.js");
        assert_eq!(config.resolve(&config.gallery_dir), "site/assets/img/gallery/");
        assert_eq!(config.media_library().slots().len(), 17);
    }

    #[test]
    fn custom_media() {
        let config = Config::from_toml(
            "root = \"site\"\nhtml_file = \"home.html\"\n\n[media]\nbanner = \"img/banner.png\"\nabout = \"img/about.jpg\"\n",
        )
        .expect("parsing should succeed");

        assert_eq!(config.html_store().path(), "site/home.html");

        let library = config.media_library();
        assert_eq!(
            library.slots().keys().collect::<Vec<_>>(),
            ["banner", "about"]
        );
    }

    #[test]
    fn invalid() {
        // Missing root
        assert!(Config::from_toml("html_file = \"index.html\"").is_err());
        // Unknown field
        assert!(Config::from_toml("root = \"site\"\ncolour = \"red\"").is_err());
        // Paths must stay inside the site root
        assert!(Config::from_toml("root = \"site\"\ncss_file = \"/etc/passwd\"").is_err());
        assert!(Config::from_toml("root = \"site\"\njs_file = \"../main.js\"").is_err());
        assert!(Config::from_toml("root = \"site\"\n[media]\nhero = \"../hero.jpg\"").is_err());
        // Two slots cannot share one file
        assert!(Config::from_toml(
            "root = \"site\"\n[media]\nhero = \"img/a.jpg\"\nbanner = \"img/a.jpg\""
        )
        .is_err());
    }

    #[test]
    fn root_must_exist() {
        let dir = tempdir().expect("temporary directory should be created");
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_owned())
            .expect("temporary paths should be UTF-8");
        let config_path = dir_path.join("admin.toml");

        fs::write(&config_path, "root = \"missing\"").expect("write should succeed");
        assert!(Config::from_path(&config_path).is_err());

        fs::write(&config_path, format!("root = {:?}", dir_path.as_str()))
            .expect("write should succeed");
        let config = Config::from_path(&config_path).expect("loading should succeed");
        assert_eq!(config.root, dir_path);
    }
}
