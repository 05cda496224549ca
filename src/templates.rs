//! Named style templates and the persisted config document.
//!
//! Everything lives in one pretty-printed JSON file:
//!
//! ```json
//! {
//!     "text_watermark": { ... },
//!     "image_watermark": { ... },
//!     "last_used": { "watermark_type": "text" },
//!     "templates": { "text": { "name": { ... } }, "image": {} }
//! }
//! ```
//!
//! Every operation reads the file fresh, mutates the document in memory and
//! writes the whole document back. Nothing is cached between calls, and the
//! file is not locked.
//!
//! Sections are decoded one at a time. A section that does not decode reads
//! as its defaults, and its raw JSON is written back untouched until the
//! section is replaced.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::params::{ImageWatermarkParams, TextWatermarkParams, WatermarkKind};

/// File name used when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "watermark_config.json";

const TEXT_SECTION: &str = "text_watermark";
const IMAGE_SECTION: &str = "image_watermark";
const LAST_USED_SECTION: &str = "last_used";
const TEMPLATES_SECTION: &str = "templates";

/// Decode `map[key]`. On failure the raw value stays in `map` and the
/// default is returned.
fn take_section<T: DeserializeOwned + Default>(map: &mut Map<String, Value>, key: &str) -> T {
    let Some(raw) = map.remove(key) else {
        return T::default();
    };
    match T::deserialize(&raw) {
        Ok(section) => section,
        Err(e) => {
            warn!(section = key, error = %e, "config section unreadable, using defaults");
            map.insert(key.to_string(), raw);
            T::default()
        }
    }
}

/// The whole config document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigRoot {
    text_watermark: TextWatermarkParams,
    image_watermark: ImageWatermarkParams,
    last_used: LastUsed,
    templates: Templates,
    // unknown top-level keys plus known sections that did not decode
    raw: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct LastUsed {
    watermark_type: WatermarkKind,
}

impl ConfigRoot {
    /// Decode a parsed document. Anything but a JSON object reads as defaults.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            warn!("config root is not an object, using defaults");
            return Self::default();
        };
        Self {
            text_watermark: take_section(&mut map, TEXT_SECTION),
            image_watermark: take_section(&mut map, IMAGE_SECTION),
            last_used: take_section(&mut map, LAST_USED_SECTION),
            templates: take_section(&mut map, TEMPLATES_SECTION),
            raw: map,
        }
    }

    /// Default text parameters for a fresh session.
    #[must_use]
    pub fn text_defaults(&self) -> &TextWatermarkParams {
        &self.text_watermark
    }

    /// Replace the default text parameters.
    pub fn set_text_defaults(&mut self, params: TextWatermarkParams) {
        self.raw.remove(TEXT_SECTION);
        self.text_watermark = params;
    }

    /// Default image parameters for a fresh session.
    #[must_use]
    pub fn image_defaults(&self) -> &ImageWatermarkParams {
        &self.image_watermark
    }

    /// Replace the default image parameters.
    pub fn set_image_defaults(&mut self, params: ImageWatermarkParams) {
        self.raw.remove(IMAGE_SECTION);
        self.image_watermark = params;
    }

    /// Kind of watermark last applied.
    #[must_use]
    pub fn last_used_kind(&self) -> WatermarkKind {
        self.last_used.watermark_type
    }

    /// Record the kind of watermark last applied.
    pub fn set_last_used_kind(&mut self, kind: WatermarkKind) {
        self.raw.remove(LAST_USED_SECTION);
        self.last_used.watermark_type = kind;
    }

    /// Saved templates.
    #[must_use]
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Saved templates, mutably.
    pub fn templates_mut(&mut self) -> &mut Templates {
        self.raw.remove(TEMPLATES_SECTION);
        &mut self.templates
    }

    /// Top-level entries written back verbatim: keys this version does not
    /// know about, and sections that did not decode.
    #[must_use]
    pub fn raw_sections(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl Serialize for ConfigRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.raw.contains_key(TEXT_SECTION) {
            map.serialize_entry(TEXT_SECTION, &self.text_watermark)?;
        }
        if !self.raw.contains_key(IMAGE_SECTION) {
            map.serialize_entry(IMAGE_SECTION, &self.image_watermark)?;
        }
        if !self.raw.contains_key(LAST_USED_SECTION) {
            map.serialize_entry(LAST_USED_SECTION, &self.last_used)?;
        }
        if !self.raw.contains_key(TEMPLATES_SECTION) {
            map.serialize_entry(TEMPLATES_SECTION, &self.templates)?;
        }
        for (key, value) in &self.raw {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfigRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Template snapshots, one map per kind.
///
/// Snapshots are kept as raw JSON so fields written by other versions
/// survive a read-modify-write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Templates {
    text: BTreeMap<String, Value>,
    image: BTreeMap<String, Value>,
    raw: Map<String, Value>,
}

impl Templates {
    /// Templates of one kind.
    #[must_use]
    pub fn of(&self, kind: WatermarkKind) -> &BTreeMap<String, Value> {
        match kind {
            WatermarkKind::Text => &self.text,
            WatermarkKind::Image => &self.image,
        }
    }

    /// Templates of one kind, mutably.
    pub fn of_mut(&mut self, kind: WatermarkKind) -> &mut BTreeMap<String, Value> {
        self.raw.remove(kind.as_str());
        match kind {
            WatermarkKind::Text => &mut self.text,
            WatermarkKind::Image => &mut self.image,
        }
    }
}

impl Serialize for Templates {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for kind in [WatermarkKind::Text, WatermarkKind::Image] {
            if !self.raw.contains_key(kind.as_str()) {
                map.serialize_entry(kind.as_str(), self.of(kind))?;
            }
        }
        for (key, value) in &self.raw {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Templates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            text: take_section(&mut map, WatermarkKind::Text.as_str()),
            image: take_section(&mut map, WatermarkKind::Image.as_str()),
            raw: map,
        })
    }
}

/// A parameter set that can be stored as a named template.
pub trait TemplateParams: Serialize + DeserializeOwned {
    /// The template namespace this type is stored under.
    const KIND: WatermarkKind;
}

impl TemplateParams for TextWatermarkParams {
    const KIND: WatermarkKind = WatermarkKind::Text;
}

impl TemplateParams for ImageWatermarkParams {
    const KIND: WatermarkKind = WatermarkKind::Image;
}

/// Reads and writes the config file.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl TemplateStore {
    /// A store backed by the JSON file at `path`. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config document.
    ///
    /// A missing file is created with defaults. A file that is not valid
    /// JSON reads as defaults and is left as is until the next write. In a
    /// valid file, each section that does not decode reads as its defaults
    /// on its own (see [`ConfigRoot::from_value`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read, or if
    /// creating the default file fails.
    pub fn load_config(&self) -> Result<ConfigRoot> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config missing, writing defaults");
                let config = ConfigRoot::default();
                self.save_config(&config)?;
                return Ok(config);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&data) {
            Ok(value) => Ok(ConfigRoot::from_value(value)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config unreadable, using defaults");
                Ok(ConfigRoot::default())
            }
        }
    }

    /// Write the whole config document, pretty-printed with 4-space indent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails or [`Error::Io`] if
    /// the file cannot be written.
    pub fn save_config(&self, config: &ConfigRoot) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        config.serialize(&mut ser)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, buf)?;
        Ok(())
    }

    /// Save `params` as template `name`, replacing any template of the same
    /// kind and name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplateName`] for an empty or blank name, or
    /// any error from [`load_config`](Self::load_config) and
    /// [`save_config`](Self::save_config).
    pub fn save<T: TemplateParams>(&self, name: &str, params: &T) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidTemplateName);
        }
        let snapshot = serde_json::to_value(params)?;
        let mut config = self.load_config()?;
        let replaced = config
            .templates_mut()
            .of_mut(T::KIND)
            .insert(name.to_string(), snapshot)
            .is_some();
        self.save_config(&config)?;
        info!(kind = %T::KIND, name, replaced, "template saved");
        Ok(())
    }

    /// Load template `name`. Missing names and unreadable snapshots give `None`.
    #[must_use]
    pub fn load<T: TemplateParams>(&self, name: &str) -> Option<T> {
        let config = self.read_or_default();
        let snapshot = config.templates().of(T::KIND).get(name)?;
        match T::deserialize(snapshot) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!(kind = %T::KIND, name, error = %e, "template unreadable");
                None
            }
        }
    }

    /// Names of all templates of `kind`, sorted.
    #[must_use]
    pub fn list(&self, kind: WatermarkKind) -> BTreeSet<String> {
        self.read_or_default()
            .templates()
            .of(kind)
            .keys()
            .cloned()
            .collect()
    }

    /// Delete template `name` of `kind`.
    ///
    /// Returns `Ok(false)` without touching the file if there was no such
    /// template.
    ///
    /// # Errors
    ///
    /// Returns any error from [`load_config`](Self::load_config) and
    /// [`save_config`](Self::save_config).
    pub fn delete(&self, kind: WatermarkKind, name: &str) -> Result<bool> {
        let mut config = self.load_config()?;
        if !config.templates().of(kind).contains_key(name) {
            return Ok(false);
        }
        config.templates_mut().of_mut(kind).remove(name);
        self.save_config(&config)?;
        info!(%kind, name, "template deleted");
        Ok(true)
    }

    /// Kind of watermark last applied.
    #[must_use]
    pub fn last_used_kind(&self) -> WatermarkKind {
        self.read_or_default().last_used_kind()
    }

    /// Record the kind of watermark last applied.
    ///
    /// # Errors
    ///
    /// Returns any error from [`load_config`](Self::load_config) and
    /// [`save_config`](Self::save_config).
    pub fn set_last_used_kind(&self, kind: WatermarkKind) -> Result<()> {
        let mut config = self.load_config()?;
        config.set_last_used_kind(kind);
        self.save_config(&config)
    }

    /// Text parameters to seed a fresh session with.
    #[must_use]
    pub fn default_text_params(&self) -> TextWatermarkParams {
        self.read_or_default().text_watermark
    }

    /// Image parameters to seed a fresh session with.
    #[must_use]
    pub fn default_image_params(&self) -> ImageWatermarkParams {
        self.read_or_default().image_watermark
    }

    fn read_or_default(&self) -> ConfigRoot {
        self.load_config().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "config unavailable, using defaults");
            ConfigRoot::default()
        })
    }
}
