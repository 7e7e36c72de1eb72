//! Resolution pipeline: reads data files, resolves item references, builds
//! the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the catalog and router-config loaders built
//! on top of them.

use intochest_core::catalog::{Catalog, CatalogBuilder, CatalogError};
use intochest_core::id::{IdentityParseError, ItemIdentity};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::schema::{CatalogData, RouterConfig};

/// Base name of the catalog data file.
pub const CATALOG_FILE: &str = "catalog";
/// Base name of the router configuration file.
pub const ROUTER_FILE: &str = "router";

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.ron");

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An item id is not of the form `type|variant`.
    #[error("bad item id in {file}: {source}")]
    BadIdentity {
        file: PathBuf,
        #[source]
        source: IdentityParseError,
    },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The entries were readable but do not form a valid catalog.
    #[error("invalid catalog in {file}: {source}")]
    Catalog {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` is only used for
/// error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Catalog
// ===========================================================================

/// Resolve catalog data into an immutable [`Catalog`].
///
/// Names are lowercased. Group members may be item names or
/// `"type|variant"` ids; either must refer to a listed item.
pub fn build_catalog(
    data: &CatalogData,
    default_max_stack: u32,
    file: &Path,
) -> Result<Catalog, DataLoadError> {
    let catalog_err = |source: CatalogError| DataLoadError::Catalog {
        file: file.to_path_buf(),
        source,
    };
    let parse_id = |id: &str| {
        id.parse::<ItemIdentity>()
            .map_err(|source| DataLoadError::BadIdentity {
                file: file.to_path_buf(),
                source,
            })
    };

    let mut builder = CatalogBuilder::new();
    builder
        .set_default_max_stack(data.default_max_stack.unwrap_or(default_max_stack))
        .map_err(catalog_err)?;

    let mut names: HashMap<String, ItemIdentity> = HashMap::new();
    for entry in &data.items {
        let name = entry.name.trim().to_lowercase();
        check_duplicate(&names, &name, file)?;
        let id = parse_id(&entry.id)?;
        builder.register_item(&name, id).map_err(catalog_err)?;
        if let Some(short) = &entry.short_name {
            builder.register_short_name(short, id).map_err(catalog_err)?;
        }
        names.insert(name, id);
    }

    for group in &data.groups {
        let mut members = Vec::with_capacity(group.members.len());
        for member in &group.members {
            let member = member.trim().to_lowercase();
            let id = if member.starts_with(|c: char| c.is_ascii_digit()) {
                parse_id(&member)?
            } else {
                *resolve_name(&names, &member, file, "item")?
            };
            members.push(id);
        }
        builder
            .register_group(&group.name, members)
            .map_err(catalog_err)?;
    }

    for &type_id in &data.unstackable {
        builder.mark_unstackable(type_id);
    }
    for limit in &data.stack_limits {
        builder
            .set_stack_limit(limit.type_id, limit.limit)
            .map_err(catalog_err)?;
    }

    builder.build().map_err(catalog_err)
}

/// Load `catalog.{ron,toml,json}` from `dir`. The file must exist.
pub fn load_catalog(dir: &Path, default_max_stack: u32) -> Result<Catalog, DataLoadError> {
    let path = require_data_file(dir, CATALOG_FILE)?;
    let data: CatalogData = deserialize_file(&path)?;
    let catalog = build_catalog(&data, default_max_stack, &path)?;
    tracing::info!(file = %path.display(), items = catalog.len(), "loaded item catalog");
    Ok(catalog)
}

/// The catalog shipped with this crate.
pub fn default_catalog() -> Result<Catalog, DataLoadError> {
    bundled_catalog(intochest_core::id::DEFAULT_MAX_STACK)
}

fn bundled_catalog(default_max_stack: u32) -> Result<Catalog, DataLoadError> {
    let file = Path::new("<bundled>/catalog.ron");
    let data: CatalogData = deserialize_str(BUNDLED_CATALOG, Format::Ron, file)?;
    build_catalog(&data, default_max_stack, file)
}

// ===========================================================================
// Router configuration
// ===========================================================================

/// Load `router.{ron,toml,json}` from `dir`, or defaults if there is none.
pub fn load_router_config(dir: &Path) -> Result<RouterConfig, DataLoadError> {
    match find_data_file(dir, ROUTER_FILE)? {
        Some(path) => {
            let config: RouterConfig = deserialize_file(&path)?;
            tracing::info!(file = %path.display(), "loaded router config");
            Ok(config)
        }
        None => {
            tracing::debug!(dir = %dir.display(), "no router config, using defaults");
            Ok(RouterConfig::default())
        }
    }
}

/// Everything a host needs to start routing.
#[derive(Debug)]
pub struct RouterData {
    pub config: RouterConfig,
    pub catalog: Catalog,
}

/// Load the router configuration and the catalog from `dir`.
///
/// The catalog falls back to the bundled one when `dir` has no catalog
/// file; its default stack limit comes from the configuration.
pub fn load_router_data(dir: &Path) -> Result<RouterData, DataLoadError> {
    let config = load_router_config(dir)?;
    let catalog = match find_data_file(dir, CATALOG_FILE)? {
        Some(_) => load_catalog(dir, config.default_max_stack)?,
        None => {
            tracing::debug!(dir = %dir.display(), "no catalog file, using bundled catalog");
            bundled_catalog(config.default_max_stack)?
        }
    };
    Ok(RouterData { config, catalog })
}

// ===========================================================================
// Tests
// ===========================================================================
