//! Layered YAML loader with environment scoping.
//!
//! Reads the configured files in order, keeps the `default` section and the
//! active-environment section of each, deep-merges them, and finally applies
//! environment-variable overrides.

mod env;
mod layer_io;
mod merge;
pub(crate) mod utils;


use crate::{ConfigError, Settings};
use log::{debug, info};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Scope section visible under every environment.
pub const DEFAULT_SCOPE: &str = "default";
/// Environment used when none is selected.
pub const DEFAULT_ENVIRONMENT: &str = "development";
/// Variable that selects the active environment.
pub const ENVIRONMENT_VAR: &str = "CONFSTACK_ENV";
/// Standard file stack, lowest precedence first.
pub const STANDARD_FILES: &[&str] = &["app.yaml", "cloud.yaml", "database.yaml", "secrets.yaml"];

/// Which part of a file contributed to the merged tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerScope {
    /// The `default` section.
    Default,
    /// The active-environment section.
    Environment,
    /// The whole document, with scoping disabled.
    Flat,
}

/// Metadata about one loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Location on disk.
    pub path: PathBuf,
    /// Sections that were merged from this file.
    pub scopes: Vec<LayerScope>,
}

/// Options controlling which files are read and how they are scoped.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Files in merge order; later files win.
    pub files: Vec<PathBuf>,
    /// Directory used to resolve relative paths (defaults to the cwd).
    pub base_dir: Option<PathBuf>,
    /// Active environment; falls back to `CONFSTACK_ENV`, then `development`.
    pub environment: Option<String>,
    /// When false, each document is merged whole instead of by scope.
    pub environments: bool,
    /// Prefix for `PREFIX_A__B=value` overrides; `None` disables them.
    pub env_prefix: Option<String>,
    /// Secrets file that validation must find on disk.
    pub secrets_file: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            base_dir: None,
            environment: None,
            environments: true,
            env_prefix: None,
            secrets_file: None,
        }
    }
}

impl LoadOptions {
    /// Options with no files and scoping enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard app/cloud/database/secrets stack inside `dir`.
    ///
    /// File names stay relative and resolve against `dir` as the base.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let files: Vec<PathBuf> = STANDARD_FILES.iter().map(PathBuf::from).collect();
        Self {
            secrets_file: files.last().cloned(),
            files,
            base_dir: Some(dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Append a file; it takes precedence over every file added before it.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Select the active environment explicitly.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Merge whole documents instead of `default`/environment sections.
    pub fn without_environments(mut self) -> Self {
        self.environments = false;
        self
    }

    /// Enable environment-variable overrides under `prefix`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Set the directory used for relative paths.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Variable that selects the environment: `PREFIX_ENV` when overrides
    /// are enabled, else `CONFSTACK_ENV`.
    pub fn environment_var(&self) -> String {
        match self
            .env_prefix
            .as_deref()
            .map(|prefix| prefix.trim().trim_end_matches('_'))
            .filter(|prefix| !prefix.is_empty())
        {
            Some(prefix) => format!("{}_ENV", prefix.to_uppercase()),
            None => ENVIRONMENT_VAR.to_string(),
        }
    }

    /// The environment that loading will use, lower-cased.
    pub fn resolved_environment(&self) -> String {
        self.resolve_environment_with(|name| std::env::var(name).ok())
    }

    /// Explicit environment, then the prefixed selector, then `CONFSTACK_ENV`.
    fn resolve_environment_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        self.environment
            .clone()
            .or_else(|| lookup(&self.environment_var()))
            .or_else(|| lookup(ENVIRONMENT_VAR))
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }
}

/// Result of a load before it is wrapped in a manager.
#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub(crate) settings: Settings,
    pub(crate) environment: String,
    pub(crate) base_dir: PathBuf,
    pub(crate) layers: Vec<ConfigLayer>,
}

/// Load and merge every configured file.
pub(crate) fn load(options: &LoadOptions) -> Result<LoadedConfig, ConfigError> {
    let base_dir = match &options.base_dir {
        Some(dir) => utils::normalize_path(dir)?,
        None => std::env::current_dir().map_err(|source| ConfigError::ReadFailed {
            path: PathBuf::from("."),
            source,
        })?,
    };
    let environment = options.resolved_environment();
    info!(
        "loading config (files={}, environment={environment}, scoped={})",
        options.files.len(),
        options.environments
    );

    let mut documents = Vec::with_capacity(options.files.len());
    for file in &options.files {
        let path = utils::resolve_against(&base_dir, file);
        let document = layer_io::read_layer(&path)?.unwrap_or_default();
        documents.push((path, document));
    }

    let mut root = Value::Object(Map::new());
    let layers = if options.environments {
        merge_scoped(&mut root, &documents, &environment)?
    } else {
        merge_flat(&mut root, &documents)
    };

    if let Some(prefix) = options.env_prefix.as_deref() {
        let applied = env::apply_env_overrides(&mut root, prefix, std::env::vars());
        if !applied.is_empty() {
            info!("applied {} environment override(s)", applied.len());
        }
    }

    let settings = Settings::from_value(root).unwrap_or_default();
    info!(
        "config loaded (layers={}, top_level_keys={})",
        layers.len(),
        settings.as_map().len()
    );
    Ok(LoadedConfig {
        settings,
        environment,
        base_dir,
        layers,
    })
}

/// Merge every file's `default` section, then every file's environment section.
fn merge_scoped(
    root: &mut Value,
    documents: &[(PathBuf, Map<String, Value>)],
    environment: &str,
) -> Result<Vec<ConfigLayer>, ConfigError> {
    let mut layers: Vec<ConfigLayer> = documents
        .iter()
        .map(|(path, _)| ConfigLayer {
            path: path.clone(),
            scopes: Vec::new(),
        })
        .collect();

    for (scope, name) in [
        (LayerScope::Default, DEFAULT_SCOPE),
        (LayerScope::Environment, environment),
    ] {
        for ((path, document), layer) in documents.iter().zip(layers.iter_mut()) {
            let Some(section) = scope_section(document, name, path)? else {
                continue;
            };
            debug!(
                "merging {name} section (path={}, keys={})",
                path.display(),
                section.len()
            );
            merge::merge_section(root, section);
            if !layer.scopes.contains(&scope) {
                layer.scopes.push(scope);
            }
        }
        // `default` as the active environment has nothing left to add.
        if name == DEFAULT_SCOPE && environment == DEFAULT_SCOPE {
            break;
        }
    }
    Ok(layers)
}

fn merge_flat(root: &mut Value, documents: &[(PathBuf, Map<String, Value>)]) -> Vec<ConfigLayer> {
    documents
        .iter()
        .map(|(path, document)| {
            debug!("merging whole document (path={})", path.display());
            merge::merge_section(root, document);
            ConfigLayer {
                path: path.clone(),
                scopes: vec![LayerScope::Flat],
            }
        })
        .collect()
}

/// Fetch a scope section; null sections count as absent.
fn scope_section<'a>(
    document: &'a Map<String, Value>,
    name: &str,
    path: &Path,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match document.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(section)) => Ok(Some(section)),
        Some(_) => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
            section: name.to_string(),
        }),
    }
}
