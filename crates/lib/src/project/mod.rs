//! Project loading: metadata, parts and the dependency graph.

mod config;
mod paths;

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::LOCAL_PLUGINS_DIR;
use crate::graph::{GraphError, PartGraph};
use crate::part::Part;
use crate::platform::host_arch_name;
use crate::plugin::{self, PluginError};

pub use config::{PackageType, PartConfig, ProjectConfig};
pub use paths::{PartDirs, ProjectPaths};

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("no {} found in {}", crate::consts::PROJECT_FILENAME, path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_yaml::Error },

  #[error("missing required key '{0}'")]
  MissingField(&'static str),

  #[error("part '{0}' is defined more than once")]
  DuplicatePart(String),

  #[error("part name '{0}' is reserved for local plugins")]
  ReservedName(String),

  #[error("invalid part '{part}': {message}")]
  InvalidPart { part: String, message: String },

  #[error("part '{part}': {source}")]
  Plugin { part: String, source: PluginError },

  #[error("unknown part(s): {}", .0.join(", "))]
  UnknownParts(Vec<String>),

  #[error(transparent)]
  Graph(#[from] GraphError),
}

/// Project-level metadata, also the content of the generated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub summary: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(default)]
  pub architectures: Vec<String>,
  #[serde(default, rename = "type")]
  pub package_type: PackageType,
}

impl ProjectMetadata {
  /// Metadata for the host architecture with default type.
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      summary: String::new(),
      description: String::new(),
      architectures: vec![host_arch_name()],
      package_type: PackageType::default(),
    }
  }
}

#[derive(Debug)]
pub struct Project {
  metadata: ProjectMetadata,
  build_packages: Vec<String>,
  parts: Vec<Part>,
  graph: PartGraph,
  paths: ProjectPaths,
}

impl Project {
  /// Assemble a project from already-built parts.
  ///
  /// Rejects duplicate and reserved names and `after` entries naming missing
  /// parts. Cycles are left for the loader to reject.
  pub fn new(metadata: ProjectMetadata, parts: Vec<Part>, paths: ProjectPaths) -> Result<Self, ProjectError> {
    let mut seen = HashSet::new();
    for part in &parts {
      if part.name() == LOCAL_PLUGINS_DIR {
        return Err(ProjectError::ReservedName(part.name().to_string()));
      }
      if !seen.insert(part.name()) {
        return Err(ProjectError::DuplicatePart(part.name().to_string()));
      }
    }

    let graph = PartGraph::new(parts.iter().map(|p| (p.name(), p.after())))?;
    Ok(Self {
      metadata,
      build_packages: Vec::new(),
      parts,
      graph,
      paths,
    })
  }

  pub fn with_build_packages(mut self, packages: Vec<String>) -> Self {
    self.build_packages = packages;
    self
  }

  /// Build a validated project from parsed configuration.
  pub fn from_config(config: ProjectConfig, paths: ProjectPaths) -> Result<Self, ProjectError> {
    if config.name.is_empty() {
      return Err(ProjectError::MissingField("name"));
    }
    if config.version.is_empty() {
      return Err(ProjectError::MissingField("version"));
    }

    let mut parts = Vec::with_capacity(config.parts.len());
    for (name, part_config) in config.parts {
      parts.push(part_from_config(name, part_config)?);
    }

    let architectures = if config.architectures.is_empty() {
      vec![host_arch_name()]
    } else {
      config.architectures
    };
    let metadata = ProjectMetadata {
      name: config.name,
      version: config.version,
      summary: config.summary,
      description: config.description,
      architectures,
      package_type: config.package_type,
    };

    let project = Self::new(metadata, parts, paths)?.with_build_packages(config.build_packages);
    project.graph.verify_acyclic()?;
    Ok(project)
  }

  /// Read and validate `snapforge.yaml` from the project root.
  pub fn load(paths: ProjectPaths) -> Result<Self, ProjectError> {
    let path = paths.config_file();
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ProjectError::NotFound {
          path: paths.root().to_path_buf(),
        });
      }
      Err(e) => return Err(ProjectError::Read { path, source: e }),
    };

    let config: ProjectConfig = serde_yaml::from_str(&content).map_err(|e| ProjectError::Parse {
      path: path.clone(),
      source: e,
    })?;
    debug!(path = %path.display(), parts = config.parts.len(), "loaded project");
    Self::from_config(config, paths)
  }

  pub fn metadata(&self) -> &ProjectMetadata {
    &self.metadata
  }

  pub fn paths(&self) -> &ProjectPaths {
    &self.paths
  }

  pub fn graph(&self) -> &PartGraph {
    &self.graph
  }

  pub fn parts(&self) -> &[Part] {
    &self.parts
  }

  pub fn part(&self, name: &str) -> Option<&Part> {
    self.parts.iter().find(|p| p.name() == name)
  }

  pub fn part_names(&self) -> BTreeSet<String> {
    self.parts.iter().map(|p| p.name().to_string()).collect()
  }

  /// Check that every name refers to a part of this project.
  pub fn validate_parts<S: AsRef<str>>(&self, names: &[S]) -> Result<(), ProjectError> {
    let unknown: Vec<String> = names
      .iter()
      .map(AsRef::as_ref)
      .filter(|n| self.part(n).is_none())
      .map(str::to_string)
      .collect();
    if unknown.is_empty() {
      Ok(())
    } else {
      Err(ProjectError::UnknownParts(unknown))
    }
  }

  /// Host packages required by the project and all of its parts.
  pub fn build_tools(&self) -> BTreeSet<String> {
    self
      .build_packages
      .iter()
      .cloned()
      .chain(self.parts.iter().flat_map(|p| p.build_packages()))
      .collect()
  }
}

fn part_from_config(name: String, config: PartConfig) -> Result<Part, ProjectError> {
  let plugin = plugin::load(&config.plugin, &config.options).map_err(|e| ProjectError::Plugin {
    part: name.clone(),
    source: e,
  })?;

  let mut properties = serde_json::Map::new();
  properties.insert("plugin".to_string(), serde_json::Value::String(config.plugin.clone()));
  for (key, value) in &config.options {
    let value = serde_json::to_value(value).map_err(|e| ProjectError::InvalidPart {
      part: name.clone(),
      message: format!("'{}': {}", key, e),
    })?;
    properties.insert(key.clone(), value);
  }

  Ok(
    Part::new(name, plugin)
      .with_after(config.after)
      .with_stage(config.stage)
      .with_strip(config.strip)
      .with_properties(serde_json::Value::Object(properties))
      .with_build_packages(config.build_packages),
  )
}
