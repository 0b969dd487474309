//! Serde types for `snapforge.yaml`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::fileset::FileSet;
use crate::plugin::PluginOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
  #[default]
  App,
  Os,
  Kernel,
  Gadget,
}

impl fmt::Display for PackageType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      PackageType::App => "app",
      PackageType::Os => "os",
      PackageType::Kernel => "kernel",
      PackageType::Gadget => "gadget",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
  #[serde(default)]
  pub name: String,
  #[serde(default, deserialize_with = "version_string")]
  pub version: String,
  #[serde(default)]
  pub summary: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub architectures: Vec<String>,
  #[serde(default, rename = "type")]
  pub package_type: PackageType,
  #[serde(default)]
  pub build_packages: Vec<String>,
  #[serde(default)]
  pub parts: BTreeMap<String, PartConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartConfig {
  pub plugin: String,
  #[serde(default)]
  pub after: Vec<String>,
  #[serde(default)]
  pub build_packages: Vec<String>,
  #[serde(default)]
  pub stage: FileSet,
  #[serde(default)]
  pub strip: FileSet,
  /// Everything else, handed to the plugin.
  #[serde(flatten)]
  pub options: PluginOptions,
}

/// Versions are often written unquoted (`version: 1.0`).
fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  match serde_yaml::Value::deserialize(deserializer)? {
    serde_yaml::Value::String(s) => Ok(s),
    serde_yaml::Value::Number(n) => Ok(n.to_string()),
    serde_yaml::Value::Null => Ok(String::new()),
    other => Err(de::Error::custom(format!("invalid version: {:?}", other))),
  }
}
