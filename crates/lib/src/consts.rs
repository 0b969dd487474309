//! Names shared across the crate.

pub const APP_NAME: &str = "snapforge";

/// Project configuration file, looked up in the project directory.
pub const PROJECT_FILENAME: &str = "snapforge.yaml";

/// Environment variable overriding the project directory.
pub const PROJECT_DIR_ENV: &str = "SNAPFORGE_PROJECT_DIR";

pub const PARTS_DIR: &str = "parts";
pub const STAGE_DIR: &str = "stage";
pub const STRIP_DIR: &str = "strip";

/// Directory under `parts/` holding project-local plugin code.
pub const LOCAL_PLUGINS_DIR: &str = "plugins";

pub const PART_SRC_DIR: &str = "src";
pub const PART_BUILD_DIR: &str = "build";
pub const PART_INSTALL_DIR: &str = "install";
pub const PART_STATE_DIR: &str = "state";

/// Metadata directory inside the stripped tree.
pub const META_DIR: &str = "meta";
pub const META_FILENAME: &str = "package.yaml";

pub const IMAGE_EXTENSION: &str = "snap";

/// 1980-01-01T00:00:00Z, the ZIP epoch.
pub const SOURCE_DATE_EPOCH: &str = "315532800";
