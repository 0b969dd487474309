//! Template content for `snapforge init`.

/// Starting point for a new `snapforge.yaml`. Every key is left for the user to fill in.
pub const PROJECT_TEMPLATE: &str = r#"name: # the name of the package
version: # the version of the package
summary: # 79 char long summary
description: # a longer description of the package
"#;
