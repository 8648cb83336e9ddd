//! Output formatting for resolved configurations.

use crate::config::{PathValue, ResolvedConfig};
use anyhow::Result;

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Text,
}

/// Render a resolved configuration in the requested format.
pub fn format_config(config: &ResolvedConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(config)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)? + "\n"),
        OutputFormat::Text => Ok(format_config_text(config)),
    }
}

/// Aligned `key  value` listing, one path per line.
pub fn format_config_text(config: &ResolvedConfig) -> String {
    let mut out = String::new();

    if let Some(group_id) = config.group_id {
        out.push_str(&format!("groupID     {}\n", group_id));
    }
    out.push_str(&format!("mode        {}\n", config.mode));

    let width = config
        .path
        .iter()
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0);
    for (key, value) in config.path.iter() {
        let shown = match value {
            PathValue::Set(p) => p.display().to_string(),
            PathValue::Unset => "(unset)".to_string(),
        };
        out.push_str(&format!("path.{:<width$}  {}\n", key, shown, width = width));
    }

    out
}

/// Summary of which files fed into the configuration.
pub fn format_sources(config: &ResolvedConfig) -> String {
    let show = |p: &Option<std::path::PathBuf>, none: &str| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| none.to_string())
    };
    format!(
        "user:    {}\nproject: {}\nmode:    {}\n",
        show(&config.sources.user_file, "(skipped, CI)"),
        show(&config.sources.project_file, "none"),
        config.mode
    )
}
