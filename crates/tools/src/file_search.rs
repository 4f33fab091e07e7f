//! Filename search over configured roots.

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{Value, json};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use steward_core::{ToolContext, ToolError, ToolHandler, ToolSpec};

/// Walks the configured search roots and returns files whose names contain
/// the query substring (case-insensitive) and match one of the glob
/// patterns. The match limit applies across all roots.
pub struct FileSearchTool {
    roots: Vec<String>,
}

impl FileSearchTool {
    pub fn new(roots: Vec<String>) -> Self {
        Self { roots }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new("search_files", "Find files by name under the configured search roots.")
            .with_timeout_ms(2000)
            .with_expected_latency_ms(250)
    }

    fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ToolError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                ToolError::InvalidArguments(format!("bad pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| ToolError::InvalidArguments(format!("bad patterns: {e}")))
    }
}

#[async_trait]
impl ToolHandler for FileSearchTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let Some(query) = context.param_str("query") else {
            return Err(ToolError::InvalidArguments("missing 'query' parameter".into()));
        };
        let limit = context.param_u64("limit").unwrap_or(10) as usize;
        let patterns: Vec<String> = match context.param("patterns") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => vec!["*".to_string()],
        };
        let glob_set = Self::build_glob_set(&patterns)?;
        let needle = query.to_lowercase();

        let mut matches: Vec<Value> = Vec::new();
        'roots: for root in &self.roots {
            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy();
                if !file_name.to_lowercase().contains(&needle) {
                    continue;
                }
                if !glob_set.is_match(file_name.as_ref()) {
                    continue;
                }

                let metadata = entry.metadata().ok();
                let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
                let modified = metadata
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);

                matches.push(json!({
                    "path": entry.path().to_string_lossy(),
                    "size": size,
                    "modified": modified,
                }));
                if matches.len() >= limit {
                    break 'roots;
                }
            }
        }

        Ok(json!({"matches": matches, "limit": limit, "query": query}))
    }
}
