//! Tool table advertised through `tools/list`.
//!
//! - `download_artifact`: resolve a coordinate, decompiling if only a binary exists
//! - `decompile_jar`: decompile a local JAR
//! - `search_versions`: versions from `maven-metadata.xml`
//! - `search_artifacts`: Maven Central full-text search
//! - `check_artifact_exists`: per-repository availability of the binary JAR
//! - `get_download_stats`: file counts and total size of a download directory
//! - `list_repositories` / `add_repository` / `remove_repository` / `reset_repositories`

use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }
}

fn repo_names_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Configured repository names to use, in priority order"
    })
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "download_artifact",
            description: "Download an artifact's sources JAR from Maven repositories, falling back to the binary JAR plus CFR decompilation",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "artifact": {
                        "type": "string",
                        "description": "Coordinate as group:artifact:version or group.artifact:version"
                    },
                    "repo_names": repo_names_schema(),
                    "repositories": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Ad-hoc repository URLs (cannot be combined with repo_names)"
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Output directory (default: configured directory or ./downloads)"
                    },
                    "include_sources": {
                        "type": "boolean",
                        "default": true,
                        "description": "Try the sources JAR before the binary"
                    },
                    "include_javadoc": {
                        "type": "boolean",
                        "default": false,
                        "description": "Also fetch the javadoc JAR if available"
                    },
                    "force_binary": {
                        "type": "boolean",
                        "default": false,
                        "description": "Skip sources and decompile the binary JAR"
                    }
                },
                "required": ["artifact"]
            }),
        },
        ToolDefinition {
            name: "decompile_jar",
            description: "Decompile a local JAR file into Java sources with CFR",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "jar_path": { "type": "string", "description": "Path to the JAR file" },
                    "output_dir": {
                        "type": "string",
                        "description": "Output directory (default: <jar name>-decompiled next to the JAR)"
                    }
                },
                "required": ["jar_path"]
            }),
        },
        ToolDefinition {
            name: "search_versions",
            description: "List available versions of an artifact, newest first",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "group_id": { "type": "string" },
                    "artifact_id": { "type": "string" },
                    "repo_names": repo_names_schema()
                },
                "required": ["group_id", "artifact_id"]
            }),
        },
        ToolDefinition {
            name: "search_artifacts",
            description: "Search Maven Central by keyword",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "max_results": { "type": "integer", "minimum": 1, "default": 10 }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "check_artifact_exists",
            description: "Check which repositories host an artifact's binary JAR",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "artifact": { "type": "string" },
                    "repo_names": repo_names_schema()
                },
                "required": ["artifact"]
            }),
        },
        ToolDefinition {
            name: "get_download_stats",
            description: "Count downloaded JARs, sources, javadoc and POM files in a directory",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "download_dir": { "type": "string", "default": "./downloads" }
                }
            }),
        },
        ToolDefinition {
            name: "list_repositories",
            description: "List configured repositories in priority order",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDefinition {
            name: "add_repository",
            description: "Add a repository, or replace the URL of an existing one",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "url": { "type": "string" }
                },
                "required": ["name", "url"]
            }),
        },
        ToolDefinition {
            name: "remove_repository",
            description: "Remove a configured repository",
            input_schema: json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: "reset_repositories",
            description: "Restore the default repository list",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_are_unique() {
        let defs = tool_definitions();
        let mut names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn error_result_serializes_is_error_flag() {
        let json = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "boom");

        let ok = serde_json::to_value(ToolResult::text("fine")).unwrap();
        assert!(ok.get("isError").is_none());
    }
}
