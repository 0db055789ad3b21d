use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::components::Components;
use super::operation::PathItem;
use super::security::{SecurityRequirement, SecurityScheme};
use super::server::Server;

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,
}

/// Top-level OpenAPI 3.x specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSpec {
    #[serde(default)]
    pub openapi: String,

    /// Present on Swagger 2.0 documents, which are rejected after parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

impl OpenApiSpec {
    pub fn security_schemes(&self) -> Option<&IndexMap<String, SecurityScheme>> {
        self.components.as_ref().map(|c| &c.security_schemes)
    }

    /// Declared paths in lexicographic order, independent of document order.
    pub fn sorted_paths(&self) -> Vec<(&str, &PathItem)> {
        let mut paths: Vec<(&str, &PathItem)> = self
            .paths
            .iter()
            .map(|(path, item)| (path.as_str(), item))
            .collect();
        paths.sort_by(|a, b| a.0.cmp(b.0));
        paths
    }
}
