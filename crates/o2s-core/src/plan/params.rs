use serde_json::Value;

use crate::config::OperationConfig;
use crate::error::PlanError;
use crate::parse::operation::{HttpMethod, Operation, PathItem};
use crate::parse::parameter::{Parameter, ParameterLocation, ParameterOrRef};

/// Parameters applied to one operation's URL and cookies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameters {
    /// The path with every `{name}` placeholder substituted.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
}

/// Path-item parameters followed by the operation's own, where an operation
/// parameter replaces a path-item one with the same name and location.
pub fn effective_parameters<'a>(item: &'a PathItem, op: &'a Operation) -> Vec<&'a Parameter> {
    let own: Vec<&Parameter> = inline_parameters(&op.parameters).collect();
    let mut params: Vec<&Parameter> = inline_parameters(&item.parameters)
        .filter(|shared| {
            !own.iter()
                .any(|p| p.name == shared.name && p.location == shared.location)
        })
        .collect();
    params.extend(own);
    params
}

fn inline_parameters(params: &[ParameterOrRef]) -> impl Iterator<Item = &Parameter> {
    params.iter().filter_map(|p| match p {
        ParameterOrRef::Parameter(param) => Some(param),
        ParameterOrRef::Ref { .. } => None, // Should already be resolved
    })
}

/// Resolve each declared parameter to a string and apply it to the path,
/// query string or cookie list.
///
/// A configured value always wins. Unconfigured required parameters fall back
/// to the declared example, the first of the declared examples, or an empty
/// string when empty values are allowed; unconfigured optional parameters are
/// left out. A path placeholder left without a value is an error.
pub fn resolve_parameters(
    method: HttpMethod,
    raw_path: &str,
    params: &[&Parameter],
    config: &OperationConfig,
) -> Result<ResolvedParameters, PlanError> {
    let mut resolved = ResolvedParameters {
        path: raw_path.to_string(),
        ..Default::default()
    };
    let mut substituted: Vec<&str> = Vec::new();

    for param in params {
        let value = match config.params.get(&param.name) {
            Some(configured) => configured.to_string(),
            None if param.required => fallback_value(param).ok_or_else(|| {
                PlanError::MissingParameterConfig {
                    method,
                    path: raw_path.to_string(),
                    name: param.name.clone(),
                }
            })?,
            None => continue,
        };

        match param.location {
            ParameterLocation::Path => {
                resolved.path = resolved
                    .path
                    .replace(&format!("{{{}}}", param.name), &value);
                substituted.push(&param.name);
            }
            ParameterLocation::Query => resolved.query.push((param.name.clone(), value)),
            ParameterLocation::Header => {
                log::warn!(
                    "per-request headers are unsupported by Siege; your tests may not work as expected. \
                     Skipping header `{}` for {} {}",
                    param.name,
                    method,
                    raw_path
                );
            }
            ParameterLocation::Cookie => resolved.cookies.push((param.name.clone(), value)),
        }
    }

    if let Some(name) = placeholders(raw_path).find(|name| !substituted.contains(name)) {
        return Err(PlanError::MissingParameterConfig {
            method,
            path: raw_path.to_string(),
            name: name.to_string(),
        });
    }

    Ok(resolved)
}

/// Names of the `{name}` placeholders in a path template, in order.
fn placeholders(path: &str) -> impl Iterator<Item = &str> {
    path.split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}').map(|(name, _)| name))
}

fn fallback_value(param: &Parameter) -> Option<String> {
    if let Some(ref example) = param.example {
        return Some(value_to_string(example));
    }
    if let Some(value) = param.examples.values().next().and_then(|e| e.value()) {
        return Some(value_to_string(value));
    }
    if param.allow_empty_value {
        return Some(String::new());
    }
    None
}

/// Render an example value the way it would appear in a URL or cookie.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;
    use serde_json::json;

    fn param(yaml: &str) -> Parameter {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn config(values: &[(&str, &str)]) -> OperationConfig {
        OperationConfig {
            params: values
                .iter()
                .map(|(k, v)| (k.to_string(), ParamValue::from(*v)))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_configured_path_param() {
        let id = param("name: id\nin: path\nrequired: true");
        let resolved =
            resolve_parameters(HttpMethod::Get, "/users/{id}", &[&id], &config(&[("id", "42")]))
                .unwrap();
        assert_eq!(resolved.path, "/users/42");
        assert!(resolved.query.is_empty());
        assert!(resolved.cookies.is_empty());
    }

    #[test]
    fn test_required_falls_back_to_example_then_examples() {
        let with_example = param("name: q\nin: query\nrequired: true\nexample: 7");
        let with_examples = param(
            "name: sort\nin: query\nrequired: true\nexamples:\n  first: { value: asc }\n  second: { value: desc }",
        );
        let resolved = resolve_parameters(
            HttpMethod::Get,
            "/items",
            &[&with_example, &with_examples],
            &config(&[]),
        )
        .unwrap();
        assert_eq!(
            resolved.query,
            vec![
                ("q".to_string(), "7".to_string()),
                ("sort".to_string(), "asc".to_string())
            ]
        );
    }

    #[test]
    fn test_allow_empty_value() {
        let flag = param("name: flag\nin: query\nrequired: true\nallowEmptyValue: true");
        let resolved =
            resolve_parameters(HttpMethod::Get, "/items", &[&flag], &config(&[])).unwrap();
        assert_eq!(resolved.query, vec![("flag".to_string(), String::new())]);
    }

    #[test]
    fn test_missing_required_param() {
        let id = param("name: id\nin: path\nrequired: true");
        let err = resolve_parameters(HttpMethod::Delete, "/users/{id}", &[&id], &config(&[]))
            .unwrap_err();
        match err {
            PlanError::MissingParameterConfig { method, path, name } => {
                assert_eq!(method, HttpMethod::Delete);
                assert_eq!(path, "/users/{id}");
                assert_eq!(name, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsubstituted_placeholder() {
        let optional = param("name: id\nin: path");
        let err = resolve_parameters(HttpMethod::Get, "/users/{id}", &[&optional], &config(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::MissingParameterConfig { ref name, .. } if name == "id"
        ));

        let err = resolve_parameters(
            HttpMethod::Get,
            "/users/{id}/posts/{postId}",
            &[&optional],
            &config(&[("id", "42")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PlanError::MissingParameterConfig { ref name, .. } if name == "postId"
        ));

        let resolved =
            resolve_parameters(HttpMethod::Get, "/users/{id}", &[&optional], &config(&[("id", "7")]))
                .unwrap();
        assert_eq!(resolved.path, "/users/7");
    }

    #[test]
    fn test_placeholders() {
        let names: Vec<&str> = placeholders("/users/{id}/posts/{postId}").collect();
        assert_eq!(names, vec!["id", "postId"]);
        assert_eq!(placeholders("/users/42").count(), 0);
        assert_eq!(placeholders("/a/{b").count(), 0);
    }

    #[test]
    fn test_optional_unconfigured_is_skipped() {
        let limit = param("name: limit\nin: query\nexample: 10");
        let resolved =
            resolve_parameters(HttpMethod::Get, "/items", &[&limit], &config(&[])).unwrap();
        assert!(resolved.query.is_empty());

        let resolved = resolve_parameters(
            HttpMethod::Get,
            "/items",
            &[&limit],
            &config(&[("limit", "5")]),
        )
        .unwrap();
        assert_eq!(resolved.query, vec![("limit".to_string(), "5".to_string())]);
    }

    #[test]
    fn test_header_and_cookie_params() {
        let trace = param("name: X-Trace\nin: header\nrequired: true");
        let session = param("name: session\nin: cookie\nrequired: true");
        let resolved = resolve_parameters(
            HttpMethod::Get,
            "/me",
            &[&trace, &session],
            &config(&[("X-Trace", "t"), ("session", "s1")]),
        )
        .unwrap();
        assert_eq!(resolved.path, "/me");
        assert!(resolved.query.is_empty());
        assert_eq!(resolved.cookies, vec![("session".to_string(), "s1".to_string())]);
    }

    #[test]
    fn test_operation_params_override_path_params() {
        let item: PathItem = serde_yaml_ng::from_str(
            r#"
parameters:
  - { name: id, in: path, required: true, example: shared }
  - { name: trace, in: query }
get:
  parameters:
    - { name: id, in: path, required: true, example: own }
"#,
        )
        .unwrap();
        let op = item.get.as_ref().unwrap();
        let params = effective_parameters(&item, op);
        let names: Vec<(&str, Option<&Value>)> = params
            .iter()
            .map(|p| (p.name.as_str(), p.example.as_ref()))
            .collect();
        assert_eq!(
            names,
            vec![("trace", None), ("id", Some(&json!("own")))]
        );
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("abc")), "abc");
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!([1, 2])), "[1,2]");
    }
}
