use serde::Serialize;
use serde_json::Value;

use super::synthesize::SchemaSynthesizer;
use crate::config::OperationConfig;
use crate::error::PlanError;
use crate::parse::media_type::MediaType;
use crate::parse::operation::HttpMethod;
use crate::parse::request_body::RequestBody;

/// Body sent when a non-required request body has nothing configured: an
/// empty JSON string.
pub const EMPTY_PAYLOAD: &str = "\"\"";

/// One serialized payload variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// Empty for the placeholder payload.
    pub media_type: String,
    pub body: String,
}

/// Resolve a request body into payload variants, media type by media type in
/// document order.
///
/// A configured payload is used verbatim. Otherwise, for required bodies, the
/// media type's example and every one of its examples become variants; when
/// there are none, a value is synthesized from the schema. A media type with
/// no source is skipped, and a required body fails only when none of its
/// media types produced anything.
pub fn resolve_payloads(
    method: HttpMethod,
    raw_path: &str,
    body: &RequestBody,
    config: &OperationConfig,
    synthesizer: &mut SchemaSynthesizer<'_>,
) -> Result<Vec<Payload>, PlanError> {
    let mut payloads = Vec::new();
    let mut unsourced: Option<&String> = None;

    for (media_type, details) in &body.content {
        if let Some(configured) = config.payloads.get(media_type) {
            payloads.push(Payload {
                media_type: media_type.clone(),
                body: configured.clone(),
            });
            continue;
        }

        if !body.required {
            continue;
        }

        let variants = derive_payloads(media_type, details, synthesizer)?;
        if variants.is_empty() {
            log::warn!("no payload for {media_type} in {method} {raw_path}; skipping it");
            unsourced.get_or_insert(media_type);
            continue;
        }
        payloads.extend(variants.into_iter().map(|body| Payload {
            media_type: media_type.clone(),
            body,
        }));
    }

    if payloads.is_empty() {
        if let Some(media_type) = unsourced {
            return Err(PlanError::MissingPayloadConfig {
                method,
                path: raw_path.to_string(),
                media_type: media_type.clone(),
            });
        }
        payloads.push(Payload {
            media_type: String::new(),
            body: EMPTY_PAYLOAD.to_string(),
        });
    }

    Ok(payloads)
}

fn derive_payloads(
    media_type: &str,
    details: &MediaType,
    synthesizer: &mut SchemaSynthesizer<'_>,
) -> Result<Vec<String>, PlanError> {
    let mut variants = Vec::new();

    if let Some(ref example) = details.example {
        variants.push(encode_payload(media_type, example)?);
    }
    for example in details.examples.values() {
        if let Some(value) = example.value() {
            variants.push(encode_payload(media_type, value)?);
        }
    }

    if variants.is_empty() {
        if let Some(ref schema) = details.schema {
            let fake = synthesizer.synthesize_ref(schema)?;
            variants.push(encode_payload(media_type, &fake)?);
        }
    }

    Ok(variants)
}

/// Serialize a value for the given media type. Only JSON media types are
/// supported; strings that already look like encoded JSON pass through.
pub fn encode_payload(media_type: &str, value: &Value) -> Result<String, PlanError> {
    if !is_json_media_type(media_type) {
        return Err(PlanError::UnsupportedMediaType(media_type.to_string()));
    }
    if let Value::String(raw) = value {
        if raw.contains('{') || raw.contains('[') {
            return Ok(raw.clone());
        }
    }
    serde_json::to_string(value).map_err(|source| PlanError::PayloadEncoding {
        media_type: media_type.to_string(),
        source,
    })
}

/// `application/json` or a `+json` structured-syntax type, ignoring parameters.
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.contains('/') && essence.ends_with("+json"))
}
