use url::Url;

use super::params::{effective_parameters, resolve_parameters};
use super::payloads::{Payload, resolve_payloads};
use super::request::{RequestBatch, RequestCookie, ResolvedRequest};
use super::security::SecurityApplier;
use super::servers::{join_path, resolve_base_url, server_candidates};
use super::synthesize::SchemaSynthesizer;
use super::Plan;
use crate::config::{PathConfig, ProjectConfig};
use crate::error::{PlanError, ResolveError};
use crate::parse::operation::{HttpMethod, Operation, PathItem};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::request_body::RequestBodyOrRef;
use crate::parse::security::SecurityRequirement;
use crate::parse::spec::OpenApiSpec;
use crate::siege::config::SiegeConfig;

/// Resolution order of the methods within one path. TRACE is listed only so
/// that it can be reported; it is never resolved.
const METHOD_ORDER: [HttpMethod; 8] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Delete,
    HttpMethod::Patch,
    HttpMethod::Put,
    HttpMethod::Trace,
    HttpMethod::Head,
    HttpMethod::Options,
];

/// Turn a parsed document and its project configuration into a [`Plan`].
///
/// Paths are visited in lexicographic order. Any error aborts the whole pass.
pub fn plan(spec: &OpenApiSpec, config: &ProjectConfig) -> Result<Plan, PlanError> {
    let resolved = RefResolver::new(spec).resolve_spec(spec)?;
    let mut planner = Planner {
        spec: &resolved,
        config,
        synthesizer: SchemaSynthesizer::new(spec.components.as_ref()),
    };

    let mut requests = RequestBatch::new();
    let mut requirements: Vec<SecurityRequirement> =
        resolved.security.clone().unwrap_or_default();

    for (raw_path, item) in resolved.sorted_paths() {
        let path_config = config
            .paths
            .get(raw_path)
            .ok_or_else(|| PlanError::UnconfiguredPath {
                path: raw_path.to_string(),
            })?;

        for method in METHOD_ORDER {
            let Some(op) = item.operation(method) else {
                continue;
            };
            if op.is_deprecated() {
                log::debug!("skipping deprecated {method} {raw_path}");
                continue;
            }
            if method == HttpMethod::Trace {
                log::warn!(
                    "TRACE operations are unsupported by Siege; your tests will be incomplete. \
                     Skipping TRACE for {raw_path}"
                );
                continue;
            }

            let start = requests.len();
            for request in planner.resolve_operation(method, raw_path, item, op, path_config)? {
                requests.push(request);
            }
            log::debug!("{method} {raw_path}: {} request(s)", requests.len() - start);
            if let Some(ref own) = op.security {
                requirements.extend(own.iter().cloned());
            }
        }
    }

    let mut siege = SiegeConfig::default();
    apply_security(spec, config, &requirements, &mut requests, &mut siege)?;
    siege.gmethod = HttpMethod::Get.as_str().to_string();
    siege.apply_overrides(&config.siege);

    log::info!(
        "planned {} request(s) for {} path(s)",
        requests.len(),
        resolved.paths.len()
    );
    Ok(Plan { requests, siege })
}

/// Security is applied only once every request exists. Every requirement in
/// the document, global or declared on a resolved operation, reaches every
/// request in the batch.
fn apply_security(
    spec: &OpenApiSpec,
    config: &ProjectConfig,
    requirements: &[SecurityRequirement],
    requests: &mut RequestBatch,
    siege: &mut SiegeConfig,
) -> Result<(), PlanError> {
    let applier = SecurityApplier::new(spec.security_schemes(), &config.auth);
    let credentials = applier.apply(requirements, siege)?;
    if credentials.is_empty() {
        return Ok(());
    }
    for request in requests.as_mut_slice() {
        credentials.apply_to(request);
    }
    Ok(())
}

struct Planner<'a> {
    spec: &'a OpenApiSpec,
    config: &'a ProjectConfig,
    synthesizer: SchemaSynthesizer<'a>,
}

impl Planner<'_> {
    fn resolve_operation(
        &mut self,
        method: HttpMethod,
        raw_path: &str,
        item: &PathItem,
        op: &Operation,
        path_config: &PathConfig,
    ) -> Result<Vec<ResolvedRequest>, PlanError> {
        let op_config =
            path_config
                .method(method)
                .ok_or_else(|| PlanError::UnconfiguredOperation {
                    method,
                    path: raw_path.to_string(),
                })?;

        let context = format!("{method} {raw_path}");
        let base = resolve_base_url(
            server_candidates(self.spec, item, op),
            &self.config.server,
            &context,
        )?;

        let params = effective_parameters(item, op);
        let resolved = resolve_parameters(method, raw_path, &params, op_config)?;
        let url = build_url(&base, &resolved.path, &resolved.query);

        let cookie_path = {
            let mut scoped = url.clone();
            scoped.set_query(None);
            scoped.to_string()
        };
        let cookies: Vec<RequestCookie> = resolved
            .cookies
            .into_iter()
            .map(|(name, value)| RequestCookie {
                name,
                value,
                path: cookie_path.clone(),
            })
            .collect();

        if !method.has_body() {
            return Ok(vec![ResolvedRequest {
                method,
                url,
                payload: String::new(),
                media_type: String::new(),
                cookies,
            }]);
        }

        let payloads = match op.request_body {
            Some(RequestBodyOrRef::RequestBody(ref body)) => {
                resolve_payloads(method, raw_path, body, op_config, &mut self.synthesizer)?
            }
            Some(RequestBodyOrRef::Ref { ref ref_path }) => {
                return Err(ResolveError::RefTargetNotFound(ref_path.clone()).into());
            }
            None => vec![Payload {
                media_type: String::new(),
                body: String::new(),
            }],
        };

        Ok(payloads
            .into_iter()
            .map(|payload| ResolvedRequest {
                method,
                url: url.clone(),
                payload: payload.body,
                media_type: payload.media_type,
                cookies: cookies.clone(),
            })
            .collect())
    }
}

fn build_url(base: &Url, path: &str, query: &[(String, String)]) -> Url {
    let mut url = join_path(base, path);
    url.set_query(None);
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    url
}
