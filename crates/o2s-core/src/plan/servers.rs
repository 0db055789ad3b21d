use url::Url;

use crate::config::ServerConfig;
use crate::error::PlanError;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::server::Server;
use crate::parse::spec::OpenApiSpec;

/// The server list that applies to an operation: its own servers, else the
/// path item's, else the document's.
pub fn server_candidates<'a>(
    spec: &'a OpenApiSpec,
    item: &'a PathItem,
    op: &'a Operation,
) -> &'a [Server] {
    if !op.servers.is_empty() {
        &op.servers
    } else if !item.servers.is_empty() {
        &item.servers
    } else {
        &spec.servers
    }
}

/// Pick a server from `candidates` and turn it into an absolute base URL.
///
/// `context` names the operation in errors.
pub fn resolve_base_url(
    candidates: &[Server],
    config: &ServerConfig,
    context: &str,
) -> Result<Url, PlanError> {
    let server = select_server(candidates, config, context)?;
    let raw = substitute_variables(server, config)?;
    Url::parse(&raw).map_err(|source| PlanError::InvalidServerUrl { url: raw, source })
}

fn select_server<'a>(
    candidates: &'a [Server],
    config: &ServerConfig,
    context: &str,
) -> Result<&'a Server, PlanError> {
    match candidates {
        [] => Err(PlanError::NoServers(context.to_string())),
        [only] => Ok(only),
        _ => {
            if let Some(ref wanted) = config.description {
                if let Some(server) = candidates
                    .iter()
                    .find(|s| s.description.as_deref() == Some(wanted.as_str()))
                {
                    return Ok(server);
                }
            }
            if config.use_first {
                return Ok(&candidates[0]);
            }
            Err(PlanError::AmbiguousServer)
        }
    }
}

/// Replace every declared `{variable}` in the server URL. A configured
/// override wins over the declared default; both empty is an error.
pub fn substitute_variables(server: &Server, config: &ServerConfig) -> Result<String, PlanError> {
    let mut url = server.url.clone();
    for (name, variable) in &server.variables {
        let value = config
            .variables
            .get(name)
            .filter(|v| !v.is_empty())
            .unwrap_or(&variable.default);
        if value.is_empty() {
            return Err(PlanError::MissingServerVariable(name.clone()));
        }
        url = url.replace(&format!("{{{name}}}"), value);
    }
    Ok(url)
}

/// Append `path` to the base URL's path, keeping any base path prefix.
pub fn join_path(base: &Url, path: &str) -> Url {
    let mut joined = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');
    joined.set_path(&format!("{prefix}/{suffix}"));
    joined
}
