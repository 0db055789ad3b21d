use std::collections::HashSet;

use indexmap::IndexMap;

use super::components::Components;
use super::example::{Example, ExampleOrRef};
use super::media_type::MediaType;
use super::operation::{Operation, PathItem};
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::schema::{Items, Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Resolves the `$ref` pointers the planner follows: parameters, request
/// bodies, examples and every schema reachable from them.
///
/// Circular schema references are left in place as `SchemaOrRef::Ref`; the
/// synthesizer looks them up lazily and reports a cycle only if it actually
/// has to walk one.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    visited: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
            visited: HashSet::new(),
        }
    }

    /// Resolve all paths of the spec, returning a copy with inline parameters,
    /// request bodies and examples.
    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> Result<OpenApiSpec, ResolveError> {
        let mut resolved = spec.clone();

        for (_path, item) in &mut resolved.paths {
            self.resolve_path_item(item)?;
        }

        Ok(resolved)
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) -> Result<(), ResolveError> {
        item.parameters = self.resolve_parameters(&item.parameters)?;
        for op in item.operations_mut() {
            self.resolve_operation(op)?;
        }
        Ok(())
    }

    fn resolve_operation(&mut self, op: &mut Operation) -> Result<(), ResolveError> {
        op.parameters = self.resolve_parameters(&op.parameters)?;

        if let Some(ref body) = op.request_body {
            let resolved = self.resolve_request_body_or_ref(body)?;
            op.request_body = Some(resolved);
        }

        Ok(())
    }

    fn resolve_parameters(
        &mut self,
        params: &[ParameterOrRef],
    ) -> Result<Vec<ParameterOrRef>, ResolveError> {
        params
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p))
            .collect()
    }

    pub fn resolve_schema_or_ref(
        &mut self,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<SchemaOrRef, ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                if self.visited.contains(ref_path) {
                    // Circular reference: leave it for the synthesizer to look up lazily.
                    return Ok(schema_or_ref.clone());
                }
                self.visited.insert(ref_path.clone());
                let resolved = lookup_schema(self.components, ref_path)?;
                let result =
                    self.resolve_schema_or_ref(&SchemaOrRef::Schema(Box::new(resolved)));
                self.visited.remove(ref_path);
                result
            }
            SchemaOrRef::Schema(schema) => {
                let resolved = self.resolve_schema(schema)?;
                Ok(SchemaOrRef::Schema(Box::new(resolved)))
            }
        }
    }

    fn resolve_schema(&mut self, schema: &Schema) -> Result<Schema, ResolveError> {
        let mut resolved = schema.clone();

        let mut resolved_props = IndexMap::new();
        for (name, prop) in &schema.properties {
            resolved_props.insert(name.clone(), self.resolve_schema_or_ref(prop)?);
        }
        resolved.properties = resolved_props;

        if let Some(Items::Schema(ref items)) = schema.items {
            resolved.items = Some(Items::Schema(Box::new(
                self.resolve_schema_or_ref(items)?,
            )));
        }

        resolved.all_of = self.resolve_schema_list(&schema.all_of)?;
        resolved.one_of = self.resolve_schema_list(&schema.one_of)?;
        resolved.any_of = self.resolve_schema_list(&schema.any_of)?;

        Ok(resolved)
    }

    fn resolve_schema_list(
        &mut self,
        schemas: &[SchemaOrRef],
    ) -> Result<Vec<SchemaOrRef>, ResolveError> {
        schemas
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect()
    }

    fn resolve_parameter_or_ref(
        &mut self,
        param: &ParameterOrRef,
    ) -> Result<ParameterOrRef, ResolveError> {
        let mut resolved = match param {
            ParameterOrRef::Ref { ref_path } => self.lookup_parameter(ref_path)?,
            ParameterOrRef::Parameter(p) => p.clone(),
        };
        if let Some(ref s) = resolved.schema {
            resolved.schema = Some(self.resolve_schema_or_ref(s)?);
        }
        resolved.examples = self.resolve_examples(&resolved.examples)?;
        Ok(ParameterOrRef::Parameter(resolved))
    }

    fn resolve_request_body_or_ref(
        &mut self,
        body: &RequestBodyOrRef,
    ) -> Result<RequestBodyOrRef, ResolveError> {
        let mut resolved = match body {
            RequestBodyOrRef::Ref { ref_path } => self.lookup_request_body(ref_path)?,
            RequestBodyOrRef::RequestBody(rb) => rb.clone(),
        };
        self.resolve_media_types(&mut resolved.content)?;
        Ok(RequestBodyOrRef::RequestBody(resolved))
    }

    fn resolve_media_types(
        &mut self,
        content: &mut IndexMap<String, MediaType>,
    ) -> Result<(), ResolveError> {
        for media_type in content.values_mut() {
            if let Some(ref s) = media_type.schema {
                media_type.schema = Some(self.resolve_schema_or_ref(s)?);
            }
            media_type.examples = self.resolve_examples(&media_type.examples)?;
        }
        Ok(())
    }

    fn resolve_examples(
        &self,
        examples: &IndexMap<String, ExampleOrRef>,
    ) -> Result<IndexMap<String, ExampleOrRef>, ResolveError> {
        examples
            .iter()
            .map(|(name, example)| {
                let resolved = match example {
                    ExampleOrRef::Ref { ref_path } => {
                        ExampleOrRef::Example(self.lookup_example(ref_path)?)
                    }
                    inline => inline.clone(),
                };
                Ok((name.clone(), resolved))
            })
            .collect()
    }

    // Lookup helpers

    fn lookup_parameter(&self, ref_path: &str) -> Result<Parameter, ResolveError> {
        let name = parse_ref_name(ref_path, "parameters")?;
        self.components
            .and_then(|c| c.parameters.get(name))
            .and_then(|p| match p {
                ParameterOrRef::Parameter(param) => Some(param.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_request_body(&self, ref_path: &str) -> Result<RequestBody, ResolveError> {
        let name = parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(name))
            .and_then(|rb| match rb {
                RequestBodyOrRef::RequestBody(body) => Some(body.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_example(&self, ref_path: &str) -> Result<Example, ResolveError> {
        let name = parse_ref_name(ref_path, "examples")?;
        self.components
            .and_then(|c| c.examples.get(name))
            .and_then(|e| match e {
                ExampleOrRef::Example(example) => Some(example.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }
}

/// Look up `#/components/schemas/{name}`, following aliases (`A: {$ref: B}`)
/// until a concrete schema is reached. An alias cycle has no target.
pub fn lookup_schema(
    components: Option<&Components>,
    ref_path: &str,
) -> Result<Schema, ResolveError> {
    let not_found = || ResolveError::RefTargetNotFound(ref_path.to_string());
    let mut seen = HashSet::new();
    let mut current = ref_path;

    loop {
        if !seen.insert(current) {
            return Err(not_found());
        }
        let name = parse_ref_name(current, "schemas")?;
        match components.and_then(|c| c.schemas.get(name)) {
            Some(SchemaOrRef::Schema(schema)) => return Ok(schema.as_ref().clone()),
            Some(SchemaOrRef::Ref { ref_path: next }) => current = next,
            None => return Err(not_found()),
        }
    }
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
fn parse_ref_name<'a>(ref_path: &'a str, expected_section: &str) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}
