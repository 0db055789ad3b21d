//! Fake value synthesis from a schema.
//!
//! A value is taken from the schema's own `default`, `example` or first
//! `examples` entry when present; otherwise composition keywords are followed
//! (`oneOf` / `anyOf` first member, `allOf` merged) and finally the type tag
//! decides: objects get every property, arrays a single item, strings `"test"`,
//! numbers zero and booleans `true`.

use serde_json::{Map, Value};

use crate::error::SynthesisError;
use crate::parse::components::Components;
use crate::parse::ref_resolve::lookup_schema;
use crate::parse::schema::{Composition, Items, Schema, SchemaOrRef, SchemaType};

/// How often an untyped schema is rebuilt from its reference before giving up.
pub const MAX_SYNTHESIS_ATTEMPTS: usize = 5;

/// Result of one synthesis attempt on a concrete schema.
#[derive(Debug)]
pub enum Synthesis {
    Synthesized(Value),
    /// Nothing to go on: no type, properties or items. The caller may rebuild
    /// the schema from its reference and try again.
    Retryable,
    Fatal(SynthesisError),
}

macro_rules! fatal {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return Synthesis::Fatal(err),
        }
    };
}

/// Produces one structurally valid value per schema.
pub struct SchemaSynthesizer<'a> {
    components: Option<&'a Components>,
    /// `$ref` paths currently being expanded, for cycle detection.
    expanding: Vec<String>,
}

impl<'a> SchemaSynthesizer<'a> {
    pub fn new(components: Option<&'a Components>) -> Self {
        Self {
            components,
            expanding: Vec::new(),
        }
    }

    /// Synthesize from a schema reference, rebuilding and retrying up to
    /// [`MAX_SYNTHESIS_ATTEMPTS`] times while the outcome is retryable.
    pub fn synthesize_ref(&mut self, proxy: &SchemaOrRef) -> Result<Value, SynthesisError> {
        let ref_path = match proxy {
            SchemaOrRef::Ref { ref_path } => {
                if self.expanding.contains(ref_path) {
                    return Err(SynthesisError::CircularSchema(ref_path.clone()));
                }
                Some(ref_path.as_str())
            }
            SchemaOrRef::Schema(_) => None,
        };

        if let Some(path) = ref_path {
            self.expanding.push(path.to_string());
        }
        let result = self.synthesize_with_retry(proxy);
        if ref_path.is_some() {
            self.expanding.pop();
        }
        result
    }

    fn synthesize_with_retry(&mut self, proxy: &SchemaOrRef) -> Result<Value, SynthesisError> {
        for attempt in 1..=MAX_SYNTHESIS_ATTEMPTS {
            let schema = self.build(proxy)?;
            match self.synthesize(&schema) {
                Synthesis::Synthesized(value) => return Ok(value),
                Synthesis::Retryable => {
                    log::debug!("synthesis attempt {attempt} found no usable type; rebuilding");
                }
                Synthesis::Fatal(err) => return Err(err),
            }
        }
        Err(SynthesisError::SynthesisExhausted {
            attempts: MAX_SYNTHESIS_ATTEMPTS,
        })
    }

    fn build(&self, proxy: &SchemaOrRef) -> Result<Schema, SynthesisError> {
        match proxy {
            SchemaOrRef::Schema(schema) => Ok(schema.as_ref().clone()),
            SchemaOrRef::Ref { ref_path } => Ok(lookup_schema(self.components, ref_path)?),
        }
    }

    /// One attempt on a concrete schema.
    pub fn synthesize(&mut self, schema: &Schema) -> Synthesis {
        if let Some(ref value) = schema.default_value {
            return Synthesis::Synthesized(value.clone());
        }
        if let Some(ref value) = schema.example {
            return Synthesis::Synthesized(value.clone());
        }
        if let Some(value) = schema.examples.first() {
            return Synthesis::Synthesized(value.clone());
        }

        match schema.composition() {
            Composition::OneOf(members) | Composition::AnyOf(members) => {
                return Synthesis::Synthesized(fatal!(self.synthesize_ref(&members[0])));
            }
            Composition::AllOf(members) => {
                let merged = fatal!(self.merge_all_of(members));
                if !merged.is_empty() {
                    return Synthesis::Synthesized(Value::Object(merged));
                }
            }
            Composition::Plain => {}
        }

        match schema.primary_type() {
            Some(SchemaType::Object) => self.object(schema),
            Some(SchemaType::Array) => self.array(schema),
            Some(SchemaType::Null) => Synthesis::Synthesized(Value::Null),
            Some(SchemaType::Boolean) => Synthesis::Synthesized(Value::Bool(true)),
            Some(SchemaType::Number) => Synthesis::Synthesized(Value::from(0.0_f64)),
            Some(SchemaType::Integer) => Synthesis::Synthesized(zero_integer(schema)),
            Some(SchemaType::String) => Synthesis::Synthesized(Value::from("test")),
            Some(SchemaType::Other(tag)) => {
                Synthesis::Fatal(SynthesisError::UnknownSchemaType(tag.clone()))
            }
            None if !schema.properties.is_empty() => self.object(schema),
            None if schema.items.is_some() => self.array(schema),
            None => Synthesis::Retryable,
        }
    }

    fn merge_all_of(&mut self, members: &[SchemaOrRef]) -> Result<Map<String, Value>, SynthesisError> {
        let mut merged = Map::new();
        for member in members {
            match self.synthesize_ref(member)? {
                Value::Object(partial) => merged.extend(partial),
                other => return Err(SynthesisError::NonObjectAllOfMember(other.to_string())),
            }
        }
        Ok(merged)
    }

    fn object(&mut self, schema: &Schema) -> Synthesis {
        let mut object = Map::new();
        for (name, property) in &schema.properties {
            let value = fatal!(self.synthesize_ref(property));
            object.insert(name.clone(), value);
        }
        Synthesis::Synthesized(Value::Object(object))
    }

    fn array(&mut self, schema: &Schema) -> Synthesis {
        match schema.items {
            Some(Items::Bool(true)) | None => Synthesis::Synthesized(Value::Array(Vec::new())),
            Some(Items::Bool(false)) => Synthesis::Fatal(SynthesisError::UnsynthesizableArray(
                schema.title.clone().unwrap_or_else(|| "array".to_string()),
            )),
            Some(Items::Schema(ref item)) => {
                let value = fatal!(self.synthesize_ref(item));
                Synthesis::Synthesized(Value::Array(vec![value]))
            }
        }
    }
}

fn zero_integer(schema: &Schema) -> Value {
    match schema.format.as_deref() {
        Some("int32") => Value::from(0_i32),
        _ => Value::from(0_i64),
    }
}
