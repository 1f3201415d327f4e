use crate::dto_scanner::{field_needs_schema, DtoCache};
use crate::type_resolver::{SchemaDescriptor, TypeResolver};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Prefix of every component reference.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Free-form object marker for map types
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Default value, rendered from a parameter's declared default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Schema {
    /// A plain typed schema.
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    /// A `$ref` to a named component.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{COMPONENTS_PREFIX}{name}")),
            ..Self::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Renders a structural descriptor as an OpenAPI schema.
    pub fn from_descriptor(descriptor: &SchemaDescriptor) -> Self {
        match descriptor {
            SchemaDescriptor::Primitive { kind, format } => Schema::typed(kind.as_str(), *format),
            SchemaDescriptor::Map => Self {
                schema_type: Some("object".to_string()),
                additional_properties: Some(true),
                ..Self::default()
            },
            SchemaDescriptor::Array(inner) => Schema::array(Schema::from_descriptor(inner)),
            SchemaDescriptor::Reference(name) => Schema::reference(name),
        }
    }
}

/// Schema generator - turns resolved types into schemas and collects the component
/// schemas they reference.
///
/// Each extraction worker owns one generator; components are keyed by DTO name and the
/// first generated definition wins.
pub struct SchemaGenerator {
    /// DTO cache used to infer component fields
    dtos: Arc<DtoCache>,
    /// Cache of generated component schemas to avoid duplication
    schemas: IndexMap<String, Schema>,
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator over a shared DTO cache
    pub fn new(dtos: Arc<DtoCache>) -> Self {
        debug!("Initializing SchemaGenerator");
        Self {
            dtos,
            schemas: IndexMap::new(),
        }
    }

    /// Generate a schema for a descriptor, registering any component it references
    pub fn generate_schema(&mut self, descriptor: &SchemaDescriptor) -> Schema {
        if let Some(name) = descriptor.referenced_name() {
            self.generate_component(name);
        }
        Schema::from_descriptor(descriptor)
    }

    /// Generate a schema for a Java type string
    pub fn schema_for_type(&mut self, type_name: &str) -> Schema {
        let descriptor = TypeResolver::resolve(type_name);
        self.generate_schema(&descriptor)
    }

    /// Generate the object schema for a DTO and, recursively, the DTOs its fields use
    pub fn generate_component(&mut self, name: &str) {
        if name == "Void" || self.schemas.contains_key(name) {
            return;
        }

        debug!("Generating component schema for: {}", name);
        let schema = self.dtos.to_object_schema(name);
        self.schemas.insert(name.to_string(), schema);

        let nested: Vec<String> = self
            .dtos
            .infer_fields(name)
            .iter()
            .filter(|field| field_needs_schema(field))
            .filter_map(|field| {
                TypeResolver::resolve(&field.type_name)
                    .referenced_name()
                    .map(str::to_string)
            })
            .collect();

        for dependency in nested {
            self.generate_component(&dependency);
        }
    }

    /// Consume the generator, yielding the collected component schemas
    pub fn into_schemas(self) -> IndexMap<String, Schema> {
        self.schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto_scanner::{DtoDescriptor, DtoField};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cache(dtos: &[(&str, &[(&str, &str)])]) -> Arc<DtoCache> {
        let mut cache = DtoCache::new();
        for (name, fields) in dtos {
            cache.insert(DtoDescriptor {
                name: name.to_string(),
                path: None,
                fields: fields.iter().map(|(n, t)| DtoField::new(n, t)).collect(),
            });
        }
        Arc::new(cache)
    }

    #[test]
    fn test_primitive_schema() {
        let mut generator = SchemaGenerator::new(cache(&[]));
        let schema = generator.schema_for_type("Long");

        assert_eq!(schema, Schema::typed("integer", Some("int64")));
        assert!(generator.into_schemas().is_empty());
    }

    #[test]
    fn test_map_schema_serialization() {
        let schema = Schema::from_descriptor(&SchemaDescriptor::Map);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "object", "additionalProperties": true })
        );
    }

    #[test]
    fn test_array_of_reference() {
        let mut generator = SchemaGenerator::new(cache(&[("UserDto", &[("id", "Long")])]));
        let schema = generator.schema_for_type("List<UserDto>");

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/UserDto" } })
        );
        assert!(generator.into_schemas().contains_key("UserDto"));
    }

    #[test]
    fn test_nested_components_are_collected() {
        let mut generator = SchemaGenerator::new(cache(&[
            ("OrderDto", &[("id", "Long"), ("lines", "List<OrderLineDto>")]),
            ("OrderLineDto", &[("sku", "String"), ("order", "OrderDto")]),
        ]));

        generator.schema_for_type("ResponseEntity<OrderDto>");

        let schemas = generator.into_schemas();
        let names: Vec<&String> = schemas.keys().collect();
        assert_eq!(names, vec!["OrderDto", "OrderLineDto"]);

        let order = &schemas["OrderDto"];
        let lines = &order.properties.as_ref().unwrap()["lines"];
        assert_eq!(
            lines.items.as_ref().unwrap().reference.as_deref(),
            Some("#/components/schemas/OrderLineDto")
        );
    }

    #[test]
    fn test_deeply_nested_field_types_are_collected() {
        let mut generator = SchemaGenerator::new(cache(&[
            (
                "GridDto",
                &[
                    ("cells", "List<List<CellDto>>"),
                    ("lookup", "Map<String, LegendDto>"),
                ],
            ),
            ("CellDto", &[("value", "Integer")]),
        ]));

        generator.schema_for_type("GridDto");

        let schemas = generator.into_schemas();
        let names: Vec<&String> = schemas.keys().collect();
        assert_eq!(names, vec!["GridDto", "CellDto"]);
    }

    #[test]
    fn test_unknown_dto_uses_template() {
        let mut generator = SchemaGenerator::new(cache(&[]));
        generator.schema_for_type("ProductDto");

        let schemas = generator.into_schemas();
        let product = &schemas["ProductDto"];
        let fields: Vec<&String> = product.properties.as_ref().unwrap().keys().collect();
        assert_eq!(fields, vec!["id", "name", "description", "price"]);
    }

    #[test]
    fn test_void_is_not_a_component() {
        let mut generator = SchemaGenerator::new(cache(&[]));
        generator.schema_for_type("ResponseEntity<Void>");
        assert!(generator.into_schemas().is_empty());
    }
}
