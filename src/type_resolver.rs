use log::debug;

/// Structural kind of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Object => "object",
        }
    }
}

/// Language-independent description of a Java type's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDescriptor {
    /// Scalar or opaque object with an optional format
    Primitive {
        kind: SchemaKind,
        format: Option<&'static str>,
    },
    /// Free-form object (`Map`-like types)
    Map,
    /// Array of the inner schema
    Array(Box<SchemaDescriptor>),
    /// Reference to a named component schema
    Reference(String),
}

impl SchemaDescriptor {
    pub fn primitive(kind: SchemaKind, format: Option<&'static str>) -> Self {
        SchemaDescriptor::Primitive { kind, format }
    }

    pub fn object() -> Self {
        SchemaDescriptor::primitive(SchemaKind::Object, None)
    }

    pub fn string() -> Self {
        SchemaDescriptor::primitive(SchemaKind::String, None)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SchemaDescriptor::Array(_))
    }

    /// JSON type name of the outermost schema.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaDescriptor::Primitive { kind, .. } => kind.as_str(),
            SchemaDescriptor::Map | SchemaDescriptor::Reference(_) => "object",
            SchemaDescriptor::Array(_) => "array",
        }
    }

    pub fn format(&self) -> Option<&'static str> {
        match self {
            SchemaDescriptor::Primitive { format, .. } => *format,
            _ => None,
        }
    }

    /// Name of the component this descriptor points at, looking through arrays.
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            SchemaDescriptor::Reference(name) => Some(name),
            SchemaDescriptor::Array(inner) => inner.referenced_name(),
            _ => None,
        }
    }
}

/// A Java type string split into base name, type arguments and array suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaType {
    /// Simple (package-stripped) base name
    pub base: String,
    /// Generic type arguments in declaration order
    pub args: Vec<JavaType>,
    /// Number of trailing `[]` (or varargs `...`)
    pub array_depth: usize,
}

impl JavaType {
    /// Parses a type string such as `java.util.List<Map<String, Long>>[]`.
    ///
    /// Parsing never fails; unparseable input degrades to an `Object` base.
    pub fn parse(raw: &str) -> Self {
        let mut text = raw.trim();

        // `? extends Foo` / `? super Foo` behave like `Foo` for shape purposes
        if let Some(rest) = text.strip_prefix('?') {
            let rest = rest.trim();
            text = rest
                .strip_prefix("extends")
                .or_else(|| rest.strip_prefix("super"))
                .map(str::trim)
                .unwrap_or(rest);
        }

        let mut array_depth = 0;
        loop {
            if let Some(stripped) = text.strip_suffix("[]") {
                array_depth += 1;
                text = stripped.trim_end();
            } else if let Some(stripped) = text.strip_suffix("...") {
                array_depth += 1;
                text = stripped.trim_end();
            } else {
                break;
            }
        }

        let (head, args) = match (text.find('<'), text.rfind('>')) {
            (Some(open), Some(close)) if close > open => {
                let inner = &text[open + 1..close];
                let args = split_top_level(inner, ',')
                    .into_iter()
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| JavaType::parse(&a))
                    .collect();
                (&text[..open], args)
            }
            _ => (text, Vec::new()),
        };

        let simple = head.trim().rsplit('.').next().unwrap_or("").trim();
        let base = if simple.is_empty() {
            "Object".to_string()
        } else {
            simple.to_string()
        };

        Self {
            base,
            args,
            array_depth,
        }
    }

    /// First type argument, or `Object` for raw generic usage.
    pub fn first_arg(&self) -> JavaType {
        self.args
            .first()
            .cloned()
            .unwrap_or_else(|| JavaType::parse("Object"))
    }

    /// The same type with one array dimension removed.
    pub fn element(&self) -> JavaType {
        JavaType {
            base: self.base.clone(),
            args: self.args.clone(),
            array_depth: self.array_depth.saturating_sub(1),
        }
    }

    pub fn family(&self) -> TypeFamily {
        TypeFamily::of(&self.base)
    }
}

/// Splits on a separator that is not nested inside `<>`, `()`, `{}` or a string literal.
pub fn split_top_level(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut current = String::new();

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' => in_string = true,
            '<' | '(' | '{' => depth += 1,
            '>' | ')' | '}' => depth -= 1,
            _ => {}
        }
        if c == separator && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

/// Fixed base-type table, shared with the mock data generator.
const SCALAR_TYPES: &[(&str, SchemaKind, Option<&str>)] = &[
    ("String", SchemaKind::String, None),
    ("CharSequence", SchemaKind::String, None),
    ("char", SchemaKind::String, None),
    ("Character", SchemaKind::String, None),
    ("int", SchemaKind::Integer, Some("int32")),
    ("Integer", SchemaKind::Integer, Some("int32")),
    ("short", SchemaKind::Integer, Some("int32")),
    ("Short", SchemaKind::Integer, Some("int32")),
    ("long", SchemaKind::Integer, Some("int64")),
    ("Long", SchemaKind::Integer, Some("int64")),
    ("byte", SchemaKind::Integer, None),
    ("Byte", SchemaKind::Integer, None),
    ("BigInteger", SchemaKind::Integer, None),
    ("float", SchemaKind::Number, Some("float")),
    ("Float", SchemaKind::Number, Some("float")),
    ("double", SchemaKind::Number, Some("double")),
    ("Double", SchemaKind::Number, Some("double")),
    ("BigDecimal", SchemaKind::Number, None),
    ("boolean", SchemaKind::Boolean, None),
    ("Boolean", SchemaKind::Boolean, None),
    ("Date", SchemaKind::String, Some("date-time")),
    ("LocalDate", SchemaKind::String, Some("date")),
    ("LocalDateTime", SchemaKind::String, Some("date-time")),
    ("ZonedDateTime", SchemaKind::String, Some("date-time")),
    ("OffsetDateTime", SchemaKind::String, Some("date-time")),
    ("Instant", SchemaKind::String, Some("date-time")),
    ("Timestamp", SchemaKind::String, Some("date-time")),
    ("UUID", SchemaKind::String, Some("uuid")),
    ("URI", SchemaKind::String, Some("uri")),
    ("URL", SchemaKind::String, Some("uri")),
    ("MultipartFile", SchemaKind::String, Some("binary")),
    ("Object", SchemaKind::Object, None),
    ("JsonNode", SchemaKind::Object, None),
];

const COLLECTION_TYPES: &[&str] = &[
    "List",
    "ArrayList",
    "LinkedList",
    "Set",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "SortedSet",
    "Collection",
    "Iterable",
];

const MAP_TYPES: &[&str] = &[
    "Map",
    "HashMap",
    "LinkedHashMap",
    "TreeMap",
    "ConcurrentHashMap",
    "MultiValueMap",
];

const UNWRAPPING_TYPES: &[&str] = &[
    "Optional",
    "ResponseEntity",
    "HttpEntity",
    "Mono",
    "CompletableFuture",
    "CompletionStage",
    "Callable",
    "DeferredResult",
];

const MULTI_ASYNC_TYPES: &[&str] = &["Flux"];

/// How a base type name is treated by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Scalar(SchemaKind, Option<&'static str>),
    Collection,
    Map,
    /// Container whose shape is its single argument's shape
    Unwrapping,
    /// Async stream of many values
    MultiAsync,
    /// Anything else: a DTO or other named model
    Named,
}

impl TypeFamily {
    pub fn of(base: &str) -> Self {
        if let Some((_, kind, format)) = SCALAR_TYPES.iter().find(|(name, _, _)| *name == base) {
            return TypeFamily::Scalar(*kind, *format);
        }
        if COLLECTION_TYPES.contains(&base) {
            TypeFamily::Collection
        } else if MAP_TYPES.contains(&base) {
            TypeFamily::Map
        } else if UNWRAPPING_TYPES.contains(&base) {
            TypeFamily::Unwrapping
        } else if MULTI_ASYNC_TYPES.contains(&base) {
            TypeFamily::MultiAsync
        } else {
            TypeFamily::Named
        }
    }
}

/// Type resolver - maps Java type strings to structural schema descriptors.
///
/// Resolution is a pure function of the type string: no caching and no hidden state.
/// Unknown base types become named references so that DTOs can be referenced before
/// their component schema exists.
pub struct TypeResolver;

impl TypeResolver {
    /// Resolves a raw type string.
    pub fn resolve(type_name: &str) -> SchemaDescriptor {
        Self::resolve_type(&JavaType::parse(type_name))
    }

    /// Resolves an already parsed type.
    pub fn resolve_type(ty: &JavaType) -> SchemaDescriptor {
        if ty.array_depth > 0 {
            if ty.array_depth == 1 && (ty.base == "byte" || ty.base == "Byte") {
                return SchemaDescriptor::primitive(SchemaKind::String, Some("byte"));
            }
            return SchemaDescriptor::Array(Box::new(Self::resolve_type(&ty.element())));
        }

        match ty.family() {
            TypeFamily::Scalar(kind, format) => SchemaDescriptor::primitive(kind, format),
            TypeFamily::Collection | TypeFamily::MultiAsync => {
                SchemaDescriptor::Array(Box::new(Self::resolve_type(&ty.first_arg())))
            }
            TypeFamily::Map => SchemaDescriptor::Map,
            TypeFamily::Unwrapping => Self::resolve_type(&ty.first_arg()),
            TypeFamily::Named => {
                debug!("Unknown type: {}, treating as schema reference", ty.base);
                SchemaDescriptor::Reference(ty.base.clone())
            }
        }
    }

    /// Whether a type needs a named component schema.
    ///
    /// False for table types and maps; arrays, collections and unwrapping containers are
    /// looked through at any depth.
    pub fn needs_component_schema(type_name: &str) -> bool {
        Self::needs_schema(&JavaType::parse(type_name))
    }

    fn needs_schema(ty: &JavaType) -> bool {
        if ty.array_depth > 0 {
            return Self::needs_schema(&ty.element());
        }
        match ty.family() {
            TypeFamily::Scalar(..) | TypeFamily::Map => false,
            TypeFamily::Collection | TypeFamily::MultiAsync | TypeFamily::Unwrapping => {
                Self::needs_schema(&ty.first_arg())
            }
            TypeFamily::Named => true,
        }
    }

    /// Whether the base is a table type (no DTO expansion needed).
    pub fn is_scalar(type_name: &str) -> bool {
        matches!(JavaType::parse(type_name).family(), TypeFamily::Scalar(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(kind: SchemaKind, format: Option<&'static str>) -> SchemaDescriptor {
        SchemaDescriptor::primitive(kind, format)
    }

    #[test]
    fn test_parse_simple_type() {
        let ty = JavaType::parse("String");
        assert_eq!(ty.base, "String");
        assert!(ty.args.is_empty());
        assert_eq!(ty.array_depth, 0);
    }

    #[test]
    fn test_parse_nested_generics() {
        let ty = JavaType::parse("ResponseEntity<Map<String, List<Long>>>");
        assert_eq!(ty.base, "ResponseEntity");
        assert_eq!(ty.args.len(), 1);
        let map = &ty.args[0];
        assert_eq!(map.base, "Map");
        assert_eq!(map.args.len(), 2);
        assert_eq!(map.args[1].base, "List");
        assert_eq!(map.args[1].args[0].base, "Long");
    }

    #[test]
    fn test_parse_strips_package_and_wildcards() {
        assert_eq!(JavaType::parse("java.util.UUID").base, "UUID");
        assert_eq!(JavaType::parse("? extends UserDto").base, "UserDto");
        assert_eq!(JavaType::parse("?").base, "Object");
    }

    #[test]
    fn test_parse_arrays_and_varargs() {
        assert_eq!(JavaType::parse("String[]").array_depth, 1);
        assert_eq!(JavaType::parse("int[][]").array_depth, 2);
        assert_eq!(JavaType::parse("Long...").array_depth, 1);
    }

    #[test]
    fn test_resolve_known_scalars() {
        assert_eq!(TypeResolver::resolve("String"), prim(SchemaKind::String, None));
        assert_eq!(
            TypeResolver::resolve("Integer"),
            prim(SchemaKind::Integer, Some("int32"))
        );
        assert_eq!(
            TypeResolver::resolve("long"),
            prim(SchemaKind::Integer, Some("int64"))
        );
        assert_eq!(
            TypeResolver::resolve("LocalDate"),
            prim(SchemaKind::String, Some("date"))
        );
        assert_eq!(
            TypeResolver::resolve("LocalDateTime"),
            prim(SchemaKind::String, Some("date-time"))
        );
        assert_eq!(
            TypeResolver::resolve("UUID"),
            prim(SchemaKind::String, Some("uuid"))
        );
        assert_eq!(TypeResolver::resolve("BigDecimal"), prim(SchemaKind::Number, None));
        assert_eq!(TypeResolver::resolve("boolean"), prim(SchemaKind::Boolean, None));
    }

    #[test]
    fn test_resolve_list_of_long() {
        assert_eq!(
            TypeResolver::resolve("List<Long>"),
            SchemaDescriptor::Array(Box::new(prim(SchemaKind::Integer, Some("int64"))))
        );
    }

    #[test]
    fn test_resolve_collections_of_dtos() {
        assert_eq!(
            TypeResolver::resolve("Set<UserDto>"),
            SchemaDescriptor::Array(Box::new(SchemaDescriptor::Reference("UserDto".to_string())))
        );
        assert_eq!(
            TypeResolver::resolve("Flux<OrderDto>"),
            SchemaDescriptor::Array(Box::new(SchemaDescriptor::Reference("OrderDto".to_string())))
        );
    }

    #[test]
    fn test_resolve_unwrapping_containers() {
        assert_eq!(
            TypeResolver::resolve("ResponseEntity<List<UserDto>>"),
            SchemaDescriptor::Array(Box::new(SchemaDescriptor::Reference("UserDto".to_string())))
        );
        assert_eq!(
            TypeResolver::resolve("Optional<String>"),
            prim(SchemaKind::String, None)
        );
        assert_eq!(
            TypeResolver::resolve("Mono<ProductDto>"),
            SchemaDescriptor::Reference("ProductDto".to_string())
        );
        assert_eq!(TypeResolver::resolve("ResponseEntity<?>"), SchemaDescriptor::object());
    }

    #[test]
    fn test_resolve_maps() {
        assert_eq!(TypeResolver::resolve("Map<String, Object>"), SchemaDescriptor::Map);
        assert_eq!(TypeResolver::resolve("HashMap"), SchemaDescriptor::Map);
    }

    #[test]
    fn test_unknown_type_is_reference_without_generics() {
        assert_eq!(
            TypeResolver::resolve("Page<UserDto>"),
            SchemaDescriptor::Reference("Page".to_string())
        );
        assert_eq!(
            TypeResolver::resolve("com.example.dto.UserDto"),
            SchemaDescriptor::Reference("UserDto".to_string())
        );
    }

    #[test]
    fn test_resolve_arrays() {
        assert_eq!(
            TypeResolver::resolve("byte[]"),
            prim(SchemaKind::String, Some("byte"))
        );
        assert_eq!(
            TypeResolver::resolve("String[]"),
            SchemaDescriptor::Array(Box::new(prim(SchemaKind::String, None)))
        );
    }

    #[test]
    fn test_resolve_is_pure() {
        let types = ["List<Map<String, UserDto>>", "ResponseEntity<Void>", "int[]", "Weird<<"];
        for ty in types {
            assert_eq!(TypeResolver::resolve(ty), TypeResolver::resolve(ty));
        }
    }

    #[test]
    fn test_needs_component_schema() {
        assert!(!TypeResolver::needs_component_schema("String"));
        assert!(!TypeResolver::needs_component_schema("Map<String, UserDto>"));
        assert!(!TypeResolver::needs_component_schema("List<Long>"));
        assert!(TypeResolver::needs_component_schema("UserDto"));
        assert!(TypeResolver::needs_component_schema("List<UserDto>"));
        assert!(TypeResolver::needs_component_schema("Optional<UserDto>"));
        assert!(TypeResolver::needs_component_schema("List<List<UserDto>>"));
        assert!(TypeResolver::needs_component_schema("ResponseEntity<Optional<Set<OrderDto>>>"));
        assert!(TypeResolver::needs_component_schema("UserDto[][]"));
        assert!(!TypeResolver::needs_component_schema("List<List<Map<String, UserDto>>>"));
    }

    #[test]
    fn test_referenced_name_looks_through_arrays() {
        let descriptor = TypeResolver::resolve("List<List<UserDto>>");
        assert_eq!(descriptor.referenced_name(), Some("UserDto"));
        assert_eq!(TypeResolver::resolve("Long").referenced_name(), None);
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level("Map<String, Long> a, @RequestParam(value = \"x\", required = false) String b", ',');
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].trim(), "Map<String, Long> a");

        let parts = split_top_level(r#"summary = "a, b", hidden = true"#, ',');
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].trim(), r#"summary = "a, b""#);
    }
}
