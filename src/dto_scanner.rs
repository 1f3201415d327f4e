//! DTO discovery and field inference.
//!
//! Model-like Java files are parsed once, before controller extraction, into a name-indexed
//! cache. The cache is read-only afterwards and is shared by every extraction worker.

use crate::schema_generator::Schema;
use crate::source::read_source;
use crate::type_resolver::TypeResolver;
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:public\s+)?(?:class|record)\s+(\w+)").unwrap());

static RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"record\s+\w+\s*(?:<[^>]*>)?\s*\(([^)]*)\)").unwrap());

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:private|protected|public)\s+((?:static\s+)?(?:final\s+)?(?:static\s+)?)([\w.]+(?:<[^;=(){}]*>)?(?:\[\])*)\s+(\w+)\s*[;=]",
    )
    .unwrap()
});

const DENIED_FIELD_NAMES: &[&str] = &["serialVersionUID", "logger", "log", "LOG"];
const DENIED_FIELD_TYPES: &[&str] = &["Logger", "Log"];

const DTO_FILE_SUFFIXES: &[&str] = &["DTO.java", "Dto.java", "Request.java", "Response.java"];
const DTO_DIRECTORIES: &[&str] = &["model", "entity", "domain"];
const DTO_NAME_SUFFIXES: &[&str] = &["DTO", "Dto", "Request", "Response"];

/// A single declared field of a DTO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtoField {
    pub name: String,
    pub type_name: String,
}

impl DtoField {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// Name plus ordered field list of a model class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtoDescriptor {
    pub name: String,
    pub path: Option<PathBuf>,
    pub fields: Vec<DtoField>,
}

/// Name-indexed DTO cache. The first entry inserted for a name wins.
#[derive(Debug, Clone, Default)]
pub struct DtoCache {
    entries: IndexMap<String, DtoDescriptor>,
}

impl DtoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor unless one with the same name is already cached.
    ///
    /// Returns `true` when the descriptor was stored.
    pub fn insert(&mut self, dto: DtoDescriptor) -> bool {
        if self.entries.contains_key(&dto.name) {
            debug!("DTO {} already cached, keeping first definition", dto.name);
            return false;
        }
        self.entries.insert(dto.name.clone(), dto);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a DTO up by exact name, then by prefix of the suffix-stripped name.
    ///
    /// The prefix fallback returns the first matching entry in insertion order, which
    /// follows file enumeration order.
    pub fn get(&self, name: &str) -> Option<&DtoDescriptor> {
        if let Some(dto) = self.entries.get(name) {
            return Some(dto);
        }

        let base = strip_dto_suffix(name);
        if base.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| key.starts_with(base))
            .map(|(_, dto)| dto)
    }

    /// Returns cached fields, or a template guessed from the name.
    pub fn infer_fields(&self, name: &str) -> Vec<DtoField> {
        match self.get(name) {
            Some(dto) => dto.fields.clone(),
            None => template_fields(name),
        }
    }

    /// Renders the inferred fields of `name` as an object component schema.
    pub fn to_object_schema(&self, name: &str) -> Schema {
        let properties: IndexMap<String, Schema> = self
            .infer_fields(name)
            .into_iter()
            .map(|field| {
                let schema = Schema::from_descriptor(&TypeResolver::resolve(&field.type_name));
                (field.name, schema)
            })
            .collect();

        Schema {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            ..Schema::default()
        }
    }
}

fn strip_dto_suffix(name: &str) -> &str {
    DTO_NAME_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}

/// Hard-coded field templates for names the cache knows nothing about.
pub fn template_fields(name: &str) -> Vec<DtoField> {
    let lower = name.to_lowercase();

    let fields: &[(&str, &str)] = if lower.contains("user") {
        &[
            ("id", "Long"),
            ("name", "String"),
            ("email", "String"),
            ("createdAt", "LocalDateTime"),
        ]
    } else if lower.contains("product") {
        &[
            ("id", "Long"),
            ("name", "String"),
            ("description", "String"),
            ("price", "BigDecimal"),
        ]
    } else if lower.contains("order") {
        &[
            ("id", "Long"),
            ("status", "String"),
            ("total", "BigDecimal"),
            ("createdAt", "LocalDateTime"),
        ]
    } else {
        &[
            ("id", "Long"),
            ("name", "String"),
            ("createdAt", "LocalDateTime"),
        ]
    };

    fields
        .iter()
        .map(|(name, ty)| DtoField::new(name, ty))
        .collect()
}

/// Parses Java source text into a DTO descriptor.
///
/// Returns `None` when no class or record declaration is present.
pub fn parse_dto_source(text: &str, path: Option<&Path>) -> Option<DtoDescriptor> {
    let name = CLASS_RE.captures(text)?.get(1)?.as_str().to_string();

    let mut fields: Vec<DtoField> = Vec::new();

    if let Some(components) = RECORD_RE.captures(text).and_then(|c| c.get(1)) {
        for component in crate::type_resolver::split_top_level(components.as_str(), ',') {
            let cleaned = strip_annotations(&component);
            let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
            if tokens.len() >= 2 {
                let field_name = tokens.pop().unwrap_or_default();
                let field_type = tokens.join(" ");
                push_field(&mut fields, field_name, &field_type);
            }
        }
    }

    for caps in FIELD_RE.captures_iter(text) {
        if caps.get(1).is_some_and(|m| m.as_str().contains("static")) {
            continue;
        }
        let (Some(field_type), Some(field_name)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        push_field(&mut fields, field_name.as_str(), field_type.as_str());
    }

    Some(DtoDescriptor {
        name,
        path: path.map(Path::to_path_buf),
        fields,
    })
}

fn push_field(fields: &mut Vec<DtoField>, name: &str, type_name: &str) {
    let base = crate::type_resolver::JavaType::parse(type_name).base;
    if DENIED_FIELD_NAMES.contains(&name) || DENIED_FIELD_TYPES.contains(&base.as_str()) {
        return;
    }
    if fields.iter().any(|f| f.name == name) {
        return;
    }
    fields.push(DtoField::new(name, type_name.trim()));
}

fn strip_annotations(text: &str) -> String {
    static ANNOTATION_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"@\w+(?:\([^)]*\))?").unwrap());
    ANNOTATION_RE.replace_all(text, " ").trim().to_string()
}

/// DTO scanner - discovers model files and fills a [`DtoCache`].
pub struct DtoScanner {
    root_path: PathBuf,
}

impl DtoScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Candidate model files under `src/main/java`, in directory-walk order.
    pub fn discover(&self) -> Vec<PathBuf> {
        let java_root = self.root_path.join("src/main/java");
        if !java_root.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&java_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to access path: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_dto_candidate(path))
            .collect()
    }

    /// Scans the project and builds the cache. A missing project yields an empty cache.
    pub fn scan(&self) -> DtoCache {
        let mut cache = DtoCache::new();

        if !self.root_path.is_dir() {
            debug!("DTO scan skipped, not a directory: {}", self.root_path.display());
            return cache;
        }

        let files = self.discover();
        debug!("Found {} potential DTO files", files.len());

        for path in files {
            match read_source(&path) {
                Ok(text) => {
                    if let Some(dto) = parse_dto_source(&text, Some(&path)) {
                        cache.insert(dto);
                    }
                }
                Err(e) => debug!("Failed to parse {}: {}", path.display(), e),
            }
        }

        debug!("Parsed {} DTO(s)", cache.len());
        cache
    }
}

fn is_dto_candidate(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !file_name.ends_with(".java") {
        return false;
    }
    if DTO_FILE_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
        return true;
    }
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|dir| DTO_DIRECTORIES.contains(&dir))
}

/// Whether a field type should be expanded into its own component schema.
pub fn field_needs_schema(field: &DtoField) -> bool {
    TypeResolver::needs_component_schema(&field.type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const USER_DTO: &str = r#"
package com.example.dto;

import lombok.Data;
import java.time.LocalDateTime;

@Data
public class UserDTO implements Serializable {
    private static final long serialVersionUID = 1L;
    private static final Logger log = LoggerFactory.getLogger(UserDTO.class);

    private Long id;
    private String name;
    private String email;
    private List<String> roles = new ArrayList<>();
    protected final LocalDateTime createdAt;

    public String getName() {
        return name;
    }
}
"#;

    fn dto(name: &str, fields: &[(&str, &str)]) -> DtoDescriptor {
        DtoDescriptor {
            name: name.to_string(),
            path: None,
            fields: fields.iter().map(|(n, t)| DtoField::new(n, t)).collect(),
        }
    }

    #[test]
    fn test_parse_dto_fields() {
        let parsed = parse_dto_source(USER_DTO, None).unwrap();

        assert_eq!(parsed.name, "UserDTO");
        assert_eq!(
            parsed.fields,
            vec![
                DtoField::new("id", "Long"),
                DtoField::new("name", "String"),
                DtoField::new("email", "String"),
                DtoField::new("roles", "List<String>"),
                DtoField::new("createdAt", "LocalDateTime"),
            ]
        );
    }

    #[test]
    fn test_parse_record_components() {
        let text = "public record ProductRequest(@NotBlank String name, BigDecimal price) {}";
        let parsed = parse_dto_source(text, None).unwrap();

        assert_eq!(parsed.name, "ProductRequest");
        assert_eq!(
            parsed.fields,
            vec![
                DtoField::new("name", "String"),
                DtoField::new("price", "BigDecimal"),
            ]
        );
    }

    #[test]
    fn test_parse_without_class_is_none() {
        assert!(parse_dto_source("package com.example;", None).is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        let mut cache = DtoCache::new();
        assert!(cache.insert(dto("UserDto", &[("id", "Long")])));
        assert!(!cache.insert(dto("UserDto", &[("uuid", "UUID")])));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("UserDto").unwrap().fields[0].name, "id");
    }

    #[test]
    fn test_get_falls_back_to_prefix_of_stripped_name() {
        let mut cache = DtoCache::new();
        cache.insert(dto("InvoiceDto", &[("number", "String")]));

        let found = cache.get("InvoiceResponse").unwrap();
        assert_eq!(found.name, "InvoiceDto");
        assert!(cache.get("PaymentResponse").is_none());
    }

    #[test]
    fn test_infer_fields_uses_templates_on_miss() {
        let cache = DtoCache::new();

        let user: Vec<String> = cache.infer_fields("AdminUser").into_iter().map(|f| f.name).collect();
        assert_eq!(user, vec!["id", "name", "email", "createdAt"]);

        let product: Vec<String> = cache.infer_fields("ProductView").into_iter().map(|f| f.name).collect();
        assert_eq!(product, vec!["id", "name", "description", "price"]);

        let generic: Vec<String> = cache.infer_fields("Widget").into_iter().map(|f| f.name).collect();
        assert_eq!(generic, vec!["id", "name", "createdAt"]);
    }

    #[test]
    fn test_scan_project_discovers_conventional_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let base = root.join("src/main/java/com/example");
        fs::create_dir_all(base.join("dto")).unwrap();
        fs::create_dir_all(base.join("entity")).unwrap();
        fs::create_dir_all(base.join("service")).unwrap();

        fs::write(base.join("dto/UserDTO.java"), USER_DTO).unwrap();
        fs::write(
            base.join("entity/Order.java"),
            "public class Order { private Long id; private String status; }",
        )
        .unwrap();
        fs::write(
            base.join("service/UserService.java"),
            "public class UserService { private UserRepository repo; }",
        )
        .unwrap();

        let cache = DtoScanner::new(root.to_path_buf()).scan();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("UserDTO").is_some());
        assert!(cache.get("Order").is_some());
        assert!(cache.get("UserService").is_none());
    }

    #[test]
    fn test_scan_missing_project_is_empty() {
        let cache = DtoScanner::new(PathBuf::from("/no/such/project")).scan();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_to_object_schema() {
        let mut cache = DtoCache::new();
        cache.insert(dto("TagDto", &[("label", "String"), ("weight", "Double")]));

        let schema = serde_json::to_value(cache.to_object_schema("TagDto")).unwrap();
        assert_eq!(
            schema,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "label": { "type": "string" },
                    "weight": { "type": "number", "format": "double" }
                }
            })
        );
    }

    #[test]
    fn test_field_needs_schema() {
        assert!(field_needs_schema(&DtoField::new("address", "AddressDto")));
        assert!(!field_needs_schema(&DtoField::new("tags", "List<String>")));
        assert!(field_needs_schema(&DtoField::new("matrix", "List<List<CellDto>>")));
        assert!(!field_needs_schema(&DtoField::new("index", "Map<String, CellDto>")));
    }
}
