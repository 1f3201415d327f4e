//! Seeded mock value synthesis.
//!
//! Values come from an ordered list of field-name rules, falling back to the same base-type
//! table the [`TypeResolver`](crate::type_resolver::TypeResolver) uses. Every random draw goes
//! through one [`StdRng`], so a fixed seed gives byte-identical examples.

use crate::dto_scanner::{DtoCache, DtoField};
use crate::type_resolver::{JavaType, TypeFamily};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::{Arc, LazyLock};

/// Nested DTO references are expanded at most this deep.
const MAX_DTO_DEPTH: usize = 3;

/// 2024-01-01T00:00:00Z
const DATE_WINDOW_START: i64 = 1_704_067_200;
const DATE_WINDOW_SECONDS: i64 = 366 * 24 * 60 * 60;

const SERVER_ASSIGNED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor",
];
const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "mail.example.net"];
const STREETS: &[&str] = &[
    "Main Street", "Oak Avenue", "Maple Drive", "Cedar Lane", "Elm Street", "Park Road",
    "Lakeview Court", "Hillcrest Way",
];
const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Franklin", "Greenville", "Bristol", "Clinton", "Fairview",
    "Salem", "Madison", "Georgetown",
];
const STATES: &[&str] = &[
    "California", "Texas", "Florida", "New York", "Oregon", "Ohio", "Georgia", "Colorado",
];
const COUNTRIES: &[&str] = &[
    "United States", "Canada", "Germany", "France", "Japan", "Brazil", "Australia", "Spain",
];
const COMPANIES: &[&str] = &[
    "Acme Corp", "Globex Inc", "Initech", "Umbrella Group", "Stark Industries", "Wayne Enterprises",
    "Hooli", "Vandelay Industries",
];
const JOB_TITLES: &[&str] = &[
    "Software Engineer", "Product Manager", "Data Analyst", "Account Executive",
    "Support Specialist", "Marketing Coordinator", "Operations Lead", "QA Engineer",
];
const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "veniam",
];

type Producer = fn(&mut StdRng) -> Value;

struct FieldRule {
    pattern: Regex,
    produce: Producer,
}

impl FieldRule {
    fn new(pattern: &str, produce: Producer) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            produce,
        }
    }
}

/// Field-name rules in precedence order; the first matching pattern wins.
static FIELD_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::new(r"(?i)email", |rng| json!(fake_email(rng))),
        FieldRule::new(r"(?i)^name$|first_?name|last_?name|full_?name", |rng| {
            json!(fake_full_name(rng))
        }),
        FieldRule::new(r"(?i)username|login", |rng| json!(fake_username(rng))),
        FieldRule::new(r"(?i)password", |_| json!("********")),
        FieldRule::new(r"(?i)phone|mobile|tel", |rng| json!(fake_phone(rng))),
        FieldRule::new(r"(?i)address|street", |rng| {
            json!(format!("{} {}", rng.random_range(1..9999), pick(rng, STREETS)))
        }),
        FieldRule::new(r"(?i)city", |rng| json!(pick(rng, CITIES))),
        FieldRule::new(r"(?i)state|province", |rng| json!(pick(rng, STATES))),
        FieldRule::new(r"(?i)country", |rng| json!(pick(rng, COUNTRIES))),
        FieldRule::new(r"(?i)zip|postal", |rng| {
            json!(format!("{:05}", rng.random_range(10000..99999)))
        }),
        FieldRule::new(r"(?i)url|website|link", |rng| {
            json!(format!("https://www.{}.example.com", pick(rng, WORDS)))
        }),
        FieldRule::new(r"(?i)image|avatar|photo|picture", |rng| {
            json!(format!(
                "https://cdn.example.com/avatars/{}.png",
                rng.random_range(1..500)
            ))
        }),
        FieldRule::new(r"(?i)title", |rng| json!(fake_sentence(rng, 3))),
        FieldRule::new(r"(?i)description|bio|about|summary", |rng| {
            let words = rng.random_range(8..14);
            json!(fake_sentence(rng, words))
        }),
        FieldRule::new(r"(?i)content|body|text", |rng| {
            let first = fake_sentence(rng, 10);
            let second = fake_sentence(rng, 12);
            json!(format!("{first}\n{second}"))
        }),
        FieldRule::new(r"(?i)company|organization", |rng| json!(pick(rng, COMPANIES))),
        FieldRule::new(r"(?i)job|position|role", |rng| json!(pick(rng, JOB_TITLES))),
        FieldRule::new(r"(?i)price|amount|cost|total", |rng| {
            json!(fake_decimal(rng, 100, 100_000))
        }),
        FieldRule::new(r"(?i)quantity|count|qty", |rng| json!(rng.random_range(1..=100))),
        FieldRule::new(r"^(?:age|[A-Za-z]+Age)$", |rng| json!(rng.random_range(18..=80))),
        FieldRule::new(r"(?i)rating|score", |rng| json!(rng.random_range(1..=5))),
        FieldRule::new(r"(?i)status", |rng| {
            json!(pick(rng, &["ACTIVE", "INACTIVE", "PENDING"]))
        }),
        FieldRule::new(r"(?i)type|category", |rng| {
            json!(pick(rng, &["TYPE_A", "TYPE_B", "TYPE_C"]))
        }),
        FieldRule::new(r"(?i)uuid|guid", |rng| json!(fake_uuid(rng))),
        FieldRule::new(r"(?i)token", |rng| json!(fake_alphanumeric(rng, 32))),
        FieldRule::new(r"(?i)code", |rng| {
            json!(fake_alphanumeric(rng, 8).to_uppercase())
        }),
    ]
});

fn pick(rng: &mut StdRng, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn fake_full_name(rng: &mut StdRng) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

fn fake_email(rng: &mut StdRng) -> String {
    format!(
        "{}.{}@{}",
        pick(rng, FIRST_NAMES).to_lowercase(),
        pick(rng, LAST_NAMES).to_lowercase(),
        pick(rng, EMAIL_DOMAINS)
    )
}

fn fake_username(rng: &mut StdRng) -> String {
    format!(
        "{}{}",
        pick(rng, FIRST_NAMES).to_lowercase(),
        rng.random_range(1..1000)
    )
}

fn fake_phone(rng: &mut StdRng) -> String {
    format!(
        "+1-{}-{}-{}",
        rng.random_range(200..999),
        rng.random_range(100..999),
        rng.random_range(1000..9999)
    )
}

fn fake_sentence(rng: &mut StdRng, words: usize) -> String {
    let mut sentence = (0..words.max(1))
        .map(|_| pick(rng, WORDS))
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = sentence.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    sentence.push('.');
    sentence
}

/// Two-decimal number in `[min_cents, max_cents)` / 100.
fn fake_decimal(rng: &mut StdRng, min_cents: i64, max_cents: i64) -> f64 {
    rng.random_range(min_cents..max_cents) as f64 / 100.0
}

fn fake_uuid(rng: &mut StdRng) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

fn fake_alphanumeric(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn fake_datetime(rng: &mut StdRng) -> DateTime<Utc> {
    let offset = rng.random_range(0..DATE_WINDOW_SECONDS);
    DateTime::from_timestamp(DATE_WINDOW_START + offset, 0).unwrap_or_default()
}

/// Human-readable reason phrase for an error status.
pub fn error_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Error",
    }
}

/// Mock data generator - produces example JSON values for fields, types and DTOs.
pub struct MockDataGenerator {
    rng: StdRng,
    dtos: Arc<DtoCache>,
    list_size: usize,
}

impl MockDataGenerator {
    /// Creates a generator seeded with `seed`, expanding DTO references from `dtos`.
    pub fn new(seed: u64, dtos: Arc<DtoCache>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dtos,
            list_size: 2,
        }
    }

    pub fn with_list_size(mut self, list_size: usize) -> Self {
        self.list_size = list_size;
        self
    }

    /// Default item count for list examples.
    pub fn list_size(&self) -> usize {
        self.list_size
    }

    /// Example value for a named field.
    ///
    /// Field-name rules win over the declared type, whatever its shape; only unmatched names
    /// fall back to type-driven synthesis.
    pub fn for_field(&mut self, name: &str, type_name: &str) -> Value {
        self.for_field_at(name, type_name, 0)
    }

    /// Example value for a type, without a field-name hint.
    pub fn for_type(&mut self, type_name: &str) -> Value {
        self.for_type_at(type_name, 0)
    }

    fn for_field_at(&mut self, name: &str, type_name: &str, depth: usize) -> Value {
        if let Some(value) = self.from_rules(name) {
            return value;
        }
        self.for_type_at(type_name, depth)
    }

    fn from_rules(&mut self, name: &str) -> Option<Value> {
        FIELD_RULES
            .iter()
            .find(|rule| rule.pattern.is_match(name))
            .map(|rule| (rule.produce)(&mut self.rng))
    }

    fn for_type_at(&mut self, type_name: &str, depth: usize) -> Value {
        if type_name.trim().is_empty() {
            return json!("example");
        }
        let ty = JavaType::parse(type_name);
        self.for_java_type(&ty, depth)
    }

    fn for_java_type(&mut self, ty: &JavaType, depth: usize) -> Value {
        if ty.array_depth > 0 {
            if ty.array_depth == 1 && (ty.base == "byte" || ty.base == "Byte") {
                return json!("ZXhhbXBsZQ==");
            }
            let element = ty.element();
            return self.pair_of(&element, depth);
        }

        match ty.family() {
            TypeFamily::Scalar(..) => self.scalar(&ty.base),
            TypeFamily::Collection | TypeFamily::MultiAsync => {
                let item = ty.first_arg();
                self.pair_of(&item, depth)
            }
            TypeFamily::Map => json!({ "key1": "value1", "key2": "value2" }),
            TypeFamily::Unwrapping => {
                let inner = ty.first_arg();
                if inner.base == "Void" {
                    Value::Null
                } else {
                    self.for_java_type(&inner, depth)
                }
            }
            TypeFamily::Named => {
                if depth >= MAX_DTO_DEPTH {
                    return Value::Null;
                }
                match self.dtos.get(&ty.base).map(|dto| dto.fields.clone()) {
                    Some(fields) => self.dto_object(&ty.base, &fields, depth + 1),
                    None => Value::Null,
                }
            }
        }
    }

    fn pair_of(&mut self, item: &JavaType, depth: usize) -> Value {
        let first = self.for_java_type(item, depth);
        let second = self.for_java_type(item, depth);
        Value::Array(vec![first, second])
    }

    fn scalar(&mut self, base: &str) -> Value {
        let rng = &mut self.rng;
        match base {
            "String" | "CharSequence" => json!(pick(rng, WORDS)),
            "char" | "Character" => json!("A"),
            "int" | "Integer" | "short" | "Short" => json!(rng.random_range(1..=100)),
            "long" | "Long" => json!(rng.random_range(1..=10_000)),
            "byte" | "Byte" => json!(rng.random_range(0..=127)),
            "BigInteger" => json!(rng.random_range(1..=1_000_000)),
            "float" | "Float" | "double" | "Double" => json!(fake_decimal(rng, 0, 100_000)),
            "BigDecimal" => json!(fake_decimal(rng, 0, 1_000_000)),
            "boolean" | "Boolean" => json!(rng.random_bool(0.5)),
            "LocalDate" => json!(fake_datetime(rng).format("%Y-%m-%d").to_string()),
            "LocalDateTime" => json!(fake_datetime(rng).format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
            "Date" | "ZonedDateTime" | "OffsetDateTime" | "Instant" | "Timestamp" => {
                json!(fake_datetime(rng).to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            "UUID" => json!(fake_uuid(rng)),
            "URI" | "URL" => json!(format!("https://www.{}.example.com", pick(rng, WORDS))),
            "MultipartFile" => json!("file.bin"),
            _ => json!({}),
        }
    }

    fn dto_object(&mut self, name: &str, fields: &[DtoField], depth: usize) -> Value {
        let mut example = Map::new();

        if name.to_lowercase().contains("user") {
            example.insert("id".to_string(), json!(self.rng.random_range(1..=1000)));
            example.insert("name".to_string(), json!(fake_full_name(&mut self.rng)));
            example.insert("email".to_string(), json!(fake_email(&mut self.rng)));
        }

        for field in fields {
            if !example.contains_key(&field.name) {
                let value = self.for_field_at(&field.name, &field.type_name, depth);
                example.insert(field.name.clone(), value);
            }
        }

        Value::Object(example)
    }

    /// Example object for a DTO, using cached fields or a template guess.
    pub fn dto_example(&mut self, name: &str) -> Value {
        let fields = self.dtos.infer_fields(name);
        self.dto_object(name, &fields, 0)
    }

    /// Request-body example: server-assigned fields are removed.
    pub fn request_example(&mut self, name: &str) -> Value {
        let mut example = self.dto_example(name);
        if let Value::Object(map) = &mut example {
            for field in SERVER_ASSIGNED_FIELDS {
                map.shift_remove(*field);
            }
        }
        example
    }

    /// Response example: an identity and a creation timestamp are always present.
    pub fn response_example(&mut self, name: &str) -> Value {
        let mut example = self.dto_example(name);
        if let Value::Object(map) = &mut example {
            if !map.contains_key("id") {
                map.insert("id".to_string(), json!(self.rng.random_range(1..=1000)));
            }
            if !map.contains_key("createdAt") {
                map.insert("createdAt".to_string(), json!(self.timestamp()));
            }
        }
        example
    }

    /// `count` independently generated response examples.
    pub fn list_examples(&mut self, name: &str, count: usize) -> Value {
        Value::Array((0..count).map(|_| self.response_example(name)).collect())
    }

    /// Fixed-shape error body.
    pub fn error_response(&mut self, status: u16, message: &str, path: &str) -> Value {
        json!({
            "timestamp": self.timestamp(),
            "status": status,
            "error": error_reason(status),
            "message": message,
            "path": path,
        })
    }

    /// ISO-8601 UTC timestamp inside the fixed reference window.
    pub fn timestamp(&mut self) -> String {
        fake_datetime(&mut self.rng).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto_scanner::DtoDescriptor;
    use pretty_assertions::assert_eq;

    fn generator() -> MockDataGenerator {
        MockDataGenerator::new(42, Arc::new(DtoCache::new()))
    }

    fn generator_with(dtos: Vec<DtoDescriptor>) -> MockDataGenerator {
        let mut cache = DtoCache::new();
        for dto in dtos {
            cache.insert(dto);
        }
        MockDataGenerator::new(7, Arc::new(cache))
    }

    fn descriptor(name: &str, fields: &[(&str, &str)]) -> DtoDescriptor {
        DtoDescriptor {
            name: name.to_string(),
            path: None,
            fields: fields.iter().map(|(n, t)| DtoField::new(n, t)).collect(),
        }
    }

    #[test]
    fn test_field_rules_take_precedence() {
        let mut mock = generator();

        let email = mock.for_field("contactEmail", "String");
        assert!(email.as_str().unwrap().contains('@'));

        assert_eq!(mock.for_field("password", "String"), json!("********"));

        let status = mock.for_field("status", "String");
        assert!(["ACTIVE", "INACTIVE", "PENDING"].contains(&status.as_str().unwrap()));

        // a semantic name beats the nominal type
        assert!(mock.for_field("price", "String").is_f64());

        let code = mock.for_field("code", "String");
        let code = code.as_str().unwrap();
        assert_eq!(code.len(), 8);
        assert_eq!(code, code.to_uppercase());

        assert_eq!(mock.for_field("apiToken", "String").as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut mock = generator();
        // `emailAddress` matches both the email and address rules
        assert!(mock.for_field("emailAddress", "String").as_str().unwrap().contains('@'));
    }

    #[test]
    fn test_type_fallback() {
        let mut mock = generator();

        assert!(mock.for_type("Integer").is_i64());
        assert!(mock.for_type("boolean").is_boolean());
        assert_eq!(mock.for_type("char"), json!("A"));
        assert_eq!(mock.for_type("Object"), json!({}));
        assert_eq!(mock.for_type(""), json!("example"));

        let date = mock.for_type("LocalDate");
        assert_eq!(date.as_str().unwrap().len(), 10);
        assert!(date.as_str().unwrap().starts_with("2024") || date.as_str().unwrap().starts_with("2025"));

        let id = mock.for_type("UUID");
        assert!(uuid::Uuid::parse_str(id.as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_collections_and_maps() {
        let mut mock = generator();

        let tags = mock.for_field("tags", "List<String>");
        assert_eq!(tags.as_array().unwrap().len(), 2);

        let attributes = mock.for_field("attributes", "Map<String, String>");
        assert_eq!(attributes, json!({ "key1": "value1", "key2": "value2" }));

        let roles = mock.for_field("roles", "Set<String>");
        assert!(JOB_TITLES.contains(&roles.as_str().unwrap()));
    }

    #[test]
    fn test_field_name_rule_beats_structured_type() {
        let mut mock = generator_with(vec![
            descriptor("AddressDto", &[("line1", "String"), ("zipCode", "String")]),
            descriptor("ContactDto", &[("email", "List<String>"), ("address", "AddressDto")]),
        ]);

        let email = mock.for_field("email", "List<String>");
        assert!(email.as_str().unwrap().contains('@'));

        let address = mock.for_field("address", "AddressDto");
        assert!(address.is_string());

        let contact = mock.dto_example("ContactDto");
        assert!(contact["email"].as_str().unwrap().contains('@'));
        assert!(contact["address"].is_string());
    }

    #[test]
    fn test_name_parts_yield_full_name() {
        let mut mock = generator();
        for field in ["name", "firstName", "last_name", "fullName"] {
            let value = mock.for_field(field, "String");
            assert!(value.as_str().unwrap().contains(' '), "{field} -> {value}");
        }
    }

    #[test]
    fn test_unknown_type_is_null() {
        let mut mock = generator();
        assert_eq!(mock.for_type("Mystery"), Value::Null);
        assert_eq!(mock.for_type("ResponseEntity<Void>"), Value::Null);
    }

    #[test]
    fn test_nested_dto_expansion() {
        let mut mock = generator_with(vec![
            descriptor("OrderDto", &[("id", "Long"), ("shipping", "AddressDto")]),
            descriptor("AddressDto", &[("street", "String"), ("city", "String")]),
        ]);

        let order = mock.dto_example("OrderDto");
        let shipping = order.get("shipping").unwrap();
        assert!(shipping.get("street").unwrap().is_string());
        assert!(shipping.get("city").unwrap().is_string());
    }

    #[test]
    fn test_self_referencing_dto_is_depth_limited() {
        let mut mock = generator_with(vec![descriptor(
            "NodeDto",
            &[("label", "String"), ("parent", "NodeDto")],
        )]);

        let node = mock.dto_example("NodeDto");
        let mut current = &node;
        let mut levels = 0;
        while let Some(parent) = current.get("parent").filter(|p| p.is_object()) {
            current = parent;
            levels += 1;
        }
        assert_eq!(levels, MAX_DTO_DEPTH);
    }

    #[test]
    fn test_request_and_response_asymmetry() {
        let mut mock = generator_with(vec![descriptor(
            "ArticleDto",
            &[("id", "Long"), ("name", "String"), ("createdAt", "LocalDateTime")],
        )]);

        let request = mock.request_example("ArticleDto");
        let request = request.as_object().unwrap();
        assert!(!request.contains_key("id"));
        assert!(!request.contains_key("createdAt"));
        assert!(request.contains_key("name"));

        let response = mock.response_example("ArticleDto");
        let response = response.as_object().unwrap();
        assert!(response.contains_key("id"));
        assert!(response.contains_key("createdAt"));
    }

    #[test]
    fn test_response_example_adds_missing_identity() {
        let mut mock = generator_with(vec![descriptor("TagDto", &[("label", "String")])]);

        let response = mock.response_example("TagDto");
        assert!(response.get("id").unwrap().is_number());
        assert!(response.get("createdAt").unwrap().is_string());
    }

    #[test]
    fn test_user_examples_preseed_identity() {
        let mut mock = generator_with(vec![descriptor("UserDto", &[("nickname", "String")])]);

        let example = mock.dto_example("UserDto");
        let keys: Vec<&String> = example.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "name", "email", "nickname"]);
    }

    #[test]
    fn test_list_examples_are_independent() {
        let mut mock = generator();

        let list = mock.list_examples("ProductDto", 3);
        let items = list.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.get("id").is_some()));
        assert_ne!(items[0], items[1]);
    }

    #[test]
    fn test_error_response_shape() {
        let mut mock = generator();

        let error = mock.error_response(404, "User not found", "/api/users/1");
        assert_eq!(error["status"], json!(404));
        assert_eq!(error["error"], json!("Not Found"));
        assert_eq!(error["message"], json!("User not found"));
        assert_eq!(error["path"], json!("/api/users/1"));
        assert!(error["timestamp"].is_string());

        assert_eq!(error_reason(418), "Error");
        assert_eq!(error_reason(422), "Unprocessable Entity");
    }

    #[test]
    fn test_same_seed_same_output() {
        let mut first = generator();
        let mut second = generator();

        assert_eq!(first.response_example("UserDto"), second.response_example("UserDto"));
        assert_eq!(first.for_type("UUID"), second.for_type("UUID"));
    }
}
