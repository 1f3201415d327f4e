//! Post-processing of generated collections.
//!
//! [`CollectionEnhancer::enhance`] runs a fixed sequence of passes:
//!
//! 1. default collection variables
//! 2. default request headers
//! 3. path-template segments rewritten to collection variables
//! 4. display-name normalisation
//! 5. per-folder ordering by verb
//! 6. saved example responses
//!
//! Every pass only adds what is missing, so enhancing an already enhanced collection
//! changes nothing.

use crate::collection::{Collection, Header, Item, RequestItem, SavedResponse, Url};
use crate::mock_generator::MockDataGenerator;
use heck::ToTitleCase;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TOKEN: &str = "<JWT_TOKEN_HERE>";

/// Value given to newly discovered path variables.
const NEW_VARIABLE_VALUE: &str = "1";

/// Path variable names used verbatim.
const CONVENTIONAL_VARIABLES: &[&str] = &["userId", "productId", "orderId"];

/// Entity keywords used to name a bare `id` variable, in priority order.
const ID_CONTEXTS: &[(&str, &str)] = &[
    ("user", "userId"),
    ("product", "productId"),
    ("order", "orderId"),
    ("customer", "customerId"),
    ("item", "itemId"),
];

/// Words never taken as the entity name of a request.
const ENTITY_STOP_WORDS: &[&str] = &["by", "ID", "the", "Get", "Create", "Update", "Delete", "List"];

static LEADING_VERB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(GET|POST|PUT|DELETE|PATCH)\s+").unwrap());
static ALL_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\ball\b\s*").unwrap());
static BY_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bby id\b").unwrap());
static SINGLE_BRACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(\w+)\}$").unwrap());

/// Collection enhancer.
///
/// Holds the mock generator used for saved responses and the path variables discovered
/// while rewriting URLs.
pub struct CollectionEnhancer {
    mock: MockDataGenerator,
    base_url: String,
    discovered: IndexMap<String, String>,
}

impl CollectionEnhancer {
    pub fn new(mock: MockDataGenerator) -> Self {
        Self {
            mock,
            base_url: DEFAULT_BASE_URL.to_string(),
            discovered: IndexMap::new(),
        }
    }

    /// Default for the `baseUrl` variable when the collection has none.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.to_string();
        }
        self
    }

    /// Path variables discovered so far, with their default values.
    pub fn discovered_variables(&self) -> &IndexMap<String, String> {
        &self.discovered
    }

    /// Runs every pass, in order.
    pub fn enhance(&mut self, collection: &mut Collection) {
        debug!("Enhancing collection {}", collection.info.name);

        self.add_default_variables(collection);
        add_default_headers(collection);
        self.convert_path_variables(collection);
        improve_request_names(collection);
        sort_requests(collection);
        self.add_saved_responses(collection);

        debug!(
            "Enhanced {} request(s), {} variable(s)",
            collection.request_count(),
            collection.variable.len()
        );
    }

    /// Pass 1: `baseUrl`, `token` and any previously discovered path variables.
    pub fn add_default_variables(&mut self, collection: &mut Collection) {
        collection.add_variable_if_missing("baseUrl", &self.base_url);
        collection.add_variable_if_missing("token", DEFAULT_TOKEN);
        for (key, value) in &self.discovered {
            collection.add_variable_if_missing(key, value);
        }
    }

    /// Pass 3: `:id` and `{id}` segments become `{{var}}` references.
    ///
    /// Variables seen for the first time are recorded and added to the collection with a
    /// default value in the same run.
    pub fn convert_path_variables(&mut self, collection: &mut Collection) {
        let discovered = &mut self.discovered;
        collection.for_each_request_mut(|item| {
            let name = item.name.clone();
            for var in rewrite_url_variables(&mut item.request.url, &name) {
                if !discovered.contains_key(&var) {
                    debug!("Discovered path variable {}", var);
                    discovered.insert(var, NEW_VARIABLE_VALUE.to_string());
                }
            }
        });

        for (key, value) in &self.discovered {
            collection.add_variable_if_missing(key, value);
        }
    }

    /// Pass 6: example responses keyed by verb and path shape.
    pub fn add_saved_responses(&mut self, collection: &mut Collection) {
        let mock = &mut self.mock;
        collection.for_each_request_mut(|item| add_responses_to(mock, item));
    }
}

/// Pass 2: `Accept`, `Content-Type` (with a body) and a disabled bearer `Authorization`
/// header. Existing headers are never replaced.
pub fn add_default_headers(collection: &mut Collection) {
    collection.for_each_request_mut(|item| {
        let request = &mut item.request;
        if !has_header(&request.header, "Accept") {
            request.header.push(Header::text("Accept", "application/json"));
        }
        if request.body.is_some() && !has_header(&request.header, "Content-Type") {
            request
                .header
                .push(Header::text("Content-Type", "application/json"));
        }
        if !has_header(&request.header, "Authorization") {
            request
                .header
                .push(Header::text("Authorization", "Bearer {{token}}").disabled());
        }
    });
}

fn has_header(headers: &[Header], key: &str) -> bool {
    headers.iter().any(|h| h.key.eq_ignore_ascii_case(key))
}

/// Collection variable for a path parameter.
pub fn variable_name(param: &str, request_name: &str) -> String {
    if CONVENTIONAL_VARIABLES.contains(&param) {
        return param.to_string();
    }
    if param == "id" {
        return guess_id_variable(request_name).to_string();
    }
    param.to_string()
}

/// Names a bare `id` after the entity the request is about.
pub fn guess_id_variable(request_name: &str) -> &'static str {
    let lower = request_name.to_lowercase();
    ID_CONTEXTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, var)| *var)
        .unwrap_or("id")
}

/// Rewrites one URL, returning the variables it references.
fn rewrite_url_variables(url: &mut Url, request_name: &str) -> Vec<String> {
    let mut used = Vec::new();

    for segment in url.path.iter_mut() {
        let param = match segment.strip_prefix(':') {
            Some(param) => Some(param.to_string()),
            None => SINGLE_BRACE_RE
                .captures(segment.as_str())
                .map(|caps| caps[1].to_string()),
        };
        if let Some(param) = param {
            let var = variable_name(&param, request_name);
            *segment = format!("{{{{{var}}}}}");
            used.push(var);
        }
    }

    for variable in url.variable.iter_mut() {
        let var = variable_name(&variable.key, request_name);
        variable.value = format!("{{{{{var}}}}}");
        used.push(var);
    }

    url.rebuild_raw();
    used
}

/// Pass 4: readable request names.
pub fn improve_request_names(collection: &mut Collection) {
    collection.for_each_request_mut(|item| {
        item.name = improve_request_name(&item.name, &item.request.method);
    });
}

/// Strips a leading verb, splits and title-cases words, then applies the list and `by ID`
/// rewrites for reads.
pub fn improve_request_name(name: &str, method: &str) -> String {
    let stripped = LEADING_VERB_RE.replace(name.trim(), "");

    let words: Vec<String> = stripped
        .split_whitespace()
        .map(|word| {
            if word.chars().all(char::is_alphanumeric) {
                word.to_title_case()
            } else {
                word.to_string()
            }
        })
        .collect();
    let mut improved = words.join(" ");

    let is_get = method.eq_ignore_ascii_case("GET");
    if is_get && ALL_WORD_RE.is_match(&improved) {
        improved = format!("List {}", ALL_WORD_RE.replace(&improved, ""))
            .trim()
            .to_string();
    }
    if is_get && BY_ID_RE.is_match(&improved) {
        improved = BY_ID_RE.replace(&improved, "by ID").to_string();
    }

    if improved.is_empty() {
        name.to_string()
    } else {
        improved
    }
}

/// Pass 5: orders the root and every folder, recursively.
pub fn sort_requests(collection: &mut Collection) {
    sort_items(&mut collection.item);
}

fn sort_items(items: &mut [Item]) {
    items.sort_by_key(sort_key);
    for item in items.iter_mut() {
        if let Item::Folder(folder) = item {
            sort_items(&mut folder.item);
        }
    }
}

/// Folders first, then verb rank, then list-style requests ahead of the rest.
fn sort_key(item: &Item) -> (u8, u8, bool) {
    match item {
        Item::Folder(_) => (0, 0, false),
        Item::Request(request) => {
            let lower = request.name.to_lowercase();
            let is_list = lower.contains("list") || lower.contains("all");
            (1, method_rank(&request.request.method), !is_list)
        }
    }
}

/// GET, POST, PUT, PATCH, DELETE, then everything else.
pub fn method_rank(method: &str) -> u8 {
    match method.to_uppercase().as_str() {
        "GET" => 1,
        "POST" => 2,
        "PUT" => 3,
        "PATCH" => 4,
        "DELETE" => 5,
        _ => 99,
    }
}

/// First word longer than two characters that is not a stop word.
pub fn guess_entity_name(request_name: &str) -> String {
    request_name
        .split_whitespace()
        .find(|word| word.len() > 2 && !ENTITY_STOP_WORDS.contains(word))
        .unwrap_or("Entity")
        .to_string()
}

enum Example {
    Success,
    List,
    ValidationError,
    NotFound,
    Empty,
}

/// Saved responses for a verb, as (name, status, body kind) triples.
fn planned_responses(method: &str, parameterized: bool) -> &'static [(&'static str, u16, Example)] {
    match method.to_uppercase().as_str() {
        "GET" if parameterized => &[
            ("200 OK", 200, Example::Success),
            ("404 Not Found", 404, Example::NotFound),
        ],
        "GET" => &[("200 OK", 200, Example::List)],
        "POST" => &[
            ("201 Created", 201, Example::Success),
            ("400 Bad Request", 400, Example::ValidationError),
        ],
        "PUT" | "PATCH" => &[
            ("200 OK", 200, Example::Success),
            ("400 Bad Request", 400, Example::ValidationError),
            ("404 Not Found", 404, Example::NotFound),
        ],
        "DELETE" => &[
            ("204 No Content", 204, Example::Empty),
            ("404 Not Found", 404, Example::NotFound),
        ],
        _ => &[],
    }
}

fn add_responses_to(mock: &mut MockDataGenerator, item: &mut RequestItem) {
    let path = item.request.url.path_string();
    let parameterized = path.contains(':') || path.contains("{{");
    let entity = guess_entity_name(&item.name);

    for (name, code, example) in planned_responses(&item.request.method, parameterized) {
        if item.response.iter().any(|r| r.name == *name) {
            continue;
        }
        let body: Option<Value> = match example {
            Example::Success => Some(mock.response_example(&entity)),
            Example::List => Some(mock.list_examples(&entity, 3)),
            Example::ValidationError => Some(mock.error_response(400, "Validation failed", &path)),
            Example::NotFound => {
                Some(mock.error_response(404, &format!("{entity} not found"), &path))
            }
            Example::Empty => None,
        };
        item.response
            .push(SavedResponse::json(name, *code, body.as_ref()));
    }
}
