use crate::error::{Error, Result};
use crate::source::SourceFile;
use crate::type_resolver::split_top_level;
use log::debug;
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@[\w.]+(?:\([^)]*\))?\s+)*(?P<decl>(?:(?:public|protected|private|abstract|final|static|sealed)\s+)*(?:class|interface|record)\s+(?P<name>\w+))",
    )
    .unwrap()
});

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<decl>(?:(?:public|private|protected|static|final|synchronized|abstract|default|native)\s+)*(?:<[^<>;{}()]*(?:<[^<>;{}()]*>[^<>;{}()]*)*>\s+)?(?P<ret>[\w.]+(?:\s*<[^;{}()=]*>)?(?:\s*\[\])*)\s+(?P<name>\w+)\s*\()",
    )
    .unwrap()
});

/// Words that can precede `name(` without being a return type.
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "new", "throw", "else", "case", "yield", "await", "assert", "record", "class",
];

/// A modifier in return-type position means a constructor.
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "static", "final", "synchronized", "abstract", "default",
    "native",
];

/// Control-flow words that look like method names.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "synchronized", "try"];

/// Java source parser.
///
/// The parser is a deliberately small, regex-driven extractor: it recognises package and
/// class declarations, directive (annotation) blocks preceding a declaration, method heads
/// with their raw parameter text, and the parameters themselves. It never builds a syntax
/// tree and never rejects input; anything it cannot recognise is skipped.
///
/// # Example
///
/// ```no_run
/// use spring2collection::parser::JavaParser;
/// use std::path::Path;
///
/// let parsed = JavaParser::parse_file(Path::new("UserController.java")).unwrap();
/// println!("{} has {} methods", parsed.class.name, parsed.methods.len());
/// ```
pub struct JavaParser;

/// A single `@Directive(...)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Simple name without `@` or package qualifier
    pub name: String,
    /// Text between the outer parentheses, if any
    pub args: Option<String>,
    /// The directive exactly as written
    pub raw: String,
}

/// Package, class name and class-level directives of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub package: Option<String>,
    /// Class name, `Unknown` when no declaration was found
    pub name: String,
    pub annotations: Vec<Annotation>,
}

/// A method head found by the method sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: String,
    /// Raw text between the parameter list parentheses
    pub parameters: String,
    pub annotations: Vec<Annotation>,
    /// Byte offset of the declaration in the source text
    pub offset: usize,
    /// 1-based line of the declaration
    pub line: usize,
}

/// One parameter of a method, before binding classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParameter {
    pub name: String,
    pub type_name: String,
    pub annotations: Vec<Annotation>,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    pub class: ClassInfo,
    pub methods: Vec<MethodInfo>,
}

impl Annotation {
    /// The directive's primary string value.
    ///
    /// Tries `value = "..."`, then the first positional string argument, then
    /// `path = "..."`. Returns `None` when none of them is present.
    pub fn value(&self) -> Option<String> {
        static VALUE_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"\bvalue\s*=\s*\{?\s*"([^"]+)""#).unwrap());
        static PATH_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"\bpath\s*=\s*\{?\s*"([^"]+)""#).unwrap());
        static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());

        let args = self.args.as_deref()?.trim();

        if let Some(caps) = VALUE_RE.captures(args) {
            return Some(caps[1].to_string());
        }

        let positional = split_top_level(args, ',')
            .into_iter()
            .map(|arg| arg.trim().to_string())
            .find(|arg| arg.starts_with('"') || arg.starts_with('{'));
        if let Some(caps) = positional.as_deref().and_then(|arg| QUOTED_RE.captures(arg)) {
            return Some(caps[1].to_string());
        }

        PATH_RE.captures(args).map(|caps| caps[1].to_string())
    }

    /// Looks up `attribute = <token>` inside the arguments, unquoting string tokens.
    pub fn attribute(&self, attribute: &str) -> Option<String> {
        let args = self.args.as_deref()?;
        split_top_level(args, ',').into_iter().find_map(|arg| {
            let (key, value) = arg.split_once('=')?;
            if key.trim() != attribute {
                return None;
            }
            let value = value.trim();
            Some(value.trim_matches('"').to_string())
        })
    }
}

impl JavaParser {
    /// Reads and parses a single Java source file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.java` file
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` naming the file when it cannot be read as UTF-8 text.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        let source = SourceFile::read(path).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse_source(&source))
    }

    /// Parses already loaded source text.
    pub fn parse_source(source: &SourceFile) -> ParsedFile {
        debug!("Parsing Java file: {}", source.path.display());

        let class = Self::extract_class_info(&source.text);
        let methods = Self::extract_methods(&source.text);

        debug!(
            "Parsed {}: class {} with {} method(s)",
            source.file_name(),
            class.name,
            methods.len()
        );

        ParsedFile {
            path: source.path.clone(),
            class,
            methods,
        }
    }

    /// Extracts package, class name and class-level directives.
    ///
    /// A file without a class declaration yields the synthetic name `Unknown` and no
    /// directives.
    pub fn extract_class_info(text: &str) -> ClassInfo {
        let package = PACKAGE_RE.captures(text).map(|caps| caps[1].to_string());

        let Some(caps) = CLASS_RE.captures(text) else {
            return ClassInfo {
                package,
                name: "Unknown".to_string(),
                annotations: Vec::new(),
            };
        };

        let (name, offset) = match (caps.name("name"), caps.name("decl")) {
            (Some(name), Some(decl)) => (name.as_str().to_string(), decl.start()),
            _ => ("Unknown".to_string(), 0),
        };

        ClassInfo {
            package,
            name,
            annotations: Self::annotations_before(text, offset),
        }
    }

    /// Finds every method head with a balanced parameter list.
    pub fn extract_methods(text: &str) -> Vec<MethodInfo> {
        let mut methods = Vec::new();

        for caps in METHOD_RE.captures_iter(text) {
            let (Some(decl), Some(ret), Some(name)) =
                (caps.name("decl"), caps.name("ret"), caps.name("name"))
            else {
                continue;
            };

            // The sweep can start in the middle of an identifier
            if decl.start() > 0 && !text[..decl.start()].ends_with(char::is_whitespace) {
                let prev = text[..decl.start()].chars().last().unwrap_or(' ');
                if prev.is_alphanumeric() || prev == '_' || prev == '.' || prev == '@' {
                    continue;
                }
            }

            let return_type = ret.as_str().trim();
            if STATEMENT_KEYWORDS.contains(&return_type)
                || MODIFIERS.contains(&return_type)
                || CONTROL_KEYWORDS.contains(&name.as_str())
                || CONTROL_KEYWORDS.contains(&return_type)
            {
                continue;
            }

            let open = decl.end() - 1;
            let Some(close) = find_closing_paren(text, open) else {
                continue;
            };

            let tail = text[close + 1..].trim_start();
            if !(tail.starts_with('{') || tail.starts_with(';') || tail.starts_with("throws")) {
                continue;
            }

            methods.push(MethodInfo {
                name: name.as_str().to_string(),
                return_type: normalize_whitespace(return_type),
                parameters: text[open + 1..close].trim().to_string(),
                annotations: Self::annotations_before(text, decl.start()),
                offset: decl.start(),
                line: text[..decl.start()].matches('\n').count() + 1,
            });
        }

        methods
    }

    /// Collects the directive block that precedes the declaration at `offset`.
    ///
    /// Lines are scanned backward from the declaration. Directive lines (starting with `@`)
    /// are collected, blank and comment lines are skipped, and a directive whose argument
    /// list spans several lines is joined back together. The scan stops at the first line
    /// that is none of these. Directives written on the declaration line itself are included.
    pub fn annotations_before(text: &str, offset: usize) -> Vec<Annotation> {
        let offset = offset.min(text.len());
        let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);

        let mut blocks: Vec<String> = Vec::new();
        let inline = text[line_start..offset].trim();
        if !inline.is_empty() {
            blocks.push(inline.to_string());
        }

        let mut pending: Vec<&str> = Vec::new();
        let preceding = if line_start == 0 {
            ""
        } else {
            &text[..line_start - 1]
        };

        for line in preceding.lines().rev() {
            let trimmed = line.trim();

            if pending.is_empty() && (trimmed.is_empty() || is_comment_line(trimmed)) {
                continue;
            }

            pending.push(trimmed);

            if trimmed.starts_with('@') {
                let joined = pending.iter().rev().copied().collect::<Vec<_>>().join(" ");
                if paren_balance(&joined) <= 0 {
                    blocks.push(joined);
                    pending.clear();
                }
                continue;
            }

            let joined = pending.iter().rev().copied().collect::<Vec<_>>().join(" ");
            if paren_balance(&joined) >= 0 {
                // not inside an open argument list: ordinary code ends the block
                break;
            }
        }

        blocks
            .iter()
            .rev()
            .flat_map(|block| parse_annotations(block))
            .collect()
    }

    /// Splits a raw parameter list into parameters with their directives.
    ///
    /// Commas nested inside generics or directive arguments do not split.
    pub fn parse_parameters(raw: &str) -> Vec<RawParameter> {
        split_top_level(raw, ',')
            .iter()
            .filter_map(|part| parse_parameter(part.trim()))
            .collect()
    }
}

fn parse_parameter(part: &str) -> Option<RawParameter> {
    if part.is_empty() {
        return None;
    }

    let spans = scan_annotations(part);
    let mut remainder = String::with_capacity(part.len());
    let mut cursor = 0;
    for (_, span) in &spans {
        remainder.push_str(&part[cursor..span.start]);
        remainder.push(' ');
        cursor = span.end;
    }
    remainder.push_str(&part[cursor..]);

    let mut tokens: Vec<&str> = remainder
        .split_whitespace()
        .filter(|token| *token != "final")
        .collect();
    if tokens.len() < 2 {
        return None;
    }

    let name = tokens.pop()?.to_string();
    Some(RawParameter {
        name,
        type_name: tokens.join(" "),
        annotations: spans.into_iter().map(|(annotation, _)| annotation).collect(),
    })
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.ends_with("*/")
}

/// Number of `(` minus number of `)`, ignoring string and char literals.
fn paren_balance(text: &str) -> i32 {
    let mut balance = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => skip_literal(&mut chars, c),
            '(' => balance += 1,
            ')' => balance -= 1,
            _ => {}
        }
    }
    balance
}

fn skip_literal(chars: &mut std::str::Chars<'_>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            break;
        }
    }
}

/// Index of the `)` matching the `(` at `open`.
fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut in_literal: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if let Some(quote) = in_literal {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_literal = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_literal = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses every `@Name` / `@Name(args)` occurrence in a fragment.
pub fn parse_annotations(text: &str) -> Vec<Annotation> {
    scan_annotations(text)
        .into_iter()
        .map(|(annotation, _)| annotation)
        .collect()
}

fn scan_annotations(text: &str) -> Vec<(Annotation, Range<usize>)> {
    let mut found = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_literal_bytes(bytes, i);
                continue;
            }
            b'@' => {}
            _ => {
                i += 1;
                continue;
            }
        }

        let start = i;
        let mut end = i + 1;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_' || bytes[end] == b'.') {
            end += 1;
        }
        let qualified = &text[start + 1..end];
        let name = qualified.rsplit('.').next().unwrap_or(qualified);
        if name.is_empty() || name == "interface" {
            i = end;
            continue;
        }

        let mut args = None;
        let mut cursor = end;
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if cursor < bytes.len() && bytes[cursor] == b'(' {
            if let Some(close) = find_closing_paren(text, cursor) {
                args = Some(text[cursor + 1..close].trim().to_string());
                end = close + 1;
            }
        }

        found.push((
            Annotation {
                name: name.to_string(),
                args,
                raw: text[start..end].to_string(),
            },
            start..end,
        ));
        i = end;
    }

    found
}

fn skip_literal_bytes(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content).unwrap();
        file_path
    }

    const CONTROLLER: &str = r#"
package com.example.api;

import org.springframework.web.bind.annotation.*;

/**
 * Users endpoint.
 */
@RestController
// versioned later
@RequestMapping("/api/users")
public class UserController {

    private final UserService userService;

    public UserController(UserService userService) {
        this.userService = userService;
    }

    @GetMapping
    public List<UserDto> getAllUsers(@RequestParam(value = "page", defaultValue = "0") int page) {
        return userService.findAll(page);
    }

    /** Single user */
    @GetMapping("/{id}")
    @ResponseStatus(HttpStatus.OK)
    public ResponseEntity<UserDto> getUserById(@PathVariable Long id) {
        if (id == null) {
            throw new IllegalArgumentException("id");
        }
        return ResponseEntity.ok(userService.find(id));
    }

    @PostMapping(
        value = "/",
        consumes = "application/json"
    )
    public UserDto createUser(@Valid @RequestBody CreateUserRequest request) throws Exception {
        return userService.create(request);
    }

    @DeleteMapping("/{id}") public void deleteUser(@PathVariable("id") final Long userId) {
        userService.delete(userId);
    }
}
"#;

    fn names(annotations: &[Annotation]) -> Vec<&str> {
        annotations.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_extract_class_info() {
        let class = JavaParser::extract_class_info(CONTROLLER);

        assert_eq!(class.package.as_deref(), Some("com.example.api"));
        assert_eq!(class.name, "UserController");
        // comment lines do not stop the backward scan
        assert_eq!(names(&class.annotations), vec!["RestController", "RequestMapping"]);
        assert_eq!(class.annotations[1].value().as_deref(), Some("/api/users"));
    }

    #[test]
    fn test_class_without_declaration_is_unknown() {
        let class = JavaParser::extract_class_info("package a.b;\n// nothing here\n");
        assert_eq!(class.name, "Unknown");
        assert!(class.annotations.is_empty());
    }

    #[test]
    fn test_class_name_ignores_comment_prose() {
        let text = "/* this class handles users */\n@RestController\npublic class Real {}";
        assert_eq!(JavaParser::extract_class_info(text).name, "Real");
    }

    #[test]
    fn test_extract_methods() {
        let methods = JavaParser::extract_methods(CONTROLLER);
        let found: Vec<(&str, &str)> = methods
            .iter()
            .map(|m| (m.name.as_str(), m.return_type.as_str()))
            .collect();

        assert_eq!(
            found,
            vec![
                ("getAllUsers", "List<UserDto>"),
                ("getUserById", "ResponseEntity<UserDto>"),
                ("createUser", "UserDto"),
                ("deleteUser", "void"),
            ]
        );
    }

    #[test]
    fn test_method_annotations_and_parameters() {
        let methods = JavaParser::extract_methods(CONTROLLER);

        let get_all = &methods[0];
        assert_eq!(names(&get_all.annotations), vec!["GetMapping"]);
        assert_eq!(
            get_all.parameters,
            r#"@RequestParam(value = "page", defaultValue = "0") int page"#
        );

        let by_id = &methods[1];
        // the doc comment above the directives is skipped
        assert_eq!(names(&by_id.annotations), vec!["GetMapping", "ResponseStatus"]);
        assert_eq!(by_id.annotations[0].value().as_deref(), Some("/{id}"));
    }

    #[test]
    fn test_multiline_directive_is_joined() {
        let methods = JavaParser::extract_methods(CONTROLLER);
        let create = &methods[2];

        assert_eq!(names(&create.annotations), vec!["PostMapping"]);
        assert_eq!(create.annotations[0].value().as_deref(), Some("/"));
        assert_eq!(
            create.annotations[0].attribute("consumes").as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_inline_directive_on_declaration_line() {
        let methods = JavaParser::extract_methods(CONTROLLER);
        let delete = &methods[3];

        assert_eq!(names(&delete.annotations), vec!["DeleteMapping"]);
        assert!(delete.line > 1);
    }

    #[test]
    fn test_parse_parameters() {
        let params = JavaParser::parse_parameters(
            r#"@PathVariable("id") final Long userId, @RequestParam(required = false, defaultValue = "a,b") Map<String, List<String>> filters, HttpServletRequest request"#,
        );

        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "userId");
        assert_eq!(params[0].type_name, "Long");
        assert_eq!(params[0].annotations[0].value().as_deref(), Some("id"));

        assert_eq!(params[1].name, "filters");
        assert_eq!(params[1].type_name, "Map<String, List<String>>");
        assert_eq!(params[1].annotations[0].attribute("required").as_deref(), Some("false"));

        assert_eq!(params[2].name, "request");
        assert!(params[2].annotations.is_empty());
    }

    #[test]
    fn test_parse_empty_parameters() {
        assert!(JavaParser::parse_parameters("").is_empty());
        assert!(JavaParser::parse_parameters("   ").is_empty());
    }

    #[test]
    fn test_annotation_value_precedence() {
        let parse = |text: &str| parse_annotations(text).remove(0);

        assert_eq!(parse(r#"@GetMapping(value = "/a", path = "/b")"#).value().as_deref(), Some("/a"));
        assert_eq!(parse(r#"@GetMapping("/items")"#).value().as_deref(), Some("/items"));
        assert_eq!(parse(r#"@GetMapping(path = "/p")"#).value().as_deref(), Some("/p"));
        assert_eq!(parse(r#"@GetMapping({"/x", "/y"})"#).value().as_deref(), Some("/x"));
        assert_eq!(
            parse(r#"@GetMapping(produces = "application/json")"#).value(),
            None
        );
        assert_eq!(parse("@GetMapping").value(), None);
    }

    #[test]
    fn test_several_directives_on_one_line() {
        let annotations = parse_annotations(r#"@Valid @RequestBody(required = false)"#);
        assert_eq!(names(&annotations), vec!["Valid", "RequestBody"]);
        assert_eq!(annotations[1].raw, "@RequestBody(required = false)");
    }

    #[test]
    fn test_statements_are_not_methods() {
        let text = r#"
            public Foo build() {
                return mapper(value);
            }
            void helper() {
                if (x) { call(); }
                Foo f = new Foo(bar);
            }
        "#;
        let methods = JavaParser::extract_methods(text);
        let found: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(found, vec!["build", "helper"]);
    }

    #[test]
    fn test_parse_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(&temp_dir, "UserController.java", CONTROLLER.as_bytes());

        let parsed = JavaParser::parse_file(&path).unwrap();
        assert_eq!(parsed.path, path);
        assert_eq!(parsed.class.name, "UserController");
        assert_eq!(parsed.methods.len(), 4);
    }

    #[test]
    fn test_parse_file_with_invalid_utf8_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(&temp_dir, "Broken.java", &[b'@', 0xff, 0xfe]);

        let err = JavaParser::parse_file(&path).unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
        assert!(err.to_string().contains("Broken.java"));
    }
}
