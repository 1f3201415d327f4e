use crate::error::{Error, Result};
use crate::source::read_lossy;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One discovery tier: a directory under the project root and a file-name predicate.
struct Tier {
    subdir: &'static str,
    label: &'static str,
    matches: fn(&str) -> bool,
}

/// Discovery tiers, most specific first. The first tier that finds any file is used.
const TIERS: &[Tier] = &[
    Tier {
        subdir: "src/main/java",
        label: "src/main/java/**/*Controller.java",
        matches: is_controller_file,
    },
    Tier {
        subdir: "src/main/java",
        label: "src/main/java/**/*RestController.java",
        matches: is_rest_controller_file,
    },
    Tier {
        subdir: "src",
        label: "src/**/*.java",
        matches: is_java_file,
    },
];

fn is_controller_file(name: &str) -> bool {
    name.ends_with("Controller.java")
}

fn is_rest_controller_file(name: &str) -> bool {
    name.ends_with("RestController.java")
}

fn is_java_file(name: &str) -> bool {
    name.ends_with(".java")
}

/// Controller scanner for Spring Boot projects.
///
/// The `ControllerScanner` walks the conventional source roots of a project, narrows the
/// discovered files with include/exclude patterns and keeps the ones that look like REST
/// controllers. Build output (`target`, `build`) and hidden directories are skipped.
///
/// # Example
///
/// ```no_run
/// use spring2collection::scanner::ControllerScanner;
/// use std::path::PathBuf;
///
/// let scanner = ControllerScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} controllers", result.controllers.len());
/// ```
pub struct ControllerScanner {
    root_path: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Result of a controller scan.
#[derive(Debug)]
pub struct ScanResult {
    /// Controller files, sorted
    pub controllers: Vec<PathBuf>,
    /// Number of files found by the selected tier, before filtering
    pub discovered: usize,
    /// Pattern of the tier that produced the files
    pub tier: &'static str,
    /// Warning messages for paths that could not be walked or read
    pub warnings: Vec<String>,
}

impl ControllerScanner {
    /// Creates a new `ControllerScanner` for the specified project directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Sets the include and exclude pattern lists.
    pub fn with_filters(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include = include;
        self.exclude = exclude;
        self
    }

    /// Discovers, filters and classifies controller files.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` if the root is missing or not a directory, and
    /// `NoControllersFound` if no tier finds a file or no file survives filtering and
    /// classification.
    pub fn scan(&self) -> Result<ScanResult> {
        debug!("Scanning for controllers in: {}", self.root_path.display());

        if !self.root_path.is_dir() {
            return Err(Error::ProjectNotFound(self.root_path.clone()));
        }

        let mut warnings = Vec::new();
        let (tier, files) = self.discover(&mut warnings);
        if files.is_empty() {
            return Err(Error::NoControllersFound(self.root_path.clone()));
        }
        let discovered = files.len();

        let filtered = self.apply_filters(files);
        debug!(
            "{} Java file(s) after filtering, checking for controllers",
            filtered.len()
        );

        let mut controllers = Vec::new();
        for path in filtered {
            match read_lossy(&path) {
                Ok(text) if is_controller(&text) => {
                    debug!("Controller: {}", path.display());
                    controllers.push(path);
                }
                Ok(_) => {}
                Err(e) => {
                    let warning = format!("Failed to read {}: {}", path.display(), e);
                    debug!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        if controllers.is_empty() {
            return Err(Error::NoControllersFound(self.root_path.clone()));
        }

        info!("Found {} controller(s)", controllers.len());
        Ok(ScanResult {
            controllers,
            discovered,
            tier,
            warnings,
        })
    }

    /// Walks the tiers in order, returning the first one that yields files.
    fn discover(&self, warnings: &mut Vec<String>) -> (&'static str, Vec<PathBuf>) {
        for tier in TIERS {
            debug!("Searching pattern: {}", tier.label);
            let files = self.walk(&self.root_path.join(tier.subdir), tier.matches, warnings);
            if !files.is_empty() {
                debug!("Found {} file(s) with pattern {}", files.len(), tier.label);
                return (tier.label, files);
            }
        }
        (TIERS[TIERS.len() - 1].label, Vec::new())
    }

    fn walk(&self, dir: &Path, matches: fn(&str) -> bool, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        if !dir.is_dir() {
            return Vec::new();
        }

        // BTreeSet dedups and gives a stable, sorted queue order.
        let mut files = BTreeSet::new();
        for entry in WalkDir::new(dir).into_iter().filter_entry(|e| {
            if e.path() == dir {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target" && file_name != "build"
        }) {
            match entry {
                Ok(entry) => {
                    let wanted = entry.file_type().is_file()
                        && matches(&entry.file_name().to_string_lossy());
                    if wanted {
                        files.insert(entry.into_path());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
        files.into_iter().collect()
    }

    /// Keeps files matching any include pattern, then drops files matching any exclude
    /// pattern. Exclusion wins.
    fn apply_filters(&self, files: Vec<PathBuf>) -> Vec<PathBuf> {
        let include = compile_patterns(&self.include);
        let exclude = compile_patterns(&self.exclude);

        let mut filtered = files;
        if !include.is_empty() {
            filtered.retain(|path| matches_any(&include, path));
            debug!("Include filter applied: {} files remaining", filtered.len());
        }
        if !exclude.is_empty() {
            filtered.retain(|path| !matches_any(&exclude, path));
            debug!("Exclude filter applied: {} files remaining", filtered.len());
        }
        filtered
    }
}

/// Whether source text declares a REST controller.
pub fn is_controller(text: &str) -> bool {
    let rest_controller = text.contains("@RestController");
    let controller = text.contains("@Controller");
    let response_body = text.contains("@ResponseBody");
    let request_mapping = text.contains("@RequestMapping");

    rest_controller || (controller && (response_body || request_mapping))
}

/// Converts a glob-like filter pattern into an unanchored regular expression.
///
/// `.` is literal, `**` matches anything and `*` matches anything but `/`. Other regex
/// metacharacters pass through unchanged.
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => regex.push_str(r"\."),
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                regex.push_str(".*");
            }
            '*' => regex.push_str("[^/]*"),
            other => regex.push(other),
        }
    }
    regex
}

/// Whether a path matches a single filter pattern. Patterns that do not compile match
/// nothing.
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    compile_patterns(&[pattern.to_string()])
        .first()
        .is_some_and(|re| re.is_match(&normalized(path)))
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(&pattern_to_regex(pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid filter pattern {:?}: {}", pattern, e);
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Regex], path: &Path) -> bool {
    let path = normalized(path);
    patterns.iter().any(|re| re.is_match(&path))
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
