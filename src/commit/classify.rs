//! Heuristic commit type and scope inference from changed file paths.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
}

impl CommitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DOCS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\.mdx?$|docs?/)").expect("docs pattern"));
static TEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(__tests__|\.test\.|\.spec\.|\btests?\b)").expect("test pattern")
});
static CONFIG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(package(-lock)?\.json|tsconfig|eslint|prettier|vite|next\.config|postcss|bun\.lock)",
    )
    .expect("config pattern")
});
static PERF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)perf|optimi[sz]e").expect("perf pattern"));
static INFRA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(docker|compose\.ya?ml|infra|deployment|ci|\.github)").expect("infra pattern")
});
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(src|app|lib|server|client|components|routes|pages)").expect("source pattern")
});

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];

type Rule = fn(&[&str]) -> Option<CommitType>;

/// Evaluated in order; the first rule that fires decides the type.
const RULES: &[Rule] = &[
    docs_only,
    tests_only,
    mostly_styles,
    config_touched,
    perf_hints,
    infra_touched,
    source_touched,
];

/// Infer a commit type from the changed paths.
///
/// Total and deterministic: an empty list falls through to `refactor`.
pub fn classify<S: AsRef<str>>(files: &[S]) -> CommitType {
    let files: Vec<&str> = files.iter().map(|f| f.as_ref()).collect();
    RULES
        .iter()
        .find_map(|rule| rule(&files))
        .unwrap_or(CommitType::Refactor)
}

/// Build a scope from the distinct top-level directories of the changed paths.
///
/// Hidden segments (leading `.`) are dropped; at most two segments are kept,
/// in first-seen order, joined with a comma.
pub fn infer_scope<S: AsRef<str>>(files: &[S]) -> Option<String> {
    let mut seen = HashSet::new();
    let segments: Vec<&str> = files
        .iter()
        .filter_map(|f| top_level_segment(f.as_ref()))
        .filter(|segment| seen.insert(*segment))
        .take(2)
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join(","))
    }
}

/// First `/`-separated segment of a path, unless empty or hidden.
pub fn top_level_segment(path: &str) -> Option<&str> {
    path.split('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.starts_with('.'))
}

fn every(files: &[&str], re: &Regex) -> bool {
    !files.is_empty() && files.iter().all(|f| re.is_match(f))
}

fn any(files: &[&str], re: &Regex) -> bool {
    files.iter().any(|f| re.is_match(f))
}

fn docs_only(files: &[&str]) -> Option<CommitType> {
    every(files, &DOCS_RE).then_some(CommitType::Docs)
}

fn tests_only(files: &[&str]) -> Option<CommitType> {
    every(files, &TEST_RE).then_some(CommitType::Test)
}

fn mostly_styles(files: &[&str]) -> Option<CommitType> {
    if files.is_empty() {
        return None;
    }
    let stylesheets = files
        .iter()
        .filter(|f| {
            let ext = f.rsplit('.').next().unwrap_or("").to_lowercase();
            STYLE_EXTENSIONS.contains(&ext.as_str())
        })
        .count();
    (stylesheets >= files.len().div_ceil(2)).then_some(CommitType::Style)
}

fn config_touched(files: &[&str]) -> Option<CommitType> {
    any(files, &CONFIG_RE).then_some(CommitType::Chore)
}

fn perf_hints(files: &[&str]) -> Option<CommitType> {
    any(files, &PERF_RE).then_some(CommitType::Perf)
}

fn infra_touched(files: &[&str]) -> Option<CommitType> {
    any(files, &INFRA_RE).then_some(CommitType::Ci)
}

fn source_touched(files: &[&str]) -> Option<CommitType> {
    any(files, &SOURCE_RE).then_some(CommitType::Feat)
}
