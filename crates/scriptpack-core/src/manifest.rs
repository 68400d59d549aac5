//! Dependency manifest (`requirements.txt`) parsing.
//!
//! The manifest is handed to the package installer verbatim during the
//! image build. Parsing here exists only so problems can be reported before
//! an engine build is started:
//!
//! ```text
//! # comment                       -> skipped
//! --index-url https://...         -> installer option
//! requests==2.31.0                -> Requirement { name: "requests", constraint: "==2.31.0" }
//! uvicorn[standard]>=0.20 ; python_version >= "3.8"
//!                                 -> extras ["standard"], marker set
//! ```

use std::collections::HashSet;
use std::path::Path;

/// One declared third-party package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    /// Version specifier, e.g. `==2.31.0` or `>=1,<2`
    pub constraint: Option<String>,
    /// Environment marker after `;`
    pub marker: Option<String>,
    /// 1-based line number in the manifest
    pub line: usize,
}

impl Requirement {
    /// Canonical package name: lowercase, runs of `-`, `_`, `.` collapsed to `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Ordered dependency declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManifest {
    /// File name inside the build context
    pub file_name: String,
    pub requirements: Vec<Requirement>,
    /// Installer option lines (`-r`, `--index-url`, ...), kept in order
    pub options: Vec<String>,
}

impl DependencyManifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ManifestRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "requirements.txt".to_owned());

        let manifest = Self::parse(&file_name, &content)?;
        tracing::debug!(
            path = %path.display(),
            requirements = manifest.requirements.len(),
            "parsed dependency manifest"
        );
        Ok(manifest)
    }

    /// Parse manifest text.
    pub fn parse(file_name: &str, content: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self {
            file_name: file_name.to_owned(),
            ..Self::default()
        };

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            // Installer options and direct path/URL references go to the
            // installer untouched.
            let direct_url = line.contains("://") && !line.contains(" @ ");
            if line.starts_with(['-', '.', '/']) || direct_url {
                manifest.options.push(line.to_owned());
                continue;
            }

            manifest.requirements.push(parse_requirement(line, line_no)?);
        }

        Ok(manifest)
    }

    /// Local paths named by installer options: nested requirement and
    /// constraint files, and directory or archive references.
    pub fn local_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        for option in &self.options {
            let mut tokens = option.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };

            if let Some((flag, value)) = first.split_once('=') {
                if FILE_FLAGS.contains(&flag) || EDITABLE_FLAGS.contains(&flag) {
                    push_local(&mut refs, value);
                }
                continue;
            }

            if FILE_FLAGS.contains(&first) || EDITABLE_FLAGS.contains(&first) {
                if let Some(value) = tokens.next() {
                    push_local(&mut refs, value);
                }
            } else if first.starts_with(['.', '/']) {
                push_local(&mut refs, first);
            }
        }
        refs
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Non-fatal findings worth showing before a build.
    pub fn warnings(&self) -> Vec<ManifestWarning> {
        let mut warnings = Vec::new();

        if self.requirements.is_empty() {
            warnings.push(ManifestWarning::NoRequirements);
        }

        let mut seen = HashSet::new();
        for req in &self.requirements {
            if !seen.insert(req.normalized_name()) {
                warnings.push(ManifestWarning::Duplicate {
                    name: req.name.clone(),
                    line: req.line,
                });
            }
        }

        for req in &self.requirements {
            if req.constraint.is_none() {
                warnings.push(ManifestWarning::Unpinned {
                    name: req.name.clone(),
                    line: req.line,
                });
            }
        }

        warnings
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestWarning {
    NoRequirements,
    Duplicate { name: String, line: usize },
    Unpinned { name: String, line: usize },
}

impl std::fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRequirements => write!(f, "manifest declares no requirements"),
            Self::Duplicate { name, line } => {
                write!(f, "line {line}: '{name}' is declared more than once")
            }
            Self::Unpinned { name, line } => {
                write!(f, "line {line}: '{name}' has no version constraint")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed requirement on line {line}: {content:?}")]
    MalformedRequirement { line: usize, content: String },

    #[error("unterminated extras on line {line}: {content:?}")]
    UnterminatedExtras { line: usize, content: String },
}

const FILE_FLAGS: &[&str] = &["-r", "--requirement", "-c", "--constraint"];
const EDITABLE_FLAGS: &[&str] = &["-e", "--editable"];

/// Keep `value` if it names a filesystem path rather than a URL or VCS spec.
fn push_local<'a>(refs: &mut Vec<&'a str>, value: &'a str) {
    if value.contains("://") {
        return;
    }
    // `./pkg[extra]` installs the directory `./pkg`
    let path = value.split_once('[').map_or(value, |(p, _)| p);
    if !path.is_empty() {
        refs.push(path);
    }
}

/// `#` only starts a comment at line start or after whitespace.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}

fn parse_requirement(line: &str, line_no: usize) -> Result<Requirement, ManifestError> {
    let (spec, marker) = match line.split_once(';') {
        Some((spec, marker)) => (spec.trim(), Some(marker.trim().to_owned())),
        None => (line, None),
    };

    let name_len = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .unwrap_or(spec.len());
    let name = &spec[..name_len];

    let starts_alnum = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_alnum {
        return Err(ManifestError::MalformedRequirement {
            line: line_no,
            content: line.to_owned(),
        });
    }

    let mut rest = spec[name_len..].trim_start();
    let mut extras = Vec::new();
    if let Some(after) = rest.strip_prefix('[') {
        let close = after
            .find(']')
            .ok_or_else(|| ManifestError::UnterminatedExtras {
                line: line_no,
                content: line.to_owned(),
            })?;
        extras = after[..close]
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned)
            .collect();
        rest = after[close + 1..].trim_start();
    }

    let constraint = rest.trim();
    Ok(Requirement {
        name: name.to_owned(),
        extras,
        constraint: (!constraint.is_empty()).then(|| constraint.to_owned()),
        marker: marker.filter(|m| !m.is_empty()),
        line: line_no,
    })
}

fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_sep {
                out.push('-');
            }
            last_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        }
    }
    out
}
