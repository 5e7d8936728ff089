// pgdump-core/src/domain/detection/arguments.rs

use crate::domain::configuration::ArgumentPattern;
use crate::domain::error::DomainError;
use regex::Regex;
use serde::Serialize;

/// Connection/dump options a pg_dump invocation almost always carries.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("long_host", r"(?i)--host[\s=]+[\d.]+"),
    ("long_port", r"(?i)--port[\s=]+\d+"),
    ("long_username", r"(?i)--username[\s=]+\w+"),
    ("long_dbname", r"(?i)--dbname[\s=]+\w+"),
    ("long_format", r"(?i)--format[\s=]+(custom|tar|plain)"),
    ("short_host", r"(?i)-h\s+[\d.]+"),
    ("short_port", r"(?i)-p\s+\d+"),
    ("short_username", r"(?i)-U\s+\w+"),
    ("short_dbname", r"(?i)-d\s+\w+"),
];

/// The Regex is compiled only once at initialization.
struct CompiledPattern {
    name: String,
    regex: Regex,
}

pub struct ArgumentScanner {
    patterns: Vec<CompiledPattern>,
}

impl ArgumentScanner {
    /// Compiles the built-in set plus any configured extras.
    /// A malformed extra pattern is a configuration error, not a scan-time one.
    pub fn new(extra: &[ArgumentPattern]) -> Result<Self, DomainError> {
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len() + extra.len());

        for (name, source) in BUILTIN_PATTERNS {
            patterns.push(compile(name, source)?);
        }
        for pattern in extra {
            patterns.push(compile(&pattern.name, &pattern.regex)?);
        }

        Ok(Self { patterns })
    }

    pub fn count_matches(&self, arguments: &str) -> usize {
        if arguments.is_empty() {
            return 0;
        }
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(arguments))
            .count()
    }

    pub fn matched_names<'a>(&'a self, arguments: &str) -> Vec<&'a str> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(arguments))
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(name: &str, source: &str) -> Result<CompiledPattern, DomainError> {
    let regex = Regex::new(source).map_err(|e| DomainError::InvalidPattern {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(CompiledPattern {
        name: name.to_string(),
        regex,
    })
}

/// Token level reading of a command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandLineAnalysis {
    pub likely_renamed: bool,
    pub has_host: bool,
    pub has_port: bool,
    pub has_user: bool,
    pub has_database: bool,
    pub has_format: bool,
    pub schema_only: bool,
    pub data_only: bool,
    pub all_databases: bool,
    pub output_to_file: bool,
    pub output_to_remote: bool,
    pub pattern_score: usize,
}

impl CommandLineAnalysis {
    pub fn analyze(
        command: &str,
        arguments: &str,
        pattern_score: usize,
        min_pattern_matches: usize,
    ) -> Self {
        let tokens: Vec<&str> = arguments.split_whitespace().collect();
        let command_lower = command.to_lowercase();

        Self {
            likely_renamed: !command_lower.contains("pg_dump")
                && pattern_score >= min_pattern_matches,
            has_host: has_option(&tokens, "--host", Some('h')),
            has_port: has_option(&tokens, "--port", Some('p')),
            has_user: has_option(&tokens, "--username", Some('U')),
            has_database: has_option(&tokens, "--dbname", Some('d')),
            has_format: has_option(&tokens, "--format", Some('F')),
            schema_only: has_option(&tokens, "--schema-only", Some('s')),
            data_only: has_option(&tokens, "--data-only", Some('a')),
            all_databases: command_lower.contains("pg_dumpall")
                || has_option(&tokens, "--all", None),
            output_to_file: arguments.contains('>') || has_option(&tokens, "--file", Some('f')),
            output_to_remote: tokens
                .iter()
                .any(|t| matches!(*t, "ssh" | "scp" | "rsync") || t.ends_with("/ssh")),
            pattern_score,
        }
    }
}

impl CommandLineAnalysis {
    /// What part of the cluster the invocation exports.
    pub fn dump_scope(&self) -> &'static str {
        if self.all_databases {
            "all-databases"
        } else if self.schema_only {
            "schema-only"
        } else if self.data_only {
            "data-only"
        } else {
            "full"
        }
    }
}

/// `--long`, `--long=value`, `-x`, `-xvalue`.
fn has_option(tokens: &[&str], long: &str, short: Option<char>) -> bool {
    tokens.iter().any(|t| {
        if *t == long || t.starts_with(&format!("{}=", long)) {
            return true;
        }
        match short {
            Some(c) => {
                !t.starts_with("--")
                    && t.len() >= 2
                    && t.starts_with('-')
                    && t[1..].starts_with(c)
            }
            None => false,
        }
    })
}
