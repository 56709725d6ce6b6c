//! Configuration validation.
//!
//! Flags unknown/misspelled keys and relay setups that would fail or do
//! something surprising at startup.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use {secrecy::ExposeSecret, serde_json::Value};

use crate::{
    env_subst::unresolved_vars,
    loader::{parse_config, parse_config_value},
    schema::ConnectyConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "env", "discord", "circuit", "policy"
    pub category: &'static str,
    /// Dotted path, e.g. "circuits[0].channels"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

const ROOT_KEYS: &[&str] = &["discord", "relay", "circuits"];
const DISCORD_KEYS: &[&str] = &["token", "legacy_discriminator_filter"];
const RELAY_KEYS: &[&str] = &["echo_suppression", "duplicate_suppression"];
const CIRCUIT_KEYS: &[&str] = &["name", "channels", "mirror", "greeting"];

/// Validate the file at `path`: syntax, unknown keys, unresolved env vars,
/// then the semantic checks of [`validate_config`].
pub fn validate_file(path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let result = |diagnostics| ValidationResult {
        diagnostics,
        config_path: Some(path.to_path_buf()),
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read {}: {e}", path.display()),
            ));
            return result(diagnostics);
        },
    };

    for name in unresolved_vars(&raw, |name| std::env::var(name).ok()) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "env",
            "",
            format!("environment variable {name} is not set"),
        ));
    }

    let expanded = crate::env_subst::substitute_env(&raw);
    match parse_config_value(&expanded, path) {
        Ok(tree) => check_unknown_fields(&tree, &mut diagnostics),
        Err(e) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", e.to_string()));
            return result(diagnostics);
        },
    }

    match parse_config(&expanded, path) {
        Ok(config) => diagnostics.extend(validate_config(&config)),
        Err(e) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", e.to_string()));
        },
    }

    result(diagnostics)
}

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut curr = vec![i + 1; b_chars.len() + 1];
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        prev = curr;
    }
    prev[b_chars.len()]
}

/// Closest known key within `max_distance` edits.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn check_table(
    value: &Value,
    known: &[&'static str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(table) = value.as_object() else {
        return;
    };
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let message = match suggest(key, known, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "unknown-field",
            path,
            message,
        ));
    }
}

fn check_unknown_fields(tree: &Value, diagnostics: &mut Vec<Diagnostic>) {
    check_table(tree, ROOT_KEYS, "", diagnostics);
    if let Some(discord) = tree.get("discord") {
        check_table(discord, DISCORD_KEYS, "discord", diagnostics);
    }
    if let Some(relay) = tree.get("relay") {
        check_table(relay, RELAY_KEYS, "relay", diagnostics);
    }
    if let Some(circuits) = tree.get("circuits").and_then(Value::as_array) {
        for (i, circuit) in circuits.iter().enumerate() {
            check_table(circuit, CIRCUIT_KEYS, &format!("circuits[{i}]"), diagnostics);
        }
    }
}

/// Semantic checks on a parsed config.
pub fn validate_config(config: &ConnectyConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let token = config.discord.token.expose_secret();
    if token.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "discord",
            "discord.token",
            "bot token is empty",
        ));
    } else if token.contains("${") {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "discord",
            "discord.token",
            "bot token still contains an unexpanded ${...} placeholder",
        ));
    }

    if config.discord.legacy_discriminator_filter {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "discord",
            "discord.legacy_discriminator_filter",
            "users migrated to unique usernames have no discriminator and will be ignored",
        ));
    }

    if config.circuits.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "circuit",
            "circuits",
            "no circuits configured, nothing will be relayed",
        ));
    }

    let mut owners: HashMap<u64, Vec<String>> = HashMap::new();
    for (i, circuit) in config.circuits.iter().enumerate() {
        let path = format!("circuits[{i}]");
        let label = circuit.label(i);

        if circuit.channels.is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "circuit",
                format!("{path}.channels"),
                format!("circuit {label} has no channels"),
            ));
        } else if circuit.channels.len() == 1 && circuit.mirror {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "circuit",
                format!("{path}.channels"),
                format!("circuit {label} has a single channel, mirroring has nowhere to go"),
            ));
        }

        let mut seen = HashSet::new();
        for &channel in &circuit.channels {
            if channel == 0 {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "circuit",
                    format!("{path}.channels"),
                    "0 is not a valid channel id",
                ));
                continue;
            }
            if !seen.insert(channel) {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "circuit",
                    format!("{path}.channels"),
                    format!("channel {channel} is listed twice in circuit {label}"),
                ));
                continue;
            }
            owners.entry(channel).or_default().push(label.clone());
        }

        if circuit
            .greeting
            .as_deref()
            .is_some_and(|greeting| greeting.trim().is_empty())
        {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "circuit",
                format!("{path}.greeting"),
                "greeting is empty, Discord rejects empty messages",
            ));
        }
    }

    let mut shared: Vec<_> = owners
        .into_iter()
        .filter(|(_, circuits)| circuits.len() > 1)
        .collect();
    shared.sort_unstable_by_key(|(channel, _)| *channel);
    for (channel, circuits) in shared {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "circuit",
            "circuits",
            format!(
                "channel {channel} belongs to {}, each will relay its messages",
                circuits.join(", ")
            ),
        ));
    }

    let mirrors = config.circuits.iter().any(|c| c.mirror);
    if !config.relay.echo_suppression && mirrors {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "policy",
            "relay.echo_suppression",
            "echo suppression is off, mirrored messages are re-posted into their own channel",
        ));
    }
    if !config.relay.duplicate_suppression {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "policy",
            "relay.duplicate_suppression",
            "duplicate suppression is off, replayed gateway events are relayed again",
        ));
    }

    diagnostics
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::{CircuitConfig, DiscordConfig},
        secrecy::Secret,
    };

    fn valid() -> ConnectyConfig {
        ConnectyConfig {
            discord: DiscordConfig {
                token: Secret::new("abc.def".into()),
                ..Default::default()
            },
            circuits: vec![CircuitConfig {
                channels: vec![100, 200],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn paths(diagnostics: &[Diagnostic], severity: Severity) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.path.as_str())
            .collect()
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("mirror", "mirror"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("mirorr", "mirror"), 2);
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        assert!(validate_config(&valid()).is_empty());
    }

    #[test]
    fn empty_token_is_error() {
        let mut cfg = valid();
        cfg.discord.token = Secret::new(String::new());
        assert_eq!(paths(&validate_config(&cfg), Severity::Error), vec![
            "discord.token"
        ]);
    }

    #[test]
    fn unexpanded_token_is_error() {
        let mut cfg = valid();
        cfg.discord.token = Secret::new("${DISCORD_TOKEN}".into());
        assert_eq!(paths(&validate_config(&cfg), Severity::Error), vec![
            "discord.token"
        ]);
    }

    #[test]
    fn circuit_problems() {
        let mut cfg = valid();
        cfg.circuits = vec![
            CircuitConfig {
                channels: vec![],
                ..Default::default()
            },
            CircuitConfig {
                channels: vec![300],
                ..Default::default()
            },
            CircuitConfig {
                channels: vec![400, 0, 400],
                ..Default::default()
            },
        ];
        let diagnostics = validate_config(&cfg);
        assert_eq!(paths(&diagnostics, Severity::Error), vec![
            "circuits[0].channels",
            "circuits[2].channels",
            "circuits[2].channels",
        ]);
        assert_eq!(paths(&diagnostics, Severity::Warning), vec![
            "circuits[1].channels"
        ]);
    }

    #[test]
    fn single_channel_without_mirror_is_fine() {
        let mut cfg = valid();
        cfg.circuits[0].channels = vec![100];
        cfg.circuits[0].mirror = false;
        assert!(validate_config(&cfg).is_empty());
    }

    #[test]
    fn shared_channel_is_reported() {
        let mut cfg = valid();
        cfg.circuits.push(CircuitConfig {
            name: Some("ops".into()),
            channels: vec![200, 300],
            ..Default::default()
        });
        let diagnostics = validate_config(&cfg);
        let warnings: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("circuits[0], ops"));
    }

    #[test]
    fn echo_off_warns_only_with_mirroring() {
        let mut cfg = valid();
        cfg.relay.echo_suppression = false;
        assert_eq!(paths(&validate_config(&cfg), Severity::Warning), vec![
            "relay.echo_suppression"
        ]);

        cfg.circuits[0].mirror = false;
        assert!(validate_config(&cfg).is_empty());
    }

    #[test]
    fn unknown_keys_get_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connecty.toml");
        std::fs::write(
            &path,
            r#"
            [discord]
            token = "abc.def"

            [relay]
            echo_supression = false

            [[circuits]]
            channels = [1, 2]
            mirorr = true
            "#,
        )
        .unwrap();

        let result = validate_file(&path);
        let unknown: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.category == "unknown-field")
            .collect();
        assert_eq!(unknown.len(), 2);
        assert_eq!(unknown[0].path, "relay.echo_supression");
        assert!(unknown[0].message.contains("echo_suppression"));
        assert_eq!(unknown[1].path, "circuits[0].mirorr");
        assert!(!result.has_errors());
    }

    #[test]
    fn syntax_error_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connecty.toml");
        std::fs::write(&path, "[discord\ntoken = ").unwrap();

        let result = validate_file(&path);
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn unset_env_var_is_warned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connecty.toml");
        std::fs::write(
            &path,
            "[discord]\ntoken = \"${CONNECTY_TEST_SURELY_UNSET}\"\n[[circuits]]\nchannels = [1, 2]\n",
        )
        .unwrap();

        let result = validate_file(&path);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "env" && d.message.contains("CONNECTY_TEST_SURELY_UNSET"))
        );
        // The placeholder survives expansion, so the token check fires too.
        assert!(result.has_errors());
    }
}
