//! Config schema types (discord account, relay policy, circuits).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Deserializer, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectyConfig {
    pub discord: DiscordConfig,
    pub relay: RelayConfig,
    pub circuits: Vec<CircuitConfig>,
}

/// Discord bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Treat every author without a `#1234` discriminator as automated.
    ///
    /// Only useful for servers that still have pre-migration accounts; on
    /// current Discord it also drops ordinary users.
    pub legacy_discriminator_filter: bool,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field(
                "legacy_discriminator_filter",
                &self.legacy_discriminator_filter,
            )
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            legacy_discriminator_filter: false,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Global suppression switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Never re-post a message into the channel it came from.
    pub echo_suppression: bool,
    /// Never re-post the same message twice into one channel.
    pub duplicate_suppression: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            echo_suppression: true,
            duplicate_suppression: true,
        }
    }
}

/// One relay circuit: a set of channels whose traffic is mirrored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitConfig {
    /// Label used in logs and diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Channel ids, as numbers or strings.
    #[serde(deserialize_with = "deserialize_channel_ids")]
    pub channels: Vec<u64>,

    /// Relay every message to every other channel of the circuit.
    pub mirror: bool,

    /// Plain-text notice posted as the bot into each channel after setup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl CircuitConfig {
    /// Name for logs: the configured name, or the position in the list.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("circuits[{index}]"))
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            name: None,
            channels: Vec::new(),
            mirror: true,
            greeting: None,
        }
    }
}

/// Discord ids overflow JavaScript numbers, so JSON configs often quote them.
fn deserialize_channel_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Vec::<RawId>::deserialize(deserializer)?
        .into_iter()
        .map(|raw| match raw {
            RawId::Number(id) => Ok(id),
            RawId::Text(text) => text.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("invalid channel id: {text:?}"))
            }),
        })
        .collect()
}
