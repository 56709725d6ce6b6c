use std::{path::Path, sync::Arc};

use {
    anyhow::Result,
    connecty_config::{CircuitConfig, ConnectyConfig, Severity, load_config, validate_config},
    connecty_relay::{ChannelId, Payload, RelayPolicy, RelayService},
    tracing::{debug, error, info, warn},
};

pub async fn handle_run(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "using config file");
            load_config(path)?
        },
        None => {
            warn!("no config file found, using defaults");
            ConnectyConfig::default()
        },
    };

    let mut errors = 0;
    for d in validate_config(&config) {
        match d.severity {
            Severity::Error => {
                errors += 1;
                error!(path = %d.path, "{}", d.message);
            },
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => debug!(path = %d.path, "{}", d.message),
        }
    }
    if errors > 0 {
        anyhow::bail!("invalid configuration ({errors} error(s)), see `connecty check`");
    }

    let service = Arc::new(build_service(&config));
    connecty_discord::run(
        &config.discord.token,
        service,
        config.discord.legacy_discriminator_filter,
    )
    .await
}

/// Service with the configured policy and a setup routine for every circuit.
fn build_service(config: &ConnectyConfig) -> RelayService {
    let service = RelayService::with_policy(RelayPolicy::new(
        config.relay.echo_suppression,
        config.relay.duplicate_suppression,
    ));
    let circuits = config.circuits.clone();
    service.configure(move |service| setup_circuits(service, circuits));
    service
}

async fn setup_circuits(
    service: Arc<RelayService>,
    circuits: Vec<CircuitConfig>,
) -> connecty_relay::Result<()> {
    for (index, circuit) in circuits.iter().enumerate() {
        let label = circuit.label(index);
        let ids: Vec<ChannelId> = circuit.channels.iter().copied().map(ChannelId::from).collect();

        let group = service.register(&ids).await.inspect_err(|e| {
            error!(circuit = %label, error = %e, "failed to register circuit");
        })?;
        if circuit.mirror {
            group.mirror();
        }
        if let Some(greeting) = &circuit.greeting {
            group
                .forward(&Payload::Text(greeting.clone()))
                .await
                .inspect_err(|e| {
                    error!(circuit = %label, error = %e, "failed to send circuit greeting");
                })?;
        }
        info!(
            circuit = %label,
            channels = ids.len(),
            mirror = circuit.mirror,
            "circuit registered"
        );
    }
    Ok(())
}
