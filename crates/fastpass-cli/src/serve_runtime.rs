use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fastpass_access::{IdentityStateFile, IdentityStore, PrivilegeGuard};
use fastpass_core::{MessageSender, UserId};
use fastpass_dispatch::{
    AutoReplyFlag, CommandRouter, Dispatcher, DispatchTexts, KeywordCatalog,
    NotificationForwarder, RouterConfig, TermsConfig,
};
use fastpass_line::{run_line_webhook_server, LineMessagingClient, LineWebhookConfig};
use tokio::task::JoinHandle;

use crate::cli_args::Cli;

/// Settings resolved from the command line, with secrets checked.
#[derive(Debug)]
pub(crate) struct ServeSettings {
    pub(crate) bind: String,
    pub(crate) access_token: String,
    pub(crate) channel_secret: String,
    pub(crate) operator: UserId,
    pub(crate) router_config: RouterConfig,
    pub(crate) manager_ids: Vec<String>,
}

pub(crate) fn resolve_serve_settings(cli: &Cli) -> Result<ServeSettings> {
    let access_token = required_secret(
        cli.line_channel_access_token.as_deref(),
        "--line-channel-access-token (LINE_CHANNEL_ACCESS_TOKEN)",
    )?;
    let channel_secret = required_secret(
        cli.line_channel_secret.as_deref(),
        "--line-channel-secret (LINE_CHANNEL_SECRET)",
    )?;
    let operator = cli.operator_user_id.trim();
    if operator.is_empty() {
        bail!("--operator-user-id (BOSS_USER_ID) cannot be empty");
    }
    let terms_version = cli.terms_version.trim();
    if terms_version.is_empty() {
        bail!("--terms-version cannot be empty");
    }
    let keywords = match cli.keyword_catalog.as_deref() {
        Some(path) => KeywordCatalog::load(path)?,
        None => KeywordCatalog::builtin(),
    };
    if keywords.is_empty() {
        tracing::warn!(
            "keyword catalog has no entries; only commands and the away reply will answer"
        );
    }

    // The operator always holds manager privileges.
    let mut manager_ids = vec![operator.to_string()];
    manager_ids.extend(cli.manager_user_ids.iter().cloned());

    Ok(ServeSettings {
        bind: cli.bind.clone(),
        access_token,
        channel_secret,
        operator: UserId::new(operator),
        router_config: RouterConfig {
            terms: TermsConfig {
                version: terms_version.to_string(),
                document_url: cli.terms_url.trim().to_string(),
            },
            texts: DispatchTexts::default(),
            keywords,
        },
        manager_ids,
    })
}

fn required_secret(value: Option<&str>, name: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => bail!("{name} is required"),
    }
}

/// A zero capacity turns operator forwarding off.
pub(crate) fn start_forwarder(
    sender: Arc<dyn MessageSender>,
    operator: UserId,
    capacity: usize,
) -> (NotificationForwarder, Option<JoinHandle<()>>) {
    if capacity == 0 {
        tracing::info!("operator forwarding disabled");
        return (NotificationForwarder::disabled(), None);
    }
    let (forwarder, worker) = NotificationForwarder::spawn(sender, operator, capacity);
    (forwarder, Some(worker))
}

pub(crate) async fn run_serve(cli: Cli) -> Result<()> {
    let settings = resolve_serve_settings(&cli)?;
    let identity = Arc::new(IdentityStore::open(IdentityStateFile::for_state_dir(
        &cli.state_dir,
    ))?);
    let guard = PrivilegeGuard::new(settings.manager_ids.iter().map(String::as_str));
    let identity_snapshot = identity.snapshot();
    let manager_count = guard.manager_count();
    let router = Arc::new(CommandRouter::new(
        identity,
        guard,
        Arc::new(AutoReplyFlag::default()),
        &settings.router_config,
    ));

    let client = LineMessagingClient::new(
        &cli.line_api_base,
        &settings.access_token,
        cli.line_request_timeout_ms,
    )
    .context("failed to initialize LINE messaging client")?;
    let sender: Arc<dyn MessageSender> = Arc::new(client);
    let (forwarder, forward_worker) = start_forwarder(
        sender.clone(),
        settings.operator.clone(),
        cli.forward_queue_capacity,
    );
    let dispatcher = Dispatcher::new(router, sender, forwarder);

    tracing::info!(
        operator = %settings.operator,
        managers = manager_count,
        consented_users = identity_snapshot.consented_users,
        submitted_users = identity_snapshot.submitted_users,
        persistent = identity_snapshot.persistent,
        terms_version = settings.router_config.terms.version.as_str(),
        keywords = settings.router_config.keywords.len(),
        state_dir = %cli.state_dir.display(),
        "fastpass dispatcher starting"
    );

    let result = run_line_webhook_server(
        LineWebhookConfig {
            bind: settings.bind,
            channel_secret: settings.channel_secret,
        },
        dispatcher,
    )
    .await;
    // The server owned the last forwarder handle; let queued notices drain.
    if let Some(worker) = forward_worker {
        if let Err(error) = worker.await {
            tracing::warn!(error = %error, "operator forwarding task ended abnormally");
        }
    }
    result
}
