use std::path::PathBuf;

use clap::Parser;
use fastpass_dispatch::{DEFAULT_FORWARD_QUEUE_CAPACITY, DEFAULT_TERMS_URL, DEFAULT_TERMS_VERSION};
use fastpass_line::{DEFAULT_LINE_API_BASE, DEFAULT_LINE_REQUEST_TIMEOUT_MS, DEFAULT_LINE_WEBHOOK_BIND};

pub(crate) const DEFAULT_OPERATOR_USER_ID: &str = "U016da51eeb42b435ebe3a22442c97bb1";

#[derive(Debug, Parser)]
#[command(
    name = "fastpass",
    about = "Consent-gated LINE chat dispatcher for FastPass ticket services",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "bind",
        env = "FASTPASS_BIND",
        default_value = DEFAULT_LINE_WEBHOOK_BIND,
        help = "Address the LINE webhook server listens on"
    )]
    pub(crate) bind: String,

    #[arg(
        long = "line-channel-access-token",
        env = "LINE_CHANNEL_ACCESS_TOKEN",
        hide_env_values = true,
        help = "LINE Messaging API channel access token used for reply and push calls"
    )]
    pub(crate) line_channel_access_token: Option<String>,

    #[arg(
        long = "line-channel-secret",
        env = "LINE_CHANNEL_SECRET",
        hide_env_values = true,
        help = "LINE channel secret used to verify x-line-signature on webhook deliveries"
    )]
    pub(crate) line_channel_secret: Option<String>,

    #[arg(
        long = "line-api-base",
        env = "FASTPASS_LINE_API_BASE",
        default_value = DEFAULT_LINE_API_BASE,
        help = "Base URL for the LINE Messaging API"
    )]
    pub(crate) line_api_base: String,

    #[arg(
        long = "line-request-timeout-ms",
        env = "FASTPASS_LINE_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_LINE_REQUEST_TIMEOUT_MS,
        help = "Timeout in milliseconds for each outbound LINE API call"
    )]
    pub(crate) line_request_timeout_ms: u64,

    #[arg(
        long = "operator-user-id",
        env = "BOSS_USER_ID",
        default_value = DEFAULT_OPERATOR_USER_ID,
        help = "LINE user id that receives forwarded messages; always treated as a manager"
    )]
    pub(crate) operator_user_id: String,

    #[arg(
        long = "manager-user-ids",
        env = "FASTPASS_MANAGER_USER_IDS",
        value_delimiter = ',',
        help = "Additional LINE user ids allowed to run privileged commands (comma-separated)"
    )]
    pub(crate) manager_user_ids: Vec<String>,

    #[arg(
        long = "state-dir",
        env = "FASTPASS_STATE_DIR",
        default_value = ".fastpass",
        help = "Directory holding identity-state.json (consent and order-form records)"
    )]
    pub(crate) state_dir: PathBuf,

    #[arg(
        long = "terms-version",
        env = "FASTPASS_TERMS_VERSION",
        default_value = DEFAULT_TERMS_VERSION,
        help = "Terms version appended to the consent phrase"
    )]
    pub(crate) terms_version: String,

    #[arg(
        long = "terms-url",
        env = "FASTPASS_TERMS_URL",
        default_value = DEFAULT_TERMS_URL,
        help = "URL of the terms document linked from the consent prompt"
    )]
    pub(crate) terms_url: String,

    #[arg(
        long = "keyword-catalog",
        env = "FASTPASS_KEYWORD_CATALOG",
        help = "Optional TOML keyword catalog replacing the built-in keyword replies"
    )]
    pub(crate) keyword_catalog: Option<PathBuf>,

    #[arg(
        long = "forward-queue-capacity",
        env = "FASTPASS_FORWARD_QUEUE_CAPACITY",
        default_value_t = DEFAULT_FORWARD_QUEUE_CAPACITY,
        help = "Maximum pending operator notifications before new ones are dropped; 0 disables forwarding"
    )]
    pub(crate) forward_queue_capacity: usize,
}
