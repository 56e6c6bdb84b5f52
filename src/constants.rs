//! A set of constants used by the library.

/// The Discord API version the library talks to.
pub const API_VERSION: u8 = 10;

/// The [UserAgent] sent along with every request.
///
/// [UserAgent]: ::reqwest::header::USER_AGENT
pub const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/tempest-rs/tempest, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// The header carrying the hex encoded Ed25519 signature of an interaction request.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";

/// The header carrying the timestamp that was signed together with the request body.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// The body sent back for Discord's liveness pings.
pub const PONG_BODY: &str = r#"{"type":1}"#;

/// An interaction token stops being usable for webhook calls after this long.
pub const INTERACTION_TOKEN_LIFETIME: std::time::Duration = std::time::Duration::from_secs(15 * 60);

/// The maximum amount of options a command or an option may carry.
pub const COMMAND_OPTIONS_LIMIT: usize = 25;

/// The maximum amount of choices an option or an autocomplete suggestion may carry.
pub const COMMAND_CHOICES_LIMIT: usize = 25;

/// The maximum length of a command or option description.
pub const COMMAND_DESCRIPTION_MAX_LENGTH: usize = 100;
