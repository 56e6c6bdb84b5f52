//! Utilities to parse and validate Discord bot tokens.

use std::{fmt, str};

use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::model::id::ApplicationId;

const TOKEN_PART: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Validates that a token is likely in a valid format.
///
/// This performs the following checks on a given token:
///
/// - Is not empty;
/// - Contains 3 parts (split by the period char `'.'`);
/// - The first part decodes into the bot's id;
///
/// # Examples
///
/// ```
/// use tempest::utils::token::validate;
///
/// assert!(validate("Mjg4NzYwMjQxMzYzODc3ODg4.C_ikow.j3VupLBuE1QWZng3TMGH0z_UAwg").is_ok());
///
/// assert!(validate("Mjg4NzYwMjQxMzYzODc3ODg4").is_err());
/// assert!(validate("").is_err());
/// ```
///
/// # Errors
///
/// Returns a [`InvalidToken`] when one of the above checks fail.
/// The type of failure is not specified.
pub fn validate(token: impl AsRef<str>) -> Result<(), InvalidToken> {
    let token = token.as_ref().trim_start_matches("Bot ");
    if token.split('.').count() != 3 {
        return Err(InvalidToken);
    }

    parse_application_id(token).map(|_| ()).ok_or(InvalidToken)
}

/// Error that can be return by [`validate`].
#[derive(Debug)]
pub struct InvalidToken;

impl std::error::Error for InvalidToken {}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("The provided token was invalid")
    }
}

/// Extracts the application id from a bot token.
///
/// The first part of a token is the bot user's id, base64 encoded, which for bots is the same as
/// their application's id.
#[must_use]
pub fn parse_application_id(token: impl AsRef<str>) -> Option<ApplicationId> {
    let first = token.as_ref().trim_start_matches("Bot ").split('.').next()?;
    let decoded = TOKEN_PART.decode(first).ok()?;
    let id = str::from_utf8(&decoded).ok()?.parse().ok()?;

    Some(ApplicationId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_id_from_token() {
        let token = "Mjg4NzYwMjQxMzYzODc3ODg4.C_ikow.j3VupLBuE1QWZng3TMGH0z_UAwg";

        assert_eq!(parse_application_id(token), Some(ApplicationId::new(288760241363877888)));
        assert_eq!(
            parse_application_id(format!("Bot {token}")),
            Some(ApplicationId::new(288760241363877888))
        );
        assert_eq!(parse_application_id("not-base64!.x.y"), None);
        assert_eq!(parse_application_id(""), None);
    }
}
