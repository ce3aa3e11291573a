//! Loading [`SessionConfig`] from a JSON file.
//!
//! The file is optional; any field it leaves out keeps its default.
//!
//! ```json
//! { "starting_health": 5, "min_players": 3 }
//! ```

use standoff_session::SessionConfig;

use crate::StandoffError;

/// Parses a session config from JSON.
///
/// # Errors
/// [`StandoffError::ConfigParse`] for malformed JSON or unknown fields.
pub fn parse_session_config(
    json: &[u8],
) -> Result<SessionConfig, StandoffError> {
    serde_json::from_slice(json).map_err(StandoffError::ConfigParse)
}

/// Reads and parses a session config file.
///
/// # Errors
/// [`StandoffError::ConfigRead`] if the file can't be read, or
/// [`StandoffError::ConfigParse`] if its contents are invalid.
pub async fn load_session_config(
    path: &str,
) -> Result<SessionConfig, StandoffError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| {
        StandoffError::ConfigRead {
            path: path.to_string(),
            source,
        }
    })?;
    let config = parse_session_config(&bytes)?;
    tracing::info!(path, ?config, "loaded session config");
    Ok(config)
}
