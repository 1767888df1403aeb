use super::{types::Config, SendMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The section matching `pacs.send_method` is present and usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.dispatcher.queue_size == 0 {
        return Err(ConfigError::ValidationError(
            "dispatcher.queue_size cannot be 0".to_string(),
        ));
    }

    match config.pacs.send_method {
        SendMethod::Wado => {
            let wado = config.pacs.wado.as_ref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "pacs.wado section is required when pacs.send_method is \"wado\"".to_string(),
                )
            })?;
            if wado.url.is_empty() {
                return Err(ConfigError::ValidationError(
                    "pacs.wado.url cannot be empty".to_string(),
                ));
            }
        }
        SendMethod::Dimse => {
            let dimse = config.pacs.dimse.as_ref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "pacs.dimse section is required when pacs.send_method is \"dimse\"".to_string(),
                )
            })?;
            if dimse.aet.is_empty() {
                return Err(ConfigError::ValidationError(
                    "pacs.dimse.aet cannot be empty".to_string(),
                ));
            }
            if dimse.host.is_empty() {
                return Err(ConfigError::ValidationError(
                    "pacs.dimse.host cannot be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}
