use thiserror::Error;

/// Errors raised while building [`crate::Settings`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue { var: &'static str, value: String, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::ConfigError;

    #[test]
    fn error_display_names_variable() {
        let e = ConfigError::InvalidValue {
            var: "DMSGUI_VERSION",
            value: "v".to_owned(),
            reason: "version must not be empty",
        };
        assert_eq!(e.to_string(), "invalid value for DMSGUI_VERSION: \"v\" (version must not be empty)");
    }
}
