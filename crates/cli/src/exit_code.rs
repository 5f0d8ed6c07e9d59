//! Process exit codes
//!
//! Stable numeric codes so shell scripts can branch on the kind of
//! failure without parsing output.

use osc_core::Error;

/// Exit codes reported by the osc binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// Unspecified failure
    GeneralError = 1,
    /// Invalid arguments or configuration
    UsageError = 2,
    /// Network or server failure
    NetworkError = 3,
    /// Authentication or authorization failure
    AuthError = 4,
    /// Requested resource does not exist
    NotFound = 5,
}

impl ExitCode {
    /// Numeric value passed to `std::process::exit`
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::UsageError => "Usage or configuration error",
            ExitCode::NetworkError => "Network or server error",
            ExitCode::AuthError => "Authentication error",
            ExitCode::NotFound => "Not found",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error.exit_code() {
            2 => ExitCode::UsageError,
            3 => ExitCode::NetworkError,
            4 => ExitCode::AuthError,
            5 => ExitCode::NotFound,
            _ => ExitCode::GeneralError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::NetworkError.as_i32(), 3);
        assert_eq!(ExitCode::AuthError.as_i32(), 4);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
    }

    #[test]
    fn test_config_error_is_usage() {
        let error = Error::Config("bad chunk size".into());
        assert_eq!(ExitCode::from(&error), ExitCode::UsageError);
    }

    #[test]
    fn test_missing_profile_is_not_found() {
        let error = Error::ProfileNotFound("staging".into());
        assert_eq!(ExitCode::from(&error), ExitCode::NotFound);
    }

    #[test]
    fn test_transport_error_is_network() {
        let error = Error::Transport("connection refused".into());
        assert_eq!(ExitCode::from(&error), ExitCode::NetworkError);
    }

    #[test]
    fn test_protocol_status_mapping() {
        let denied = Error::Protocol {
            status: 403,
            body: String::new(),
        };
        assert_eq!(ExitCode::from(&denied), ExitCode::AuthError);

        let missing = Error::Protocol {
            status: 404,
            body: String::new(),
        };
        assert_eq!(ExitCode::from(&missing), ExitCode::NotFound);

        let server = Error::Protocol {
            status: 500,
            body: String::new(),
        };
        assert_eq!(ExitCode::from(&server), ExitCode::NetworkError);
    }

    #[test]
    fn test_display_includes_description() {
        assert_eq!(ExitCode::NotFound.to_string(), "5 (Not found)");
    }
}
