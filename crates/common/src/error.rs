use thiserror::Error;

use crate::RejectionReason;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Signal rejected: {reason}")]
    SignalRejected { reason: RejectionReason },

    #[error("Invalid window policy: {0}")]
    InvalidPolicy(String),

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RejectionReason> for Error {
    fn from(reason: RejectionReason) -> Self {
        Error::SignalRejected { reason }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reason_converts_into_signal_rejected() {
        let err: Error = RejectionReason::EmptySymbol.into();
        assert!(matches!(
            err,
            Error::SignalRejected {
                reason: RejectionReason::EmptySymbol
            }
        ));
        assert_eq!(err.to_string(), "Signal rejected: symbol must not be empty");
    }

    #[test]
    fn outer_crate_errors_name_their_source() {
        assert!(Error::PriceFeed("down".into()).to_string().starts_with("Price feed error"));
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        assert!(Error::from(toml_err).to_string().starts_with("TOML error"));
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io_err).to_string(), "IO error: missing");
    }
}
