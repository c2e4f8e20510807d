use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The request did not finish in time.
    TimedOut,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::TimedOut => write!(f, "Timed out"),
            ErrorKind::Other => write!(f, "Other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_displays() {
        let kinds = [
            ErrorKind::RateLimitExceeded,
            ErrorKind::TimedOut,
            ErrorKind::Other,
        ];
        let shown: Vec<_> = kinds.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["Rate limit exceeded", "Timed out", "Other"]);
    }
}
