use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

/// HTTP method type, re-exported for use with error inspection.
pub use reqwest::Method;
/// HTTP status code type, re-exported for use with error inspection.
pub use reqwest::StatusCode;
use reqwest::header;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Error related to non-successful HTTP call
    Status,
    /// Error related to invalid input or invalid state within aerodb-client-sdk
    Validation,
    /// Operation requires a session (or refresh token) that the client does not hold
    Authentication,
    /// Internal error from dependencies
    Internal,
    /// Error related to WebSocket connections
    WebSocket,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Authentication {
            reason: message.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
            code: None,
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// A non-successful HTTP response.
///
/// `message` is the `error` field of a JSON error body when the server sent one,
/// otherwise the raw body text. `code` is the body's `code` field, if any.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
    pub code: Option<String>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )?;
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Authentication {
    pub reason: String,
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "authentication required: {}", self.reason)
    }
}

impl StdError for Authentication {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<header::InvalidHeaderValue> for Error {
    fn from(e: header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<header::InvalidHeaderName> for Error {
    fn from(e: header::InvalidHeaderName) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Authentication> for Error {
    fn from(err: Authentication) -> Self {
        Error::with_source(Kind::Authentication, err)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_code_when_present() {
        let status = Status {
            status_code: StatusCode::BAD_REQUEST,
            method: Method::POST,
            path: "/auth/signup".to_owned(),
            message: "Email already registered".to_owned(),
            code: Some("USER_EXISTS".to_owned()),
        };

        assert_eq!(
            status.to_string(),
            "error(400 Bad Request) making POST call to /auth/signup with Email already registered [USER_EXISTS]"
        );
    }

    #[test]
    fn authentication_into_error_should_succeed() {
        let error = Error::authentication("not authenticated");

        assert_eq!(error.kind(), Kind::Authentication);
        assert!(
            error.to_string().contains("not authenticated"),
            "unexpected display: {error}"
        );
        assert!(
            error.downcast_ref::<Authentication>().is_some(),
            "source should be Authentication"
        );
    }

    #[test]
    fn validation_into_error_should_succeed() {
        let error = Error::validation("url is required");

        assert_eq!(error.kind(), Kind::Validation);
        assert_eq!(error.to_string(), "Validation: invalid: url is required");
    }
}
