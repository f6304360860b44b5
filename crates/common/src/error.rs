use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error types buildable from a message, so [`impl_context!`] can wrap
/// foreign errors in them.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Defines a local `Context` trait adding `.context()` / `.with_context()`
/// to `Result<T, E: Display>` and `Option<T>`. Failures become
/// `Error::from_message("<context>: <source>")`.
///
/// The calling module must have `Error: FromMessage` and a `Result<T>` alias
/// in scope:
///
/// ```ignore
/// docpilot_common::impl_context!();
///
/// let doc = Document::load(path).with_context(|| format!("loading {}", path.display()))?;
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T>: Sized {
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;

            fn context(self, context: impl Into<String>) -> Result<T> {
                self.with_context(|| context)
            }
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    let prefix: String = f().into();
                    <Error as $crate::FromMessage>::from_message(format!("{prefix}: {source}"))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    mod ctx {
        use super::Error;

        pub type Result<T> = std::result::Result<T, Error>;

        crate::impl_context!();
    }

    use ctx::Context;

    #[test]
    fn context_prefixes_source_message() {
        let res: std::result::Result<(), String> = Err("boom".into());
        let err = res.context("loading deck").unwrap_err();
        assert_eq!(err.to_string(), "loading deck: boom");
    }

    #[test]
    fn ok_values_pass_through() {
        let res: std::result::Result<u8, String> = Ok(7);
        assert_eq!(res.context("unused").unwrap(), 7);
        assert_eq!(Some(3).context("unused").unwrap(), 3);
    }

    #[test]
    fn message_constructor() {
        assert_eq!(Error::message("sheet missing").to_string(), "sheet missing");
    }

    #[test]
    fn option_context_uses_message() {
        let missing: Option<u8> = None;
        let err = missing.with_context(|| "no sheet named Data").unwrap_err();
        assert!(matches!(err, Error::Message(ref m) if m == "no sheet named Data"));
    }
}
