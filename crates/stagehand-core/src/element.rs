use std::fmt;

use crate::identity::IdentityToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// One piece of content written into a render slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(String),
    Notice {
        level: NoticeLevel,
        message: String,
    },
    Widget {
        token: IdentityToken,
        label: String,
    },
    Error {
        message: String,
        detail: Option<String>,
    },
}

impl Element {
    pub fn text(text: impl Into<String>) -> Self {
        Element::Text(text.into())
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Element::Notice {
            level,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Element::Error { .. })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Text(text) => write!(f, "{text}"),
            Element::Notice { level, message } => write!(f, "[{level:?}] {message}"),
            Element::Widget { token, label } => write!(f, "<{label}> #{token}"),
            Element::Error { message, detail } => match detail {
                Some(detail) => write!(f, "ERROR {message} ({detail})"),
                None => write!(f, "ERROR {message}"),
            },
        }
    }
}
