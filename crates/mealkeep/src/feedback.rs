/// Per-record outcome messages collected while a batch operation runs.
///
/// Migration steps and sync passes accumulate these inside their
/// reports instead of printing, so the CLI decides what reaches the
/// terminal and library consumers can log or drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Info(String),
    Warning(String),
    Error(String),
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(m) | Self::Warning(m) | Self::Error(m) => m,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(m) => f.write_str(m),
            Self::Warning(m) => write!(f, "warning: {m}"),
            Self::Error(m) => write!(f, "error: {m}"),
        }
    }
}
