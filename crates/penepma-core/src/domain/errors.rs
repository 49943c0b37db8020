use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PenelopeResult<T> = Result<T, PenelopeError>;
pub type ExportResult<T> = PenelopeResult<T>;
pub type ImportResult<T> = PenelopeResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenelopeErrorCategory {
    Success,
    InputValidationError,
    FormatLimitExceeded,
    ImporterError,
    IoSystemError,
    InternalError,
}

impl PenelopeErrorCategory {
    pub const fn exit_placeholder(self) -> ExitPlaceholder {
        match self {
            Self::Success => ExitPlaceholder {
                exit_code: 0,
                rust_category: "Success",
                class: "SUCCESS",
            },
            Self::InputValidationError => ExitPlaceholder {
                exit_code: 2,
                rust_category: "InputValidationError",
                class: "INPUT_FATAL",
            },
            Self::FormatLimitExceeded => ExitPlaceholder {
                exit_code: 3,
                rust_category: "FormatLimitExceeded",
                class: "FORMAT_FATAL",
            },
            Self::ImporterError => ExitPlaceholder {
                exit_code: 4,
                rust_category: "ImporterError",
                class: "IMPORT_FATAL",
            },
            Self::IoSystemError => ExitPlaceholder {
                exit_code: 5,
                rust_category: "IoSystemError",
                class: "IO_FATAL",
            },
            Self::InternalError => ExitPlaceholder {
                exit_code: 6,
                rust_category: "InternalError",
                class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_placeholder().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_placeholder().rust_category
    }

    pub const fn class(self) -> &'static str {
        self.exit_placeholder().class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPlaceholder {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenelopeError {
    category: PenelopeErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl PenelopeError {
    pub fn new(
        category: PenelopeErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            PenelopeErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn format_limit(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PenelopeErrorCategory::FormatLimitExceeded, placeholder, message)
    }

    pub fn importer(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PenelopeErrorCategory::ImporterError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PenelopeErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PenelopeErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> PenelopeErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for PenelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for PenelopeError {}
