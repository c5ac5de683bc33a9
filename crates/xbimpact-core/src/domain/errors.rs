use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ImpactResult<T> = Result<T, ImpactError>;
pub type StageResult<T> = ImpactResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactErrorCategory {
    Success,
    ShapeMismatch,
    ConfigurationError,
    StepUnavailable,
    IoSystemError,
    InternalError,
}

impl ImpactErrorCategory {
    pub const fn exit_policy(self) -> ExitPolicy {
        match self {
            Self::Success => ExitPolicy {
                exit_code: 0,
                category_name: "Success",
                fatal: false,
            },
            Self::ConfigurationError => ExitPolicy {
                exit_code: 2,
                category_name: "ConfigurationError",
                fatal: true,
            },
            Self::IoSystemError => ExitPolicy {
                exit_code: 3,
                category_name: "IoSystemError",
                fatal: true,
            },
            Self::ShapeMismatch => ExitPolicy {
                exit_code: 4,
                category_name: "ShapeMismatch",
                fatal: true,
            },
            Self::InternalError => ExitPolicy {
                exit_code: 5,
                category_name: "InternalError",
                fatal: true,
            },
            // Recorded per step and counted; never aborts a run.
            Self::StepUnavailable => ExitPolicy {
                exit_code: 0,
                category_name: "StepUnavailable",
                fatal: false,
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_policy().exit_code
    }

    pub const fn category_name(self) -> &'static str {
        self.exit_policy().category_name
    }

    pub const fn is_fatal(self) -> bool {
        self.exit_policy().fatal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPolicy {
    pub exit_code: i32,
    pub category_name: &'static str,
    pub fatal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactError {
    category: ImpactErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ImpactError {
    pub fn new(
        category: ImpactErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn shape_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImpactErrorCategory::ShapeMismatch, placeholder, message)
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImpactErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn step_unavailable(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImpactErrorCategory::StepUnavailable, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImpactErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ImpactErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ImpactErrorCategory {
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

    pub const fn is_fatal(&self) -> bool {
        self.category.is_fatal()
    }

    /// Re-tags any error as a recoverable per-step failure, keeping its message.
    pub fn into_step_unavailable(self, placeholder: &'static str) -> Self {
        Self::step_unavailable(placeholder, self.message)
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "WARNING"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for ImpactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.category_name(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for ImpactError {}

#[cfg(test)]
mod tests {
    use super::{ImpactError, ImpactErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (ImpactErrorCategory::Success, 0, "Success", false),
            (ImpactErrorCategory::ConfigurationError, 2, "ConfigurationError", true),
            (ImpactErrorCategory::IoSystemError, 3, "IoSystemError", true),
            (ImpactErrorCategory::ShapeMismatch, 4, "ShapeMismatch", true),
            (ImpactErrorCategory::InternalError, 5, "InternalError", true),
            (ImpactErrorCategory::StepUnavailable, 0, "StepUnavailable", false),
        ];

        for (category, exit_code, name, fatal) in cases {
            let policy = category.exit_policy();
            assert_eq!(policy.exit_code, exit_code);
            assert_eq!(policy.category_name, name);
            assert_eq!(policy.fatal, fatal);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = ImpactError::configuration(
            "CONFIG.REFERENCE_ROWS",
            "4 reference points for 5 mesh rows",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.REFERENCE_ROWS] 4 reference points for 5 mesh rows"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 2")
        );
    }

    #[test]
    fn step_unavailable_is_recoverable() {
        let error = ImpactError::io_system("IO.GRID_READ", "missing zb_0004.grd")
            .into_step_unavailable("STEP.BED_READ");

        assert_eq!(error.category(), ImpactErrorCategory::StepUnavailable);
        assert_eq!(error.placeholder(), "STEP.BED_READ");
        assert_eq!(error.message(), "missing zb_0004.grd");
        assert!(!error.is_fatal());
        assert!(error.fatal_exit_line().is_none());
        assert!(error.diagnostic_line().starts_with("WARNING: "));
    }
}
