// Classy Error Handling Module
// Errors raised by dispatch, with the member trace they crossed

use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Types of errors raised by the object model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    TypeError,
    AttributeError,
    ArgumentError,
    RuntimeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::AttributeError => write!(f, "AttributeError"),
            ErrorKind::ArgumentError => write!(f, "ArgumentError"),
            ErrorKind::RuntimeError => write!(f, "RuntimeError"),
        }
    }
}

/// A member activation crossed by an error on its way out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    pub member: String,
    pub class_name: Option<String>,
}

impl StackFrame {
    pub fn new(member: impl Into<String>, class_name: Option<&str>) -> Self {
        Self {
            member: member.into(),
            class_name: class_name.map(String::from),
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class_name {
            Some(class) => write!(f, "  at {}.{}", class, self.member),
            None => write!(f, "  at <anonymous class>.{}", self.member),
        }
    }
}

/// Main error type
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassyError {
    pub kind: ErrorKind,
    pub message: String,
    pub help: Option<String>,
    pub stack_trace: Vec<StackFrame>,
}

impl ClassyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            help: None,
            stack_trace: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        self.stack_trace.push(frame);
    }

    /// Render the error with its help line and the members it crossed,
    /// innermost first
    pub fn format(&self) -> String {
        self.render(cfg!(not(target_arch = "wasm32")))
    }

    /// Plain rendering, for logs and hosts without a terminal
    pub fn format_plain(&self) -> String {
        self.render(false)
    }

    fn render(&self, colorize: bool) -> String {
        let mut lines = vec![format!(
            "{}: {}",
            paint(colorize, &self.kind.to_string(), |t| t.red().bold().to_string()),
            paint(colorize, &self.message, |t| t.bold().to_string()),
        )];
        if let Some(help) = &self.help {
            lines.push(format!(
                "  {}: {}",
                paint(colorize, "help", |t| t.cyan().to_string()),
                help
            ));
        }
        lines.extend(self.stack_trace.iter().map(StackFrame::to_string));
        lines.join("\n")
    }
}

fn paint(colorize: bool, text: &str, style: fn(&str) -> String) -> String {
    if colorize {
        style(text)
    } else {
        text.to_string()
    }
}

/// Result type for object model operations
pub type ClassyResult<T> = Result<T, ClassyError>;

// Convenience constructors for common errors
impl ClassyError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AttributeError, message)
    }

    pub fn argument_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentError, message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_kind_and_message() {
        let err = ClassyError::attribute_error("no method 'm'");
        assert_eq!(err.to_string(), "AttributeError: no method 'm'");
    }

    #[test]
    fn test_frames_render_in_push_order() {
        let mut err = ClassyError::runtime_error("boom").with_help("check the body");
        err.push_frame(StackFrame::new("inner", Some("B")));
        err.push_frame(StackFrame::new("outer", None));

        let text = err.format_plain();
        let inner = text.find("at B.inner").unwrap();
        let outer = text.find("at <anonymous class>.outer").unwrap();
        assert!(inner < outer);
        assert!(text.starts_with("RuntimeError: boom\n  help: check the body"));
    }
}
