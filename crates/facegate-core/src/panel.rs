//! Text rendered into a details panel.

use std::fmt;

pub const NO_FACE: &str = "No face detected.";
pub const NOT_RECOGNIZED: &str = "Face not recognized.";
pub const PLEASE_BLINK: &str = "Please blink to confirm liveness.";
pub const ENTRY_DENIED: &str = "ENTRY DENIED! Vehicle Not Found!";

/// What a panel shows: a status line or a record as ordered labeled fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelContent {
    Text(String),
    Fields(Vec<(&'static str, String)>),
}

impl PanelContent {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn no_details(label: &str) -> Self {
        Self::Text(format!("No details found for {label}"))
    }
}

impl fmt::Display for PanelContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Fields(fields) => {
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                Ok(())
            }
        }
    }
}
