// src/args/descriptor.rs

use crate::types::ParameterType;

/// One parameter of a module's schema, as far as the command line is
/// concerned.
///
/// A parameter is either positional (`index`) or flagged (`flag` and/or
/// `long_flag`), never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub index: Option<usize>,
    pub flag: Option<String>,
    pub long_flag: Option<String>,
    pub kind: ParameterType,
    pub multiple: bool,
}

impl ParameterDescriptor {
    /// A flagged parameter without any flag set yet.
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            index: None,
            flag: None,
            long_flag: None,
            kind,
            multiple: false,
        }
    }

    /// A positional parameter.
    pub fn indexed(name: impl Into<String>, index: usize, kind: ParameterType) -> Self {
        Self {
            index: Some(index),
            ..Self::new(name, kind)
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn with_long_flag(mut self, long_flag: impl Into<String>) -> Self {
        self.long_flag = Some(long_flag.into());
        self
    }

    pub fn allow_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// The flag token to put on the command line, preferring the long form.
    ///
    /// Leading dashes in the declared flags are ignored, so `"sigma"`,
    /// `"-sigma"` and `"--sigma"` all render as `--sigma`.
    pub fn flag_token(&self) -> Option<String> {
        let long = self
            .long_flag
            .as_deref()
            .map(|f| f.trim().trim_start_matches('-'))
            .filter(|f| !f.is_empty());
        if let Some(long) = long {
            return Some(format!("--{long}"));
        }

        self.flag
            .as_deref()
            .map(|f| f.trim().trim_start_matches('-'))
            .filter(|f| !f.is_empty())
            .map(|short| format!("-{short}"))
    }
}
