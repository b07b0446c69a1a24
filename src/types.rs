// src/types.rs

//! Small shared vocabulary types: parameter type tags and process outcome
//! enums.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Type tag of a module parameter, as declared by the module's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Boolean,
    Integer,
    Float,
    Double,
    String,
    File,
    Directory,
    Image,
    Geometry,
    Transform,
    Table,
    Measurement,
    Point,
    Region,
    IntegerVector,
    FloatVector,
    DoubleVector,
    StringVector,
    IntegerEnumeration,
    FloatEnumeration,
    DoubleEnumeration,
    StringEnumeration,
}

/// Process-wide tag table, built once on first use and never mutated.
static TYPE_TABLE: LazyLock<HashMap<&'static str, ParameterType>> = LazyLock::new(|| {
    ParameterType::ALL
        .iter()
        .map(|kind| (kind.tag(), *kind))
        .collect()
});

impl ParameterType {
    pub const ALL: [ParameterType; 22] = [
        ParameterType::Boolean,
        ParameterType::Integer,
        ParameterType::Float,
        ParameterType::Double,
        ParameterType::String,
        ParameterType::File,
        ParameterType::Directory,
        ParameterType::Image,
        ParameterType::Geometry,
        ParameterType::Transform,
        ParameterType::Table,
        ParameterType::Measurement,
        ParameterType::Point,
        ParameterType::Region,
        ParameterType::IntegerVector,
        ParameterType::FloatVector,
        ParameterType::DoubleVector,
        ParameterType::StringVector,
        ParameterType::IntegerEnumeration,
        ParameterType::FloatEnumeration,
        ParameterType::DoubleEnumeration,
        ParameterType::StringEnumeration,
    ];

    /// Schema tag for this type (e.g. `"string-enumeration"`).
    pub fn tag(self) -> &'static str {
        match self {
            ParameterType::Boolean => "boolean",
            ParameterType::Integer => "integer",
            ParameterType::Float => "float",
            ParameterType::Double => "double",
            ParameterType::String => "string",
            ParameterType::File => "file",
            ParameterType::Directory => "directory",
            ParameterType::Image => "image",
            ParameterType::Geometry => "geometry",
            ParameterType::Transform => "transform",
            ParameterType::Table => "table",
            ParameterType::Measurement => "measurement",
            ParameterType::Point => "point",
            ParameterType::Region => "region",
            ParameterType::IntegerVector => "integer-vector",
            ParameterType::FloatVector => "float-vector",
            ParameterType::DoubleVector => "double-vector",
            ParameterType::StringVector => "string-vector",
            ParameterType::IntegerEnumeration => "integer-enumeration",
            ParameterType::FloatEnumeration => "float-enumeration",
            ParameterType::DoubleEnumeration => "double-enumeration",
            ParameterType::StringEnumeration => "string-enumeration",
        }
    }

    /// Resolve a schema tag through the shared table.
    pub fn from_tag(tag: &str) -> Option<ParameterType> {
        TYPE_TABLE.get(tag.trim()).copied()
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, ParameterType::Boolean)
    }

    /// Whether an empty value element is still a meaningful command-line
    /// token for this type.
    ///
    /// Text-valued types (strings, paths, data objects) can legitimately be
    /// empty; numeric and geometric types cannot.
    pub fn keeps_empty_elements(self) -> bool {
        matches!(
            self,
            ParameterType::String
                | ParameterType::StringVector
                | ParameterType::StringEnumeration
                | ParameterType::File
                | ParameterType::Directory
                | ParameterType::Image
                | ParameterType::Geometry
                | ParameterType::Transform
                | ParameterType::Table
                | ParameterType::Measurement
        )
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterType::from_tag(s).ok_or_else(|| format!("unknown parameter type tag '{}'", s.trim()))
    }
}

/// How a module process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatus {
    #[default]
    Normal,
    Crashed,
}

/// Category of a process-level failure recorded on a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessErrorKind {
    #[default]
    None,
    FailedToStart,
    Crashed,
    TimedOut,
    Other,
}
