// src/args/builder.rs

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::args::descriptor::ParameterDescriptor;

/// Read access to the current parameter values, keyed by parameter name.
pub trait ParameterValues {
    fn value_of(&self, name: &str) -> Option<&str>;
}

impl ParameterValues for HashMap<String, String> {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParameterValues for BTreeMap<String, String> {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParameterValues for [(&str, &str)] {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
    }
}

/// Render the command line for `descriptors` with the given `values`.
///
/// Flagged parameters come first, in declaration order. Positional
/// parameters follow, sorted by index, without flags. A parameter with no
/// value renders as the empty string and then follows the rules below, so
/// a positional keeps its slot.
///
/// - boolean: the flag alone when the value is `true`, nothing otherwise
/// - multiple: the value is split on `,` and the flag repeated per element
/// - empty elements are kept for text-like types and dropped otherwise
pub fn build_arguments<V>(descriptors: &[ParameterDescriptor], values: &V) -> Vec<String>
where
    V: ParameterValues + ?Sized,
{
    let mut args = Vec::new();
    let mut positional: Vec<(usize, String)> = Vec::new();

    for descriptor in descriptors {
        let value = values.value_of(&descriptor.name).unwrap_or("");

        if let Some(index) = descriptor.index {
            positional.push((index, value.to_string()));
            continue;
        }

        let Some(flag) = descriptor.flag_token() else {
            debug!(
                parameter = %descriptor.name,
                "parameter has neither index nor flag; skipping"
            );
            continue;
        };

        if descriptor.kind.is_boolean() {
            if value.trim().eq_ignore_ascii_case("true") {
                args.push(flag);
            }
            continue;
        }

        let elements: Vec<&str> = if descriptor.multiple {
            value.split(',').collect()
        } else {
            vec![value]
        };

        for element in elements {
            if element.trim().is_empty() && !descriptor.kind.keeps_empty_elements() {
                continue;
            }
            args.push(flag.clone());
            args.push(element.to_string());
        }
    }

    positional.sort_by_key(|(index, _)| *index);
    args.extend(positional.into_iter().map(|(_, value)| value));
    args
}
