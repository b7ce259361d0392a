//! Java structural extraction.
//!
//! A best-effort, regex-driven extractor. It does not build a syntax tree:
//! generics, annotations, varargs, nested classes and files with several
//! top-level classes are not handled correctly.

use super::{MethodSignature, Parameter, SourceExtractor, SourceUnit, Visibility};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"package\s+([\w.]+);").expect("valid package pattern"));

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"public\s+class\s+(\w+)").expect("valid class pattern"));

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\s+([\w.]+);").expect("valid import pattern"));

// visibility, static, return type, name, parameter list, throws clause, opening brace
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(public|private|protected)?\s+(static\s+)?(\w+)\s+(\w+)\s*\((.*?)\)\s*(?:throws\s+[\w\s,]+)?\s*\{",
    )
    .expect("valid method pattern")
});

/// Pattern-based Java extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl SourceExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Result<SourceUnit> {
        let package = first_capture(&PACKAGE_RE, text);
        let class_name = first_capture(&CLASS_RE, text);

        let imports = IMPORT_RE
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect();

        let methods = METHOD_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let name = &caps[4];
                if name == class_name {
                    return None;
                }
                let param_string = caps[5].trim().to_string();
                Some(MethodSignature {
                    visibility: Visibility::from_keyword(caps.get(1).map(|m| m.as_str())),
                    is_static: caps.get(2).is_some(),
                    return_type: caps[3].to_string(),
                    name: name.to_string(),
                    parameters: parse_parameters(&param_string),
                    param_string,
                })
            })
            .collect();

        Ok(SourceUnit {
            package,
            class_name,
            imports,
            methods,
        })
    }
}

fn first_capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Split a parameter list on commas and take the last two tokens of each
/// fragment as `(type, name)`. Fragments with fewer than two tokens are dropped.
fn parse_parameters(params: &str) -> Vec<Parameter> {
    params
        .split(',')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .filter_map(|fragment| {
            let parts: Vec<&str> = fragment.split_whitespace().collect();
            match parts.as_slice() {
                [.., ty, name] => Some(Parameter {
                    ty: ty.to_string(),
                    name: name.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}
