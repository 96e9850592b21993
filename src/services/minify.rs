//! Helpers for the compress stage.
//!
//! The minifier itself is external; this module only prepares its input and its
//! command line.

use crate::models::CompressionOptions;
use camino::Utf8Path;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// Header comment tags the cartridge format reads from the script
pub const METADATA_TAGS: [&str; 6] = ["title", "author", "desc", "script", "input", "saveid"];

/// Minified output shorter than this is almost certainly broken
pub const SUSPICIOUS_OUTPUT_LEN: usize = 10;

// The console runs cartridge code in a global scope that breaks under strict mode.
static STRICT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:"use strict"|'use strict');?[ \t]*(?:\r?\n)?"#)
        .expect("Invalid strict directive regex")
});

/// Remove a leading `"use strict";` directive from compiled source.
///
/// Only the first statement is considered; a directive anywhere else is left alone.
pub fn strip_strict_directive(source: &str) -> &str {
    match STRICT_DIRECTIVE.find(source) {
        Some(m) => &source[m.end()..],
        None => source,
    }
}

/// Regex literal (in the minifier's `/.../` syntax) matching whitelisted comments
pub fn comment_whitelist() -> String {
    format!(r"/^\s*({}):/", METADATA_TAGS.join("|"))
}

/// Build the minifier argument list.
///
/// # Arguments
/// * `input` - Stripped source to minify
/// * `output` - Compressed file to write
/// * `options` - Compression settings from the tool config
///
/// Compression and mangling are toggled independently; their option bags are passed
/// through as `key=value` pairs. With both disabled the output is beautified instead
/// and every comment is kept.
pub fn minifier_args(input: &Utf8Path, output: &Utf8Path, options: &CompressionOptions) -> Vec<String> {
    let mut args = vec![input.to_string(), "-o".to_string(), output.to_string()];

    if options.is_pretty_print() {
        args.push("--beautify".to_string());
        args.push(format!("indent_level={}", options.indent_level));
        args.push("--comments".to_string());
        args.push("all".to_string());
        return args;
    }

    if options.compress {
        args.push("--compress".to_string());
        if let Some(bag) = option_bag(&options.compress_options) {
            args.push(bag);
        }
    }

    if options.mangle {
        args.push("--mangle".to_string());
        if let Some(bag) = option_bag(&options.mangle_options) {
            args.push(bag);
        }
    }

    args.push("--comments".to_string());
    args.push(comment_whitelist());
    args
}

/// Render an option bag as `key=value,key=value`.
///
/// Values are written as JSON literals, which the minifier parses as JavaScript.
fn option_bag(options: &IndexMap<String, serde_json::Value>) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    Some(
        options
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(","),
    )
}
