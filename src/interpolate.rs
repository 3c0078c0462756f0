use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::digest::hash_digest;
use crate::emoji::emoji_sequence;
use crate::error::{OutnameError, Result};

/// Pattern used when the caller passes an empty pattern.
pub const DEFAULT_PATTERN: &str = "[hash].[ext]";

/// `[name]` or `[name:arg:arg...]`; args may not contain brackets.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([a-zA-Z][a-zA-Z0-9]*)(:[^\[\]]*)?\]").expect("token pattern is valid")
});

/// Caller-supplied fallback for tokens the built-ins don't recognize.
/// Receives the full matched token text, the base token name, and the
/// interpolation options; its result is substituted verbatim.
pub type TokenOverride<'a> = dyn Fn(&str, &str, &InterpolateOptions<'a>) -> String + 'a;

/// The resource whose output name is being generated.
#[derive(Clone, Copy)]
pub struct Resource<'a> {
    /// Absolute path of the resource; empty when unknown.
    pub path: &'a str,
    pub custom: Option<&'a TokenOverride<'a>>,
}

impl<'a> Resource<'a> {
    pub const fn new(path: &'a str) -> Self {
        Self { path, custom: None }
    }

    pub const fn with_custom(mut self, custom: &'a TokenOverride<'a>) -> Self {
        self.custom = Some(custom);
        self
    }
}

/// Per-call interpolation inputs. `data` is opaque pass-through, read
/// only by a [`TokenOverride`].
#[derive(Default, Clone)]
pub struct InterpolateOptions<'a> {
    pub content: Option<&'a [u8]>,
    pub context: Option<&'a str>,
    pub data: BTreeMap<String, String>,
}

impl<'a> InterpolateOptions<'a> {
    pub fn content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(content);
        self
    }

    pub fn context(mut self, context: &'a str) -> Self {
        self.context = Some(context);
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Substitute every recognized `[token]` in `pattern`.
///
/// The pattern is scanned left to right in a single pass; substituted
/// text is never re-scanned for nested tokens. An empty pattern means
/// [`DEFAULT_PATTERN`].
///
/// Each token runs through a priority chain: built-in handlers first
/// (`ext`, `name`, `path`, `folder`, the hash family, `emoji`), then the
/// resource's custom override, then identity pass-through. Unrecognized
/// tokens therefore survive unchanged, brackets included.
///
/// # Errors
///
/// `InvalidContent` when a hash or emoji token is requested without
/// `options.content` and no override exists; hash tokens also surface
/// `UnsupportedAlgorithm` / `InvalidEncoding` from digest encoding.
pub fn interpolate_name<'a>(
    pattern: &str,
    resource: &Resource<'a>,
    options: &InterpolateOptions<'a>,
) -> Result<String> {
    let pattern = if pattern.is_empty() {
        DEFAULT_PATTERN
    } else {
        pattern
    };

    let mut out = String::with_capacity(pattern.len());
    let mut last = 0;
    for caps in TOKEN_RE.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps.get(1).map_or("", |m| m.as_str());
        let args: Vec<&str> = match caps.get(2) {
            Some(m) => m.as_str()[1..].split(':').collect(),
            None => Vec::new(),
        };
        out.push_str(&pattern[last..whole.start()]);
        out.push_str(&resolve_token(whole.as_str(), name, &args, resource, options)?);
        last = whole.end();
    }
    out.push_str(&pattern[last..]);
    Ok(out)
}

fn resolve_token<'a>(
    whole: &str,
    name: &str,
    args: &[&str],
    resource: &Resource<'a>,
    options: &InterpolateOptions<'a>,
) -> Result<String> {
    if let Some(value) = resolve_builtin(whole, name, args, resource, options)? {
        return Ok(value);
    }
    if let Some(custom) = resource.custom {
        return Ok(custom(whole, name, options));
    }
    Ok(whole.to_string())
}

fn resolve_builtin<'a>(
    whole: &str,
    name: &str,
    args: &[&str],
    resource: &Resource<'a>,
    options: &InterpolateOptions<'a>,
) -> Result<Option<String>> {
    match name {
        "ext" => Ok(Some(extension(resource.path))),
        "name" => Ok(Some(stem(resource.path))),
        "path" => Ok(Some(directory(resource.path, options.context))),
        "folder" => Ok(Some(folder(resource.path))),
        "emoji" => {
            let Some(content) = options.content else {
                return missing_content(whole, resource);
            };
            let count = args.first().and_then(|arg| arg.parse().ok()).unwrap_or(1);
            Ok(Some(emoji_sequence(content, count)))
        }
        "hash" | "contenthash" | "md5" | "sha224" | "sha256" | "sha384" | "sha512" => {
            let Some(content) = options.content else {
                return missing_content(whole, resource);
            };
            let algorithm = if name == "hash" || name == "contenthash" {
                "md5"
            } else {
                name
            };
            let (encoding, length) = parse_hash_args(args);
            hash_digest(content, algorithm, encoding, length).map(Some)
        }
        _ => Ok(None),
    }
}

/// Missing content falls through to the override tier when one exists;
/// otherwise the token is unresolvable.
fn missing_content(whole: &str, resource: &Resource<'_>) -> Result<Option<String>> {
    if resource.custom.is_some() {
        Ok(None)
    } else {
        Err(OutnameError::InvalidContent {
            token: whole.to_string(),
        })
    }
}

/// A numeric argument is the truncation length, anything else is the
/// encoding. Defaults: hex, untruncated.
fn parse_hash_args<'a>(args: &[&'a str]) -> (&'a str, Option<usize>) {
    let mut encoding = "hex";
    let mut length = None;
    for arg in args {
        if let Ok(n) = arg.parse::<usize>() {
            length = Some(n);
        } else if !arg.is_empty() {
            encoding = arg;
        }
    }
    (encoding, length)
}

/// Split into (directory incl. trailing separator, file name); either
/// side may be empty. Accepts both separator styles.
fn split_dir_file(path: &str) -> (&str, &str) {
    path.rfind(['/', '\\'])
        .map_or(("", path), |i| (&path[..=i], &path[i + 1..]))
}

fn extension(path: &str) -> String {
    let (_, file) = split_dir_file(path);
    match file.rfind('.') {
        // A leading dot (".gitignore") or trailing dot is not an extension.
        Some(i) if i > 0 && i + 1 < file.len() => file[i + 1..].to_lowercase(),
        _ => "bin".to_string(),
    }
}

fn stem(path: &str) -> String {
    let (_, file) = split_dir_file(path);
    if file.is_empty() {
        return "file".to_string();
    }
    match file.rfind('.') {
        Some(i) if i > 0 => file[..i].to_string(),
        _ => file.to_string(),
    }
}

fn directory(path: &str, context: Option<&str>) -> String {
    let (dir, _) = split_dir_file(path);
    if dir.is_empty() {
        return String::new();
    }
    // The context only counts as an ancestor when the strip lands on a
    // separator boundary; "/app" must not eat into "/apple".
    context
        .and_then(|ctx| dir.strip_prefix(ctx.trim_end_matches(['/', '\\'])))
        .filter(|rest| rest.is_empty() || rest.starts_with(['/', '\\']))
        .map_or(dir, |rest| rest.trim_start_matches(['/', '\\']))
        .replace('\\', "/")
}

fn folder(path: &str) -> String {
    let (dir, _) = split_dir_file(path);
    let (_, name) = split_dir_file(dir.trim_end_matches(['/', '\\']));
    name.to_string()
}
