use crate::config::NamingStrategy;
use crate::describe::{SpecialType, TypeKey};

/// Name used for records that carry no usable type path.
pub const ANONYMOUS_NAME: &str = "AnonymousType";

/// A type path split at its top level: `app::api::Page<app::models::User>`
/// has module `app::api` and display name `Page<User>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePath {
    pub module: Option<String>,
    pub display: String,
}

impl TypePath {
    pub fn parse(path: &str) -> Self {
        let head_end = path.find(['<', '[', '(', '&']).unwrap_or(path.len());
        let head = &path[..head_end];
        let module = head
            .rsplit_once("::")
            .map(|(module, _)| module.to_string())
            .filter(|m| !m.is_empty());
        Self {
            module,
            display: strip_module_paths(path),
        }
    }

    /// Last segment of the owning module.
    pub fn module_basename(&self) -> Option<&str> {
        self.module
            .as_deref()
            .map(|m| m.rsplit("::").next().unwrap_or(m))
    }

    pub fn crate_name(&self) -> Option<&str> {
        self.module.as_deref().and_then(|m| m.split("::").next())
    }

    /// Bare name without generic arguments.
    pub fn bare(&self) -> &str {
        let end = self.display.find('<').unwrap_or(self.display.len());
        &self.display[..end]
    }
}

/// Default public name for a record type.
pub fn schema_name(key: &TypeKey, strategy: NamingStrategy) -> String {
    let path = TypePath::parse(key.path());
    let bare = sanitize(&path.display);
    if bare.is_empty() {
        return ANONYMOUS_NAME.to_string();
    }
    match (strategy, path.module_basename()) {
        (NamingStrategy::ModuleQualified, Some(module)) => format!("{module}.{bare}"),
        _ => bare,
    }
}

/// Collision-free fallback: the full module path joined with `.`.
pub fn qualified_name(key: &TypeKey) -> String {
    let path = TypePath::parse(key.path());
    let bare = sanitize(&path.display);
    let bare = if bare.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        bare
    };
    match path.module {
        Some(module) => format!("{}.{bare}", module.replace("::", ".")),
        None => bare,
    }
}

/// Replace generic-syntax characters with `_`, collapse runs and trim.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '-' {
            if pending_sep && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch);
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    let collapsed = collapse_underscores(&out);
    collapsed.trim_matches('_').to_string()
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Drop `module::` qualifiers everywhere, including inside generic arguments.
fn strip_module_paths(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut token = String::new();
    let mut chars = path.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            token.clear();
        } else if ch.is_alphanumeric() || ch == '_' {
            token.push(ch);
        } else {
            out.push_str(&token);
            token.clear();
            out.push(ch);
        }
    }
    out.push_str(&token);
    out
}

/// Well-known third-party and std types recognised by path.
pub fn special_by_path(key: &TypeKey) -> Option<SpecialType> {
    let path = TypePath::parse(key.path());
    let krate = path.crate_name()?;
    match (krate, path.bare()) {
        ("chrono", "DateTime" | "NaiveDateTime") => Some(SpecialType::DateTime),
        ("chrono", "NaiveDate") => Some(SpecialType::Date),
        ("time", "OffsetDateTime" | "PrimitiveDateTime" | "UtcDateTime") => {
            Some(SpecialType::DateTime)
        }
        ("time", "Date") => Some(SpecialType::Date),
        ("uuid", "Uuid") => Some(SpecialType::Uuid),
        ("bytes", "Bytes") => Some(SpecialType::Bytes),
        ("std", "SystemTime") => Some(SpecialType::DateTime),
        _ => None,
    }
}
