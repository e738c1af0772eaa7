//! Backup layout rules.
//!
//! Everything here determines where files land in a backend, so changing any
//! of it moves already-backed-up trees. The layout is:
//!
//! ```text
//! <prefix>/<title>[/<dlc>...]/<Windows|Mac|Linux|Extras>/<filename>
//! <same dir>/.<filename>.version
//! <same dir>/.<filename>.tmp
//! ```

/// Make a storefront title safe to use as a single directory segment.
///
/// Trims surrounding whitespace, removes path separators and replaces every
/// `:` with ` -`. This is a literal substitution, not general escaping.
pub fn sanitize_path_segment(title: &str) -> String {
    title
        .trim()
        .replace(['/', '\\'], "")
        .replace(':', " -")
}

/// Join a prefix and a relative path with exactly one `/`.
///
/// An empty prefix means "no prefix". A leading `/` on `rel` is dropped so
/// object keys never start with an empty segment.
pub fn join_key(prefix: &str, rel: &str) -> String {
    let rel = rel.trim_start_matches('/');
    if prefix.is_empty() {
        return rel.to_string();
    }
    let prefix = prefix.trim_end_matches('/');
    if rel.is_empty() {
        return prefix.to_string();
    }
    format!("{prefix}/{rel}")
}

/// Name of the version marker for `filename`.
pub fn marker_name(filename: &str) -> String {
    format!(".{filename}.version")
}

/// Name of the in-flight temp object for `filename`.
pub fn temp_name(filename: &str) -> String {
    format!(".{filename}.tmp")
}

/// Full path of the version marker for `filename` inside `dir`.
pub fn marker_path(dir: &str, filename: &str) -> String {
    join_key(dir, &marker_name(filename))
}
