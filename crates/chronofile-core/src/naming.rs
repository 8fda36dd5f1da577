//! Canonical name normalization.
//!
//! Folds arbitrary Unicode file and directory names into lower-case tokens
//! over `[0-9a-z_]`. Extensions are never passed through [`normalize_name`];
//! callers normalize the base and lower-case the extension separately.

use crate::config::FilingConfig;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex for runs of characters outside half-width and full-width alphanumerics.
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9A-Za-z\x{FF10}-\x{FF19}\x{FF21}-\x{FF3A}\x{FF41}-\x{FF5A}]+").unwrap()
});

/// Regex for consecutive underscores.
static CONSECUTIVE_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").unwrap());

/// Normalize a name into its canonical token.
///
/// # Rules Applied
/// 1. NFKC fold (full-width letters/digits become ASCII)
/// 2. Replace every run of non-alphanumeric characters with `_`
/// 3. Collapse consecutive underscores
/// 4. Drop a trailing underscore and any leading underscores
/// 5. Convert to lowercase
///
/// The result is empty when nothing alphanumeric survives; see
/// [`normalize_or`] for the fallback form.
///
/// # Examples
///
/// ```
/// use chronofile_core::naming::normalize_name;
///
/// assert_eq!(normalize_name("Summer Trip (2019)"), "summer_trip_2019");
/// assert_eq!(normalize_name("ＩＭＧ－００１"), "img_001");
/// assert_eq!(normalize_name("★☆★"), "");
/// ```
pub fn normalize_name(name: &str) -> String {
    let folded: String = name.nfkc().collect();

    let mut result = NON_ALNUM.replace_all(&folded, "_").into_owned();
    result = CONSECUTIVE_UNDERSCORES
        .replace_all(&result, "_")
        .into_owned();

    if result.ends_with('_') {
        result.pop();
    }
    let result = result.trim_start_matches('_');

    result.to_lowercase()
}

/// Normalize a name, substituting `fallback` when the canonical token is empty.
pub fn normalize_or(name: &str, fallback: &str) -> String {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized
    }
}

/// Split an entry name into base and extension (extension keeps its dot).
///
/// Directories never have an extension. A leading dot does not start an
/// extension, so `.bashrc` splits into (`.bashrc`, ``).
pub fn split_name(name: &str, is_directory: bool) -> (&str, &str) {
    if is_directory {
        return (name, "");
    }
    match name.rfind('.') {
        Some(pos) if name[..pos].chars().any(|c| c != '.') => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Canonical form of a file name: normalized base plus lower-cased extension.
///
/// # Examples
///
/// ```
/// use chronofile_core::naming::normalize_file_name;
///
/// assert_eq!(normalize_file_name("My Holiday.JPG"), "my_holiday.jpg");
/// assert_eq!(normalize_file_name("★.PNG"), "file.png");
/// ```
pub fn normalize_file_name(name: &str) -> String {
    let (base, ext) = split_name(name, false);
    format!(
        "{}{}",
        normalize_or(base, FilingConfig::FILE_FALLBACK),
        ext.to_lowercase()
    )
}

/// Canonical form of a directory name.
pub fn normalize_dir_name(name: &str) -> String {
    normalize_or(name, FilingConfig::FOLDER_FALLBACK)
}
