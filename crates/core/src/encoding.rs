//! Process text encoding detection.
//!
//! Whether the process's narrow text is UTF-8 is decided once, on first use, and cached for the
//! lifetime of the process. On Windows this is the active ANSI code page; elsewhere it is the
//! codeset of the locale named by `LC_ALL`, `LC_CTYPE` or `LANG` (first non-empty wins).

use std::sync::OnceLock;

/// How a [`Utf8Text`](crate::Utf8Text) surface decides between the UTF-8 and legacy paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Use the UTF-8 path iff the process text encoding is UTF-8.
    #[default]
    Detect,
    /// Always treat narrow text as UTF-8.
    ForceUtf8,
    /// Always forward narrow text to the legacy capability.
    ForceLegacy,
}

impl EncodingPolicy {
    /// Whether this policy selects the UTF-8 path.
    pub fn is_utf8(self) -> bool {
        match self {
            Self::Detect => utf8_active(),
            Self::ForceUtf8 => true,
            Self::ForceLegacy => false,
        }
    }
}

static UTF8_ACTIVE: OnceLock<bool> = OnceLock::new();

/// Whether the process text encoding is UTF-8.
///
/// Computed on the first call and cached; later changes to the environment are not observed.
pub fn utf8_active() -> bool {
    *UTF8_ACTIVE.get_or_init(|| {
        let active = probe();
        log::debug!("process text encoding is utf-8: {active}");
        active
    })
}

#[cfg(windows)]
fn probe() -> bool {
    crate::win32::active_code_page_is_utf8()
}

#[cfg(not(windows))]
fn probe() -> bool {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
        .is_some_and(|locale| locale_is_utf8(&locale))
}

/// Whether a POSIX locale name (e.g. `en_US.UTF-8@euro`) carries a UTF-8 codeset.
#[cfg_attr(windows, allow(dead_code))]
fn locale_is_utf8(locale: &str) -> bool {
    let Some((_, rest)) = locale.split_once('.') else {
        // "C.UTF-8" style names always carry a dot; bare names use the default codeset.
        return false;
    };
    let codeset = rest.split('@').next().unwrap_or(rest);
    codeset.eq_ignore_ascii_case("utf-8") || codeset.eq_ignore_ascii_case("utf8")
}
