//! Theme persistence.
//!
//! The preference lives in the browser only, under local storage key
//! [`STORAGE_KEY`]. A small inline script placed first in `<head>` applies it
//! before anything themed is painted, so there is no light flash on a dark
//! preference. The server never sees or stores the value.

use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

pub const STORAGE_KEY: &str = "edforge-ui-theme";

/// A theme preference as stored in local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Self::Light, Self::Dark, Self::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Unknown or missing values mean `System`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("light") => Self::Light,
            Some("dark") => Self::Dark,
            _ => Self::System,
        }
    }

    /// The class put on `<html>`: stored preference, else the OS preference.
    pub fn resolve(self, prefers_dark: bool) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System if prefers_dark => "dark",
            Self::System => "light",
        }
    }
}

/// Runs before first paint. Mirrors [`Theme::parse`] and [`Theme::resolve`].
pub const BOOTSTRAP_SCRIPT: &str = r#"(function(){try{var k="edforge-ui-theme";var t=localStorage.getItem(k);if(t!=="light"&&t!=="dark"){t=window.matchMedia("(prefers-color-scheme: dark)").matches?"dark":"light";}var r=document.documentElement;r.classList.remove("light","dark");r.classList.add(t);r.style.colorScheme=t;}catch(e){}})();"#;

/// Wires the theme picker in the sidebar. Loaded after the content.
pub const PICKER_SCRIPT: &str = r#"(function(){var k="edforge-ui-theme";var s=document.getElementById("theme-select");if(!s)return;s.value=localStorage.getItem(k)||"system";s.addEventListener("change",function(){if(s.value==="system"){localStorage.removeItem(k);}else{localStorage.setItem(k,s.value);}var t=s.value;if(t==="system"){t=window.matchMedia("(prefers-color-scheme: dark)").matches?"dark":"light";}var r=document.documentElement;r.classList.remove("light","dark");r.classList.add(t);r.style.colorScheme=t;});})();"#;

static SCRIPT_HASHES: LazyLock<String> =
    LazyLock::new(|| format!("{} {}", script_hash(BOOTSTRAP_SCRIPT), script_hash(PICKER_SCRIPT)));

/// CSP source expression (`'sha256-...'`) allowing exactly `script` inline.
pub fn script_hash(script: &str) -> String {
    let digest = Sha256::digest(script.as_bytes());
    format!("'sha256-{}'", STANDARD.encode(digest))
}

/// Hashes of every inline script the layout emits, space separated.
pub fn inline_script_hashes() -> &'static str {
    &SCRIPT_HASHES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_resolve() {
        assert_eq!(Theme::parse(Some("dark")).resolve(false), "dark");
        assert_eq!(Theme::parse(Some("light")).resolve(true), "light");
        assert_eq!(Theme::parse(None).resolve(true), "dark");
        assert_eq!(Theme::parse(None).resolve(false), "light");
        assert_eq!(Theme::parse(Some("sepia")), Theme::System);
        assert_eq!(Theme::parse(Some("system")).resolve(true), "dark");
    }

    #[test]
    fn test_script_uses_storage_key() {
        assert!(BOOTSTRAP_SCRIPT.contains(STORAGE_KEY));
        assert!(PICKER_SCRIPT.contains(STORAGE_KEY));
        assert!(BOOTSTRAP_SCRIPT.contains("prefers-color-scheme: dark"));
    }

    #[test]
    fn test_script_hash_format() {
        let hash = script_hash("alert(1)");
        assert!(hash.starts_with("'sha256-"));
        assert!(hash.ends_with('\''));
        // 32 bytes of digest is 44 base64 characters.
        assert_eq!(hash.len(), "'sha256-".len() + 44 + 1);
        assert_ne!(script_hash(BOOTSTRAP_SCRIPT), script_hash(PICKER_SCRIPT));
    }
}
