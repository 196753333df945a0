use std::collections::HashMap;
use std::fs;

/// INI-style settings file.
///
/// `[Section]` headers, `key = value` pairs, `#` or `;` comments. Keys seen
/// before the first header are globals and act as a fallback for every
/// section in the `*_or_default` getters.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Reads and parses `path`.
    ///
    /// # Errors
    /// Returns a message naming the path when the file cannot be read.
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    /// Parses INI text. Malformed lines (no `=`, not a header) are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::empty();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        cfg.globals.insert(key, value);
                    }
                    Some(sec) => {
                        cfg.sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        cfg
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses a numeric value, falling back to `default` when the key is
    /// missing or not a number.
    #[must_use]
    pub fn get_parsed_or<T: std::str::FromStr>(&self, section: &str, key: &str, default: T) -> T {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SAMPLE: &str = r#"
# camera defaults
user_agent = global-agent

[Camera]
image_format = bgr
width = 640
height = "480"

[Rtsp]
transport = tcp
; comment in another style
connect_timeout_ms =
"#;

    #[test]
    fn sections_and_globals() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get("Camera", "image_format"), Some("bgr"));
        assert_eq!(cfg.get("Camera", "height"), Some("480"));
        assert_eq!(cfg.get("Rtsp", "transport"), Some("tcp"));
        assert_eq!(cfg.get_global("user_agent"), Some("global-agent"));
        assert_eq!(cfg.get("Missing", "x"), None);
    }

    #[test]
    fn globals_are_a_fallback() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(
            cfg.get_or_default("Rtsp", "user_agent", "rtspcam"),
            "global-agent"
        );
        assert_eq!(cfg.get_or_default("Rtsp", "nope", "dflt"), "dflt");
    }

    #[test]
    fn empty_values_count_as_missing_for_non_empty_getters() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get("Rtsp", "connect_timeout_ms"), Some(""));
        assert_eq!(cfg.get_non_empty("Rtsp", "connect_timeout_ms"), None);
        assert_eq!(cfg.get_parsed_or("Rtsp", "connect_timeout_ms", 5000u64), 5000);
        assert_eq!(cfg.get_parsed_or("Camera", "width", 0u32), 640);
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let cfg = Config::parse("[Camera]\nwidth = wide\n");
        assert_eq!(cfg.get_parsed_or("Camera", "width", 7u32), 7);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/definitely/not/here.ini").unwrap_err();
        assert!(err.contains("/definitely/not/here.ini"));
    }
}
