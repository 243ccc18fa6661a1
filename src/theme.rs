//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const TANGERINE: Color = Color::Rgb(0xFF, 0x99, 0x00);
const SKY_BLUE: Color = Color::Rgb(0x1E, 0x3A, 0xC8);

/// Colours for the sky, the tower and the HUD.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Placed and moving blocks.
    pub block: Color,
    /// Pieces sliced off an imperfect drop.
    pub falling: Color,
    /// Playfield background.
    pub sky: Color,
    pub cloud: Color,
    /// HUD label face and its drop shadow.
    pub label: Color,
    pub label_shadow: Color,
    /// Score milestone flash.
    pub coin: Color,
    /// Borders.
    pub div_line: Color,
    /// Sidebar text.
    pub main_fg: Color,
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::tangerine_default()
    }
}

impl Theme {
    /// Tangerine blocks on a blue sky.
    pub fn tangerine_default() -> Self {
        Self {
            block: TANGERINE,
            falling: Color::Rgb(0xCC, 0x6E, 0x00),
            sky: SKY_BLUE,
            cloud: Color::Rgb(0xE8, 0xEE, 0xF7),
            label: TANGERINE,
            label_shadow: Color::Black,
            coin: Color::Rgb(0xFF, 0xD7, 0x00),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: TANGERINE,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the built-in colours if path is None or missing; keys absent from the file keep their defaults.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override block and sky colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.block = Color::Rgb(0xFF, 0xFF, 0x00);
                self.falling = Color::Rgb(0xFF, 0x00, 0xFF);
                self.sky = Color::Black;
                self.cloud = Color::Rgb(0x55, 0x55, 0x55);
                self.label = Color::Rgb(0xFF, 0xFF, 0x00);
            }
            crate::Palette::Colorblind => {
                // Blue/orange pair stays distinct for the common deficiencies.
                self.block = Color::Rgb(0xEE, 0x77, 0x33);
                self.falling = Color::Rgb(0xBB, 0xBB, 0xBB);
                self.sky = Color::Rgb(0x00, 0x44, 0x88);
                self.label = Color::Rgb(0xEE, 0x77, 0x33);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        for (key, slot) in [
            ("block", &mut theme.block),
            ("falling", &mut theme.falling),
            ("sky", &mut theme.sky),
            ("cloud", &mut theme.cloud),
            ("label", &mut theme.label),
            ("label_shadow", &mut theme.label_shadow),
            ("coin", &mut theme.coin),
            ("div_line", &mut theme.div_line),
            ("main_fg", &mut theme.main_fg),
            ("title", &mut theme.title),
        ] {
            if let Some(v) = map.get(key) {
                *slot = parse_hex(v)?;
            }
        }
        Ok(theme)
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match hex.len() {
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        3 => (
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#FF9900").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0x99, 0x00)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[sky]="#1E3AC8""##);
        assert_eq!(map.get("sky"), Some(&"#1E3AC8".to_string()));
    }

    #[test]
    fn test_from_map_keeps_defaults_for_missing_keys() {
        let map = parse_theme_file("# comment\ntheme[block]='#00FF00'\nnot a theme line\n");
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.block, Color::Rgb(0, 255, 0));
        assert_eq!(theme.sky, SKY_BLUE);
    }

    #[test]
    fn test_palette_overrides_block() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::HighContrast);
        assert_eq!(theme.sky, Color::Black);
        assert_ne!(theme.block, TANGERINE);
    }
}
