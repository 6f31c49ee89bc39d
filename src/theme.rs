use crate::settings;
use once_cell::sync::Lazy;
use ratatui::style::Color;

// Color palette structure
#[allow(dead_code)]
#[derive(Clone)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// Oceanic Next theme
static OCEANIC_NEXT_PALETTE: Lazy<Base16Palette> = Lazy::new(|| Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
});

// Kanagawa theme - Japanese-inspired warm tones
static KANAGAWA_PALETTE: Lazy<Base16Palette> = Lazy::new(|| Base16Palette {
    base_00: rgb(0x1F1F28),
    base_01: rgb(0x2A2A37),
    base_02: rgb(0x223249),
    base_03: rgb(0x727169),
    base_04: rgb(0xC8C093),
    base_05: rgb(0xDCD7BA),
    base_06: rgb(0xDCD7BA),
    base_07: rgb(0xE6E0C2),
    base_08: rgb(0xC34043),
    base_09: rgb(0xFFA066),
    base_0a: rgb(0xDCA561),
    base_0b: rgb(0x98BB6C),
    base_0c: rgb(0x7FB4CA),
    base_0d: rgb(0x7E9CD8),
    base_0e: rgb(0x957FB8),
    base_0f: rgb(0xD27E99),
});

pub fn all_theme_names() -> Vec<&'static str> {
    vec!["Oceanic Next", "Kanagawa"]
}

pub fn palette_by_name(name: &str) -> Option<&'static Base16Palette> {
    match name {
        "Oceanic Next" => Some(&OCEANIC_NEXT_PALETTE),
        "Kanagawa" => Some(&KANAGAWA_PALETTE),
        _ => None,
    }
}

/// Palette for the theme selected in settings; unknown names fall back to the
/// default theme.
pub fn current_theme() -> &'static Base16Palette {
    palette_by_name(&settings::get_theme_name()).unwrap_or(&OCEANIC_NEXT_PALETTE)
}

impl Base16Palette {
    pub fn get_panel_colors(&self, is_focused: bool) -> (Color, Color, Color) {
        if is_focused {
            (self.base_07, self.base_04, self.base_00)
        } else {
            (self.base_03, self.base_03, self.base_00)
        }
    }

    pub fn get_selection_colors(&self, is_focused: bool) -> (Color, Color) {
        if is_focused {
            (self.base_02, self.base_06)
        } else {
            (self.base_02, self.base_03)
        }
    }
}
