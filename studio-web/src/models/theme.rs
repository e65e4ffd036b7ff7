#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub light: Palette,
    pub dark: Palette,
}

const fn palette(
    primary: &'static str,
    accent: &'static str,
    background: &'static str,
    surface: &'static str,
    text: &'static str,
) -> Palette {
    Palette {
        primary,
        accent,
        background,
        surface,
        text,
    }
}

pub const THEMES: &[Theme] = &[
    Theme {
        id: "default",
        name: "Midnight Gold",
        light: palette("#1f2937", "#d4a017", "#f9fafb", "#ffffff", "#111827"),
        dark: palette("#f3f4f6", "#eab308", "#0b0f19", "#111827", "#f9fafb"),
    },
    Theme {
        id: "ocean",
        name: "Ocean Breeze",
        light: palette("#0369a1", "#06b6d4", "#f0f9ff", "#ffffff", "#0c4a6e"),
        dark: palette("#38bdf8", "#22d3ee", "#041b2d", "#0c2a43", "#e0f2fe"),
    },
    Theme {
        id: "forest",
        name: "Forest",
        light: palette("#166534", "#84cc16", "#f0fdf4", "#ffffff", "#14532d"),
        dark: palette("#4ade80", "#a3e635", "#052e16", "#0f3d22", "#dcfce7"),
    },
    Theme {
        id: "sunset",
        name: "Sunset",
        light: palette("#c2410c", "#f59e0b", "#fff7ed", "#ffffff", "#431407"),
        dark: palette("#fb923c", "#fbbf24", "#1c0a02", "#2d1406", "#ffedd5"),
    },
    Theme {
        id: "royal",
        name: "Royal Purple",
        light: palette("#6d28d9", "#db2777", "#faf5ff", "#ffffff", "#3b0764"),
        dark: palette("#a78bfa", "#f472b6", "#150a26", "#241339", "#f3e8ff"),
    },
    Theme {
        id: "rose",
        name: "Rose",
        light: palette("#be123c", "#fb7185", "#fff1f2", "#ffffff", "#4c0519"),
        dark: palette("#fb7185", "#fda4af", "#1f0710", "#33101c", "#ffe4e6"),
    },
];

/// Looks a theme up by id, falling back to the first one.
pub fn find_theme(id: &str) -> &'static Theme {
    THEMES.iter().find(|t| t.id == id).unwrap_or(&THEMES[0])
}

impl Theme {
    pub fn palette(&self, dark: bool) -> &Palette {
        if dark {
            &self.dark
        } else {
            &self.light
        }
    }

    /// CSS custom properties for the page root.
    pub fn css_variables(&self, dark: bool) -> String {
        let p = self.palette(dark);
        format!(
            ":root {{ --primary: {}; --accent: {}; --background: {}; --surface: {}; --text: {}; }}",
            p.primary, p.accent, p.background, p.surface, p.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_default() {
        assert_eq!(find_theme("ocean").name, "Ocean Breeze");
        assert_eq!(find_theme("does-not-exist").id, "default");
    }

    #[test]
    fn css_uses_mode_palette() {
        let theme = find_theme("forest");
        assert!(theme.css_variables(false).contains("--primary: #166534"));
        assert!(theme.css_variables(true).contains("--primary: #4ade80"));
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = THEMES.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), THEMES.len());
    }
}
