use std::collections::HashMap;

use crate::color;

/// OOXML ARGB colour (`FFRRGGBB`), built from a CSS hex code. Shorthand
/// like `#abc` is expanded before conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgbColor(String);

impl ArgbColor {
    pub fn from_hex(hex: &str) -> Self {
        let expanded = color::expand_shorthand(hex);
        let digits = expanded.trim_start_matches('#');
        if digits.len() == 6 {
            ArgbColor(format!("FF{}", digits.to_uppercase()))
        } else {
            ArgbColor(digits.to_uppercase())
        }
    }

    pub(crate) fn as_argb(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fill {
    None,
    Solid(ArgbColor),
}

impl Default for Fill {
    fn default() -> Self {
        Fill::None
    }
}

impl Fill {
    fn to_xml(&self) -> String {
        match self {
            Fill::None => "<fill><patternFill/></fill>".into(),
            Fill::Solid(c) => format!(
                "<fill><patternFill patternType=\"solid\"><fgColor rgb=\"{}\"/></patternFill></fill>",
                c.as_argb()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    pub size: u32, // twentieths of a point, 220 = 11pt
    pub name: String,
    pub color: Option<ArgbColor>,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            size: 220,
            name: "Calibri".into(),
            color: None,
        }
    }
}

impl Font {
    fn to_xml(&self) -> String {
        let mut xml = String::from("<font>");
        let pt = self.size / 20;
        xml.push_str(&format!("<sz val=\"{pt}\"/>"));
        xml.push_str(&format!("<name val=\"{}\"/>", self.name));
        if let Some(c) = &self.color {
            xml.push_str(&format!("<color rgb=\"{}\"/>", c.as_argb()));
        }
        xml.push_str("</font>");
        xml
    }
}

/// A cell style: font colour plus solid fill, built by chaining.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub font: Font,
    pub fill: Fill,
}

impl Style {
    pub fn new() -> Self {
        Style::default()
    }

    pub fn bg(mut self, hex: &str) -> Self {
        self.fill = Fill::Solid(ArgbColor::from_hex(hex));
        self
    }

    pub fn font_color(mut self, hex: &str) -> Self {
        self.font.color = Some(ArgbColor::from_hex(hex));
        self
    }

    pub fn font_name(mut self, name: &str) -> Self {
        self.font.name = name.into();
        self
    }
}

/// Interns fonts, fills and cell formats, and renders styles.xml.
/// Registering the same style twice yields the same xf index.
pub struct StyleRegistry {
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    font_index: HashMap<Font, usize>,
    fill_index: HashMap<Fill, usize>,
    xfs: Vec<(usize, usize)>,
    xf_index: HashMap<(usize, usize), usize>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        let mut reg = StyleRegistry {
            fonts: Vec::new(),
            fills: Vec::new(),
            font_index: HashMap::new(),
            fill_index: HashMap::new(),
            xfs: Vec::new(),
            xf_index: HashMap::new(),
        };

        reg.intern_font(Font::default());
        // fill slots 0 and 1 are reserved by the format (none + gray125),
        // so solid fills must intern from slot 2 onward
        reg.fill_index.insert(Fill::None, 0);
        reg.fills.push(Fill::None);
        reg.fills.push(Fill::None);
        reg.intern_xf(0, 0);

        reg
    }

    pub fn register(&mut self, style: &Style) -> usize {
        let font_id = self.intern_font(style.font.clone());
        let fill_id = self.intern_fill(style.fill.clone());
        self.intern_xf(font_id, fill_id)
    }

    fn intern_font(&mut self, font: Font) -> usize {
        if let Some(&i) = self.font_index.get(&font) {
            return i;
        }
        let i = self.fonts.len();
        self.font_index.insert(font.clone(), i);
        self.fonts.push(font);
        i
    }

    fn intern_fill(&mut self, fill: Fill) -> usize {
        if let Some(&i) = self.fill_index.get(&fill) {
            return i;
        }
        let i = self.fills.len();
        self.fill_index.insert(fill.clone(), i);
        self.fills.push(fill);
        i
    }

    fn intern_xf(&mut self, font_id: usize, fill_id: usize) -> usize {
        let key = (font_id, fill_id);
        if let Some(&i) = self.xf_index.get(&key) {
            return i;
        }
        let i = self.xfs.len();
        self.xf_index.insert(key, i);
        self.xfs.push(key);
        i
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        out.push_str(
            "<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n",
        );

        out.push_str(&format!("<fonts count=\"{}\">\n", self.fonts.len()));
        for font in &self.fonts {
            out.push_str(&format!("{}\n", font.to_xml()));
        }
        out.push_str("</fonts>\n");

        out.push_str(&format!("<fills count=\"{}\">\n", self.fills.len()));
        for (i, fill) in self.fills.iter().enumerate() {
            if i == 1 {
                out.push_str("<fill><patternFill patternType=\"gray125\"/></fill>\n");
            } else {
                out.push_str(&format!("{}\n", fill.to_xml()));
            }
        }
        out.push_str("</fills>\n");

        out.push_str("<borders count=\"1\">\n");
        out.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>\n");
        out.push_str("</borders>\n");

        out.push_str("<cellStyleXfs count=\"1\">\n");
        out.push_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>\n");
        out.push_str("</cellStyleXfs>\n");

        out.push_str(&format!("<cellXfs count=\"{}\">\n", self.xfs.len()));
        for (font_id, fill_id) in &self.xfs {
            out.push_str(&format!(
                "<xf numFmtId=\"0\" fontId=\"{font_id}\" fillId=\"{fill_id}\" borderId=\"0\" xfId=\"0\"/>\n"
            ));
        }
        out.push_str("</cellXfs>\n");

        out.push_str("<cellStyles count=\"1\">\n");
        out.push_str("<cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>\n");
        out.push_str("</cellStyles>\n");

        out.push_str("</styleSheet>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_hex_becomes_argb() {
        assert_eq!(ArgbColor::from_hex("#336699").as_argb(), "FF336699");
        assert_eq!(ArgbColor::from_hex("336699").as_argb(), "FF336699");
        assert_eq!(ArgbColor::from_hex("#abc").as_argb(), "FFAABBCC");
    }

    #[test]
    fn registering_the_same_style_reuses_the_xf() {
        let mut reg = StyleRegistry::new();
        let a = reg.register(&Style::new().bg("#336699").font_color("#1f5285"));
        let b = reg.register(&Style::new().bg("#336699").font_color("#1f5285"));
        assert_eq!(a, b);
        assert_ne!(a, 0);

        let c = reg.register(&Style::new().bg("#112233").font_color("#000000"));
        assert_ne!(a, c);
    }

    #[test]
    fn solid_fills_start_after_the_reserved_slots() {
        let mut reg = StyleRegistry::new();
        reg.register(&Style::new().bg("#336699"));
        let xml = reg.to_xml();
        // none + gray125 + one solid
        assert!(xml.contains("<fills count=\"3\">"));
        assert!(xml.contains("patternType=\"gray125\""));
        assert!(xml.contains("fgColor rgb=\"FF336699\""));
        assert!(xml.contains("fillId=\"2\""));
    }

    #[test]
    fn default_registry_has_the_baseline_xf() {
        let reg = StyleRegistry::new();
        let xml = reg.to_xml();
        assert!(xml.contains("<cellXfs count=\"1\">"));
        assert!(xml.contains("<borders count=\"1\">"));
    }
}
