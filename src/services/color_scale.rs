use colorgrad::Gradient;
use serde::Serialize;

/// 热力图配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorScale {
    RdYlGn,
    Blues,
    RdBu,
    Viridis,
    Greens,
}

const RD_YL_GN: [&str; 11] = [
    "#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a",
    "#66bd63", "#1a9850", "#006837",
];
const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];
const RD_BU: [&str; 11] = [
    "#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de",
    "#4393c3", "#2166ac", "#053061",
];
const VIRIDIS: [&str; 9] = [
    "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962", "#addc30",
    "#fde725",
];
const GREENS: [&str; 9] = [
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
    "#00441b",
];

/// 空单元格的填充色
pub const EMPTY_CELL: &str = "#e0e0e0";

impl ColorScale {
    fn stops(self) -> &'static [&'static str] {
        match self {
            ColorScale::RdYlGn => &RD_YL_GN,
            ColorScale::Blues => &BLUES,
            ColorScale::RdBu => &RD_BU,
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Greens => &GREENS,
        }
    }

    pub fn gradient(self) -> Option<colorgrad::LinearGradient> {
        colorgrad::GradientBuilder::new()
            .html_colors(self.stops())
            .build::<colorgrad::LinearGradient>()
            .map_err(|e| tracing::warn!("failed to build {:?} gradient: {}", self, e))
            .ok()
    }

    /// 返回 `t` (0..=1) 处的颜色，`#rrggbb`
    pub fn hex_at(self, t: f64) -> String {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
        match self.gradient() {
            Some(grad) => to_hex(grad.at(t as f32)),
            None => EMPTY_CELL.to_string(),
        }
    }
}

pub fn to_hex(color: colorgrad::Color) -> String {
    let [r, g, b, _] = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// 根据背景亮度选择文字颜色
pub fn text_color_for(background: &str) -> &'static str {
    let hex = background.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(f64::from)
            .unwrap_or(255.0)
    };
    let luminance = 0.299 * channel(0) + 0.587 * channel(2) + 0.114 * channel(4);
    if luminance < 128.0 {
        "#ffffff"
    } else {
        "#000000"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_first_and_last_stop() {
        assert_eq!(ColorScale::RdYlGn.hex_at(0.0), "#a50026");
        assert_eq!(ColorScale::RdYlGn.hex_at(1.0), "#006837");
        assert_eq!(ColorScale::Blues.hex_at(1.5), "#08306b");
        assert_eq!(ColorScale::Greens.hex_at(-1.0), "#f7fcf5");
    }

    #[test]
    fn non_finite_position_falls_to_middle() {
        assert_eq!(ColorScale::RdBu.hex_at(f64::NAN), ColorScale::RdBu.hex_at(0.5));
    }

    #[test]
    fn text_contrasts_with_background() {
        assert_eq!(text_color_for("#08306b"), "#ffffff");
        assert_eq!(text_color_for("#ffffbf"), "#000000");
    }
}
