use egui::{Color32, Visuals};

use crate::models::event::EventColor;

fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |c1: u8, c2: u8| -> u8 { ((c1 as f32 * (1.0 - t)) + (c2 as f32 * t)).round() as u8 };
    Color32::from_rgb(lerp(a.r(), b.r()), lerp(a.g(), b.g()), lerp(a.b(), b.b()))
}

#[derive(Clone, Copy)]
pub(crate) struct TimeGridPalette {
    pub hour_bg: Color32,
    pub regular_bg: Color32,
    pub weekend_bg: Color32,
    pub today_bg: Color32,
    pub header_bg: Color32,
    pub header_text: Color32,
    pub today_text: Color32,
    pub hour_text: Color32,
    pub hour_line: Color32,
    pub divider: Color32,
    pub hover_overlay: Color32,
    pub drop_target: Color32,
    pub week_line: Color32,
    pub day_line: Color32,
}

impl TimeGridPalette {
    pub fn from_visuals(visuals: &Visuals) -> Self {
        let is_dark = visuals.dark_mode;
        let base = visuals.extreme_bg_color;
        let panel = visuals.panel_fill;
        let accent = visuals.selection.bg_fill;
        let border = visuals.widgets.noninteractive.bg_stroke.color;

        Self {
            hour_bg: blend(panel, base, 0.4),
            regular_bg: base,
            weekend_bg: blend(base, panel, 0.5),
            today_bg: blend(base, accent, if is_dark { 0.18 } else { 0.12 }),
            header_bg: panel,
            header_text: visuals.text_color(),
            today_text: visuals.strong_text_color(),
            hour_text: visuals.weak_text_color(),
            hour_line: border,
            divider: with_alpha(border, 220),
            hover_overlay: with_alpha(accent, if is_dark { 80 } else { 50 }),
            drop_target: with_alpha(accent, if is_dark { 120 } else { 90 }),
            week_line: with_alpha(Color32::from_rgb(220, 60, 60), 140),
            day_line: Color32::from_rgb(220, 60, 60),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct EventPalette {
    pub fill: Color32,
    pub border: Color32,
    pub text: Color32,
}

impl EventPalette {
    pub fn for_color(color: EventColor, is_dark: bool) -> Self {
        let fill = match color {
            EventColor::Blue => Color32::from_rgb(96, 150, 230),
            EventColor::Yellow => Color32::from_rgb(238, 200, 80),
            EventColor::Green => Color32::from_rgb(110, 190, 120),
        };
        let text = match color {
            EventColor::Yellow => Color32::from_rgb(40, 35, 20),
            _ if is_dark => Color32::from_rgb(245, 245, 245),
            _ => Color32::from_rgb(20, 25, 35),
        };

        Self {
            fill: if is_dark { fill.linear_multiply(0.85) } else { fill },
            border: blend(fill, Color32::BLACK, 0.25),
            text,
        }
    }

    /// Events owned by someone else are drawn faded.
    pub fn read_only(self) -> Self {
        Self {
            fill: with_alpha(self.fill, 150),
            ..self
        }
    }

    pub fn hovered(self) -> Self {
        Self {
            fill: blend(self.fill, Color32::WHITE, 0.15),
            ..self
        }
    }
}
