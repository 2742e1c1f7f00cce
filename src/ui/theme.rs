use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_ALT: Color32 = Color32::from_rgba_premultiplied(6, 6, 6, 6);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);
pub const WEEKEND_SHADE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::WHITE;

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const HANDLE_COLOR: Color32 = Color32::WHITE;

pub const PROGRESS_OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 55);
pub const BASELINE: Color32 = Color32::from_rgb(120, 124, 140);
pub const CRITICAL: Color32 = Color32::from_rgb(255, 99, 71);
pub const DEP_ARROW: Color32 = Color32::from_rgb(219, 174, 94);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const BAR_ROUNDING: f32 = 5.0;
/// Vertical inset inside a lane; the baseline strip lives in the bottom inset.
pub const BAR_INSET: f32 = 4.0;
pub const ARROW_WIDTH: f32 = 1.2;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_label() -> FontId {
    FontId::proportional(12.5)
}

// ── Visuals ──────────────────────────────────────────────────────────────────

fn widget(v: &mut egui::style::WidgetVisuals, bg: Color32, border: Color32, fg: Stroke) {
    v.bg_fill = bg;
    v.weak_bg_fill = bg;
    v.bg_stroke = Stroke::new(1.0, border);
    v.fg_stroke = fg;
    v.rounding = Rounding::same(4.0);
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);
    visuals.faint_bg_color = BG_PANEL;

    let w = &mut visuals.widgets;
    widget(
        &mut w.noninteractive,
        BG_PANEL,
        BORDER_SUBTLE,
        Stroke::new(1.0, TEXT_SECONDARY),
    );
    widget(
        &mut w.inactive,
        Color32::from_rgb(42, 44, 56),
        BORDER_SUBTLE,
        Stroke::new(1.0, TEXT_PRIMARY),
    );
    widget(
        &mut w.hovered,
        Color32::from_rgb(52, 54, 68),
        ACCENT,
        Stroke::new(1.0, TEXT_PRIMARY),
    );
    widget(
        &mut w.active,
        Color32::from_rgb(60, 62, 76),
        ACCENT,
        Stroke::new(2.0, Color32::WHITE),
    );
    widget(
        &mut w.open,
        Color32::from_rgb(50, 52, 66),
        ACCENT,
        Stroke::new(1.0, TEXT_PRIMARY),
    );

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(8.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
    });
}
