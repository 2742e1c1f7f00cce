use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, CursorIcon, Id, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};

use crate::engine::geometry::LayoutMetrics;
use crate::engine::{BarGeometry, DragMode, ViewMode};
use crate::model::{Assignment, AssignmentId, Dataset, HeaderBlock, ScrollMetrics, TimelineWindow};
use crate::planner::{Frame, Planner};
use crate::ui::theme;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    pub changed: bool,
    pub hovered: Option<AssignmentId>,
}

/// Bar colour per assignment: the project colour on resource rows and the
/// resource colour on project rows.
fn bar_colors(dataset: &Dataset, mode: ViewMode) -> HashMap<AssignmentId, Color32> {
    let resources: HashMap<_, _> = dataset.resources.iter().map(|r| (&r.id, r.color)).collect();
    let projects: HashMap<_, _> = dataset.projects.iter().map(|p| (&p.id, p.color)).collect();
    dataset
        .assignments
        .iter()
        .map(|a| {
            let color = match mode {
                ViewMode::Resources => projects.get(&a.project_id),
                ViewMode::Projects => resources.get(&a.resource_id),
            };
            (a.id.clone(), color.copied().unwrap_or(theme::ACCENT))
        })
        .collect()
}

/// Render the timeline: headers, rows, bars, arrows and the sticky label column.
pub fn show_gantt_chart(planner: &mut Planner, today: NaiveDate, ui: &mut Ui) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let label_w = planner.settings().layout.label_width;
    let header_h = planner.settings().layout.header_height;

    // Ctrl + wheel zooms; handled before layout so this frame uses the new scale.
    if ui.rect_contains_pointer(ui.max_rect()) {
        let zoom = ui.input(|i| i.zoom_delta());
        if zoom > 1.0 {
            planner.zoom(1);
        } else if zoom < 1.0 {
            planner.zoom(-1);
        }
    }

    interaction.changed |= planner.flush();
    let frame = planner.frame();
    let colors = bar_colors(planner.dataset(), planner.view_mode());
    let mode = planner.view_mode();
    let metrics = *frame.layout.metrics();

    let mut scroll = egui::ScrollArea::both()
        .id_salt("gantt-chart")
        .auto_shrink([false, false])
        .drag_to_scroll(false);
    if let Some(target) = planner.take_scroll_target() {
        scroll = scroll.horizontal_scroll_offset(target);
    }

    let output = scroll.show(ui, |ui| {
        let content = Vec2::new(
            label_w + planner.window().content_width(),
            header_h + frame.layout.total_height,
        );
        let (response, painter) =
            ui.allocate_painter(content.max(ui.available_size()), Sense::click_and_drag());
        let clip = ui.clip_rect();
        let body = response.rect.min + Vec2::new(label_w, header_h);
        let window = planner.window();

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
        draw_row_backgrounds(&painter, &frame, body, clip);
        draw_day_grid(&painter, window, body, clip, label_w);
        draw_today_line(&painter, window, today, body, clip);

        let assignments: HashMap<&AssignmentId, &Assignment> = frame
            .rows
            .iter()
            .flat_map(|r| r.assignments.iter().map(|a| (&a.id, a)))
            .collect();
        for bar in &frame.layout.bars {
            let Some(a) = assignments.get(&bar.id) else {
                continue;
            };
            let color = colors.get(&bar.id).copied().unwrap_or(theme::ACCENT);
            let style = BarStyle {
                color,
                selected: planner.selection().contains(&bar.id),
                critical: frame.highlight_critical(&bar.id),
            };
            draw_bar(&painter, bar, a, body, &metrics, style);
        }
        draw_arrows(&painter, &frame, body);

        draw_header(&painter, window, body, clip, label_w, header_h);
        draw_labels(&painter, &frame, mode, body, clip, label_w, header_h);

        // ── Pointer routing ──
        let timeline_area = Rect::from_min_max(
            Pos2::new(clip.left() + label_w, clip.top() + header_h),
            clip.max,
        );
        let to_content = |p: Pos2| (p - body).to_pos2();
        let (pressed, released, down, focused, pointer, modifiers) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.focused,
                i.pointer.interact_pos(),
                i.modifiers,
            )
        });

        if pressed {
            if let Some(p) = pointer.filter(|p| response.hovered() && timeline_area.contains(*p)) {
                planner.pointer_down(to_content(p), modifiers);
            }
        }

        if planner.is_dragging() {
            if let Some(p) = pointer {
                planner.pointer_move(p.x - body.x);
            }
            if released {
                interaction.changed |= planner.pointer_up().is_some();
            } else if !down || !focused {
                interaction.changed |= planner.capture_lost().is_some();
            }
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
            ui.ctx().request_repaint();
        } else if let Some(p) = pointer.filter(|p| timeline_area.contains(*p)) {
            if let Some((id, drag_mode)) = frame.layout.hit_test(to_content(p)) {
                ui.ctx().set_cursor_icon(match drag_mode {
                    DragMode::Move => CursorIcon::Grab,
                    DragMode::ResizeLeft | DragMode::ResizeRight => CursorIcon::ResizeHorizontal,
                });
                if let Some(a) = assignments.get(&id) {
                    show_tooltip(ui, a, frame.critical.length_of(&id));
                }
                interaction.hovered = Some(id);
            }
        }
    });

    let extension = planner.on_scroll(ScrollMetrics {
        offset: output.state.offset.x,
        client_width: (output.inner_rect.width() - label_w).max(0.0),
        content_width: planner.window().content_width(),
    });
    if !extension.is_empty() {
        ui.ctx().request_repaint();
    }

    interaction
}

/// Day index range intersecting the visible part of the timeline.
fn visible_days(window: &TimelineWindow, body: Pos2, clip: Rect, label_w: f32) -> (usize, usize) {
    let dw = window.day_width();
    let total = window.total_days() as usize;
    let first = ((clip.left() + label_w - body.x) / dw).floor().max(0.0) as usize;
    let last = (((clip.right() - body.x) / dw).ceil().max(0.0) as usize).min(total);
    (first.min(last), last)
}

fn draw_row_backgrounds(painter: &egui::Painter, frame: &Frame, body: Pos2, clip: Rect) {
    for (i, row) in frame.layout.rows.iter().enumerate() {
        let y = body.y + row.top;
        if i % 2 == 1 {
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(clip.left(), y), Vec2::new(clip.width(), row.height)),
                0.0,
                theme::BG_ROW_ALT,
            );
        }
        painter.line_segment(
            [
                Pos2::new(clip.left(), y + row.height),
                Pos2::new(clip.right(), y + row.height),
            ],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
}

fn draw_day_grid(painter: &egui::Painter, window: &TimelineWindow, body: Pos2, clip: Rect, label_w: f32) {
    let dw = window.day_width();
    let (first, last) = visible_days(window, body, clip, label_w);
    let days = window.days();
    for (i, day) in days.iter().enumerate().take(last).skip(first) {
        let x = body.x + i as f32 * dw;
        if day.is_weekend {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, body.y), Pos2::new(x + dw, clip.bottom())),
                0.0,
                theme::WEEKEND_SHADE,
            );
        }
        painter.line_segment(
            [Pos2::new(x, body.y), Pos2::new(x, clip.bottom())],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_today_line(painter: &egui::Painter, window: &TimelineWindow, today: NaiveDate, body: Pos2, clip: Rect) {
    if !window.contains(today) {
        return;
    }
    let x = body.x + window.date_to_offset(today) + window.day_width() / 2.0;
    painter.line_segment(
        [Pos2::new(x, body.y), Pos2::new(x, clip.bottom())],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}

/// Month, ISO week and day tiers, pinned to the top of the viewport.
fn draw_header(
    painter: &egui::Painter,
    window: &TimelineWindow,
    body: Pos2,
    clip: Rect,
    label_w: f32,
    header_h: f32,
) {
    let top = clip.top();
    let tier = header_h / 3.0;
    let left = clip.left() + label_w;
    painter.rect_filled(
        Rect::from_min_max(Pos2::new(left, top), Pos2::new(clip.right(), top + header_h)),
        0.0,
        theme::BG_HEADER,
    );

    let dw = window.day_width();
    let blocks = |blocks: Vec<HeaderBlock>, y: f32, font: egui::FontId, color: Color32| {
        for b in blocks {
            let x0 = body.x + b.first_day as f32 * dw;
            let x1 = x0 + b.len as f32 * dw;
            if x1 < left || x0 > clip.right() {
                continue;
            }
            painter.line_segment(
                [Pos2::new(x0, y), Pos2::new(x0, y + tier)],
                Stroke::new(1.0, theme::BORDER_SUBTLE),
            );
            // Keep the label readable while its block is partly scrolled away.
            let text_x = x0.max(left) + 4.0;
            if text_x + 24.0 < x1 {
                painter.text(Pos2::new(text_x, y + tier / 2.0), Align2::LEFT_CENTER, &b.label, font.clone(), color);
            }
        }
    };
    blocks(window.month_blocks(), top, theme::font_header(), theme::TEXT_PRIMARY);
    blocks(window.week_blocks(), top + tier, theme::font_sub(), theme::TEXT_SECONDARY);

    if dw >= 20.0 {
        let (first, last) = visible_days(window, body, clip, label_w);
        for (i, day) in window.days().iter().enumerate().take(last).skip(first) {
            let x = body.x + i as f32 * dw;
            let color = if day.is_weekend {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + dw / 2.0, top + tier * 2.5),
                Align2::CENTER_CENTER,
                day.date.format("%d").to_string(),
                theme::font_sub(),
                color,
            );
        }
    }

    painter.line_segment(
        [
            Pos2::new(left, top + header_h),
            Pos2::new(clip.right(), top + header_h),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

/// Resource / project names, pinned to the left of the viewport.
fn draw_labels(
    painter: &egui::Painter,
    frame: &Frame,
    mode: ViewMode,
    body: Pos2,
    clip: Rect,
    label_w: f32,
    header_h: f32,
) {
    let left = clip.left();
    painter.rect_filled(
        Rect::from_min_max(Pos2::new(left, clip.top()), Pos2::new(left + label_w, clip.bottom())),
        0.0,
        theme::BG_PANEL,
    );
    for (row, geom) in frame.rows.iter().zip(&frame.layout.rows) {
        let y = body.y + geom.top;
        if y + geom.height < clip.top() + header_h || y > clip.bottom() {
            continue;
        }
        let swatch = Rect::from_min_size(Pos2::new(left + 8.0, y + 8.0), Vec2::new(4.0, geom.height - 16.0));
        painter.rect_filled(swatch, Rounding::same(2.0), row.color);
        painter.text(
            Pos2::new(left + 20.0, y + geom.height / 2.0),
            Align2::LEFT_CENTER,
            &row.label,
            theme::font_label(),
            theme::TEXT_PRIMARY,
        );
        painter.line_segment(
            [
                Pos2::new(left, y + geom.height),
                Pos2::new(left + label_w, y + geom.height),
            ],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }

    let corner = Rect::from_min_size(Pos2::new(left, clip.top()), Vec2::new(label_w, header_h));
    painter.rect_filled(corner, 0.0, theme::BG_HEADER);
    let title = match mode {
        ViewMode::Resources => "Resources",
        ViewMode::Projects => "Projects",
    };
    painter.text(
        Pos2::new(left + 12.0, corner.center().y),
        Align2::LEFT_CENTER,
        title,
        theme::font_header(),
        theme::TEXT_SECONDARY,
    );
    painter.line_segment(
        [Pos2::new(left + label_w, clip.top()), Pos2::new(left + label_w, clip.bottom())],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

#[derive(Debug, Clone, Copy)]
struct BarStyle {
    color: Color32,
    selected: bool,
    critical: bool,
}

fn draw_bar(
    painter: &egui::Painter,
    bar: &BarGeometry,
    a: &Assignment,
    body: Pos2,
    metrics: &LayoutMetrics,
    style: BarStyle,
) {
    let offset = body.to_vec2();
    if bar.milestone {
        let shape = bar.shape_rect(metrics).translate(offset);
        let c = shape.center();
        let s = shape.width() / 2.0;
        let points = vec![
            Pos2::new(c.x, c.y - s),
            Pos2::new(c.x + s, c.y),
            Pos2::new(c.x, c.y + s),
            Pos2::new(c.x - s, c.y),
        ];
        let outline = if style.selected {
            Stroke::new(2.0, theme::BORDER_ACCENT)
        } else if style.critical {
            Stroke::new(2.0, theme::CRITICAL)
        } else {
            Stroke::NONE
        };
        painter.add(Shape::convex_polygon(points, style.color, outline));
        painter.text(
            Pos2::new(c.x + s + 6.0, c.y),
            Align2::LEFT_CENTER,
            &a.note,
            theme::font_bar(),
            theme::TEXT_SECONDARY,
        );
        return;
    }

    if let Some(base) = bar.baseline {
        painter.rect_filled(base.translate(offset), Rounding::same(1.0), theme::BASELINE);
    }

    let rect = bar.rect.translate(offset).shrink2(Vec2::new(0.0, theme::BAR_INSET));
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    painter.rect_filled(rect, rounding, style.color);

    if a.progress > 0 {
        let w = rect.width() * f32::from(a.progress.min(100)) / 100.0;
        painter.rect_filled(
            Rect::from_min_size(rect.min, Vec2::new(w, rect.height())),
            rounding,
            theme::PROGRESS_OVERLAY,
        );
    }

    if style.critical {
        painter.rect_stroke(rect, rounding, Stroke::new(2.0, theme::CRITICAL));
    }
    if style.selected {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
        let handle_h = rect.height() * 0.55;
        let y = rect.center().y - handle_h / 2.0;
        for x in [rect.left() - 1.5, rect.right() - 2.5] {
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(x, y), Vec2::new(4.0, handle_h)),
                Rounding::same(2.0),
                theme::HANDLE_COLOR,
            );
        }
    }

    if rect.width() > 30.0 && !a.note.is_empty() {
        let galley = painter.layout_no_wrap(a.note.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let y = rect.top() + (rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(rect.intersect(painter.clip_rect()))
            .galley(Pos2::new(rect.left() + 6.0, y), galley, Color32::TRANSPARENT);
    }
}

fn draw_arrows(painter: &egui::Painter, frame: &Frame, body: Pos2) {
    let offset = body.to_vec2();
    let chain: HashSet<(&AssignmentId, &AssignmentId)> = frame
        .critical
        .chain
        .windows(2)
        .map(|w| (&w[0], &w[1]))
        .collect();
    for arrow in &frame.arrows {
        let on_chain = chain.contains(&(&arrow.from, &arrow.to))
            && frame.highlight_critical(&arrow.from)
            && frame.highlight_critical(&arrow.to);
        let color = if on_chain {
            theme::CRITICAL
        } else {
            theme::DEP_ARROW
        };
        let points = arrow.curve.map(|p| p + offset);
        painter.add(CubicBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            Stroke::new(theme::ARROW_WIDTH, color),
        ));
        let head = arrow.head.map(|p| p + offset).to_vec();
        painter.add(Shape::convex_polygon(head, color, Stroke::NONE));
    }
}

fn show_tooltip(ui: &Ui, a: &Assignment, path_length: Option<i64>) {
    egui::show_tooltip_at_pointer(
        ui.ctx(),
        ui.layer_id(),
        Id::new(("assignment-tip", a.id.as_str())),
        |ui| {
            ui.strong(if a.note.is_empty() { a.id.as_str() } else { a.note.as_str() });
            if a.milestone {
                ui.label(a.start.format("%d/%m/%Y").to_string());
            } else {
                ui.label(format!(
                    "{} → {} ({} d)",
                    a.start.format("%d/%m/%Y"),
                    a.end.format("%d/%m/%Y"),
                    a.duration_days()
                ));
            }
            ui.label(format!(
                "{} · {} · {}%",
                a.status.label(),
                a.priority.label(),
                a.progress
            ));
            if let Some(len) = path_length {
                ui.label(format!("Path length: {} d", len));
            }
        },
    );
}
