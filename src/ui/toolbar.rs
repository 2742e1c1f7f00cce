use egui::{Id, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::engine::{Command, ViewMode};
use crate::model::{TaskPriority, TaskStatus};
use crate::planner::Planner;
use crate::ui::theme;

/// Requests the toolbar hands back to the app.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarAction {
    pub scroll_to_today: bool,
    pub open: bool,
    pub save_as: bool,
}

pub fn search_box_id() -> Id {
    Id::new("planner-search")
}

/// View mode, zoom, history and filters. `search` is the live text of the
/// search box; the planner filter is updated when it changes.
pub fn show_toolbar(
    planner: &mut Planner,
    search: &mut String,
    focus_search: bool,
    ui: &mut Ui,
) -> ToolbarAction {
    let mut action = ToolbarAction::default();

    ui.horizontal(|ui| {
        if ui.button(format!("{} Open", icons::FOLDER_OPEN)).clicked() {
            action.open = true;
        }
        if ui.button(format!("{} Save as", icons::FLOPPY_DISK)).clicked() {
            action.save_as = true;
        }

        ui.separator();
        let mut mode = planner.view_mode();
        ui.selectable_value(&mut mode, ViewMode::Resources, "Resources");
        ui.selectable_value(&mut mode, ViewMode::Projects, "Projects");
        planner.set_view_mode(mode);

        ui.separator();
        if ui
            .button(icons::MAGNIFYING_GLASS_MINUS)
            .on_hover_text("Zoom out")
            .clicked()
        {
            planner.execute(Command::ZoomOut);
        }
        ui.label(
            RichText::new(format!("{:.0} px/day", planner.window().day_width()))
                .font(theme::font_sub())
                .color(theme::TEXT_SECONDARY),
        );
        if ui
            .button(icons::MAGNIFYING_GLASS_PLUS)
            .on_hover_text("Zoom in")
            .clicked()
        {
            planner.execute(Command::ZoomIn);
        }
        if ui.button(format!("{} Today", icons::CALENDAR)).clicked() {
            action.scroll_to_today = true;
        }

        ui.separator();
        let undo = ui.add_enabled(
            planner.store().can_undo(),
            egui::Button::new(icons::ARROW_COUNTER_CLOCKWISE),
        );
        if undo.on_hover_text("Ctrl+Z").clicked() {
            planner.execute(Command::Undo);
        }
        let redo = ui.add_enabled(
            planner.store().can_redo(),
            egui::Button::new(icons::ARROW_CLOCKWISE),
        );
        if redo.on_hover_text("Ctrl+Y").clicked() {
            planner.execute(Command::Redo);
        }

        ui.separator();
        let response = ui.add(
            egui::TextEdit::singleline(search)
                .id(search_box_id())
                .hint_text(format!("{} Search notes  /", icons::MAGNIFYING_GLASS))
                .desired_width(180.0),
        );
        if focus_search {
            response.request_focus();
        }
        if response.changed() {
            planner.set_search(search.as_str());
        }
    });

    ui.horizontal(|ui| {
        ui.label(RichText::new("Status").small().weak());
        for status in TaskStatus::ALL {
            let on = planner.filter().statuses.contains(&status);
            if ui.selectable_label(on, status.label()).clicked() {
                planner.toggle_status(status);
            }
        }
        ui.separator();
        ui.label(RichText::new("Priority").small().weak());
        for priority in TaskPriority::ALL {
            let on = planner.filter().priorities.contains(&priority);
            if ui.selectable_label(on, priority.label()).clicked() {
                planner.toggle_priority(priority);
            }
        }
        if planner.filter().is_active() {
            ui.separator();
            if ui.button(format!("{} Clear filters", icons::X)).clicked() {
                search.clear();
                planner.clear_filters();
            }
        }
    });

    action
}
