use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use gantt_planner::engine::{command_for, Command};
use gantt_planner::io::{JsonFileStorage, PlannerStorage};
use gantt_planner::model::Dataset;
use gantt_planner::ui;
use gantt_planner::{Planner, PlannerSettings};

/// Main application state.
pub struct PlannerApp {
    planner: Planner,
    storage: JsonFileStorage,
    last_saved_revision: u64,
    settings_path: PathBuf,
    saved_day_width: f32,
    search: String,
    focus_search: bool,
    scrolled_to_today: bool,
    status_message: String,
    /// Off when the data file exists but could not be read, so it is never
    /// overwritten with the sample plan. Open or Save as turns it back on.
    autosave: bool,
}

/// The plan the app opens on.
#[derive(Debug)]
struct Startup {
    dataset: Dataset,
    autosave: bool,
    message: String,
}

fn startup_plan(storage: &JsonFileStorage, today: NaiveDate) -> Startup {
    let path = storage.path().display();
    match storage.load_existing() {
        Ok(Some(dataset)) => Startup {
            dataset,
            autosave: true,
            message: format!("Loaded {}", path),
        },
        Ok(None) => {
            info!(path = %path, "no data file yet, starting from the sample plan");
            Startup {
                dataset: Dataset::sample(today),
                autosave: true,
                message: "Sample plan".to_string(),
            }
        }
        Err(e) => {
            warn!(path = %path, error = %e, "load failed, auto-save disabled");
            Startup {
                dataset: Dataset::sample(today),
                autosave: false,
                message: format!(
                    "Could not read {} ({}). Auto-save is off until Open or Save as.",
                    path, e
                ),
            }
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: PlannerSettings) -> Self {
        // Phosphor icons render inline with text as a font fallback
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let storage = JsonFileStorage::new(settings.data_path());
        let startup = startup_plan(&storage, today());

        let planner = Planner::new(startup.dataset, settings, today());
        Self {
            last_saved_revision: planner.revision(),
            settings_path: PlannerSettings::default_path(),
            saved_day_width: planner.window().day_width(),
            planner,
            storage,
            search: String::new(),
            focus_search: false,
            scrolled_to_today: false,
            status_message: startup.message,
            autosave: startup.autosave,
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Text fields own the keyboard while focused.
        if ctx.wants_keyboard_input() {
            return;
        }
        let commands: Vec<Command> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => command_for(*key, *modifiers),
                    _ => None,
                })
                .collect()
        });
        for command in commands {
            match command {
                Command::FocusSearch => self.focus_search = true,
                other => {
                    if self.planner.execute(other) {
                        self.status_message = format!("{:?}", other);
                    }
                }
            }
        }
    }

    fn open_plan(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt plan", &["json"])
            .pick_file()
        else {
            return;
        };
        let storage = JsonFileStorage::new(path);
        let result = storage
            .load()
            .and_then(|dataset| self.planner.replace_dataset(dataset));
        match result {
            Ok(()) => {
                info!(path = %storage.path().display(), "plan opened");
                self.status_message = format!("Loaded {}", storage.path().display());
                self.storage = storage;
                self.last_saved_revision = self.planner.revision();
                self.autosave = true;
            }
            Err(e) => {
                warn!(path = %storage.path().display(), error = %e, "open failed");
                self.status_message = format!("Error loading: {}", e);
            }
        }
    }

    fn save_plan_as(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt plan", &["json"])
            .set_file_name("plan.json")
            .save_file()
        else {
            return;
        };
        let storage = JsonFileStorage::new(path);
        match storage.save(self.planner.dataset()) {
            Ok(()) => {
                self.status_message = format!("Saved {}", storage.path().display());
                self.storage = storage;
                self.last_saved_revision = self.planner.revision();
                self.autosave = true;
            }
            Err(e) => {
                warn!(error = %e, "save as failed");
                self.status_message = format!("Error saving: {}", e);
            }
        }
    }

    /// Persist once a change has settled. Failures are logged and the
    /// in-memory plan stays authoritative.
    fn save_if_settled(&mut self) {
        let revision = self.planner.revision();
        if !self.autosave || self.planner.is_dragging() || revision == self.last_saved_revision {
            return;
        }
        self.last_saved_revision = revision;
        match self.storage.save(self.planner.dataset()) {
            Ok(()) => info!(revision, "plan saved"),
            Err(e) => {
                warn!(error = %e, "save failed");
                self.status_message = format!("Save failed: {}", e);
            }
        }
    }

    /// Remember the zoom across sessions.
    fn save_zoom_if_changed(&mut self) {
        let day_width = self.planner.window().day_width();
        if self.planner.is_dragging() || day_width == self.saved_day_width {
            return;
        }
        self.saved_day_width = day_width;
        match self.planner.settings_to_save().save_to(&self.settings_path) {
            Ok(()) => debug!(day_width, "settings saved"),
            Err(e) => warn!(error = %e, "settings save failed"),
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let mut toolbar_action = ui::toolbar::ToolbarAction::default();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            toolbar_action =
                ui::toolbar::show_toolbar(&mut self.planner, &mut self.search, self.focus_search, ui);
            ui.add_space(2.0);
        });
        self.focus_search = false;
        if toolbar_action.open {
            self.open_plan();
        }
        if toolbar_action.save_as {
            self.save_plan_as();
        }

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let critical = self.planner.critical_path();
                        ui.label(
                            egui::RichText::new(format!(
                                "Assignments: {} · Selected: {} · Critical path: {} d",
                                self.planner.dataset().assignments.len(),
                                self.planner.selection().len(),
                                critical.max_length
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            if toolbar_action.scroll_to_today || !self.scrolled_to_today {
                let label_w = self.planner.settings().layout.label_width;
                let client = (ui.available_width() - label_w).max(0.0);
                self.planner.scroll_to_date(today(), client);
                self.scrolled_to_today = true;
            }
            let interaction = ui::gantt_chart::show_gantt_chart(&mut self.planner, today(), ui);
            if interaction.changed {
                self.status_message = "Timeline updated".to_string();
            }
        });

        self.save_if_settled();
        self.save_zoom_if_changed();
    }
}
