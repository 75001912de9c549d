mod demo;

use crossbeam_channel::{unbounded, Receiver};
use signalmap::{prelude::*, session::http::DEFAULT_BASE_URL};

/// Events reported by the engine callbacks, handled on the UI thread
enum UiMessage {
    MapClick(f64, f64),
    Marker(String, MarkerCategory),
    Recommendation(String),
}

/// Signal coverage viewer
fn main() -> anyhow::Result<()> {
    signalmap::init_logging();

    let runtime = tokio::runtime::Runtime::new()?;
    let config = EngineProfile::Desktop.resolve();

    let session = if std::env::args().any(|arg| arg == "--demo") {
        log::info!("using the offline demo backend");
        MapSession::with_backend(config.clone(), Arc::new(demo::DemoBackend))
    } else {
        let base_url =
            std::env::var("SIGNALMAP_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut backend = HttpBackend::new(base_url)?;
        if let Ok(token) = std::env::var("SIGNALMAP_TOKEN") {
            backend = backend.with_token(token);
        }
        MapSession::with_backend(config.clone(), Arc::new(backend))
    };
    let session =
        session.with_geolocation(Arc::new(FixedLocation(config.interaction.default_center)));

    let (sender, messages) = unbounded();
    let clicks = sender.clone();
    let markers = sender.clone();
    let callbacks = MapCallbacks::new()
        .on_map_click(move |lat, lon| {
            let _ = clicks.send(UiMessage::MapClick(lat, lon));
        })
        .on_marker_click(move |marker, category| {
            let _ = markers.send(UiMessage::Marker(marker.title.clone(), category));
        })
        .on_recommendation_click(move |rec| {
            let _ = sender.send(UiMessage::Recommendation(rec.id.clone()));
        });
    let controller = MapController::new(config, callbacks)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("signalmap - Signal Coverage"),
        ..Default::default()
    };

    let mut app = SignalMapApp {
        runtime,
        session,
        controller,
        host: HostElement::new("map", Point::new(0.0, 0.0)),
        messages,
        status: String::new(),
        threshold_dbm: -85.0,
    };
    app.load();

    eframe::run_native("signalmap-app", options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(())
}

struct SignalMapApp {
    runtime: tokio::runtime::Runtime,
    session: MapSession,
    controller: MapController,
    host: HostElement,
    messages: Receiver<UiMessage>,
    status: String,
    threshold_dbm: f64,
}

impl SignalMapApp {
    fn load(&mut self) {
        let summary = self.runtime.block_on(self.session.load());
        self.status = format!(
            "{} measurements, {} towers",
            summary.measurements, summary.towers
        );
    }

    fn report<T>(&mut self, result: signalmap::Result<T>, ok: impl FnOnce(T) -> String) {
        self.status = match result {
            Ok(value) => ok(value),
            Err(e) => format!("Error: {}", e),
        };
    }

    fn handle_messages(&mut self) {
        while let Ok(message) = self.messages.try_recv() {
            match message {
                UiMessage::MapClick(lat, lon) => {
                    let result = self.session.handle_map_click(lat, lon);
                    self.report(result, |event| format!("{:?}", event));
                }
                UiMessage::Marker(title, category) => {
                    self.status = format!("{:?}: {}", category, title);
                }
                UiMessage::Recommendation(id) => {
                    let result = self.session.toggle_recommendation(&id);
                    self.report(result, |change| format!("{}: {:?}", id, change));
                }
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Data");
        if ui.button("Reload").clicked() {
            self.load();
        }

        let mut operator = self.session.operator_filter().unwrap_or("all").to_string();
        egui::ComboBox::from_label("Operator")
            .selected_text(operator.clone())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut operator, "all".to_string(), "all");
                for op in self.session.operators() {
                    ui.selectable_value(&mut operator, op.clone(), op);
                }
            });
        self.session.set_operator_filter(Some(operator));

        let mut show_heatmap = self.session.show_heatmap();
        ui.checkbox(&mut show_heatmap, "Heatmap");
        self.session.set_show_heatmap(show_heatmap);

        let mut show_towers = self.session.show_towers();
        ui.checkbox(&mut show_towers, "Towers");
        self.session.set_show_towers(show_towers);

        if ui.button("Use my location").clicked() {
            let result = self.runtime.block_on(self.session.locate());
            self.report(result, |outcome| match outcome.nearby_towers {
                Some(n) => format!("Located, {} towers nearby", n),
                None => "Located; tower lookup failed".to_string(),
            });
        }

        ui.separator();
        ui.heading("Coverage analysis");
        ui.add(egui::Slider::new(&mut self.threshold_dbm, -110.0..=-60.0).text("Threshold dBm"));

        ui.horizontal(|ui| {
            if ui.button("Draw polygon").clicked() {
                let result = self.session.start_drawing();
                self.report(result, |_| "Click the map to add vertices".to_string());
            }
            if ui.button("Clear").clicked() {
                let result = self.session.clear_polygon();
                self.report(result, |_| "Polygon cleared".to_string());
            }
        });
        ui.label(format!("Vertices: {}", self.session.polygon().len()));

        if ui.button("Analyze").clicked() {
            let threshold = Some(self.threshold_dbm);
            let result = self
                .runtime
                .block_on(self.session.analyze_coverage(threshold));
            self.report(result, |stats| stats.summary());
        }

        if let Some(stats) = self.session.coverage_stats() {
            ui.label(stats.summary());
        }

        if !self.session.coverage_grid().is_empty() && ui.button("Recommend towers").clicked() {
            let result = self.runtime.block_on(self.session.request_recommendations());
            self.report(result, |outcome| match outcome {
                RecommendationOutcome::NoGaps => "No gaps found in this analysis".to_string(),
                RecommendationOutcome::Generated(n) => format!("{} recommendations generated", n),
            });
        }

        let selected: Vec<String> = self.session.selected_recommendations().to_vec();
        let rows: Vec<(String, String)> = self
            .session
            .sorted_recommendations()
            .into_iter()
            .map(|rec| {
                (
                    rec.id.clone(),
                    format!("{} | {:.2}/10 | {}", rec.priority.label(), rec.score, rec.reason),
                )
            })
            .collect();
        for (id, text) in rows {
            if ui.selectable_label(selected.contains(&id), text).clicked() {
                let result = self.session.toggle_recommendation(&id);
                self.report(result, |change| format!("{}: {:?}", id, change));
            }
        }

        ui.separator();
        ui.label(&self.status);
    }

    /// Forwards egui pointer input on the map rect to the host element
    fn forward_input(&self, ui: &egui::Ui, response: &egui::Response, rect: egui::Rect) {
        let local = |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        if let Some(pos) = response.interact_pointer_pos() {
            if response.double_clicked() {
                self.host.dispatch(InputEvent::DoubleClick { position: local(pos) });
            } else if response.clicked() {
                self.host.dispatch(InputEvent::click(local(pos)));
            }
            if response.drag_started() {
                self.host.dispatch(InputEvent::DragStart { position: local(pos) });
            }
        }
        if response.dragged() {
            let delta = response.drag_delta();
            self.host.dispatch(InputEvent::Drag {
                delta: Point::new(delta.x as f64, delta.y as f64),
            });
        }
        if response.drag_released() {
            self.host.dispatch(InputEvent::DragEnd);
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    self.host.dispatch(InputEvent::Scroll {
                        delta: scroll as f64,
                        position: local(pos),
                    });
                }
            }
        }
    }
}

impl eframe::App for SignalMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls")
            .resizable(true)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            self.host
                .set_size(Point::new(rect.width() as f64, rect.height() as f64));

            if !self.controller.is_initialized() {
                if let Err(e) = self.controller.initialize(&self.host) {
                    self.status = format!("Error: {}", e);
                    return;
                }
            }
            self.controller.tick(instant::Instant::now());

            let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
            self.forward_input(ui, &response, rect);
            if let Err(e) = self.controller.process_events() {
                self.status = format!("Error: {}", e);
            }
            self.handle_messages();

            let snapshot = self.session.snapshot();
            if let Err(e) = self.controller.apply_snapshot(&snapshot) {
                self.status = format!("Error: {}", e);
            }

            let mut context = match RenderContext::new(rect.width() as u32, rect.height() as u32) {
                Ok(context) => context,
                Err(e) => {
                    self.status = format!("Error: {}", e);
                    return;
                }
            };
            ui.painter()
                .rect_filled(rect, 0.0, egui::Color32::from_rgb(230, 230, 230));
            if let Err(e) = self.controller.render(&mut context) {
                self.status = format!("Error: {}", e);
            }
            paint_context(ui.painter(), rect, &context);

            let cursor = match self.controller.cursor() {
                CursorHint::Crosshair => egui::CursorIcon::Crosshair,
                CursorHint::Grab if response.dragged() => egui::CursorIcon::Grabbing,
                CursorHint::Grab => egui::CursorIcon::Grab,
            };
            if response.hovered() {
                ctx.set_cursor_icon(cursor);
            }
        });
    }
}
