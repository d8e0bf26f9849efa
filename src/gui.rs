use chrono::Local;
use eframe::egui;
use rfd::FileDialog;

use crate::campaign::{CampaignClient, CampaignReport, QueryOutcome};
use crate::config::{ApiConfig, ConfigError, LoginConfig};
use crate::export::{download_file_name, to_spreadsheet_bytes, ReportKind};
use crate::report::{cell_text, Table};
use crate::{SessionGate, StaticIdentity};

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

pub struct SmsReportApp {
    gate: SessionGate,
    client: Result<CampaignClient, ConfigError>,
    username: String,
    password: String,
    campaign_id: String,
    report: CampaignReport,
    notice: Option<Notice>,
    export_status: String,
}

impl SmsReportApp {
    pub fn new(gate: SessionGate, client: Result<CampaignClient, ConfigError>) -> Self {
        Self {
            gate,
            client,
            username: String::new(),
            password: String::new(),
            campaign_id: String::new(),
            report: CampaignReport::empty(),
            notice: None,
            export_status: String::new(),
        }
    }

    /// Login identity and API settings from the process environment.
    pub fn from_env() -> Self {
        let gate = SessionGate::new(StaticIdentity::from(LoginConfig::from_env()));
        let client = ApiConfig::from_env().map(CampaignClient::new);
        if let Err(e) = &client {
            tracing::error!("{}", e);
        }
        Self::new(gate, client)
    }
}

impl eframe::App for SmsReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if self.gate.is_authenticated() {
                    self.query_view(ui);
                } else {
                    self.login_view(ui);
                }
            });
        });
    }
}

impl SmsReportApp {
    fn login_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Iniciar sesión");
        ui.add_space(10.0);

        egui::Grid::new("login_form")
            .num_columns(1)
            .spacing([0.0, 10.0])
            .show(ui, |ui| {
                add_form_field(ui, "Usuario:", &mut self.username, false);
                add_form_field(ui, "Contraseña:", &mut self.password, true);
            });

        ui.add_space(10.0);

        if ui.button("Ingresar").clicked() {
            self.login();
        }

        self.show_notice(ui);
    }

    fn query_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Consulta de Campaña SMS");
        ui.add_space(10.0);

        egui::Grid::new("query_form")
            .num_columns(1)
            .spacing([0.0, 10.0])
            .show(ui, |ui| {
                add_form_field(ui, "ID de campaña:", &mut self.campaign_id, false);
            });

        ui.add_space(10.0);

        if ui.button("Consultar API").clicked() {
            self.run_query();
        }

        self.show_notice(ui);

        for kind in [ReportKind::Sent, ReportKind::Received] {
            if self.table(kind).is_empty() {
                continue;
            }

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label(egui::RichText::new(kind.title()).strong().size(18.0));
                show_table(ui, kind, self.table(kind));
                if ui.button(format!("Descargar {}", kind.title())).clicked() {
                    self.download(kind);
                }
            });
        }

        if !self.export_status.is_empty() {
            ui.add_space(10.0);
            ui.label(&self.export_status);
        }
    }

    fn show_notice(&self, ui: &mut egui::Ui) {
        let Some(notice) = &self.notice else {
            return;
        };
        let visuals = ui.visuals().clone();
        let (color, text) = match notice {
            Notice::Success(text) => (egui::Color32::from_rgb(0, 160, 70), text),
            Notice::Info(text) => (visuals.hyperlink_color, text),
            Notice::Warning(text) => (visuals.warn_fg_color, text),
            Notice::Error(text) => (visuals.error_fg_color, text),
        };
        ui.add_space(10.0);
        ui.colored_label(color, text);
    }

    fn login(&mut self) {
        if self.gate.authenticate(&self.username, &self.password) {
            self.password.clear();
            self.notice = Some(Notice::Success("¡Ingreso exitoso!".to_string()));
        } else {
            self.notice = Some(Notice::Error(
                "Credenciales incorrectas. Intente nuevamente.".to_string(),
            ));
        }
    }

    fn run_query(&mut self) {
        self.export_status.clear();
        let client = match &self.client {
            Ok(client) => client,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };

        let (report, notice) = present(client.query(&self.campaign_id));
        self.report = report;
        self.notice = notice;
    }

    fn table(&self, kind: ReportKind) -> &Table {
        match kind {
            ReportKind::Sent => &self.report.sent,
            ReportKind::Received => &self.report.received,
        }
    }

    fn download(&mut self, kind: ReportKind) {
        let file_name = download_file_name(kind, Local::now().naive_local());
        let Some(path) = FileDialog::new()
            .set_file_name(&file_name)
            .add_filter("Excel", &["xlsx"])
            .save_file()
        else {
            return;
        };

        self.export_status = match to_spreadsheet_bytes(self.table(kind)) {
            Ok(bytes) => match std::fs::write(&path, bytes) {
                Ok(()) => format!("Archivo guardado: {}", path.display()),
                Err(e) => format!("Error al guardar el archivo: {}", e),
            },
            Err(e) => e.to_string(),
        };
    }
}

/// Tables and message to show for a finished query.
fn present(outcome: QueryOutcome) -> (CampaignReport, Option<Notice>) {
    let notice = match &outcome {
        QueryOutcome::InvalidId => Some(Notice::Warning(
            "Por favor ingrese un ID de campaña válido.".to_string(),
        )),
        QueryOutcome::Failed(e) => Some(Notice::Error(e.to_string())),
        QueryOutcome::NoData => Some(Notice::Info(
            "No se encontraron datos para la campaña ingresada.".to_string(),
        )),
        QueryOutcome::Loaded(_) => None,
    };
    (outcome.into_report(), notice)
}

fn show_table(ui: &mut egui::Ui, kind: ReportKind, table: &Table) {
    egui::ScrollArea::horizontal()
        .id_salt(kind.title())
        .show(ui, |ui| {
            egui::Grid::new(kind.title()).striped(true).show(ui, |ui| {
                for column in table.columns() {
                    ui.strong(column);
                }
                ui.end_row();

                for row in table.rows() {
                    for value in row {
                        ui.label(cell_text(value));
                    }
                    ui.end_row();
                }
            });
        });
}

fn add_form_field(ui: &mut egui::Ui, label: &str, value: &mut String, password: bool) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(
            egui::TextEdit::singleline(value)
                .password(password)
                .desired_width(f32::INFINITY),
        );
    });
    ui.end_row();
}
