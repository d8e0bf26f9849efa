#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use sms_report::config;
use sms_report::gui::SmsReportApp;

fn main() -> Result<(), eframe::Error> {
    config::load_dotenv();
    sms_report::init_logging();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_min_inner_size([480.0, 360.0])
            .with_inner_size([1024.0, 720.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Reporte SMS",
        options,
        Box::new(|_cc| Ok(Box::new(SmsReportApp::from_env()))),
    )
}
