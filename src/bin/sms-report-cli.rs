use std::fs;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use sms_report::config;
use sms_report::export::ReportKind;
use sms_report::{
    download_file_name, to_spreadsheet_bytes, ApiConfig, Args, CampaignClient, LoginConfig,
    QueryOutcome, SessionGate, StaticIdentity,
};

fn main() -> ExitCode {
    config::load_dotenv();
    sms_report::init_logging();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let mut gate = SessionGate::new(StaticIdentity::from(LoginConfig::from_env()));
    if !gate.authenticate(&args.user, &args.password) {
        return Err("Credenciales incorrectas. Intente nuevamente.".to_string());
    }

    let client = CampaignClient::new(ApiConfig::from_env().map_err(|e| e.to_string())?);
    let report = match client.query(&args.campaign) {
        QueryOutcome::InvalidId => {
            return Err("Por favor ingrese un ID de campaña válido.".to_string());
        }
        QueryOutcome::Failed(e) => return Err(e.to_string()),
        QueryOutcome::NoData => {
            println!("No se encontraron datos para la campaña ingresada.");
            return Ok(());
        }
        QueryOutcome::Loaded(report) => report,
    };

    fs::create_dir_all(&args.out_dir).map_err(|e| e.to_string())?;
    let now = Local::now().naive_local();
    for (kind, table) in [
        (ReportKind::Sent, &report.sent),
        (ReportKind::Received, &report.received),
    ] {
        println!("{}: {} filas", kind.title(), table.len());
        if table.is_empty() {
            continue;
        }

        let bytes = to_spreadsheet_bytes(table).map_err(|e| e.to_string())?;
        let path = args.out_dir.join(download_file_name(kind, now));
        fs::write(&path, bytes).map_err(|e| format!("Error al guardar el archivo: {}", e))?;
        println!("  -> {}", path.display());
    }

    Ok(())
}
