use std::io::Read;
use std::process::ExitCode;

use serde_json::Value;
use tracing::{error, info, warn};

use expense_bot::config::Config;
use expense_bot::dispatcher::Dispatcher;
use expense_bot::llm::Client as LlmClient;
use expense_bot::logging;
use expense_bot::store::RecordStore;
use expense_bot::whatsapp::{WhatsAppGateway, is_valid_whatsapp_message};

fn read_payload(source: Option<&str>) -> std::io::Result<String> {
    match source {
        None | Some("-") => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
        Some(path) => std::fs::read_to_string(path),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "expense-bot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config.data_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 Starting expense-bot...");
    info!("Loaded config from {config_path}");
    info!("Store: {}", config.data_file.display());

    let raw = match read_payload(args.get(2).map(String::as_str)) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to read webhook payload: {e}");
            return ExitCode::FAILURE;
        }
    };
    let payload: Value = match serde_json::from_str(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Webhook payload is not JSON: {e}");
            return ExitCode::FAILURE;
        }
    };

    if !is_valid_whatsapp_message(&payload) {
        warn!("Not a WhatsApp message event, ignoring");
        return ExitCode::SUCCESS;
    }

    let llm = LlmClient::new(config.llm_api_key.clone())
        .with_base_url(config.llm_base_url.clone())
        .with_model(config.llm_model.clone());
    let gateway = match WhatsAppGateway::new(config.gateway()) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let store = RecordStore::new(config.data_file.clone());

    let dispatcher = Dispatcher::new(llm, store, gateway, config.recipient_waid.clone())
        .with_whatsapp_formatting(config.whatsapp_formatting);

    match dispatcher.dispatch(&payload).await {
        Ok(report) => {
            info!(
                "Replied to {} with {:?} (status {})",
                report.sender.wa_id,
                report.reply,
                report.outcome.status_code()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Dispatch failed: {e}");
            ExitCode::FAILURE
        }
    }
}
