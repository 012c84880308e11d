use std::path::Path;
use std::sync::Arc;

use crate::config::{resolve_config_path, AppConfig};
use crate::data::data_registry::DataRegistry;
use crate::data::validate::validate_pincode;
use crate::logging::init_logging;
use crate::server;

const USAGE: &str = "usage: pincode-lookup <serve|check|lookup <pincode>> [--config <path>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Check,
    Lookup,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("check") => Some(Command::Check),
        Some("lookup") => Some(Command::Lookup),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    if command == Command::Lookup && lookup_arg(args).is_none() {
        eprintln!("usage: pincode-lookup lookup <pincode>");
        return 2;
    }

    let config_path = resolve_config_path(args);
    let config = match load_config(&config_path) {
        Some(config) => config,
        None => return 1,
    };
    if let Err(err) = init_logging(&config.logging) {
        eprintln!("failed to initialise logging: {err}");
        return 1;
    }

    match command {
        Command::Serve => handle_serve(&config),
        Command::Check => handle_check(&config),
        Command::Lookup => handle_lookup(&config, args),
    }
}

fn load_config(path: &Path) -> Option<AppConfig> {
    match AppConfig::load(path) {
        Ok(config) => Some(config),
        Err(err) => {
            eprintln!("config error: {err}");
            None
        }
    }
}

fn build_registry(config: &AppConfig) -> Option<Arc<DataRegistry>> {
    let built = config
        .dataset_source()
        .and_then(|source| Ok((source, config.cleaning_rules()?)));
    match built {
        Ok((source, rules)) => Some(DataRegistry::new(source, rules)),
        Err(err) => {
            eprintln!("config error: {err}");
            None
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    let Some(registry) = build_registry(config) else {
        return 1;
    };
    // Refuse to serve without data.
    if let Err(err) = registry.get() {
        eprintln!("dataset load failed: {err}");
        return 1;
    }

    match server::run_server(&config.server.bind, registry) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_check(config: &AppConfig) -> i32 {
    let Some(registry) = build_registry(config) else {
        return 1;
    };
    match registry.get() {
        Ok(store) => {
            println!(
                "dataset ok: records={}, columns={}",
                store.len(),
                store.columns().len()
            );
            0
        }
        Err(err) => {
            eprintln!("dataset load failed: {err}");
            1
        }
    }
}

fn lookup_arg(args: &[String]) -> Option<&String> {
    args.get(2).filter(|arg| !arg.starts_with("--"))
}

fn handle_lookup(config: &AppConfig, args: &[String]) -> i32 {
    let Some(raw) = lookup_arg(args) else {
        return 2;
    };
    let pincode = match validate_pincode(raw) {
        Ok(pincode) => pincode,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let Some(registry) = build_registry(config) else {
        return 1;
    };
    let store = match registry.get() {
        Ok(store) => store,
        Err(err) => {
            eprintln!("dataset load failed: {err}");
            return 1;
        }
    };
    let records = match store.filter_by_key(pincode) {
        Ok(records) => records,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&records) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize records: {err}");
            1
        }
    }
}
