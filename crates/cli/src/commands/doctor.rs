//! Doctor command - validate configuration and show status

use anyhow::Result;
use autoposter_adapters::ledger::SqliteLedger;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    ledger: CheckResult,
    llm: CheckResult,
    reddit: CheckResult,
    x_read: CheckResult,
    x_write: CheckResult,
    linkedin: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        ledger: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        reddit: CheckResult::error("Not checked"),
        x_read: CheckResult::error("Not checked"),
        x_write: CheckResult::error("Not checked"),
        linkedin: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.ledger = check_ledger(config).await;
        report.llm = check_llm(config);
        report.reddit = check_reddit(config);
        report.x_read = check_x_read(config);
        report.x_write = check_x_write(config);
        report.linkedin = check_linkedin(config);
    }

    // Missing source or posting credentials degrade gracefully at run time,
    // so only config, ledger, and LLM failures are fatal here
    let checks = [&report.config, &report.ledger, &report.llm];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = [
        &report.config,
        &report.ledger,
        &report.llm,
        &report.reddit,
        &report.x_read,
        &report.x_write,
        &report.linkedin,
    ]
    .iter()
    .all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_ledger(config: &AppConfig) -> CheckResult {
    match SqliteLedger::new(&config.general.ledger_db_path).await {
        Ok(_) => CheckResult::ok(format!(
            "Ledger database: {}",
            config.general.ledger_db_path.display()
        )),
        Err(e) => CheckResult::error(format!("Failed to open ledger database: {}", e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = &config.llm.model;

    match provider.as_str() {
        "stub" => CheckResult::ok("Provider: stub (offline)".to_string()),
        "openai" => key_check("openai", model, &config.llm.openai.api_key_env),
        "gemini" => key_check("gemini", &config.llm.gemini.model, &config.llm.gemini.api_key_env),
        "auto" => {
            if env_is_set(&config.llm.gemini.api_key_env) {
                CheckResult::ok(format!(
                    "Provider: auto (gemini), Model: {}, API key: {} (set)",
                    config.llm.gemini.model, config.llm.gemini.api_key_env
                ))
            } else if env_is_set(&config.llm.openai.api_key_env) {
                CheckResult::ok(format!(
                    "Provider: auto (openai), Model: {}, API key: {} (set)",
                    model, config.llm.openai.api_key_env
                ))
            } else {
                CheckResult::error(format!(
                    "Provider: auto, no API key set ({} or {})",
                    config.llm.gemini.api_key_env, config.llm.openai.api_key_env
                ))
            }
        }
        other => CheckResult::error(format!("Unknown provider: {}", other)),
    }
}

fn key_check(provider: &str, model: &str, api_key_env: &str) -> CheckResult {
    if api_key_env.is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", provider));
    }

    if env_is_set(api_key_env) {
        CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, api_key_env
        ))
    } else {
        CheckResult::error(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            provider, model, api_key_env
        ))
    }
}

fn check_reddit(config: &AppConfig) -> CheckResult {
    let id_env = &config.reddit.client_id_env;
    let secret_env = &config.reddit.client_secret_env;

    if config.reddit.subreddits.is_empty() {
        return CheckResult::warn("No subreddits configured");
    }

    if env_is_set(id_env) && env_is_set(secret_env) {
        CheckResult::ok(format!(
            "Credentials: {}/{} (set), Subreddits: {}",
            id_env,
            secret_env,
            config.reddit.subreddits.len()
        ))
    } else {
        CheckResult::warn(format!(
            "Credentials: {}/{} (not set), source will be skipped",
            id_env, secret_env
        ))
    }
}

fn check_x_read(config: &AppConfig) -> CheckResult {
    let env_var = &config.x.read.bearer_token_env;

    if env_var.is_empty() {
        return CheckResult::error("No bearer token env var configured");
    }

    if env_is_set(env_var) {
        CheckResult::ok(format!("Bearer token: {} (set)", env_var))
    } else {
        CheckResult::warn(format!(
            "Bearer token: {} (not set), source will be skipped",
            env_var
        ))
    }
}

fn check_x_write(config: &AppConfig) -> CheckResult {
    let write = &config.x.write;

    let oauth1_complete = [
        &write.api_key_env,
        &write.api_secret_env,
        &write.access_token_env,
        &write.access_token_secret_env,
    ]
    .iter()
    .all(|env| env_is_set(env));

    if oauth1_complete {
        return CheckResult::ok("OAuth 1.0a credential set (set)".to_string());
    }

    if env_is_set(&write.oauth2_access_token_env) {
        return CheckResult::ok(format!(
            "OAuth 2.0 user token: {} (set)",
            write.oauth2_access_token_env
        ));
    }

    CheckResult::warn("No posting credentials; X posts will be queued as pending".to_string())
}

fn check_linkedin(config: &AppConfig) -> CheckResult {
    let token_env = &config.linkedin.access_token_env;

    if !env_is_set(token_env) {
        return CheckResult::warn(format!(
            "Access token: {} (not set), LinkedIn posts will be queued as pending",
            token_env
        ));
    }

    let urn_hint = if env_is_set(&config.linkedin.author_urn_env) {
        "explicit URN"
    } else if env_is_set(&config.linkedin.id_token_env) {
        "URN from id_token"
    } else {
        "URN resolved via API"
    };

    CheckResult::ok(format!("Access token: {} (set), {}", token_env, urn_hint))
}

fn env_is_set(var: &str) -> bool {
    !var.is_empty()
        && std::env::var(var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
}

fn print_report(report: &DoctorReport) {
    println!("autoposter Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Ledger", &report.ledger);
    print_check("LLM Provider", &report.llm);
    print_check("Reddit", &report.reddit);
    print_check("X Read", &report.x_read);
    print_check("X Write", &report.x_write);
    print_check("LinkedIn", &report.linkedin);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: autoposter run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
