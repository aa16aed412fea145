//! Auth command implementation
//!
//! Walks the user through the X OAuth 2.0 PKCE flow: print an authorization
//! URL, exchange the redirect code for tokens, and refresh expired tokens.

use anyhow::{Context, Result, bail};
use autoposter_adapters::oauth::{
    TokenSet, XOAuthClient, build_authorize_url, generate_pkce_pair,
};
use rand::Rng;
use std::path::PathBuf;

use crate::args::{AuthArgs, AuthCommands};
use crate::commands::run::load_api_key;
use crate::config::AppConfig;

pub async fn execute(args: AuthArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    match args.command {
        AuthCommands::XUrl { redirect_uri } => {
            let client_id = require_env(&config.x.oauth2.client_id_env)?;
            let redirect_uri = redirect_uri.unwrap_or_else(|| config.x.oauth2.redirect_uri.clone());

            let pkce = generate_pkce_pair();
            let state = random_state();
            let url = build_authorize_url(&client_id, &redirect_uri, &state, &pkce.challenge);

            println!("Open this URL in a browser and authorize the app:");
            println!();
            println!("  {}", url);
            println!();
            println!("After the redirect, run:");
            println!();
            println!(
                "  autoposter auth x-exchange --code <code> --verifier {}",
                pkce.verifier
            );

            Ok(())
        }

        AuthCommands::XExchange {
            code,
            verifier,
            redirect_uri,
        } => {
            let client = oauth_client(&config)?;
            let redirect_uri = redirect_uri.unwrap_or_else(|| config.x.oauth2.redirect_uri.clone());

            let tokens = client
                .exchange_code(&code, &redirect_uri, &verifier)
                .await
                .context("Token exchange failed")?;

            print_tokens(&tokens, &config.x.write.oauth2_access_token_env);
            Ok(())
        }

        AuthCommands::XRefresh { refresh_token } => {
            let client = oauth_client(&config)?;

            let tokens = client
                .refresh(&refresh_token)
                .await
                .context("Token refresh failed")?;

            print_tokens(&tokens, &config.x.write.oauth2_access_token_env);
            Ok(())
        }
    }
}

fn oauth_client(config: &AppConfig) -> Result<XOAuthClient> {
    let client_id = require_env(&config.x.oauth2.client_id_env)?;
    let client_secret = load_api_key(&config.x.oauth2.client_secret_env, "X OAuth 2.0")?;
    Ok(XOAuthClient::new(client_id, client_secret))
}

fn require_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("Environment variable {} not set", var),
    }
}

fn random_state() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn print_tokens(tokens: &TokenSet, access_token_env: &str) {
    println!("Access token obtained.");
    println!();
    println!("  export {}={}", access_token_env, tokens.access_token);
    if let Some(refresh) = &tokens.refresh_token {
        println!();
        println!("Refresh token (store securely; use with `auth x-refresh`):");
        println!();
        println!("  {}", refresh);
    }
    if let Some(expires_in) = tokens.expires_in {
        println!();
        println!("Expires in {} seconds.", expires_in);
    }
}
