//! Run command implementation

use anyhow::{Context, Result, bail};
use autoposter_adapters::ledger::SqliteLedger;
use autoposter_adapters::llm::{GenConfig, GeminiGenerator, OpenAiGenerator, StubGenerator};
use autoposter_adapters::publish::{LinkedInPublisher, OAuth1Credentials, XPublisher, XWriteCredentials};
use autoposter_adapters::sources::{RedditSource, XSearchSource};
use autoposter_domain::{
    ContentItem, ContentSource, DraftGenerator, ItemSource, Pipeline, PipelineConfig, Publisher,
    RunReport,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::args::RunArgs;
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let dry_run = args.dry_run || config.general.dry_run;

    let ledger = Arc::new(
        SqliteLedger::new(&config.general.ledger_db_path)
            .await
            .context("Failed to open ledger database")?,
    );

    let x_source = build_x_source(&config, &args);
    let reddit_source = build_reddit_source(&config, &args);
    let generator = build_generator(&config)?;
    let linkedin_publisher = Arc::new(build_linkedin_publisher(&config));
    let x_publisher = Arc::new(build_x_publisher(&config));

    if !linkedin_publisher.is_enabled() {
        warn!("LinkedIn credentials missing; posts will be queued as pending");
    }
    if !x_publisher.is_enabled() {
        warn!("X posting credentials missing; posts will be queued as pending");
    }

    let override_items = args.use_samples.then(sample_items);

    let pipeline_config = PipelineConfig {
        keywords: config.general.keywords.clone(),
        pending_retry_limit: config.retry.pending_limit,
        max_candidate_items: config.general.max_candidate_items,
        override_items,
        dry_run,
    };

    let pipeline = Pipeline::new(
        x_source,
        reddit_source,
        generator,
        linkedin_publisher,
        x_publisher,
        ledger,
        pipeline_config,
    );

    for invocation in 1..=args.repeat {
        if args.repeat > 1 {
            info!(invocation, total = args.repeat, "Starting pipeline invocation");
        }

        let report = pipeline.run_once().await;
        log_report(&report, dry_run);

        if invocation < args.repeat {
            tokio::time::sleep(std::time::Duration::from_secs(args.interval_seconds)).await;
        }
    }

    Ok(())
}

fn log_report(report: &RunReport, dry_run: bool) {
    for (platform, attempted, succeeded) in &report.retried {
        info!(platform = %platform, attempted, succeeded, "Retried pending posts");
    }

    info!(
        fetched = report.fetched,
        generated = report.generated,
        dry_run,
        "Pipeline invocation complete"
    );

    for (platform, outcome) in &report.published {
        info!(platform = %platform, outcome = ?outcome, "Publish outcome");
    }
}

/// Read an env var, treating unset or blank values as absent
fn env_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Load a required API key from the environment
pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.is_empty() {
        bail!("No API key environment variable configured for {}", provider);
    }

    let value = std::env::var(env_var).with_context(|| {
        format!(
            "Environment variable {} not set (required for {})",
            env_var, provider
        )
    })?;

    if value.trim().is_empty() {
        bail!("Environment variable {} is empty", env_var);
    }

    Ok(SecretString::new(value.into()))
}

fn build_x_source(config: &AppConfig, args: &RunArgs) -> Option<Arc<dyn ItemSource>> {
    if args.no_x {
        return None;
    }

    let bearer = env_opt(&config.x.read.bearer_token_env)?;
    Some(Arc::new(XSearchSource::new(
        SecretString::new(bearer.into()),
        config.x.read.max_results,
    )))
}

fn build_reddit_source(config: &AppConfig, args: &RunArgs) -> Option<Arc<dyn ItemSource>> {
    if args.no_reddit {
        return None;
    }

    let client_id = env_opt(&config.reddit.client_id_env)?;
    let client_secret = env_opt(&config.reddit.client_secret_env)?;
    Some(Arc::new(RedditSource::new(
        client_id,
        SecretString::new(client_secret.into()),
        config.reddit.user_agent.clone(),
        config.reddit.subreddits.clone(),
        config.reddit.limit_per_subreddit,
    )))
}

fn build_generator(config: &AppConfig) -> Result<Arc<dyn DraftGenerator>> {
    let gen_config = GenConfig {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
        timeout_secs: config.llm.timeout_secs,
    };

    match config.llm.provider.as_str() {
        "stub" => Ok(Arc::new(StubGenerator::new())),
        "openai" => {
            let api_key = load_api_key(&config.llm.openai.api_key_env, "OpenAI")?;
            Ok(Arc::new(OpenAiGenerator::with_base_url(
                api_key,
                config.llm.openai.base_url.clone(),
                gen_config,
            )))
        }
        "gemini" => {
            let api_key = load_api_key(&config.llm.gemini.api_key_env, "Gemini")?;
            let gen_config = GenConfig {
                model: config.llm.gemini.model.clone(),
                ..gen_config
            };
            Ok(Arc::new(GeminiGenerator::new(api_key, gen_config)))
        }
        "auto" => {
            if env_opt(&config.llm.gemini.api_key_env).is_some() {
                let api_key = load_api_key(&config.llm.gemini.api_key_env, "Gemini")?;
                let gen_config = GenConfig {
                    model: config.llm.gemini.model.clone(),
                    ..gen_config
                };
                Ok(Arc::new(GeminiGenerator::new(api_key, gen_config)))
            } else if env_opt(&config.llm.openai.api_key_env).is_some() {
                let api_key = load_api_key(&config.llm.openai.api_key_env, "OpenAI")?;
                Ok(Arc::new(OpenAiGenerator::with_base_url(
                    api_key,
                    config.llm.openai.base_url.clone(),
                    gen_config,
                )))
            } else {
                bail!(
                    "No LLM API key found; set {} or {}, or set llm.provider = \"stub\"",
                    config.llm.gemini.api_key_env,
                    config.llm.openai.api_key_env
                )
            }
        }
        other => bail!(
            "Unknown LLM provider '{}' (expected auto, openai, gemini, or stub)",
            other
        ),
    }
}

fn build_linkedin_publisher(config: &AppConfig) -> LinkedInPublisher {
    let Some(access_token) = env_opt(&config.linkedin.access_token_env) else {
        return LinkedInPublisher::disabled();
    };

    LinkedInPublisher::new(
        SecretString::new(access_token.into()),
        env_opt(&config.linkedin.id_token_env),
        env_opt(&config.linkedin.author_urn_env),
        config.linkedin.visibility.clone(),
    )
}

fn build_x_publisher(config: &AppConfig) -> XPublisher {
    let write = &config.x.write;

    let oauth1 = match (
        env_opt(&write.api_key_env),
        env_opt(&write.api_secret_env),
        env_opt(&write.access_token_env),
        env_opt(&write.access_token_secret_env),
    ) {
        (Some(ck), Some(cs), Some(at), Some(ats)) => Some(OAuth1Credentials {
            consumer_key: ck,
            consumer_secret: SecretString::new(cs.into()),
            access_token: at,
            access_token_secret: SecretString::new(ats.into()),
        }),
        _ => None,
    };

    let credentials = oauth1.map(XWriteCredentials::OAuth1).or_else(|| {
        env_opt(&write.oauth2_access_token_env)
            .map(|token| XWriteCredentials::OAuth2Bearer(SecretString::new(token.into())))
    });

    XPublisher::new(credentials)
}

/// Built-in items for offline smoke runs
fn sample_items() -> Vec<ContentItem> {
    vec![
        ContentItem {
            source: ContentSource::Sample,
            title: "OpenAI releases cost-effective model for content generation".to_string(),
            url: "https://example.com/openai-cheap-model".to_string(),
            created_at: OffsetDateTime::now_utc(),
            score: 120,
        },
        ContentItem {
            source: ContentSource::Sample,
            title: "Microsoft integrates AI agents across developer tools".to_string(),
            url: "https://example.com/microsoft-ai-agents".to_string(),
            created_at: OffsetDateTime::now_utc(),
            score: 95,
        },
    ]
}
