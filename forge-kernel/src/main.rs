/**
 * KAFKAFORGE KERNEL - Point d'entrée de la synthèse
 *
 * RÔLE : charge la config, lance un run de provisioning contre le PlanRecorder
 * et écrit le plan (JSON, ou YAML selon l'extension de sortie).
 *
 * Plan sur stdout (ou $KAFKAFORGE_PLAN_OUT), logs sur stderr. Rien n'est écrit en cas d'erreur.
 */

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

use kafkaforge_kernel::config::load_config;
use kafkaforge_kernel::{provision, Plan, PlanRecorder};

const PLAN_OUT_ENV_VAR: &str = "KAFKAFORGE_PLAN_OUT";

#[tokio::main]
async fn main() {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("synthesis failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = load_config().await.context("invalid configuration")?;
    let ns = config.ns();

    let mut recorder = PlanRecorder::new(&ns.stack_name(), &config.account_id, &config.region);
    let outcome = provision(&config, &mut recorder).context("provisioning failed")?;
    let plan = recorder.into_plan();

    info!(
        "plan {} ready: {} resources, {} alarms, {} widgets, security group {}",
        plan.stack_name,
        plan.resources.len(),
        outcome.alarm_count,
        outcome.widget_count,
        outcome.security_group_id
    );

    match std::env::var(PLAN_OUT_ENV_VAR).ok().map(PathBuf::from) {
        Some(path) => {
            let rendered = render(&plan, &path)?;
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("cannot write plan to {}", path.display()))?;
            info!("plan written to {}", path.display());
        }
        None => println!("{}", plan.to_json_pretty()?),
    }
    Ok(())
}

fn render(plan: &Plan, path: &std::path::Path) -> Result<String> {
    let rendered = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => plan.to_yaml()?,
        _ => plan.to_json_pretty()?,
    };
    Ok(rendered)
}
