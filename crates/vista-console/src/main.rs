use std::sync::Arc;

use tracing::{info, warn};
use vista_console::{
    Console, ConsoleConfig, Sources,
    sections::{alerts, flags, surveys},
};
use vista_core::PermissionSet;
use vista_model::ItemId;
use vista_observe::{Journal, LoggerFormat, logger_init};

const USER: &str = "hr-partner";

fn show(lines: Vec<String>) {
    for line in lines {
        info!(target: "vista::view", "{line}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = ConsoleConfig::from_env()?;
    logger_init(&cfg.logger)?;
    info!(
        format = %cfg.logger.format,
        latency_ms = u64::try_from(cfg.latency.as_millis()).unwrap_or(u64::MAX),
        "logger initialized"
    );
    let color = cfg.logger.use_color && cfg.logger.format == LoggerFormat::Text;

    // 2) Page
    let permissions = PermissionSet::new()
        .grant(USER, [alerts::ACT, surveys::MANAGE])
        .grant("admin", ["*"]);
    let sources = Sources::from_fixtures(&cfg)?;
    let console = Console::new(&cfg, &sources, Arc::new(Journal::new()), Arc::new(permissions));

    console.load_all().await;
    show(console.render(color));

    // 3) Interactions
    if console.alerts().can_act(USER) {
        let id = ItemId::from("al-006");
        match console.alerts().register_action(&id, "Counter-offer prepared").await {
            Ok(alert) => info!(alert = %alert.id, status = alert.status.label(), "action registered"),
            Err(e) => warn!(alert = %id, error = %e, "could not register action"),
        }
    }

    if console.flags().can_toggle(USER) {
        let id = ItemId::from("ff-digest");
        match console.flags().toggle(&id).await {
            Ok(flag) => info!(flag = %flag.id, enabled = flag.enabled, "flag toggled"),
            Err(e) => warn!(flag = %id, error = %e, "could not toggle flag"),
        }
    } else {
        info!(user = USER, action = flags::TOGGLE, "toggle hidden for this user");
    }

    if console.surveys().can_manage(USER) {
        if let Err(e) = console.surveys().create("", 25).await {
            warn!(field = "title", error = %e, "survey form rejected");
        }
        console.surveys().create("Exit interviews", 25).await?;
    }

    show(console.render(color));

    // 4) Leave the page
    console.shutdown();
    Ok(())
}
