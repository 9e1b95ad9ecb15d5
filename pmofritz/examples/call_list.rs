//! Affiche le journal d'appels de la FritzBox configurée
//!
//! Les paramètres de connexion viennent de la section `fritzbox` de
//! pmoconfig (`~/.pmofritz/config.yaml` ou `PMOFRITZ_CONFIG__FRITZBOX__PASSWORD=...`).
//!
//! ```text
//! cargo run -p pmofritz --example call_list [csv]
//! ```

use pmofritz::{CallList, CallListFormat, CallType, FritzBox, remove_first_line};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pmoconfig::get_config();
    let level = config.get_log_min_level()?.to_lowercase();

    // Initialiser le logging (RUST_LOG prioritaire sur la configuration)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let csv = env::args().nth(1).is_some_and(|arg| arg == "csv");

    let fritz = FritzBox::from_config()?;
    println!("Connexion à {}...", fritz.address());
    fritz.initialize().await?;
    println!("✓ {} service(s) TR-064\n", fritz.catalog().len());

    if csv {
        let body = fritz.get_call_list(CallListFormat::Csv).await?;
        // première ligne : "sep=;"
        println!("{}", remove_first_line(&body, "\n"));
        return Ok(());
    }

    let body = fritz.get_call_list(CallListFormat::Xml).await?;
    let list = CallList::from_xml(&body)?;

    for call in &list.calls {
        let direction = match call.call_type {
            CallType::Incoming | CallType::ActiveIncoming => "←",
            CallType::Outgoing | CallType::ActiveOutgoing => "→",
            CallType::Missed => "✗",
            CallType::Rejected => "⊘",
            CallType::Unknown(_) => "?",
        };
        let who = if call.name.is_empty() {
            &call.caller
        } else {
            &call.name
        };
        println!("{} {}  {:<24} {}", direction, call.date, who, call.duration);
    }
    println!("\n{} appel(s)", list.calls.len());

    Ok(())
}
