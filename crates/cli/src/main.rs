//! `mbs-replay` -- replay selection operations against a recommendation set.
//!
//! Prints a JSON report of each operation's validation result and the
//! final selection state, summary and validation.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default | Description                          |
//! |----------------------------|----------|---------|--------------------------------------|
//! | `MBS_RECOMMENDATIONS_PATH` | yes      | --      | JSON array of code recommendations   |
//! | `MBS_REPLAY_OPS`           | no       | empty   | Comma-separated ops, e.g. `23,177,-23` |
//! | `MBS_MAX_SELECTED_CODES`   | no       | `10`    | Selection size limit                 |

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mbs_cli::{load_recommendations, replay, ReplayOp};
use mbs_core::config::SelectionConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mbs_cli=info,mbs_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SelectionConfig::from_env()?;
    tracing::info!(max_codes = config.max_codes, "Loaded selection configuration");

    let path: PathBuf = std::env::var("MBS_RECOMMENDATIONS_PATH")
        .context("MBS_RECOMMENDATIONS_PATH environment variable is required")?
        .into();
    let recommendations = load_recommendations(&path)?;
    tracing::info!(
        path = %path.display(),
        count = recommendations.len(),
        "Loaded recommendations"
    );

    let ops = ReplayOp::parse_list(&std::env::var("MBS_REPLAY_OPS").unwrap_or_default())?;

    let report = replay(config, recommendations, &ops);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
