mod bootstrap;

use anyhow::Result;
use wrapped_core::settings::Settings;
use wrapped_data::analysis::analyze;

/// Exit status for a run stopped by SIGINT (128 + 2).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;
    settings.validate()?;

    tracing::info!("claude-wrapped v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.analysis_config();
    tracing::info!(
        "Reading logs from {} (timezone {})",
        config.root().display(),
        config.tz
    );
    if !config.root().exists() {
        tracing::warn!(
            "{} does not exist; the summary will be empty",
            config.root().display()
        );
    }

    let analysis = tokio::task::spawn_blocking(move || analyze(&config));

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let Some(joined) = bootstrap::race_interrupt(analysis, interrupt).await else {
        // Dropping the runtime would wait on the blocking task.
        tracing::warn!("Interrupted; analysis abandoned");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    };
    let result = joined?;

    tracing::debug!("Run metadata: {:?}", result.metadata);

    let rendered = bootstrap::render_summary(&result.summary, settings.pretty)?;
    bootstrap::write_summary(&rendered, settings.output.as_deref())?;

    if let Some(path) = &settings.output {
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(())
}
