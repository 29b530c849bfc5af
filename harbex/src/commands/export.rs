use crate::context::AppContext;
use crate::format::Formatter;
use chrono::Local;
use libharbex::export::DEFAULT_OUTPUT_ROOT;
use libharbex::{
    Client, ClientConfig, CommandTool, Exporter, HarbexError, ImageReference, ImageTool, Result,
    RunLayout, discover,
};
use tracing::info;

/// Runs one export: discovery, pull, save and import script.
pub fn handle_export(ctx: &AppContext, formatter: &Formatter) -> Result<()> {
    let layout = RunLayout::new(DEFAULT_OUTPUT_ROOT, &Local::now());
    let tool = CommandTool::new(ctx.config.tool.as_str());
    let exporter = Exporter::from_config(&ctx.config, tool, layout)?;

    formatter.heading("Harbor export");
    for (key, value) in banner_fields(ctx, &exporter) {
        formatter.field(key, &value);
    }

    let images = discover_images(ctx, formatter)?;
    let summary = exporter.run(&images)?;
    info!(
        images = summary.images,
        archives = summary.archives,
        "Export finished"
    );

    formatter.success(&format!(
        "Exported {} images into {} archives",
        summary.images, summary.archives
    ));
    formatter.heading("Output");
    formatter.field(
        "archives",
        &exporter.layout().archive_glob().display().to_string(),
    );
    formatter.field("import script", &summary.script.display().to_string());

    Ok(())
}

/// The settings shown before a run starts.
pub fn banner_fields<T: ImageTool>(
    ctx: &AppContext,
    exporter: &Exporter<T>,
) -> Vec<(&'static str, String)> {
    vec![
        ("config", ctx.config_path.display().to_string()),
        ("registry", ctx.config.registry_host().to_string()),
        ("insecure tls", ctx.insecure_tls.to_string()),
        (
            "username",
            ctx.credentials.username().unwrap_or("(anonymous)").to_string(),
        ),
        ("tool", ctx.config.tool.clone()),
        ("pool", exporter.pool_threads().to_string()),
        ("per archive", exporter.batch_size().to_string()),
        ("output", exporter.layout().dir().display().to_string()),
    ]
}

fn discover_images(ctx: &AppContext, formatter: &Formatter) -> Result<Vec<ImageReference>> {
    let client = Client::with_config(
        &ctx.config.registry,
        ctx.credentials.clone(),
        ClientConfig::new().with_insecure_tls(ctx.insecure_tls),
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| HarbexError::network_with_source("Failed to start async runtime", e))?;

    let spinner = formatter.spinner("Discovering images");
    match runtime.block_on(discover(
        &client,
        ctx.config.registry_host(),
        &ctx.config.projects,
    )) {
        Ok(images) => {
            formatter.finish_spinner(spinner, &format!("Discovered {} images", images.len()));
            Ok(images)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
