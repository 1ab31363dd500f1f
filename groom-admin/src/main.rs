use anyhow::Context;
use groom_admin::logger::init_logger_with_file;
use groom_admin::{AdminConfig, MatrixEditor, ViewFilter, format_duration};
use groom_client::RestClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenvy::dotenv().ok();
    let config = AdminConfig::from_env()?;
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    tracing::info!(api_url = %config.api_url, "Groom admin report starting...");

    // 2. Backend
    let client = RestClient::new(&config.client_config()).context("Failed to build REST client")?;

    // 3. Load the matrix
    let editor = MatrixEditor::load(Arc::new(client)).await?;

    // 4. Report every breed, one page at a time
    let mut filter = ViewFilter {
        column_window: config.station_window,
        page_size: config.rows_per_page,
        ..Default::default()
    };
    loop {
        let view = editor.view(&filter);
        for row in &view.rows {
            let times: Vec<String> = row
                .cells
                .iter()
                .filter_map(|c| c.display.as_ref().map(|d| format!("{}={}", c.station_id, d)))
                .collect();
            tracing::info!(
                breed_id = row.breed.id,
                breed = %row.breed.name,
                status = ?row.status,
                dirty = row.dirty.any(),
                default = %format_duration(editor.derived_default(row.breed.id)),
                times = %times.join(" "),
                "Breed support"
            );
        }
        if view.page >= view.total_pages {
            tracing::info!(breeds = view.total_rows, stations = editor.stations().len(), "Report complete");
            break;
        }
        filter.page = view.page + 1;
    }

    Ok(())
}
