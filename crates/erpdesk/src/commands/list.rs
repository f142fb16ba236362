//! Read-side handlers: `resources`, `list`, `show` and `export`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use erpdesk_core::{
    ErpClient, ExportJob, FetchOutcome, ListController, NO_RESPONSE_MESSAGE, Resource, SearchMode,
    Session,
};

use crate::cli::{ExportArgs, GlobalOpts, ListArgs, ShowArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── resources ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ResourceInfo {
    key: &'static str,
    title: &'static str,
    endpoint: &'static str,
    search: &'static str,
    filters: Vec<&'static str>,
    paginated: bool,
    editable: bool,
}

impl From<&Resource> for ResourceInfo {
    fn from(r: &Resource) -> Self {
        Self {
            key: r.key,
            title: r.title,
            endpoint: r.endpoint,
            search: match r.search {
                SearchMode::Server => "server",
                SearchMode::LocalPage { .. } => "loaded page only",
                SearchMode::Disabled => "none",
            },
            filters: r.filter_names().collect(),
            paginated: r.is_paginated(),
            editable: r.form.is_some(),
        }
    }
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Search")]
    search: String,
    #[tabled(rename = "Filters")]
    filters: String,
    #[tabled(rename = "Paged")]
    paginated: String,
}

impl From<&ResourceInfo> for ResourceRow {
    fn from(r: &ResourceInfo) -> Self {
        Self {
            key: r.key.into(),
            title: r.title.into(),
            search: r.search.into(),
            filters: r.filters.join(", "),
            paginated: if r.paginated { "yes" } else { "no" }.into(),
        }
    }
}

pub fn resources(global: &GlobalOpts) {
    let infos: Vec<ResourceInfo> = erpdesk_core::catalog::ALL
        .iter()
        .map(|r| ResourceInfo::from(*r))
        .collect();
    let out = output::render_list(&global.output, &infos, |r| ResourceRow::from(r), |r| r.key.into());
    output::print_output(&out, global.quiet);
}

// ── list ────────────────────────────────────────────────────────────

pub async fn list(client: Arc<ErpClient>, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resource = util::resolve_resource(&args.resource)?;
    let query = util::build_query(resource, &args.query, args.page)?;
    let ctrl = ListController::with_query(resource, client, Session::anonymous(), query);
    load_clamped(&ctrl).await?;

    let results = ctrl.results();
    let items = ctrl.visible_items();
    let out = output::render_records(&global.output, resource.columns, &items);
    output::print_output(&out, global.quiet);

    if let Some(ref rs) = results.result {
        let mut footer = format!(
            "page {}/{} ({} records)",
            rs.page,
            rs.total_pages().max(1),
            rs.total_count
        );
        if matches!(resource.search, SearchMode::LocalPage { .. }) && !ctrl.query().search.is_empty() {
            footer.push_str(", search applies to the loaded page only");
        }
        output::note(&global.color, global.quiet, &footer);
    }
    Ok(())
}

/// Load the requested page, landing on the last page when it lies
/// past the end.
async fn load_clamped(ctrl: &ListController<ErpClient>) -> Result<(), CliError> {
    let requested = ctrl.query().page;
    let mut outcome = ctrl.load().await;
    if requested > 1 && matches!(outcome, FetchOutcome::Failed(_)) {
        // Backends may refuse a page past the end; page 1 reports the count.
        ctrl.set_page(1);
        outcome = ctrl.load().await;
    }
    if let FetchOutcome::Failed(message) = outcome {
        return Err(fetch_failed(message));
    }

    let page = ctrl.set_page(requested);
    let loaded = ctrl.results().result.map(|rs| rs.page);
    if loaded != Some(page) {
        debug!(requested, page, "page out of range, clamped");
        if let FetchOutcome::Failed(message) = ctrl.load().await {
            return Err(fetch_failed(message));
        }
    }
    Ok(())
}

/// A failed list fetch only carries its user message.
fn fetch_failed(message: String) -> CliError {
    if message == NO_RESPONSE_MESSAGE {
        CliError::NoResponse {
            message,
            reason: "the list request got no response".into(),
        }
    } else {
        CliError::Server {
            detail: message.clone(),
            message,
        }
    }
}

// ── show ────────────────────────────────────────────────────────────

pub async fn show(client: Arc<ErpClient>, args: ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resource = util::resolve_resource(&args.resource)?;
    let record = util::fetch_record(client.as_ref(), resource, &args.id).await?;
    let out = output::render_record(&global.output, &record);
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── export ──────────────────────────────────────────────────────────

pub async fn export(client: Arc<ErpClient>, args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resource = util::resolve_resource(&args.resource)?;
    let query = util::build_query(resource, &args.query, 1)?;
    let job = ExportJob::new(resource, &query);
    let dest = args.out.unwrap_or_else(|| PathBuf::from(job.default_file_name()));

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Exporting {}", resource.title));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = job.run(client.as_ref(), &dest).await;
    spinner.finish_and_clear();
    let summary = result?;

    output::success(
        &global.color,
        global.quiet,
        &format!("{} rows written to {}", summary.rows, summary.path.display()),
    );
    Ok(())
}
