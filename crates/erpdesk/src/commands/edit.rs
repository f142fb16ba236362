//! Write-side handlers: `create`, `update`, `company` and `assign`.
//!
//! Every write goes through an `EditSession` so the form's local
//! validation and derived-field rules run exactly as in the TUI.

use std::sync::Arc;

use serde_json::Value;

use erpdesk_core::catalog::BULK_ASSIGN_FORM;
use erpdesk_core::{
    CompanyTab, CoreError, EditSession, ErpClient, Record, RecordId, Saved, TabbedSession,
};

use crate::cli::{AssignArgs, CompanyArgs, CreateArgs, GlobalOpts, TabArg, UpdateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn editor_for(resource: &'static erpdesk_core::Resource) -> Result<EditSession, CliError> {
    resource.form.map(EditSession::new).ok_or_else(|| CliError::Validation {
        field: "resource".into(),
        reason: format!("{} has no edit form", resource.key),
    })
}

fn apply_fields(session: &mut EditSession, fields: Vec<(String, Value)>) -> Result<(), CliError> {
    for (key, value) in fields {
        if session.form().field(&key).is_none() {
            return Err(CliError::Validation {
                field: key,
                reason: format!("not a field of the {} form", session.form().title),
            });
        }
        session.set_field(&key, value)?;
    }
    Ok(())
}

fn report_saved(saved: &Saved, global: &GlobalOpts, what: &str) {
    let verb = if saved.created { "created" } else { "updated" };
    output::success(&global.color, global.quiet, &format!("{what} {verb}"));
    if let Ok(record) = Record::try_from(saved.response.clone()) {
        let out = output::render_record(&global.output, &record);
        output::print_output(&out, global.quiet);
    }
}

// ── create / update ─────────────────────────────────────────────────

pub async fn create(client: Arc<ErpClient>, args: CreateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resource = util::resolve_resource(&args.resource)?;
    let mut session = editor_for(resource)?;
    session.open_create();
    apply_fields(&mut session, util::collect_fields(&args.fields)?)?;

    let saved = session.save(client.as_ref()).await?;
    report_saved(&saved, global, resource.title);
    Ok(())
}

pub async fn update(client: Arc<ErpClient>, args: UpdateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resource = util::resolve_resource(&args.resource)?;
    let mut session = editor_for(resource)?;
    let record = util::fetch_record(client.as_ref(), resource, &args.id).await?;
    session.open_update(Arc::new(record));
    apply_fields(&mut session, util::collect_fields(&args.fields)?)?;

    if !session.is_dirty() {
        output::note(&global.color, global.quiet, "nothing to change");
        return Ok(());
    }
    let saved = session.save(client.as_ref()).await?;
    report_saved(&saved, global, resource.title);
    Ok(())
}

// ── company ─────────────────────────────────────────────────────────

impl From<TabArg> for CompanyTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Company => Self::Company,
            TabArg::Bank => Self::Bank,
            TabArg::Contact => Self::Contact,
            TabArg::Warehouse => Self::WareHouse,
            TabArg::SecurityCheque => Self::SecurityCheques,
            TabArg::Forecast => Self::Forecast,
            TabArg::Kyc => Self::Kyc,
        }
    }
}

pub async fn company(client: Arc<ErpClient>, args: CompanyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let tab = CompanyTab::from(args.tab);
    let mut tabs = TabbedSession::new(RecordId::from(args.id.as_str()));
    tabs.switch(tab);
    tabs.load(client.as_ref(), tab).await?;

    let fields = util::collect_fields(&args.fields)?;
    if fields.is_empty() {
        let draft = tabs.active_session().draft().cloned().unwrap_or_default();
        let out = output::render_record(&global.output, &Record::from(draft));
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    apply_fields(tabs.active_session_mut(), fields)?;
    let saved = tabs.save_active(client.as_ref()).await?;
    report_saved(&saved, global, &format!("{tab} tab"));
    Ok(())
}

// ── assign ──────────────────────────────────────────────────────────

pub async fn assign(client: Arc<ErpClient>, args: AssignArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = EditSession::new(&BULK_ASSIGN_FORM);
    session.open_create();
    session.set_field("assign_from", args.from.clone())?;
    session.set_field("assign_to", args.to.clone())?;

    // Local rules first, so a bad pair never prompts.
    let draft = session.draft().cloned().unwrap_or_default();
    BULK_ASSIGN_FORM
        .validate(&draft)
        .map_err(|errors| CoreError::Invalid { errors })?;

    let prompt = format!("Move every customer of {} to {}?", args.from, args.to);
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }
    session.save(client.as_ref()).await?;
    output::success(
        &global.color,
        global.quiet,
        &format!("customers of {} assigned to {}", args.from, args.to),
    );
    Ok(())
}
