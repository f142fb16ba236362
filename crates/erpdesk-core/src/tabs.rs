// ── Tabbed company editor ──
//
// One edit session per tab, all for the same company. Switching tabs
// only changes which session is active; every other tab keeps its
// draft until it is saved or the editor is dropped.

use std::sync::Arc;

use indexmap::IndexMap;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::backend::Backend;
use crate::catalog;
use crate::edit::{EditSession, SaveTarget, Saved};
use crate::error::CoreError;
use crate::form::FormSpec;
use crate::model::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CompanyTab {
    Company,
    Bank,
    Contact,
    #[strum(serialize = "WareHouse")]
    WareHouse,
    #[strum(serialize = "Security Cheques")]
    SecurityCheques,
    Forecast,
    #[strum(serialize = "KYC")]
    Kyc,
}

impl CompanyTab {
    /// Tab-bar order.
    pub const ALL: [CompanyTab; 7] = [
        Self::Company,
        Self::Bank,
        Self::Contact,
        Self::WareHouse,
        Self::SecurityCheques,
        Self::Forecast,
        Self::Kyc,
    ];

    pub fn form(self) -> &'static FormSpec {
        match self {
            Self::Company => &catalog::COMPANY_FORM,
            Self::Bank => &catalog::BANK_FORM,
            Self::Contact => &catalog::CONTACT_FORM,
            Self::WareHouse => &catalog::WAREHOUSE_FORM,
            Self::SecurityCheques => &catalog::SECURITY_CHEQUE_FORM,
            Self::Forecast => &catalog::FORECAST_FORM,
            Self::Kyc => &catalog::KYC_FORM,
        }
    }

    /// Sub-path under the company record; empty for the company itself.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Company => "",
            Self::Bank => "bank",
            Self::Contact => "contact",
            Self::WareHouse => "warehouse",
            Self::SecurityCheques => "security-cheque",
            Self::Forecast => "forecast",
            Self::Kyc => "kyc",
        }
    }
}

/// Tabs over one company, each with its own draft.
#[derive(Debug, Clone)]
pub struct TabbedSession {
    endpoint: &'static str,
    company: RecordId,
    active: CompanyTab,
    sessions: IndexMap<CompanyTab, EditSession>,
}

impl TabbedSession {
    pub fn new(company: RecordId) -> Self {
        Self::with_endpoint(catalog::COMPANIES.endpoint, company)
    }

    pub fn with_endpoint(endpoint: &'static str, company: RecordId) -> Self {
        Self {
            endpoint,
            company,
            active: CompanyTab::Company,
            sessions: CompanyTab::iter()
                .map(|t| (t, EditSession::new(t.form())))
                .collect(),
        }
    }

    pub fn company(&self) -> &RecordId {
        &self.company
    }

    pub fn active(&self) -> CompanyTab {
        self.active
    }

    pub fn switch(&mut self, tab: CompanyTab) {
        debug!(from = %self.active, to = %tab, "tab switched");
        self.active = tab;
    }

    pub fn session(&self, tab: CompanyTab) -> &EditSession {
        &self.sessions[&tab]
    }

    pub fn session_mut(&mut self, tab: CompanyTab) -> &mut EditSession {
        &mut self.sessions[&tab]
    }

    pub fn active_session(&self) -> &EditSession {
        self.session(self.active)
    }

    pub fn active_session_mut(&mut self) -> &mut EditSession {
        self.session_mut(self.active)
    }

    /// `{endpoint}{id}/` or `{endpoint}{id}/{slug}/`.
    pub fn path(&self, tab: CompanyTab) -> String {
        let id = self.company.path_segment();
        match tab.slug() {
            "" => format!("{}{id}/", self.endpoint),
            slug => format!("{}{id}/{slug}/", self.endpoint),
        }
    }

    /// Fetch `tab`'s data and open its session, unless a draft is
    /// already open there.
    pub async fn load<B: Backend>(&mut self, backend: &B, tab: CompanyTab) -> Result<(), CoreError> {
        if self.session(tab).is_open() {
            return Ok(());
        }
        let path = self.path(tab);
        let value = backend.get(&path, &[]).await?;
        let record = Record::try_from(value).map_err(|v| CoreError::Decode {
            message: format!("{path}: expected an object, got {v}"),
        })?;
        self.session_mut(tab).open_update(Arc::new(record));
        Ok(())
    }

    /// Save the active tab with a PATCH to its path.
    pub async fn save_active<B: Backend>(&mut self, backend: &B) -> Result<Saved, CoreError> {
        let target = SaveTarget::Patch(self.path(self.active));
        self.active_session_mut().save_to(backend, target).await
    }

    /// Tabs holding unsaved changes.
    pub fn dirty_tabs(&self) -> Vec<CompanyTab> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.is_dirty())
            .map(|(t, _)| *t)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> Arc<Record> {
        Arc::new(Record::try_from(value).unwrap())
    }

    #[test]
    fn tab_labels_and_paths() {
        let labels: Vec<String> = CompanyTab::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Company", "Bank", "Contact", "WareHouse", "Security Cheques", "Forecast", "KYC"]
        );

        assert_eq!(CompanyTab::ALL.to_vec(), CompanyTab::iter().collect::<Vec<_>>());

        let tabs = TabbedSession::new(RecordId::Number(12));
        assert_eq!(tabs.path(CompanyTab::Company), "api/customer/company/12/");
        assert_eq!(tabs.path(CompanyTab::Bank), "api/customer/company/12/bank/");
    }

    #[test]
    fn switching_keeps_other_drafts() {
        let mut tabs = TabbedSession::new(RecordId::Number(12));
        tabs.session_mut(CompanyTab::Company)
            .open_update(record(json!({"id": 12, "name": "Acme"})));
        tabs.active_session_mut().set_field("name", "Acme Ltd").unwrap();

        tabs.switch(CompanyTab::Kyc);
        tabs.active_session_mut()
            .open_update(record(json!({"gst_number": ""})));
        tabs.active_session_mut().set_field("gst_number", "22AAAAA0000A1Z5").unwrap();

        tabs.switch(CompanyTab::Company);
        assert_eq!(
            tabs.active_session().draft().unwrap()["name"],
            json!("Acme Ltd")
        );
        assert_eq!(tabs.dirty_tabs(), vec![CompanyTab::Company, CompanyTab::Kyc]);
    }
}
