//! Screen implementations. Every tab is a [`list::ListScreen`] over one
//! catalog resource.

pub mod company;
pub mod editor;
pub mod list;

use std::sync::Arc;

use erpdesk_core::{ErpClient, ListController, PostalClient, Session};

use crate::component::Component;
use crate::screen::ScreenId;

/// One list screen per tab, sharing the backend and the signed-in session.
pub fn create_screens(
    backend: &Arc<ErpClient>,
    session: &Arc<Session>,
    postal: Option<&Arc<PostalClient>>,
) -> Vec<(ScreenId, Box<dyn Component>)> {
    ScreenId::ALL
        .into_iter()
        .map(|id| {
            let controller =
                ListController::new(id.resource(), Arc::clone(backend), Arc::clone(session));
            let screen: Box<dyn Component> =
                Box::new(list::ListScreen::new(id, controller, postal.cloned()));
            (id, screen)
        })
        .collect()
}
