//! Data bridge: forwards one list controller's watch channels to the
//! TUI action loop.
//!
//! Started the first time a screen is shown. Starting the controller
//! issues the first fetch and the option-list fetches; from then on
//! every result, busy-flag and option change becomes an [`Action`].

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use erpdesk_core::{ErpClient, ListController, PostalFill};

use crate::action::Action;
use crate::screen::ScreenId;

pub async fn run_list_bridge(
    screen: ScreenId,
    controller: ListController<ErpClient>,
    mut postal: Option<mpsc::UnboundedReceiver<PostalFill>>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut results = controller.subscribe_results();
    let mut busy = controller.busy().subscribe();
    let mut options = controller.options().subscribe();

    controller.start().await;

    let _ = action_tx.send(Action::ResultsUpdated(screen, results.borrow_and_update().clone()));
    let _ = action_tx.send(Action::BusyChanged(screen, *busy.borrow_and_update()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = results.changed() => {
                let state = results.borrow_and_update().clone();
                let _ = action_tx.send(Action::ResultsUpdated(screen, state));
            }
            Ok(()) = busy.changed() => {
                let flag = *busy.borrow_and_update();
                let _ = action_tx.send(Action::BusyChanged(screen, flag));
            }
            Ok(()) = options.changed() => {
                let _ = options.borrow_and_update();
                let _ = action_tx.send(Action::OptionsUpdated(screen));
            }
            Some(fill) = recv_fill(&mut postal) => {
                let _ = action_tx.send(Action::PostalResolved(screen, fill));
            }
        }
    }

    controller.shutdown().await;
    debug!(%screen, "list bridge shut down");
}

/// Next pincode result, or pending forever for forms without one.
async fn recv_fill(rx: &mut Option<mpsc::UnboundedReceiver<PostalFill>>) -> Option<PostalFill> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
