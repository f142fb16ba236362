//! Command dispatch: bridges CLI args to core operations and output formatting.

pub mod config_cmd;
pub mod edit;
pub mod insights;
pub mod list;
pub mod util;

use std::sync::Arc;

use erpdesk_core::{BackendConfig, ErpClient};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    backend: &BackendConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client: Arc<ErpClient> = Arc::new(backend.client()?);
    match cmd {
        Command::List(args) => list::list(client, args, global).await,
        Command::Show(args) => list::show(client, args, global).await,
        Command::Export(args) => list::export(client, args, global).await,
        Command::Create(args) => edit::create(client, args, global).await,
        Command::Update(args) => edit::update(client, args, global).await,
        Command::Company(args) => edit::company(client, args, global).await,
        Command::Assign(args) => edit::assign(client, args, global).await,
        Command::Dashboard(args) => insights::dashboard(client, args, global).await,
        Command::Invoice(args) => insights::invoice(client, args, global).await,
        // Handled before a backend is resolved
        Command::Resources
        | Command::Postal(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    }
}
