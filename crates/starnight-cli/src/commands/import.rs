use std::io::{self, Read};

use anyhow::Context;
use starnight_persist::{FileTransport, MemoryTransport, PersistError, TransferOutcome, import_from};

use crate::cli::ImportArgs;
use crate::context::{AppContext, CliError, CliResult};

pub(crate) fn handle_import(ctx: &AppContext, args: ImportArgs) -> CliResult<()> {
    let outcome = match (args.token, args.from) {
        (Some(token), _) => import_from(&ctx.store, &mut MemoryTransport::with_token(token)),
        (None, Some(path)) => import_from(&ctx.store, &mut FileTransport::new(path)),
        (None, None) => {
            let mut token = String::new();
            io::stdin()
                .read_to_string(&mut token)
                .context("failed to read token from stdin")
                .map_err(CliError::failure)?;
            import_from(&ctx.store, &mut MemoryTransport::with_token(token))
        }
    };
    finish(ctx, &outcome)
}

fn finish(ctx: &AppContext, outcome: &TransferOutcome) -> CliResult<()> {
    match outcome.error() {
        None => {
            ctx.save()?;
            println!("{}", outcome.message());
            Ok(())
        }
        Some(PersistError::Transport { .. }) => {
            Err(CliError::failure(anyhow::anyhow!(outcome.message())))
        }
        Some(_) => Err(CliError::validation(outcome.message())),
    }
}
