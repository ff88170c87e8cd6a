use starnight_persist::{FileTransport, MemoryTransport, TransferOutcome, export_to};

use crate::cli::ExportArgs;
use crate::context::{AppContext, CliError, CliResult};

pub(crate) fn handle_export(ctx: &AppContext, args: ExportArgs) -> CliResult<()> {
    let outcome = match &args.to {
        Some(path) => export_to(&ctx.store, &mut FileTransport::new(path)),
        None => export_to(&ctx.store, &mut MemoryTransport::new()),
    };
    let TransferOutcome::Exported { token } = &outcome else {
        return Err(CliError::failure(anyhow::anyhow!(outcome.message())));
    };
    ctx.save()?;
    match &args.to {
        Some(path) => println!("{} Token written to {}.", outcome.message(), path.display()),
        None => println!("{token}"),
    }
    Ok(())
}
