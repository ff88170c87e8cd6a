use starnight_store::ResetKind;
use tracing::info;

use crate::cli::ResetArgs;
use crate::context::{AppContext, CliResult};

pub(crate) fn handle_reset(ctx: &AppContext, args: &ResetArgs) -> CliResult<()> {
    let kind = ResetKind::from(args.kind);
    ctx.store.apply_reset(kind);
    ctx.save()?;
    info!(action = kind.as_str(), "reset applied");
    let scopes: Vec<&str> = kind.scopes().iter().map(|scope| scope.as_str()).collect();
    println!("Reset {}.", scopes.join(", "));
    Ok(())
}
