use crate::cli::{OutputFormat, ShowArgs};
use crate::context::{AppContext, CliResult};
use crate::output::render_snapshot;

pub(crate) fn handle_show(ctx: &AppContext, args: &ShowArgs, format: OutputFormat) -> CliResult<()> {
    render_snapshot(&ctx.store.snapshot(), args.scope, format)
}
