use rst_common::with_logging::log::{debug, info};

use authenticator_core::deeplink::parse_link;
use authenticator_core::deeplink::types::AppLink;

use crate::commands::output::{print_rows, FieldRow};
use crate::types::CliError;

use super::DeeplinkArgs;

pub(crate) fn link_rows(link: &AppLink) -> Vec<FieldRow> {
    match link {
        AppLink::Connect(data) => vec![
            FieldRow::new("kind", "connect"),
            FieldRow::new("configuration", &data.configuration_url),
            FieldRow::optional("connect_query", data.connect_query.as_deref()),
        ],
        AppLink::Action(data) => vec![
            FieldRow::new("kind", "action"),
            FieldRow::new("action_id", &data.action_id),
            FieldRow::new("api_version", data.api_version.as_str()),
            FieldRow::optional("connect_url", data.connect_url.as_deref()),
            FieldRow::optional("provider_id", data.provider_id.as_deref()),
            FieldRow::optional("return_to", data.return_to.as_deref()),
        ],
    }
}

pub fn handle_command(args: DeeplinkArgs) -> Result<(), CliError> {
    debug!("[deeplink:parse] triggered...");

    let link = parse_link(&args.link).map_err(|err| CliError::DeeplinkError(err.to_string()))?;
    info!("[deeplink:parse] link accepted");

    print_rows(link_rows(&link))
}
