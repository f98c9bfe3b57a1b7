use clap::Args;

mod handler;

pub use handler::handle_command as deeplink_handler;

#[derive(Args, Clone)]
pub struct DeeplinkArgs {
    /// The connect or action link, quote it in the shell
    #[arg(required(true))]
    pub link: String,
}
