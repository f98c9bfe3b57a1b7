use clap::Args;

mod handler;

pub use handler::handle_command as config_handler;

#[derive(Args, Clone)]
pub struct ConfigArgs {
    #[arg(short, long, value_name = "FILE")]
    #[arg(required(true))]
    pub file: String,
}
