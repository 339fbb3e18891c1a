// ABOUTME: Command module aggregator for the muster CLI.
// ABOUTME: Re-exports init, deploy, and down command handlers.

mod deploy;
mod down;
mod init;

pub use deploy::{DeployOptions, deploy};
pub use down::down;
pub use init::init;
