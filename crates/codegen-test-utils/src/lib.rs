pub mod sandbox;

pub use sandbox::{CmdOutput, Sandbox, fake_token};
