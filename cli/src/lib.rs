pub mod form_cmd;

pub use form_cmd::FormCli;
