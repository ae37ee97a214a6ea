pub mod commands;
pub mod korail;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod stations;
pub mod validation;

/// ASCII art logo for the railwatch CLI
pub const LOGO: &str = "\
   ┬─┐┌─┐┬┬  ┬ ┬┌─┐┌┬┐┌─┐┬ ┬
   ├┬┘├─┤││  │││├─┤ │ │  ├─┤
   ┴└─┴ ┴┴┴─┘└┴┘┴ ┴ ┴ └─┘┴ ┴";
