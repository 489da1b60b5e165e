// Library root
// -----------
// Client for the CloudShell packaging REST API, plus the interactive menu
// the `cloudshell-rest` binary runs.
//
// Module responsibilities:
// - `api`: `PackagingClient`, one method per REST call, each translating
//   the response status into `ApiError`.
// - `config`: server address, timeout and credentials, read from the
//   environment when available.
// - `error`: `ApiError` and `ConfigError`.
// - `ui`: terminal flows that prompt for input and delegate to `api`.
pub mod api;
pub mod config;
pub mod error;
pub mod ui;

pub use api::{PackagingClient, Standard};
pub use config::{ClientConfig, Credentials};
pub use error::{ApiError, ConfigError};
