// API client module: a small blocking HTTP client for the CloudShell
// packaging REST API. Logging in happens once, when the client is built;
// every other call is a single request that reuses the session token.

use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::{ApiError, Result};

/// Authenticated client for one CloudShell server.
///
/// The only way to get one is a successful login, so the token is always
/// present and never changes for the lifetime of the value.
#[derive(Clone)]
pub struct PackagingClient {
    client: Client,
    base_url: String,
    host: String,
    port: u16,
    token: String,
    auth: HeaderValue,
}

/// One entry of `GET /Standards`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Standard {
    pub standard_name: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Standard {
    /// Interpret the body returned by [`PackagingClient::installed_standards`].
    pub fn list_from_json(value: &serde_json::Value) -> serde_json::Result<Vec<Standard>> {
        Vec::<Standard>::deserialize(value)
    }
}

impl PackagingClient {
    /// Log into `http://{host}:{port}` with no request timeout.
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        domain: &str,
    ) -> Result<Self> {
        let config = ClientConfig::new(host, port);
        let credentials = Credentials::new(username, password).with_domain(domain);
        Self::connect(&config, &credentials)
    }

    /// Log in with `PUT /API/Auth/Login` and keep the returned token.
    pub fn connect(config: &ClientConfig, credentials: &Credentials) -> Result<Self> {
        // The blocking builder defaults to a 30s timeout; `None` lifts it.
        let client = Client::builder().timeout(config.timeout).build()?;
        let base_url = config.api_base();

        let url = format!("{}/Auth/Login", base_url);
        debug!(%url, "PUT");
        let res = client
            .put(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(login_body(credentials))
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            warn!(status = status.as_u16(), "login rejected");
            return Err(ApiError::LoginRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token = strip_quotes(&res.text()?).to_string();
        let auth = HeaderValue::from_str(&format!("Basic {}", token))
            .map_err(|_| ApiError::InvalidToken)?;
        info!(host = %config.host, port = config.port, user = %credentials.username, "logged in");

        Ok(PackagingClient {
            client,
            base_url,
            host: config.host.clone(),
            port: config.port,
            token,
            auth,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The session token, without the quotes the server wraps it in.
    pub fn token(&self) -> &str {
        &self.token
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn shell_url(&self, shell_name: &str) -> String {
        self.url(&format!("Shells/{}", urlencoding::encode(shell_name)))
    }

    /// Upload a new shell with `POST /Shells`. Only 201 counts as success;
    /// an existing shell comes back as [`ApiError::Generic`].
    pub fn add_shell(&self, shell_path: &Path) -> Result<()> {
        let (file_name, part) = file_part(shell_path)?;
        let form = multipart::Form::new().part(file_name, part);

        let url = self.url("Shells");
        debug!(%url, "POST");
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .multipart(form)
            .send()?;

        match res.status() {
            StatusCode::CREATED => Ok(()),
            _ => Err(generic(res)),
        }
    }

    /// Replace an existing shell with `PUT /Shells/{name}`.
    ///
    /// When `shell_name` is `None` or empty it is the file name without its
    /// extension.
    pub fn update_shell(&self, shell_path: &Path, shell_name: Option<&str>) -> Result<()> {
        let shell_name = match shell_name.filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => shell_name_from_path(shell_path).ok_or_else(|| no_file_name(shell_path))?,
        };
        let (file_name, part) = file_part(shell_path)?;
        let form = multipart::Form::new().part(file_name, part);

        let url = self.shell_url(&shell_name);
        debug!(%url, "PUT");
        let res = self
            .client
            .put(&url)
            .headers(self.auth_headers())
            .multipart(form)
            .send()?;

        match res.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(ApiError::ShellNotFound),
            _ => Err(generic(res)),
        }
    }

    /// `GET /Standards`. Servers older than 8.1 answer 404.
    pub fn installed_standards(&self) -> Result<serde_json::Value> {
        let url = self.url("Standards");
        debug!(%url, "GET");
        let res = self.client.get(&url).headers(self.auth_headers()).send()?;

        match res.status() {
            StatusCode::OK => Ok(res.json()?),
            StatusCode::NOT_FOUND => Err(unavailable(&url)),
            _ => Err(generic(res)),
        }
    }

    /// `GET /Shells/{name}`. Servers older than 8.2 answer 404 or 405, and a
    /// missing shell is reported as 400.
    pub fn get_shell(&self, shell_name: &str) -> Result<serde_json::Value> {
        let url = self.shell_url(shell_name);
        debug!(%url, "GET");
        let res = self.client.get(&url).headers(self.auth_headers()).send()?;

        match res.status() {
            StatusCode::OK => Ok(res.json()?),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Err(unavailable(&url)),
            StatusCode::BAD_REQUEST => Err(ApiError::ShellNotFound),
            _ => Err(generic(res)),
        }
    }

    /// `DELETE /Shells/{name}`. Same status handling as [`Self::get_shell`];
    /// deleting arrived in 9.2.
    pub fn delete_shell(&self, shell_name: &str) -> Result<()> {
        let url = self.shell_url(shell_name);
        debug!(%url, "DELETE");
        let res = self
            .client
            .delete(&url)
            .headers(self.auth_headers())
            .send()?;

        match res.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Err(unavailable(&url)),
            StatusCode::BAD_REQUEST => Err(ApiError::ShellNotFound),
            _ => Err(generic(res)),
        }
    }

    /// Export the named topologies as a package and return its raw bytes.
    pub fn export_package<S: AsRef<str>>(&self, topology_names: &[S]) -> Result<Vec<u8>> {
        let form: Vec<(&str, &str)> = topology_names
            .iter()
            .map(|name| ("TopologyNames", name.as_ref()))
            .collect();

        let url = self.url("Package/ExportPackage");
        debug!(%url, topologies = form.len(), "POST");
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .form(&form)
            .send()?;

        match res.status() {
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Err(unavailable(&url)),
            status if status.is_success() => Ok(res.bytes()?.to_vec()),
            _ => Err(generic(res)),
        }
    }

    /// Upload a package file to `POST /Package/ImportPackage`.
    pub fn import_package(&self, package_path: &Path) -> Result<()> {
        let (_, part) = file_part(package_path)?;
        let form = multipart::Form::new().part("file", part);

        let url = self.url("Package/ImportPackage");
        debug!(%url, "POST");
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .multipart(form)
            .send()?;

        match res.status() {
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Err(unavailable(&url)),
            status if status.is_success() => Ok(()),
            _ => Err(generic(res)),
        }
    }
}

/// Escape the characters the login endpoint would otherwise misread.
/// Only `+`, `/` and `=` are touched; everything else goes through as is.
pub fn escape_password(password: &str) -> String {
    password
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

/// `path/to/MyShell.zip` -> `MyShell`.
pub fn shell_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn login_body(credentials: &Credentials) -> String {
    format!(
        "username={}&password={}&domain={}",
        credentials.username,
        escape_password(&credentials.password),
        credentials.domain
    )
}

fn strip_quotes(raw: &str) -> &str {
    let raw = raw.strip_prefix('"').unwrap_or(raw);
    raw.strip_suffix('"').unwrap_or(raw)
}

// Opens the file and wraps it in a multipart part named after the file.
// The handle is owned by the part and closed once the request is done.
fn file_part(path: &Path) -> Result<(String, multipart::Part)> {
    let io_err = |source: io::Error| ApiError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| no_file_name(path))?
        .to_string();

    let part = multipart::Part::reader_with_length(file, len).file_name(file_name.clone());
    Ok((file_name, part))
}

fn no_file_name(path: &Path) -> ApiError {
    ApiError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no usable file name"),
    }
}

fn unavailable(url: &str) -> ApiError {
    warn!(%url, "endpoint not available on this server");
    ApiError::FeatureUnavailable
}

fn generic(res: Response) -> ApiError {
    let status = res.status();
    let body = res.text().unwrap_or_default();
    warn!(status = status.as_u16(), %body, "request failed");
    ApiError::Generic(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn escapes_only_plus_slash_and_equals() {
        assert_eq!(escape_password("a+b/c=d"), "a%2Bb%2Fc%3Dd");
        assert_eq!(escape_password("p@ss word&"), "p@ss word&");
        assert_eq!(escape_password("=="), "%3D%3D");
    }

    #[test]
    fn login_body_escapes_password_only() {
        let creds = Credentials::new("admin", "x+y/z=").with_domain("Global");
        assert_eq!(
            login_body(&creds),
            "username=admin&password=x%2By%2Fz%3D&domain=Global"
        );
    }

    #[test]
    fn shell_name_drops_directory_and_extension() {
        let path = PathBuf::from("/work/dist/MyShell.zip");
        assert_eq!(shell_name_from_path(&path).as_deref(), Some("MyShell"));
    }

    #[test]
    fn shell_name_strips_only_last_extension() {
        assert_eq!(
            shell_name_from_path(Path::new("dist/Cisco.IOS.zip")).as_deref(),
            Some("Cisco.IOS")
        );
        assert_eq!(
            shell_name_from_path(Path::new("NoExtension")).as_deref(),
            Some("NoExtension")
        );
        assert_eq!(shell_name_from_path(Path::new("/")), None);
    }

    #[test]
    fn strips_one_quote_from_each_end() {
        assert_eq!(strip_quotes("\"abc==\""), "abc==");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\"abc"), "abc");
        assert_eq!(strip_quotes("\"\"x\"\""), "\"x\"");
    }

    #[test]
    fn parses_standards_list() {
        let body = serde_json::json!([
            {"StandardName": "cloudshell_networking_standard", "Versions": ["5.0.0", "5.0.1"]},
            {"StandardName": "cloudshell_firewall_standard"}
        ]);
        let standards = Standard::list_from_json(&body).unwrap();
        assert_eq!(standards.len(), 2);
        assert_eq!(standards[0].standard_name, "cloudshell_networking_standard");
        assert_eq!(standards[0].versions, vec!["5.0.0", "5.0.1"]);
        assert!(standards[1].versions.is_empty());
    }
}
