//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
//! Builder for creating a [`Socrata Handle`](crate::Handle)
//!

use std::default::Default;
use std::env;
use std::result::Result;
use std::time::Duration;

use crate::auth_common::config_file_credentials::{
    ConfigFileCredentials, DEFAULT_CONFIG_FILE_PATH,
};
use crate::auth_common::credentials::Credentials;
use crate::error::{ia_err, SocrataError};
use crate::handle::Handle;
use chrono::format::{Item, StrftimeItems};
use reqwest::Client;
use url::Url;

pub(crate) const DEFAULT_ENDPOINT: &str = "http://www.socrata.com/api";
pub(crate) const DEFAULT_DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const DEFAULT_DATE_OUTPUT_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Builder used to set all the parameters to create a [`Socrata Handle`](crate::Handle).
///
/// A builder with no other settings talks to `http://www.socrata.com/api` without
/// credentials, which is enough for reading public datasets. Publishing
/// requires credentials, see [`basic_auth()`](HandleBuilder::basic_auth()) and
/// [`auth_from_file()`](HandleBuilder::auth_from_file()).
#[derive(Debug, Clone)]
pub struct HandleBuilder {
    pub(crate) endpoint: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) public_host: Option<String>,
    pub(crate) date_input_format: String,
    pub(crate) date_output_format: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) client: Option<Client>,
}

impl Default for HandleBuilder {
    fn default() -> Self {
        HandleBuilder {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials: None,
            public_host: None,
            date_input_format: DEFAULT_DATE_INPUT_FORMAT.to_string(),
            date_output_format: DEFAULT_DATE_OUTPUT_FORMAT.to_string(),
            timeout: None,
            client: None,
        }
    }
}

impl HandleBuilder {
    /// Create a new HandleBuilder struct.
    ///
    /// Consider calling [`from_environment()`](HandleBuilder::from_environment()) to collect
    /// all parameters from the local environment by default.
    pub fn new() -> Self {
        HandleBuilder {
            ..Default::default()
        }
    }
    /// Build a new [`Handle`].
    ///
    /// Note: Internally, if the [`HandleBuilder`] contains
    /// a reference to an existing [`reqwest::Client`], it will clone and
    /// use that. Otherwise, it will create a new [`reqwest::Client`] for its
    /// own internal use. See [`reqwest_client()`](HandleBuilder::reqwest_client()).
    pub async fn build(self) -> Result<Handle, SocrataError> {
        Handle::new(&self).await
    }
    /// Gather configuration settings from the current environment.
    ///
    /// This method will scan the process [`standard environment`](std::env::Vars) to collect and
    /// set the configuration parameters. The values can be overridden in code if this method is
    /// called first and other methods are called afterwards, for example:
    ///```no_run
    /// # use socrata_rust_sdk::Handle;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    ///   let handle = Handle::builder()
    ///       .from_environment()?
    ///       .public_host("https://data.example.com")?
    ///       .build()
    ///       .await?;
    /// # Ok(())
    /// # }
    ///```
    /// The following environment variables are used:
    ///
    /// | variable | description |
    /// | -------- | ----------- |
    /// | `SOCRATA_AUTH_FILE` | Path to a Socrata config file, read with the `DEFAULT` profile. See [`HandleBuilder::auth_from_file()`]. |
    /// | `SOCRATA_ENDPOINT` | The API endpoint to use. See [`HandleBuilder::endpoint()`]. |
    /// | `SOCRATA_USERNAME` | Username for basic authentication. See [`HandleBuilder::basic_auth()`]. |
    /// | `SOCRATA_PASSWORD` | Password for basic authentication. Only used with `SOCRATA_USERNAME`. |
    /// | `SOCRATA_PUBLIC_HOST` | Public site used to build dataset links. See [`HandleBuilder::public_host()`]. |
    ///
    /// Values from the environment override values read from `SOCRATA_AUTH_FILE`.
    pub fn from_environment(mut self) -> Result<Self, SocrataError> {
        if let Ok(val) = env::var("SOCRATA_AUTH_FILE") {
            self = self.auth_from_file(&val)?;
        }
        if let Ok(val) = env::var("SOCRATA_ENDPOINT") {
            self = self.endpoint(&val)?;
        }
        if let Ok(user) = env::var("SOCRATA_USERNAME") {
            let pass = env::var("SOCRATA_PASSWORD").unwrap_or_default();
            self = self.basic_auth(&user, &pass)?;
        }
        if let Ok(val) = env::var("SOCRATA_PUBLIC_HOST") {
            self = self.public_host(&val)?;
        }
        Ok(self)
    }
    /// Set the API endpoint to use.
    ///
    /// The endpoint is the base of every API path, for example:
    /// ```text
    ///     // the default
    ///     http://www.socrata.com/api
    ///
    ///     // a dedicated site
    ///     https://data.example.com/api
    /// ```
    /// A trailing `/` is removed.
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, SocrataError> {
        let ep = endpoint.trim().trim_end_matches('/');
        let url = Url::parse(ep)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return ia_err!(
                "invalid endpoint '{}': scheme must be http or https",
                endpoint
            );
        }
        if url.host_str().is_none() {
            return ia_err!("invalid endpoint '{}': missing host", endpoint);
        }
        self.endpoint = ep.to_string();
        Ok(self)
    }
    /// Specify a username and password, sent with every request using HTTP basic authentication.
    pub fn basic_auth(mut self, username: &str, password: &str) -> Result<Self, SocrataError> {
        if username.is_empty() {
            return ia_err!("basic auth requires a non-empty username");
        }
        self.credentials = Some(Credentials::new(username, password));
        Ok(self)
    }
    /// Read credentials from a Socrata config file.
    ///
    /// This method assumes the use of the `"DEFAULT"` profile. The file uses
    /// INI syntax, for example:
    ///```text
    /// [DEFAULT]
    /// username=publisher@example.com
    /// password=1234567
    /// endpoint=https://data.example.com/api
    /// public_host=https://data.example.com
    ///```
    /// `username` is required. If `endpoint` or `public_host` are given, they are
    /// applied as if [`endpoint()`](HandleBuilder::endpoint()) and
    /// [`public_host()`](HandleBuilder::public_host()) were called.
    ///
    /// A leading `~/` in the path is expanded to the user's home directory. The
    /// conventional location is `~/.socrata/config`.
    pub fn auth_from_file(self, config_file: &str) -> Result<Self, SocrataError> {
        self.auth_from_file_with_profile(config_file, "DEFAULT")
    }
    /// Read credentials from the given profile of a Socrata config file.
    ///
    /// See [`auth_from_file()`](HandleBuilder::auth_from_file()) for the file format.
    pub fn auth_from_file_with_profile(
        mut self,
        config_file: &str,
        profile: &str,
    ) -> Result<Self, SocrataError> {
        let cfc = ConfigFileCredentials::new_from_file(config_file, profile)?;
        if let Some(ep) = &cfc.endpoint {
            self = self.endpoint(ep)?;
        }
        if let Some(ph) = &cfc.public_host {
            self = self.public_host(ph)?;
        }
        self.credentials = Some(cfc.credentials);
        Ok(self)
    }
    /// Read credentials from `~/.socrata/config` using the `"DEFAULT"` profile.
    pub fn auth_from_default_file(self) -> Result<Self, SocrataError> {
        self.auth_from_file(DEFAULT_CONFIG_FILE_PATH)
    }
    /// Set the public site used to build dataset links.
    ///
    /// See [`Dataset::link_url()`](crate::Dataset::link_url()). If not set, the scheme and host
    /// of the endpoint are used.
    pub fn public_host(mut self, public_host: &str) -> Result<Self, SocrataError> {
        let ph = public_host.trim().trim_end_matches('/');
        Url::parse(ph)?;
        self.public_host = Some(ph.to_string());
        Ok(self)
    }
    /// Set the formats used by [`Handle::format_date()`](crate::Handle::format_date()).
    ///
    /// Both use [`chrono::format::strftime`] syntax. `input` is the format of the dates
    /// passed in, `output` the format sent to the service. The defaults are
    /// `%Y-%m-%d %H:%M:%S` and `%m/%d/%Y %H:%M:%S`.
    pub fn date_format(mut self, input: &str, output: &str) -> Result<Self, SocrataError> {
        if input.is_empty() || output.is_empty() {
            return ia_err!("date formats must not be empty");
        }
        for f in [input, output] {
            if StrftimeItems::new(f).any(|i| matches!(i, Item::Error)) {
                return ia_err!("invalid date format '{}'", f);
            }
        }
        self.date_input_format = input.to_string();
        self.date_output_format = output.to_string();
        Ok(self)
    }
    /// Specify a [`reqwest::Client`] to use for all http/s connections.
    ///
    /// By default, the [`Socrata Handle`](crate::Handle) creates an internal [`reqwest::Client`] to use for
    /// all communications. If your application already has a reqwest Client, you can pass that
    /// into the HandleBuilder to avoid creating multiple connection pools.
    pub fn reqwest_client(mut self, client: &Client) -> Result<Self, SocrataError> {
        self.client = Some(client.clone());
        Ok(self)
    }
    /// Specify the timeout used for operations.
    ///
    /// Currently this is used for both connection and request timeouts.
    ///
    /// The default timeout is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self, SocrataError> {
        if timeout.is_zero() {
            return ia_err!("timeout must be greater than zero");
        }
        self.timeout = Some(timeout);
        Ok(self)
    }

    // scheme://host[:port] of the endpoint
    pub(crate) fn resolved_public_host(&self) -> Result<String, SocrataError> {
        if let Some(ph) = &self.public_host {
            return Ok(ph.clone());
        }
        let url = Url::parse(&self.endpoint)?;
        let host = match url.host_str() {
            Some(h) => h,
            None => return ia_err!("endpoint '{}' has no host", self.endpoint),
        };
        match url.port() {
            Some(p) => Ok(format!("{}://{}:{}", url.scheme(), host, p)),
            None => Ok(format!("{}://{}", url.scheme(), host)),
        }
    }
}
