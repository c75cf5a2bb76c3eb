//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::auth_common::credentials::Credentials;
use crate::auth_common::file_utils::expand_user_home;
use crate::error::{ia_err, SocrataError};
use ini::Ini;

pub(crate) const DEFAULT_CONFIG_FILE_PATH: &str = "~/.socrata/config";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const ENDPOINT: &str = "endpoint";
const PUBLIC_HOST: &str = "public_host";

/// Settings read from one profile of a Socrata config file.
///
/// The file uses INI syntax, one profile per section:
/// ```ini
/// [DEFAULT]
/// username=publisher@example.com
/// password=<password>
/// endpoint=https://data.example.com/api
/// public_host=https://data.example.com
/// ```
/// `username` is required. The other keys are optional.
#[derive(Debug, Clone)]
pub(crate) struct ConfigFileCredentials {
    pub(crate) credentials: Credentials,
    pub(crate) endpoint: Option<String>,
    pub(crate) public_host: Option<String>,
}

fn get_section_variable(
    file: &str,
    props: &ini::Properties,
    var: &str,
) -> Result<String, SocrataError> {
    match props.get(var) {
        Some(v) => Ok(v.to_string()),
        None => ia_err!(
            "error reading Socrata config file '{}': missing field '{}'",
            file,
            var
        ),
    }
}

fn optional_variable(props: &ini::Properties, var: &str) -> Option<String> {
    props
        .get(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ConfigFileCredentials {
    pub(crate) fn new_from_file(
        config_file_path: &str,
        profile_name: &str,
    ) -> Result<Self, SocrataError> {
        tracing::debug!(
            "Reading Socrata credentials from file {} and profile {}",
            config_file_path,
            profile_name
        );
        let file_path = expand_user_home(config_file_path);
        let config = match Ini::load_from_file(&file_path) {
            Ok(c) => c,
            Err(e) => {
                return ia_err!("error reading Socrata config file '{}': {}", file_path, e);
            }
        };
        let profile_data = match config.section(Some(profile_name)) {
            Some(p) => p,
            None => {
                return ia_err!(
                    "error reading Socrata config file '{}': missing profile '{}'",
                    file_path,
                    profile_name
                );
            }
        };

        let username = get_section_variable(&file_path, profile_data, USERNAME)?;
        // an empty password is allowed, for accounts using app tokens elsewhere
        let password = profile_data.get(PASSWORD).unwrap_or("").to_string();

        let endpoint = optional_variable(profile_data, ENDPOINT);
        if endpoint.is_none() {
            tracing::debug!("no '{}' specified in Socrata config file", ENDPOINT);
        }

        Ok(ConfigFileCredentials {
            credentials: Credentials::new(&username, &password),
            endpoint,
            public_host: optional_variable(profile_data, PUBLIC_HOST),
        })
    }
}
