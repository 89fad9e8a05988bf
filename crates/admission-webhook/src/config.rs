use std::{fmt, net::SocketAddr, path::PathBuf, str::FromStr};

use admission_core::{admission_request::GroupVersionResource, resource::ResourceKind};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use lazy_static::lazy_static;

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

/// Which admission endpoints the server exposes. The validating and the
/// mutating handlers are usually deployed separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Webhooks {
    #[default]
    All,
    Validate,
    Mutate,
}

impl Webhooks {
    pub fn validate(&self) -> bool {
        matches!(self, Webhooks::All | Webhooks::Validate)
    }

    pub fn mutate(&self) -> bool {
        matches!(self, Webhooks::All | Webhooks::Mutate)
    }
}

impl FromStr for Webhooks {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Webhooks::All),
            "validate" => Ok(Webhooks::Validate),
            "mutate" => Ok(Webhooks::Mutate),
            _ => Err(anyhow!("unknown webhooks selection: {s}")),
        }
    }
}

impl fmt::Display for Webhooks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Webhooks::All => write!(f, "all"),
            Webhooks::Validate => write!(f, "validate"),
            Webhooks::Mutate => write!(f, "mutate"),
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub webhooks: Webhooks,
    pub target_resource: GroupVersionResource,
    pub allowed_registry: String,
    pub default_cpu_limit: String,
    pub default_memory_limit: String,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;
        let target_resource = target_resource(matches)?;

        let webhooks = matches
            .get_one::<String>("webhooks")
            .expect("This should not happen, there's a default value for webhooks")
            .parse::<Webhooks>()?;
        let allowed_registry = matches
            .get_one::<String>("allowed-registry")
            .expect("This should not happen, there's a default value for allowed-registry")
            .to_owned();
        let default_cpu_limit = non_empty(matches, "default-cpu-limit")?;
        let default_memory_limit = non_empty(matches, "default-memory-limit")?;

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            webhooks,
            target_resource,
            allowed_registry,
            default_cpu_limit,
            default_memory_limit,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("This should not happen, there's a default value for address"),
        matches
            .get_one::<String>("port")
            .expect("This should not happen, there's a default value for port")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .expect("This should not happen, there's a default value for cert-file");
    let key_file = matches
        .get_one::<String>("key-file")
        .expect("This should not happen, there's a default value for key-file");

    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        })),
        _ => Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        )),
    }
}

fn target_resource(matches: &ArgMatches) -> Result<GroupVersionResource> {
    let resource = GroupVersionResource::new(
        matches
            .get_one::<String>("resource-group")
            .expect("This should not happen, there's a default value for resource-group"),
        matches
            .get_one::<String>("resource-version")
            .expect("This should not happen, there's a default value for resource-version"),
        matches
            .get_one::<String>("resource")
            .expect("This should not happen, there's a default value for resource"),
    );

    if ResourceKind::from_resource(&resource).is_none() {
        return Err(anyhow!(
            "error parsing arguments: resource {} does not embed a pod spec",
            resource
        ));
    }
    Ok(resource)
}

fn non_empty(matches: &ArgMatches, id: &str) -> Result<String> {
    match matches.get_one::<String>(id) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_owned()),
        _ => Err(anyhow!("error parsing arguments: --{} cannot be empty", id)),
    }
}
