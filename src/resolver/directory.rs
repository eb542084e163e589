use std::collections::HashMap;

use anyhow::bail;
use tracing::debug;

use super::{Resolver, UserNotFound};
use crate::config::{AccountEntry, DirectoryConfig};
use crate::resource::{Link, Rel, Resource};

/// In-memory resolver backed by the `directory` section of the config
///
/// Accounts are keyed by `(name, lowercase hostname)`. When `dummy_links` are
/// configured, unknown users on a served host get a synthesised resource built
/// from those templates (`{name}` and `{host}` are substituted), so their
/// responses have the same shape as real ones.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    hosts: Vec<String>,
    accounts: HashMap<(String, String), Resource>,
    dummy_links: Vec<Link>,
}

impl StaticDirectory {
    /// Build the directory, rejecting duplicate or incomplete entries
    pub fn from_config(config: &DirectoryConfig) -> anyhow::Result<Self> {
        let hosts: Vec<String> = config.hosts.iter().map(|h| h.to_ascii_lowercase()).collect();
        let mut accounts = HashMap::with_capacity(config.accounts.len());

        for entry in &config.accounts {
            if entry.name.is_empty() || entry.host.is_empty() {
                bail!("directory account entries need both `name` and `host`");
            }
            let key = (entry.name.clone(), entry.host.to_ascii_lowercase());
            if !hosts.is_empty() && !hosts.contains(&key.1) {
                bail!(
                    "account {}@{} is on a host not listed in `directory.hosts`",
                    entry.name,
                    entry.host
                );
            }
            if accounts.insert(key, resource_for(entry)).is_some() {
                bail!("duplicate directory account {}@{}", entry.name, entry.host);
            }
        }

        Ok(Self {
            hosts,
            accounts,
            dummy_links: config.dummy_links.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether unknown users get a synthesised resource
    pub fn masks_unknown_users(&self) -> bool {
        !self.dummy_links.is_empty()
    }

    fn serves_host(&self, hostname: &str) -> bool {
        self.hosts.is_empty() || self.hosts.iter().any(|h| h.eq_ignore_ascii_case(hostname))
    }
}

fn resource_for(entry: &AccountEntry) -> Resource {
    Resource {
        subject: Some(
            entry
                .subject
                .clone()
                .unwrap_or_else(|| format!("acct:{}@{}", entry.name, entry.host)),
        ),
        aliases: entry.aliases.clone(),
        properties: entry.properties.clone(),
        links: entry.links.clone(),
    }
}

fn expand(template: &str, username: &str, hostname: &str) -> String {
    template.replace("{name}", username).replace("{host}", hostname)
}

impl Resolver for StaticDirectory {
    fn find_user(&self, username: &str, hostname: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
        let key = (username.to_owned(), hostname.to_ascii_lowercase());
        match self.accounts.get(&key) {
            Some(resource) => Ok(resource.clone()),
            None => {
                debug!(username, hostname, "Account not in directory");
                Err(UserNotFound.into())
            }
        }
    }

    fn dummy_user(&self, username: &str, hostname: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
        if self.dummy_links.is_empty() || !self.serves_host(hostname) {
            return Err(UserNotFound.into());
        }
        let links = self
            .dummy_links
            .iter()
            .map(|tpl| Link {
                href: expand(&tpl.href, username, hostname),
                ..tpl.clone()
            })
            .collect();
        Ok(Resource {
            subject: Some(format!("acct:{username}@{hostname}")),
            links,
            ..Resource::default()
        })
    }
}
