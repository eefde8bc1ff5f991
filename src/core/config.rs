//! Configuration model.
//!
//! Loads the declared schema (environments, projects, secrets, service
//! accounts) from YAML, JSON or TOML and validates every naming invariant
//! up front. The resulting [`SecretsConfig`] is immutable for the rest of
//! the command.

use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::core::constants::DEFAULT_PREFIX_ROOT;
use crate::core::naming::{self, PhysicalName};
use crate::core::types::{LogicalKey, ServiceAccount};
use crate::core::validation::{identifier_problem, validate_key};
use crate::error::{ConfigError, Result};

/// Name of the built-in secret category.
const GLOBAL_CATEGORY: &str = "global_secrets";

/// Suffix marking additional secret categories.
const CATEGORY_SUFFIX: &str = "_secrets";

/// A declared secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSpec {
    /// Logical key.
    pub name: LogicalKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl SecretSpec {
    /// A required secret without default or description.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
            default: None,
        }
    }
}

fn default_required() -> bool {
    true
}

/// A project nested under an environment.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub id: String,
    pub secrets: Vec<SecretSpec>,
    pub service_accounts: Vec<ServiceAccount>,
}

/// A deployment environment.
#[derive(Debug, Clone)]
pub struct Environment {
    pub name: String,
    /// Store project (account) holding this environment's secrets.
    pub gcp_project: String,
    /// Physical name prefix, used verbatim.
    pub prefix: String,
    /// Environment-scope secrets grouped by category, `global_secrets` first.
    pub categories: IndexMap<String, Vec<SecretSpec>>,
    pub service_accounts: Vec<ServiceAccount>,
    pub projects: IndexMap<String, ProjectConfig>,
}

/// Root configuration.
#[derive(Debug, Clone)]
pub struct SecretsConfig {
    pub version: String,
    pub environments: IndexMap<String, Environment>,
}

/// A resolved scope: an environment, optionally narrowed to one project.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    env: &'a Environment,
    project: Option<&'a ProjectConfig>,
}

impl<'a> Scope<'a> {
    pub fn environment(&self) -> &'a Environment {
        self.env
    }

    pub fn project(&self) -> Option<&'a ProjectConfig> {
        self.project
    }

    pub fn project_id(&self) -> Option<&'a str> {
        self.project.map(|p| p.id.as_str())
    }

    /// Secrets declared directly in this scope.
    pub fn secrets(&self) -> Vec<&'a SecretSpec> {
        match self.project {
            Some(project) => project.secrets.iter().collect(),
            None => self.env.secrets().collect(),
        }
    }

    /// Find a declared secret of this scope.
    pub fn secret(&self, key: &str) -> Option<&'a SecretSpec> {
        self.secrets().into_iter().find(|s| s.name == key)
    }

    /// Physical name of a key in this scope.
    pub fn physical_name(&self, key: &str) -> PhysicalName {
        naming::resolve(&self.env.prefix, self.project_id(), key)
    }

    /// Physical names of every secret declared in this scope.
    pub fn physical_names(&self) -> BTreeSet<PhysicalName> {
        self.secrets()
            .iter()
            .map(|s| self.physical_name(&s.name))
            .collect()
    }

    /// Accounts authorized in this scope.
    ///
    /// Project scopes inherit the environment's accounts in addition to
    /// their own.
    pub fn service_accounts(&self) -> BTreeSet<ServiceAccount> {
        let mut accounts: BTreeSet<ServiceAccount> =
            self.env.service_accounts.iter().cloned().collect();
        if let Some(project) = self.project {
            accounts.extend(project.service_accounts.iter().cloned());
        }
        accounts
    }

    /// Display label (`staging` or `staging.web-app`).
    pub fn label(&self) -> String {
        match self.project {
            Some(project) => format!("{}.{}", self.env.name, project.id),
            None => self.env.name.clone(),
        }
    }
}

impl Environment {
    /// Every environment-scope secret across all categories.
    pub fn secrets(&self) -> impl Iterator<Item = &SecretSpec> {
        self.categories.values().flatten()
    }

    /// The environment-level scope.
    pub fn scope(&self) -> Scope<'_> {
        Scope {
            env: self,
            project: None,
        }
    }

    /// The scope of one project.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownProject` if the project is not declared.
    pub fn project_scope(&self, project: &str) -> Result<Scope<'_>> {
        let project = self
            .projects
            .get(project)
            .ok_or_else(|| ConfigError::UnknownProject {
                env: self.name.clone(),
                project: project.to_string(),
            })?;
        Ok(Scope {
            env: self,
            project: Some(project),
        })
    }

    /// The environment scope followed by every project scope.
    pub fn all_scopes(&self) -> Vec<Scope<'_>> {
        std::iter::once(self.scope())
            .chain(self.projects.values().map(|p| Scope {
                env: self,
                project: Some(p),
            }))
            .collect()
    }
}

impl SecretsConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, has an unsupported
    /// extension, fails to parse, or violates a naming invariant.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let raw: RawConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Some("json") => {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            _ => return Err(ConfigError::UnsupportedType(path.to_path_buf()).into()),
        };

        let config = Self::from_raw(raw)?;
        debug!(
            environments = config.environments.len(),
            version = %config.version,
            "config loaded"
        );
        Ok(config)
    }

    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on parse or validation failure.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Look up an environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownEnvironment` if it is not declared.
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment(name.to_string()).into())
    }

    /// Resolve an environment and optional project into a scope.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either is not declared.
    pub fn scope(&self, env: &str, project: Option<&str>) -> Result<Scope<'_>> {
        let env = self.environment(env)?;
        match project {
            Some(project) => env.project_scope(project),
            None => Ok(env.scope()),
        }
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mut environments: IndexMap<String, Environment> = IndexMap::new();
        for (key, raw_env) in raw.environments {
            let env = build_environment(&key, raw_env)?;
            // Same store project and prefix would resolve to the same names
            if let Some(other) = environments
                .values()
                .find(|o| o.gcp_project == env.gcp_project && o.prefix == env.prefix)
            {
                return Err(ConfigError::DuplicatePrefix {
                    first: other.name.clone(),
                    second: env.name.clone(),
                    prefix: env.prefix.clone(),
                    gcp_project: env.gcp_project.clone(),
                }
                .into());
            }
            environments.insert(key, env);
        }
        Ok(Self {
            version: raw.version,
            environments,
        })
    }
}

// --- Raw document ---

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_version", deserialize_with = "version_string")]
    version: String,
    #[serde(default)]
    environments: IndexMap<String, RawEnvironment>,
}

#[derive(Debug, Deserialize)]
struct RawEnvironment {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    gcp_project: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    projects: IndexMap<String, RawProject>,
    #[serde(default)]
    global_secrets: Vec<SecretSpec>,
    #[serde(default)]
    service_accounts: Vec<String>,
    #[serde(flatten)]
    extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    secrets: Vec<SecretSpec>,
    #[serde(default)]
    service_accounts: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn version_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn build_environment(key: &str, raw: RawEnvironment) -> Result<Environment> {
    check_identifier("environment", key)?;

    let name = raw.name.unwrap_or_else(|| key.to_string());
    let gcp_project = raw
        .gcp_project
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingStoreProject(key.to_string()))?;
    let prefix = match raw.prefix {
        Some(prefix) => prefix,
        None => format!("{DEFAULT_PREFIX_ROOT}-{name}"),
    };
    check_identifier(&format!("{key}.prefix"), &prefix)?;

    let mut categories = IndexMap::new();
    categories.insert(GLOBAL_CATEGORY.to_string(), raw.global_secrets);
    for (field, value) in raw.extra {
        if !field.ends_with(CATEGORY_SUFFIX) {
            continue;
        }
        let specs: Vec<SecretSpec> = serde_json::from_value(value)
            .map_err(|e| ConfigError::Parse(format!("{key}.{field}: {e}")))?;
        categories.insert(field, specs);
    }
    check_unique(key, categories.values().flatten())?;

    let mut projects = IndexMap::new();
    for (project_key, raw_project) in raw.projects {
        check_identifier(&format!("{key}.projects"), &project_key)?;
        if let Some(project_id) = &raw_project.project_id {
            if project_id != &project_key {
                return Err(ConfigError::ProjectIdMismatch {
                    key: project_key,
                    project_id: project_id.clone(),
                }
                .into());
            }
        }
        check_unique(&format!("{key}.{project_key}"), raw_project.secrets.iter())?;
        projects.insert(
            project_key.clone(),
            ProjectConfig {
                id: project_key,
                secrets: raw_project.secrets,
                service_accounts: dedup(raw_project.service_accounts),
            },
        );
    }

    Ok(Environment {
        name,
        gcp_project,
        prefix,
        categories,
        service_accounts: dedup(raw.service_accounts),
        projects,
    })
}

fn check_identifier(field: &str, value: &str) -> Result<()> {
    match identifier_problem(value) {
        Some(reason) => Err(ConfigError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        }
        .into()),
        None => Ok(()),
    }
}

fn check_unique<'a>(scope: &str, specs: impl Iterator<Item = &'a SecretSpec>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for spec in specs {
        if let Err(e) = validate_key(&spec.name) {
            return Err(ConfigError::InvalidIdentifier {
                field: format!("{scope} secret"),
                value: spec.name.clone(),
                reason: e.to_string(),
            }
            .into());
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigError::DuplicateSecret {
                scope: scope.to_string(),
                key: spec.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn dedup(accounts: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    accounts
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}
