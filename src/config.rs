use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_COMPONENTS_DIR: &str = "src/components/generated";
const DEFAULT_STORIES_DIR: &str = "src/stories";
const DEFAULT_GENERATED_DIR: &str = "generated";
const DEFAULT_TOKENS_FILE: &str = "src/design-tokens/tokens.json";
const DEFAULT_STUB_EXTENSION: &str = "astro";
const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8787";
const DEFAULT_PACING_MS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration, constructed once at process entry and passed by
/// reference into every component. Nothing reads the environment after
/// this is built.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub registry_base_url: String,
    pub registry_space_id: String,
    pub registry_management_token: String,
    pub registry_preview_token: String,
    pub webhook_secret: Option<String>,
    pub design_tool_base_url: String,
    pub design_tool_token: String,
    pub design_tool_file_key: String,
    pub build_hook_url: Option<String>,
    pub publish_command: Option<String>,
    pub components_dir: PathBuf,
    pub stories_dir: PathBuf,
    pub generated_dir: PathBuf,
    pub tokens_file: PathBuf,
    pub stub_extension: String,
    pub auto_create_stories: bool,
    pub auto_deploy: bool,
    pub pacing: Duration,
    pub request_timeout: Duration,
    pub http_bind_address: SocketAddr,
}

impl SyncConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let pick = |cli: &Option<String>, file: &Option<String>| -> String {
            cli.clone()
                .or_else(|| file.clone())
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        let http_bind_address = args
            .http_bind
            .or(file_config.http_bind)
            .unwrap_or_else(|| {
                DEFAULT_HTTP_BIND
                    .parse()
                    .expect("default bind address valid")
            });

        let pacing_ms = args
            .pacing_ms
            .or(file_config.pacing_ms)
            .unwrap_or(DEFAULT_PACING_MS);

        Ok(Self {
            registry_base_url: pick(&args.registry_base_url, &file_config.registry_base_url),
            registry_space_id: pick(&args.registry_space_id, &file_config.registry_space_id),
            registry_management_token: pick(
                &args.registry_management_token,
                &file_config.registry_management_token,
            ),
            registry_preview_token: pick(
                &args.registry_preview_token,
                &file_config.registry_preview_token,
            ),
            webhook_secret: args
                .webhook_secret
                .clone()
                .or(file_config.webhook_secret)
                .filter(|s| !s.is_empty()),
            design_tool_base_url: pick(
                &args.design_tool_base_url,
                &file_config.design_tool_base_url,
            ),
            design_tool_token: pick(&args.design_tool_token, &file_config.design_tool_token),
            design_tool_file_key: pick(
                &args.design_tool_file_key,
                &file_config.design_tool_file_key,
            ),
            build_hook_url: args
                .build_hook_url
                .clone()
                .or(file_config.build_hook_url)
                .filter(|s| !s.is_empty()),
            publish_command: args
                .publish_command
                .clone()
                .or(file_config.publish_command)
                .filter(|s| !s.is_empty()),
            components_dir: args
                .components_dir
                .clone()
                .or(file_config.components_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPONENTS_DIR)),
            stories_dir: args
                .stories_dir
                .clone()
                .or(file_config.stories_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORIES_DIR)),
            generated_dir: args
                .generated_dir
                .clone()
                .or(file_config.generated_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GENERATED_DIR)),
            tokens_file: args
                .tokens_file
                .clone()
                .or(file_config.tokens_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKENS_FILE)),
            stub_extension: args
                .stub_extension
                .clone()
                .or(file_config.stub_extension)
                .unwrap_or_else(|| DEFAULT_STUB_EXTENSION.to_string())
                .trim_start_matches('.')
                .to_string(),
            auto_create_stories: !(args.no_stories || file_config.no_stories.unwrap_or(false)),
            auto_deploy: !(args.no_deploy || file_config.no_deploy.unwrap_or(false)),
            pacing: Duration::from_millis(pacing_ms),
            request_timeout: Duration::from_secs(
                args.request_timeout_secs
                    .or(file_config.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            http_bind_address,
        })
    }

    /// Fails fast when registry credentials are missing. Required for any
    /// operation that touches the registry, per the registry's own access
    /// rules for mutating tooling.
    pub fn ensure_registry(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.registry_base_url.is_empty() {
            missing.push("registry base URL");
        }
        if self.registry_space_id.is_empty() {
            missing.push("registry space id");
        }
        if self.registry_management_token.is_empty() {
            missing.push("registry management token");
        }
        if self.registry_preview_token.is_empty() {
            missing.push("registry content-delivery token");
        }
        anyhow::ensure!(
            missing.is_empty(),
            "missing required registry configuration: {}",
            missing.join(", ")
        );
        Ok(())
    }

    pub fn ensure_design_tool(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.design_tool_base_url.is_empty() {
            missing.push("design tool base URL");
        }
        if self.design_tool_token.is_empty() {
            missing.push("design tool access token");
        }
        if self.design_tool_file_key.is_empty() {
            missing.push("design tool file key");
        }
        anyhow::ensure!(
            missing.is_empty(),
            "missing required design tool configuration: {}",
            missing.join(", ")
        );
        Ok(())
    }

    pub fn has_design_tool(&self) -> bool {
        !self.design_tool_token.is_empty() && !self.design_tool_file_key.is_empty()
    }

    // Path derivation is centralized here so the generator and the
    // validation engine always resolve the same locations for one
    // component identifier.

    pub fn stub_path(&self, pascal_name: &str) -> PathBuf {
        self.components_dir
            .join(format!("{pascal_name}.{}", self.stub_extension))
    }

    pub fn types_dir(&self) -> PathBuf {
        self.generated_dir.join("types")
    }

    pub fn type_path(&self, pascal_name: &str) -> PathBuf {
        self.types_dir().join(format!("{pascal_name}.ts"))
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.generated_dir.join("schemas")
    }

    pub fn schema_path(&self, pascal_name: &str) -> PathBuf {
        self.schemas_dir().join(format!("{pascal_name}.schema.ts"))
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.generated_dir.join("docs")
    }

    pub fn doc_path(&self, pascal_name: &str) -> PathBuf {
        self.docs_dir().join(format!("{pascal_name}.md"))
    }

    pub fn generated_stories_dir(&self) -> PathBuf {
        self.stories_dir.join("generated")
    }

    pub fn story_path(&self, pascal_name: &str) -> PathBuf {
        self.generated_stories_dir()
            .join(format!("{pascal_name}.stories.tsx"))
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.generated_dir.join("metrics")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "design-sync", about = "Design system sync pipeline", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DESIGN_SYNC_REGISTRY_URL", value_name = "URL", global = true)]
    pub registry_base_url: Option<String>,

    #[arg(long, env = "DESIGN_SYNC_SPACE_ID", value_name = "ID", global = true)]
    pub registry_space_id: Option<String>,

    #[arg(
        long,
        env = "DESIGN_SYNC_MANAGEMENT_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub registry_management_token: Option<String>,

    #[arg(
        long,
        env = "DESIGN_SYNC_PREVIEW_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub registry_preview_token: Option<String>,

    #[arg(
        long,
        env = "DESIGN_SYNC_WEBHOOK_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        global = true
    )]
    pub webhook_secret: Option<String>,

    #[arg(long, env = "DESIGN_SYNC_DESIGN_TOOL_URL", value_name = "URL", global = true)]
    pub design_tool_base_url: Option<String>,

    #[arg(
        long,
        env = "DESIGN_SYNC_DESIGN_TOOL_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub design_tool_token: Option<String>,

    #[arg(long, env = "DESIGN_SYNC_DESIGN_TOOL_FILE", value_name = "KEY", global = true)]
    pub design_tool_file_key: Option<String>,

    #[arg(long, env = "DESIGN_SYNC_BUILD_HOOK", value_name = "URL", global = true)]
    pub build_hook_url: Option<String>,

    #[arg(
        long,
        env = "DESIGN_SYNC_PUBLISH_COMMAND",
        value_name = "CMD",
        help = "Visual-regression publish command run after token changes",
        global = true
    )]
    pub publish_command: Option<String>,

    #[arg(long, env = "DESIGN_SYNC_COMPONENTS_DIR", value_name = "DIR", global = true)]
    pub components_dir: Option<PathBuf>,

    #[arg(long, env = "DESIGN_SYNC_STORIES_DIR", value_name = "DIR", global = true)]
    pub stories_dir: Option<PathBuf>,

    #[arg(long, env = "DESIGN_SYNC_GENERATED_DIR", value_name = "DIR", global = true)]
    pub generated_dir: Option<PathBuf>,

    #[arg(long, env = "DESIGN_SYNC_TOKENS_FILE", value_name = "FILE", global = true)]
    pub tokens_file: Option<PathBuf>,

    #[arg(
        long,
        env = "DESIGN_SYNC_STUB_EXTENSION",
        value_name = "EXT",
        help = "File extension of generated component stubs",
        global = true
    )]
    pub stub_extension: Option<String>,

    #[arg(long, help = "Skip preview story generation", global = true)]
    pub no_stories: bool,

    #[arg(long, help = "Never trigger downstream builds", global = true)]
    pub no_deploy: bool,

    #[arg(
        long,
        env = "DESIGN_SYNC_PACING_MS",
        value_name = "MS",
        help = "Delay between per-schema registry operations in bulk runs",
        global = true
    )]
    pub pacing_ms: Option<u64>,

    #[arg(long, env = "DESIGN_SYNC_REQUEST_TIMEOUT", value_name = "SECS", global = true)]
    pub request_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "DESIGN_SYNC_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address for the webhook server",
        global = true
    )]
    pub http_bind: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the full pipeline: token sync, generation, validation, report.
    Sync {
        #[arg(long)]
        skip_tokens: bool,
        #[arg(long)]
        skip_validation: bool,
    },
    /// Generate artifacts from registry schemas.
    Generate {
        /// Generate a single component by registry name.
        #[arg(short, long, value_name = "NAME")]
        component: Option<String>,
    },
    /// Sync design tokens from the design tool.
    Tokens,
    /// Validate generated artifacts and the token map.
    Validate {
        /// Exit non-zero when any issue is found.
        #[arg(long)]
        strict: bool,
    },
    /// Generate and persist a health report.
    Health,
    /// Show which credentials are configured.
    Config,
    /// Serve the webhook endpoint.
    Serve,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    registry_base_url: Option<String>,
    registry_space_id: Option<String>,
    registry_management_token: Option<String>,
    registry_preview_token: Option<String>,
    webhook_secret: Option<String>,
    design_tool_base_url: Option<String>,
    design_tool_token: Option<String>,
    design_tool_file_key: Option<String>,
    build_hook_url: Option<String>,
    publish_command: Option<String>,
    components_dir: Option<PathBuf>,
    stories_dir: Option<PathBuf>,
    generated_dir: Option<PathBuf>,
    tokens_file: Option<PathBuf>,
    stub_extension: Option<String>,
    no_stories: Option<bool>,
    no_deploy: Option<bool>,
    pacing_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    http_bind: Option<SocketAddr>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
