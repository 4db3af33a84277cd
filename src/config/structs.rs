use serde::{Deserialize, Serialize};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable prefix, e.g. `KEYGATE__SERVER__PORT=4000`.
pub const ENV_PREFIX: &str = "KEYGATE";

/// 静态配置（从 TOML + 环境变量加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// Load configuration from `path` (optional file) and the environment.
    ///
    /// A `.env` file, if present, is folded into the process environment
    /// first so its variables participate in the ENV layer.
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        dotenvy::dotenv().ok();

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// Bearer credential presented to the shortener gateway.
    pub fn gateway_token(&self) -> &str {
        if self.gateway.api_token.is_empty() {
            &self.auth.token
        } else {
            &self.gateway.api_token
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// JSON body limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Hide internal error detail from clients
    #[serde(default = "default_production")]
    pub production: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared static credential required by `POST /gerar`
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// `["*"]` allows any origin, empty means same-origin only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// 短链接网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_gateway_domain")]
    pub domain: String,
    #[serde(default = "default_gateway_link_type")]
    pub link_type: String,
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

/// 密钥存储与过期配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_keys_file")]
    pub file: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Refuse to start on an unreadable keys file instead of starting empty
    #[serde(default)]
    pub abort_on_corrupt: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_max_body_size() -> usize {
    10 * 1024
}

fn default_production() -> bool {
    true
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_gateway_api_url() -> String {
    "https://api.monetizzy.com/v1/links".to_string()
}

fn default_gateway_domain() -> String {
    "ufly.monetizzy.com".to_string()
}

fn default_gateway_link_type() -> String {
    "direct".to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    10
}

fn default_keys_file() -> String {
    "keys.json".to_string()
}

fn default_expiry_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_size: default_max_body_size(),
            production: default_production(),
            workers: default_workers(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: default_gateway_api_url(),
            api_token: String::new(),
            domain: default_gateway_domain(),
            link_type: default_gateway_link_type(),
            timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            file: default_keys_file(),
            expiry_hours: default_expiry_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
            abort_on_corrupt: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
