use chrono::FixedOffset;

pub const DEFAULT_PRIMARY_PROVIDER_URL: &str = "https://nodejs-info.vercel.app";
pub const DEFAULT_SECONDARY_PROVIDER_URL: &str = "https://aditya-info-v9op.onrender.com";
pub const DEFAULT_OUTFIT_IMAGE_URL: &str = "https://profile-aimguard.vercel.app";
pub const DEFAULT_BANNER_IMAGE_URL: &str = "https://aditya-banner-v9op.onrender.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Additional ports served by the same router.
    pub extra_ports: Vec<u16>,
    pub primary_provider_url: String,
    pub secondary_provider_url: String,
    pub outfit_image_url: String,
    pub banner_image_url: String,
    pub upstream_timeout_secs: u64,
    pub default_region: String,
    /// Offset used to render epoch timestamps. `None` means the host offset.
    pub display_utc_offset: Option<FixedOffset>,
    pub static_dir: String,
    /// TTL of the provider payload cache. Zero disables caching.
    pub provider_cache_ttl_secs: u64,
    pub rate_limit_replenish_ms: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            extra_ports: var("EXTRA_PORTS")
                .map(|raw| parse_ports(&raw))
                .transpose()?
                .unwrap_or_default(),
            primary_provider_url: base_url(
                "PRIMARY_PROVIDER_URL",
                var("PRIMARY_PROVIDER_URL"),
                DEFAULT_PRIMARY_PROVIDER_URL,
            )?,
            secondary_provider_url: base_url(
                "SECONDARY_PROVIDER_URL",
                var("SECONDARY_PROVIDER_URL"),
                DEFAULT_SECONDARY_PROVIDER_URL,
            )?,
            outfit_image_url: base_url(
                "OUTFIT_IMAGE_URL",
                var("OUTFIT_IMAGE_URL"),
                DEFAULT_OUTFIT_IMAGE_URL,
            )?,
            banner_image_url: base_url(
                "BANNER_IMAGE_URL",
                var("BANNER_IMAGE_URL"),
                DEFAULT_BANNER_IMAGE_URL,
            )?,
            upstream_timeout_secs: var("UPSTREAM_TIMEOUT_SECS")
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| {
                            anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a positive number")
                        })
                })
                .transpose()?
                .unwrap_or(15),
            default_region: var("DEFAULT_REGION")
                .map(|r| r.trim().to_lowercase())
                .unwrap_or_else(|| "bd".to_string()),
            display_utc_offset: var("DISPLAY_UTC_OFFSET")
                .map(|raw| parse_utc_offset(&raw))
                .transpose()?,
            static_dir: var("STATIC_DIR").unwrap_or_else(|| "public".to_string()),
            provider_cache_ttl_secs: var("PROVIDER_CACHE_TTL_SECS")
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|_| {
                        anyhow::anyhow!("PROVIDER_CACHE_TTL_SECS must be a number of seconds")
                    })
                })
                .transpose()?
                .unwrap_or(0),
            rate_limit_replenish_ms: var("RATE_LIMIT_REPLENISH_MS")
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|ms| *ms > 0)
                        .ok_or_else(|| {
                            anyhow::anyhow!("RATE_LIMIT_REPLENISH_MS must be a positive number")
                        })
                })
                .transpose()?
                .unwrap_or(100),
            rate_limit_burst: var("RATE_LIMIT_BURST")
                .map(|raw| {
                    raw.trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|burst| *burst > 0)
                        .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive number"))
                })
                .transpose()?
                .unwrap_or(20),
        };

        tracing::debug!("Primary provider: {}", config.primary_provider_url);
        tracing::debug!("Secondary provider: {}", config.secondary_provider_url);
        tracing::debug!(
            "Server ports: {} (extra: {:?})",
            config.port,
            config.extra_ports
        );
        if config.provider_cache_ttl_secs > 0 {
            tracing::info!(
                "Provider payload cache enabled ({}s TTL)",
                config.provider_cache_ttl_secs
            );
        }

        Ok(config)
    }
}

fn base_url(key: &str, value: Option<String>, default: &str) -> anyhow::Result<String> {
    let url = value.unwrap_or_else(|| default.to_string());
    let url = url.trim().trim_end_matches('/');
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(url.to_string())
}

/// Parses a comma-separated port list such as `1126, 1269`.
pub fn parse_ports(raw: &str) -> anyhow::Result<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| anyhow::anyhow!("EXTRA_PORTS entry '{}' is not a valid port", p))
        })
        .collect()
}

/// Parses `+HH:MM`, `-HHMM`, or `Z`/`UTC`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow::anyhow!("invalid UTC offset"));
    }

    raw.parse::<FixedOffset>().map_err(|e| {
        anyhow::anyhow!("DISPLAY_UTC_OFFSET must look like +HH:MM, got '{}': {}", raw, e)
    })
}
