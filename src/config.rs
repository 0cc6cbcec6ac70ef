use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_TABLE: &str = "sensor_data";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Device id (MAC address) -> display label
    pub tags: BTreeMap<String, String>,
    pub database_url: String,
    pub table: String,
    pub fetch_timeout_secs: u64,
    pub listen_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub refresh_interval_secs: u64,
}

impl SensorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_vars(env::vars())
    }

    /// Build the configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();

        let database_url = vars
            .get("DATABASE_URL")
            .cloned()
            .ok_or("DATABASE_URL environment variable not set")?;

        // Try SENSOR_TAGS format first
        let tags = if let Some(sensor_tags) = vars.get("SENSOR_TAGS") {
            debug!("Found SENSOR_TAGS: '{}'", sensor_tags);
            parse_tags(sensor_tags)
        } else {
            debug!("SENSOR_TAGS not found, trying SENSOR_<N>_MAC/SENSOR_<N>_NAME");
            indexed_tags(&vars)
        };

        if tags.is_empty() {
            return Err("No sensors configured. Please set SENSOR_TAGS or SENSOR_<N>_MAC/SENSOR_<N>_NAME environment variables".into());
        }

        let table = vars
            .get("SENSOR_TABLE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if !is_identifier(&table) {
            return Err(format!("SENSOR_TABLE '{}' is not a valid table name", table).into());
        }

        let fetch_timeout_secs = match vars.get("FETCH_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|e| format!("Invalid FETCH_TIMEOUT_SECS '{}': {}", v, e))?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        if fetch_timeout_secs == 0 {
            return Err("FETCH_TIMEOUT_SECS must be at least 1".into());
        }

        let refresh_interval_secs = match vars.get("REFRESH_INTERVAL_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|e| format!("Invalid REFRESH_INTERVAL_SECS '{}': {}", v, e))?,
            None => DEFAULT_REFRESH_INTERVAL_SECS,
        };

        let listen_addr = vars
            .get("LISTEN_ADDR")
            .map(String::as_str)
            .unwrap_or(DEFAULT_LISTEN_ADDR);
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|e| format!("Invalid LISTEN_ADDR '{}': {}", listen_addr, e))?;

        let static_dir = PathBuf::from(
            vars.get("STATIC_DIR")
                .map(String::as_str)
                .unwrap_or(DEFAULT_STATIC_DIR),
        );

        info!("Total sensors configured: {}", tags.len());
        for (mac, name) in &tags {
            info!("Sensor: {} -> {}", mac, name);
        }

        Ok(SensorConfig {
            tags,
            database_url,
            table,
            fetch_timeout_secs,
            listen_addr,
            static_dir,
            refresh_interval_secs,
        })
    }
}

/// Parse `id=label` pairs separated by commas
///
/// Splits on the first `=` only. Pairs with an empty side are skipped.
pub fn parse_tags(raw: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((mac, name)) => {
                let mac = mac.trim();
                let name = name.trim();
                if !mac.is_empty() && !name.is_empty() {
                    tags.insert(mac.to_string(), name.to_string());
                }
            }
            None => warn!("Ignoring sensor entry without '=': '{}'", pair),
        }
    }

    tags
}

fn indexed_tags(vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    for (key, value) in vars {
        if let Some(index) = key
            .strip_prefix("SENSOR_")
            .and_then(|s| s.strip_suffix("_MAC"))
        {
            let name_key = format!("SENSOR_{}_NAME", index);
            if let Some(name) = vars.get(&name_key) {
                let mac = value.trim();
                let name = name.trim();
                if !mac.is_empty() && !name.is_empty() {
                    tags.insert(mac.to_string(), name.to_string());
                }
            } else {
                warn!("{} has no matching {}", key, name_key);
            }
        }
    }

    tags
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
