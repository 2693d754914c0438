use serde::Deserialize;

const ENV_PREFIX: &str = "WEATHER";

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    #[serde(default)]
    pub token: String,
    /// Default source when a request does not name one
    pub database: String,
    #[serde(default = "default_retention_policy")]
    pub retention_policy: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    pub station: StationSettings,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StationSettings {
    pub title: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub default_sensor: String,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    #[serde(default)]
    pub ingest_credential: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    pub id: String,
    pub title: String,
}

fn default_retention_policy() -> String {
    "autogen".to_string()
}

fn default_measurement() -> String {
    "temperature".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_lookback_hours() -> i64 {
    crate::domain::reading::DEFAULT_LOOKBACK_HOURS
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

pub fn load_influx_config() -> anyhow::Result<InfluxConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/influx"))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_station_config() -> anyhow::Result<StationConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/station"))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}
