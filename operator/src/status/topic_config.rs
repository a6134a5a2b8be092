//! Typed table of the topic level configuration accepted by Kafka brokers.
use std::collections::BTreeMap;

/// Value type of a topic configuration entry.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ConfigType {
    Int { min: i64 },
    Long { min: i64 },
    Double { min: f64, max: f64 },
    Boolean,
    String,
    OneOf(&'static [&'static str]),
    List(Option<&'static [&'static str]>),
}

const COMPRESSION_TYPES: &[&str] = &["uncompressed", "zstd", "lz4", "snappy", "gzip", "producer"];
const CLEANUP_POLICIES: &[&str] = &["compact", "delete"];
const TIMESTAMP_TYPES: &[&str] = &["CreateTime", "LogAppendTime"];

const TOPIC_CONFIGS: &[(&str, ConfigType)] = &[
    ("cleanup.policy", ConfigType::List(Some(CLEANUP_POLICIES))),
    ("compression.type", ConfigType::OneOf(COMPRESSION_TYPES)),
    ("delete.retention.ms", ConfigType::Long { min: 0 }),
    ("file.delete.delay.ms", ConfigType::Long { min: 0 }),
    ("flush.messages", ConfigType::Long { min: 1 }),
    ("flush.ms", ConfigType::Long { min: 0 }),
    ("follower.replication.throttled.replicas", ConfigType::List(None)),
    ("index.interval.bytes", ConfigType::Int { min: 0 }),
    ("leader.replication.throttled.replicas", ConfigType::List(None)),
    ("local.retention.bytes", ConfigType::Long { min: -2 }),
    ("local.retention.ms", ConfigType::Long { min: -2 }),
    ("max.compaction.lag.ms", ConfigType::Long { min: 1 }),
    ("max.message.bytes", ConfigType::Int { min: 0 }),
    ("message.downconversion.enable", ConfigType::Boolean),
    ("message.format.version", ConfigType::String),
    ("message.timestamp.difference.max.ms", ConfigType::Long { min: 0 }),
    ("message.timestamp.type", ConfigType::OneOf(TIMESTAMP_TYPES)),
    (
        "min.cleanable.dirty.ratio",
        ConfigType::Double { min: 0.0, max: 1.0 },
    ),
    ("min.compaction.lag.ms", ConfigType::Long { min: 0 }),
    ("min.insync.replicas", ConfigType::Int { min: 1 }),
    ("preallocate", ConfigType::Boolean),
    ("remote.storage.enable", ConfigType::Boolean),
    ("retention.bytes", ConfigType::Long { min: i64::MIN }),
    ("retention.ms", ConfigType::Long { min: -1 }),
    ("segment.bytes", ConfigType::Int { min: 14 }),
    ("segment.index.bytes", ConfigType::Int { min: 4 }),
    ("segment.jitter.ms", ConfigType::Long { min: 0 }),
    ("segment.ms", ConfigType::Long { min: 1 }),
    ("unclean.leader.election.enable", ConfigType::Boolean),
];

/// A configuration entry rejected by the broker rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRejection {
    /// Exception name reported by Kafka.
    pub reason: &'static str,
    /// Kafka's error message.
    pub message: String,
}

/// Validate every entry of a topic configuration, reporting the first rejected entry.
pub fn validate(config: &BTreeMap<String, serde_json::Value>) -> Result<(), ConfigRejection> {
    for (key, value) in config {
        let Some((_, config_type)) = TOPIC_CONFIGS.iter().find(|(name, _)| name == key) else {
            return Err(ConfigRejection {
                reason: "InvalidConfigurationException",
                message: format!("Unknown topic config name: {key}"),
            });
        };
        let value = render(value);
        if let Err(detail) = check(*config_type, &value) {
            return Err(ConfigRejection {
                reason: "InvalidRequestException",
                message: format!("Invalid value {value} for configuration {key}: {detail}"),
            });
        }
    }
    Ok(())
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(render)
            .collect::<Vec<String>>()
            .join(","),
        other => other.to_string(),
    }
}

fn check(config_type: ConfigType, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    match config_type {
        ConfigType::Int { min } => {
            let parsed = trimmed
                .parse::<i32>()
                .map_err(|_| "Not a number of type INT".to_owned())?;
            at_least(parsed as i64, min)
        }
        ConfigType::Long { min } => {
            let parsed = trimmed
                .parse::<i64>()
                .map_err(|_| "Not a number of type LONG".to_owned())?;
            at_least(parsed, min)
        }
        ConfigType::Double { min, max } => {
            let parsed = trimmed
                .parse::<f64>()
                .map_err(|_| "Not a number of type DOUBLE".to_owned())?;
            if parsed < min {
                Err(format!("Value must be at least {min}"))
            } else if parsed > max {
                Err(format!("Value must be no more than {max}"))
            } else {
                Ok(())
            }
        }
        ConfigType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
                Ok(())
            } else {
                Err("Expected value to be either true or false".to_owned())
            }
        }
        ConfigType::String => Ok(()),
        ConfigType::OneOf(allowed) => {
            if allowed.contains(&trimmed) {
                Ok(())
            } else {
                Err(format!("String must be one of: {}", allowed.join(", ")))
            }
        }
        ConfigType::List(allowed) => {
            let Some(allowed) = allowed else {
                return Ok(());
            };
            match trimmed
                .split(',')
                .map(str::trim)
                .find(|item| !allowed.contains(item))
            {
                Some(item) => Err(format!(
                    "Invalid value {item} for configuration: String must be one of: {}",
                    allowed.join(", ")
                )),
                None => Ok(()),
            }
        }
    }
}

fn at_least(value: i64, min: i64) -> Result<(), String> {
    if value < min {
        Err(format!("Value must be at least {min}"))
    } else {
        Ok(())
    }
}
