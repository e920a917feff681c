use serde::{Deserialize, Deserializer};

use super::RdtUpdate;

/// A structured resource-update request.
///
/// Field names are the camelCase keys accepted on the wire, e.g.
/// `{"memory": 1048576, "cpusetCpus": "0-3"}`. Decoding is lenient: a value of the wrong kind
/// leaves its field empty instead of failing the whole request, and unknown keys are ignored.
/// Numeric fields accept integers and strings holding an integer; string fields accept strings
/// only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRequest {
    #[serde(deserialize_with = "lenient_integer")]
    pub blkio_weight: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub cpu_period: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub cpu_quota: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub cpu_shares: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub cpu_rt_period: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub cpu_rt_runtime: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub cpuset_cpus: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub cpuset_mems: Option<String>,
    #[serde(deserialize_with = "lenient_integer")]
    pub kernel_memory: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub kernel_memory_tcp: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub memory: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub memory_reservation: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub memory_swap: Option<i64>,
    #[serde(deserialize_with = "lenient_integer")]
    pub pids_limit: Option<i64>,
    /// Intel RDT L3 cache schema, e.g. `L3:0=ffff`.
    #[serde(deserialize_with = "lenient_string")]
    pub l3_cache_schema: Option<String>,
    /// Intel RDT memory bandwidth schema, e.g. `MB:0=70`.
    #[serde(deserialize_with = "lenient_string")]
    pub mem_bw_schema: Option<String>,
}

impl ResourceRequest {
    /// Returns the Intel RDT update carried by this request, if any.
    pub fn rdt(&self) -> Option<RdtUpdate> {
        if self.l3_cache_schema.is_none() && self.mem_bw_schema.is_none() {
            return None;
        }
        Some(RdtUpdate {
            l3_cache_schema: self.l3_cache_schema.clone(),
            mem_bw_schema: self.mem_bw_schema.clone(),
        })
    }
}

/// Accepts integers, numeric strings and finite floats within `i64` range. Floats are
/// truncated toward zero, so `1e9` becomes `1000000000` and `1.5` becomes `1`.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn truncate(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (value.is_finite() && (-LIMIT..LIMIT).contains(&value)).then(|| value.trunc() as i64)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}
