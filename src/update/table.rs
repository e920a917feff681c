use super::{ResourceRequest, ResourceUpdateEntry};

/// One row of the translation table: a request field and the controller attribute it sets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mapping {
    /// Wire name of the request field.
    pub field: &'static str,
    pub section: &'static str,
    pub name: &'static str,
    pub numeric: bool,
    pub value: fn(&ResourceRequest) -> Option<String>,
}

fn integer(value: Option<i64>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Request fields in translation order.
pub(crate) static MAPPINGS: &[Mapping] = &[
    Mapping {
        field: "blkioWeight",
        section: "blockIO",
        name: "weight",
        numeric: true,
        value: |r| integer(r.blkio_weight),
    },
    Mapping {
        field: "cpuPeriod",
        section: "cpu",
        name: "period",
        numeric: true,
        value: |r| integer(r.cpu_period),
    },
    Mapping {
        field: "cpuQuota",
        section: "cpu",
        name: "quota",
        numeric: true,
        value: |r| integer(r.cpu_quota),
    },
    Mapping {
        field: "cpuShares",
        section: "cpu",
        name: "shares",
        numeric: true,
        value: |r| integer(r.cpu_shares),
    },
    Mapping {
        field: "cpuRtPeriod",
        section: "cpu",
        name: "realtimePeriod",
        numeric: true,
        value: |r| integer(r.cpu_rt_period),
    },
    Mapping {
        field: "cpuRtRuntime",
        section: "cpu",
        name: "realtimeRuntime",
        numeric: true,
        value: |r| integer(r.cpu_rt_runtime),
    },
    Mapping {
        field: "cpusetCpus",
        section: "cpu",
        name: "cpus",
        numeric: false,
        value: |r| r.cpuset_cpus.clone(),
    },
    Mapping {
        field: "cpusetMems",
        section: "cpu",
        name: "mems",
        numeric: false,
        value: |r| r.cpuset_mems.clone(),
    },
    Mapping {
        field: "kernelMemory",
        section: "memory",
        name: "kernel",
        numeric: true,
        value: |r| integer(r.kernel_memory),
    },
    Mapping {
        field: "kernelMemoryTcp",
        section: "memory",
        name: "kernelTCP",
        numeric: true,
        value: |r| integer(r.kernel_memory_tcp),
    },
    Mapping {
        field: "memory",
        section: "memory",
        name: "limit",
        numeric: true,
        value: |r| integer(r.memory),
    },
    Mapping {
        field: "memoryReservation",
        section: "memory",
        name: "reservation",
        numeric: true,
        value: |r| integer(r.memory_reservation),
    },
    Mapping {
        field: "memorySwap",
        section: "memory",
        name: "swap",
        numeric: true,
        value: |r| integer(r.memory_swap),
    },
    Mapping {
        field: "pidsLimit",
        section: "pids",
        name: "limit",
        numeric: true,
        value: |r| integer(r.pids_limit),
    },
];

/// Translates a request into controller entries, in table order.
///
/// Absent fields produce no entry.
pub fn translate(request: &ResourceRequest) -> Vec<ResourceUpdateEntry> {
    MAPPINGS
        .iter()
        .filter_map(|mapping| {
            let value = (mapping.value)(request)?;
            log::debug!(
                "{} -> {}.{} = {value}",
                mapping.field,
                mapping.section,
                mapping.name
            );
            Some(ResourceUpdateEntry::new(
                mapping.section,
                mapping.name,
                value,
                mapping.numeric,
            ))
        })
        .collect()
}
