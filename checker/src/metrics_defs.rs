//! Metrics definitions for the checker.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CHECK_REQUESTS: MetricDef = MetricDef {
    name: "check.requests",
    metric_type: MetricType::Counter,
    description: "Number of check requests that passed parameter validation",
};

pub const CHECK_REJECTED: MetricDef = MetricDef {
    name: "check.rejected",
    metric_type: MetricType::Counter,
    description: "Number of check requests rejected with a 4xx, tagged by reason",
};

pub const CHECK_RESULT_EXISTS: MetricDef = MetricDef {
    name: "check.result.exists",
    metric_type: MetricType::Counter,
    description: "Number of checks that found at least one file",
};

pub const PROVIDER_PRIMARY_FAILURE: MetricDef = MetricDef {
    name: "provider.primary.failure",
    metric_type: MetricType::Counter,
    description: "Number of failed lookups against the primary share-info API",
};

pub const PROVIDER_FALLBACK_USED: MetricDef = MetricDef {
    name: "provider.fallback.used",
    metric_type: MetricType::Counter,
    description: "Number of lookups that went to the fallback endpoint",
};

pub const PROVIDER_FALLBACK_FAILURE: MetricDef = MetricDef {
    name: "provider.fallback.failure",
    metric_type: MetricType::Counter,
    description: "Number of failed lookups against the fallback endpoint",
};

pub const PROVIDER_REQUEST_DURATION: MetricDef = MetricDef {
    name: "provider.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent on one provider request in seconds, tagged by endpoint",
};

pub const ALL_METRICS: &[MetricDef] = &[
    CHECK_REQUESTS,
    CHECK_REJECTED,
    CHECK_RESULT_EXISTS,
    PROVIDER_PRIMARY_FAILURE,
    PROVIDER_FALLBACK_USED,
    PROVIDER_FALLBACK_FAILURE,
    PROVIDER_REQUEST_DURATION,
];
