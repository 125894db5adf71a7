use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("pet_care_statds")
        .with_description("Pet care client statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_auth_statds(action: &str) {
    incr_statds("auth".to_string(), action.into())
}

pub fn incr_mutation_statds(collection: &str, action: &str) {
    incr_statds("mutation".to_string(), format!("{collection}:{action}"))
}

pub fn incr_subscription_statds(action: &str) {
    incr_statds("subscription".to_string(), action.into())
}

pub fn incr_partial_failure_statds(step: &str) {
    incr_statds("partial_failure".to_string(), step.into())
}
