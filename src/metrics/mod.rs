use lazy_static::lazy_static;
use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};


lazy_static! {
    pub static ref RESOURCE_CONFLICTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "resource_conflicts",
            "Declared kinds found missing from the API server after a successful sync"
        ),
        &["commit"]
    )
    .expect("metric can not be created");

    pub static ref FIGHTS_DETECTED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "fights_detected",
            "Objects classified as being fought over by competing controllers"
        ),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REMEDIATE_WATCHES_METRIC: GaugeVec = GaugeVec::new(
        Opts::new("remediate_watches", "Currently running watch streams"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(RESOURCE_CONFLICTS_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(FIGHTS_DETECTED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(REMEDIATE_WATCHES_METRIC.clone()))
        .expect("collector can be registered");
}
