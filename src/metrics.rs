use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static REGISTRY: OnceLock<Arc<StageRegistry>> = OnceLock::new();

pub fn registry() -> &'static Arc<StageRegistry> {
    REGISTRY.get_or_init(|| Arc::new(StageRegistry::new()))
}

/// The pipeline stages worth watching in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Normalize,
    Efficiency,
    CognitiveLoad,
    Strategy,
    Transfer,
    Profile,
}

impl StageId {
    pub fn all() -> &'static [StageId] {
        &[
            StageId::Normalize,
            StageId::Efficiency,
            StageId::CognitiveLoad,
            StageId::Strategy,
            StageId::Transfer,
            StageId::Profile,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            StageId::Normalize => "normalize",
            StageId::Efficiency => "score_efficiency",
            StageId::CognitiveLoad => "score_cognitive_load",
            StageId::Strategy => "score_strategy",
            StageId::Transfer => "score_transfer",
            StageId::Profile => "fold_profile",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StageId::Normalize => "Event Normalizer",
            StageId::Efficiency => "Efficiency Scorer",
            StageId::CognitiveLoad => "Cognitive Load Estimator",
            StageId::Strategy => "Strategy Classifier",
            StageId::Transfer => "Transferability Aggregator",
            StageId::Profile => "Profile Aggregator",
        }
    }
}

#[derive(Debug, Default)]
pub struct StageMetrics {
    call_count: AtomicU64,
    total_latency_us: AtomicU64,
    error_count: AtomicU64,
    last_called_at: AtomicU64,
}

impl StageMetrics {
    pub fn record_call(&self, latency_us: u64) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        self.last_called_at.store(now_ms(), Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let calls = self.call_count.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        let total_us = self.total_latency_us.load(Ordering::Relaxed);
        let avg = (total_us as f64 / calls as f64) / 1000.0;
        (avg * 10000.0).round() / 10000.0
    }

    pub fn last_called_at(&self) -> Option<u64> {
        let ts = self.last_called_at.load(Ordering::Relaxed);
        (ts != 0).then_some(ts)
    }
}

pub struct StageRegistry {
    metrics: HashMap<StageId, StageMetrics>,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRegistry {
    pub fn new() -> Self {
        let mut metrics = HashMap::new();
        for id in StageId::all() {
            metrics.insert(*id, StageMetrics::default());
        }
        Self { metrics }
    }

    pub fn record(&self, id: StageId, latency_us: u64) {
        if let Some(m) = self.metrics.get(&id) {
            m.record_call(latency_us);
        }
    }

    pub fn record_error(&self, id: StageId) {
        if let Some(m) = self.metrics.get(&id) {
            m.record_error();
        }
    }

    pub fn get(&self, id: StageId) -> Option<&StageMetrics> {
        self.metrics.get(&id)
    }

    pub fn snapshot(&self) -> Vec<StageStatus> {
        StageId::all()
            .iter()
            .map(|id| {
                let m = &self.metrics[id];
                StageStatus {
                    id: id.id().to_string(),
                    name: id.name().to_string(),
                    call_count: m.call_count(),
                    avg_latency_ms: m.avg_latency_ms(),
                    error_count: m.error_count(),
                    last_called_at: m.last_called_at(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    pub id: String,
    pub name: String,
    pub call_count: u64,
    pub avg_latency_ms: f64,
    pub error_count: u64,
    pub last_called_at: Option<u64>,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[macro_export]
macro_rules! track_stage {
    ($id:expr, $body:expr) => {{
        let start = std::time::Instant::now();
        let result = $body;
        let latency_us = start.elapsed().as_micros() as u64;
        $crate::metrics::registry().record($id, latency_us);
        result
    }};
}
