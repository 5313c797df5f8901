pub mod efficiency;
pub mod load;
pub mod strategy;
pub mod transfer;

pub use efficiency::efficiency_score;
pub use load::{cognitive_load_index, emotional_timeline};
pub use strategy::{classify_attempt, strategy_breakdown};
pub use transfer::{
    build_heatmap, session_lti, session_transfer_records, ConceptTransferRecord,
    ContextPerformance, HeatmapCell, HeatmapRow, TransferBand,
};
