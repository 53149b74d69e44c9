use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Relay diagnostics
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_conn: u32,
    pub n_channels: u32,
    pub n_conn_ctx: u32,
    pub frames_relayed: u64,
    pub frames_dropped: u64,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
