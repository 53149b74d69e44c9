use crate::{models::DiagnosticsResponse, ws::RelayHub};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Relay and host diagnostics
pub async fn diagnostics(
    State(hub): State<Arc<RelayHub>>,
) -> (StatusCode, Json<DiagnosticsResponse>) {

    let stats = hub.stats();
    let n_conn_ctx = hub.connection_contexts() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB, Conn: {}, Channels: {}, Relayed: {}, Dropped: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        stats.n_conn,
        stats.n_channels,
        stats.frames_relayed,
        stats.frames_dropped
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn: stats.n_conn,
            n_channels: stats.n_channels,
            n_conn_ctx,
            frames_relayed: stats.frames_relayed,
            frames_dropped: stats.frames_dropped,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
