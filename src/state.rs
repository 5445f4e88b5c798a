/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - enforcement: introspection client + base URL, proxy: upstream client
 * - Clone 前提で持つ (内部は Arc/Clone cheap)、起動後は read-only
 */
use std::sync::Arc;

use crate::middleware::auth::EnforcementConfig;
use crate::services::proxy::UpstreamProxy;

#[derive(Clone, Debug)]
pub struct AppState {
    pub enforcement: Arc<EnforcementConfig>,
    pub proxy: Arc<UpstreamProxy>,
}

impl AppState {
    pub fn new(enforcement: Arc<EnforcementConfig>, proxy: Arc<UpstreamProxy>) -> Self {
        Self { enforcement, proxy }
    }
}
