// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::lifecycle::TokenLifecycleManager;
use crate::storage::LocalStorage;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TokenLifecycleManager>,
    /// Data directory backing the manager, probed by readiness checks.
    pub storage: Arc<LocalStorage>,
}

impl AppState {
    pub fn new(manager: TokenLifecycleManager, storage: Arc<LocalStorage>) -> Self {
        Self {
            manager: Arc::new(manager),
            storage,
        }
    }
}
