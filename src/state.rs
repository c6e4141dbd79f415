// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::JwtAuth;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<JwtAuth>,
}

impl AppState {
    pub fn new(auth: JwtAuth) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }
}
