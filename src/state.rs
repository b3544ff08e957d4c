// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    /// Email suffix required by admin routes
    pub admin_email_suffix: Arc<str>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, admin_email_suffix: impl Into<Arc<str>>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            admin_email_suffix: admin_email_suffix.into(),
        }
    }
}
