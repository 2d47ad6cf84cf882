// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-progress flags for user-facing operations.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    CreateToken,
    MintTokens,
    TransferTokens,
    AddToken,
    FetchHistory,
}

impl OperationKind {
    const ALL: [OperationKind; 5] = [
        OperationKind::CreateToken,
        OperationKind::MintTokens,
        OperationKind::TransferTokens,
        OperationKind::AddToken,
        OperationKind::FetchHistory,
    ];

    fn index(self) -> usize {
        match self {
            OperationKind::CreateToken => 0,
            OperationKind::MintTokens => 1,
            OperationKind::TransferTokens => 2,
            OperationKind::AddToken => 3,
            OperationKind::FetchHistory => 4,
        }
    }
}

/// Which operation kinds currently have at least one call in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct InProgress {
    pub creating_token: bool,
    pub minting: bool,
    pub transferring: bool,
    pub adding_token: bool,
    pub loading_history: bool,
}

/// Counters of in-flight operations, one per [`OperationKind`].
#[derive(Debug, Default)]
pub struct OperationFlags {
    counters: [AtomicUsize; OperationKind::ALL.len()],
}

impl OperationFlags {
    /// Mark `kind` as in flight until the returned guard drops.
    pub fn begin(&self, kind: OperationKind) -> FlagGuard<'_> {
        self.counters[kind.index()].fetch_add(1, Ordering::SeqCst);
        FlagGuard { flags: self, kind }
    }

    pub fn is_active(&self, kind: OperationKind) -> bool {
        self.counters[kind.index()].load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> InProgress {
        InProgress {
            creating_token: self.is_active(OperationKind::CreateToken),
            minting: self.is_active(OperationKind::MintTokens),
            transferring: self.is_active(OperationKind::TransferTokens),
            adding_token: self.is_active(OperationKind::AddToken),
            loading_history: self.is_active(OperationKind::FetchHistory),
        }
    }
}

pub struct FlagGuard<'a> {
    flags: &'a OperationFlags,
    kind: OperationKind,
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flags.counters[self.kind.index()].fetch_sub(1, Ordering::SeqCst);
    }
}
